use crate::error::Result;
use crate::models::WorkRecord;
use async_trait::async_trait;

/// Source of candidate work records (e.g. an analytics warehouse query
/// layer). Total unavailability is the one source failure that aborts a
/// batch run.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch up to `limit` records, optionally dropping records below the
    /// given priority score
    async fn fetch_records(
        &self,
        limit: usize,
        priority_threshold: Option<f64>,
    ) -> Result<Vec<WorkRecord>>;
}
