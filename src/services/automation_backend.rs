use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured result of a successful extraction attempt. The payload is
/// opaque to the orchestration core; it is stored on the automation task
/// for audit and replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub payload: serde_json::Value,
}

impl ExtractionResult {
    pub fn new(payload: serde_json::Value) -> Self {
        Self { payload }
    }
}

/// The automation backend: a single extraction operation per identifier.
/// Implementations wrap the actual scraping/extraction pipeline.
#[async_trait]
pub trait AutomationBackend: Send + Sync {
    async fn extract(&self, part_number: &str) -> Result<ExtractionResult>;
}
