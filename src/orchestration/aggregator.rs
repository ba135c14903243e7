//! # Batch Status Aggregator
//!
//! Computes batch rollup status on demand from the persisted tasks. The
//! overall status is a pure function of the member tasks' statuses,
//! evaluated over the union of both task variants.

use super::types::{BatchStatus, OverallStatus, StatusBreakdown};
use crate::error::Result;
use crate::repository::TaskRepository;
use crate::state_machine::TaskStatus;
use std::sync::Arc;

pub struct BatchStatusAggregator {
    repository: Arc<dyn TaskRepository>,
}

impl BatchStatusAggregator {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    /// Per-variant status breakdowns plus the overall rollup for a batch
    pub async fn status(&self, batch_id: &str) -> Result<BatchStatus> {
        let automation_statuses: Vec<TaskStatus> = self
            .repository
            .automation_tasks_for_batch(batch_id)
            .await?
            .iter()
            .map(|task| task.status)
            .collect();
        let manual_statuses: Vec<TaskStatus> = self
            .repository
            .manual_tasks_for_batch(batch_id)
            .await?
            .iter()
            .map(|task| task.status)
            .collect();

        let overall = overall_status(
            automation_statuses
                .iter()
                .chain(manual_statuses.iter())
                .copied(),
        );

        Ok(BatchStatus {
            batch_id: batch_id.to_string(),
            automation: breakdown(&automation_statuses),
            manual: breakdown(&manual_statuses),
            overall,
        })
    }
}

fn breakdown(statuses: &[TaskStatus]) -> StatusBreakdown {
    let mut result = StatusBreakdown {
        total: statuses.len(),
        ..StatusBreakdown::default()
    };
    for status in statuses {
        *result.by_status.entry(*status).or_insert(0) += 1;
    }
    result
}

/// Rollup rule over the union of both task populations
fn overall_status(statuses: impl IntoIterator<Item = TaskStatus>) -> OverallStatus {
    let mut total = 0usize;
    let mut completed = 0usize;
    let mut failed = 0usize;

    for status in statuses {
        total += 1;
        match status {
            TaskStatus::Completed => completed += 1,
            TaskStatus::Failed => failed += 1,
            _ => {}
        }
    }

    if total == 0 {
        OverallStatus::NoTasks
    } else if completed == total {
        OverallStatus::Completed
    } else if failed == total {
        OverallStatus::Failed
    } else if completed + failed == total {
        OverallStatus::CompletedWithFailures
    } else {
        OverallStatus::InProgress
    }
}
