//! # Fallback Handler
//!
//! Reroutes failed automation work to humans: one manual task per
//! automation failure, batch-tagged `<batch_id>_fallback`. A failed
//! fallback creation is only logged and counted, never retried into
//! another fallback.

use super::types::{ExecutionFailure, FallbackSummary};
use crate::constants::{editors, events};
use crate::error::Result;
use crate::models::NewManualTask;
use crate::repository::TaskRepository;
use std::sync::Arc;
use tracing::{info, warn};

pub struct FallbackHandler {
    repository: Arc<dyn TaskRepository>,
}

impl FallbackHandler {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    /// Create one fallback manual task per automation failure
    pub async fn process(
        &self,
        failures: &[ExecutionFailure],
        batch_id: &str,
    ) -> FallbackSummary {
        let fallback_batch_id = format!("{batch_id}_fallback");
        let mut summary = FallbackSummary {
            total: failures.len(),
            ..FallbackSummary::default()
        };

        for failure in failures {
            match self
                .create_fallback_task(failure, batch_id, &fallback_batch_id)
                .await
            {
                Ok(task_id) => {
                    info!(
                        event = events::FALLBACK_CREATED,
                        task_id = task_id,
                        part_number = %failure.part_number,
                        batch_id = %fallback_batch_id,
                        "Fallback manual task created"
                    );
                    summary.successful += 1;
                    summary.task_ids.push(task_id);
                }
                Err(error) => {
                    warn!(
                        event = events::FALLBACK_FAILED,
                        part_number = %failure.part_number,
                        batch_id = %fallback_batch_id,
                        error = %error,
                        "Fallback manual task creation failed"
                    );
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    async fn create_fallback_task(
        &self,
        failure: &ExecutionFailure,
        original_batch_id: &str,
        fallback_batch_id: &str,
    ) -> Result<i64> {
        let subject = self
            .repository
            .resolve_subject(&failure.part_number, "")
            .await?;

        let context = serde_json::json!({
            "fallback_reason": failure.error,
            "original_batch_id": original_batch_id,
        });

        let new_task =
            NewManualTask::new(subject.id, fallback_batch_id, editors::AUTOMATION_FALLBACK)
                .with_note(format!("Automation failed: {}", failure.error))
                .with_decision_context(context);

        let task = self.repository.create_manual_task(new_task).await?;
        Ok(task.id)
    }
}
