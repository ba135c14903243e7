//! # Concurrency-Bounded Executor
//!
//! Dispatches classified decisions. Automation decisions run under a
//! counting semaphore sized by `automation_max_concurrent`; each backend
//! call is wrapped in a timeout so a hang cannot hold a slot forever.
//! Manual decisions are cheap persistence writes and run sequentially.
//! Failures of individual executions never abort siblings; all outcomes
//! fold into an order-independent [`StreamSummary`].

use super::types::StreamSummary;
use crate::config::WorkflowConfig;
use crate::constants::{editors, events};
use crate::error::{Result, WorkflowError};
use crate::models::{AutomationTask, NewAutomationTask, NewManualTask, TaskDecision};
use crate::repository::TaskRepository;
use crate::services::AutomationBackend;
use crate::state_machine::TaskLifecycle;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

/// Outcome of a single automation dispatch
enum AutomationOutcome {
    Success { task_id: i64 },
    Reused { task_id: i64 },
    Failure { part_number: String, error: String },
}

pub struct TaskExecutor {
    config: WorkflowConfig,
    repository: Arc<dyn TaskRepository>,
    backend: Arc<dyn AutomationBackend>,
}

impl TaskExecutor {
    pub fn new(
        config: WorkflowConfig,
        repository: Arc<dyn TaskRepository>,
        backend: Arc<dyn AutomationBackend>,
    ) -> Self {
        Self {
            config,
            repository,
            backend,
        }
    }

    /// Execute automation decisions under the configured concurrency bound
    pub async fn execute_automation(
        &self,
        decisions: &[TaskDecision],
        batch_id: &str,
    ) -> StreamSummary {
        let semaphore = Arc::new(Semaphore::new(self.config.automation_max_concurrent));

        let dispatches = decisions.iter().map(|decision| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        // Semaphore is never closed; guard anyway
                        return AutomationOutcome::Failure {
                            part_number: part_number_of(decision),
                            error: "concurrency limiter closed".to_string(),
                        };
                    }
                };
                let outcome = self.dispatch_automation(decision, batch_id).await;
                drop(permit);
                outcome
            }
        });

        let outcomes = futures::future::join_all(dispatches).await;

        let mut summary = StreamSummary::with_total(decisions.len());
        for outcome in outcomes {
            match outcome {
                AutomationOutcome::Success { task_id }
                | AutomationOutcome::Reused { task_id } => summary.record_success(task_id),
                AutomationOutcome::Failure { part_number, error } => {
                    summary.record_failure(part_number, error)
                }
            }
        }
        summary
    }

    async fn dispatch_automation(
        &self,
        decision: &TaskDecision,
        batch_id: &str,
    ) -> AutomationOutcome {
        let Some(record) = decision.work_record() else {
            return AutomationOutcome::Failure {
                part_number: "unknown".to_string(),
                error: "decision metadata is missing the originating record".to_string(),
            };
        };
        let part_number = record.part_number.clone();

        let subject = match self
            .repository
            .resolve_subject(&record.part_number, &record.manufacturer)
            .await
        {
            Ok(subject) => subject,
            Err(error) => {
                return AutomationOutcome::Failure {
                    part_number,
                    error: error.to_string(),
                }
            }
        };

        // Idempotent dispatch: a non-failed task for the same subject and
        // batch means the work is already underway or done
        match self
            .repository
            .find_active_automation_task(subject.id, batch_id)
            .await
        {
            Ok(Some(existing)) => {
                info!(
                    event = events::TASK_REUSED,
                    task_id = existing.id,
                    part_number = %part_number,
                    batch_id = %batch_id,
                    "Reusing existing automation task"
                );
                return AutomationOutcome::Reused {
                    task_id: existing.id,
                };
            }
            Ok(None) => {}
            Err(error) => {
                return AutomationOutcome::Failure {
                    part_number,
                    error: error.to_string(),
                }
            }
        }

        let mut task = match self
            .repository
            .create_automation_task(NewAutomationTask::new(subject.id, batch_id))
            .await
        {
            Ok(task) => task,
            Err(error) => {
                return AutomationOutcome::Failure {
                    part_number,
                    error: error.to_string(),
                }
            }
        };

        match self.drive_extraction(&mut task, &part_number).await {
            Ok(()) => {
                info!(
                    event = events::TASK_COMPLETED,
                    task_id = task.id,
                    part_number = %part_number,
                    batch_id = %batch_id,
                    "Automation task completed"
                );
                AutomationOutcome::Success { task_id: task.id }
            }
            Err(error) => {
                let message = error.to_string();
                if task.fail(&message).is_ok() {
                    if let Err(persist_error) =
                        self.repository.update_automation_task(&task).await
                    {
                        warn!(
                            task_id = task.id,
                            error = %persist_error,
                            "Failed to persist failure status"
                        );
                    }
                }
                warn!(
                    event = events::TASK_FAILED,
                    task_id = task.id,
                    part_number = %part_number,
                    batch_id = %batch_id,
                    error = %message,
                    "Automation task failed"
                );
                AutomationOutcome::Failure {
                    part_number,
                    error: message,
                }
            }
        }
    }

    /// Drive one automation task through its forward lifecycle
    async fn drive_extraction(&self, task: &mut AutomationTask, part_number: &str) -> Result<()> {
        task.start_processing()?;
        self.repository.update_automation_task(task).await?;

        let extraction = match timeout(
            self.config.automation_timeout(),
            self.backend.extract(part_number),
        )
        .await
        {
            Ok(Ok(extraction)) => extraction,
            Ok(Err(error)) => return Err(error),
            Err(_) => {
                return Err(WorkflowError::AutomationError(format!(
                    "Extraction timed out after {}s",
                    self.config.automation_timeout_seconds
                )))
            }
        };

        task.extraction_payload = Some(extraction.payload);
        task.mark_data_finished()?;
        self.repository.update_automation_task(task).await?;

        task.mark_store_finished()?;
        self.repository.update_automation_task(task).await?;

        task.mark_completed()?;
        self.repository.update_automation_task(task).await?;
        Ok(())
    }

    /// Create manual tasks for manual decisions, sequentially
    pub async fn execute_manual(
        &self,
        decisions: &[TaskDecision],
        batch_id: &str,
    ) -> StreamSummary {
        let mut summary = StreamSummary::with_total(decisions.len());

        for decision in decisions {
            match self.create_manual_task(decision, batch_id).await {
                Ok(task_id) => {
                    info!(
                        event = events::TASK_CREATED,
                        task_id = task_id,
                        batch_id = %batch_id,
                        priority = %decision.priority,
                        "Manual task created"
                    );
                    summary.record_success(task_id);
                }
                Err((part_number, error)) => {
                    warn!(
                        event = events::TASK_FAILED,
                        part_number = %part_number,
                        batch_id = %batch_id,
                        error = %error,
                        "Manual task creation failed"
                    );
                    summary.record_failure(part_number, error);
                }
            }
        }
        summary
    }

    async fn create_manual_task(
        &self,
        decision: &TaskDecision,
        batch_id: &str,
    ) -> std::result::Result<i64, (String, String)> {
        let Some(record) = decision.work_record() else {
            return Err((
                "unknown".to_string(),
                "decision metadata is missing the originating record".to_string(),
            ));
        };
        let part_number = record.part_number.clone();

        let subject = self
            .repository
            .resolve_subject(&record.part_number, &record.manufacturer)
            .await
            .map_err(|error| (part_number.clone(), error.to_string()))?;

        let context = serde_json::json!({
            "decision_metadata": decision.metadata,
            "priority": decision.priority.to_string(),
            "confidence": decision.confidence,
        });

        let new_task = NewManualTask::new(subject.id, batch_id, editors::WORKFLOW_ORCHESTRATOR)
            .with_note(format!(
                "Generated by workflow orchestrator. Reason: {}",
                decision.reason
            ))
            .with_decision_context(context);

        let task = self
            .repository
            .create_manual_task(new_task)
            .await
            .map_err(|error| (part_number, error.to_string()))?;

        Ok(task.id)
    }
}

fn part_number_of(decision: &TaskDecision) -> String {
    decision
        .work_record()
        .map(|record| record.part_number)
        .unwrap_or_else(|| "unknown".to_string())
}
