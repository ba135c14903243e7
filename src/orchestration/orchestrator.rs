//! # Workflow Orchestrator
//!
//! Top-level coordinator for one batch run: fetch candidate records,
//! classify each onto the automation or manual path, execute both streams,
//! reroute automation failures to manual fallback tasks and report a
//! batch-level result. Also serves the monitoring queries (batch rollup
//! status, pending manual listings) straight from the repository.

use super::aggregator::BatchStatusAggregator;
use super::decision_engine::DecisionEngine;
use super::executor::TaskExecutor;
use super::fallback::FallbackHandler;
use super::types::{
    BatchResult, BatchStatus, DecisionCounts, PendingManualTask, RunOptions,
};
use crate::config::WorkflowConfig;
use crate::constants::events;
use crate::error::{Result, WorkflowError};
use crate::models::{TaskDecision, TaskPriority, TaskType};
use crate::repository::TaskRepository;
use crate::services::{AutomationBackend, RecordSource};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

pub struct WorkflowOrchestrator {
    config: WorkflowConfig,
    repository: Arc<dyn TaskRepository>,
    source: Arc<dyn RecordSource>,
    decision_engine: DecisionEngine,
    executor: TaskExecutor,
    fallback: FallbackHandler,
    aggregator: BatchStatusAggregator,
}

impl WorkflowOrchestrator {
    pub fn new(
        config: WorkflowConfig,
        repository: Arc<dyn TaskRepository>,
        source: Arc<dyn RecordSource>,
        backend: Arc<dyn AutomationBackend>,
    ) -> Self {
        let decision_engine = DecisionEngine::new(config.clone(), Arc::clone(&repository));
        let executor = TaskExecutor::new(config.clone(), Arc::clone(&repository), backend);
        let fallback = FallbackHandler::new(Arc::clone(&repository));
        let aggregator = BatchStatusAggregator::new(Arc::clone(&repository));
        Self {
            config,
            repository,
            source,
            decision_engine,
            executor,
            fallback,
            aggregator,
        }
    }

    /// Run one batch end to end
    pub async fn run(&self, options: RunOptions) -> Result<BatchResult> {
        let force_type = resolve_force_type(&options)?;
        let started = Instant::now();

        let batch_id = options
            .batch_id
            .clone()
            .unwrap_or_else(generate_batch_id);
        let limit = if options.limit == 0 {
            self.config.max_batch_size
        } else {
            options.limit.min(self.config.max_batch_size)
        };
        let priority_threshold = options
            .priority_threshold
            .or(Some(self.config.automation_priority_threshold));

        info!(
            event = events::BATCH_STARTED,
            batch_id = %batch_id,
            limit = limit,
            "Batch run started"
        );

        // Source unavailability is the one failure that aborts the run
        let records = self.source.fetch_records(limit, priority_threshold).await?;

        if records.is_empty() {
            info!(
                event = events::BATCH_NO_DATA,
                batch_id = %batch_id,
                "No records to process"
            );
            return Ok(BatchResult {
                batch_id,
                total_records: 0,
                automation_decisions: 0,
                manual_decisions: 0,
                automation: None,
                manual: None,
                fallback: None,
                processing_time_ms: elapsed_ms(started),
            });
        }

        let mut decisions: Vec<TaskDecision> = Vec::with_capacity(records.len());
        for record in &records {
            decisions.push(self.decision_engine.decide(record, force_type).await);
        }

        let counts = DecisionCounts::tally(decisions.iter().map(|d| d.task_type));
        let (automation_decisions, manual_decisions): (Vec<_>, Vec<_>) = decisions
            .into_iter()
            .partition(|d| d.task_type == TaskType::Automation);

        let automation = self
            .executor
            .execute_automation(&automation_decisions, &batch_id)
            .await;
        let manual = self
            .executor
            .execute_manual(&manual_decisions, &batch_id)
            .await;

        let fallback = if self.config.automation_failure_to_manual && !automation.errors.is_empty()
        {
            Some(self.fallback.process(&automation.errors, &batch_id).await)
        } else {
            None
        };

        let result = BatchResult {
            batch_id: batch_id.clone(),
            total_records: records.len(),
            automation_decisions: counts.automation,
            manual_decisions: counts.manual,
            automation: Some(automation),
            manual: Some(manual),
            fallback,
            processing_time_ms: elapsed_ms(started),
        };

        info!(
            event = events::BATCH_COMPLETED,
            batch_id = %batch_id,
            total_records = result.total_records,
            automation_decisions = result.automation_decisions,
            manual_decisions = result.manual_decisions,
            processing_time_ms = result.processing_time_ms,
            "Batch run completed"
        );
        Ok(result)
    }

    /// Batch rollup status computed on demand from the persisted tasks
    pub async fn batch_status(&self, batch_id: &str) -> Result<BatchStatus> {
        self.aggregator.status(batch_id).await
    }

    /// Open manual tasks for review queues, newest first, optionally
    /// filtered to one priority
    pub async fn pending_manual_tasks(
        &self,
        limit: Option<usize>,
        priority_filter: Option<TaskPriority>,
    ) -> Result<Vec<PendingManualTask>> {
        let limit = limit.unwrap_or(self.config.manual_batch_size);
        let tasks = self.repository.pending_manual_tasks(limit).await?;

        let mut pending = Vec::with_capacity(tasks.len());
        for task in tasks {
            let (priority, confidence) = decision_summary(task.decision_context.as_ref());
            if let Some(wanted) = priority_filter {
                if priority != wanted {
                    continue;
                }
            }

            let part_number = match self.repository.find_subject(task.subject_id).await {
                Ok(subject) => subject.map(|s| s.part_number),
                Err(error) => {
                    warn!(
                        task_id = task.id,
                        subject_id = task.subject_id,
                        error = %error,
                        "Subject lookup failed for pending manual task"
                    );
                    None
                }
            };

            pending.push(PendingManualTask {
                task_id: task.id,
                subject_id: task.subject_id,
                part_number,
                batch_id: task.batch_id,
                status: task.status,
                editor: task.editor,
                note: task.note,
                priority,
                confidence,
            });
        }
        Ok(pending)
    }
}

/// Validate the mutually exclusive force flags before any work starts
fn resolve_force_type(options: &RunOptions) -> Result<Option<TaskType>> {
    match (options.force_automation, options.force_manual) {
        (true, true) => Err(WorkflowError::ValidationError(
            "force_automation and force_manual are mutually exclusive".to_string(),
        )),
        (true, false) => Ok(Some(TaskType::Automation)),
        (false, true) => Ok(Some(TaskType::Manual)),
        (false, false) => Ok(None),
    }
}

fn generate_batch_id() -> String {
    let fragment = Uuid::new_v4().simple().to_string();
    format!(
        "batch_{}_{}",
        Utc::now().format("%Y%m%d%H%M%S"),
        &fragment[..8]
    )
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Pull priority and confidence back out of the decision audit context,
/// falling back to Medium / 0.5 for tasks created without one
fn decision_summary(context: Option<&serde_json::Value>) -> (TaskPriority, f64) {
    let priority = context
        .and_then(|c| c.get("priority"))
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .unwrap_or(TaskPriority::Medium);
    let confidence = context
        .and_then(|c| c.get("confidence"))
        .and_then(|v| v.as_f64())
        .unwrap_or(0.5);
    (priority, confidence)
}
