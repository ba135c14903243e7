//! # Orchestration Types
//!
//! Result and summary types shared across the orchestration components:
//! run options, per-stream execution summaries, fallback summaries and
//! batch rollup status.

use crate::models::{TaskPriority, TaskType};
use crate::state_machine::TaskStatus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Options for a single batch run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Batch identifier; generated when absent
    pub batch_id: Option<String>,
    /// Maximum number of records to process (clamped to `max_batch_size`)
    pub limit: usize,
    /// Override for the record source priority threshold
    pub priority_threshold: Option<f64>,
    /// Force every record onto the automation path
    pub force_automation: bool,
    /// Force every record onto the manual path
    pub force_manual: bool,
}

impl RunOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

/// One failed execution within a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionFailure {
    pub part_number: String,
    pub error: String,
}

/// Order-independent rollup of one execution stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub task_ids: Vec<i64>,
    pub errors: Vec<ExecutionFailure>,
}

impl StreamSummary {
    pub fn with_total(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, task_id: i64) {
        self.successful += 1;
        self.task_ids.push(task_id);
    }

    pub fn record_failure(&mut self, part_number: impl Into<String>, error: impl Into<String>) {
        self.failed += 1;
        self.errors.push(ExecutionFailure {
            part_number: part_number.into(),
            error: error.into(),
        });
    }
}

/// Rollup of fallback manual task creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub task_ids: Vec<i64>,
}

/// Result of one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: String,
    pub total_records: usize,
    pub automation_decisions: usize,
    pub manual_decisions: usize,
    pub automation: Option<StreamSummary>,
    pub manual: Option<StreamSummary>,
    pub fallback: Option<FallbackSummary>,
    pub processing_time_ms: u64,
}

/// Overall batch status, a pure function of the member tasks' statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    NoTasks,
    Completed,
    Failed,
    CompletedWithFailures,
    InProgress,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTasks => write!(f, "no_tasks"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::CompletedWithFailures => write!(f, "completed_with_failures"),
            Self::InProgress => write!(f, "in_progress"),
        }
    }
}

/// Status counts for one task variant within a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub total: usize,
    pub by_status: HashMap<TaskStatus, usize>,
}

impl StatusBreakdown {
    pub fn count(&self, status: TaskStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Batch rollup: per-variant breakdowns plus the overall status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatus {
    pub batch_id: String,
    pub automation: StatusBreakdown,
    pub manual: StatusBreakdown,
    pub overall: OverallStatus,
}

/// Summary of an open manual task for review queues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingManualTask {
    pub task_id: i64,
    pub subject_id: i64,
    pub part_number: Option<String>,
    pub batch_id: String,
    pub status: TaskStatus,
    pub editor: String,
    pub note: Option<String>,
    /// Priority copied from the decision audit context (medium when absent)
    pub priority: TaskPriority,
    /// Confidence copied from the decision audit context (0.5 when absent)
    pub confidence: f64,
}

/// Per-type decision counts for a batch run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionCounts {
    pub automation: usize,
    pub manual: usize,
}

impl DecisionCounts {
    pub fn tally(decisions: impl IntoIterator<Item = TaskType>) -> Self {
        let mut counts = Self::default();
        for task_type in decisions {
            match task_type {
                TaskType::Automation => counts.automation += 1,
                TaskType::Manual => counts.manual += 1,
            }
        }
        counts
    }
}
