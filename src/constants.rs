//! # System Constants
//!
//! Core constants and enums that define the operational boundaries of the
//! imputation workflow orchestration system: default thresholds, lifecycle
//! step names, status groupings and the event names used in structured
//! log records.

// Re-export state types for convenience
pub use crate::state_machine::TaskStatus;

/// Default configuration values for workflow orchestration
pub mod defaults {
    /// Priority threshold applied when fetching records for automation
    pub const AUTOMATION_PRIORITY_THRESHOLD: f64 = 0.8;
    /// Maximum concurrent automation executions
    pub const AUTOMATION_MAX_CONCURRENT: usize = 5;
    /// Per-task timeout around the automation backend call, in seconds
    pub const AUTOMATION_TIMEOUT_SECONDS: u64 = 300;
    /// Priority threshold for manual task listings
    pub const MANUAL_PRIORITY_THRESHOLD: f64 = 0.5;
    /// Default page size for pending manual task listings
    pub const MANUAL_BATCH_SIZE: usize = 50;
    /// Automation failures within the rolling window before an identifier
    /// is permanently escalated to manual handling
    pub const MAX_AUTOMATION_FAILURES: u32 = 3;
    /// Rolling window for counting automation failures, in days
    pub const FAILURE_WINDOW_DAYS: i64 = 7;
    /// Upper bound on tasks created per day (advisory, caller-enforced)
    pub const MAX_DAILY_TASKS: usize = 1000;
    /// Upper bound on records processed in a single batch run
    pub const MAX_BATCH_SIZE: usize = 100;
}

/// Lifecycle step names recorded into a task's processing info
pub mod steps {
    pub const INITIALIZATION: &str = "initialization";
    pub const DATA_PROCESSING: &str = "data_processing";
    pub const STORE_WRITING: &str = "store_writing";
    pub const FINALIZATION: &str = "finalization";
    pub const FINISHED: &str = "finished";
}

/// Editor identities recorded on manual tasks created by the core
pub mod editors {
    pub const WORKFLOW_ORCHESTRATOR: &str = "workflow_orchestrator";
    pub const AUTOMATION_FALLBACK: &str = "automation_fallback";
}

/// Event names attached to structured log records
pub mod events {
    // Batch lifecycle events
    pub const BATCH_STARTED: &str = "batch.started";
    pub const BATCH_COMPLETED: &str = "batch.completed";
    pub const BATCH_NO_DATA: &str = "batch.no_data";

    // Decision events
    pub const DECISION_MADE: &str = "decision.made";
    pub const DECISION_FAILED: &str = "decision.failed";

    // Task lifecycle events
    pub const TASK_CREATED: &str = "task.created";
    pub const TASK_REUSED: &str = "task.reused";
    pub const TASK_COMPLETED: &str = "task.completed";
    pub const TASK_FAILED: &str = "task.failed";

    // Fallback events
    pub const FALLBACK_CREATED: &str = "fallback.created";
    pub const FALLBACK_FAILED: &str = "fallback.failed";
}

/// Status groupings used by rollup and listing queries
pub mod status_groups {
    use crate::state_machine::TaskStatus;

    /// Statuses that count as still-open work for manual review queues
    pub const PENDING_MANUAL: [TaskStatus; 2] = [TaskStatus::Initialized, TaskStatus::Processing];

    /// Terminal statuses (no further transitions)
    pub const TERMINAL: [TaskStatus; 2] = [TaskStatus::Completed, TaskStatus::Failed];
}
