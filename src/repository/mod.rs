//! # Task Repository
//!
//! Repository seam over the persistent task store. The orchestration core
//! only talks to this trait; monitoring queries are never backed by
//! process-global mutable state. Two implementations are provided: an
//! in-memory store for tests and embedded runs, and a PostgreSQL store.

pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::{AutomationTask, ManualTask, NewAutomationTask, NewManualTask};
use crate::scoring::ManufacturerStats;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use memory::InMemoryTaskRepository;
pub use postgres::PgTaskRepository;

/// The product/work item a task updates. Tasks reference subjects by id
/// only; there are no back-references from subjects to tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    pub id: i64,
    pub part_number: String,
    pub manufacturer: String,
}

/// Persistent store operations consumed by the orchestration core
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Find the subject for a part number, creating it if absent
    async fn resolve_subject(&self, part_number: &str, manufacturer: &str) -> Result<Subject>;

    async fn find_subject(&self, subject_id: i64) -> Result<Option<Subject>>;

    /// Create an automation task in `initialized`
    async fn create_automation_task(&self, new_task: NewAutomationTask)
        -> Result<AutomationTask>;

    /// Create a manual task in `initialized`
    async fn create_manual_task(&self, new_task: NewManualTask) -> Result<ManualTask>;

    /// Persist lifecycle changes to an existing automation task
    async fn update_automation_task(&self, task: &AutomationTask) -> Result<()>;

    /// Persist lifecycle changes to an existing manual task
    async fn update_manual_task(&self, task: &ManualTask) -> Result<()>;

    /// Find a non-failed automation task for the same subject and batch,
    /// used for idempotent dispatch within a batch
    async fn find_active_automation_task(
        &self,
        subject_id: i64,
        batch_id: &str,
    ) -> Result<Option<AutomationTask>>;

    async fn automation_tasks_for_batch(&self, batch_id: &str) -> Result<Vec<AutomationTask>>;

    async fn manual_tasks_for_batch(&self, batch_id: &str) -> Result<Vec<ManualTask>>;

    /// Open manual tasks (initialized or processing), newest first
    async fn pending_manual_tasks(&self, limit: usize) -> Result<Vec<ManualTask>>;

    /// Count failed automation tasks for a part number created since the
    /// given instant
    async fn recent_automation_failures(
        &self,
        part_number: &str,
        since: DateTime<Utc>,
    ) -> Result<u64>;

    /// Historical automation outcome counts for a manufacturer.
    /// `None` means the manufacturer has never been seen.
    async fn manufacturer_stats(&self, manufacturer: &str) -> Result<Option<ManufacturerStats>>;
}
