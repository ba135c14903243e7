//! # Data Models
//!
//! Work records (external input), task decisions (classification output)
//! and the two persisted task variants.

pub mod decision;
pub mod record;
pub mod task;

pub use decision::{TaskDecision, TaskPriority, TaskType};
pub use record::{DocumentKind, DocumentRef, ImageRef, SpecEntry, WorkRecord};
pub use task::{AutomationTask, ManualTask, NewAutomationTask, NewManualTask};
