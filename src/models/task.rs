//! # Task Models
//!
//! The two persisted task variants sharing one lifecycle contract.
//! Tasks are created once in `initialized`, mutated only through
//! state-machine transitions, and never deleted by the orchestration core.
//!
//! ## Persisted State Layout
//!
//! Both variants map to rows keyed by `id` with: subject reference,
//! batch id, status (string enum), nullable error message, structured
//! `processing_info` (step name + timestamps) and created/updated
//! timestamps. `AutomationTask` adds the raw extraction payload for
//! audit/replay; `ManualTask` adds editor/validation fields, a free-text
//! note and the decision audit context.

use crate::state_machine::{
    ProcessingInfo, StateMachineError, StateMachineResult, TaskLifecycle, TaskStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted automation task tracking one subject through extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationTask {
    pub id: i64,
    pub subject_id: i64,
    pub batch_id: String,
    pub status: TaskStatus,
    pub error_message: Option<String>,
    pub processing_info: ProcessingInfo,
    /// Raw extraction result, kept for audit and replay
    pub extraction_payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a new automation task (id and timestamps generated
/// by the repository)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAutomationTask {
    pub subject_id: i64,
    pub batch_id: String,
}

impl NewAutomationTask {
    pub fn new(subject_id: i64, batch_id: impl Into<String>) -> Self {
        Self {
            subject_id,
            batch_id: batch_id.into(),
        }
    }
}

impl TaskLifecycle for AutomationTask {
    fn status(&self) -> TaskStatus {
        self.status
    }

    fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    fn processing_info_mut(&mut self) -> &mut ProcessingInfo {
        &mut self.processing_info
    }

    fn set_error_message(&mut self, message: Option<String>) {
        self.error_message = message;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A persisted manual task tracking one subject through human review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualTask {
    pub id: i64,
    pub subject_id: i64,
    pub batch_id: String,
    pub status: TaskStatus,
    pub error_message: Option<String>,
    pub processing_info: ProcessingInfo,
    /// Who the task is assigned to or was created by
    pub editor: String,
    pub validated: bool,
    pub validator: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub source_url: Option<String>,
    /// Decision metadata captured at creation for auditing (priority,
    /// confidence, intermediate scores, originating record)
    pub decision_context: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a new manual task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewManualTask {
    pub subject_id: i64,
    pub batch_id: String,
    pub editor: String,
    pub note: Option<String>,
    pub decision_context: Option<serde_json::Value>,
}

impl NewManualTask {
    pub fn new(subject_id: i64, batch_id: impl Into<String>, editor: impl Into<String>) -> Self {
        Self {
            subject_id,
            batch_id: batch_id.into(),
            editor: editor.into(),
            note: None,
            decision_context: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_decision_context(mut self, context: serde_json::Value) -> Self {
        self.decision_context = Some(context);
        self
    }
}

impl ManualTask {
    /// Record validation by a reviewer. Orthogonal to the status enum and
    /// only legal once the task has reached `completed`.
    pub fn mark_validated(&mut self, validator: impl Into<String>) -> StateMachineResult<()> {
        if self.status != TaskStatus::Completed {
            return Err(StateMachineError::ValidationNotAllowed {
                current: self.status.to_string(),
            });
        }
        self.validated = true;
        self.validator = Some(validator.into());
        self.validated_at = Some(Utc::now());
        self.touch();
        Ok(())
    }
}

impl TaskLifecycle for ManualTask {
    fn status(&self) -> TaskStatus {
        self.status
    }

    fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    fn processing_info_mut(&mut self) -> &mut ProcessingInfo {
        &mut self.processing_info
    }

    fn set_error_message(&mut self, message: Option<String>) {
        self.error_message = message;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::steps;

    fn automation_task() -> AutomationTask {
        AutomationTask {
            id: 1,
            subject_id: 10,
            batch_id: "batch_1".to_string(),
            status: TaskStatus::Initialized,
            error_message: None,
            processing_info: ProcessingInfo::initialized(),
            extraction_payload: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn manual_task() -> ManualTask {
        ManualTask {
            id: 2,
            subject_id: 10,
            batch_id: "batch_1".to_string(),
            status: TaskStatus::Initialized,
            error_message: None,
            processing_info: ProcessingInfo::initialized(),
            editor: "reviewer".to_string(),
            validated: false,
            validator: None,
            validated_at: None,
            note: None,
            source_url: None,
            decision_context: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_full_forward_lifecycle_records_step_metadata() {
        let mut task = automation_task();
        assert_eq!(task.processing_info.current_step, steps::INITIALIZATION);

        task.start_processing().unwrap();
        assert_eq!(task.status, TaskStatus::Processing);
        assert_eq!(task.processing_info.current_step, steps::DATA_PROCESSING);

        task.mark_data_finished().unwrap();
        assert_eq!(task.status, TaskStatus::DataFinished);
        assert!(task.processing_info.data_ready_at.is_some());

        task.mark_store_finished().unwrap();
        assert_eq!(task.status, TaskStatus::StoreFinished);
        assert!(task.processing_info.persist_ready_at.is_some());

        task.mark_completed().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.processing_info.current_step, steps::FINISHED);
        assert!(task.processing_info.ended_at.is_some());
        assert!(task.error_message.is_none());
    }

    #[test]
    fn test_fail_records_error_message() {
        let mut task = automation_task();
        task.start_processing().unwrap();
        task.fail("backend unavailable").unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error_message.as_deref(), Some("backend unavailable"));
        assert!(task.processing_info.ended_at.is_some());
    }

    #[test]
    fn test_no_transition_leaves_a_terminal_state() {
        let mut task = automation_task();
        task.fail("boom").unwrap();
        assert!(task.start_processing().is_err());
        assert!(task.fail("again").is_err());
        assert_eq!(task.status, TaskStatus::Failed);
    }

    #[test]
    fn test_transitions_cannot_repeat() {
        let mut task = manual_task();
        task.start_processing().unwrap();
        assert!(task.start_processing().is_err());
        assert_eq!(task.status, TaskStatus::Processing);
    }

    #[test]
    fn test_validation_requires_completion() {
        let mut task = manual_task();
        assert!(task.mark_validated("qa").is_err());

        task.start_processing().unwrap();
        task.mark_data_finished().unwrap();
        task.mark_store_finished().unwrap();
        task.mark_completed().unwrap();

        task.mark_validated("qa").unwrap();
        assert!(task.validated);
        assert_eq!(task.validator.as_deref(), Some("qa"));
        assert!(task.validated_at.is_some());
        // Validation does not move the status enum
        assert_eq!(task.status, TaskStatus::Completed);
    }
}
