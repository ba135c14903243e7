//! Shared task lifecycle: the transition table over `(TaskStatus, TaskEvent)`
//! and the `TaskLifecycle` trait both task variants implement.
//!
//! Forward transitions are strictly sequential
//! (`initialized → processing → data_finished → store_finished → completed`);
//! `Fail` is accepted from any non-terminal state. Terminal states accept
//! nothing. Each transition records the current step name and a timestamp
//! into [`ProcessingInfo`] and touches the task's `updated_at`.

use super::errors::{StateMachineError, StateMachineResult};
use super::events::TaskEvent;
use super::states::TaskStatus;
use crate::constants::steps;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamped step log carried by every task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub current_step: String,
    pub started_at: Option<DateTime<Utc>>,
    pub data_ready_at: Option<DateTime<Utc>>,
    pub persist_ready_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ProcessingInfo {
    /// Step log for a freshly initialized task
    pub fn initialized() -> Self {
        Self {
            current_step: steps::INITIALIZATION.to_string(),
            started_at: Some(Utc::now()),
            data_ready_at: None,
            persist_ready_at: None,
            ended_at: None,
        }
    }
}

impl Default for ProcessingInfo {
    fn default() -> Self {
        Self::initialized()
    }
}

/// Resolve the target state for an event, or reject the transition
pub fn target_state(current: TaskStatus, event: &TaskEvent) -> StateMachineResult<TaskStatus> {
    let target = match (current, event) {
        (TaskStatus::Initialized, TaskEvent::Start) => TaskStatus::Processing,
        (TaskStatus::Processing, TaskEvent::DataFinished) => TaskStatus::DataFinished,
        (TaskStatus::DataFinished, TaskEvent::StoreFinished) => TaskStatus::StoreFinished,
        (TaskStatus::StoreFinished, TaskEvent::Complete) => TaskStatus::Completed,

        // Failure is reachable from any non-terminal state
        (from, TaskEvent::Fail(_)) if !from.is_terminal() => TaskStatus::Failed,

        (from, event) => {
            return Err(StateMachineError::InvalidTransition {
                from: from.to_string(),
                event: event.event_type().to_string(),
            })
        }
    };

    Ok(target)
}

/// Lifecycle contract shared by `AutomationTask` and `ManualTask`
pub trait TaskLifecycle {
    fn status(&self) -> TaskStatus;
    fn set_status(&mut self, status: TaskStatus);
    fn processing_info_mut(&mut self) -> &mut ProcessingInfo;
    fn set_error_message(&mut self, message: Option<String>);
    /// Refresh the task's `updated_at` timestamp
    fn touch(&mut self);

    /// Apply a lifecycle event, recording step metadata on success
    fn apply(&mut self, event: TaskEvent) -> StateMachineResult<TaskStatus> {
        let target = target_state(self.status(), &event)?;
        let now = Utc::now();

        {
            let info = self.processing_info_mut();
            match &event {
                TaskEvent::Start => {
                    info.current_step = steps::DATA_PROCESSING.to_string();
                }
                TaskEvent::DataFinished => {
                    info.current_step = steps::STORE_WRITING.to_string();
                    info.data_ready_at = Some(now);
                }
                TaskEvent::StoreFinished => {
                    info.current_step = steps::FINALIZATION.to_string();
                    info.persist_ready_at = Some(now);
                }
                TaskEvent::Complete => {
                    info.current_step = steps::FINISHED.to_string();
                    info.ended_at = Some(now);
                }
                TaskEvent::Fail(_) => {
                    info.ended_at = Some(now);
                }
            }
        }

        if let TaskEvent::Fail(message) = &event {
            self.set_error_message(Some(message.clone()));
        }

        self.set_status(target);
        self.touch();
        Ok(target)
    }

    fn start_processing(&mut self) -> StateMachineResult<TaskStatus> {
        self.apply(TaskEvent::Start)
    }

    fn mark_data_finished(&mut self) -> StateMachineResult<TaskStatus> {
        self.apply(TaskEvent::DataFinished)
    }

    fn mark_store_finished(&mut self) -> StateMachineResult<TaskStatus> {
        self.apply(TaskEvent::StoreFinished)
    }

    fn mark_completed(&mut self) -> StateMachineResult<TaskStatus> {
        self.apply(TaskEvent::Complete)
    }

    /// The only transition callable from any non-terminal state
    fn fail(&mut self, message: impl Into<String>) -> StateMachineResult<TaskStatus> {
        self.apply(TaskEvent::fail_with_error(message))
    }
}
