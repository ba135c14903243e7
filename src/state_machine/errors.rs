use thiserror::Error;

/// Errors from task lifecycle transitions
#[derive(Error, Debug)]
pub enum StateMachineError {
    #[error("Invalid state transition from {from:?} on event {event}")]
    InvalidTransition { from: String, event: String },

    #[error("Validation requires a completed task (current status: {current})")]
    ValidationNotAllowed { current: String },
}

pub type StateMachineResult<T> = std::result::Result<T, StateMachineError>;
