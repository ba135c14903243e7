use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowError {
    DatabaseError(String),
    StateTransitionError(String),
    ValidationError(String),
    ConfigurationError(String),
    SourceError(String),
    AutomationError(String),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            WorkflowError::StateTransitionError(msg) => {
                write!(f, "State transition error: {msg}")
            }
            WorkflowError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            WorkflowError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            WorkflowError::SourceError(msg) => write!(f, "Record source error: {msg}"),
            WorkflowError::AutomationError(msg) => write!(f, "Automation error: {msg}"),
        }
    }
}

impl std::error::Error for WorkflowError {}

impl From<crate::state_machine::StateMachineError> for WorkflowError {
    fn from(err: crate::state_machine::StateMachineError) -> Self {
        WorkflowError::StateTransitionError(err.to_string())
    }
}

impl From<sqlx::Error> for WorkflowError {
    fn from(err: sqlx::Error) -> Self {
        WorkflowError::DatabaseError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
