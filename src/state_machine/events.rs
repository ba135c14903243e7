use serde::{Deserialize, Serialize};

/// Events that can trigger task lifecycle transitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TaskEvent {
    /// Start working the task
    Start,
    /// Mark data gathering as finished
    DataFinished,
    /// Mark the store write as finished
    StoreFinished,
    /// Mark task as complete
    Complete,
    /// Mark task as failed with error message
    Fail(String),
}

impl TaskEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::DataFinished => "data_finished",
            Self::StoreFinished => "store_finished",
            Self::Complete => "complete",
            Self::Fail(_) => "fail",
        }
    }

    /// Create a failure event with the given error message
    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}
