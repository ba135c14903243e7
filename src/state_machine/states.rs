use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states shared by automation and manual tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Initial state when task is created
    Initialized,
    /// Task is currently being worked (extraction or manual editing)
    Processing,
    /// Data gathering finished, store write pending
    DataFinished,
    /// Store write finished, finalization pending
    StoreFinished,
    /// Task completed successfully
    Completed,
    /// Task failed with an error
    Failed,
}

impl TaskStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if this is an active state (task is being processed)
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Processing | Self::DataFinished | Self::StoreFinished
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized => write!(f, "initialized"),
            Self::Processing => write!(f, "processing"),
            Self::DataFinished => write!(f, "data_finished"),
            Self::StoreFinished => write!(f, "store_finished"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initialized" => Ok(Self::Initialized),
            "processing" => Ok(Self::Processing),
            "data_finished" => Ok(Self::DataFinished),
            "store_finished" => Ok(Self::StoreFinished),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Initialized
    }
}
