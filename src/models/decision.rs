//! # Task Decision Model
//!
//! Classification output for one work record: which execution path handles
//! it, with what priority, and why. Metadata carries the originating record
//! and intermediate scores for downstream task creation and auditing; it is
//! never consulted for control flow.

use crate::models::record::WorkRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which execution path handles a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Automation,
    Manual,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Automation => write!(f, "automation"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Task priority bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Invalid task priority: {s}")),
        }
    }
}

/// Decision result for task delegation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDecision {
    pub task_type: TaskType,
    pub priority: TaskPriority,
    /// Human-readable rationale, never parsed programmatically
    pub reason: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Opaque audit payload: originating record plus intermediate scores
    pub metadata: HashMap<String, serde_json::Value>,
}

impl TaskDecision {
    /// Attach the originating record to the decision metadata
    pub fn with_record(mut self, record: &WorkRecord) -> Self {
        if let Ok(value) = serde_json::to_value(record) {
            self.metadata.insert("record".to_string(), value);
        }
        self
    }

    /// Recover the originating record from the decision metadata
    pub fn work_record(&self) -> Option<WorkRecord> {
        self.metadata
            .get("record")
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}
