//! # Workflow Configuration
//!
//! Configuration for workflow orchestration with sane defaults, optional
//! file-based overrides (`config/workflow.toml`) and environment overrides
//! prefixed with `IMPUTER_` (e.g. `IMPUTER_AUTOMATION_MAX_CONCURRENT=10`).

use crate::constants::defaults;
use crate::error::{Result, WorkflowError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    // Automation criteria
    pub automation_priority_threshold: f64,
    pub automation_max_concurrent: usize,
    pub automation_timeout_seconds: u64,

    // Manual task criteria
    pub manual_priority_threshold: f64,
    pub manual_batch_size: usize,

    // Fallback criteria
    pub automation_failure_to_manual: bool,
    pub max_automation_failures: u32,
    pub failure_window_days: i64,

    // Processing limits
    pub max_daily_tasks: usize,
    pub max_batch_size: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            automation_priority_threshold: defaults::AUTOMATION_PRIORITY_THRESHOLD,
            automation_max_concurrent: defaults::AUTOMATION_MAX_CONCURRENT,
            automation_timeout_seconds: defaults::AUTOMATION_TIMEOUT_SECONDS,
            manual_priority_threshold: defaults::MANUAL_PRIORITY_THRESHOLD,
            manual_batch_size: defaults::MANUAL_BATCH_SIZE,
            automation_failure_to_manual: true,
            max_automation_failures: defaults::MAX_AUTOMATION_FAILURES,
            failure_window_days: defaults::FAILURE_WINDOW_DAYS,
            max_daily_tasks: defaults::MAX_DAILY_TASKS,
            max_batch_size: defaults::MAX_BATCH_SIZE,
        }
    }
}

impl WorkflowConfig {
    /// Load configuration from an optional file plus `IMPUTER_`-prefixed
    /// environment variables layered on top of the defaults.
    pub fn load() -> Result<Self> {
        Self::load_from("config/workflow")
    }

    /// Load configuration with an explicit file stem (no extension)
    pub fn load_from(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("IMPUTER"))
            .build()
            .map_err(|e| {
                WorkflowError::ConfigurationError(format!("Failed to load configuration: {e}"))
            })?;

        let config: Self = settings.try_deserialize().map_err(|e| {
            WorkflowError::ConfigurationError(format!("Invalid configuration: {e}"))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot drive a batch run
    pub fn validate(&self) -> Result<()> {
        if self.automation_max_concurrent == 0 {
            return Err(WorkflowError::ConfigurationError(
                "automation_max_concurrent must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.automation_priority_threshold) {
            return Err(WorkflowError::ConfigurationError(format!(
                "automation_priority_threshold must be within [0, 1], got {}",
                self.automation_priority_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.manual_priority_threshold) {
            return Err(WorkflowError::ConfigurationError(format!(
                "manual_priority_threshold must be within [0, 1], got {}",
                self.manual_priority_threshold
            )));
        }
        if self.max_batch_size == 0 {
            return Err(WorkflowError::ConfigurationError(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        if self.failure_window_days <= 0 {
            return Err(WorkflowError::ConfigurationError(format!(
                "failure_window_days must be positive, got {}",
                self.failure_window_days
            )));
        }
        Ok(())
    }

    /// Timeout applied around each automation backend call
    pub fn automation_timeout(&self) -> Duration {
        Duration::from_secs(self.automation_timeout_seconds)
    }
}
