//! # Decision Engine
//!
//! Classifies each work record onto the automation or manual path. The
//! engine never raises to the caller: any internal failure is converted
//! into a Manual/Low decision with confidence 0 so that automation is
//! never silently assumed on error.

use crate::config::WorkflowConfig;
use crate::constants::events;
use crate::error::Result;
use crate::models::{TaskDecision, TaskPriority, TaskType, WorkRecord};
use crate::repository::TaskRepository;
use crate::scoring::{data_completeness, manufacturer_reliability};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DecisionEngine {
    config: WorkflowConfig,
    repository: Arc<dyn TaskRepository>,
}

impl DecisionEngine {
    pub fn new(config: WorkflowConfig, repository: Arc<dyn TaskRepository>) -> Self {
        Self { config, repository }
    }

    /// Decide the execution path for a single record.
    ///
    /// Decision criteria, in order:
    /// 1. Force type if specified
    /// 2. Permanent manual escalation for identifiers with too many recent
    ///    automation failures
    /// 3. High completeness → manual (rich records need human review)
    /// 4. Medium completeness → manufacturer reliability and priority decide
    /// 5. Low completeness → automation (it excels at filling gaps), unless
    ///    the record is too low-value to spend automation budget on
    pub async fn decide(&self, record: &WorkRecord, force_type: Option<TaskType>) -> TaskDecision {
        match self.classify(record, force_type).await {
            Ok(decision) => {
                debug!(
                    event = events::DECISION_MADE,
                    part_number = %record.part_number,
                    task_type = %decision.task_type,
                    priority = %decision.priority,
                    confidence = decision.confidence,
                    reason = %decision.reason,
                    "Decision made"
                );
                decision
            }
            Err(error) => {
                warn!(
                    event = events::DECISION_FAILED,
                    part_number = %record.part_number,
                    error = %error,
                    "Decision failed, defaulting to manual"
                );
                let mut metadata = HashMap::new();
                metadata.insert(
                    "error".to_string(),
                    serde_json::Value::String(error.to_string()),
                );
                TaskDecision {
                    task_type: TaskType::Manual,
                    priority: TaskPriority::Low,
                    reason: format!("Error in decision making: {error}"),
                    confidence: 0.0,
                    metadata,
                }
                .with_record(record)
            }
        }
    }

    async fn classify(
        &self,
        record: &WorkRecord,
        force_type: Option<TaskType>,
    ) -> Result<TaskDecision> {
        if let Some(task_type) = force_type {
            return Ok(TaskDecision {
                task_type,
                priority: TaskPriority::Medium,
                reason: "Forced task type".to_string(),
                confidence: 1.0,
                metadata: HashMap::new(),
            }
            .with_record(record));
        }

        // Permanent escape valve for chronically failing identifiers
        let window_start = Utc::now() - Duration::days(self.config.failure_window_days);
        let recent_failures = self
            .repository
            .recent_automation_failures(&record.part_number, window_start)
            .await?;

        if recent_failures >= u64::from(self.config.max_automation_failures) {
            return Ok(self.build_decision(
                record,
                TaskType::Manual,
                TaskPriority::High,
                format!("Too many recent automation failures ({recent_failures})"),
                0.9,
                "recent_failures",
                &[("failures", serde_json::json!(recent_failures))],
            ));
        }

        let completeness = data_completeness(record);
        let priority_score = record.priority_score;

        // High completeness: richly-populated records are exactly the ones
        // worth a human's judgment
        if completeness >= 0.8 {
            return Ok(self.build_decision(
                record,
                TaskType::Manual,
                TaskPriority::High,
                format!("High data completeness ({completeness:.2}) - needs human review"),
                completeness,
                "high_completeness",
                &[
                    ("completeness_score", serde_json::json!(completeness)),
                    ("priority_score", serde_json::json!(priority_score)),
                ],
            ));
        }

        // Medium completeness: manufacturer reliability and priority decide
        if completeness >= 0.5 {
            let stats = self
                .repository
                .manufacturer_stats(&record.manufacturer)
                .await?;
            let reliability = manufacturer_reliability(stats);

            let scores: &[(&str, serde_json::Value)] = &[
                ("completeness_score", serde_json::json!(completeness)),
                ("manufacturer_score", serde_json::json!(reliability)),
                ("priority_score", serde_json::json!(priority_score)),
            ];

            if reliability < 0.4 || priority_score < 0.3 {
                return Ok(self.build_decision(
                    record,
                    TaskType::Manual,
                    TaskPriority::Medium,
                    format!(
                        "Medium completeness ({completeness:.2}) with low reliability/priority"
                    ),
                    0.7,
                    "medium_completeness_low_confidence",
                    scores,
                ));
            }

            return Ok(self.build_decision(
                record,
                TaskType::Automation,
                TaskPriority::Medium,
                format!("Medium completeness ({completeness:.2}) with good manufacturer/priority"),
                0.6 + reliability * 0.2 + priority_score * 0.2,
                "medium_completeness_good_confidence",
                scores,
            ));
        }

        // Low completeness: too low-value records are not worth automation
        // budget, the rest are where automation excels
        let scores: &[(&str, serde_json::Value)] = &[
            ("completeness_score", serde_json::json!(completeness)),
            ("priority_score", serde_json::json!(priority_score)),
        ];

        if priority_score < 0.2 {
            return Ok(self.build_decision(
                record,
                TaskType::Manual,
                TaskPriority::Low,
                format!("Very low priority ({priority_score}) despite low completeness"),
                0.6,
                "very_low_priority",
                scores,
            ));
        }

        let priority = if priority_score >= 0.6 {
            TaskPriority::High
        } else {
            TaskPriority::Medium
        };

        Ok(self.build_decision(
            record,
            TaskType::Automation,
            priority,
            format!("Low completeness ({completeness:.2}) - automation excels at filling gaps"),
            0.8,
            "low_completeness_automation_preferred",
            scores,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_decision(
        &self,
        record: &WorkRecord,
        task_type: TaskType,
        priority: TaskPriority,
        reason: String,
        confidence: f64,
        decision_factor: &str,
        scores: &[(&str, serde_json::Value)],
    ) -> TaskDecision {
        let mut metadata = HashMap::new();
        metadata.insert(
            "decision_factor".to_string(),
            serde_json::Value::String(decision_factor.to_string()),
        );
        for (key, value) in scores {
            metadata.insert((*key).to_string(), value.clone());
        }

        TaskDecision {
            task_type,
            priority,
            reason,
            confidence,
            metadata,
        }
        .with_record(record)
    }
}
