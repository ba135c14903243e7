//! End-to-end batch runs over the in-memory repository with stubbed
//! record source and automation backend.

use async_trait::async_trait;
use imputer_core::config::WorkflowConfig;
use imputer_core::constants::editors;
use imputer_core::error::{Result, WorkflowError};
use imputer_core::models::{SpecEntry, TaskPriority, WorkRecord};
use imputer_core::orchestration::{OverallStatus, RunOptions, WorkflowOrchestrator};
use imputer_core::repository::{InMemoryTaskRepository, TaskRepository};
use imputer_core::services::{AutomationBackend, ExtractionResult, RecordSource};
use imputer_core::state_machine::TaskStatus;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct StubSource {
    records: Vec<WorkRecord>,
}

#[async_trait]
impl RecordSource for StubSource {
    async fn fetch_records(
        &self,
        limit: usize,
        _priority_threshold: Option<f64>,
    ) -> Result<Vec<WorkRecord>> {
        Ok(self.records.iter().take(limit).cloned().collect())
    }
}

struct FailingSource;

#[async_trait]
impl RecordSource for FailingSource {
    async fn fetch_records(&self, _: usize, _: Option<f64>) -> Result<Vec<WorkRecord>> {
        Err(WorkflowError::SourceError("warehouse unreachable".to_string()))
    }
}

/// Backend probe that tracks in-flight concurrency and fails configured
/// part numbers
struct ProbeBackend {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
    failing_parts: HashSet<String>,
}

impl ProbeBackend {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: Duration::from_millis(20),
            failing_parts: HashSet::new(),
        }
    }

    fn failing(parts: &[&str]) -> Self {
        Self {
            failing_parts: parts.iter().map(|p| (*p).to_string()).collect(),
            ..Self::new()
        }
    }

    fn max_seen(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AutomationBackend for ProbeBackend {
    async fn extract(&self, part_number: &str) -> Result<ExtractionResult> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_parts.contains(part_number) {
            return Err(WorkflowError::AutomationError(format!(
                "extraction failed for {part_number}"
            )));
        }
        Ok(ExtractionResult::new(serde_json::json!({
            "part_number": part_number,
            "fields": {"package": "TO-220"},
        })))
    }
}

/// Backend that never finishes; only usable under a paused clock
struct HangingBackend;

#[async_trait]
impl AutomationBackend for HangingBackend {
    async fn extract(&self, _part_number: &str) -> Result<ExtractionResult> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ExtractionResult::new(serde_json::Value::Null))
    }
}

/// part_number only with high priority: classified onto the automation path
fn automation_record(part_number: &str) -> WorkRecord {
    let mut record = WorkRecord::new(part_number, "");
    record.priority_score = 0.7;
    record
}

/// Rich enough for the manual path (completeness 0.75 via specs)
fn manual_record(part_number: &str) -> WorkRecord {
    let mut record = WorkRecord::new(part_number, "Texas Instruments");
    record.description = "Adjustable regulator".to_string();
    record.specs = vec![SpecEntry {
        name: "vout".to_string(),
        value: "1.25-37V".to_string(),
        note: None,
        source: None,
    }];
    record.priority_score = 0.1;
    record
}

fn orchestrator(
    config: WorkflowConfig,
    repo: Arc<InMemoryTaskRepository>,
    records: Vec<WorkRecord>,
    backend: Arc<dyn AutomationBackend>,
) -> WorkflowOrchestrator {
    WorkflowOrchestrator::new(config, repo, Arc::new(StubSource { records }), backend)
}

#[tokio::test]
async fn batch_run_partitions_and_executes_both_streams() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let records = vec![
        automation_record("AUTO-1"),
        automation_record("AUTO-2"),
        manual_record("MAN-1"),
    ];
    let orchestrator = orchestrator(
        WorkflowConfig::default(),
        Arc::clone(&repo),
        records,
        Arc::new(ProbeBackend::new()),
    );

    let result = orchestrator
        .run(RunOptions {
            batch_id: Some("batch_mix".to_string()),
            limit: 10,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(result.total_records, 3);
    assert_eq!(result.automation_decisions, 2);
    assert_eq!(result.manual_decisions, 1);

    let automation = result.automation.unwrap();
    assert_eq!(automation.successful, 2);
    assert_eq!(automation.failed, 0);
    assert!(result.fallback.is_none());

    let auto_tasks = repo.automation_tasks_for_batch("batch_mix").await.unwrap();
    assert_eq!(auto_tasks.len(), 2);
    for task in &auto_tasks {
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.extraction_payload.is_some());
    }

    let manual_tasks = repo.manual_tasks_for_batch("batch_mix").await.unwrap();
    assert_eq!(manual_tasks.len(), 1);
    let manual = &manual_tasks[0];
    assert_eq!(manual.status, TaskStatus::Initialized);
    assert_eq!(manual.editor, editors::WORKFLOW_ORCHESTRATOR);
    assert!(manual.note.as_deref().unwrap().contains("Reason:"));
    assert!(manual.decision_context.is_some());
}

#[tokio::test]
async fn automation_concurrency_stays_within_the_bound() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let backend = Arc::new(ProbeBackend::new());
    let records = (0..8)
        .map(|i| automation_record(&format!("AUTO-{i}")))
        .collect();
    let config = WorkflowConfig {
        automation_max_concurrent: 2,
        ..WorkflowConfig::default()
    };
    let probe = Arc::clone(&backend);
    let orchestrator = orchestrator(config, Arc::clone(&repo), records, probe);

    let result = orchestrator.run(RunOptions::with_limit(8)).await.unwrap();

    assert_eq!(result.automation.unwrap().successful, 8);
    assert!(backend.max_seen() >= 1);
    assert!(backend.max_seen() <= 2, "saw {} in flight", backend.max_seen());
}

#[tokio::test]
async fn automation_failures_reroute_to_fallback_manual_tasks() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let backend = Arc::new(ProbeBackend::failing(&["AUTO-1", "AUTO-3"]));
    let records = vec![
        automation_record("AUTO-1"),
        automation_record("AUTO-2"),
        automation_record("AUTO-3"),
    ];
    let orchestrator = orchestrator(
        WorkflowConfig::default(),
        Arc::clone(&repo),
        records,
        backend,
    );

    let result = orchestrator
        .run(RunOptions {
            batch_id: Some("batch_f".to_string()),
            limit: 10,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    let automation = result.automation.unwrap();
    assert_eq!(automation.successful, 1);
    assert_eq!(automation.failed, 2);

    let fallback = result.fallback.unwrap();
    assert_eq!(fallback.total, 2);
    assert_eq!(fallback.successful, 2);
    assert_eq!(fallback.failed, 0);

    let fallback_tasks = repo
        .manual_tasks_for_batch("batch_f_fallback")
        .await
        .unwrap();
    assert_eq!(fallback_tasks.len(), 2);
    for task in &fallback_tasks {
        assert_eq!(task.editor, editors::AUTOMATION_FALLBACK);
        assert!(task.note.as_deref().unwrap().starts_with("Automation failed:"));
        let context = task.decision_context.as_ref().unwrap();
        assert_eq!(context["original_batch_id"], "batch_f");
        assert!(context["fallback_reason"]
            .as_str()
            .unwrap()
            .contains("extraction failed"));
    }
}

#[tokio::test]
async fn fallback_can_be_disabled() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let config = WorkflowConfig {
        automation_failure_to_manual: false,
        ..WorkflowConfig::default()
    };
    let orchestrator = orchestrator(
        config,
        Arc::clone(&repo),
        vec![automation_record("AUTO-1")],
        Arc::new(ProbeBackend::failing(&["AUTO-1"])),
    );

    let result = orchestrator
        .run(RunOptions {
            batch_id: Some("batch_nf".to_string()),
            limit: 10,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(result.automation.unwrap().failed, 1);
    assert!(result.fallback.is_none());
    assert!(repo
        .manual_tasks_for_batch("batch_nf_fallback")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test(start_paused = true)]
async fn hung_extraction_times_out_and_fails_the_task() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let config = WorkflowConfig {
        automation_timeout_seconds: 5,
        automation_failure_to_manual: false,
        ..WorkflowConfig::default()
    };
    let orchestrator = orchestrator(
        config,
        Arc::clone(&repo),
        vec![automation_record("SLOW-1")],
        Arc::new(HangingBackend),
    );

    let result = orchestrator
        .run(RunOptions {
            batch_id: Some("batch_t".to_string()),
            limit: 10,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    let automation = result.automation.unwrap();
    assert_eq!(automation.failed, 1);
    assert!(automation.errors[0].error.contains("timed out"));

    let tasks = repo.automation_tasks_for_batch("batch_t").await.unwrap();
    assert_eq!(tasks[0].status, TaskStatus::Failed);
    assert!(tasks[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn conflicting_force_flags_abort_before_any_work() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let orchestrator = orchestrator(
        WorkflowConfig::default(),
        Arc::clone(&repo),
        vec![automation_record("AUTO-1")],
        Arc::new(ProbeBackend::new()),
    );

    let error = orchestrator
        .run(RunOptions {
            batch_id: Some("batch_x".to_string()),
            limit: 10,
            force_automation: true,
            force_manual: true,
            ..RunOptions::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(error, WorkflowError::ValidationError(_)));
    assert!(repo
        .automation_tasks_for_batch("batch_x")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn force_manual_routes_every_record_to_manual() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let orchestrator = orchestrator(
        WorkflowConfig::default(),
        Arc::clone(&repo),
        vec![automation_record("AUTO-1"), automation_record("AUTO-2")],
        Arc::new(ProbeBackend::new()),
    );

    let result = orchestrator
        .run(RunOptions {
            batch_id: Some("batch_fm".to_string()),
            limit: 10,
            force_manual: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(result.automation_decisions, 0);
    assert_eq!(result.manual_decisions, 2);
    assert_eq!(
        repo.manual_tasks_for_batch("batch_fm").await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn empty_source_short_circuits_without_tasks() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let orchestrator = orchestrator(
        WorkflowConfig::default(),
        Arc::clone(&repo),
        vec![],
        Arc::new(ProbeBackend::new()),
    );

    let result = orchestrator
        .run(RunOptions {
            batch_id: Some("batch_e".to_string()),
            limit: 10,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    assert_eq!(result.total_records, 0);
    assert!(result.automation.is_none());
    assert!(result.manual.is_none());

    let status = orchestrator.batch_status("batch_e").await.unwrap();
    assert_eq!(status.overall, OverallStatus::NoTasks);
}

#[tokio::test]
async fn source_failure_aborts_the_run() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let orchestrator = WorkflowOrchestrator::new(
        WorkflowConfig::default(),
        Arc::clone(&repo) as Arc<dyn TaskRepository>,
        Arc::new(FailingSource),
        Arc::new(ProbeBackend::new()),
    );

    let error = orchestrator
        .run(RunOptions::with_limit(10))
        .await
        .unwrap_err();
    assert!(matches!(error, WorkflowError::SourceError(_)));
}

#[tokio::test]
async fn batch_status_reflects_mixed_terminal_outcomes() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let records = vec![
        automation_record("AUTO-1"),
        automation_record("AUTO-2"),
        automation_record("AUTO-3"),
    ];
    let config = WorkflowConfig {
        automation_failure_to_manual: false,
        ..WorkflowConfig::default()
    };
    let orchestrator = orchestrator(
        config,
        Arc::clone(&repo),
        records,
        Arc::new(ProbeBackend::failing(&["AUTO-2"])),
    );

    orchestrator
        .run(RunOptions {
            batch_id: Some("batch_s".to_string()),
            limit: 10,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    let status = orchestrator.batch_status("batch_s").await.unwrap();
    assert_eq!(status.overall, OverallStatus::CompletedWithFailures);
    assert_eq!(status.automation.total, 3);
    assert_eq!(status.automation.count(TaskStatus::Completed), 2);
    assert_eq!(status.automation.count(TaskStatus::Failed), 1);
    assert_eq!(status.manual.total, 0);
}

#[tokio::test]
async fn rerunning_a_batch_reuses_existing_tasks() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let records = vec![automation_record("AUTO-1"), automation_record("AUTO-2")];
    let orchestrator = orchestrator(
        WorkflowConfig::default(),
        Arc::clone(&repo),
        records,
        Arc::new(ProbeBackend::new()),
    );

    let options = RunOptions {
        batch_id: Some("batch_r".to_string()),
        limit: 10,
        ..RunOptions::default()
    };
    orchestrator.run(options.clone()).await.unwrap();
    let second = orchestrator.run(options).await.unwrap();

    // Second run reports success without creating duplicate tasks
    assert_eq!(second.automation.unwrap().successful, 2);
    assert_eq!(
        repo.automation_tasks_for_batch("batch_r").await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn pending_manual_tasks_carry_decision_priority_and_subject() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let records = vec![manual_record("MAN-1"), manual_record("MAN-2")];
    let orchestrator = orchestrator(
        WorkflowConfig::default(),
        Arc::clone(&repo),
        records,
        Arc::new(ProbeBackend::new()),
    );

    orchestrator
        .run(RunOptions {
            batch_id: Some("batch_p".to_string()),
            limit: 10,
            ..RunOptions::default()
        })
        .await
        .unwrap();

    let pending = orchestrator.pending_manual_tasks(None, None).await.unwrap();
    assert_eq!(pending.len(), 2);
    for task in &pending {
        assert_eq!(task.status, TaskStatus::Initialized);
        assert!(task.part_number.as_deref().unwrap().starts_with("MAN-"));
        // manual_record scores 0.75 with low reliability/priority: Medium
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.confidence > 0.0);
    }

    let high_only = orchestrator
        .pending_manual_tasks(None, Some(TaskPriority::High))
        .await
        .unwrap();
    assert!(high_only.is_empty());
}
