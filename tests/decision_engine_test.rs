//! Decision engine classification scenarios against the in-memory store.

use chrono::{DateTime, Utc};
use imputer_core::config::WorkflowConfig;
use imputer_core::models::{
    AutomationTask, DocumentKind, DocumentRef, SpecEntry, TaskPriority, TaskType, WorkRecord,
};
use imputer_core::orchestration::DecisionEngine;
use imputer_core::repository::{InMemoryTaskRepository, TaskRepository};
use imputer_core::state_machine::{ProcessingInfo, TaskLifecycle, TaskStatus};
use std::sync::Arc;

fn engine(repository: Arc<InMemoryTaskRepository>) -> DecisionEngine {
    DecisionEngine::new(WorkflowConfig::default(), repository)
}

/// part_number + manufacturer + description: completeness 0.6
fn medium_record(part_number: &str, manufacturer: &str, priority: f64) -> WorkRecord {
    let mut record = WorkRecord::new(part_number, manufacturer);
    record.description = "Adjustable linear voltage regulator".to_string();
    record.priority_score = priority;
    record
}

/// Everything but images: completeness 0.95
fn rich_record(part_number: &str, priority: f64) -> WorkRecord {
    let mut record = medium_record(part_number, "Texas Instruments", priority);
    record.categories = vec!["regulators".to_string()];
    record.specs = vec![SpecEntry {
        name: "output_current".to_string(),
        value: "1.5A".to_string(),
        note: None,
        source: None,
    }];
    record.documents = vec![DocumentRef {
        url: "https://example.com/ds.pdf".to_string(),
        kind: DocumentKind::Datasheet,
        note: None,
        source: None,
    }];
    record
}

/// part_number only: completeness 0.3
fn sparse_record(part_number: &str, priority: f64) -> WorkRecord {
    let mut record = WorkRecord::new(part_number, "");
    record.priority_score = priority;
    record
}

async fn seed_failures(repo: &InMemoryTaskRepository, part_number: &str, count: usize) {
    seed_failures_at(repo, part_number, count, Utc::now()).await;
}

/// Seed pre-existing failed automation history at a given point in time
async fn seed_failures_at(
    repo: &InMemoryTaskRepository,
    part_number: &str,
    count: usize,
    created_at: DateTime<Utc>,
) {
    let subject = repo.resolve_subject(part_number, "Acme").await.unwrap();
    for i in 0..count {
        let mut task = AutomationTask {
            id: 9000 + i as i64,
            subject_id: subject.id,
            batch_id: format!("hist_{i}"),
            status: TaskStatus::Initialized,
            error_message: None,
            processing_info: ProcessingInfo::initialized(),
            extraction_payload: None,
            created_at,
            updated_at: created_at,
        };
        task.fail("extraction error").unwrap();
        repo.seed_automation_task(task);
    }
}

#[tokio::test]
async fn high_completeness_goes_to_manual_review() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let decision = engine(Arc::clone(&repo))
        .decide(&rich_record("LM317T", 0.5), None)
        .await;

    assert_eq!(decision.task_type, TaskType::Manual);
    assert_eq!(decision.priority, TaskPriority::High);
    assert!(decision.reason.contains("High data completeness"));
}

#[tokio::test]
async fn low_completeness_high_priority_goes_to_automation() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let decision = engine(Arc::clone(&repo))
        .decide(&sparse_record("BC547", 0.7), None)
        .await;

    assert_eq!(decision.task_type, TaskType::Automation);
    assert_eq!(decision.priority, TaskPriority::High);
    assert!((decision.confidence - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn low_completeness_low_priority_is_not_worth_automation() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let decision = engine(Arc::clone(&repo))
        .decide(&sparse_record("BC547", 0.1), None)
        .await;

    assert_eq!(decision.task_type, TaskType::Manual);
    assert_eq!(decision.priority, TaskPriority::Low);
    assert!(decision.reason.contains("Very low priority"));
}

#[tokio::test]
async fn medium_completeness_with_unreliable_manufacturer_goes_manual() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    // Three failures and no successes for Acme on another part:
    // reliability (0 + 1) / (3 + 2) = 0.2
    seed_failures(&repo, "OLD-PART", 3).await;

    let decision = engine(Arc::clone(&repo))
        .decide(&medium_record("NEW-PART", "Acme", 0.5), None)
        .await;

    assert_eq!(decision.task_type, TaskType::Manual);
    assert_eq!(decision.priority, TaskPriority::Medium);
    assert!(decision.reason.contains("low reliability/priority"));
}

#[tokio::test]
async fn medium_completeness_with_good_history_goes_to_automation() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    // Unseen manufacturer scores 0.5, which clears the 0.4 reliability bar
    let decision = engine(Arc::clone(&repo))
        .decide(&medium_record("NEW-PART", "Nexperia", 0.5), None)
        .await;

    assert_eq!(decision.task_type, TaskType::Automation);
    assert_eq!(decision.priority, TaskPriority::Medium);
    // 0.6 + 0.5 * 0.2 + 0.5 * 0.2
    assert!((decision.confidence - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn repeated_recent_failures_escalate_permanently_to_manual() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    seed_failures(&repo, "FLAKY-1", 3).await;

    // Even an otherwise automation-friendly record is escalated
    let decision = engine(Arc::clone(&repo))
        .decide(&sparse_record("FLAKY-1", 0.7), None)
        .await;

    assert_eq!(decision.task_type, TaskType::Manual);
    assert_eq!(decision.priority, TaskPriority::High);
    assert!(decision.reason.contains("Too many recent automation failures"));
}

#[tokio::test]
async fn stale_failures_outside_the_window_do_not_escalate() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    seed_failures_at(&repo, "FLAKY-2", 3, Utc::now() - chrono::Duration::days(30)).await;

    let decision = engine(Arc::clone(&repo))
        .decide(&sparse_record("FLAKY-2", 0.7), None)
        .await;

    assert_eq!(decision.task_type, TaskType::Automation);
    assert_eq!(decision.priority, TaskPriority::High);
}

#[tokio::test]
async fn forced_type_bypasses_scoring() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let decision = engine(Arc::clone(&repo))
        .decide(&rich_record("LM317T", 0.5), Some(TaskType::Automation))
        .await;

    assert_eq!(decision.task_type, TaskType::Automation);
    assert_eq!(decision.confidence, 1.0);
    assert_eq!(decision.reason, "Forced task type");
}

#[tokio::test]
async fn decision_metadata_carries_the_record() {
    let repo = Arc::new(InMemoryTaskRepository::new());
    let record = rich_record("LM317T", 0.5);
    let decision = engine(Arc::clone(&repo)).decide(&record, None).await;

    assert_eq!(decision.work_record().unwrap(), record);
    assert!(decision.metadata.contains_key("decision_factor"));
}
