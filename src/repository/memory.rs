//! In-memory task repository used by tests and embedded runs.
//!
//! All state lives behind one lock so multi-table queries observe a
//! consistent snapshot; no lock is held across an await point.

use super::{Subject, TaskRepository};
use crate::error::{Result, WorkflowError};
use crate::models::{AutomationTask, ManualTask, NewAutomationTask, NewManualTask};
use crate::scoring::ManufacturerStats;
use crate::state_machine::{ProcessingInfo, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Inner {
    next_subject_id: i64,
    next_task_id: i64,
    subjects: HashMap<i64, Subject>,
    subject_ids_by_part: HashMap<String, i64>,
    automation_tasks: HashMap<i64, AutomationTask>,
    manual_tasks: HashMap<i64, ManualTask>,
}

impl Inner {
    fn next_subject_id(&mut self) -> i64 {
        self.next_subject_id += 1;
        self.next_subject_id
    }

    fn next_task_id(&mut self) -> i64 {
        self.next_task_id += 1;
        self.next_task_id
    }
}

/// Lock-guarded in-memory implementation of [`TaskRepository`]
#[derive(Debug, Default)]
pub struct InMemoryTaskRepository {
    inner: RwLock<Inner>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: fetch an automation task by id
    pub fn automation_task(&self, id: i64) -> Option<AutomationTask> {
        self.inner.read().automation_tasks.get(&id).cloned()
    }

    /// Test hook: fetch a manual task by id
    pub fn manual_task(&self, id: i64) -> Option<ManualTask> {
        self.inner.read().manual_tasks.get(&id).cloned()
    }

    /// Test hook: seed a pre-existing automation task (e.g. historical
    /// failures for decision-engine scenarios)
    pub fn seed_automation_task(&self, task: AutomationTask) {
        let mut inner = self.inner.write();
        inner.next_task_id = inner.next_task_id.max(task.id);
        inner.automation_tasks.insert(task.id, task);
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn resolve_subject(&self, part_number: &str, manufacturer: &str) -> Result<Subject> {
        if part_number.trim().is_empty() {
            return Err(WorkflowError::ValidationError(
                "subject part number must not be empty".to_string(),
            ));
        }

        let mut inner = self.inner.write();
        if let Some(id) = inner.subject_ids_by_part.get(part_number) {
            let id = *id;
            return Ok(inner.subjects[&id].clone());
        }

        let subject = Subject {
            id: inner.next_subject_id(),
            part_number: part_number.to_string(),
            manufacturer: manufacturer.to_string(),
        };
        inner
            .subject_ids_by_part
            .insert(part_number.to_string(), subject.id);
        inner.subjects.insert(subject.id, subject.clone());
        Ok(subject)
    }

    async fn find_subject(&self, subject_id: i64) -> Result<Option<Subject>> {
        Ok(self.inner.read().subjects.get(&subject_id).cloned())
    }

    async fn create_automation_task(
        &self,
        new_task: NewAutomationTask,
    ) -> Result<AutomationTask> {
        let mut inner = self.inner.write();
        let now = Utc::now();
        let task = AutomationTask {
            id: inner.next_task_id(),
            subject_id: new_task.subject_id,
            batch_id: new_task.batch_id,
            status: TaskStatus::Initialized,
            error_message: None,
            processing_info: ProcessingInfo::initialized(),
            extraction_payload: None,
            created_at: now,
            updated_at: now,
        };
        inner.automation_tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn create_manual_task(&self, new_task: NewManualTask) -> Result<ManualTask> {
        let mut inner = self.inner.write();
        let now = Utc::now();
        let task = ManualTask {
            id: inner.next_task_id(),
            subject_id: new_task.subject_id,
            batch_id: new_task.batch_id,
            status: TaskStatus::Initialized,
            error_message: None,
            processing_info: ProcessingInfo::initialized(),
            editor: new_task.editor,
            validated: false,
            validator: None,
            validated_at: None,
            note: new_task.note,
            source_url: None,
            decision_context: new_task.decision_context,
            created_at: now,
            updated_at: now,
        };
        inner.manual_tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_automation_task(&self, task: &AutomationTask) -> Result<()> {
        let mut inner = self.inner.write();
        match inner.automation_tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(())
            }
            None => Err(WorkflowError::DatabaseError(format!(
                "automation task {} not found",
                task.id
            ))),
        }
    }

    async fn update_manual_task(&self, task: &ManualTask) -> Result<()> {
        let mut inner = self.inner.write();
        match inner.manual_tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(())
            }
            None => Err(WorkflowError::DatabaseError(format!(
                "manual task {} not found",
                task.id
            ))),
        }
    }

    async fn find_active_automation_task(
        &self,
        subject_id: i64,
        batch_id: &str,
    ) -> Result<Option<AutomationTask>> {
        let inner = self.inner.read();
        Ok(inner
            .automation_tasks
            .values()
            .find(|task| {
                task.subject_id == subject_id
                    && task.batch_id == batch_id
                    && task.status != TaskStatus::Failed
            })
            .cloned())
    }

    async fn automation_tasks_for_batch(&self, batch_id: &str) -> Result<Vec<AutomationTask>> {
        let inner = self.inner.read();
        Ok(inner
            .automation_tasks
            .values()
            .filter(|task| task.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn manual_tasks_for_batch(&self, batch_id: &str) -> Result<Vec<ManualTask>> {
        let inner = self.inner.read();
        Ok(inner
            .manual_tasks
            .values()
            .filter(|task| task.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn pending_manual_tasks(&self, limit: usize) -> Result<Vec<ManualTask>> {
        let inner = self.inner.read();
        let mut tasks: Vec<ManualTask> = inner
            .manual_tasks
            .values()
            .filter(|task| {
                matches!(task.status, TaskStatus::Initialized | TaskStatus::Processing)
            })
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks.truncate(limit);
        Ok(tasks)
    }

    async fn recent_automation_failures(
        &self,
        part_number: &str,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        let inner = self.inner.read();
        let Some(subject_id) = inner.subject_ids_by_part.get(part_number).copied() else {
            return Ok(0);
        };
        Ok(inner
            .automation_tasks
            .values()
            .filter(|task| {
                task.subject_id == subject_id
                    && task.status == TaskStatus::Failed
                    && task.created_at >= since
            })
            .count() as u64)
    }

    async fn manufacturer_stats(&self, manufacturer: &str) -> Result<Option<ManufacturerStats>> {
        let inner = self.inner.read();
        let subject_ids: Vec<i64> = inner
            .subjects
            .values()
            .filter(|subject| subject.manufacturer == manufacturer)
            .map(|subject| subject.id)
            .collect();

        if subject_ids.is_empty() {
            return Ok(None);
        }

        let mut stats = ManufacturerStats::default();
        for task in inner.automation_tasks.values() {
            if !subject_ids.contains(&task.subject_id) {
                continue;
            }
            match task.status {
                TaskStatus::Completed => stats.successes += 1,
                TaskStatus::Failed => stats.failures += 1,
                _ => {}
            }
        }
        Ok(Some(stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::TaskLifecycle;

    #[test]
    fn test_resolve_subject_is_idempotent() {
        tokio_test::block_on(async {
            let repo = InMemoryTaskRepository::new();
            let first = repo.resolve_subject("LM317T", "TI").await.unwrap();
            let second = repo.resolve_subject("LM317T", "TI").await.unwrap();
            assert_eq!(first.id, second.id);
        });
    }

    #[tokio::test]
    async fn test_active_task_lookup_skips_failed_tasks() {
        let repo = InMemoryTaskRepository::new();
        let subject = repo.resolve_subject("LM317T", "TI").await.unwrap();

        let mut failed = repo
            .create_automation_task(NewAutomationTask::new(subject.id, "batch_1"))
            .await
            .unwrap();
        failed.fail("dead").unwrap();
        repo.update_automation_task(&failed).await.unwrap();

        assert!(repo
            .find_active_automation_task(subject.id, "batch_1")
            .await
            .unwrap()
            .is_none());

        let live = repo
            .create_automation_task(NewAutomationTask::new(subject.id, "batch_1"))
            .await
            .unwrap();
        let found = repo
            .find_active_automation_task(subject.id, "batch_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, live.id);
    }

    #[tokio::test]
    async fn test_manufacturer_stats_distinguish_unseen_and_zero_history() {
        let repo = InMemoryTaskRepository::new();
        assert!(repo.manufacturer_stats("Nexperia").await.unwrap().is_none());

        let subject = repo.resolve_subject("BC547", "Nexperia").await.unwrap();
        let stats = repo.manufacturer_stats("Nexperia").await.unwrap().unwrap();
        assert_eq!(stats.total(), 0);

        let mut task = repo
            .create_automation_task(NewAutomationTask::new(subject.id, "batch_1"))
            .await
            .unwrap();
        task.start_processing().unwrap();
        task.mark_data_finished().unwrap();
        task.mark_store_finished().unwrap();
        task.mark_completed().unwrap();
        repo.update_automation_task(&task).await.unwrap();

        let stats = repo.manufacturer_stats("Nexperia").await.unwrap().unwrap();
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test]
    async fn test_recent_failures_respect_window() {
        let repo = InMemoryTaskRepository::new();
        let subject = repo.resolve_subject("LM317T", "TI").await.unwrap();

        let mut task = repo
            .create_automation_task(NewAutomationTask::new(subject.id, "batch_1"))
            .await
            .unwrap();
        task.fail("boom").unwrap();
        repo.update_automation_task(&task).await.unwrap();

        let week_ago = Utc::now() - chrono::Duration::days(7);
        assert_eq!(
            repo.recent_automation_failures("LM317T", week_ago)
                .await
                .unwrap(),
            1
        );

        let tomorrow = Utc::now() + chrono::Duration::days(1);
        assert_eq!(
            repo.recent_automation_failures("LM317T", tomorrow)
                .await
                .unwrap(),
            0
        );
    }
}
