//! PostgreSQL task repository backed by sqlx.
//!
//! Task rows live in `imputer_subjects`, `imputer_automation_tasks` and
//! `imputer_manual_tasks`; `processing_info` and audit payloads are JSONB
//! columns. Schema migrations are owned by the surrounding application.

use super::{Subject, TaskRepository};
use crate::error::{Result, WorkflowError};
use crate::models::{AutomationTask, ManualTask, NewAutomationTask, NewManualTask};
use crate::scoring::ManufacturerStats;
use crate::state_machine::{ProcessingInfo, TaskStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

/// sqlx-backed implementation of [`TaskRepository`]
#[derive(Debug, Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct AutomationTaskRow {
    id: i64,
    subject_id: i64,
    batch_id: String,
    status: String,
    error_message: Option<String>,
    processing_info: Json<ProcessingInfo>,
    extraction_payload: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AutomationTaskRow> for AutomationTask {
    type Error = WorkflowError;

    fn try_from(row: AutomationTaskRow) -> Result<Self> {
        let status: TaskStatus = row.status.parse().map_err(WorkflowError::DatabaseError)?;
        Ok(AutomationTask {
            id: row.id,
            subject_id: row.subject_id,
            batch_id: row.batch_id,
            status,
            error_message: row.error_message,
            processing_info: row.processing_info.0,
            extraction_payload: row.extraction_payload,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ManualTaskRow {
    id: i64,
    subject_id: i64,
    batch_id: String,
    status: String,
    error_message: Option<String>,
    processing_info: Json<ProcessingInfo>,
    editor: String,
    validated: bool,
    validator: Option<String>,
    validated_at: Option<DateTime<Utc>>,
    note: Option<String>,
    source_url: Option<String>,
    decision_context: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ManualTaskRow> for ManualTask {
    type Error = WorkflowError;

    fn try_from(row: ManualTaskRow) -> Result<Self> {
        let status: TaskStatus = row.status.parse().map_err(WorkflowError::DatabaseError)?;
        Ok(ManualTask {
            id: row.id,
            subject_id: row.subject_id,
            batch_id: row.batch_id,
            status,
            error_message: row.error_message,
            processing_info: row.processing_info.0,
            editor: row.editor,
            validated: row.validated,
            validator: row.validator,
            validated_at: row.validated_at,
            note: row.note,
            source_url: row.source_url,
            decision_context: row.decision_context,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const AUTOMATION_COLUMNS: &str = "id, subject_id, batch_id, status, error_message, \
     processing_info, extraction_payload, created_at, updated_at";

const MANUAL_COLUMNS: &str = "id, subject_id, batch_id, status, error_message, \
     processing_info, editor, validated, validator, validated_at, note, source_url, \
     decision_context, created_at, updated_at";

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn resolve_subject(&self, part_number: &str, manufacturer: &str) -> Result<Subject> {
        if part_number.trim().is_empty() {
            return Err(WorkflowError::ValidationError(
                "subject part number must not be empty".to_string(),
            ));
        }

        // Upsert keyed by part number; the no-op update makes RETURNING
        // yield the existing row on conflict
        let subject = sqlx::query_as::<_, Subject>(
            r#"
            INSERT INTO imputer_subjects (part_number, manufacturer)
            VALUES ($1, $2)
            ON CONFLICT (part_number)
            DO UPDATE SET part_number = EXCLUDED.part_number
            RETURNING id, part_number, manufacturer
            "#,
        )
        .bind(part_number)
        .bind(manufacturer)
        .fetch_one(&self.pool)
        .await?;

        Ok(subject)
    }

    async fn find_subject(&self, subject_id: i64) -> Result<Option<Subject>> {
        let subject = sqlx::query_as::<_, Subject>(
            "SELECT id, part_number, manufacturer FROM imputer_subjects WHERE id = $1",
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subject)
    }

    async fn create_automation_task(
        &self,
        new_task: NewAutomationTask,
    ) -> Result<AutomationTask> {
        let row = sqlx::query_as::<_, AutomationTaskRow>(&format!(
            r#"
            INSERT INTO imputer_automation_tasks
                (subject_id, batch_id, status, processing_info, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING {AUTOMATION_COLUMNS}
            "#,
        ))
        .bind(new_task.subject_id)
        .bind(&new_task.batch_id)
        .bind(TaskStatus::Initialized.to_string())
        .bind(Json(ProcessingInfo::initialized()))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn create_manual_task(&self, new_task: NewManualTask) -> Result<ManualTask> {
        let row = sqlx::query_as::<_, ManualTaskRow>(&format!(
            r#"
            INSERT INTO imputer_manual_tasks
                (subject_id, batch_id, status, processing_info, editor, validated,
                 note, decision_context, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, false, $6, $7, NOW(), NOW())
            RETURNING {MANUAL_COLUMNS}
            "#,
        ))
        .bind(new_task.subject_id)
        .bind(&new_task.batch_id)
        .bind(TaskStatus::Initialized.to_string())
        .bind(Json(ProcessingInfo::initialized()))
        .bind(&new_task.editor)
        .bind(&new_task.note)
        .bind(&new_task.decision_context)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update_automation_task(&self, task: &AutomationTask) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE imputer_automation_tasks
            SET status = $2, error_message = $3, processing_info = $4,
                extraction_payload = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(task.status.to_string())
        .bind(&task.error_message)
        .bind(Json(task.processing_info.clone()))
        .bind(&task.extraction_payload)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WorkflowError::DatabaseError(format!(
                "automation task {} not found",
                task.id
            )));
        }
        Ok(())
    }

    async fn update_manual_task(&self, task: &ManualTask) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE imputer_manual_tasks
            SET status = $2, error_message = $3, processing_info = $4, editor = $5,
                validated = $6, validator = $7, validated_at = $8, note = $9,
                source_url = $10, decision_context = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(task.status.to_string())
        .bind(&task.error_message)
        .bind(Json(task.processing_info.clone()))
        .bind(&task.editor)
        .bind(task.validated)
        .bind(&task.validator)
        .bind(task.validated_at)
        .bind(&task.note)
        .bind(&task.source_url)
        .bind(&task.decision_context)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(WorkflowError::DatabaseError(format!(
                "manual task {} not found",
                task.id
            )));
        }
        Ok(())
    }

    async fn find_active_automation_task(
        &self,
        subject_id: i64,
        batch_id: &str,
    ) -> Result<Option<AutomationTask>> {
        let row = sqlx::query_as::<_, AutomationTaskRow>(&format!(
            r#"
            SELECT {AUTOMATION_COLUMNS}
            FROM imputer_automation_tasks
            WHERE subject_id = $1 AND batch_id = $2 AND status <> $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        ))
        .bind(subject_id)
        .bind(batch_id)
        .bind(TaskStatus::Failed.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AutomationTask::try_from).transpose()
    }

    async fn automation_tasks_for_batch(&self, batch_id: &str) -> Result<Vec<AutomationTask>> {
        let rows = sqlx::query_as::<_, AutomationTaskRow>(&format!(
            "SELECT {AUTOMATION_COLUMNS} FROM imputer_automation_tasks WHERE batch_id = $1",
        ))
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AutomationTask::try_from).collect()
    }

    async fn manual_tasks_for_batch(&self, batch_id: &str) -> Result<Vec<ManualTask>> {
        let rows = sqlx::query_as::<_, ManualTaskRow>(&format!(
            "SELECT {MANUAL_COLUMNS} FROM imputer_manual_tasks WHERE batch_id = $1",
        ))
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ManualTask::try_from).collect()
    }

    async fn pending_manual_tasks(&self, limit: usize) -> Result<Vec<ManualTask>> {
        let rows = sqlx::query_as::<_, ManualTaskRow>(&format!(
            r#"
            SELECT {MANUAL_COLUMNS}
            FROM imputer_manual_tasks
            WHERE status = ANY($1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        ))
        .bind(
            crate::constants::status_groups::PENDING_MANUAL
                .iter()
                .map(|status| status.to_string())
                .collect::<Vec<_>>(),
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ManualTask::try_from).collect()
    }

    async fn recent_automation_failures(
        &self,
        part_number: &str,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM imputer_automation_tasks t
            JOIN imputer_subjects s ON s.id = t.subject_id
            WHERE s.part_number = $1 AND t.status = $2 AND t.created_at >= $3
            "#,
        )
        .bind(part_number)
        .bind(TaskStatus::Failed.to_string())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }

    async fn manufacturer_stats(&self, manufacturer: &str) -> Result<Option<ManufacturerStats>> {
        let known: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM imputer_subjects WHERE manufacturer = $1)",
        )
        .bind(manufacturer)
        .fetch_one(&self.pool)
        .await?;

        if !known {
            return Ok(None);
        }

        let (successes, failures): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE t.status = $2) AS successes,
                COUNT(*) FILTER (WHERE t.status = $3) AS failures
            FROM imputer_automation_tasks t
            JOIN imputer_subjects s ON s.id = t.subject_id
            WHERE s.manufacturer = $1
            "#,
        )
        .bind(manufacturer)
        .bind(TaskStatus::Completed.to_string())
        .bind(TaskStatus::Failed.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(ManufacturerStats {
            successes: successes as u64,
            failures: failures as u64,
        }))
    }
}
