use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::queue::{QueueDepth, QueueEntry, QueueEntryRow};
use crate::queue::{JobQueue, QueueError};

const RETURNING: &str = "RETURNING id, applicant_id, job_id, status, error, created_at, updated_at";

/// `evaluation_queue` table. Claims use `FOR UPDATE SKIP LOCKED` so concurrent
/// claimants never block on, or double-claim, the same row.
#[derive(Clone)]
pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_entry(row: QueueEntryRow) -> Result<QueueEntry, QueueError> {
    let id = row.id;
    QueueEntry::try_from(row).map_err(|reason| QueueError::Corrupt { id, reason })
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue(&self, applicant_id: Uuid, job_id: Uuid) -> Result<QueueEntry, QueueError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, QueueEntryRow>(&format!(
            r#"
            INSERT INTO evaluation_queue (id, applicant_id, job_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, 'pending', $4, $4)
            {RETURNING}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(applicant_id)
        .bind(job_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!("Enqueued evaluation {} for applicant {applicant_id}", row.id);
        into_entry(row)
    }

    async fn claim_next(&self) -> Result<Option<QueueEntry>, QueueError> {
        let row = sqlx::query_as::<_, QueueEntryRow>(&format!(
            r#"
            UPDATE evaluation_queue
            SET status = 'processing', updated_at = NOW()
            WHERE id = (
                SELECT id FROM evaluation_queue
                WHERE status = 'pending'
                ORDER BY created_at
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            {RETURNING}
            "#
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_entry).transpose()
    }

    async fn claim(&self, id: Uuid) -> Result<Option<QueueEntry>, QueueError> {
        let row = sqlx::query_as::<_, QueueEntryRow>(&format!(
            r#"
            UPDATE evaluation_queue
            SET status = 'processing', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            {RETURNING}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_none() {
            debug!("Entry {id} was not pending; claim skipped");
        }
        row.map(into_entry).transpose()
    }

    async fn complete(&self, id: Uuid) -> Result<bool, QueueError> {
        let result = sqlx::query(
            r#"
            UPDATE evaluation_queue
            SET status = 'completed', error = NULL, updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'processing')
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<bool, QueueError> {
        let result = sqlx::query(
            r#"
            UPDATE evaluation_queue
            SET status = 'failed', error = $2, updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'processing')
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, id: Uuid) -> Result<Option<QueueEntry>, QueueError> {
        let row = sqlx::query_as::<_, QueueEntryRow>(
            "SELECT id, applicant_id, job_id, status, error, created_at, updated_at \
             FROM evaluation_queue WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_entry).transpose()
    }

    async fn depth(&self) -> Result<QueueDepth, QueueError> {
        let (pending, processing): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = 'pending'),
                   COUNT(*) FILTER (WHERE status = 'processing')
            FROM evaluation_queue
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(QueueDepth {
            pending,
            processing,
        })
    }
}
