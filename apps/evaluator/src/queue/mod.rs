//! Durable evaluation queue.
//!
//! Entries move pending → processing → completed | failed. Every mutation goes
//! through the `JobQueue` trait; claims are single atomic read-modify-writes so
//! at most one worker or dispatcher owns a given entry.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::queue::{QueueDepth, QueueEntry};

pub mod backoff;
pub mod postgres;
pub mod runner;
pub mod worker;

pub use postgres::PgJobQueue;
pub use runner::{EntryFailure, EntryOutcome, JobRunner};
pub use worker::{QueueWorker, WorkerConfig};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt queue entry {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },

    #[error("Queue unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Inserts a pending entry. Not idempotent: callers must not enqueue twice.
    async fn enqueue(&self, applicant_id: Uuid, job_id: Uuid) -> Result<QueueEntry, QueueError>;

    /// Atomically moves the oldest pending entry to processing and returns it.
    async fn claim_next(&self) -> Result<Option<QueueEntry>, QueueError>;

    /// Atomically moves one specific entry to processing, if it is still pending.
    async fn claim(&self, id: Uuid) -> Result<Option<QueueEntry>, QueueError>;

    /// Marks the entry completed. Returns false, changing nothing, if it was already terminal.
    async fn complete(&self, id: Uuid) -> Result<bool, QueueError>;

    /// Marks the entry failed with `error`. Returns false, changing nothing, if it was already terminal.
    async fn fail(&self, id: Uuid, error: &str) -> Result<bool, QueueError>;

    async fn get(&self, id: Uuid) -> Result<Option<QueueEntry>, QueueError>;

    async fn depth(&self) -> Result<QueueDepth, QueueError>;
}
