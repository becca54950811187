use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::queue::{QueueDepth, QueueEntry, QueueStatus};
use crate::queue::{JobQueue, QueueError};

/// `JobQueue` held in a mutex-guarded Vec. Each operation runs under one lock,
/// which gives claims the same exclusivity as the SQL version.
#[derive(Default)]
pub struct InMemoryJobQueue {
    entries: Mutex<Vec<QueueEntry>>,
    unavailable: AtomicBool,
}

impl InMemoryJobQueue {
    /// While set, every operation fails as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), QueueError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn transition(&self, id: Uuid, status: QueueStatus, error: Option<&str>) -> Result<bool, QueueError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        if entry.status.is_terminal() {
            return Ok(false);
        }
        entry.status = status;
        entry.error = error.map(str::to_string);
        entry.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, applicant_id: Uuid, job_id: Uuid) -> Result<QueueEntry, QueueError> {
        self.check()?;
        let now = Utc::now();
        let entry = QueueEntry {
            id: Uuid::new_v4(),
            applicant_id,
            job_id,
            status: QueueStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn claim_next(&self) -> Result<Option<QueueEntry>, QueueError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        // insertion order is creation order
        let Some(entry) = entries.iter_mut().find(|e| e.status == QueueStatus::Pending) else {
            return Ok(None);
        };
        entry.status = QueueStatus::Processing;
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn claim(&self, id: Uuid) -> Result<Option<QueueEntry>, QueueError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries
            .iter_mut()
            .find(|e| e.id == id && e.status == QueueStatus::Pending)
        else {
            return Ok(None);
        };
        entry.status = QueueStatus::Processing;
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn complete(&self, id: Uuid) -> Result<bool, QueueError> {
        self.transition(id, QueueStatus::Completed, None)
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<bool, QueueError> {
        self.transition(id, QueueStatus::Failed, Some(error))
    }

    async fn get(&self, id: Uuid) -> Result<Option<QueueEntry>, QueueError> {
        self.check()?;
        let entries = self.entries.lock().unwrap();
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn depth(&self) -> Result<QueueDepth, QueueError> {
        self.check()?;
        let entries = self.entries.lock().unwrap();
        let count = |status: QueueStatus| entries.iter().filter(|e| e.status == status).count() as i64;
        Ok(QueueDepth {
            pending: count(QueueStatus::Pending),
            processing: count(QueueStatus::Processing),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_claim_next_takes_oldest_pending() {
        let queue = InMemoryJobQueue::default();
        let first = queue.enqueue(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
        let second = queue.enqueue(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();

        assert_eq!(queue.claim_next().await.unwrap().unwrap().id, first.id);
        assert_eq!(queue.claim_next().await.unwrap().unwrap().id, second.id);
        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_hand_out_one_entry_once() {
        let queue = Arc::new(InMemoryJobQueue::default());
        let entry = queue.enqueue(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();

        let barrier = Arc::new(tokio::sync::Barrier::new(16));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let queue = queue.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    queue.claim_next().await.unwrap()
                })
            })
            .collect();

        let mut claimed = Vec::new();
        for handle in handles {
            if let Some(entry) = handle.await.unwrap() {
                claimed.push(entry.id);
            }
        }
        assert_eq!(claimed, vec![entry.id]);
        assert_eq!(queue.depth().await.unwrap().processing, 1);
    }

    #[tokio::test]
    async fn test_terminal_entries_are_not_rewritten() {
        let queue = InMemoryJobQueue::default();
        let entry = queue.enqueue(Uuid::new_v4(), Uuid::new_v4()).await.unwrap();
        queue.claim(entry.id).await.unwrap().unwrap();

        assert!(queue.complete(entry.id).await.unwrap());
        assert!(!queue.fail(entry.id, "late").await.unwrap());

        let stored = queue.get(entry.id).await.unwrap().unwrap();
        assert_eq!(stored.status, QueueStatus::Completed);
        assert!(stored.error.is_none());
    }
}
