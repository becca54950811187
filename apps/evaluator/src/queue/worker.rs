use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use crate::queue::backoff::Backoff;
use crate::queue::{EntryOutcome, JobRunner, QueueError};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// First wait after finding the queue empty.
    pub idle_backoff_min: Duration,
    /// Longest wait between polls of an empty queue.
    pub idle_backoff_max: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            idle_backoff_min: Duration::from_millis(500),
            idle_backoff_max: Duration::from_secs(5),
        }
    }
}

/// Background loop that claims one pending entry at a time and runs it to a terminal state.
pub struct QueueWorker {
    runner: JobRunner,
    config: WorkerConfig,
}

impl QueueWorker {
    pub fn new(runner: JobRunner, config: WorkerConfig) -> Self {
        Self { runner, config }
    }

    /// Polls until `shutdown` flips to true (or its sender is dropped).
    /// A failing job or an unreachable queue store never ends the loop.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Queue worker started (idle backoff {:?}..{:?})",
            self.config.idle_backoff_min, self.config.idle_backoff_max
        );
        let mut backoff = Backoff::new(self.config.idle_backoff_min, self.config.idle_backoff_max);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let delay = match self.poll_once().await {
                Ok(true) => {
                    backoff.reset();
                    continue;
                }
                Ok(false) => backoff.next_delay(),
                Err(e) => {
                    error!("Queue worker poll failed: {e}");
                    backoff.next_delay()
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Queue worker stopped");
    }

    /// Claims and processes at most one entry. Returns whether an entry was claimed.
    pub async fn poll_once(&self) -> Result<bool, QueueError> {
        let Some(entry) = self.runner.queue().claim_next().await? else {
            return Ok(false);
        };
        let id = entry.id;
        info!("Claimed queue entry {id} (applicant {})", entry.applicant_id);

        match self.runner.execute(entry).await? {
            EntryOutcome::Completed(_) => {}
            EntryOutcome::Failed(reason) => info!("Queue entry {id} marked failed: {reason}"),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::queue::QueueStatus;
    use crate::queue::JobQueue;
    use crate::testing::{
        executor, seed_applicant, InMemoryJobQueue, MemoryStore, StubPortfolio, StubResumes,
    };
    use uuid::Uuid;

    fn worker(queue: Arc<InMemoryJobQueue>, store: Arc<MemoryStore>) -> QueueWorker {
        let exec = executor(
            Arc::new(StubResumes::ok(&["go"])),
            Arc::new(StubPortfolio::ok(70, "ok")),
            store.clone(),
        );
        QueueWorker::new(
            JobRunner::new(queue, store, Arc::new(exec)),
            WorkerConfig {
                idle_backoff_min: Duration::from_millis(10),
                idle_backoff_max: Duration::from_millis(40),
            },
        )
    }

    #[tokio::test]
    async fn test_poll_once_on_empty_queue_claims_nothing() {
        let queue = Arc::new(InMemoryJobQueue::default());
        let w = worker(queue, Arc::new(MemoryStore::default()));
        assert!(!w.poll_once().await.unwrap());
    }

    #[tokio::test]
    async fn test_bad_entry_does_not_stop_following_entries() {
        let queue = Arc::new(InMemoryJobQueue::default());
        let store = Arc::new(MemoryStore::default());
        let (applicant, job) = seed_applicant(&store, &["Go", "SQL"]).await;

        let orphan = queue.enqueue(Uuid::new_v4(), job.id).await.unwrap();
        let good = queue.enqueue(applicant.id, job.id).await.unwrap();

        let w = worker(queue.clone(), store.clone());
        assert!(w.poll_once().await.unwrap());
        assert!(w.poll_once().await.unwrap());
        assert!(!w.poll_once().await.unwrap());

        assert_eq!(queue.get(orphan.id).await.unwrap().unwrap().status, QueueStatus::Failed);
        assert_eq!(queue.get(good.id).await.unwrap().unwrap().status, QueueStatus::Completed);
        assert_eq!(store.evaluation_writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_drains_queue_and_stops_on_shutdown() {
        let queue = Arc::new(InMemoryJobQueue::default());
        let store = Arc::new(MemoryStore::default());
        let (applicant, job) = seed_applicant(&store, &["Go", "SQL"]).await;
        let entry = queue.enqueue(applicant.id, job.id).await.unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker(queue.clone(), store.clone()).run(rx));

        for _ in 0..50 {
            if queue.get(entry.id).await.unwrap().unwrap().status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(
            queue.get(entry.id).await.unwrap().unwrap().status,
            QueueStatus::Completed
        );

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker should stop after shutdown")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_queue_is_retried_not_fatal() {
        let queue = Arc::new(InMemoryJobQueue::default());
        queue.set_unavailable(true);
        let store = Arc::new(MemoryStore::default());
        let (applicant, job) = seed_applicant(&store, &["Go"]).await;

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(worker(queue.clone(), store.clone()).run(rx));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!handle.is_finished());

        queue.set_unavailable(false);
        let entry = queue.enqueue(applicant.id, job.id).await.unwrap();
        for _ in 0..50 {
            if queue.get(entry.id).await.unwrap().unwrap().status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(
            queue.get(entry.id).await.unwrap().unwrap().status,
            QueueStatus::Completed
        );

        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("worker should stop when the shutdown sender is dropped")
            .unwrap();
    }
}
