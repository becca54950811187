use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::evaluation::EvaluationState;
use crate::models::queue::QueueEntry;
use crate::ports::{CapabilityError, HiringRepository};
use crate::queue::backoff::Backoff;
use crate::queue::{JobQueue, QueueError};
use crate::workflow::{load_request, WorkflowExecutor};

const FINALIZE_BACKOFF_MIN: Duration = Duration::from_millis(200);
const FINALIZE_BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Why a claimed entry ended `failed`.
#[derive(Debug, Clone, Error)]
pub enum EntryFailure {
    /// The applicant or job could not be loaded.
    #[error(transparent)]
    Unloadable(CapabilityError),

    #[error("evaluation panicked: {0}")]
    Panicked(String),

    #[error("evaluation task was cancelled")]
    Cancelled,
}

/// How a claimed entry ended.
#[derive(Debug)]
pub enum EntryOutcome {
    Completed(EvaluationState),
    Failed(EntryFailure),
}

/// Drives one claimed entry to its terminal state. Shared by the queue worker and
/// the dispatch gate so both finalize entries the same way.
#[derive(Clone)]
pub struct JobRunner {
    queue: Arc<dyn JobQueue>,
    repo: Arc<dyn HiringRepository>,
    executor: Arc<WorkflowExecutor>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl JobRunner {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        repo: Arc<dyn HiringRepository>,
        executor: Arc<WorkflowExecutor>,
    ) -> Self {
        Self {
            queue,
            repo,
            executor,
            shutdown: None,
        }
    }

    /// Stops retrying terminal writes once `shutdown` flips to true.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }

    /// Runs the evaluation for an entry the caller has already claimed, then writes
    /// `completed` or `failed`. Only queue-store errors are returned, and only once
    /// the terminal write has been given up on at shutdown.
    pub async fn execute(&self, entry: QueueEntry) -> Result<EntryOutcome, QueueError> {
        let request = match load_request(self.repo.as_ref(), entry.applicant_id, entry.job_id).await
        {
            Ok(request) => request,
            Err(e) => {
                let failure = EntryFailure::Unloadable(e);
                warn!("Queue entry {} cannot be evaluated: {failure}", entry.id);
                self.finalize(entry.id, Some(&failure.to_string())).await?;
                return Ok(EntryOutcome::Failed(failure));
            }
        };

        // The run gets its own task so a panic inside a stage lands here as a JoinError.
        let executor = self.executor.clone();
        match tokio::spawn(async move { executor.run(request).await }).await {
            Ok(state) => {
                self.finalize(entry.id, None).await?;
                info!(
                    "Queue entry {} completed: {} ({}/100)",
                    entry.id, state.decision, state.final_score
                );
                Ok(EntryOutcome::Completed(state))
            }
            Err(join_error) => {
                let failure = EntryFailure::from(join_error);
                error!("Queue entry {} failed: {failure}", entry.id);
                self.finalize(entry.id, Some(&failure.to_string())).await?;
                Ok(EntryOutcome::Failed(failure))
            }
        }
    }

    /// Writes the terminal status, retrying with backoff while the queue store is
    /// unreachable. An entry left in `processing` is never picked up again.
    async fn finalize(&self, id: Uuid, error: Option<&str>) -> Result<(), QueueError> {
        let mut backoff = Backoff::new(FINALIZE_BACKOFF_MIN, FINALIZE_BACKOFF_MAX);
        let mut shutdown = self.shutdown.clone();
        loop {
            let written = match error {
                None => self.queue.complete(id).await,
                Some(message) => self.queue.fail(id, message).await,
            };
            let err = match written {
                Ok(_) => return Ok(()),
                Err(e) => e,
            };
            if shutdown.as_ref().is_some_and(|rx| *rx.borrow()) {
                error!("Giving up on queue entry {id} at shutdown: {err}");
                return Err(err);
            }

            let delay = backoff.next_delay();
            warn!("Could not finalize queue entry {id}, retrying in {delay:?}: {err}");
            let stop = match shutdown.as_mut() {
                Some(rx) => tokio::select! {
                    _ = tokio::time::sleep(delay) => false,
                    changed = rx.changed() => changed.is_err(),
                },
                None => {
                    tokio::time::sleep(delay).await;
                    false
                }
            };
            if stop {
                error!("Giving up on queue entry {id}: shutdown channel closed");
                return Err(err);
            }
        }
    }
}

impl From<JoinError> for EntryFailure {
    fn from(err: JoinError) -> Self {
        if err.is_cancelled() {
            return EntryFailure::Cancelled;
        }
        EntryFailure::Panicked(panic_text(err.into_panic()))
    }
}

fn panic_text(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
