//! Dispatch gate: admission of new evaluations.
//!
//! Every submission is enqueued so its lifecycle is visible in the queue. In
//! `Immediate` mode the gate then claims the entry it just created through the
//! queue's atomic `claim(id)` and runs it on a spawned task. Whoever wins that
//! claim (gate or worker) is the only runner, so each (applicant, job) pair is
//! evaluated once. Evaluation writes upsert by (applicant_id, job_id) as well.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::evaluation::EvaluationState;
use crate::models::queue::QueueEntry;
use crate::queue::{EntryFailure, EntryOutcome, JobRunner, QueueError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Enqueue only; the background worker picks the entry up.
    Queued,
    /// Enqueue, then run right away unless the worker already claimed it.
    Immediate,
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(DispatchMode::Queued),
            "immediate" => Ok(DispatchMode::Immediate),
            other => Err(format!(
                "unknown dispatch mode '{other}' (expected 'queued' or 'immediate')"
            )),
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchMode::Queued => f.write_str("queued"),
            DispatchMode::Immediate => f.write_str("immediate"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The entry was taken by the worker between enqueue and claim.
    #[error("queue entry {0} was claimed by another runner")]
    AlreadyClaimed(Uuid),

    #[error("evaluation failed: {0}")]
    Failed(EntryFailure),
}

/// What the caller of `submit` gets back.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReceipt {
    pub entry: QueueEntry,
    pub mode: DispatchMode,
    /// True when this call started the run itself.
    pub started_immediately: bool,
}

#[derive(Clone)]
pub struct DispatchGate {
    runner: JobRunner,
    mode: DispatchMode,
}

impl DispatchGate {
    pub fn new(runner: JobRunner, mode: DispatchMode) -> Self {
        Self { runner, mode }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Admits an evaluation for (applicant, job). Returns once the entry is enqueued;
    /// an immediate run continues in the background. Only a failed enqueue is an
    /// error: an entry that could not be claimed here stays pending for the worker.
    pub async fn submit(
        &self,
        applicant_id: Uuid,
        job_id: Uuid,
    ) -> Result<DispatchReceipt, DispatchError> {
        let entry = self.runner.queue().enqueue(applicant_id, job_id).await?;

        if self.mode == DispatchMode::Queued {
            return Ok(self.left_to_worker(entry));
        }

        let claimed = match self.runner.queue().claim(entry.id).await {
            Ok(Some(claimed)) => claimed,
            Ok(None) => {
                debug!("Entry {} already claimed by the worker", entry.id);
                return Ok(self.left_to_worker(entry));
            }
            Err(e) => {
                warn!("Could not claim entry {} for an immediate run, leaving it to the worker: {e}", entry.id);
                return Ok(self.left_to_worker(entry));
            }
        };

        let receipt = DispatchReceipt {
            entry: claimed.clone(),
            mode: self.mode,
            started_immediately: true,
        };

        let runner = self.runner.clone();
        tokio::spawn(async move {
            let id = claimed.id;
            if let Err(e) = runner.execute(claimed).await {
                error!("Immediate evaluation of entry {id} could not be finalized: {e}");
            }
        });

        info!("Started immediate evaluation {} for applicant {applicant_id}", receipt.entry.id);
        Ok(receipt)
    }

    fn left_to_worker(&self, entry: QueueEntry) -> DispatchReceipt {
        DispatchReceipt {
            entry,
            mode: self.mode,
            started_immediately: false,
        }
    }

    /// Enqueues, claims and runs, returning the best-effort state. The run is spawned,
    /// so the entry still reaches a terminal state if the caller stops waiting.
    pub async fn evaluate_now(
        &self,
        applicant_id: Uuid,
        job_id: Uuid,
    ) -> Result<EvaluationState, DispatchError> {
        let entry = self.runner.queue().enqueue(applicant_id, job_id).await?;
        let claimed = self
            .runner
            .queue()
            .claim(entry.id)
            .await?
            .ok_or(DispatchError::AlreadyClaimed(entry.id))?;

        let runner = self.runner.clone();
        match tokio::spawn(async move { runner.execute(claimed).await }).await {
            Ok(outcome) => match outcome? {
                EntryOutcome::Completed(state) => Ok(state),
                EntryOutcome::Failed(failure) => Err(DispatchError::Failed(failure)),
            },
            Err(join_error) => Err(DispatchError::Failed(EntryFailure::from(join_error))),
        }
    }
}
