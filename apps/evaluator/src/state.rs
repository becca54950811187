use std::path::PathBuf;
use std::sync::Arc;

use crate::dispatch::DispatchGate;
use crate::ports::HiringRepository;
use crate::queue::JobQueue;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn HiringRepository>,
    pub queue: Arc<dyn JobQueue>,
    pub gate: DispatchGate,
    /// Directory uploaded resumes are written to.
    pub upload_dir: PathBuf,
}
