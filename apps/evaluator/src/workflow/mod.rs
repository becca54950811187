// Evaluation workflow: stage functions and the executor that chains them.
// Capability calls go through crate::ports; nothing here touches the queue.

pub mod executor;
pub mod request;
pub mod scoring;
pub mod skills;
pub mod stages;

pub use executor::WorkflowExecutor;
pub use request::load_request;
