pub mod evaluation;
pub mod hiring;
pub mod queue;
