//! Core value objects shared across the crate.

pub mod result;
pub mod status;

pub use result::TaskResult;
pub use status::{ProcessingStage, ProcessingStatus};
