//! Service layer
//!
//! Services contain the business logic between the repositories and the
//! workflow: turning a confirmed action into exactly one job, and running
//! the upload-validate-extract sequence for batch files.

mod pipeline;
mod submitter;

pub use pipeline::{BatchUploadPipeline, BatchUploadSession, PipelineState, ReadyBatch};
pub use submitter::{ActionSubmitter, Submission};
