//! Repository layer
//!
//! Repositories are stateless clients that abstract communication with the
//! funding backend. They provide simple, focused interfaces for different
//! API endpoints without any business logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod batches;
mod jobs;
mod permissions;

// Re-export traits
pub use batches::BatchRepository;
pub use jobs::JobRepository;
pub use permissions::PermissionRepository;

// Re-export implementations
pub use batches::{BatchFile, HttpBatchRepository};
pub use jobs::HttpJobRepository;
pub use permissions::HttpPermissionRepository;
