//! Data Transfer Objects for backend communication
//!
//! DTOs mirror the JSON shapes of the funding backend. They are converted
//! into domain types at the client boundary so that the rest of the
//! workspace only sees validated values.

pub mod batch;
pub mod job;
pub mod permission;
