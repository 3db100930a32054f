//! Core domain types
//!
//! This module contains the core domain structures used across Fundflow crates.
//! These types describe backend jobs and the funding actions that create them;
//! the client only ever holds read-only snapshots of them.

pub mod action;
pub mod id;
pub mod job;
pub mod permission;
