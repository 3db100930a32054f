//! Fundflow Core
//!
//! Core types and abstractions for the Fundflow funding-approval client.
//!
//! This crate contains:
//! - Domain types: Jobs, funding actions, permissions and identifiers
//! - DTOs: Wire shapes exchanged with the funding backend

pub mod domain;
pub mod dto;
