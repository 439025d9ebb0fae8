//! # Fluxo Core Library
//!
//! Solicitation workflow engine: declarative per-kind state machines,
//! capability-guarded transitions, optimistic-concurrency commits, and an
//! append-only audit trail.

pub mod models;
pub mod services;
pub mod workflow;
