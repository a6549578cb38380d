//! Core pipeline orchestration and domain logic for Luma.
//!
//! This crate ties browser sessions, audit execution, result aggregation,
//! and explanation composition into the end-to-end `analyze` workflow.

pub mod aggregate;
pub mod compose;
pub mod pipeline;
