//! Luma backend library surface.
//!
//! The binary wires concrete components in `main.rs`; everything the HTTP
//! layer needs lives in [`app`] so integration tests can drive the router
//! against stub backends.

pub mod app;
