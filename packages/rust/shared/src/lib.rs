//! Shared types, error model, and configuration for Luma.
//!
//! This crate is the foundation depended on by all other Luma crates.
//! It provides:
//! - [`LumaError`] — the unified error type
//! - Domain types ([`RawAuditReport`], [`ScoreCard`], [`Issue`], [`Analysis`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AuditConfig, BrowserConfig, OpenAiConfig, PromptConfig, ServerConfig, config_dir,
    config_file_path, load_config, load_config_from, validate_api_key,
};
pub use error::{LumaError, Result};
pub use types::{Analysis, AuditEntry, CategoryResult, Issue, RawAuditReport, ScoreCard};
