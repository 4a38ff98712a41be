//! Shared types, error model, and configuration for qnasync.
//!
//! This crate is the foundation depended on by all other qnasync crates.
//! It provides:
//! - [`SyncError`], the unified error type
//! - Domain types ([`Record`], [`RecordSet`], [`RunId`])
//! - Configuration ([`AppConfig`], [`NamingConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, NamingConfig, OutputConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_config,
};
pub use error::{Result, SyncError};
pub use types::{
    ANSWER, EMPTY_SUGGESTIONS, IS_CONTEXT_ONLY, QNA_ID, QUESTION, Record, RecordSet, RunId,
    SUGGESTED_QUESTIONS, parse_context_only, parse_qna_id,
};
