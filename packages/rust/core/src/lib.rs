//! Reconciliation of Q&A knowledge base exports.
//!
//! This crate compares a source-of-truth export (SP) with a live Q&A service
//! export (QA), merges QA-only questions and suggestion annotations into SP
//! while keeping answer groups contiguous, and orchestrates a full run
//! (`run_sync`).

pub mod diff;
pub mod matcher;
pub mod merge;
pub mod naming;
pub mod pipeline;
pub mod report;

pub use merge::{MergeStats, Reconciliation, reconcile};
pub use pipeline::{ProgressReporter, SilentProgress, SyncConfig, SyncResult, preview, run_sync};
