//! The JSON run report written next to a sync's artifacts.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use qnasync_shared::{Result, RunId, SyncError};

use crate::merge::MergeStats;

/// Which output of the run an artifact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    OnlyInQa,
    Suggested,
    AfterSuggestions,
    Final,
    FinalTsv,
}

/// One written file.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub rows: usize,
    /// SHA-256 of the file as written.
    pub sha256: String,
}

impl Artifact {
    /// Describe a file already on disk.
    pub fn from_file(kind: ArtifactKind, path: &Path, rows: usize) -> Result<Self> {
        Ok(Self {
            kind,
            path: path.to_path_buf(),
            rows,
            sha256: file_digest(path)?,
        })
    }
}

/// Audit record of one run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: RunId,
    pub tool_version: String,
    pub label: String,
    pub started_at: DateTime<Utc>,
    pub sp_path: PathBuf,
    pub qa_path: PathBuf,
    pub stats: MergeStats,
    pub artifacts: Vec<Artifact>,
}

/// Write `report` as pretty-printed JSON.
pub fn write_report(path: &Path, report: &SyncReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(|e| SyncError::write(path, e))?;
    std::fs::write(path, json).map_err(|e| SyncError::io(path, e))?;
    debug!(path = %path.display(), "wrote run report");
    Ok(())
}

/// Hex SHA-256 of a file's contents.
pub fn file_digest(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| SyncError::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
