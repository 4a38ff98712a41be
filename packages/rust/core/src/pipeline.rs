//! End-to-end `sync` pipeline: load SP and QA → reconcile → write artifacts.
//!
//! The run is fail-fast. Reconciliation happens entirely in memory, so a run
//! that fails before the write phase leaves no artifacts behind.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::{info, instrument};

use qnasync_shared::{NamingConfig, RecordSet, Result, RunId};

use crate::merge::{self, MergeStats, Reconciliation};
use crate::naming;
use crate::report::{self, Artifact, ArtifactKind, SyncReport};

/// Configuration for [`run_sync`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Source-of-truth export (prior training data).
    pub sp_path: PathBuf,
    /// Live Q&A service export.
    pub qa_path: PathBuf,
    /// Directory receiving the artifacts.
    pub output_dir: PathBuf,
    /// Naming rules for the artifact label.
    pub naming: NamingConfig,
    /// Explicit label, bypassing the naming rules.
    pub label: Option<String>,
    /// Also write the final set as `.tsv`.
    pub emit_tsv: bool,
    /// Tool version string.
    pub tool_version: String,
}

/// Result of [`run_sync`].
#[derive(Debug)]
pub struct SyncResult {
    pub run_id: RunId,
    /// Label used in artifact names.
    pub label: String,
    pub stats: MergeStats,
    /// Written record sets, in write order.
    pub artifacts: Vec<Artifact>,
    /// Path of the JSON run report.
    pub report_path: PathBuf,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &SyncResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &SyncResult) {}
}

/// Output file names for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub only_in_qa: PathBuf,
    pub suggested: PathBuf,
    pub after_suggestions: PathBuf,
    pub final_set: PathBuf,
    pub report: PathBuf,
}

impl ArtifactPaths {
    /// Names under `dir` for `label`; `timestamp` (`YYYYMMDD-HHMMSS`) tags
    /// the final set and the report.
    pub fn new(dir: &Path, label: &str, timestamp: &str) -> Self {
        Self {
            only_in_qa: dir.join(format!("{label}_diff_1_only_in_qa.xlsx")),
            suggested: dir.join(format!("{label}_diff_2_suggest.xlsx")),
            after_suggestions: dir.join(format!("{label}_diff_3_update_suggest.xlsx")),
            final_set: dir.join(format!("{label}_diff_final_{timestamp}.xlsx")),
            report: dir.join(format!("{label}_sync_report_{timestamp}.json")),
        }
    }
}

/// Load both exports and reconcile them without writing anything.
#[instrument(skip_all, fields(sp = %sp_path.display(), qa = %qa_path.display()))]
pub fn preview(sp_path: &Path, qa_path: &Path) -> Result<Reconciliation> {
    let (sp, qa) = load_inputs(sp_path, qa_path)?;
    merge::reconcile(&sp, &qa)
}

/// Run the full sync.
///
/// 1. Load SP and QA
/// 2. Reconcile (diffs + merge passes) in memory
/// 3. Write diff-1, diff-2, diff-3, the final set (and its `.tsv`)
/// 4. Write the run report
#[instrument(skip_all, fields(sp = %config.sp_path.display(), qa = %config.qa_path.display()))]
pub fn run_sync(config: &SyncConfig, progress: &dyn ProgressReporter) -> Result<SyncResult> {
    let start = Instant::now();
    let started_at = Utc::now();
    let run_id = RunId::new();

    let label = config
        .label
        .clone()
        .unwrap_or_else(|| naming::classify(&config.qa_path, &config.naming).to_string());

    info!(%run_id, %label, "starting sync");

    // --- Phase 1: Load ---
    progress.phase("Loading exports");
    let (sp, qa) = load_inputs(&config.sp_path, &config.qa_path)?;

    // --- Phase 2: Reconcile ---
    progress.phase("Reconciling");
    let reconciliation = merge::reconcile(&sp, &qa)?;

    // --- Phase 3: Write artifacts ---
    progress.phase("Writing artifacts");
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    let paths = ArtifactPaths::new(&config.output_dir, &label, &timestamp);
    let artifacts = write_artifacts(&paths, &reconciliation, config.emit_tsv)?;

    // --- Phase 4: Report ---
    progress.phase("Writing run report");
    let sync_report = SyncReport {
        run_id: run_id.clone(),
        tool_version: config.tool_version.clone(),
        label: label.clone(),
        started_at,
        sp_path: config.sp_path.clone(),
        qa_path: config.qa_path.clone(),
        stats: reconciliation.stats.clone(),
        artifacts: artifacts.clone(),
    };
    report::write_report(&paths.report, &sync_report)?;

    let result = SyncResult {
        run_id,
        label,
        stats: reconciliation.stats,
        artifacts,
        report_path: paths.report,
        elapsed: start.elapsed(),
    };

    info!(
        merged_rows = result.stats.merged_rows,
        artifacts = result.artifacts.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "sync complete"
    );

    progress.done(&result);
    Ok(result)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_inputs(sp_path: &Path, qa_path: &Path) -> Result<(RecordSet, RecordSet)> {
    let sp = qnasync_tabular::load(sp_path)?;
    let qa = qnasync_tabular::load(qa_path)?;
    info!(sp_rows = sp.len(), qa_rows = qa.len(), "loaded exports");
    Ok((sp, qa))
}

fn write_artifacts(
    paths: &ArtifactPaths,
    reconciliation: &Reconciliation,
    emit_tsv: bool,
) -> Result<Vec<Artifact>> {
    for set in [
        &reconciliation.only_in_qa,
        &reconciliation.suggested,
        &reconciliation.after_suggestions,
        &reconciliation.merged,
    ] {
        qnasync_tabular::check_writable(set)?;
    }

    let outputs = [
        (ArtifactKind::OnlyInQa, &paths.only_in_qa, &reconciliation.only_in_qa),
        (ArtifactKind::Suggested, &paths.suggested, &reconciliation.suggested),
        (
            ArtifactKind::AfterSuggestions,
            &paths.after_suggestions,
            &reconciliation.after_suggestions,
        ),
    ];

    let mut artifacts = Vec::with_capacity(outputs.len() + 2);
    for (kind, path, set) in outputs {
        qnasync_tabular::save(path, set)?;
        artifacts.push(Artifact::from_file(kind, path, set.len())?);
    }

    let merged = &reconciliation.merged;
    if emit_tsv {
        let tsv = qnasync_tabular::save_with_tsv_sibling(&paths.final_set, merged)?;
        artifacts.push(Artifact::from_file(ArtifactKind::Final, &paths.final_set, merged.len())?);
        artifacts.push(Artifact::from_file(ArtifactKind::FinalTsv, &tsv, merged.len())?);
    } else {
        qnasync_tabular::save(&paths.final_set, merged)?;
        artifacts.push(Artifact::from_file(ArtifactKind::Final, &paths.final_set, merged.len())?);
    }

    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_follow_label_and_timestamp() {
        let paths = ArtifactPaths::new(Path::new("out"), "faq", "20240131-235959");
        assert_eq!(paths.only_in_qa, Path::new("out/faq_diff_1_only_in_qa.xlsx"));
        assert_eq!(paths.suggested, Path::new("out/faq_diff_2_suggest.xlsx"));
        assert_eq!(
            paths.after_suggestions,
            Path::new("out/faq_diff_3_update_suggest.xlsx")
        );
        assert_eq!(
            paths.final_set,
            Path::new("out/faq_diff_final_20240131-235959.xlsx")
        );
        assert_eq!(
            paths.report,
            Path::new("out/faq_sync_report_20240131-235959.json")
        );
    }

    #[test]
    fn failed_load_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out");
        let config = SyncConfig {
            sp_path: dir.path().join("missing_sp.tsv"),
            qa_path: dir.path().join("missing_qa.tsv"),
            output_dir: out.clone(),
            naming: NamingConfig::default(),
            label: None,
            emit_tsv: true,
            tool_version: "test".into(),
        };

        assert!(run_sync(&config, &SilentProgress).is_err());
        assert!(!out.exists());
    }
}
