//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use qnasync_core::pipeline::{ProgressReporter, SyncConfig, SyncResult};
use qnasync_shared::{AppConfig, init_config, resolve_config};
use tracing::{error, info};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// qnasync: merge a live Q&A service export back into its source of truth.
#[derive(Parser)]
#[command(
    name = "qnasync",
    version,
    about = "Reconcile a Q&A service export with the source-of-truth training sheet.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./qnasync.toml, then ~/.qnasync/qnasync.toml).
    #[arg(long, global = true, env = "QNASYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Merge the Q&A export into the source of truth and write all artifacts.
    Sync {
        /// Previous training data (source of truth).
        #[arg(long)]
        prev: PathBuf,

        /// Current export of the Q&A service.
        #[arg(long)]
        active: PathBuf,

        /// Output directory (defaults to the configured one, relative to cwd).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Artifact label, bypassing the naming rules.
        #[arg(long)]
        label: Option<String>,

        /// Do not write the `.tsv` copy of the final sheet.
        #[arg(long)]
        no_tsv: bool,
    },

    /// Show what a sync would change without writing anything.
    Diff {
        /// Previous training data (source of truth).
        #[arg(long)]
        prev: PathBuf,

        /// Current export of the Q&A service.
        #[arg(long)]
        active: PathBuf,

        /// Print the counters as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize the user config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "qnasync=info",
        1 => "qnasync=debug",
        _ => "qnasync=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Sync {
            prev,
            active,
            out,
            label,
            no_tsv,
        } => cmd_sync(config_path, &prev, &active, out, label, no_tsv),
        Command::Diff { prev, active, json } => cmd_diff(&prev, &active, json),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn load_app_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let cwd = std::env::current_dir().wrap_err("cannot determine working directory")?;
    Ok(resolve_config(explicit, &cwd)?)
}

fn cmd_sync(
    config_path: Option<&Path>,
    prev: &Path,
    active: &Path,
    out: Option<PathBuf>,
    label: Option<String>,
    no_tsv: bool,
) -> Result<()> {
    let config = load_app_config(config_path)?;

    for (role, path) in [("previous training data", prev), ("Q&A export", active)] {
        if !path.is_file() {
            return Err(eyre!("{role} file not found: {}", path.display()));
        }
    }

    let cwd = std::env::current_dir().wrap_err("cannot determine working directory")?;
    let output_dir = out.unwrap_or_else(|| cwd.join(&config.output.dir));

    let sync_config = SyncConfig {
        sp_path: prev.to_path_buf(),
        qa_path: active.to_path_buf(),
        output_dir,
        naming: config.naming.clone(),
        label,
        emit_tsv: config.output.emit_tsv && !no_tsv,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    info!(
        prev = %prev.display(),
        active = %active.display(),
        out = %sync_config.output_dir.display(),
        "syncing exports"
    );

    let reporter = CliProgress::new();
    let result = match qnasync_core::run_sync(&sync_config, &reporter) {
        Ok(result) => result,
        Err(e) => {
            reporter.abort();
            error!(error = %e, "sync aborted, nothing was merged");
            return Err(e).wrap_err("sync failed");
        }
    };

    println!();
    println!("  Completed: sync");
    println!("  Run:       {}", result.run_id);
    println!("  Label:     {}", result.label);
    println!("  QA only:   {}", result.stats.only_in_qa);
    println!(
        "  Suggested: {} applied, {} skipped",
        result.stats.suggestions_applied, result.stats.suggestions_skipped
    );
    println!("  Inserted:  {}", result.stats.inserted_into_groups);
    println!("  Appended:  {}", result.stats.appended_groups);
    println!("  Rows:      {}", result.stats.merged_rows);
    for artifact in &result.artifacts {
        println!("  Wrote:     {}", artifact.path.display());
    }
    println!("  Report:    {}", result.report_path.display());
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_diff(prev: &Path, active: &Path, json: bool) -> Result<()> {
    let reconciliation = qnasync_core::preview(prev, active).wrap_err("diff failed")?;
    let stats = &reconciliation.stats;

    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!();
    println!("  QA only:   {}", stats.only_in_qa);
    for record in reconciliation.only_in_qa.iter() {
        println!("    - [{}] {}", record.qna_id, record.question);
    }
    println!("  Suggested: {} ({} without an SP row)", stats.suggested, stats.suggestions_skipped);
    println!("  Inserted:  {}", stats.inserted_into_groups);
    println!("  Appended:  {} {:?}", stats.appended_groups, stats.new_qna_ids);
    println!("  Rows:      {} -> {}", stats.sp_rows, stats.merged_rows);
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load_app_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn abort(&self) {
        self.spinner.abandon_with_message("Something went wrong");
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &SyncResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_args_parse() {
        let cli = Cli::try_parse_from([
            "qnasync", "-v", "sync", "--prev", "sp.xlsx", "--active", "qa.xlsx", "--no-tsv",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Sync {
                prev,
                active,
                no_tsv,
                label,
                ..
            } => {
                assert_eq!(prev, PathBuf::from("sp.xlsx"));
                assert_eq!(active, PathBuf::from("qa.xlsx"));
                assert!(no_tsv);
                assert!(label.is_none());
            }
            _ => panic!("expected sync"),
        }
    }

    #[test]
    fn sync_requires_both_inputs() {
        assert!(Cli::try_parse_from(["qnasync", "sync", "--prev", "sp.xlsx"]).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
