//! Application configuration for qnasync.
//!
//! A project-local `qnasync.toml` takes precedence over the user config at
//! `~/.qnasync/qnasync.toml`. CLI flags override config file values, which
//! override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "qnasync.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".qnasync";

// ---------------------------------------------------------------------------
// Config structs (matching qnasync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Artifact naming rules.
    #[serde(default)]
    pub naming: NamingConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[naming]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Allow-list of labels. The first one found inside the QA export path
    /// names the run's artifacts.
    #[serde(default)]
    pub rules: Vec<String>,
}

impl NamingConfig {
    /// Build a naming config from a comma-separated list (`"faq, support"`).
    pub fn from_csv(list: &str) -> Self {
        Self {
            rules: list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives the run artifacts.
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Whether the final artifact also gets a tab-separated sibling.
    #[serde(default = "default_true")]
    pub emit_tsv: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            emit_tsv: true,
        }
    }
}

fn default_output_dir() -> String {
    "ret_sync_active".into()
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.qnasync/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| SyncError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.qnasync/qnasync.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the user config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Resolve the config for a run: explicit path, then `./qnasync.toml` in
/// `cwd`, then the user config, then defaults.
pub fn resolve_config(explicit: Option<&Path>, cwd: &Path) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = cwd.join(CONFIG_FILE_NAME);
    if local.exists() {
        tracing::debug!(path = ?local, "using project-local config");
        return load_config_from(&local);
    }

    load_config()
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SyncError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SyncError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| SyncError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SyncError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
