/// Configuration system for topiclens.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::TopiclensConfig::default()`]
/// 2. **User global config**: `~/.topiclens/config.toml`
/// 3. **Project local config**: `.topiclens.toml` in the current working directory
/// 4. **Environment variables**: `TOPICLENS_*` overrides (highest precedence)
///
/// A file layer replaces the previous layer wholesale; since every section
/// deserializes with defaults, keys a file leaves out keep their default.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::TopiclensConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> TopiclensConfig {
    let mut config = TopiclensConfig::default();

    if let Some(global) = global_config_path().and_then(|p| load_toml_file(&p)) {
        config = global;
    }

    if let Some(project) = project_config_path().and_then(|p| load_toml_file(&p)) {
        config = project;
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
}

/// Load a TOML config file, if it exists and parses.
///
/// Malformed files are logged and skipped so a typo never blocks a run.
fn load_toml_file(path: &Path) -> Option<TopiclensConfig> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("ignoring malformed config {}: {e}", path.display());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.topiclens`, home of the global config and the run log.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".topiclens"))
}

fn global_config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".topiclens.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `TOPICLENS_BACKEND_URL`: backend base URL
/// - `TOPICLENS_TIMEOUT_SECS`: analysis request deadline
/// - `TOPICLENS_RESTORE_SAVED`: load the saved result on open (`1`/`true`)
/// - `TOPICLENS_WEB_ADDR`: dashboard listen address
/// - `TOPICLENS_LOG_LEVEL`: default log filter
/// - `TOPICLENS_RUN_LOG`: run log on/off
fn apply_env_overrides(config: &mut TopiclensConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("TOPICLENS_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.base_url = val;
    }
    if let Some(val) = var("TOPICLENS_TIMEOUT_SECS")
        && let Ok(secs) = val.parse::<u64>()
    {
        config.backend.timeout_secs = secs;
    }
    if let Some(val) = var("TOPICLENS_RESTORE_SAVED") {
        config.backend.restore_saved = is_truthy(&val);
    }
    if let Some(val) = var("TOPICLENS_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Some(val) = var("TOPICLENS_LOG_LEVEL")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
    if let Some(val) = var("TOPICLENS_RUN_LOG") {
        config.logging.run_log = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / show
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.topiclens/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    fs::write(path, TopiclensConfig::default_toml()).context("failed to write config file")?;
    Ok(())
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
