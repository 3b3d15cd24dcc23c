/// Configuration schema and defaults for topiclens.
///
/// Sections: `[backend]`, `[dashboard]`, `[web]`, `[logging]`. Every field
/// has a built-in default; config files only need the keys they change.
use serde::{Deserialize, Serialize};

/// Top-level topiclens configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopiclensConfig {
    pub backend: BackendConfig,
    pub dashboard: DashboardConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the analysis backend lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend serving `/analyze` and `/results`.
    pub base_url: String,
    /// Deadline for one analysis request, in seconds.
    pub timeout_secs: u64,
    /// Load the backend's last saved result when the dashboard opens.
    ///
    /// The backend keeps a single saved result for everyone, so this is
    /// only appropriate for single-user deployments.
    pub restore_saved: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 60,
            restore_saved: false,
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Topic count pre-filled in the form and used by `analyze` without `--topics`.
    pub default_topics: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { default_topics: 5 }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `topiclens serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
    /// Script URL for Chart.js.
    pub chart_js_url: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
            chart_js_url: "https://cdn.jsdelivr.net/npm/chart.js".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    pub level: String,
    /// Append each analysis run to `~/.topiclens/run-log.jsonl`.
    pub run_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            run_log: true,
        }
    }
}

impl TopiclensConfig {
    /// Annotated default config written by `topiclens config init`.
    pub fn default_toml() -> String {
        r#"# topiclens Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (TOPICLENS_*)
#   2. Project config (.topiclens.toml in current directory)
#   3. User global config (~/.topiclens/config.toml)
#   4. Built-in defaults

[backend]
base_url = "http://127.0.0.1:8080"
timeout_secs = 60        # Deadline for one /analyze request
restore_saved = false    # Load the backend's saved result on open (single-user only)

[dashboard]
default_topics = 5       # The backend accepts 2-10

[web]
addr = "127.0.0.1:9747"
open_browser = true
chart_js_url = "https://cdn.jsdelivr.net/npm/chart.js"

[logging]
level = "info"           # error | warn | info | debug | trace (RUST_LOG wins)
run_log = true           # Append runs to ~/.topiclens/run-log.jsonl
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_back_to_defaults() {
        let config: TopiclensConfig = toml::from_str(&TopiclensConfig::default_toml()).unwrap();
        assert_eq!(config, TopiclensConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: TopiclensConfig = toml::from_str(
            r#"
[backend]
timeout_secs = 90
"#,
        )
        .unwrap();
        assert_eq!(config.backend.timeout_secs, 90);
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.dashboard.default_topics, 5);
        assert!(!config.backend.restore_saved);
    }

    #[test]
    fn default_timeout_is_sixty_seconds() {
        assert_eq!(BackendConfig::default().timeout_secs, 60);
    }
}
