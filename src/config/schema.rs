/// Configuration schema and defaults for the compass client.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[display]` and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level compass configuration.
///
/// Maps directly to the `~/.compass/config.toml` and `.compass.toml` file
/// schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompassConfig {
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Where the Compass API lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix.
    pub base_url: String,
    /// Per-request timeout in milliseconds. `0` waits indefinitely.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout_ms: 30_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// Color when stdout is a terminal (decided by `colored`).
    #[default]
    Auto,
    Always,
    Never,
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Always => write!(f, "always"),
            Self::Never => write!(f, "never"),
        }
    }
}

/// Terminal rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Maximum characters of preview text shown per list entry.
    pub preview_chars: usize,
    /// Maximum list entries printed per view.
    pub list_limit: usize,
    pub color: ColorMode,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            preview_chars: 200,
            list_limit: 50,
            color: ColorMode::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// JSONL logging under `~/.compass/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Master switch for both logs.
    pub enabled: bool,
    /// Log every API call to `requests.jsonl`.
    pub requests: bool,
    /// Log controller events (loads, stale drops, failures) to `events.jsonl`.
    pub events: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: true,
            events: true,
        }
    }
}

impl LoggingConfig {
    pub fn requests_enabled(&self) -> bool {
        self.enabled && self.requests
    }

    pub fn events_enabled(&self) -> bool {
        self.enabled && self.events
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl CompassConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `compass config init`.
    pub fn default_toml() -> String {
        r#"# compass configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (COMPASS_*)
#   2. Project config (.compass.toml in current directory)
#   3. User global config (~/.compass/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://127.0.0.1:8000/api"   # or COMPASS_API_URL
timeout_ms = 30000                        # 0 = wait indefinitely

[display]
preview_chars = 200
list_limit = 50
color = "auto"          # auto | always | never

[logging]
enabled = true          # COMPASS_LOG=0 disables
requests = true         # ~/.compass/requests.jsonl
events = true           # ~/.compass/events.jsonl
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
    fn partial_toml_keeps_other_defaults() {
        let toml_str = r#"
[api]
base_url = "http://vault.local:9000/api"

[display]
color = "never"
"#;
        let config: CompassConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "http://vault.local:9000/api");
        assert_eq!(config.api.timeout_ms, 30_000);
        assert_eq!(config.display.color, ColorMode::Never);
        assert_eq!(config.display.preview_chars, 200);
        assert!(config.logging.enabled);
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: CompassConfig = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:8000/api");
        assert_eq!(config.display.list_limit, 50);
        assert_eq!(config.display.color, ColorMode::Auto);
    }

    #[test]
    fn default_toml_parses_back() {
        let toml_str = CompassConfig::default_toml();
        let config: CompassConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.api.timeout_ms, 30_000);
        assert!(config.logging.requests_enabled());
    }

    #[test]
    fn master_switch_disables_both_logs() {
        let logging = LoggingConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(!logging.requests_enabled());
        assert!(!logging.events_enabled());
    }

    #[test]
    fn color_mode_display() {
        assert_eq!(ColorMode::Auto.to_string(), "auto");
        assert_eq!(ColorMode::Always.to_string(), "always");
        assert_eq!(ColorMode::Never.to_string(), "never");
    }
}
