/// Configuration system for compass.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::CompassConfig::default()`]
/// 2. **User global config** — `~/.compass/config.toml`
/// 3. **Project local config** — `.compass.toml` in the current working directory
/// 4. **Environment variables** — `COMPASS_*` overrides (highest precedence)
///
/// File layers are merged key by key: a project file that only sets
/// `api.base_url` keeps every other value from the global file.
///
/// # Usage
///
/// ```rust,ignore
/// use compass::config;
///
/// let cfg = config::load();
/// let gateway = HttpGateway::from_config(&cfg.api, cfg.logging.requests_enabled());
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::CompassConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved compass configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> CompassConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    if let Some(global) = load_toml_value(global_config_path()) {
        merge_values(&mut merged, global);
    }
    if let Some(project) = load_toml_value(project_config_path()) {
        merge_values(&mut merged, project);
    }

    let mut config: CompassConfig = merged.try_into().unwrap_or_default();
    apply_env_overrides(&mut config);
    config
}

/// Read a TOML file as an untyped value tree.
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. A broken config file never stops the client.
fn load_toml_value(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    // Only accept files whose shape deserializes.
    value.clone().try_into::<CompassConfig>().ok()?;
    Some(value)
}

/// Deep-merge `overlay` into `base`: tables merge per key, everything else
/// is replaced.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.compass/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".compass").join("config.toml"))
}

/// Path to the project local config: `.compass.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".compass.toml"))
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
/// - `COMPASS_API_URL` — API base URL
/// - `COMPASS_TIMEOUT_MS` — request timeout
/// - `COMPASS_LOG` — logging master switch (`1`/`true`/`yes`/`on`)
/// - `COMPASS_COLOR` — `auto`, `always`, `never`
fn apply_env_overrides(config: &mut CompassConfig) {
    if let Ok(val) = std::env::var("COMPASS_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("COMPASS_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("COMPASS_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("COMPASS_COLOR")
        && let Some(mode) = parse_color(&val)
    {
        config.display.color = mode;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse a color mode string.
fn parse_color(val: &str) -> Option<schema::ColorMode> {
    match val.to_ascii_lowercase().as_str() {
        "auto" => Some(schema::ColorMode::Auto),
        "always" | "on" => Some(schema::ColorMode::Always),
        "never" | "off" => Some(schema::ColorMode::Never),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.compass/config.toml`.
///
/// Creates the `~/.compass/` directory if it doesn't exist. Returns an error
/// if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.compass/ directory")?;
    }

    fs::write(&path, CompassConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `api.base_url`. The existing value's type
/// decides how `value` is parsed.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let current = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&CompassConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&current).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Refuse to write a file that would no longer load.
    root.clone()
        .try_into::<CompassConfig>()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Walk `key` (e.g. `display.list_limit`) into `root` and replace the leaf.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        anyhow::bail!("empty config key segment in '{key}'");
    }
    let Some((leaf, sections)) = segments.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut node = root;
    for section in sections {
        node = node
            .get_mut(*section)
            .with_context(|| format!("unknown config section '{section}' in '{key}'"))?;
    }
    let table = node
        .as_table_mut()
        .with_context(|| format!("'{}' is not a config section", sections.join(".")))?;

    let value = coerce_value(table.get(*leaf), key, raw_value)?;
    table.insert((*leaf).to_string(), value);
    Ok(())
}

/// Parse `raw` as the same TOML type as the value it replaces.
fn coerce_value(existing: Option<&toml::Value>, key: &str, raw: &str) -> Result<toml::Value> {
    Ok(match existing {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw)),
        Some(toml::Value::Integer(_)) => toml::Value::Integer(
            raw.trim()
                .parse()
                .with_context(|| format!("'{key}' takes a whole number, got '{raw}'"))?,
        ),
        _ => toml::Value::String(raw.to_string()),
    })
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
