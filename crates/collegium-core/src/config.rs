//! Configuration loading, environment overrides, and TOML helpers.
//!
//! Configuration is a TOML file with four sections (`data`, `grid`,
//! `display`, `logging`). Every section is optional and every key has a
//! default, so an empty or missing file is a valid configuration.
//!
//! Resolution order for the file:
//! 1. Explicit path (`--config`)
//! 2. `COLLEGIUM_CONFIG` environment variable
//! 3. `<platform config dir>/collegium/config.toml`
//!
//! After the file is read, `COLLEGIUM_<SECTION>_<KEY>` environment
//! variables override individual keys (e.g. `COLLEGIUM_GRID_PAGE_SIZE=25`).
//!
//! # Example
//!
//! ```rust
//! use collegium_core::config::{CollegiumConfig, ConfigManager};
//!
//! let config = CollegiumConfig::load_with_env(Some("/nonexistent/config.toml"), |key| {
//!     (key == "COLLEGIUM_GRID_PAGE_SIZE").then(|| "25".to_string())
//! })
//! .unwrap();
//! assert_eq!(config.grid.page_size, 25);
//! assert_eq!(config.grid.latency_ms, 500);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::currency::{CurrencyFormat, DEFAULT_SYMBOL, Grouping};
use crate::error::{Error, Result};

/// Records shown per page and per row-request block.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Artificial latency applied to every row request.
pub const DEFAULT_LATENCY_MS: u64 = 500;

// ============================================================================
// ConfigManager
// ============================================================================

/// Shared behavior for TOML-backed configuration types.
///
/// Implementors provide a project name and, optionally, validation; file
/// resolution, env overrides and serialization come for free.
pub trait ConfigManager: Default + Serialize + DeserializeOwned {
    /// Project name used for the config directory and env prefix.
    fn project_name() -> &'static str;

    /// Dotted keys that may be overridden from the environment even though
    /// they are absent from the serialized defaults (optional keys).
    fn optional_keys() -> &'static [&'static str] {
        &[]
    }

    /// Check semantic constraints after loading.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Environment variable prefix, e.g. `COLLEGIUM`.
    fn env_prefix() -> String {
        Self::project_name().to_uppercase().replace(['-', ' '], "_")
    }

    /// Default config file location for this platform.
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::project_name()).join("config.toml"))
    }

    /// Resolve the config file path using the process environment.
    fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        Self::resolve_config_path_with(explicit, |key| std::env::var(key).ok())
    }

    /// Resolve the config file path using the given env lookup.
    fn resolve_config_path_with<F>(explicit: Option<&str>, lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = explicit {
            return Some(expand_path(path));
        }
        if let Some(path) = lookup(&format!("{}_CONFIG", Self::env_prefix())) {
            return Some(expand_path(&path));
        }
        Self::default_config_path()
    }

    /// Load configuration using the process environment.
    fn load(explicit: Option<&str>) -> Result<Self> {
        Self::load_with_env(explicit, |key| std::env::var(key).ok())
    }

    /// Load configuration, reading overrides through `lookup`.
    fn load_with_env<F>(explicit: Option<&str>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = toml::Value::try_from(Self::default())
            .map_err(|e| Error::config(format!("Failed to serialize defaults: {e}")))?;

        let mut value = match Self::resolve_config_path_with(explicit, &lookup) {
            Some(path) if path.exists() => {
                log::debug!("Loading config from {}", path.display());
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
                toml::from_str::<toml::Value>(&content).map_err(|e| {
                    Error::config(format!("Failed to parse {}: {e}", path.display()))
                })?
            }
            Some(path) => {
                log::debug!("No config at {}, using defaults", path.display());
                toml::Value::Table(toml::map::Map::new())
            }
            None => toml::Value::Table(toml::map::Map::new()),
        };

        let prefix = Self::env_prefix();
        let mut keys = flatten_keys(&defaults);
        keys.extend(Self::optional_keys().iter().map(|k| (*k).to_string()));
        for key in keys {
            let var = format!("{prefix}_{}", key.replace('.', "_").to_uppercase());
            if let Some(raw) = lookup(&var) {
                let typed = match get_nested_value(&defaults, &key) {
                    Some(template) => coerce_like(template, &raw).ok_or_else(|| {
                        Error::config(format!("{var}={raw} has the wrong type for '{key}'"))
                    })?,
                    None => toml::Value::String(raw),
                };
                log::debug!("Config override from {var}");
                set_nested_value(&mut value, &key, typed)?;
            }
        }

        let config: Self = value
            .try_into()
            .map_err(|e| Error::config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a pretty TOML document.
    fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Render every key as a `PREFIX_SECTION_KEY` environment variable.
    fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let prefix = Self::env_prefix();
        Ok(flatten_keys(&value)
            .into_iter()
            .filter_map(|key| {
                let val = get_nested_value(&value, &key)?;
                let var = format!("{prefix}_{}", key.replace('.', "_").to_uppercase());
                Some((var, format_toml_value(val)))
            })
            .collect())
    }
}

// ============================================================================
// CollegiumConfig
// ============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollegiumConfig {
    /// Where records come from.
    pub data: DataConfig,
    /// Paging and row-request behavior.
    pub grid: GridConfig,
    /// Presentation options.
    pub display: DisplayConfig,
    /// Logging options.
    pub logging: LoggingConfig,
}

impl ConfigManager for CollegiumConfig {
    fn project_name() -> &'static str {
        "collegium"
    }

    fn optional_keys() -> &'static [&'static str] {
        &["logging.file"]
    }

    fn validate(&self) -> Result<()> {
        if self.data.source.trim().is_empty() {
            return Err(Error::config("data.source must not be empty"));
        }
        if self.grid.page_size == 0 {
            return Err(Error::config("grid.page_size must be at least 1"));
        }
        if self.grid.request_timeout_ms == 0 {
            return Err(Error::config("grid.request_timeout_ms must be greater than 0"));
        }
        if self.grid.latency_ms >= self.grid.request_timeout_ms {
            return Err(Error::config(format!(
                "grid.latency_ms ({}) must be below grid.request_timeout_ms ({})",
                self.grid.latency_ms, self.grid.request_timeout_ms
            )));
        }
        Ok(())
    }
}

/// `[data]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// File path or http(s) URL of the JSON record array.
    pub source: String,
    /// Upper bound on the initial load.
    pub fetch_timeout_secs: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: "colleges.json".to_string(),
            fetch_timeout_secs: 10,
        }
    }
}

impl DataConfig {
    /// Fetch timeout as a `Duration`.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// `[grid]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Records per page and per row block.
    pub page_size: usize,
    /// Simulated round-trip latency for row requests.
    pub latency_ms: u64,
    /// Deadline for a single row request.
    pub request_timeout_ms: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            latency_ms: DEFAULT_LATENCY_MS,
            request_timeout_ms: 5000,
        }
    }
}

impl GridConfig {
    /// Row latency as a `Duration`.
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Row request deadline as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// `[display]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Prefix for fees and placement amounts.
    pub currency_symbol: String,
    /// Thousands separator convention.
    pub grouping: Grouping,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: DEFAULT_SYMBOL.to_string(),
            grouping: Grouping::default(),
        }
    }
}

impl DisplayConfig {
    /// Build the currency formatter described by this section.
    pub fn currency_format(&self) -> CurrencyFormat {
        CurrencyFormat::new(self.currency_symbol.clone(), self.grouping)
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (`RUST_LOG` wins when set).
    pub level: String,
    /// Optional log file; the terminal UI only logs when this is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Log file path with `~` expanded.
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_deref().map(expand_path)
    }
}

// ============================================================================
// TOML dotted-key helpers (public for reuse)
// ============================================================================

/// Expand `~` and `$VAR` references in a path string.
///
/// Unknown variables leave the path untouched.
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).into_owned()),
    }
}

/// All dotted leaf keys of a TOML table, sorted by key within each table.
pub fn flatten_keys(value: &toml::Value) -> Vec<String> {
    fn walk(prefix: &str, value: &toml::Value, out: &mut Vec<String>) {
        match value.as_table() {
            Some(table) => {
                for (k, v) in table {
                    let key = if prefix.is_empty() {
                        k.clone()
                    } else {
                        format!("{prefix}.{k}")
                    };
                    walk(&key, v, out);
                }
            }
            None if !prefix.is_empty() => out.push(prefix.to_string()),
            None => {}
        }
    }
    let mut out = Vec::new();
    walk("", value, &mut out);
    out
}

/// Navigate a dotted key path in a TOML value tree.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    let mut current = value;
    for part in key.split('.') {
        current = current.as_table()?.get(part)?;
    }
    Some(current)
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
pub fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    if let Some(parents) = parents {
        for part in parents.split('.') {
            let table = current
                .as_table_mut()
                .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
            current = table
                .entry(part.to_string())
                .or_insert(toml::Value::Table(toml::map::Map::new()));
        }
    }

    let table = current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?;
    table.insert(leaf.to_string(), value);
    Ok(())
}

/// Parse a string value into a TOML value, auto-detecting the type.
///
/// Priority: bool → integer → float → string.
pub fn parse_value(s: &str) -> toml::Value {
    if s == "true" {
        return toml::Value::Boolean(true);
    }
    if s == "false" {
        return toml::Value::Boolean(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(s.to_string())
}

/// Parse `raw` into the same TOML type as `template`.
pub fn coerce_like(template: &toml::Value, raw: &str) -> Option<toml::Value> {
    match template {
        toml::Value::String(_) => Some(toml::Value::String(raw.to_string())),
        toml::Value::Integer(_) => raw.trim().parse().ok().map(toml::Value::Integer),
        toml::Value::Float(_) => raw.trim().parse().ok().map(toml::Value::Float),
        toml::Value::Boolean(_) => raw.trim().parse().ok().map(toml::Value::Boolean),
        _ => None,
    }
}

/// Format a TOML value for display on stdout.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
