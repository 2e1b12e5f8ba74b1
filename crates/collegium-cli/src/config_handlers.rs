//! Handler functions for config CLI commands.
//!
//! Implements the config subcommands (`path`, `get`, `set`, `init`, `export`)
//! parameterized over any type implementing [`ConfigManager`]. Output goes
//! to the supplied writer so the handlers can be checked without a terminal.

use std::io::Write;
use std::path::PathBuf;

use collegium_core::config::{
    CollegiumConfig, ConfigManager, format_toml_value, get_nested_value, parse_value,
    set_nested_value,
};
use collegium_core::{Error, Result};

use crate::cli::ConfigAction;

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand for [`CollegiumConfig`], printing to stdout.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match action {
        ConfigAction::Path => cmd_config_path::<CollegiumConfig>(config_path, &mut out),
        ConfigAction::Get { key } => {
            cmd_config_get::<CollegiumConfig>(config_path, &key, &mut out)
        }
        ConfigAction::Set { key, value } => {
            cmd_config_set::<CollegiumConfig>(config_path, &key, &value, &mut out)
        }
        ConfigAction::Init { file, force } => {
            cmd_config_init::<CollegiumConfig>(file.as_deref(), force, &mut out)
        }
        ConfigAction::Export { docker_env } => {
            let config = CollegiumConfig::load(config_path)?;
            cmd_config_export(&config, docker_env, &mut out)
        }
    }
}

fn emit(out: &mut impl Write, line: impl std::fmt::Display) -> Result<()> {
    writeln!(out, "{line}").map_err(|e| Error::io_with_path(e, "<stdout>"))
}

// ============================================================================
// Generic command handlers
// ============================================================================

/// Show the resolved config file path.
pub fn cmd_config_path<C: ConfigManager>(
    config_path: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let path = C::resolve_config_path(config_path).ok_or_else(|| {
        Error::config("Could not determine config directory for this platform")
    })?;
    emit(out, path.display())?;
    if !path.exists() {
        eprintln!(
            "(file does not exist; run `{} config init` to create it)",
            C::project_name()
        );
    }
    Ok(())
}

/// Print a configuration value by dotted key.
///
/// The value reflects the file, environment overrides and defaults.
pub fn cmd_config_get<C: ConfigManager>(
    config_path: Option<&str>,
    key: &str,
    out: &mut impl Write,
) -> Result<()> {
    let config = C::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    let found = get_nested_value(&value, key)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))?;
    emit(out, format_toml_value(found))
}

/// Set a configuration value by dotted key in the config file.
///
/// The edited document must still load as a valid configuration; an
/// invalid edit is rejected and the file is left untouched.
pub fn cmd_config_set<C: ConfigManager>(
    config_path: Option<&str>,
    key: &str,
    value: &str,
    out: &mut impl Write,
) -> Result<()> {
    let path = C::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;

    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `{} config init` first.",
            path.display(),
            C::project_name()
        )));
    }
    let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

    set_nested_value(&mut doc, key, parse_value(value))?;

    let checked: C = doc
        .clone()
        .try_into()
        .map_err(|e| Error::config(format!("Invalid value for '{key}': {e}")))?;
    checked.validate()?;

    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;

    log::info!("Updated {key} in {}", path.display());
    emit(out, format!("Set {key} = {value} in {}", path.display()))
}

/// Create a default configuration file.
pub fn cmd_config_init<C: ConfigManager>(
    file: Option<&str>,
    force: bool,
    out: &mut impl Write,
) -> Result<()> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => C::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let toml_str = C::default().to_toml_string()?;
    std::fs::write(&path, &toml_str).map_err(|e| Error::io_with_path(e, &path))?;

    emit(out, format!("Config file created at {}", path.display()))
}

/// Export configuration as environment variables.
pub fn cmd_config_export<C: ConfigManager>(
    config: &C,
    docker_env: bool,
    out: &mut impl Write,
) -> Result<()> {
    for (key, value) in config.to_env_vars()? {
        if docker_env {
            emit(out, format!("--env {key}={value}"))?;
        } else {
            emit(out, format!("{key}={value}"))?;
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
