//! Tracing subscriber setup.
//!
//! Library crates log through the `log` facade; the subscriber installed
//! here picks those records up alongside `tracing` events from the binary.
//! `RUST_LOG` always wins over the configured level and `-v` flags.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use collegium_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

const CRATES: [&str; 4] = ["collegium", "collegium_cli", "collegium_core", "collegium_grid"];

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error, with colors.
    Stderr,
    /// Append to a file, without colors.
    File(PathBuf),
    /// No subscriber is installed.
    Off,
}

impl LogTarget {
    /// Choose a target for the given logging section.
    ///
    /// The interactive grid owns the terminal, so it only logs when a
    /// file is configured.
    pub fn select(config: &LoggingConfig, interactive: bool) -> Self {
        match (config.file_path(), interactive) {
            (Some(path), _) => Self::File(path),
            (None, true) => Self::Off,
            (None, false) => Self::Stderr,
        }
    }
}

/// Filter directive for our crates at `level`, raised by `verbose`.
///
/// Dependencies stay at `warn` so HTTP client chatter does not drown the
/// grid's own events.
pub fn filter_directive(level: &str, verbose: u8) -> String {
    let level = match verbose {
        0 => level,
        1 => "debug",
        _ => "trace",
    };
    let mut directive = String::from("warn");
    for name in CRATES {
        directive.push_str(&format!(",{name}={level}"));
    }
    directive
}

/// Install the global subscriber.
pub fn init(config: &LoggingConfig, verbose: u8, interactive: bool) -> Result<()> {
    let target = LogTarget::select(config, interactive);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(&config.level, verbose)));

    match target {
        LogTarget::Off => Ok(()),
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install logger: {e}")),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))
        }
    }
}
