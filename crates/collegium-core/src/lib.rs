//! Collegium Core: shared types, errors, configuration, and formatting.
//!
//! This crate provides the foundational types used across all Collegium
//! crates. It has no internal Collegium dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`record`]: The college record model and its lenient decoding
//! - [`config`]: TOML configuration with env overrides
//! - [`currency`]: Currency formatting for amount columns

pub mod config;
pub mod currency;
pub mod error;
pub mod record;

// Re-export key types at crate root for convenience
pub use config::{CollegiumConfig, ConfigManager, DEFAULT_LATENCY_MS, DEFAULT_PAGE_SIZE};
pub use currency::{CurrencyFormat, Grouping};
pub use error::{Error, Result};
pub use record::{Record, ScoreValue};
