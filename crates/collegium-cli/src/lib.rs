//! # collegium-cli
//!
//! Terminal front end for Collegium.
//!
//! This crate provides:
//! - An interactive grid with live search and incremental paging
//! - Headless `search` and `rows` commands for scripting
//! - Config management (`path`, `get`, `set`, `init`, `export`)
//! - Tracing subscriber setup

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod columns;
pub mod commands;
pub mod config_handlers;
pub mod logging;
pub mod tui;

pub use cli::{Cli, Command, ConfigAction};
