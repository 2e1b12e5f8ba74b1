//! Collegium CLI
//!
//! Search and browse college listings from the terminal.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use collegium_cli::config_handlers::handle_config_command;
use collegium_cli::{Cli, Command, commands, logging, tui};
use collegium_core::{CollegiumConfig, ConfigManager};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Command::Browse);

    // Config commands must work even when the file does not validate.
    if let Command::Config { action } = command {
        handle_config_command(cli.config.as_deref(), action)?;
        return Ok(());
    }

    let mut config = CollegiumConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let interactive = matches!(command, Command::Browse);
    logging::init(&config.logging, cli.verbose, interactive)?;
    tracing::debug!(source = %config.data.source, page_size = config.grid.page_size, "Starting");

    let stdout = std::io::stdout();
    match command {
        Command::Browse => tokio::task::block_in_place(|| tui::run(&config)),
        Command::Search(args) => commands::search(&config, &args, &mut stdout.lock()).await,
        Command::Rows(args) => commands::rows(&config, &args, &mut stdout.lock()).await,
        Command::Config { .. } => Ok(()),
    }
}
