//! Command-line argument definitions.

use clap::{ArgAction, Args, Parser, Subcommand};
use collegium_core::CollegiumConfig;
use collegium_grid::{SortKey, SortSpec};

/// Collegium - searchable, incrementally paged college listings
#[derive(Parser, Debug)]
#[command(name = "collegium", version)]
#[command(about = "Search and browse college listings", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "COLLEGIUM_CONFIG")]
    pub config: Option<String>,

    /// Record source (file path or http(s) URL); overrides `data.source`
    #[arg(short, long, global = true)]
    pub source: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to this file; overrides `logging.file`
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    /// Command to run; the interactive grid when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut CollegiumConfig) {
        if let Some(source) = &self.source {
            config.data.source = source.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
    }
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Browse the listing in an interactive grid (default)
    Browse,
    /// Filter the listing and print the visible window
    Search(SearchArgs),
    /// Fetch one row block the way the grid requests it
    Rows(RowsArgs),
    /// Configuration management
    Config {
        /// Config subcommand
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `collegium search`.
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Case-insensitive substring of the college name
    pub query: Option<String>,

    /// Number of pages to reveal
    #[arg(short, long, default_value_t = 1)]
    pub pages: usize,

    /// Sort column (rank, name, fees, placement, user_review, ranking)
    #[arg(long)]
    pub sort: Option<SortKey>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    /// The requested sort, if any.
    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.sort.map(|key| {
            if self.desc {
                SortSpec::descending(key)
            } else {
                SortSpec::ascending(key)
            }
        })
    }
}

/// Arguments for `collegium rows`.
#[derive(Args, Debug, Clone)]
pub struct RowsArgs {
    /// First row (inclusive)
    #[arg(long)]
    pub start: usize,

    /// Last row (exclusive)
    #[arg(long)]
    pub end: usize,

    /// Filter before slicing
    #[arg(short, long)]
    pub query: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// `collegium config` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Print a value by dotted key (e.g. grid.page_size)
    Get {
        /// Dotted key
        key: String,
    },
    /// Set a value by dotted key in the config file
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Write a default config file
    Init {
        /// Target file (defaults to the platform config path)
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration as environment variables
    Export {
        /// Format as `--env KEY=VALUE` for docker
        #[arg(long)]
        docker_env: bool,
    },
}
