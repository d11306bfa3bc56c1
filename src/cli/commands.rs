//! CLI commands and argument parsing

use crate::config::DEFAULT_CONFIG_FILE;
use crate::pagination::FetchBudget;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default ceiling on records fetched per walk
pub const DEFAULT_API_LIMIT: u64 = 2500;

/// Log file written next to the sheets unless `--no-log-file` is given
pub const LOG_FILE: &str = "vk-harvest.log";

/// Harvest VK groups, posts, likes, comments and friends into spreadsheets
#[derive(Parser, Debug)]
#[command(name = "vk-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Maximum records fetched per list (0 = no limit)
    #[arg(short = 'l', long, global = true, default_value_t = DEFAULT_API_LIMIT)]
    pub api_limit: u64,

    /// Write a config template to the config path and exit
    #[arg(long)]
    pub extract_config: bool,

    /// Do not write vk-harvest.log
    #[arg(long, global = true)]
    pub no_log_file: bool,

    /// Directory the sheets are written to
    #[arg(short, long, global = true, default_value = ".")]
    pub output: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Export the friend list of the configured user
    #[command(alias = "fr")]
    Friends,

    /// Find likes and comments of the configured users in group walls
    #[command(alias = "gr")]
    Groups {
        /// Only posts published on or after this date (dd.mm.yyyy)
        #[arg(short, long)]
        date: Option<String>,

        /// Look for likes
        #[arg(long)]
        likes: bool,

        /// Do not look for comments
        #[arg(long)]
        no_comments: bool,
    },

    /// Find posts mentioning the configured keywords
    #[command(alias = "kw")]
    Keywords {
        /// Also search the comments of every post
        #[arg(long)]
        comments: bool,
    },

    /// Search communities by name
    Search {
        /// Search query
        query: String,
    },
}

impl Cli {
    /// Budget applied to every list walk
    pub fn budget(&self) -> FetchBudget {
        FetchBudget::limited(self.api_limit)
    }
}
