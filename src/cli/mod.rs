//! CLI module
//!
//! Command-line interface for harvesting runs.
//!
//! # Commands
//!
//! - `friends` - Export the friend list of a user
//! - `groups` - Find likes and comments of users in group walls
//! - `keywords` - Find posts and comments mentioning keywords
//! - `search` - Search communities by name

mod commands;
mod runner;

pub use commands::{Cli, Commands, DEFAULT_API_LIMIT, LOG_FILE};
pub use runner::Runner;
