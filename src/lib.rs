// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # vk-harvest
//!
//! Harvests VK communities, wall posts, likes, comments and friend lists,
//! filters them for the users or keywords a run is looking for, and writes
//! the matches to CSV sheets.
//!
//! ## Features
//!
//! - **Offset Pagination**: Walks any list method to its end under a record budget
//! - **Batched Walls**: Fetches 25 wall pages per round trip through `execute`
//! - **Early Stop**: Date cutoffs end a wall walk once posts get too old
//! - **Partial Results**: A failed page keeps everything fetched before it
//! - **CSV Output**: One sheet per result kind, previous runs backed up
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vk_harvest::{api, Config, FetchBudget, Harvester};
//!
//! #[tokio::main]
//! async fn main() -> vk_harvest::Result<()> {
//!     let config = Config::load("vk-harvest.toml")?;
//!     let api = api::connect(&config)?;
//!
//!     let mut harvester = Harvester::new(&api, config.fetch_config());
//!     let posts = harvester
//!         .wall_posts(1, FetchBudget::limited(2500), None)
//!         .await?;
//!
//!     println!("{} posts", posts.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         CLI Runner                              │
//! │     friends      groups      keywords      search               │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Filter  │  Engine   │  Pagination   │  VK API   │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Keywords │ Paged     │ Offset cursor │ Envelope  │ CSV sheets  │
//! │ Users    │ Batched   │ Budget        │ execute   │ Backups     │
//! │ Dates    │ Lookups   │ Stop predicate│ Retry     │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and records
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// Offset cursor, budgets and stop predicates
pub mod pagination;

/// Paged and batched fetch engine
pub mod engine;

/// VK API client
pub mod api;

/// Configuration file
pub mod config;

/// Keyword, user and date filters
pub mod filter;

/// CSV sheet output
pub mod output;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::Config;
pub use engine::{FetchConfig, FetchOutcome, Harvester, PagedFetcher};
pub use pagination::{DateCutoff, FetchBudget, StopPredicate};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
