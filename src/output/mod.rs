//! Output module
//!
//! Handles spreadsheet export of harvested matches.
//!
//! # Overview
//!
//! This module provides:
//! - Row types for each sheet (likes, comments, friends, keyword hits, groups)
//! - Links back to the matched posts and comments
//! - A CSV writer producing one file per sheet

mod rows;
mod writer;

pub use rows::{
    comment_url, likes_url, post_url, OutComment, OutFriend, OutGroup, OutKeyword, OutLike,
    SheetRow,
};
pub use writer::{Sheet, SheetWriter, DEFAULT_STEM};
