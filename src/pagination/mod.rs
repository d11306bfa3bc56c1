//! Pagination module
//!
//! Offset cursors, item budgets, stop predicates and the batched
//! multi-page response shape.
//!
//! # Overview
//!
//! VK collections are paged by `offset` + `count`. The first page of every
//! fetch reports the authoritative `count` (total) for the query; after that
//! an [`OffsetCursor`] decides where the next request starts and when the
//! walk is complete. Everything here is pure bookkeeping with no I/O; the
//! fetch loops that drive it live in [`crate::engine`].

mod batch;
mod cursor;
mod types;

pub use batch::{BatchPage, BATCH_PAGES};
pub use cursor::{OffsetCursor, DEFAULT_STEP};
pub use types::{Dated, DateCutoff, FetchBudget, NeverStop, Page, StopPredicate, StopResult};
