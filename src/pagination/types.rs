//! Pagination types and traits
//!
//! Budgets, pages and the stop predicates evaluated between round trips.

use crate::types::{Comment, Post};
use chrono::{DateTime, Utc};

/// One page returned by a single round trip
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Total reported by the source (only meaningful on the first page)
    pub total: u64,
    /// Records in server order
    pub records: Vec<T>,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(total: u64, records: Vec<T>) -> Self {
        Self { total, records }
    }

    /// An empty page reporting a zero total
    pub fn empty() -> Self {
        Self {
            total: 0,
            records: Vec::new(),
        }
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether this page has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Ceiling on records accumulated by one fetch call.
///
/// Independent of the server-reported total. A limit of 0 means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchBudget {
    limit: Option<u64>,
}

impl FetchBudget {
    /// No ceiling; the walk is bounded only by the source total
    pub fn unlimited() -> Self {
        Self { limit: None }
    }

    /// Ceiling of `limit` records (0 = unlimited)
    pub fn limited(limit: u64) -> Self {
        Self {
            limit: (limit > 0).then_some(limit),
        }
    }

    /// The ceiling, if any
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Whether `accumulated` records satisfy the budget
    pub fn is_reached(&self, accumulated: usize) -> bool {
        self.limit.is_some_and(|limit| accumulated as u64 >= limit)
    }

    /// Bound a reported total by the budget
    pub fn clamp_total(&self, total: u64) -> u64 {
        self.limit.map_or(total, |limit| total.min(limit))
    }
}

impl From<u64> for FetchBudget {
    fn from(limit: u64) -> Self {
        Self::limited(limit)
    }
}

/// Result of checking a stop predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopResult {
    /// Continue pagination
    Continue,
    /// Stop pagination
    Stop,
}

impl StopResult {
    /// Check if we should continue
    pub fn should_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Check if we should stop
    pub fn should_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }
}

/// Early-exit check evaluated against the last record of each appended
/// page, before the next round trip is issued.
pub trait StopPredicate<T>: Send + Sync {
    /// Inspect the last appended record
    fn check(&self, last: &T) -> StopResult;
}

impl<T, F> StopPredicate<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn check(&self, last: &T) -> StopResult {
        if self(last) {
            StopResult::Stop
        } else {
            StopResult::Continue
        }
    }
}

/// Predicate that never fires
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl<T> StopPredicate<T> for NeverStop {
    fn check(&self, _last: &T) -> StopResult {
        StopResult::Continue
    }
}

/// Records carrying a publication date
pub trait Dated {
    /// Publication date
    fn date(&self) -> DateTime<Utc>;
}

impl Dated for Post {
    fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

impl Dated for Comment {
    fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

/// Stops once the last appended record is older than the cutoff.
///
/// VK walls are returned newest first, so everything after that record is
/// older still.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCutoff {
    cutoff: DateTime<Utc>,
}

impl DateCutoff {
    /// Create a cutoff predicate
    pub fn new(cutoff: DateTime<Utc>) -> Self {
        Self { cutoff }
    }

    /// The cutoff instant
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Whether a record is on or after the cutoff
    pub fn admits<T: Dated>(&self, record: &T) -> bool {
        record.date() >= self.cutoff
    }
}

impl<T: Dated> StopPredicate<T> for DateCutoff {
    fn check(&self, last: &T) -> StopResult {
        if last.date() < self.cutoff {
            StopResult::Stop
        } else {
            StopResult::Continue
        }
    }
}
