//! Engine types
//!
//! Configuration, statistics and the outcome of one fetch call.

use crate::error::Error;
use std::time::Duration;

/// Default pause between successive round trips
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(333);

/// Configuration for fetch operations
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Pause between successive round trips of one walk
    pub request_delay: Duration,
    /// Ids per `groups.getById` call
    pub group_lookup_chunk: usize,
    /// Ids per `users.get` call
    pub user_lookup_chunk: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_delay: DEFAULT_REQUEST_DELAY,
            group_lookup_chunk: 500,
            user_lookup_chunk: 1000,
        }
    }
}

impl FetchConfig {
    /// Create a new fetch config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inter-request delay
    #[must_use]
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Set lookup chunk sizes
    #[must_use]
    pub fn with_lookup_chunks(mut self, groups: usize, users: usize) -> Self {
        self.group_lookup_chunk = groups.max(1);
        self.user_lookup_chunk = users.max(1);
        self
    }
}

/// Statistics accumulated across fetch calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Single-page round trips
    pub pages_fetched: usize,
    /// Batch round trips
    pub batches_fetched: usize,
    /// Records returned to callers
    pub records_fetched: usize,
    /// Fetch calls that ended early on an error
    pub errors: usize,
}

impl FetchStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a batch
    pub fn add_batch(&mut self) {
        self.batches_fetched += 1;
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_fetched += count;
    }

    /// Add an error
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Total round trips
    pub fn round_trips(&self) -> usize {
        self.pages_fetched + self.batches_fetched
    }
}

/// Result of one fetch call.
///
/// Transport and API failures do not abort the caller. Whatever was
/// accumulated before the failure is kept alongside the error.
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// The walk ended normally (exhausted, budget or stop predicate)
    Complete(Vec<T>),
    /// A round trip failed after some records were collected
    Partial { records: Vec<T>, error: Error },
    /// The first round trip failed
    Failed(Error),
}

impl<T> FetchOutcome<T> {
    /// Records collected, empty when the fetch failed outright
    pub fn records(&self) -> &[T] {
        match self {
            Self::Complete(records) | Self::Partial { records, .. } => records,
            Self::Failed(_) => &[],
        }
    }

    /// Consume the outcome, keeping only the records
    pub fn into_records(self) -> Vec<T> {
        match self {
            Self::Complete(records) | Self::Partial { records, .. } => records,
            Self::Failed(_) => Vec::new(),
        }
    }

    /// The error that ended the walk, if any
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Complete(_) => None,
            Self::Partial { error, .. } | Self::Failed(error) => Some(error),
        }
    }

    /// Whether the walk ended without error
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    /// Whether the walk produced nothing because the first request failed
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Number of records collected
    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// Whether no records were collected
    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Convert records, preserving the outcome kind
    pub fn map<U>(self, f: impl FnOnce(Vec<T>) -> Vec<U>) -> FetchOutcome<U> {
        match self {
            Self::Complete(records) => FetchOutcome::Complete(f(records)),
            Self::Partial { records, error } => FetchOutcome::Partial {
                records: f(records),
                error,
            },
            Self::Failed(error) => FetchOutcome::Failed(error),
        }
    }
}
