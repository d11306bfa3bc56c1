//! Fetch engine module
//!
//! Walks paginated resources to completion under a budget.
//!
//! # Overview
//!
//! The engine module provides:
//! - `PagedFetcher` - Drives page and batch round trips over an offset cursor
//! - `FetchConfig` - Configuration for fetch operations
//! - `FetchOutcome` - Records plus the error that ended the walk, if any
//! - `Harvester` - One entry point per resource kind
//!
//! Two strategies are available. Simple paging requests one page per round
//! trip. Batched paging learns the total from one plain page, then walks the
//! rest of the wall 25 pages at a time through a server-side script.

mod operations;
mod resources;
mod source;
mod types;

pub use operations::Harvester;
pub use resources::{Comments, Friends, GroupSearch, Likes, UserGroups, WallPosts};
pub use source::{BatchSource, BatchedResource, LookupSource, PageSource, PagedResource};
pub use types::{FetchConfig, FetchOutcome, FetchStats, DEFAULT_REQUEST_DELAY};

use crate::error::{Error, Result};
use crate::pagination::{FetchBudget, OffsetCursor, StopPredicate, BATCH_PAGES};
use tracing::{debug, warn};

/// Fetcher for walking paginated resources
#[derive(Debug, Default)]
pub struct PagedFetcher {
    /// Fetch configuration
    config: FetchConfig,
    /// Statistics
    stats: FetchStats,
}

impl PagedFetcher {
    /// Create a new fetcher
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            stats: FetchStats::default(),
        }
    }

    /// Fetch configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Get statistics
    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = FetchStats::default();
    }

    /// Walk `resource` one page per round trip.
    ///
    /// Stops when the cursor is exhausted, when `budget` records have been
    /// accumulated, or when `stop` fires on the last record collected.
    pub async fn fetch_paged<R, S>(
        &mut self,
        source: &S,
        resource: &R,
        budget: FetchBudget,
        stop: &dyn StopPredicate<R::Record>,
    ) -> Result<FetchOutcome<R::Record>>
    where
        R: PagedResource,
        S: PageSource<R> + ?Sized,
    {
        let page_size = resource.page_size();
        let first = match source.fetch_page(resource, 0, page_size).await {
            Ok(page) => page,
            Err(e) => return self.degrade(&resource.describe(), Vec::new(), e),
        };
        self.stats.add_page();

        let mut cursor = OffsetCursor::new(budget.clamp_total(first.total), page_size, page_size);
        let mut output = first.records;
        debug!(
            "{}: total {}, first page {} records",
            resource.describe(),
            first.total,
            output.len()
        );

        while cursor.continues() && !self.should_stop(&output, budget, stop) {
            self.pause().await;

            let offset = cursor.current_offset();
            match source.fetch_page(resource, offset, page_size).await {
                Ok(page) => {
                    self.stats.add_page();
                    debug!(
                        "{}: offset {offset}, {} records",
                        resource.describe(),
                        page.len()
                    );
                    output.extend(page.records);
                }
                Err(e) => return self.degrade(&resource.describe(), output, e),
            }
            cursor.advance(None);
        }

        self.stats.add_records(output.len());
        Ok(FetchOutcome::Complete(output))
    }

    /// Walk `resource` with the batch script after one plain page.
    ///
    /// Resources smaller than one page are served by that first page alone.
    /// Records are not truncated to `budget`, so the result may exceed it by
    /// up to one batch. Malformed batches are returned as errors.
    pub async fn fetch_batched<R, S>(
        &mut self,
        source: &S,
        resource: &R,
        budget: FetchBudget,
        stop: &dyn StopPredicate<R::Record>,
    ) -> Result<FetchOutcome<R::Record>>
    where
        R: BatchedResource,
        S: PageSource<R> + BatchSource + ?Sized,
    {
        let page_size = resource.page_size();
        let first = match source.fetch_page(resource, 0, page_size).await {
            Ok(page) => page,
            Err(e) => return self.degrade(&resource.describe(), Vec::new(), e),
        };
        self.stats.add_page();

        if first.total < page_size {
            debug!(
                "{}: {} records fit in one page",
                resource.describe(),
                first.total
            );
            self.stats.add_records(first.records.len());
            return Ok(FetchOutcome::Complete(first.records));
        }

        let width = page_size * BATCH_PAGES;
        let mut cursor = OffsetCursor::new(budget.clamp_total(first.total), page_size, page_size);
        let mut output = first.records;

        while cursor.continues() && !self.should_stop(&output, budget, stop) {
            self.pause().await;

            let offset = cursor.current_offset();
            let batch = match source.fetch_batch(resource.owner(), offset).await {
                Ok(batch) => batch,
                Err(e) => return self.degrade(&resource.describe(), output, e),
            };
            self.stats.add_batch();

            let expected = offset.saturating_add(width);
            if batch.offset_reached != expected {
                debug!(
                    "{}: batch at {offset} reached {}, advancing to {expected}",
                    resource.describe(),
                    batch.offset_reached
                );
            }

            let records = resource.flatten(batch)?;
            debug!(
                "{}: batch at {offset}, {} records",
                resource.describe(),
                records.len()
            );
            output.extend(records);
            cursor.advance(Some(width));
        }

        self.stats.add_records(output.len());
        Ok(FetchOutcome::Complete(output))
    }

    /// Budget reached or stop predicate fired on the newest record
    fn should_stop<T>(
        &self,
        output: &[T],
        budget: FetchBudget,
        stop: &dyn StopPredicate<T>,
    ) -> bool {
        budget.is_reached(output.len())
            || output
                .last()
                .is_some_and(|last| stop.check(last).should_stop())
    }

    /// Sleep between round trips
    async fn pause(&self) {
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }
    }

    /// Turn a failed round trip into an outcome carrying what was collected
    fn degrade<T>(
        &mut self,
        what: &str,
        records: Vec<T>,
        error: Error,
    ) -> Result<FetchOutcome<T>> {
        if error.is_contract_violation() {
            return Err(error);
        }

        self.stats.add_error();
        warn!("{what} failed after {} records: {error}", records.len());

        if records.is_empty() {
            Ok(FetchOutcome::Failed(error))
        } else {
            self.stats.add_records(records.len());
            Ok(FetchOutcome::Partial { records, error })
        }
    }
}

#[cfg(test)]
mod tests;
