//! Page source capabilities
//!
//! The fetcher never talks to the network directly. It drives whatever
//! implements these traits: the VK client in production, in-memory fakes in
//! tests.

use crate::error::Result;
use crate::pagination::{BatchPage, Page, DEFAULT_STEP};
use crate::types::{Group, OwnerId, User};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// A paginated remote collection
pub trait PagedResource: Send + Sync {
    /// Record type returned by one page
    type Record: DeserializeOwned + Send;

    /// API method serving this collection
    fn method(&self) -> &'static str;

    /// Method parameters, excluding `offset` and `count`
    fn params(&self) -> Vec<(&'static str, String)>;

    /// Records requested per round trip
    fn page_size(&self) -> u64 {
        DEFAULT_STEP
    }

    /// Short label used in log lines
    fn describe(&self) -> String {
        self.method().to_string()
    }
}

/// A paginated collection that can also be walked in server-side batches
pub trait BatchedResource: PagedResource {
    /// Wall owner the batch script is run against
    fn owner(&self) -> OwnerId;

    /// Turn one batch into records, outer page first
    fn flatten(&self, batch: BatchPage) -> Result<Vec<Self::Record>>;
}

/// Serves single pages of a resource
#[async_trait]
pub trait PageSource<R: PagedResource>: Send + Sync {
    /// Fetch `count` records of `resource` starting at `offset`
    async fn fetch_page(&self, resource: &R, offset: u64, count: u64) -> Result<Page<R::Record>>;
}

/// Serves batched wall walks
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// Run one batch starting at `offset` on `owner`'s wall
    async fn fetch_batch(&self, owner: OwnerId, offset: u64) -> Result<BatchPage>;
}

/// Serves non-paged id lookups
#[async_trait]
pub trait LookupSource: Send + Sync {
    /// Resolve community ids to groups
    async fn groups_by_id(&self, ids: &[i64]) -> Result<Vec<Group>>;

    /// Resolve user ids to profiles
    async fn users_by_id(&self, ids: &[i64]) -> Result<Vec<User>>;
}
