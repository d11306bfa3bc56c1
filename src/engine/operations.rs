//! Fetch operations
//!
//! One entry point per resource kind. Each picks the paging strategy and
//! owner id convention for its resource and hands the walk to
//! [`PagedFetcher`].

use super::resources::{Comments, Friends, GroupSearch, Likes, UserGroups, WallPosts};
use super::source::{BatchSource, LookupSource, PageSource};
use super::types::{FetchConfig, FetchOutcome, FetchStats};
use super::PagedFetcher;
use crate::error::Result;
use crate::pagination::{DateCutoff, FetchBudget, NeverStop};
use crate::types::{Comment, Group, Post, User};
use tracing::{debug, info};

/// Fetch operations over a shared source
pub struct Harvester<'a, S: ?Sized> {
    source: &'a S,
    fetcher: PagedFetcher,
}

impl<'a, S: ?Sized> Harvester<'a, S> {
    /// Create a harvester over `source`
    pub fn new(source: &'a S, config: FetchConfig) -> Self {
        Self {
            source,
            fetcher: PagedFetcher::new(config),
        }
    }

    /// Get statistics
    pub fn stats(&self) -> &FetchStats {
        self.fetcher.stats()
    }

    /// Sleep for the configured inter-request delay
    pub async fn pause(&self) {
        self.fetcher.pause().await;
    }

    /// Communities matching `query`
    pub async fn search_groups(
        &mut self,
        query: &str,
        budget: FetchBudget,
    ) -> Result<FetchOutcome<Group>>
    where
        S: PageSource<GroupSearch>,
    {
        let resource = GroupSearch::new(query);
        self.fetcher
            .fetch_paged(self.source, &resource, budget, &NeverStop)
            .await
    }

    /// Posts on the wall of community `group_id`, newest first.
    ///
    /// With a cutoff the walk stops after the first round trip that reaches
    /// a post older than it. Older posts from that round trip are kept.
    pub async fn wall_posts(
        &mut self,
        group_id: i64,
        budget: FetchBudget,
        cutoff: Option<DateCutoff>,
    ) -> Result<FetchOutcome<Post>>
    where
        S: PageSource<WallPosts> + BatchSource,
    {
        let resource = WallPosts::community(group_id);
        match cutoff {
            Some(cutoff) => {
                self.fetcher
                    .fetch_batched(self.source, &resource, budget, &cutoff)
                    .await
            }
            None => {
                self.fetcher
                    .fetch_batched(self.source, &resource, budget, &NeverStop)
                    .await
            }
        }
    }

    /// Users who liked post `post_id` of community `group_id`
    pub async fn likes(
        &mut self,
        group_id: i64,
        post_id: i64,
        budget: FetchBudget,
    ) -> Result<FetchOutcome<User>>
    where
        S: PageSource<Likes>,
    {
        let resource = Likes::post(group_id, post_id);
        self.fetcher
            .fetch_paged(self.source, &resource, budget, &NeverStop)
            .await
    }

    /// Top-level comments of a post
    pub async fn comments(
        &mut self,
        group_id: i64,
        post_id: i64,
        budget: FetchBudget,
    ) -> Result<FetchOutcome<Comment>>
    where
        S: PageSource<Comments>,
    {
        let resource = Comments::post(group_id, post_id);
        self.fetcher
            .fetch_paged(self.source, &resource, budget, &NeverStop)
            .await
    }

    /// Replies in the thread under `comment_id`
    pub async fn thread(
        &mut self,
        group_id: i64,
        post_id: i64,
        comment_id: i64,
        budget: FetchBudget,
    ) -> Result<FetchOutcome<Comment>>
    where
        S: PageSource<Comments>,
    {
        let resource = Comments::thread(group_id, post_id, comment_id);
        self.fetcher
            .fetch_paged(self.source, &resource, budget, &NeverStop)
            .await
    }

    /// Top-level comments followed by the replies of every non-empty thread.
    ///
    /// Each thread is its own walk with its own budget. A failed thread turns
    /// the result partial but does not stop the remaining threads.
    pub async fn comments_with_threads(
        &mut self,
        group_id: i64,
        post_id: i64,
        budget: FetchBudget,
    ) -> Result<FetchOutcome<Comment>>
    where
        S: PageSource<Comments>,
    {
        let top = self.comments(group_id, post_id, budget).await?;
        let (mut records, mut error) = match top {
            FetchOutcome::Failed(e) => return Ok(FetchOutcome::Failed(e)),
            FetchOutcome::Complete(records) => (records, None),
            FetchOutcome::Partial { records, error } => (records, Some(error)),
        };

        let threads: Vec<i64> = records
            .iter()
            .filter(|c| c.thread_count > 0)
            .map(|c| c.id)
            .collect();

        for comment_id in threads {
            self.pause().await;
            let replies = self.thread(group_id, post_id, comment_id, budget).await?;
            if let Some(e) = replies.error() {
                debug!("thread {comment_id} of {group_id}_{post_id} incomplete: {e}");
            }
            match replies {
                FetchOutcome::Complete(more) => records.extend(more),
                FetchOutcome::Partial { records: more, error: e } => {
                    records.extend(more);
                    error.get_or_insert(e);
                }
                FetchOutcome::Failed(e) => {
                    error.get_or_insert(e);
                }
            }
        }

        Ok(match error {
            None => FetchOutcome::Complete(records),
            Some(error) => FetchOutcome::Partial { records, error },
        })
    }

    /// Communities user `user_id` is a member of
    pub async fn user_groups(
        &mut self,
        user_id: i64,
        budget: FetchBudget,
    ) -> Result<FetchOutcome<Group>>
    where
        S: PageSource<UserGroups>,
    {
        let resource = UserGroups { user_id };
        self.fetcher
            .fetch_paged(self.source, &resource, budget, &NeverStop)
            .await
    }

    /// Friends of user `user_id`
    pub async fn friends(
        &mut self,
        user_id: i64,
        budget: FetchBudget,
    ) -> Result<FetchOutcome<User>>
    where
        S: PageSource<Friends>,
    {
        let resource = Friends { user_id };
        self.fetcher
            .fetch_paged(self.source, &resource, budget, &NeverStop)
            .await
    }

    /// Resolve community ids, in chunks sized for `groups.getById`
    pub async fn groups_by_id(&mut self, ids: &[i64]) -> Result<FetchOutcome<Group>>
    where
        S: LookupSource,
    {
        let chunk = self.fetcher.config().group_lookup_chunk;
        let mut records = Vec::with_capacity(ids.len());

        for (n, part) in ids.chunks(chunk.max(1)).enumerate() {
            if n > 0 {
                self.pause().await;
            }
            match self.source.groups_by_id(part).await {
                Ok(groups) => {
                    self.fetcher.stats.add_page();
                    records.extend(groups);
                }
                Err(e) => return self.fetcher.degrade("groups.getById", records, e),
            }
        }

        info!("resolved {} of {} groups", records.len(), ids.len());
        self.fetcher.stats.add_records(records.len());
        Ok(FetchOutcome::Complete(records))
    }

    /// Resolve user ids, in chunks sized for `users.get`
    pub async fn users_by_id(&mut self, ids: &[i64]) -> Result<FetchOutcome<User>>
    where
        S: LookupSource,
    {
        let chunk = self.fetcher.config().user_lookup_chunk;
        let mut records = Vec::with_capacity(ids.len());

        for (n, part) in ids.chunks(chunk.max(1)).enumerate() {
            if n > 0 {
                self.pause().await;
            }
            match self.source.users_by_id(part).await {
                Ok(users) => {
                    self.fetcher.stats.add_page();
                    records.extend(users);
                }
                Err(e) => return self.fetcher.degrade("users.get", records, e),
            }
        }

        self.fetcher.stats.add_records(records.len());
        Ok(FetchOutcome::Complete(records))
    }

    /// Resolve a single user
    pub async fn user(&mut self, user_id: i64) -> Result<Option<User>>
    where
        S: LookupSource,
    {
        let outcome = self.users_by_id(&[user_id]).await?;
        Ok(outcome.into_records().into_iter().next())
    }
}
