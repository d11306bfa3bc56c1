//! Tests for the fetch engine

use super::*;
use crate::error::Error;
use crate::pagination::{BatchPage, DateCutoff, NeverStop, Page};
use crate::types::{unix_to_datetime, Group, OwnerId, Post, User};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::sync::Mutex;
use std::time::Duration;

fn fast_config() -> FetchConfig {
    FetchConfig::new().with_request_delay(Duration::ZERO)
}

fn transport_error() -> Error {
    Error::http_status(503, "unavailable")
}

// ============================================================================
// Fakes
// ============================================================================

/// A flat numbered collection
struct Numbers;

impl PagedResource for Numbers {
    type Record = u64;

    fn method(&self) -> &'static str {
        "test.numbers"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Serves `0..total` and records every requested offset
struct NumberSource {
    total: u64,
    fail_at: Option<u64>,
    offsets: Mutex<Vec<u64>>,
    requested_at: Mutex<Vec<tokio::time::Instant>>,
}

impl NumberSource {
    fn new(total: u64) -> Self {
        Self {
            total,
            fail_at: None,
            offsets: Mutex::new(Vec::new()),
            requested_at: Mutex::new(Vec::new()),
        }
    }

    fn failing_at(mut self, offset: u64) -> Self {
        self.fail_at = Some(offset);
        self
    }

    fn offsets(&self) -> Vec<u64> {
        self.offsets.lock().unwrap().clone()
    }

    fn request_times(&self) -> Vec<tokio::time::Instant> {
        self.requested_at.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource<Numbers> for NumberSource {
    async fn fetch_page(&self, _: &Numbers, offset: u64, count: u64) -> Result<Page<u64>> {
        self.offsets.lock().unwrap().push(offset);
        self.requested_at
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        if self.fail_at == Some(offset) {
            return Err(transport_error());
        }
        let end = (offset + count).min(self.total);
        Ok(Page::new(self.total, (offset.min(end)..end).collect()))
    }
}

/// A community wall, newest post first, one post per hour going back
struct FakeWall {
    posts: Vec<Post>,
    page_calls: Mutex<Vec<u64>>,
    batch_calls: Mutex<Vec<(OwnerId, u64)>>,
    malformed: bool,
    fail_batches: bool,
}

const NEWEST: i64 = 1_600_000_000;

impl FakeWall {
    fn new(count: usize) -> Self {
        Self::for_group(1, count)
    }

    /// Wall of community `group_id`; posts carry its negative owner id
    fn for_group(group_id: i64, count: usize) -> Self {
        let owner_id = OwnerId::community(group_id).get();
        let posts = (0..count)
            .map(|i| Post {
                id: (count - i) as i64,
                owner_id,
                from_id: None,
                text: format!("post {i}"),
                likes: 0,
                comments: 0,
                date: unix_to_datetime(NEWEST - 3600 * i as i64),
            })
            .collect();
        Self {
            posts,
            page_calls: Mutex::new(Vec::new()),
            batch_calls: Mutex::new(Vec::new()),
            malformed: false,
            fail_batches: false,
        }
    }

    fn page_calls(&self) -> Vec<u64> {
        self.page_calls.lock().unwrap().clone()
    }

    fn batch_calls(&self) -> Vec<(OwnerId, u64)> {
        self.batch_calls.lock().unwrap().clone()
    }

    fn slice(&self, offset: u64, count: u64) -> &[Post] {
        let start = (offset as usize).min(self.posts.len());
        let end = (start + count as usize).min(self.posts.len());
        &self.posts[start..end]
    }
}

#[async_trait]
impl PageSource<WallPosts> for FakeWall {
    async fn fetch_page(&self, _: &WallPosts, offset: u64, count: u64) -> Result<Page<Post>> {
        self.page_calls.lock().unwrap().push(offset);
        Ok(Page::new(
            self.posts.len() as u64,
            self.slice(offset, count).to_vec(),
        ))
    }
}

#[async_trait]
impl BatchSource for FakeWall {
    async fn fetch_batch(&self, owner: OwnerId, offset: u64) -> Result<BatchPage> {
        self.batch_calls.lock().unwrap().push((owner, offset));
        if self.fail_batches {
            return Err(transport_error());
        }

        let mut batch = BatchPage {
            offset_reached: offset + 2500,
            ..BatchPage::default()
        };
        for page in 0..25 {
            let posts = self.slice(offset + page * 100, 100);
            batch.ids.push(posts.iter().map(|p| p.id).collect());
            batch.likes.push(posts.iter().map(|p| p.likes).collect());
            batch.comments.push(posts.iter().map(|p| p.comments).collect());
            batch.dates.push(posts.iter().map(|p| p.date.timestamp()).collect());
        }
        if self.malformed {
            batch.dates.pop();
        }
        Ok(batch)
    }
}

// ============================================================================
// Simple paging
// ============================================================================

#[tokio::test]
async fn test_simple_paging_walks_every_page() {
    let source = NumberSource::new(250);
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_paged(&source, &Numbers, FetchBudget::unlimited(), &NeverStop)
        .await
        .unwrap();

    assert_eq!(source.offsets(), vec![0, 100, 200]);
    assert!(outcome.is_complete());
    assert_eq!(outcome.into_records(), (0..250).collect::<Vec<_>>());
    assert_eq!(fetcher.stats().pages_fetched, 3);
    assert_eq!(fetcher.stats().records_fetched, 250);
}

#[tokio::test]
async fn test_simple_paging_budget_short_circuits() {
    let source = NumberSource::new(10_000);
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_paged(&source, &Numbers, FetchBudget::limited(150), &NeverStop)
        .await
        .unwrap();

    assert_eq!(source.offsets(), vec![0, 100]);
    assert_eq!(outcome.len(), 200);
}

#[tokio::test]
async fn test_simple_paging_budget_met_by_first_page() {
    let source = NumberSource::new(10_000);
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_paged(&source, &Numbers, FetchBudget::limited(100), &NeverStop)
        .await
        .unwrap();

    assert_eq!(source.offsets(), vec![0]);
    assert_eq!(outcome.len(), 100);
}

#[tokio::test]
async fn test_simple_paging_empty_resource() {
    let source = NumberSource::new(0);
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_paged(&source, &Numbers, FetchBudget::unlimited(), &NeverStop)
        .await
        .unwrap();

    assert_eq!(source.offsets(), vec![0]);
    assert!(outcome.is_complete());
    assert!(outcome.is_empty());
}

#[tokio::test]
async fn test_simple_paging_stop_predicate_checked_after_each_page() {
    let source = NumberSource::new(1000);
    let mut fetcher = PagedFetcher::new(fast_config());
    let past_150 = |n: &u64| *n >= 150;

    let outcome = fetcher
        .fetch_paged(&source, &Numbers, FetchBudget::unlimited(), &past_150)
        .await
        .unwrap();

    // Page at 100 ends on 199, which fires the predicate
    assert_eq!(source.offsets(), vec![0, 100]);
    assert_eq!(outcome.len(), 200);
}

#[tokio::test]
async fn test_simple_paging_stop_predicate_on_first_page() {
    let source = NumberSource::new(1000);
    let mut fetcher = PagedFetcher::new(fast_config());
    let always = |_: &u64| true;

    fetcher
        .fetch_paged(&source, &Numbers, FetchBudget::unlimited(), &always)
        .await
        .unwrap();

    assert_eq!(source.offsets(), vec![0]);
}

#[tokio::test]
async fn test_simple_paging_failure_keeps_collected_records() {
    let source = NumberSource::new(300).failing_at(200);
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_paged(&source, &Numbers, FetchBudget::unlimited(), &NeverStop)
        .await
        .unwrap();

    assert!(!outcome.is_complete());
    assert_eq!(outcome.len(), 200);
    assert!(matches!(
        outcome,
        FetchOutcome::Partial {
            error: Error::HttpStatus { status: 503, .. },
            ..
        }
    ));
    assert_eq!(fetcher.stats().errors, 1);
}

#[tokio::test]
async fn test_simple_paging_first_request_failure() {
    let source = NumberSource::new(300).failing_at(0);
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_paged(&source, &Numbers, FetchBudget::unlimited(), &NeverStop)
        .await
        .unwrap();

    assert!(outcome.is_failed());
    assert!(outcome.records().is_empty());
    assert_eq!(source.offsets(), vec![0]);
}

// ============================================================================
// Batched paging
// ============================================================================

#[tokio::test]
async fn test_batched_small_wall_uses_first_page_only() {
    let wall = FakeWall::new(50);
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_batched(
            &wall,
            &WallPosts::community(1),
            FetchBudget::unlimited(),
            &NeverStop,
        )
        .await
        .unwrap();

    assert_eq!(wall.page_calls(), vec![0]);
    assert!(wall.batch_calls().is_empty());
    assert_eq!(outcome.len(), 50);
}

#[tokio::test]
async fn test_batched_walks_in_batch_width_steps() {
    let wall = FakeWall::for_group(42, 6000);
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_batched(
            &wall,
            &WallPosts::community(42),
            FetchBudget::unlimited(),
            &NeverStop,
        )
        .await
        .unwrap();

    let owner = OwnerId::community(42);
    assert_eq!(wall.page_calls(), vec![0]);
    assert_eq!(
        wall.batch_calls(),
        vec![(owner, 100), (owner, 2600), (owner, 5100)]
    );

    let ids: Vec<i64> = outcome.records().iter().map(|p| p.id).collect();
    let expected: Vec<i64> = wall.posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, expected);
    assert!(outcome.records().iter().all(|p| p.owner_id == -42));
    assert_eq!(fetcher.stats().batches_fetched, 3);
}

#[tokio::test]
async fn test_batched_owner_is_negative_for_positive_group_id() {
    let wall = FakeWall::new(200);
    let mut fetcher = PagedFetcher::new(fast_config());

    fetcher
        .fetch_batched(
            &wall,
            &WallPosts::community(7),
            FetchBudget::unlimited(),
            &NeverStop,
        )
        .await
        .unwrap();

    assert_eq!(wall.batch_calls(), vec![(OwnerId::community(-7), 100)]);
    assert_eq!(wall.batch_calls()[0].0.get(), -7);
}

#[tokio::test]
async fn test_batched_budget_may_overshoot_by_one_batch() {
    let wall = FakeWall::new(10_000);
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_batched(
            &wall,
            &WallPosts::community(1),
            FetchBudget::limited(150),
            &NeverStop,
        )
        .await
        .unwrap();

    assert_eq!(wall.batch_calls().len(), 1);
    assert_eq!(outcome.len(), 2600);
}

#[tokio::test]
async fn test_batched_stops_after_batch_crossing_cutoff() {
    // 10_000 hourly posts span ~416 days before 2020-09-13
    let wall = FakeWall::new(10_000);
    let cutoff = DateCutoff::new(Utc.with_ymd_and_hms(2020, 8, 1, 0, 0, 0).unwrap());
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_batched(
            &wall,
            &WallPosts::community(1),
            FetchBudget::unlimited(),
            &cutoff,
        )
        .await
        .unwrap();

    // The first batch already reaches posts from late May
    assert_eq!(wall.batch_calls().len(), 1);
    let last = outcome.records().last().unwrap();
    assert!(!cutoff.admits(last));
    assert!(outcome.records().iter().any(|p| cutoff.admits(p)));
}

#[tokio::test]
async fn test_batched_cutoff_in_first_page_skips_batches() {
    let wall = FakeWall::new(5000);
    let cutoff = DateCutoff::new(unix_to_datetime(NEWEST - 3600 * 10));
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_batched(
            &wall,
            &WallPosts::community(1),
            FetchBudget::unlimited(),
            &cutoff,
        )
        .await
        .unwrap();

    assert!(wall.batch_calls().is_empty());
    assert_eq!(outcome.len(), 100);
}

#[tokio::test]
async fn test_batched_malformed_batch_is_an_error() {
    let mut wall = FakeWall::new(500);
    wall.malformed = true;
    let mut fetcher = PagedFetcher::new(fast_config());

    let err = fetcher
        .fetch_batched(
            &wall,
            &WallPosts::community(1),
            FetchBudget::unlimited(),
            &NeverStop,
        )
        .await
        .unwrap_err();

    assert!(err.is_contract_violation());
}

#[tokio::test]
async fn test_batched_transport_failure_is_partial() {
    let mut wall = FakeWall::new(500);
    wall.fail_batches = true;
    let mut fetcher = PagedFetcher::new(fast_config());

    let outcome = fetcher
        .fetch_batched(
            &wall,
            &WallPosts::community(1),
            FetchBudget::unlimited(),
            &NeverStop,
        )
        .await
        .unwrap();

    assert_eq!(outcome.len(), 100);
    assert!(outcome.error().is_some());
}

// ============================================================================
// Request Delay
// ============================================================================

const DELAY: Duration = Duration::from_millis(333);

#[tokio::test(start_paused = true)]
async fn test_simple_paging_sleeps_between_round_trips() {
    let source = NumberSource::new(250);
    let mut fetcher = PagedFetcher::new(FetchConfig::new().with_request_delay(DELAY));
    let started = tokio::time::Instant::now();

    let outcome = fetcher
        .fetch_paged(&source, &Numbers, FetchBudget::unlimited(), &NeverStop)
        .await
        .unwrap();

    assert_eq!(outcome.len(), 250);
    let times = source.request_times();
    assert_eq!(times.len(), 3);
    assert_eq!(times[0], started);
    assert_eq!(times[1] - times[0], DELAY);
    assert_eq!(times[2] - times[1], DELAY);
    assert_eq!(started.elapsed(), DELAY * 2);
}

#[tokio::test(start_paused = true)]
async fn test_single_page_does_not_sleep() {
    let source = NumberSource::new(50);
    let mut fetcher = PagedFetcher::new(FetchConfig::new().with_request_delay(DELAY));
    let started = tokio::time::Instant::now();

    fetcher
        .fetch_paged(&source, &Numbers, FetchBudget::unlimited(), &NeverStop)
        .await
        .unwrap();

    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_batched_paging_sleeps_before_each_batch() {
    let wall = FakeWall::new(6000);
    let mut fetcher = PagedFetcher::new(FetchConfig::new().with_request_delay(DELAY));
    let started = tokio::time::Instant::now();

    fetcher
        .fetch_batched(
            &wall,
            &WallPosts::community(1),
            FetchBudget::unlimited(),
            &NeverStop,
        )
        .await
        .unwrap();

    assert_eq!(wall.batch_calls().len(), 3);
    assert_eq!(started.elapsed(), DELAY * 3);
}

// ============================================================================
// Harvester
// ============================================================================

struct Directory {
    chunks: Mutex<Vec<usize>>,
}

#[async_trait]
impl LookupSource for Directory {
    async fn groups_by_id(&self, ids: &[i64]) -> Result<Vec<Group>> {
        self.chunks.lock().unwrap().push(ids.len());
        Ok(ids
            .iter()
            .map(|&id| Group {
                id,
                name: format!("group {id}"),
                screen_name: String::new(),
                is_closed: 0,
            })
            .collect())
    }

    async fn users_by_id(&self, ids: &[i64]) -> Result<Vec<User>> {
        self.chunks.lock().unwrap().push(ids.len());
        if ids.contains(&0) {
            return Err(Error::api("users.get", 113, "Invalid user id"));
        }
        Ok(ids
            .iter()
            .map(|&id| User {
                id,
                first_name: "Ivan".into(),
                last_name: format!("#{id}"),
                domain: None,
            })
            .collect())
    }
}

#[tokio::test]
async fn test_harvester_lookups_are_chunked() {
    let directory = Directory {
        chunks: Mutex::new(Vec::new()),
    };
    let ids: Vec<i64> = (1..=1200).collect();
    let mut harvester = Harvester::new(&directory, fast_config());

    let groups = harvester.groups_by_id(&ids).await.unwrap();

    assert_eq!(groups.len(), 1200);
    assert_eq!(*directory.chunks.lock().unwrap(), vec![500, 500, 200]);
}

#[tokio::test]
async fn test_harvester_single_user() {
    let directory = Directory {
        chunks: Mutex::new(Vec::new()),
    };
    let mut harvester = Harvester::new(&directory, fast_config());

    let user = harvester.user(5).await.unwrap().unwrap();
    assert_eq!(user.full_name(), "Ivan #5");

    assert!(harvester.user(0).await.unwrap().is_none());
    assert_eq!(harvester.stats().errors, 1);
}

#[tokio::test]
async fn test_harvester_wall_posts_without_cutoff() {
    let wall = FakeWall::new(300);
    let mut harvester = Harvester::new(&wall, fast_config());

    let posts = harvester
        .wall_posts(3, FetchBudget::unlimited(), None)
        .await
        .unwrap();

    assert_eq!(posts.len(), 300);
    assert_eq!(wall.batch_calls(), vec![(OwnerId::community(3), 100)]);
}

#[test]
fn test_fetch_outcome_map_preserves_kind() {
    let partial = FetchOutcome::Partial {
        records: vec![1, 2],
        error: transport_error(),
    };
    let mapped = partial.map(|r| r.into_iter().map(|n| n * 10).collect::<Vec<_>>());
    assert_eq!(mapped.records(), &[10, 20]);
    assert!(mapped.error().is_some());

    let failed: FetchOutcome<i32> = FetchOutcome::Failed(transport_error());
    assert!(failed.map(|r| r).is_failed());
}

#[test]
fn test_fetch_config_defaults() {
    let config = FetchConfig::default();
    assert_eq!(config.request_delay, Duration::from_millis(333));
    assert_eq!(config.group_lookup_chunk, 500);
    assert_eq!(config.user_lookup_chunk, 1000);
}
