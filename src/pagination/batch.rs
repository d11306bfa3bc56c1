//! Batched multi-page responses
//!
//! One `execute` round trip walks up to [`BATCH_PAGES`] wall pages on the
//! server and returns them as parallel, index-aligned sequences: one outer
//! entry per page, one inner entry per post.

use crate::error::{Error, Result};
use crate::types::{unix_to_datetime, OwnerId, Post};

/// Pages walked by one batch round trip
pub const BATCH_PAGES: u64 = 25;

/// Result of one batch round trip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPage {
    pub ids: Vec<Vec<i64>>,
    pub likes: Vec<Vec<u64>>,
    pub comments: Vec<Vec<u64>>,
    /// Unix timestamps (seconds)
    pub dates: Vec<Vec<i64>>,
    /// Post texts, when the script collects them
    pub texts: Option<Vec<Vec<String>>>,
    /// Post authors, when the script collects them
    pub from_ids: Option<Vec<Vec<i64>>>,
    /// Offset the server reached after the batch
    pub offset_reached: u64,
}

impl BatchPage {
    /// Number of pages in this batch
    pub fn pages(&self) -> usize {
        self.ids.len()
    }

    /// Number of records across all pages
    pub fn record_count(&self) -> usize {
        self.ids.iter().map(Vec::len).sum()
    }

    /// Check that every field sequence has the same shape as `ids`.
    ///
    /// Flattening indexes all fields with the same (page, record) pair, so a
    /// single misaligned sequence would silently attach counters and dates to
    /// the wrong post.
    pub fn validate(&self) -> Result<()> {
        check_shape("likes", &self.ids, &self.likes)?;
        check_shape("comments", &self.ids, &self.comments)?;
        check_shape("dates", &self.ids, &self.dates)?;
        if let Some(texts) = &self.texts {
            check_shape("texts", &self.ids, texts)?;
        }
        if let Some(from_ids) = &self.from_ids {
            check_shape("from_ids", &self.ids, from_ids)?;
        }
        Ok(())
    }

    /// Flatten into posts, outer index first then inner index.
    pub fn into_posts(self, owner: OwnerId) -> Result<Vec<Post>> {
        self.validate()?;

        let mut posts = Vec::with_capacity(self.record_count());
        for (page, ids) in self.ids.iter().enumerate() {
            for (row, &id) in ids.iter().enumerate() {
                posts.push(Post {
                    id,
                    owner_id: owner.get(),
                    from_id: self.from_ids.as_ref().map(|f| f[page][row]),
                    text: self
                        .texts
                        .as_ref()
                        .map(|t| t[page][row].clone())
                        .unwrap_or_default(),
                    likes: self.likes[page][row],
                    comments: self.comments[page][row],
                    date: unix_to_datetime(self.dates[page][row]),
                });
            }
        }
        Ok(posts)
    }
}

fn check_shape<T>(field: &str, ids: &[Vec<i64>], other: &[Vec<T>]) -> Result<()> {
    if ids.len() != other.len() {
        return Err(Error::malformed_batch(format!(
            "'{field}' has {} pages, 'ids' has {}",
            other.len(),
            ids.len()
        )));
    }
    for (page, (a, b)) in ids.iter().zip(other).enumerate() {
        if a.len() != b.len() {
            return Err(Error::malformed_batch(format!(
                "page {page}: '{field}' has {} records, 'ids' has {}",
                b.len(),
                a.len()
            )));
        }
    }
    Ok(())
}
