//! Batched wall walks through `execute`
//!
//! The script runs `wall.get` 25 times on the server, 100 posts per call,
//! and returns every field as a list of per-page lists. The owner and the
//! starting offset travel as script arguments so the code itself is the
//! same on every call.

use crate::error::{Error, Result};
use crate::pagination::{BatchPage, BATCH_PAGES, DEFAULT_STEP};
use serde::Deserialize;

/// Which optional post fields the batch script collects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallScript {
    /// Collect `posts@.text`
    pub texts: bool,
    /// Collect `posts@.from_id`
    pub authors: bool,
}

impl Default for WallScript {
    fn default() -> Self {
        Self {
            texts: true,
            authors: true,
        }
    }
}

impl WallScript {
    /// Only ids, counters and dates
    pub fn counters_only() -> Self {
        Self {
            texts: false,
            authors: false,
        }
    }

    /// Render the VKScript source
    pub fn code(&self) -> String {
        let mut fields = vec![
            ("ids", "id"),
            ("likes", "likes"),
            ("comments", "comments"),
            ("date", "date"),
        ];
        if self.texts {
            fields.push(("text", "text"));
        }
        if self.authors {
            fields.push(("from_id", "from_id"));
        }

        let init = fields
            .iter()
            .map(|(key, _)| format!("\"{key}\": []"))
            .collect::<Vec<_>>()
            .join(", ");
        let pushes = fields
            .iter()
            .map(|(key, field)| format!("result.{key}.push(posts@.{field});"))
            .collect::<Vec<_>>()
            .join("\n    ");

        format!(
            "var ownerId = parseInt(Args.ownerId);\n\
             var offset = parseInt(Args.offset);\n\
             var result = {{{init}}};\n\
             var page = 0;\n\
             while (page < {BATCH_PAGES}) {{\n    \
             var posts = API.wall.get({{\"owner_id\": ownerId, \"offset\": offset, \"count\": {DEFAULT_STEP}}}).items;\n    \
             {pushes}\n    \
             offset = offset + {DEFAULT_STEP};\n    \
             page = page + 1;\n\
             }};\n\
             return {{\"posts\": result, \"offset\": offset}};"
        )
    }
}

/// Counter as returned by `posts@.likes`: an object, a number or null
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct Counter(#[serde(deserialize_with = "crate::types::deserialize_counter")] u64);

/// A per-page list; VK renders an empty `posts@.field` as null
type Pages<T> = Vec<Option<Vec<T>>>;

#[derive(Debug, Deserialize)]
struct RawPosts {
    ids: Option<Pages<i64>>,
    likes: Option<Pages<Counter>>,
    comments: Option<Pages<Counter>>,
    date: Option<Pages<i64>>,
    text: Option<Pages<Option<String>>>,
    from_id: Option<Pages<i64>>,
}

/// Response of one batch script run
#[derive(Debug, Deserialize)]
pub struct RawBatch {
    posts: Option<RawPosts>,
    #[serde(default)]
    offset: u64,
}

impl RawBatch {
    /// Parse the `response` value of an `execute` call
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::malformed_batch(e.to_string()))
    }

    /// Convert into aligned per-page sequences.
    ///
    /// Required fields must be present; optional ones are kept only when the
    /// script was asked for them.
    pub fn into_batch_page(self, script: WallScript) -> Result<BatchPage> {
        let posts = self
            .posts
            .ok_or_else(|| Error::malformed_batch("missing 'posts'"))?;

        let page = BatchPage {
            ids: required("ids", posts.ids)?,
            likes: counters(required("likes", posts.likes)?),
            comments: counters(required("comments", posts.comments)?),
            dates: required("date", posts.date)?,
            texts: if script.texts {
                let texts = required("text", posts.text)?;
                Some(
                    texts
                        .into_iter()
                        .map(|p| p.into_iter().map(Option::unwrap_or_default).collect())
                        .collect(),
                )
            } else {
                None
            },
            from_ids: if script.authors {
                Some(required("from_id", posts.from_id)?)
            } else {
                None
            },
            offset_reached: self.offset,
        };

        page.validate()?;
        Ok(page)
    }
}

fn required<T>(field: &str, pages: Option<Pages<T>>) -> Result<Vec<Vec<T>>> {
    let pages = pages.ok_or_else(|| Error::malformed_batch(format!("missing '{field}'")))?;
    Ok(pages.into_iter().map(Option::unwrap_or_default).collect())
}

fn counters(pages: Vec<Vec<Counter>>) -> Vec<Vec<u64>> {
    pages
        .into_iter()
        .map(|p| p.into_iter().map(|c| c.0).collect())
        .collect()
}
