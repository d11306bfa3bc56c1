//! Common types used throughout vk-harvest
//!
//! This module contains shared type definitions, the typed records returned
//! by the fetch operations, and small helpers used across multiple modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

// ============================================================================
// Owner IDs
// ============================================================================

/// Owner of a wall, post or comment as VK expects it on the wire.
///
/// Communities are always negative, users always positive. Every call site
/// that addresses a community wall goes through [`OwnerId::community`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(i64);

impl OwnerId {
    /// Owner id for a community, regardless of the sign the caller used
    pub fn community(id: i64) -> Self {
        Self(id.checked_abs().map_or(id, |abs| -abs))
    }

    /// Owner id for a user
    pub fn user(id: i64) -> Self {
        Self(id.checked_abs().unwrap_or(i64::MAX))
    }

    /// The raw signed value sent to the API
    pub fn get(self) -> i64 {
        self.0
    }

    /// Whether this owner is a community
    pub fn is_community(self) -> bool {
        self.0 < 0
    }

    /// The unsigned entity id (group id or user id)
    pub fn entity_id(self) -> i64 {
        self.0.checked_abs().unwrap_or(i64::MAX)
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Records
// ============================================================================

/// A wall post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(default)]
    pub owner_id: i64,
    #[serde(default)]
    pub from_id: Option<i64>,
    #[serde(default)]
    pub text: String,
    /// Number of likes
    #[serde(default, deserialize_with = "deserialize_counter")]
    pub likes: u64,
    /// Number of top-level comments
    #[serde(default, deserialize_with = "deserialize_counter")]
    pub comments: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
}

/// A comment under a wall post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub from_id: i64,
    #[serde(default)]
    pub post_id: Option<i64>,
    #[serde(default)]
    pub text: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    /// Number of replies in this comment's thread
    #[serde(default, rename = "thread", deserialize_with = "deserialize_counter")]
    pub thread_count: u64,
}

/// A user profile (likers, friends, lookups)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub domain: Option<String>,
}

impl User {
    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A community
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub screen_name: String,
    /// 0 = open, 1 = closed, 2 = private
    #[serde(default)]
    pub is_closed: u8,
}

impl Group {
    /// Whether the group wall is readable without membership
    pub fn is_public(&self) -> bool {
        self.is_closed == 0
    }

    /// Screen name, falling back to `club{id}` when VK returns none
    pub fn screen_name_or_default(&self) -> String {
        if self.screen_name.is_empty() {
            format!("club{}", self.id)
        } else {
            self.screen_name.clone()
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Convert a unix timestamp (seconds) to a UTC datetime.
///
/// Out-of-range timestamps map to the epoch.
pub fn unix_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// VK reports counters either as a bare number or as an object with a
/// `count` field (`likes`, `comments`, `thread`).
#[derive(Deserialize)]
#[serde(untagged)]
enum CounterRepr {
    Plain(u64),
    Object { count: u64 },
}

pub(crate) fn deserialize_counter<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<CounterRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(CounterRepr::Plain(count) | CounterRepr::Object { count }) => count,
        None => 0,
    })
}
