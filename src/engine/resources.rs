//! Per-resource adapters
//!
//! Each request type knows its API method, its parameters and the owner id
//! convention. Community owners are always sent negative.

use super::source::{BatchedResource, PagedResource};
use crate::error::Result;
use crate::pagination::BatchPage;
use crate::types::{Comment, Group, OwnerId, Post, User};

/// `groups.search` sort order: by relation to the query
const SORT_BY_RELATION: &str = "6";

/// Communities matching a search query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSearch {
    pub query: String,
}

impl GroupSearch {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

impl PagedResource for GroupSearch {
    type Record = Group;

    fn method(&self) -> &'static str {
        "groups.search"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.query.clone()),
            ("sort", SORT_BY_RELATION.to_string()),
        ]
    }

    fn describe(&self) -> String {
        format!("groups.search q={:?}", self.query)
    }
}

/// Posts on a community wall, newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallPosts {
    owner: OwnerId,
}

impl WallPosts {
    /// Wall of community `group_id` (either sign accepted)
    pub fn community(group_id: i64) -> Self {
        Self {
            owner: OwnerId::community(group_id),
        }
    }
}

impl PagedResource for WallPosts {
    type Record = Post;

    fn method(&self) -> &'static str {
        "wall.get"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![("owner_id", self.owner.to_string())]
    }

    fn describe(&self) -> String {
        format!("wall.get owner_id={}", self.owner)
    }
}

impl BatchedResource for WallPosts {
    fn owner(&self) -> OwnerId {
        self.owner
    }

    fn flatten(&self, batch: BatchPage) -> Result<Vec<Post>> {
        batch.into_posts(self.owner)
    }
}

/// Users who liked a community post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Likes {
    owner: OwnerId,
    item_id: i64,
}

impl Likes {
    pub fn post(group_id: i64, post_id: i64) -> Self {
        Self {
            owner: OwnerId::community(group_id),
            item_id: post_id,
        }
    }
}

impl PagedResource for Likes {
    type Record = User;

    fn method(&self) -> &'static str {
        "likes.getList"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("type", "post".to_string()),
            ("owner_id", self.owner.to_string()),
            ("item_id", self.item_id.to_string()),
            ("extended", "1".to_string()),
        ]
    }

    fn describe(&self) -> String {
        format!("likes.getList {}_{}", self.owner, self.item_id)
    }
}

/// Comments under a community post, or replies in one comment thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comments {
    owner: OwnerId,
    post_id: i64,
    comment_id: Option<i64>,
}

impl Comments {
    /// Top-level comments of a post
    pub fn post(group_id: i64, post_id: i64) -> Self {
        Self {
            owner: OwnerId::community(group_id),
            post_id,
            comment_id: None,
        }
    }

    /// Replies in the thread under `comment_id`
    pub fn thread(group_id: i64, post_id: i64, comment_id: i64) -> Self {
        Self {
            comment_id: Some(comment_id),
            ..Self::post(group_id, post_id)
        }
    }
}

impl PagedResource for Comments {
    type Record = Comment;

    fn method(&self) -> &'static str {
        "wall.getComments"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("owner_id", self.owner.to_string()),
            ("post_id", self.post_id.to_string()),
        ];
        if let Some(comment_id) = self.comment_id {
            params.push(("comment_id", comment_id.to_string()));
        }
        params
    }

    fn describe(&self) -> String {
        match self.comment_id {
            Some(cid) => format!("wall.getComments {}_{} r{cid}", self.owner, self.post_id),
            None => format!("wall.getComments {}_{}", self.owner, self.post_id),
        }
    }
}

/// Communities a user is a member of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserGroups {
    pub user_id: i64,
}

impl PagedResource for UserGroups {
    type Record = Group;

    fn method(&self) -> &'static str {
        "groups.get"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("user_id", self.user_id.to_string()),
            ("extended", "1".to_string()),
        ]
    }

    fn describe(&self) -> String {
        format!("groups.get user_id={}", self.user_id)
    }
}

/// A user's friend list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Friends {
    pub user_id: i64,
}

impl PagedResource for Friends {
    type Record = User;

    fn method(&self) -> &'static str {
        "friends.get"
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("user_id", self.user_id.to_string()),
            ("fields", "domain".to_string()),
        ]
    }

    fn describe(&self) -> String {
        format!("friends.get user_id={}", self.user_id)
    }
}
