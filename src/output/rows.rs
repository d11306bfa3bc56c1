//! Exported row types
//!
//! One struct per sheet. Field order is column order.

use super::writer::Sheet;
use crate::types::{Comment, Group, Post, User};
use serde::Serialize;

/// A row type that can be written as a sheet
pub trait SheetRow: Serialize {
    /// Sheet this row belongs to
    const SHEET: Sheet;
    /// Column headers, in field order
    const HEADERS: &'static [&'static str];
}

/// Link to a community post
pub fn post_url(group: &Group, post_id: i64) -> String {
    format!(
        "https://vk.com/{}?w=wall-{}_{post_id}",
        group.screen_name_or_default(),
        group.id
    )
}

/// Link to the likers list of a community post
pub fn likes_url(group: &Group, post_id: i64) -> String {
    format!(
        "https://vk.com/{}?w=likes%2Fwall-{}_{post_id}",
        group.screen_name_or_default(),
        group.id
    )
}

/// Link to a comment under a community post
pub fn comment_url(group: &Group, post_id: i64, comment_id: i64) -> String {
    format!("{}_r{comment_id}", post_url(group, post_id))
}

/// A target user liked a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutLike {
    pub user_id: i64,
    pub group_id: i64,
    pub post_id: i64,
    pub post_text: String,
    pub url: String,
}

impl OutLike {
    pub fn new(user_id: i64, group: &Group, post: &Post) -> Self {
        Self {
            user_id,
            group_id: group.id,
            post_id: post.id,
            post_text: post.text.clone(),
            url: likes_url(group, post.id),
        }
    }
}

impl SheetRow for OutLike {
    const SHEET: Sheet = Sheet::Likes;
    const HEADERS: &'static [&'static str] = &["user_id", "group_id", "post_id", "post_text", "url"];
}

/// A comment by a target user, or a keyword hit in a post or comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutComment {
    pub user_id: i64,
    pub group_id: i64,
    pub post_id: i64,
    pub post_text: String,
    /// Empty for hits in the post itself
    pub comment_id: Option<i64>,
    pub comment_text: String,
    pub url_post: String,
    pub url_comment: String,
}

impl OutComment {
    /// Row for `comment` under `post`, attributed to `user_id`
    pub fn new(user_id: i64, group: &Group, post: &Post, comment: &Comment) -> Self {
        Self {
            user_id,
            group_id: group.id,
            post_id: post.id,
            post_text: post.text.clone(),
            comment_id: Some(comment.id),
            comment_text: comment.text.clone(),
            url_post: post_url(group, post.id),
            url_comment: comment_url(group, post.id, comment.id),
        }
    }

    /// Row for a hit in the post text, attributed to the post author
    pub fn post_hit(group: &Group, post: &Post) -> Self {
        Self {
            user_id: post.from_id.unwrap_or(post.owner_id),
            group_id: group.id,
            post_id: post.id,
            post_text: post.text.clone(),
            comment_id: None,
            comment_text: String::new(),
            url_post: post_url(group, post.id),
            url_comment: String::new(),
        }
    }

    /// Row for a hit in a comment, attributed to the comment author
    pub fn comment_hit(group: &Group, post: &Post, comment: &Comment) -> Self {
        Self::new(comment.from_id, group, post, comment)
    }
}

impl SheetRow for OutComment {
    const SHEET: Sheet = Sheet::Comments;
    const HEADERS: &'static [&'static str] = &[
        "user_id",
        "group_id",
        "post_id",
        "post_text",
        "comment_id",
        "comment_text",
        "url_post",
        "url_comment",
    ];
}

/// Keyword hits share the comment layout but go to their own sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutKeyword(pub OutComment);

impl SheetRow for OutKeyword {
    const SHEET: Sheet = Sheet::Keywords;
    const HEADERS: &'static [&'static str] = OutComment::HEADERS;
}

/// An entry of a friend list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutFriend {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for OutFriend {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

impl SheetRow for OutFriend {
    const SHEET: Sheet = Sheet::Friends;
    const HEADERS: &'static [&'static str] = &["id", "first_name", "last_name"];
}

/// A community found by search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutGroup {
    pub id: i64,
    pub name: String,
    pub screen_name: String,
}

impl From<&Group> for OutGroup {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            screen_name: group.screen_name_or_default(),
        }
    }
}

impl SheetRow for OutGroup {
    const SHEET: Sheet = Sheet::Groups;
    const HEADERS: &'static [&'static str] = &["id", "name", "screen_name"];
}
