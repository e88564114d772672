//! # Domain Models
//!
//! These structs represent the core entities of Nestboard.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::path::ThreadPath;

/// A top-level message, root of a thread.
///
/// This is the flat wire form; [`Post`] carries the comment tree, which is
/// derived by the thread builder and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub author_name: String,
    pub title: String,
    pub content: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    /// Always the single-segment root form.
    pub path: ThreadPath,
}

/// The flat wire form of a reply: the same fields as [`Comment`] minus the
/// nested children, as delivered by `fetch_post_with_comments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthFirstComment {
    pub id: Uuid,
    pub author_name: String,
    pub content: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub path: ThreadPath,
}

/// A reply with its fully populated descendant tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_name: String,
    pub content: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub path: ThreadPath,
    /// Ordered by construction: siblings ascend by `created_at`.
    pub comments: Vec<Comment>,
}

impl DepthFirstComment {
    /// Projects the flat form into a tree node with an empty child list.
    pub fn into_node(self) -> Comment {
        Comment {
            id: self.id,
            author_name: self.author_name,
            content: self.content,
            score: self.score,
            created_at: self.created_at,
            path: self.path,
            comments: Vec::new(),
        }
    }
}

/// A post carrying its reconstructed comment tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_name: String,
    pub title: String,
    pub content: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub path: ThreadPath,
    pub comments: Vec<Comment>,
}

impl PostRecord {
    pub fn into_post(self, comments: Vec<Comment>) -> Post {
        Post {
            id: self.id,
            author_name: self.author_name,
            title: self.title,
            content: self.content,
            score: self.score,
            created_at: self.created_at,
            path: self.path,
            comments,
        }
    }
}

/// Raw result of a thread fetch: the post plus every comment transitively
/// under it, unordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub post: PostRecord,
    pub comments: Vec<DepthFirstComment>,
}

/// An up or down vote. At most one per (user, item); casting the opposite
/// direction replaces the old vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Contribution of a single vote to an item's score.
    pub fn weight(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            VoteDirection::Up => VoteDirection::Down,
            VoteDirection::Down => VoteDirection::Up,
        }
    }
}

/// The caller's own votes, keyed by item id. Votes are never surfaced as
/// entities beyond this map and the aggregate score.
pub type VoteMap = HashMap<Uuid, VoteDirection>;

/// An authenticated caller, passed explicitly into every operation that
/// needs a user. There is no ambient user context in the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub display_name: String,
}

impl Session {
    pub fn new(user_id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }
}
