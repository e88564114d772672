//! # Core Traits (Ports)
//!
//! Any storage plugin must implement this trait to be used by the binary.
//! The port is deliberately narrow: a flat fetch, the caller's vote map,
//! and three mutations. Authentication happens before any of these calls;
//! the `Session` values arriving here are already trusted.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{PostDetail, PostRecord, Session, VoteDirection, VoteMap};
use crate::path::ThreadPath;

/// Data persistence contract for posts, comments, and votes.
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Posts for the board listing, newest first.
    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<PostRecord>>;

    /// Creates a top-level post at the root path; returns its id.
    async fn create_post(&self, session: &Session, title: &str, content: &str) -> Result<Uuid>;

    /// The post itself plus every comment transitively reachable under it,
    /// each carrying its materialized path. Unordered.
    async fn fetch_post_with_comments(&self, post_id: Uuid) -> Result<PostDetail>;

    /// Every active vote of one user, keyed by item id.
    async fn fetch_user_votes(&self, user_id: Uuid) -> Result<VoteMap>;

    /// Persists a reply at `path`, which the caller has already derived via
    /// the path codec; the store writes it verbatim. Returns the new id.
    async fn create_comment(
        &self,
        session: &Session,
        content: &str,
        path: &ThreadPath,
    ) -> Result<Uuid>;

    /// Replace-or-create-or-no-op per [`crate::vote::VoteTransition`]. The
    /// vote row and the score adjustment land atomically: this is the one
    /// true concurrent-write contention point in the system.
    async fn cast_vote(&self, item_id: Uuid, user_id: Uuid, direction: VoteDirection)
        -> Result<()>;
}
