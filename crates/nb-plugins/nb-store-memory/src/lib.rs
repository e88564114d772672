//! # nb-store-memory
//!
//! In-memory implementation of `BoardStore`, used by the test suites, the
//! seed tool, and the demo server when no database is configured. Posts and
//! comments share one item table, distinguished by the root path and the
//! presence of a title, mirroring the flat wire shape of the fetch port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use nb_core::{
    BoardError, BoardStore, DepthFirstComment, PostDetail, PostRecord, Result, Session,
    ThreadPath, VoteDirection, VoteMap, VoteTransition,
};

#[derive(Debug, Clone)]
struct ItemRow {
    id: Uuid,
    author_name: String,
    /// Set for posts, absent for comments.
    title: Option<String>,
    content: String,
    score: i64,
    created_at: DateTime<Utc>,
    path: ThreadPath,
}

#[derive(Default)]
pub struct MemoryBoardStore {
    items: DashMap<Uuid, ItemRow>,
    /// (item id, user id) → direction.
    votes: DashMap<(Uuid, Uuid), VoteDirection>,
    /// Serializes the read-modify-write of a cast so the vote row and the
    /// score adjustment are observed as one transition.
    vote_section: Mutex<()>,
}

impl MemoryBoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `path` lies inside the subtree rooted at the item whose
    /// child paths start with `prefix`.
    fn under(path: &ThreadPath, prefix: &ThreadPath) -> bool {
        path == prefix || path.as_str().starts_with(&format!("{prefix}."))
    }
}

#[async_trait]
impl BoardStore for MemoryBoardStore {
    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<PostRecord>> {
        let mut posts: Vec<PostRecord> = self
            .items
            .iter()
            .filter(|row| row.path.is_root())
            .map(|row| PostRecord {
                id: row.id,
                author_name: row.author_name.clone(),
                title: row.title.clone().unwrap_or_default(),
                content: row.content.clone(),
                score: row.score,
                created_at: row.created_at,
                path: row.path.clone(),
            })
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn create_post(&self, session: &Session, title: &str, content: &str) -> Result<Uuid> {
        let id = Uuid::now_v7();
        self.items.insert(
            id,
            ItemRow {
                id,
                author_name: session.display_name.clone(),
                title: Some(title.to_string()),
                content: content.to_string(),
                score: 0,
                created_at: Utc::now(),
                path: ThreadPath::root(),
            },
        );
        debug!(post_id = %id, "post created");
        Ok(id)
    }

    async fn fetch_post_with_comments(&self, post_id: Uuid) -> Result<PostDetail> {
        let post = self
            .items
            .get(&post_id)
            .filter(|row| row.path.is_root())
            .map(|row| PostRecord {
                id: row.id,
                author_name: row.author_name.clone(),
                title: row.title.clone().unwrap_or_default(),
                content: row.content.clone(),
                score: row.score,
                created_at: row.created_at,
                path: row.path.clone(),
            })
            .ok_or(BoardError::NotFound("post", post_id))?;

        let subtree = ThreadPath::root().child(post_id);
        let comments = self
            .items
            .iter()
            .filter(|row| Self::under(&row.path, &subtree))
            .map(|row| DepthFirstComment {
                id: row.id,
                author_name: row.author_name.clone(),
                content: row.content.clone(),
                score: row.score,
                created_at: row.created_at,
                path: row.path.clone(),
            })
            .collect();

        Ok(PostDetail { post, comments })
    }

    async fn fetch_user_votes(&self, user_id: Uuid) -> Result<VoteMap> {
        Ok(self
            .votes
            .iter()
            .filter(|entry| entry.key().1 == user_id)
            .map(|entry| (entry.key().0, *entry.value()))
            .collect())
    }

    async fn create_comment(
        &self,
        session: &Session,
        content: &str,
        path: &ThreadPath,
    ) -> Result<Uuid> {
        let id = Uuid::now_v7();
        self.items.insert(
            id,
            ItemRow {
                id,
                author_name: session.display_name.clone(),
                title: None,
                content: content.to_string(),
                score: 0,
                created_at: Utc::now(),
                path: path.clone(),
            },
        );
        debug!(comment_id = %id, %path, "comment created");
        Ok(id)
    }

    async fn cast_vote(&self, item_id: Uuid, user_id: Uuid, direction: VoteDirection) -> Result<()> {
        let _guard = self.vote_section.lock().await;

        let existing = self.votes.get(&(item_id, user_id)).map(|d| *d);
        let transition = VoteTransition::apply(existing, direction);
        if transition.is_noop() {
            return Ok(());
        }

        let mut item = self
            .items
            .get_mut(&item_id)
            .ok_or(BoardError::NotFound("item", item_id))?;
        item.score += transition.score_delta;
        self.votes.insert((item_id, user_id), direction);
        Ok(())
    }
}
