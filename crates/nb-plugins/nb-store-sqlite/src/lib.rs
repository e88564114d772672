//! # nb-store-sqlite
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `nb-core` domain models. Posts and comments share one
//! `items` table (a post is the row whose path is the root form), so a
//! thread fetch is a single path-prefix scan, no recursive queries.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use nb_core::{
    BoardError, BoardStore, DepthFirstComment, PostDetail, PostRecord, Result, Session,
    ThreadPath, VoteDirection, VoteMap, VoteTransition,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS items (
    id          TEXT PRIMARY KEY,
    author_name TEXT NOT NULL,
    title       TEXT,
    content     TEXT NOT NULL,
    score       INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    path        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_items_path ON items(path);
CREATE TABLE IF NOT EXISTS item_votes (
    item_id   TEXT NOT NULL,
    user_id   TEXT NOT NULL,
    direction TEXT NOT NULL,
    PRIMARY KEY (item_id, user_id)
);
";

pub struct SqliteBoardStore {
    pool: SqlitePool,
}

impl SqliteBoardStore {
    /// Opens (and creates, if missing) the database at `url` and ensures
    /// the schema exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(anyhow::Error::from)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(anyhow::Error::from)?;
        Self::with_pool(pool).await
    }

    /// A private in-memory database. Capped at a single connection: every
    /// pooled connection would otherwise get its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(anyhow::Error::from)?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(anyhow::Error::from)?;
        Ok(Self { pool })
    }
}

// Helpers for column conversion; UUIDs are stored as hyphenated TEXT.
fn uuid_to_text(id: Uuid) -> String {
    id.to_string()
}

fn text_to_uuid(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or_default()
}

fn direction_to_text(direction: VoteDirection) -> &'static str {
    match direction {
        VoteDirection::Up => "up",
        VoteDirection::Down => "down",
    }
}

fn direction_from_text(raw: &str) -> Result<VoteDirection> {
    match raw {
        "up" => Ok(VoteDirection::Up),
        "down" => Ok(VoteDirection::Down),
        other => Err(BoardError::Store(anyhow!(
            "unknown vote direction `{other}` in item_votes"
        ))),
    }
}

fn post_from_row(row: &SqliteRow) -> Result<PostRecord> {
    Ok(PostRecord {
        id: text_to_uuid(&row.get::<String, _>("id")),
        author_name: row.get("author_name"),
        title: row.get::<Option<String>, _>("title").unwrap_or_default(),
        content: row.get("content"),
        score: row.get("score"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        path: ThreadPath::parse(&row.get::<String, _>("path"))?,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<DepthFirstComment> {
    Ok(DepthFirstComment {
        id: text_to_uuid(&row.get::<String, _>("id")),
        author_name: row.get("author_name"),
        content: row.get("content"),
        score: row.get("score"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        path: ThreadPath::parse(&row.get::<String, _>("path"))?,
    })
}

#[async_trait]
impl BoardStore for SqliteBoardStore {
    async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<PostRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM items WHERE path = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(ThreadPath::root().as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(anyhow::Error::from)?;

        rows.iter().map(post_from_row).collect()
    }

    async fn create_post(&self, session: &Session, title: &str, content: &str) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO items (id, author_name, title, content, score, created_at, path)
             VALUES (?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(uuid_to_text(id))
        .bind(&session.display_name)
        .bind(title)
        .bind(content)
        .bind(Utc::now())
        .bind(ThreadPath::root().as_str())
        .execute(&self.pool)
        .await
        .map_err(anyhow::Error::from)?;
        debug!(post_id = %id, "post created");
        Ok(id)
    }

    /// Retrieves the post and every comment transitively under it in one
    /// logical operation: the post row by id, the descendants by path
    /// prefix.
    async fn fetch_post_with_comments(&self, post_id: Uuid) -> Result<PostDetail> {
        let row = sqlx::query("SELECT * FROM items WHERE id = ? AND path = ?")
            .bind(uuid_to_text(post_id))
            .bind(ThreadPath::root().as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(anyhow::Error::from)?;
        let post = match row {
            Some(row) => post_from_row(&row)?,
            None => return Err(BoardError::NotFound("post", post_id)),
        };

        let subtree = ThreadPath::root().child(post_id);
        let rows = sqlx::query("SELECT * FROM items WHERE path = ? OR path LIKE ? || '.%'")
            .bind(subtree.as_str())
            .bind(subtree.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(anyhow::Error::from)?;
        let comments = rows
            .iter()
            .map(comment_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(PostDetail { post, comments })
    }

    async fn fetch_user_votes(&self, user_id: Uuid) -> Result<VoteMap> {
        let rows = sqlx::query("SELECT item_id, direction FROM item_votes WHERE user_id = ?")
            .bind(uuid_to_text(user_id))
            .fetch_all(&self.pool)
            .await
            .map_err(anyhow::Error::from)?;

        let mut votes = VoteMap::with_capacity(rows.len());
        for row in &rows {
            votes.insert(
                text_to_uuid(&row.get::<String, _>("item_id")),
                direction_from_text(&row.get::<String, _>("direction"))?,
            );
        }
        Ok(votes)
    }

    async fn create_comment(
        &self,
        session: &Session,
        content: &str,
        path: &ThreadPath,
    ) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO items (id, author_name, title, content, score, created_at, path)
             VALUES (?, ?, NULL, ?, 0, ?, ?)",
        )
        .bind(uuid_to_text(id))
        .bind(&session.display_name)
        .bind(content)
        .bind(Utc::now())
        .bind(path.as_str())
        .execute(&self.pool)
        .await
        .map_err(anyhow::Error::from)?;
        debug!(comment_id = %id, %path, "comment created");
        Ok(id)
    }

    /// The vote row and the score adjustment land in one transaction, so a
    /// reader never observes one without the other. Casting the direction
    /// already on record commits nothing.
    async fn cast_vote(&self, item_id: Uuid, user_id: Uuid, direction: VoteDirection) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(anyhow::Error::from)?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT direction FROM item_votes WHERE item_id = ? AND user_id = ?")
                .bind(uuid_to_text(item_id))
                .bind(uuid_to_text(user_id))
                .fetch_optional(&mut *tx)
                .await
                .map_err(anyhow::Error::from)?;
        let existing = existing.as_deref().map(direction_from_text).transpose()?;

        let transition = VoteTransition::apply(existing, direction);
        if transition.is_noop() {
            return Ok(());
        }

        let updated = sqlx::query("UPDATE items SET score = score + ? WHERE id = ?")
            .bind(transition.score_delta)
            .bind(uuid_to_text(item_id))
            .execute(&mut *tx)
            .await
            .map_err(anyhow::Error::from)?;
        if updated.rows_affected() == 0 {
            return Err(BoardError::NotFound("item", item_id));
        }

        sqlx::query(
            "INSERT INTO item_votes (item_id, user_id, direction) VALUES (?, ?, ?)
             ON CONFLICT (item_id, user_id) DO UPDATE SET direction = excluded.direction",
        )
        .bind(uuid_to_text(item_id))
        .bind(uuid_to_text(user_id))
        .bind(direction_to_text(direction))
        .execute(&mut *tx)
        .await
        .map_err(anyhow::Error::from)?;

        tx.commit().await.map_err(anyhow::Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nb_core::build_detail;

    fn user(n: u128) -> Session {
        Session::new(Uuid::from_u128(n), format!("user-{n}"))
    }

    #[tokio::test]
    async fn test_create_and_fetch_thread() {
        let store = SqliteBoardStore::in_memory().await.unwrap();
        let author = user(1);

        let post_id = store
            .create_post(&author, "test post", "test contents")
            .await
            .unwrap();
        let depth1 = ThreadPath::root().child(post_id);
        let reply = store
            .create_comment(&user(2), "test comment", &depth1)
            .await
            .unwrap();
        store
            .create_comment(&author, "nested", &depth1.child(reply))
            .await
            .unwrap();

        let detail = store.fetch_post_with_comments(post_id).await.unwrap();
        assert_eq!(detail.post.title, "test post");
        assert_eq!(detail.comments.len(), 2);

        // The fetched flat rows must reconstruct cleanly.
        let tree = build_detail(detail).unwrap();
        assert_eq!(tree.comments.len(), 1);
        assert_eq!(tree.comments[0].comments.len(), 1);
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let store = SqliteBoardStore::in_memory().await.unwrap();
        assert!(matches!(
            store.fetch_post_with_comments(Uuid::now_v7()).await,
            Err(BoardError::NotFound("post", _))
        ));
    }

    #[tokio::test]
    async fn vote_transaction_keeps_score_and_rows_consistent() {
        let store = SqliteBoardStore::in_memory().await.unwrap();
        let post_id = store
            .create_post(&user(1), "scores", "contents")
            .await
            .unwrap();

        store
            .cast_vote(post_id, user(2).user_id, VoteDirection::Up)
            .await
            .unwrap();
        store
            .cast_vote(post_id, user(3).user_id, VoteDirection::Up)
            .await
            .unwrap();
        let detail = store.fetch_post_with_comments(post_id).await.unwrap();
        assert_eq!(detail.post.score, 2);

        // Crossing sides moves the aggregate by two in one step.
        store
            .cast_vote(post_id, user(3).user_id, VoteDirection::Down)
            .await
            .unwrap();
        let detail = store.fetch_post_with_comments(post_id).await.unwrap();
        assert_eq!(detail.post.score, 0);

        let votes = store.fetch_user_votes(user(3).user_id).await.unwrap();
        assert_eq!(votes.get(&post_id), Some(&VoteDirection::Down));
    }

    #[tokio::test]
    async fn recasting_is_idempotent() {
        let store = SqliteBoardStore::in_memory().await.unwrap();
        let post_id = store
            .create_post(&user(1), "idempotent", "contents")
            .await
            .unwrap();

        for _ in 0..3 {
            store
                .cast_vote(post_id, user(2).user_id, VoteDirection::Down)
                .await
                .unwrap();
        }
        let detail = store.fetch_post_with_comments(post_id).await.unwrap();
        assert_eq!(detail.post.score, -1);
    }

    #[tokio::test]
    async fn voting_on_a_missing_item_writes_nothing() {
        let store = SqliteBoardStore::in_memory().await.unwrap();
        let ghost = Uuid::now_v7();

        let err = store
            .cast_vote(ghost, user(2).user_id, VoteDirection::Up)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::NotFound("item", _)));

        let votes = store.fetch_user_votes(user(2).user_id).await.unwrap();
        assert!(votes.is_empty());
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_paginated() {
        let store = SqliteBoardStore::in_memory().await.unwrap();
        for i in 0..4 {
            store
                .create_post(&user(1), &format!("post {i}"), "contents")
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let page = store.list_posts(2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "post 2");
        assert_eq!(page[1].title, "post 1");
    }

    #[tokio::test]
    async fn comments_of_other_posts_stay_out_of_a_thread() {
        let store = SqliteBoardStore::in_memory().await.unwrap();
        let first = store
            .create_post(&user(1), "first", "contents")
            .await
            .unwrap();
        let second = store
            .create_post(&user(2), "second", "contents")
            .await
            .unwrap();
        store
            .create_comment(&user(2), "on first", &ThreadPath::root().child(first))
            .await
            .unwrap();
        store
            .create_comment(&user(1), "on second", &ThreadPath::root().child(second))
            .await
            .unwrap();

        let detail = store.fetch_post_with_comments(first).await.unwrap();
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].content, "on first");
    }
}
