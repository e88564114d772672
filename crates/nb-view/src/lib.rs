//! # nb-view
//!
//! The thread view coordinator. Owns no algorithmic complexity itself; it
//! sequences fetch → build → render → re-fetch-on-mutation over the store
//! port. Every successful mutation is followed by a full authoritative
//! re-read; there is no incremental patch path, which trades latency for
//! consistency between client and store.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use nb_core::thread::build_detail;
use nb_core::{
    BoardStore, Post, Result, Session, ThreadPath, VoteDirection, VoteLedger, VoteMap,
    VoteOutcome,
};

/// What the presentation layer renders: the nested tree plus the caller's
/// own vote direction per item (empty without a session).
#[derive(Debug, Clone, Serialize)]
pub struct ThreadSnapshot {
    pub post: Post,
    pub my_votes: VoteMap,
}

/// Lifecycle of one thread view. `Loading → Ready` on the happy path,
/// `Loading → Failed` when a fetch errors out; a `Failed` view retries by
/// calling [`ThreadView::refresh`] again. No automatic retry loop.
#[derive(Debug, Clone)]
pub enum ViewState {
    Loading,
    Ready(ThreadSnapshot),
    Failed { message: String },
}

impl ViewState {
    pub fn snapshot(&self) -> Option<&ThreadSnapshot> {
        match self {
            ViewState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// Result of a reply attempt, reported to the caller instead of thrown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Posted { comment_id: Uuid },
    Rejected { reason: String },
}

/// Coordinates one post's thread view over the store port.
pub struct ThreadView {
    store: Arc<dyn BoardStore>,
    ledger: VoteLedger,
    post_id: Uuid,
    state: RwLock<ViewState>,
    /// Bumped on every refresh; a fetch that finishes after a newer one has
    /// started is discarded rather than applied out of order.
    generation: AtomicU64,
}

impl ThreadView {
    pub fn new(store: Arc<dyn BoardStore>, post_id: Uuid) -> Self {
        Self {
            ledger: VoteLedger::new(store.clone()),
            store,
            post_id,
            state: RwLock::new(ViewState::Loading),
            generation: AtomicU64::new(0),
        }
    }

    pub fn post_id(&self) -> Uuid {
        self.post_id
    }

    /// Current state, cloned for rendering.
    pub async fn state(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Fetches the flat collection plus the caller's votes, rebuilds the
    /// tree, and publishes the result, unless a newer refresh has started
    /// in the meantime; a stale result is dropped and the latest published
    /// state is returned instead.
    pub async fn refresh(&self, session: Option<&Session>) -> ViewState {
        match self.load(session).await {
            Ok(Some(snapshot)) => ViewState::Ready(snapshot),
            Ok(None) => self.state().await,
            Err(err) => ViewState::Failed {
                message: err.to_string(),
            },
        }
    }

    /// Like [`refresh`](Self::refresh), but hands the typed error back to
    /// callers that map it themselves (the HTTP layer). `Ok(None)` means
    /// this fetch was superseded and its result discarded.
    pub async fn load(&self, session: Option<&Session>) -> Result<Option<ThreadSnapshot>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.write().await = ViewState::Loading;

        let fetched = self.fetch(session).await;

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(post_id = %self.post_id, generation, "discarding superseded fetch");
            return Ok(None);
        }
        match fetched {
            Ok(snapshot) => {
                *state = ViewState::Ready(snapshot.clone());
                Ok(Some(snapshot))
            }
            Err(err) => {
                warn!(post_id = %self.post_id, error = %err, "thread fetch failed");
                *state = ViewState::Failed {
                    message: err.to_string(),
                };
                Err(err)
            }
        }
    }

    /// Casts a vote and, when the store accepts it, re-enters `Loading` and
    /// re-fetches. A rejected vote leaves the displayed state untouched.
    pub async fn vote(
        &self,
        session: &Session,
        item_id: Uuid,
        direction: VoteDirection,
    ) -> VoteOutcome {
        let outcome = self.ledger.cast(session, item_id, direction).await;
        if outcome == VoteOutcome::Accepted {
            self.refresh(Some(session)).await;
        }
        outcome
    }

    /// Creates a reply under the given parent and re-fetches on success.
    /// The child path is derived here; the store persists it verbatim.
    pub async fn reply(
        &self,
        session: &Session,
        parent_path: &ThreadPath,
        parent_id: Uuid,
        content: &str,
    ) -> ReplyOutcome {
        let path = parent_path.child(parent_id);
        match self.store.create_comment(session, content, &path).await {
            Ok(comment_id) => {
                debug!(post_id = %self.post_id, %comment_id, "reply created");
                self.refresh(Some(session)).await;
                ReplyOutcome::Posted { comment_id }
            }
            Err(err) => {
                warn!(post_id = %self.post_id, error = %err, "reply rejected by store");
                ReplyOutcome::Rejected {
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn fetch(&self, session: Option<&Session>) -> Result<ThreadSnapshot> {
        let detail = self.store.fetch_post_with_comments(self.post_id).await?;
        let post = build_detail(detail)?;
        let my_votes = match session {
            Some(session) => self.store.fetch_user_votes(session.user_id).await?,
            None => VoteMap::new(),
        };
        Ok(ThreadSnapshot { post, my_votes })
    }
}
