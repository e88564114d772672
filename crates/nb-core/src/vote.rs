//! # Vote Ledger
//!
//! One active vote per (user, item), with an aggregate score that must stay
//! consistent with the vote rows. The transition function below is the
//! contract every store implementation executes inside its own atomic
//! section; the ledger service wraps it for callers that want outcomes
//! instead of errors.

use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::models::{Session, VoteDirection};
use crate::traits::BoardStore;

/// How a single cast changes the stored vote row and the aggregate score.
///
/// Both effects belong to one transactional unit: a reader must never
/// observe the row replaced but the score not yet adjusted, or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    /// Added to the item's score in the same transaction as the row write.
    pub score_delta: i64,
    /// Whether the vote row must be created or replaced.
    pub write_row: bool,
}

impl VoteTransition {
    /// The replace-or-create-or-no-op semantics of a cast:
    ///
    /// - no prior vote: record the direction, score moves by its weight;
    /// - same direction again: idempotent, nothing changes;
    /// - opposite direction: replace the row, score crosses sides by twice
    ///   the weight in a single update.
    pub fn apply(existing: Option<VoteDirection>, requested: VoteDirection) -> Self {
        match existing {
            None => VoteTransition {
                score_delta: requested.weight(),
                write_row: true,
            },
            Some(prior) if prior == requested => VoteTransition {
                score_delta: 0,
                write_row: false,
            },
            Some(_) => VoteTransition {
                score_delta: 2 * requested.weight(),
                write_row: true,
            },
        }
    }

    pub fn is_noop(&self) -> bool {
        !self.write_row
    }
}

/// Result of a cast as seen by the presentation layer. A store failure is
/// an expected-occasional condition, so it surfaces as `Rejected` rather
/// than a fault, and prior state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Accepted,
    Rejected { reason: String },
}

/// Applies a user's vote intent through the store port.
pub struct VoteLedger {
    store: Arc<dyn BoardStore>,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn BoardStore>) -> Self {
        Self { store }
    }

    /// Casts `direction` on `item_id` for the session's user.
    pub async fn cast(
        &self,
        session: &Session,
        item_id: Uuid,
        direction: VoteDirection,
    ) -> VoteOutcome {
        match self
            .store
            .cast_vote(item_id, session.user_id, direction)
            .await
        {
            Ok(()) => VoteOutcome::Accepted,
            Err(err) => {
                warn!(%item_id, user_id = %session.user_id, error = %err, "vote rejected by store");
                VoteOutcome::Rejected {
                    reason: err.to_string(),
                }
            }
        }
    }
}
