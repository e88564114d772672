//! # BoardError
//!
//! Centralized error handling for the Nestboard ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;
use uuid::Uuid;

/// The primary error type for all nb-core operations.
#[derive(Error, Debug)]
pub enum BoardError {
    /// A materialized path fails the structural invariant (missing root
    /// marker, empty segment, or no segments where a parent is expected).
    /// Never recoverable locally; surfaced as a reconstruction failure for
    /// the whole thread.
    #[error("malformed path: {0}")]
    MalformedPath(String),

    /// A comment's claimed parent is absent from the supplied flat
    /// collection. A data-integrity fault upstream; the builder surfaces it
    /// rather than silently dropping the comment.
    #[error("comment {comment_id} references parent {parent_ref}, which is not in the thread")]
    OrphanComment { comment_id: Uuid, parent_ref: String },

    /// Resource not found (e.g., a post id with no row behind it).
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, Uuid),

    /// Infrastructure failure at a storage boundary (DB down, I/O error).
    #[error("backing store failure: {0}")]
    Store(#[from] anyhow::Error),
}

/// A specialized Result type for Nestboard logic.
pub type Result<T> = std::result::Result<T, BoardError>;
