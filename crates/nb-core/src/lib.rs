//! nestboard/crates/nb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Nestboard:
//! materialized paths, thread reconstruction, vote semantics, and the
//! storage port the plugins implement.

pub mod error;
pub mod models;
pub mod path;
pub mod thread;
pub mod traits;
pub mod vote;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use path::ThreadPath;
pub use thread::{build_detail, build_thread};
pub use traits::*;
pub use vote::{VoteLedger, VoteOutcome, VoteTransition};

#[cfg(test)]
mod tests {
    use super::models::*;
    use super::path::ThreadPath;
    use uuid::Uuid;

    #[test]
    fn test_post_record_creation_v7() {
        let id = Uuid::now_v7();
        let record = PostRecord {
            id,
            author_name: "test".to_string(),
            title: "Hello Rust!".to_string(),
            content: "first post".to_string(),
            score: 0,
            created_at: chrono::Utc::now(),
            path: ThreadPath::root(),
        };
        assert_eq!(record.id, id);
        assert!(record.path.is_root());
    }
}
