//! # Thread Reconstruction
//!
//! Rebuilds the nested comment tree of a post from the flat, unordered
//! collection the store hands back. The flat collection is held as an arena
//! indexed by id; nodes are classified in a single linear pass and the owned
//! tree is assembled from the resulting child lists, so there are never
//! live parent/child references to keep consistent.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{BoardError, Result};
use crate::models::{Comment, DepthFirstComment, Post, PostDetail, PostRecord};
use crate::path::ThreadPath;

/// Reconstructs the ordered nested tree rooted at `post`.
///
/// The sort key is load-bearing: a node's depth is always exactly one
/// greater than its parent's, so processing in non-decreasing depth order
/// guarantees every parent is classified before its children are visited.
/// `created_at` breaks ties, which fixes sibling display order
/// deterministically.
///
/// A comment whose claimed parent is missing from `comments` fails the
/// whole reconstruction with [`BoardError::OrphanComment`]. That indicates
/// a broken path invariant upstream; dropping the comment instead could
/// mask duplicated or lost content.
pub fn build_thread(post: PostRecord, comments: Vec<DepthFirstComment>) -> Result<Post> {
    let mut nodes: HashMap<Uuid, Comment> = HashMap::with_capacity(comments.len());
    for flat in comments {
        nodes.insert(flat.id, flat.into_node());
    }

    let mut order: Vec<(usize, DateTime<Utc>, Uuid, ThreadPath)> = nodes
        .values()
        .map(|node| (node.path.depth(), node.created_at, node.id, node.path.clone()))
        .collect();
    // Id as the final tiebreaker keeps rebuilds deterministic when two
    // siblings share a timestamp.
    order.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)).then_with(|| a.2.cmp(&b.2)));

    let mut top_level: Vec<Uuid> = Vec::new();
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (depth, _, id, path) in order {
        if depth == 1 {
            top_level.push(id);
            continue;
        }
        // Depth 0 means a root path where a parent segment is expected;
        // parent_id surfaces that as MalformedPath.
        let parent_id = path.parent_id()?;
        if !nodes.contains_key(&parent_id) {
            return Err(BoardError::OrphanComment {
                comment_id: id,
                parent_ref: parent_id.to_string(),
            });
        }
        children.entry(parent_id).or_default().push(id);
    }

    let comments = top_level
        .into_iter()
        .filter_map(|id| assemble(id, &mut nodes, &mut children))
        .collect();
    Ok(post.into_post(comments))
}

/// Convenience over a raw fetch result.
pub fn build_detail(detail: PostDetail) -> Result<Post> {
    build_thread(detail.post, detail.comments)
}

/// Moves a node out of the arena with its transitive children attached.
/// Every id in the child lists was classified out of `nodes`, so the lookup
/// cannot miss; paths strictly increase in depth, so the recursion is
/// bounded by the deepest reply.
fn assemble(
    id: Uuid,
    nodes: &mut HashMap<Uuid, Comment>,
    children: &mut HashMap<Uuid, Vec<Uuid>>,
) -> Option<Comment> {
    let mut node = nodes.remove(&id)?;
    if let Some(child_ids) = children.remove(&id) {
        node.comments = child_ids
            .into_iter()
            .filter_map(|child| assemble(child, nodes, children))
            .collect();
    }
    Some(node)
}
