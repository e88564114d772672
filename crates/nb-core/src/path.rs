//! # Materialized Paths
//!
//! A path encodes an item's full ancestry as a dot-delimited sequence of
//! ancestor identifiers, so the whole hierarchy can be rebuilt from a flat
//! collection without recursive queries.
//!
//! Shape: `root` for a post, `root.<id>` for a direct reply,
//! `root.<id>.<id>` one level deeper, and so on. Path segments only permit
//! word characters, so the hyphens in UUID text are swapped for underscores
//! on the way in and swapped back on extraction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{BoardError, Result};

/// Literal first segment of every path.
const ROOT_MARKER: &str = "root";
const SEPARATOR: char = '.';
/// Stand-in for the hyphens of UUID text inside a segment.
const SEGMENT_SAFE: char = '_';
const SEGMENT_UNSAFE: char = '-';

/// A validated materialized path.
///
/// Serializes as the plain string form, matching what the store persists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadPath(String);

impl ThreadPath {
    /// The single-segment root form carried by every post.
    pub fn root() -> Self {
        ThreadPath(ROOT_MARKER.to_string())
    }

    /// The path of a reply to the item at `self` with identifier
    /// `parent_id`: exactly `<parent path>.<parent id, normalized>`.
    pub fn child(&self, parent_id: Uuid) -> Self {
        ThreadPath(format!(
            "{}{}{}",
            self.0,
            SEPARATOR,
            encode_segment(parent_id)
        ))
    }

    /// Number of non-empty segments after the root marker.
    /// A post sits at depth 0, its direct replies at depth 1.
    pub fn depth(&self) -> usize {
        self.0
            .strip_prefix(ROOT_MARKER)
            .unwrap_or(&self.0)
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .count()
    }

    /// Identifier of the item this path replies to: the last segment with
    /// the normalization reversed.
    ///
    /// Fails with [`BoardError::MalformedPath`] when the path is already the
    /// root form and no parent segment exists.
    pub fn parent_id(&self) -> Result<Uuid> {
        let last = self
            .0
            .strip_prefix(ROOT_MARKER)
            .unwrap_or(&self.0)
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty())
            .next_back()
            .ok_or_else(|| {
                BoardError::MalformedPath(format!("path `{}` has no parent segment", self.0))
            })?;
        decode_segment(last)
    }

    /// Validates a path arriving over the wire: root marker first, every
    /// following segment a normalized identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = raw.split(SEPARATOR);
        if segments.next() != Some(ROOT_MARKER) {
            return Err(BoardError::MalformedPath(format!(
                "path `{raw}` does not start with the root marker"
            )));
        }
        for segment in segments {
            decode_segment(segment)?;
        }
        Ok(ThreadPath(raw.to_string()))
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_MARKER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ThreadPath {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        ThreadPath::parse(s)
    }
}

/// Normalizes an identifier into segment form. Identifiers are UUIDs, so
/// the separator itself can never occur inside one.
fn encode_segment(id: Uuid) -> String {
    id.to_string().replace(SEGMENT_UNSAFE, "_")
}

/// Inverts [`encode_segment`].
fn decode_segment(segment: &str) -> Result<Uuid> {
    if segment.is_empty() {
        return Err(BoardError::MalformedPath(
            "empty path segment".to_string(),
        ));
    }
    let restored = segment.replace(SEGMENT_SAFE, "-");
    Uuid::parse_str(&restored).map_err(|_| {
        BoardError::MalformedPath(format!("segment `{segment}` is not an identifier"))
    })
}
