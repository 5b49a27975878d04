//! Graph Nodes
//!
//! This module defines node identity and the payload a node carries.
//!
//! A node is nothing but its [`NodeId`]. Everything structural about it
//! (height, rank, edges, links, mentions) lives in the
//! [`GraphStore`](super::GraphStore), keyed by that id. The payload is kept
//! beside the node by the flowchart and is never read by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a node in a flowchart.
///
/// Equality and hashing are by id alone. Ids are minted by an
/// [`IdAllocator`] and never handed out twice by the same allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// The Top sentinel. Ancestor of every node.
    pub const TOP: NodeId = NodeId(0);

    /// The Bottom sentinel. Descendant of every node.
    pub const BOTTOM: NodeId = NodeId(1);

    /// First raw value handed out to a real node.
    const FIRST: u64 = 2;

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Whether this is Top or Bottom.
    pub fn is_sentinel(&self) -> bool {
        *self == Self::TOP || *self == Self::BOTTOM
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::TOP => f.write_str("Top"),
            Self::BOTTOM => f.write_str("Bot"),
            Self(id) => write!(f, "{id}"),
        }
    }
}

/// Mints node ids for a single flowchart.
///
/// Each flowchart owns its allocator, so independent flowcharts never share
/// counter state. Ids are strictly increasing and never reused.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Create an allocator whose first id follows the sentinels.
    pub fn new() -> Self {
        Self { next: NodeId::FIRST }
    }

    /// Mint a new id.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Whether `id` was ever handed out by this allocator.
    ///
    /// Sentinels count as minted.
    pub fn is_minted(&self, id: NodeId) -> bool {
        id.0 < self.next
    }

    /// Number of real ids minted so far.
    pub fn minted(&self) -> u64 {
        self.next - NodeId::FIRST
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// The payload carried by a node.
///
/// The engine stores it next to the node and hands it back on deletion;
/// nothing in the height or edge logic looks at it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeContent {
    /// A bare node with no text.
    #[default]
    Plain,

    /// A node showing a single label.
    Label(String),

    /// A labeled node with a free-form body.
    Content { label: String, body: String },
}

impl NodeContent {
    /// Create a label node payload.
    pub fn label(label: impl Into<String>) -> Self {
        Self::Label(label.into())
    }

    /// Create a content node payload.
    pub fn content(label: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Content {
            label: label.into(),
            body: body.into(),
        }
    }

    /// The label text, if this kind has one.
    pub fn label_text(&self) -> Option<&str> {
        match self {
            Self::Plain => None,
            Self::Label(label) | Self::Content { label, .. } => Some(label),
        }
    }

    /// The body text of a content node.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Content { body, .. } => Some(body),
            _ => None,
        }
    }
}
