//! Flowchart Core
//!
//! This crate provides the graph engine behind the Flowcharter editor.
//! It implements:
//!
//! - Node identity and an arena-backed graph store
//! - Height propagation that keeps every node below its parents
//! - Insertion with edge interception, and deletion with reconnection
//! - Height links and mentions layered on top of the edges
//!
//! Node content (labels, free text) rides along as opaque payload; the
//! engine never looks at it.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `graph`: Node ids, the store, propagation and reachability
//! - `flowchart`: The invariant-keeping [`Flowchart`] built on top
//!
//! # Example
//!
//! ```rust,ignore
//! use flowchart_core::{Flowchart, NodeContent};
//!
//! let mut chart: Flowchart = Flowchart::with_title("Deploy");
//!
//! // A node with no connections hangs between Top and Bottom
//! let build = chart.add_node(NodeContent::label("build"), &[], &[])?;
//! let ship = chart.add_node(NodeContent::label("ship"), &[build], &[])?;
//!
//! // Insert a step between them; the build -> ship edge is intercepted
//! let test = chart.add_node(NodeContent::label("test"), &[build], &[ship])?;
//!
//! assert_eq!(chart.height(test)?, 2);
//! assert_eq!(chart.height(ship)?, 3);
//! println!("{chart}");
//! ```

pub mod flowchart;
pub mod graph;

pub use flowchart::{Flowchart, FlowchartConfig, SharedFlowchart};
pub use graph::{GraphStore, NodeContent, NodeId, Position, Relation};

/// Errors surfaced by graph and flowchart operations.
///
/// Every fallible operation checks its inputs before touching the graph,
/// so an error always means nothing changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("node {0} is not part of this flowchart")]
    UnknownNode(NodeId),

    #[error("node {0} is already part of this flowchart")]
    DuplicateInsertion(NodeId),

    #[error("node {0} was deleted and cannot be inserted again")]
    RetiredNode(NodeId),

    #[error("edge {src} -> {dest} would enter Top or leave Bottom")]
    SentinelEdge { src: NodeId, dest: NodeId },

    #[error("sentinel {0} cannot be used here")]
    SentinelNode(NodeId),

    #[error("moving {node} would also move {anchor}, which has to stay where it is")]
    HeightConflict { node: NodeId, anchor: NodeId },

    #[error("moving {node} would take a height out of range")]
    HeightOverflow { node: NodeId },
}

pub type Result<T> = std::result::Result<T, Error>;
