//! Flowchart Graph
//!
//! This module implements the graph the flowchart engine mutates: node
//! identity, the store holding every relation, height propagation, and
//! reachability searches.
//!
//! # Overview
//!
//! The graph is a directed graph that may contain loops, where:
//!
//! - Nodes are bare ids; all state lives in the [`GraphStore`]
//! - Edges are directional flow between nodes
//! - Height links tie two nodes to the same layer
//! - Mentions are footnotes that never affect structure
//!
//! Two sentinel nodes, [`NodeId::TOP`] and [`NodeId::BOTTOM`], bracket the
//! graph so every node has somewhere to come from and somewhere to go.
//!
//! # Design Decisions
//!
//! 1. We use a centralized arena rather than nodes pointing at each other:
//!    - Loops are plain data, with no ownership cycles
//!    - Deleting a node is a purge by id
//!    - Several independent flowcharts can coexist
//!
//! 2. The arena is an insertion-ordered map, so lookups by id are O(1) and
//!    iteration is deterministic.
//!
//! 3. We keep both inbound and outbound sets so searches can travel in
//!    either direction without scanning.

mod node;
pub mod propagation;
pub mod reach;
mod store;

pub use node::{IdAllocator, NodeContent, NodeId};
pub use propagation::Recursion;
pub use reach::Direction;
pub use store::{EdgeClass, GraphStore, NodeRecord, Position, Relation};
