//! Height Propagation
//!
//! Moving a node up or down drags along everything that has to keep its
//! relative position: its descendants, and every node height-linked to
//! anything that moves.
//!
//! # Algorithm
//!
//! A pass runs in two phases:
//!
//! 1. **Collect.** Walk from the start node with an explicit stack, marking
//!    each node visited as it is discovered:
//!    - follow outbound edges to unvisited children. With
//!      [`Recursion::Downward`], children sitting above the current node
//!      (back edges of a loop) are not followed.
//!    - follow every unvisited height link, always.
//! 2. **Apply.** Add the delta to every collected node.
//!
//! Every comparison in phase 1 reads heights as they were before the pass,
//! and each node is collected at most once, however dense or cyclic the
//! graph is. Callers may pre-seed the visited set to keep nodes out of a
//! pass, or share one set across several passes.

use std::collections::HashSet;

use super::node::NodeId;
use super::reach;
use super::store::{GraphStore, Relation};
use crate::{Error, Result};

/// Which children a pass may travel to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recursion {
    /// Only children at or below the current node.
    Downward,

    /// Every child, including ones sitting above the current node.
    Unrestricted,
}

/// Collect every node that must move with `start`.
///
/// `start` is always collected. Nodes already in `visited` are skipped, and
/// every collected node is added to it. Returns nodes in discovery order.
pub fn collect(
    store: &GraphStore,
    start: NodeId,
    visited: &mut HashSet<NodeId>,
    recursion: Recursion,
) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut stack = vec![start];
    visited.insert(start);

    while let Some(current) = stack.pop() {
        order.push(current);
        let height = store.height_of(current);

        for child in store.neighbours(current, Relation::Outbound) {
            if visited.contains(&child) {
                continue;
            }
            if recursion == Recursion::Downward && store.height_of(child) < height {
                continue;
            }
            visited.insert(child);
            stack.push(child);
        }

        for peer in store.neighbours(current, Relation::Linked) {
            if visited.insert(peer) {
                stack.push(peer);
            }
        }
    }

    order
}

/// Shift every node in `nodes` by `delta`.
pub fn apply(store: &mut GraphStore, nodes: &[NodeId], delta: i64) {
    for &node in nodes {
        store.offset_height(node, delta);
    }
}

/// Collect and apply in one go. Returns the nodes that moved.
pub fn shift(
    store: &mut GraphStore,
    start: NodeId,
    delta: i64,
    visited: &mut HashSet<NodeId>,
    recursion: Recursion,
) -> Vec<NodeId> {
    let nodes = collect(store, start, visited, recursion);
    apply(store, &nodes, delta);
    tracing::trace!(%start, delta, moved = nodes.len(), "height pass");
    nodes
}

/// Collect a downward pass from `start`, refusing to move any of `anchors`.
///
/// Anchors are nodes that must stay above the pass (the ancestors of
/// whatever `start` is being pushed below). A downward walk can only reach
/// one through a height link, and then no uniform shift can satisfy both
/// the edge ordering and the link, so the pass is rejected.
pub fn plan_descent(
    store: &GraphStore,
    start: NodeId,
    visited: &mut HashSet<NodeId>,
    anchors: &HashSet<NodeId>,
) -> Result<Vec<NodeId>> {
    let nodes = collect(store, start, visited, Recursion::Downward);
    match nodes.iter().find(|node| anchors.contains(node)) {
        Some(&anchor) => Err(Error::HeightConflict {
            node: start,
            anchor,
        }),
        None => Ok(nodes),
    }
}

/// Every node tied to `start` through a chain of height links, `start`
/// included.
pub fn link_group(store: &GraphStore, start: NodeId) -> HashSet<NodeId> {
    let mut group = HashSet::from([start]);
    let mut stack = vec![start];
    while let Some(current) = stack.pop() {
        for peer in store.neighbours(current, Relation::Linked) {
            if group.insert(peer) {
                stack.push(peer);
            }
        }
    }
    group
}

/// Level two nodes before they are linked.
///
/// The node with the smaller height moves down to the other's height; the
/// other node and its whole link group stay put. If a moving node has an
/// edge down into that group which is not part of a loop, the heights
/// cannot be reconciled and nothing changes.
///
/// Returns the nodes that moved.
pub fn equalize(store: &mut GraphStore, a: NodeId, b: NodeId) -> Result<Vec<NodeId>> {
    let (ha, hb) = (store.height(a)?, store.height(b)?);
    if ha == hb {
        return Ok(Vec::new());
    }
    let (mover, anchor, delta) = if ha < hb {
        (a, b, hb - ha)
    } else {
        (b, a, ha - hb)
    };

    let group = link_group(store, anchor);
    let mut visited = group.clone();
    let nodes = collect(store, mover, &mut visited, Recursion::Downward);

    for &node in &nodes {
        let height = store.height_of(node);
        let blocked = store.neighbours(node, Relation::Outbound).find(|child| {
            group.contains(child)
                && store.height_of(*child) >= height
                && !reach::reaches(store, *child, node)
        });
        if let Some(anchor) = blocked {
            return Err(Error::HeightConflict {
                node: mover,
                anchor,
            });
        }
    }

    apply(store, &nodes, delta);
    tracing::trace!(%mover, %anchor, delta, moved = nodes.len(), "heights leveled");
    Ok(nodes)
}
