//! Reachability
//!
//! Breadth-first searches over the store, plus the walk used to decide
//! where a sentinel gets reattached when a node loses its path to Top or
//! Bottom. All searches carry a visited set, so cycles are harmless.

use std::collections::{HashSet, VecDeque};

use super::node::NodeId;
use super::store::{EdgeClass, GraphStore, Relation};

/// Direction of travel along edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow outbound edges.
    Downstream,

    /// Follow inbound edges.
    Upstream,
}

impl Direction {
    fn relation(self) -> Relation {
        match self {
            Self::Downstream => Relation::Outbound,
            Self::Upstream => Relation::Inbound,
        }
    }
}

/// Every node reachable from `starts` in `direction`, starts included.
pub fn closure(
    store: &GraphStore,
    starts: impl IntoIterator<Item = NodeId>,
    direction: Direction,
) -> HashSet<NodeId> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    for start in starts {
        if seen.insert(start) {
            queue.push_back(start);
        }
    }

    while let Some(current) = queue.pop_front() {
        for next in store.neighbours(current, direction.relation()) {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }

    seen
}

/// Every node with a path into one of `starts`, starts included.
pub fn ancestors(store: &GraphStore, starts: impl IntoIterator<Item = NodeId>) -> HashSet<NodeId> {
    closure(store, starts, Direction::Upstream)
}

/// Every node reachable from one of `starts`, starts included.
pub fn descendants(
    store: &GraphStore,
    starts: impl IntoIterator<Item = NodeId>,
) -> HashSet<NodeId> {
    closure(store, starts, Direction::Downstream)
}

/// Whether there is a directed path from `from` to `to`.
///
/// A node always reaches itself.
pub fn reaches(store: &GraphStore, from: NodeId, to: NodeId) -> bool {
    if from == to {
        return true;
    }
    let mut seen = HashSet::from([from]);
    let mut queue = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        for next in store.neighbours(current, Relation::Outbound) {
            if next == to {
                return true;
            }
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    false
}

/// Walk real edges from `start` until stuck.
///
/// At each step the walk moves to the first neighbour (in relation-set
/// order) it has not been to yet, skipping sentinel edges. The node where
/// no unvisited real neighbour is left is returned. Each node is entered at
/// most once.
pub fn find_terminal(store: &GraphStore, start: NodeId, direction: Direction) -> NodeId {
    let mut visited = HashSet::from([start]);
    let mut current = start;
    loop {
        let next = store
            .neighbours(current, direction.relation())
            .filter(|&next| {
                let class = match direction {
                    Direction::Downstream => EdgeClass::of(current, next),
                    Direction::Upstream => EdgeClass::of(next, current),
                };
                class == EdgeClass::Real
            })
            .find(|next| !visited.contains(next));

        match next {
            Some(next) => {
                visited.insert(next);
                current = next;
            }
            None => return current,
        }
    }
}
