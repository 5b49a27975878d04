//! Insertion
//!
//! Placing a node runs in two phases. Planning validates the request and
//! works out every height pass against the untouched graph; committing
//! then draws edges, applies the passes and repairs sentinel edges. A
//! request that fails planning leaves the chart exactly as it was.
//!
//! # Algorithm
//!
//! 1. Missing parents default to Top and missing children to Bottom. A
//!    node listed in its own parents or children gets a self-loop, and
//!    the loop is ignored when deciding whether a sentinel is needed.
//! 2. The node sits one layer below its deepest parent.
//! 3. Each child at or above the new node, and not itself an ancestor of
//!    a parent, is pushed down with everything below it. Children are
//!    handled shallowest first, sharing one visited set, so every node
//!    moves at most once and always by enough.
//! 4. Edges from a parent straight to a child are intercepted.
//! 5. Sentinel edges made redundant by the new node are retired, and any
//!    neighbour left without a path to Top or Bottom is reattached.

use std::collections::HashSet;

use indexmap::IndexSet;
use smallvec::SmallVec;

use super::Flowchart;
use crate::graph::propagation;
use crate::graph::reach;
use crate::graph::NodeId;
use crate::{Error, Result};

/// A height pass: the delta and the nodes it moves.
type Pass = (i64, Vec<NodeId>);

/// Everything an insertion will do, worked out before anything changes.
#[derive(Debug)]
struct InsertPlan {
    inbound: IndexSet<NodeId>,
    outbound: IndexSet<NodeId>,
    height: i64,
    passes: SmallVec<[Pass; 4]>,
}

impl<P> Flowchart<P> {
    /// Insert a created node with the given parents and children.
    ///
    /// Empty `inbound` hangs the node from Top; empty `outbound` drains it
    /// into Bottom. Existing edges from a parent to a child are replaced by
    /// the path through the new node.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateInsertion`] if the node is already in the chart
    /// - [`Error::RetiredNode`] if the node was deleted
    /// - [`Error::UnknownNode`] if the node was never created here, or a
    ///   parent or child is not in the chart
    /// - [`Error::SentinelEdge`] for Bottom as a parent or Top as a child
    /// - [`Error::HeightConflict`] if pushing a child down would have to
    ///   move one of the new node's ancestors through a height link
    pub fn insert(&mut self, id: NodeId, inbound: &[NodeId], outbound: &[NodeId]) -> Result<()> {
        let plan = self.plan_insert(id, inbound, outbound)?;
        self.commit_insert(id, plan);
        Ok(())
    }

    /// Check that `id` was created here and is waiting to be inserted.
    pub(super) fn check_insertable(&self, id: NodeId) -> Result<()> {
        if self.store.contains(id) {
            return Err(Error::DuplicateInsertion(id));
        }
        if self.payloads.contains_key(&id) {
            return Ok(());
        }
        if self.ids.is_minted(id) {
            Err(Error::RetiredNode(id))
        } else {
            Err(Error::UnknownNode(id))
        }
    }

    /// Deduplicate and complete the parent and child sets.
    fn normalize(
        &self,
        id: NodeId,
        inbound: &[NodeId],
        outbound: &[NodeId],
    ) -> Result<(IndexSet<NodeId>, IndexSet<NodeId>)> {
        let mut parents: IndexSet<NodeId> = inbound.iter().copied().collect();
        let mut children: IndexSet<NodeId> = outbound.iter().copied().collect();

        for &node in parents.iter().chain(children.iter()) {
            if node != id {
                self.store.ensure(node)?;
            }
        }
        if parents.contains(&NodeId::BOTTOM) {
            return Err(Error::SentinelEdge {
                src: NodeId::BOTTOM,
                dest: id,
            });
        }
        if children.contains(&NodeId::TOP) {
            return Err(Error::SentinelEdge {
                src: id,
                dest: NodeId::TOP,
            });
        }

        if parents.contains(&id) || children.contains(&id) {
            parents.insert(id);
            children.insert(id);
        }
        if parents.iter().all(|&node| node == id) {
            parents.insert(NodeId::TOP);
        }
        if children.iter().all(|&node| node == id) {
            children.insert(NodeId::BOTTOM);
        }

        Ok((parents, children))
    }

    fn plan_insert(&self, id: NodeId, inbound: &[NodeId], outbound: &[NodeId]) -> Result<InsertPlan> {
        self.check_insertable(id)?;
        let (inbound, outbound) = self.normalize(id, inbound, outbound)?;

        let parents = inbound.iter().copied().filter(|&node| node != id);
        let height = 1 + parents
            .clone()
            .map(|node| self.store.height_of(node))
            .max()
            .unwrap_or(0);
        let upstream = reach::ancestors(&self.store, parents);

        let mut candidates: SmallVec<[NodeId; 8]> = outbound
            .iter()
            .copied()
            .filter(|&node| {
                node != id && !upstream.contains(&node) && self.store.height_of(node) <= height
            })
            .collect();
        candidates.sort_by_key(|&node| self.store.height_of(node));

        let mut visited = HashSet::from([id]);
        let mut passes = SmallVec::new();
        for child in candidates {
            if visited.contains(&child) {
                continue;
            }
            let delta = height - self.store.height_of(child) + 1;
            let nodes = propagation::plan_descent(&self.store, child, &mut visited, &upstream)?;
            passes.push((delta, nodes));
        }

        Ok(InsertPlan {
            inbound,
            outbound,
            height,
            passes,
        })
    }

    fn commit_insert(&mut self, id: NodeId, plan: InsertPlan) {
        let InsertPlan {
            inbound,
            outbound,
            height,
            passes,
        } = plan;

        self.store.register(id);
        self.store.offset_height(id, height);

        for &parent in &inbound {
            self.attach(parent, id);
        }
        for &child in &outbound {
            self.attach(id, child);
        }

        // Interception.
        for &parent in inbound.iter().filter(|&&node| node != id) {
            for &child in outbound.iter().filter(|&&node| node != id) {
                if parent != child {
                    self.detach(parent, child);
                }
            }
        }

        for (delta, nodes) in &passes {
            propagation::apply(&mut self.store, nodes, *delta);
        }

        let parents: SmallVec<[NodeId; 4]> = inbound
            .iter()
            .copied()
            .filter(|&node| node != id && !node.is_sentinel())
            .collect();
        let children: SmallVec<[NodeId; 4]> = outbound
            .iter()
            .copied()
            .filter(|&node| node != id && !node.is_sentinel())
            .collect();

        for &parent in &parents {
            self.detach(parent, NodeId::BOTTOM);
        }
        for &child in &children {
            self.detach(NodeId::TOP, child);
        }
        for &parent in &parents {
            self.ensure_reaches_bottom(parent);
        }
        for &child in &children {
            self.ensure_reached_from_top(child);
        }
        self.ensure_reaches_bottom(id);
        self.ensure_reached_from_top(id);

        tracing::debug!(
            %id,
            height,
            parents = inbound.len(),
            children = outbound.len(),
            passes = passes.len(),
            "node inserted"
        );
    }
}
