//! Single-edge mutations.
//!
//! Adding an edge may push the destination down. Removing an edge can break
//! a loop, which turns the loop's upward edges into ordinary ones that now
//! need their destination below their source; those are settled on a
//! staged copy of the store so a conflict leaves the chart untouched.

use std::collections::HashSet;

use super::Flowchart;
use crate::graph::propagation;
use crate::graph::reach;
use crate::graph::{GraphStore, NodeId, Relation};
use crate::{Error, Result};

impl<P> Flowchart<P> {
    /// Draw an edge from `src` to `dest`.
    ///
    /// The destination is pushed below the source unless the edge closes a
    /// loop. Sentinel edges made redundant by the new edge are retired.
    /// Returns `false` if the edge already existed.
    pub fn connect(&mut self, src: NodeId, dest: NodeId) -> Result<bool> {
        self.store.ensure(src)?;
        self.store.ensure(dest)?;
        if src == NodeId::BOTTOM || dest == NodeId::TOP {
            return Err(Error::SentinelEdge { src, dest });
        }
        if self.store.has_edge(src, dest) {
            return Ok(false);
        }
        if src == dest {
            self.attach(src, dest);
            tracing::debug!(%src, "self-loop added");
            return Ok(true);
        }

        let upstream = reach::ancestors(&self.store, [src]);
        let (hs, hd) = (self.store.height_of(src), self.store.height_of(dest));
        let pass = if !upstream.contains(&dest) && hd <= hs {
            let nodes = propagation::plan_descent(&self.store, dest, &mut HashSet::new(), &upstream)?;
            Some((hs - hd + 1, nodes))
        } else {
            None
        };

        self.attach(src, dest);
        if let Some((delta, nodes)) = &pass {
            propagation::apply(&mut self.store, nodes, *delta);
        }

        if !src.is_sentinel() && dest != NodeId::BOTTOM {
            self.detach(src, NodeId::BOTTOM);
            self.ensure_reaches_bottom(src);
        }
        if !dest.is_sentinel() && src != NodeId::TOP {
            self.detach(NodeId::TOP, dest);
            self.ensure_reached_from_top(dest);
        }

        tracing::debug!(
            %src,
            %dest,
            moved = pass.as_ref().map_or(0, |(_, nodes)| nodes.len()),
            "edge connected"
        );
        Ok(true)
    }

    /// Remove the edge from `src` to `dest`.
    ///
    /// Endpoints left without a path to Top or Bottom are reattached.
    /// Returns `false` if there was no such edge.
    ///
    /// # Errors
    ///
    /// [`Error::HeightConflict`] if breaking a loop would require moving a
    /// node against one of its height links.
    pub fn disconnect(&mut self, src: NodeId, dest: NodeId) -> Result<bool> {
        self.store.ensure(src)?;
        self.store.ensure(dest)?;
        if !self.store.has_edge(src, dest) {
            return Ok(false);
        }

        // Only edges inside a loop through this edge can lose their loop.
        let ancestors = reach::ancestors(&self.store, [src]);
        let descendants = reach::descendants(&self.store, [dest]);
        let region: Vec<NodeId> = self
            .store
            .nodes()
            .filter(|node| ancestors.contains(node) && descendants.contains(node))
            .collect();

        if region.is_empty() {
            self.detach(src, dest);
        } else {
            let mut staged = self.store.clone();
            let removed = staged.remove_edge(src, dest);
            debug_assert!(removed.is_ok(), "disconnect {src} -> {dest}: {removed:?}");
            let edges = edges_within(&staged, &region);
            settle(&mut staged, &edges)?;
            self.store = staged;
        }

        self.ensure_reaches_bottom(src);
        self.ensure_reached_from_top(dest);
        self.restore_empty_chart();

        tracing::debug!(%src, %dest, looped = !region.is_empty(), "edge disconnected");
        Ok(true)
    }

    /// Wire Top straight to Bottom once nothing else hangs from Top.
    pub(super) fn restore_empty_chart(&mut self) {
        if self.store.neighbours(NodeId::TOP, Relation::Outbound).next().is_none() {
            self.attach(NodeId::TOP, NodeId::BOTTOM);
            self.sink_bottom(NodeId::TOP);
        }
    }
}

/// Every edge with both endpoints in `nodes`.
fn edges_within(store: &GraphStore, nodes: &[NodeId]) -> Vec<(NodeId, NodeId)> {
    let members: HashSet<NodeId> = nodes.iter().copied().collect();
    nodes
        .iter()
        .flat_map(|&src| {
            store
                .neighbours(src, Relation::Outbound)
                .filter(|dest| members.contains(dest))
                .map(move |dest| (src, dest))
        })
        .collect()
}

/// Push destinations down until every edge in `edges` that is not part of a
/// loop points downward.
///
/// Each round fixes the first offending edge by moving its destination, and
/// whatever must come along, to just below its source.
fn settle(store: &mut GraphStore, edges: &[(NodeId, NodeId)]) -> Result<()> {
    while let Some((src, dest)) = first_offending(store, edges, &[]) {
        descend_below(store, src, dest)?;
    }
    Ok(())
}

/// Like [`settle`], but an edge whose destination cannot move without
/// breaking a height link is left as it is.
///
/// Returns the edges that were left pointing sideways or up.
pub(super) fn settle_where_possible(
    store: &mut GraphStore,
    edges: &[(NodeId, NodeId)],
) -> Vec<(NodeId, NodeId)> {
    let mut stuck = Vec::new();
    while let Some((src, dest)) = first_offending(store, edges, &stuck) {
        if let Err(err) = descend_below(store, src, dest) {
            tracing::debug!(%src, %dest, %err, "edge left unsettled");
            stuck.push((src, dest));
        }
    }
    stuck
}

/// First edge outside `skip` that is not on a loop and does not point down.
fn first_offending(
    store: &GraphStore,
    edges: &[(NodeId, NodeId)],
    skip: &[(NodeId, NodeId)],
) -> Option<(NodeId, NodeId)> {
    edges.iter().copied().find(|&(src, dest)| {
        src != dest
            && !skip.contains(&(src, dest))
            && store.height_of(dest) <= store.height_of(src)
            && !reach::reaches(store, dest, src)
    })
}

/// Move `dest`, and whatever must come along, to just below `src`.
fn descend_below(store: &mut GraphStore, src: NodeId, dest: NodeId) -> Result<()> {
    let anchors = reach::ancestors(store, [src]);
    let nodes = propagation::plan_descent(store, dest, &mut HashSet::new(), &anchors)?;
    let delta = store.height_of(src) - store.height_of(dest) + 1;
    propagation::apply(store, &nodes, delta);
    tracing::trace!(%src, %dest, delta, moved = nodes.len(), "edge settled");
    Ok(())
}
