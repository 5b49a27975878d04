//! Graph Store
//!
//! The store is the arena every node lives in. For each registered node it
//! keeps a position record and four relation sets:
//!
//! - `inbound`: nodes with an edge into this node
//! - `outbound`: nodes this node has an edge into
//! - `linked`: nodes forced to share this node's height (symmetric)
//! - `mentions`: footnote references (asymmetric, no structural effect)
//!
//! Relation sets hold ids, never owning references, so cycles are just data
//! and removing a node is a purge by id.
//!
//! The store enforces symmetry of edges and links but none of the flowchart
//! invariants; that is [`Flowchart`](crate::Flowchart)'s job. The one
//! exception is [`GraphStore::add_link`], which levels the two heights before
//! recording the link.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::node::NodeId;
use super::propagation;
use crate::{Error, Result};

/// Vertical and horizontal placement of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Layer index. Larger is lower in the chart.
    pub height: i64,

    /// Horizontal slot within the layer. Stored, never computed here.
    pub rank: i64,
}

/// The four per-node relation sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Inbound,
    Outbound,
    Linked,
    Mentions,
}

/// Whether an edge is part of the chart or sentinel bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeClass {
    /// Both endpoints are real nodes.
    Real,

    /// The edge leaves Top or enters Bottom.
    Sentinel,
}

impl EdgeClass {
    /// Classify the edge `src -> dest`.
    pub fn of(src: NodeId, dest: NodeId) -> Self {
        if src.is_sentinel() || dest.is_sentinel() {
            Self::Sentinel
        } else {
            Self::Real
        }
    }
}

/// Everything the store knows about one node.
#[derive(Debug, Clone, Default)]
pub struct NodeRecord {
    position: Position,
    inbound: IndexSet<NodeId>,
    outbound: IndexSet<NodeId>,
    linked: IndexSet<NodeId>,
    mentions: IndexSet<NodeId>,
}

impl NodeRecord {
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn inbound(&self) -> &IndexSet<NodeId> {
        &self.inbound
    }

    pub fn outbound(&self) -> &IndexSet<NodeId> {
        &self.outbound
    }

    pub fn linked(&self) -> &IndexSet<NodeId> {
        &self.linked
    }

    pub fn mentions(&self) -> &IndexSet<NodeId> {
        &self.mentions
    }

    /// Get one of the relation sets by name.
    pub fn relation(&self, relation: Relation) -> &IndexSet<NodeId> {
        match relation {
            Relation::Inbound => &self.inbound,
            Relation::Outbound => &self.outbound,
            Relation::Linked => &self.linked,
            Relation::Mentions => &self.mentions,
        }
    }

    fn purge(&mut self, id: NodeId) {
        self.inbound.shift_remove(&id);
        self.outbound.shift_remove(&id);
        self.linked.shift_remove(&id);
        self.mentions.shift_remove(&id);
    }
}

/// Arena of nodes and their relations.
///
/// Iteration order is registration order, which keeps dumps and searches
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    records: IndexMap<NodeId, NodeRecord>,
}

impl GraphStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            records: IndexMap::new(),
        }
    }

    /// Create a store with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: IndexMap::with_capacity(capacity),
        }
    }

    /// Register a node with empty relations and a zeroed position.
    ///
    /// Returns `false` if the node was already registered, in which case
    /// nothing changes.
    pub fn register(&mut self, id: NodeId) -> bool {
        if self.records.contains_key(&id) {
            return false;
        }
        self.records.insert(id, NodeRecord::default());
        true
    }

    /// Remove a node and every reference to it.
    ///
    /// Returns `false` if the node was not registered.
    pub fn unregister(&mut self, id: NodeId) -> bool {
        if self.records.shift_remove(&id).is_none() {
            return false;
        }
        for record in self.records.values_mut() {
            record.purge(id);
        }
        true
    }

    /// Whether the node is registered.
    pub fn contains(&self, id: NodeId) -> bool {
        self.records.contains_key(&id)
    }

    /// Fail with [`Error::UnknownNode`] unless the node is registered.
    pub fn ensure(&self, id: NodeId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(Error::UnknownNode(id))
        }
    }

    /// Number of registered nodes, sentinels included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All registered nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.records.keys().copied()
    }

    /// All registered nodes with their records.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeRecord)> + '_ {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    /// Get a node's record.
    pub fn record(&self, id: NodeId) -> Result<&NodeRecord> {
        self.records.get(&id).ok_or(Error::UnknownNode(id))
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord> {
        self.records.get_mut(&id).ok_or(Error::UnknownNode(id))
    }

    pub fn position(&self, id: NodeId) -> Result<Position> {
        self.record(id).map(NodeRecord::position)
    }

    pub fn height(&self, id: NodeId) -> Result<i64> {
        self.position(id).map(|p| p.height)
    }

    pub fn rank(&self, id: NodeId) -> Result<i64> {
        self.position(id).map(|p| p.rank)
    }

    pub fn set_height(&mut self, id: NodeId, height: i64) -> Result<()> {
        self.record_mut(id)?.position.height = height;
        Ok(())
    }

    pub fn set_rank(&mut self, id: NodeId, rank: i64) -> Result<()> {
        self.record_mut(id)?.position.rank = rank;
        Ok(())
    }

    /// Height of a node known to be registered; 0 otherwise.
    pub(crate) fn height_of(&self, id: NodeId) -> i64 {
        self.records.get(&id).map_or(0, |r| r.position.height)
    }

    /// Add `delta` to a node's height. No-op for unregistered nodes.
    pub(crate) fn offset_height(&mut self, id: NodeId, delta: i64) {
        if let Some(record) = self.records.get_mut(&id) {
            record.position.height += delta;
        }
    }

    /// Get one relation set of a node.
    pub fn relation(&self, id: NodeId, relation: Relation) -> Result<&IndexSet<NodeId>> {
        self.record(id).map(|r| r.relation(relation))
    }

    pub fn inbound(&self, id: NodeId) -> Result<&IndexSet<NodeId>> {
        self.relation(id, Relation::Inbound)
    }

    pub fn outbound(&self, id: NodeId) -> Result<&IndexSet<NodeId>> {
        self.relation(id, Relation::Outbound)
    }

    pub fn linked(&self, id: NodeId) -> Result<&IndexSet<NodeId>> {
        self.relation(id, Relation::Linked)
    }

    pub fn mentions(&self, id: NodeId) -> Result<&IndexSet<NodeId>> {
        self.relation(id, Relation::Mentions)
    }

    /// Iterate a relation set, yielding nothing for unregistered nodes.
    pub(crate) fn neighbours(
        &self,
        id: NodeId,
        relation: Relation,
    ) -> impl Iterator<Item = NodeId> + '_ {
        self.records
            .get(&id)
            .into_iter()
            .flat_map(move |r| r.relation(relation).iter().copied())
    }

    pub fn has_edge(&self, src: NodeId, dest: NodeId) -> bool {
        self.records
            .get(&src)
            .is_some_and(|r| r.outbound.contains(&dest))
    }

    /// Draw a directed edge.
    ///
    /// Returns `false` if the edge already existed.
    pub fn add_edge(&mut self, src: NodeId, dest: NodeId) -> Result<bool> {
        self.ensure(src)?;
        self.ensure(dest)?;
        let added = self.record_mut(src)?.outbound.insert(dest);
        self.record_mut(dest)?.inbound.insert(src);
        Ok(added)
    }

    /// Remove a directed edge.
    ///
    /// Returns `false` if there was no such edge.
    pub fn remove_edge(&mut self, src: NodeId, dest: NodeId) -> Result<bool> {
        self.ensure(src)?;
        self.ensure(dest)?;
        let removed = self.record_mut(src)?.outbound.shift_remove(&dest);
        self.record_mut(dest)?.inbound.shift_remove(&src);
        Ok(removed)
    }

    pub fn has_link(&self, a: NodeId, b: NodeId) -> bool {
        self.records.get(&a).is_some_and(|r| r.linked.contains(&b))
    }

    /// Tie the heights of two nodes together.
    ///
    /// The node with the smaller height is pushed down to meet the other,
    /// along with everything that must move with it. The link is recorded
    /// once the heights agree. Fails with [`Error::HeightConflict`] and
    /// changes nothing if leveling would drag part of the other node's
    /// link group along.
    ///
    /// Returns `false` if the nodes were already linked.
    pub fn add_link(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        self.ensure(a)?;
        self.ensure(b)?;
        if self.has_link(a, b) {
            return Ok(false);
        }
        propagation::equalize(self, a, b)?;
        self.record_mut(a)?.linked.insert(b);
        self.record_mut(b)?.linked.insert(a);
        Ok(true)
    }

    /// Remove a height link. Heights stay where they are.
    pub fn remove_link(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        self.ensure(a)?;
        self.ensure(b)?;
        let removed = self.record_mut(a)?.linked.shift_remove(&b);
        self.record_mut(b)?.linked.shift_remove(&a);
        Ok(removed)
    }

    pub fn has_mention(&self, src: NodeId, dest: NodeId) -> bool {
        self.records
            .get(&src)
            .is_some_and(|r| r.mentions.contains(&dest))
    }

    /// Record that `src` references `dest`.
    pub fn add_mention(&mut self, src: NodeId, dest: NodeId) -> Result<bool> {
        self.ensure(dest)?;
        Ok(self.record_mut(src)?.mentions.insert(dest))
    }

    pub fn remove_mention(&mut self, src: NodeId, dest: NodeId) -> Result<bool> {
        self.ensure(dest)?;
        Ok(self.record_mut(src)?.mentions.shift_remove(&dest))
    }

    /// Every node that mentions `id`.
    ///
    /// Mentions are only indexed forward, so this scans the whole store.
    pub fn mentions_of(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.ensure(id)?;
        Ok(self
            .records
            .iter()
            .filter(|(_, record)| record.mentions.contains(&id))
            .map(|(node, _)| *node)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(ids: &[u64]) -> (GraphStore, Vec<NodeId>) {
        let mut store = GraphStore::new();
        let nodes: Vec<NodeId> = ids.iter().map(|&raw| NodeId::from(raw)).collect();
        for &node in &nodes {
            store.register(node);
        }
        (store, nodes)
    }

    #[test]
    fn register_and_unregister_nodes() {
        let (mut store, nodes) = store_with(&[10, 11]);
        assert_eq!(store.len(), 2);

        // Registering twice changes nothing
        store.set_height(nodes[0], 4).unwrap();
        assert!(!store.register(nodes[0]));
        assert_eq!(store.height(nodes[0]).unwrap(), 4);

        assert!(store.unregister(nodes[0]));
        assert!(!store.unregister(nodes[0]));
        assert_eq!(store.len(), 1);
        assert!(!store.contains(nodes[0]));
        assert!(store.contains(nodes[1]));
    }

    #[test]
    fn add_and_remove_edges() {
        let (mut store, nodes) = store_with(&[10, 11]);
        let (a, b) = (nodes[0], nodes[1]);

        assert!(store.add_edge(a, b).unwrap());
        assert!(!store.add_edge(a, b).unwrap());
        assert!(store.outbound(a).unwrap().contains(&b));
        assert!(store.inbound(b).unwrap().contains(&a));

        assert!(store.remove_edge(a, b).unwrap());
        assert!(!store.remove_edge(a, b).unwrap());
        assert!(store.outbound(a).unwrap().is_empty());
        assert!(store.inbound(b).unwrap().is_empty());
    }

    #[test]
    fn unregister_purges_every_relation() {
        let (mut store, nodes) = store_with(&[10, 11, 12]);
        let (a, b, c) = (nodes[0], nodes[1], nodes[2]);

        store.add_edge(a, b).unwrap();
        store.add_edge(b, c).unwrap();
        store.add_link(a, c).unwrap();
        store.add_mention(c, b).unwrap();

        store.unregister(b);

        for (_, record) in store.iter() {
            for relation in [
                Relation::Inbound,
                Relation::Outbound,
                Relation::Linked,
                Relation::Mentions,
            ] {
                assert!(!record.relation(relation).contains(&b));
            }
        }
        assert!(store.has_link(a, c));
    }

    #[test]
    fn edges_to_unknown_nodes_fail() {
        let (mut store, nodes) = store_with(&[10]);
        let ghost = NodeId::from(99);

        assert_eq!(store.add_edge(nodes[0], ghost), Err(Error::UnknownNode(ghost)));
        assert_eq!(store.add_link(ghost, nodes[0]), Err(Error::UnknownNode(ghost)));
        assert_eq!(store.add_mention(nodes[0], ghost), Err(Error::UnknownNode(ghost)));
        assert!(store.outbound(nodes[0]).unwrap().is_empty());
    }

    #[test]
    fn links_are_symmetric_and_level_heights() {
        let (mut store, nodes) = store_with(&[10, 11]);
        let (a, b) = (nodes[0], nodes[1]);
        store.set_height(a, 2).unwrap();
        store.set_height(b, 5).unwrap();

        assert!(store.add_link(a, b).unwrap());
        assert!(store.has_link(a, b));
        assert!(store.has_link(b, a));
        assert_eq!(store.height(a).unwrap(), 5);
        assert_eq!(store.height(b).unwrap(), 5);

        assert!(store.remove_link(b, a).unwrap());
        assert!(!store.has_link(a, b));
        assert_eq!(store.height(a).unwrap(), 5);
    }

    #[test]
    fn mentions_are_one_way() {
        let (mut store, nodes) = store_with(&[10, 11, 12]);
        let (a, b, c) = (nodes[0], nodes[1], nodes[2]);

        store.add_mention(a, c).unwrap();
        store.add_mention(b, c).unwrap();

        assert!(store.has_mention(a, c));
        assert!(!store.has_mention(c, a));
        assert_eq!(store.mentions_of(c).unwrap(), vec![a, b]);
        assert!(store.mentions_of(a).unwrap().is_empty());

        store.remove_mention(a, c).unwrap();
        assert_eq!(store.mentions_of(c).unwrap(), vec![b]);
    }

    #[test]
    fn edge_classification() {
        let (a, b) = (NodeId::from(10), NodeId::from(11));
        assert_eq!(EdgeClass::of(a, b), EdgeClass::Real);
        assert_eq!(EdgeClass::of(NodeId::TOP, a), EdgeClass::Sentinel);
        assert_eq!(EdgeClass::of(a, NodeId::BOTTOM), EdgeClass::Sentinel);
    }
}
