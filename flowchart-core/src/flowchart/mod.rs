//! Flowchart Engine
//!
//! This module wraps the [`GraphStore`] in a [`Flowchart`] that keeps the
//! chart consistent across every mutation.
//!
//! # Invariants
//!
//! After any sequence of operations:
//!
//! 1. Every real node has a path from Top and a path to Bottom.
//! 2. For every edge `a -> b` not on a loop, `b` sits strictly below `a`.
//! 3. Height links are symmetric and linked nodes share a height.
//! 4. A node with no parent other than itself hangs from Top; a node with
//!    no child other than itself drains into Bottom.
//! 5. Node ids are never reused.
//!
//! # Operations
//!
//! - `insert`: place a created node with given parents and children
//! - `delete`: remove a node, wiring its parents straight to its children
//! - `connect` / `disconnect`: add or remove a single edge
//! - `link` / `unlink`: tie two nodes to the same height
//! - `mention` / `unmention`: footnote references
//!
//! Every operation validates its input first and either applies fully or
//! returns an error with the chart untouched.
//!
//! Heights only ever grow during repair. Gaps left behind by deletion are
//! not closed.

mod config;
mod connect;
mod delete;
mod insert;
mod shared;

pub use config::FlowchartConfig;
pub use shared::SharedFlowchart;

use std::collections::HashSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::graph::propagation::{self, Recursion};
use crate::graph::reach::{self, Direction};
use crate::graph::{GraphStore, IdAllocator, NodeContent, NodeId, NodeRecord, Position, Relation};
use crate::{Error, Result};

/// A flowchart: a titled graph of nodes with consistent heights.
///
/// `P` is the payload each node carries. The engine stores it and hands it
/// back, nothing more.
#[derive(Debug, Clone)]
pub struct Flowchart<P = NodeContent> {
    title: String,
    store: GraphStore,
    ids: IdAllocator,
    /// Payload of every created node, inserted or not.
    payloads: IndexMap<NodeId, P>,
}

impl<P> Flowchart<P> {
    /// Create an empty flowchart titled "Flowchart".
    pub fn new() -> Self {
        Self::with_config(FlowchartConfig::default())
    }

    /// Create an empty flowchart with the given title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self::with_config(FlowchartConfig::default().with_title(title))
    }

    /// Create an empty flowchart from a configuration.
    ///
    /// The chart starts out with only the sentinels, wired `Top -> Bottom`.
    pub fn with_config(config: FlowchartConfig) -> Self {
        let mut store = GraphStore::with_capacity(config.capacity + 2);
        store.register(NodeId::TOP);
        store.register(NodeId::BOTTOM);
        let mut chart = Self {
            title: config.title,
            store,
            ids: IdAllocator::new(),
            payloads: IndexMap::with_capacity(config.capacity),
        };
        chart.attach(NodeId::TOP, NodeId::BOTTOM);
        chart.sink_bottom(NodeId::TOP);
        chart
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn top(&self) -> NodeId {
        NodeId::TOP
    }

    pub fn bottom(&self) -> NodeId {
        NodeId::BOTTOM
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Number of real nodes in the chart.
    pub fn len(&self) -> usize {
        self.store.len() - 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the node is part of the chart. Sentinels always are.
    pub fn contains(&self, id: NodeId) -> bool {
        self.store.contains(id)
    }

    /// Every registered node, sentinels included, in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.store.nodes()
    }

    /// Every real node, in registration order.
    pub fn real_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.store.nodes().filter(|id| !id.is_sentinel())
    }

    /// Find a node by its raw id value.
    pub fn lookup(&self, raw: u64) -> Result<NodeId> {
        let id = NodeId::from(raw);
        self.store.ensure(id)?;
        Ok(id)
    }

    pub fn record(&self, id: NodeId) -> Result<&NodeRecord> {
        self.store.record(id)
    }

    pub fn position(&self, id: NodeId) -> Result<Position> {
        self.store.position(id)
    }

    pub fn height(&self, id: NodeId) -> Result<i64> {
        self.store.height(id)
    }

    pub fn rank(&self, id: NodeId) -> Result<i64> {
        self.store.rank(id)
    }

    /// Set the horizontal slot of a node. The engine never reads it.
    pub fn set_rank(&mut self, id: NodeId, rank: i64) -> Result<()> {
        self.store.set_rank(id, rank)
    }

    pub fn inbound(&self, id: NodeId) -> Result<&IndexSet<NodeId>> {
        self.store.inbound(id)
    }

    pub fn outbound(&self, id: NodeId) -> Result<&IndexSet<NodeId>> {
        self.store.outbound(id)
    }

    pub fn linked(&self, id: NodeId) -> Result<&IndexSet<NodeId>> {
        self.store.linked(id)
    }

    pub fn mentions(&self, id: NodeId) -> Result<&IndexSet<NodeId>> {
        self.store.mentions(id)
    }

    /// Every node that mentions `id`. Scans the whole chart.
    pub fn mentions_of(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.store.mentions_of(id)
    }

    pub fn has_edge(&self, src: NodeId, dest: NodeId) -> bool {
        self.store.has_edge(src, dest)
    }

    pub fn has_link(&self, a: NodeId, b: NodeId) -> bool {
        self.store.has_link(a, b)
    }

    pub fn has_mention(&self, src: NodeId, dest: NodeId) -> bool {
        self.store.has_mention(src, dest)
    }

    /// Mint a new node carrying `payload`.
    ///
    /// The node is not part of the graph until it is inserted.
    pub fn create_node(&mut self, payload: P) -> NodeId {
        let id = self.ids.next_id();
        self.payloads.insert(id, payload);
        id
    }

    /// Create a node and insert it in one step.
    ///
    /// On failure the minted id is discarded and never handed out again.
    pub fn add_node(&mut self, payload: P, inbound: &[NodeId], outbound: &[NodeId]) -> Result<NodeId> {
        let id = self.create_node(payload);
        if let Err(err) = self.insert(id, inbound, outbound) {
            self.payloads.shift_remove(&id);
            return Err(err);
        }
        Ok(id)
    }

    pub fn payload(&self, id: NodeId) -> Option<&P> {
        self.payloads.get(&id)
    }

    pub fn payload_mut(&mut self, id: NodeId) -> Option<&mut P> {
        self.payloads.get_mut(&id)
    }

    /// Tie two nodes to the same height.
    ///
    /// The node with the smaller height moves down (with everything below
    /// it) to meet the other; nothing is ever dragged up. Returns `false`
    /// if the nodes were already linked or are the same node.
    pub fn link(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        self.check_real(a)?;
        self.check_real(b)?;
        if a == b {
            return Ok(false);
        }
        let linked = self.store.add_link(a, b)?;
        if linked {
            tracing::debug!(%a, %b, height = self.store.height_of(a), "nodes linked");
        }
        Ok(linked)
    }

    /// Remove a height link. Heights stay where they are.
    pub fn unlink(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        self.store.remove_link(a, b)
    }

    /// Record that `src` refers to `dest`. No structural effect.
    pub fn mention(&mut self, src: NodeId, dest: NodeId) -> Result<bool> {
        self.check_real(src)?;
        self.check_real(dest)?;
        self.store.add_mention(src, dest)
    }

    pub fn unmention(&mut self, src: NodeId, dest: NodeId) -> Result<bool> {
        self.store.remove_mention(src, dest)
    }

    /// Move a node and everything below or linked to it by `delta` layers.
    ///
    /// Unlike the repair passes, this follows every outbound edge, loops
    /// included. Moving up (negative `delta`) is refused if any moved node
    /// would reach the height of a parent that stays put, or the layer of
    /// Top. Bottom is left in place when moving up.
    ///
    /// Returns the nodes that moved.
    ///
    /// # Errors
    ///
    /// - [`Error::HeightConflict`] when moving up runs into a parent or Top
    /// - [`Error::HeightOverflow`] when a moved height would leave `i64`
    pub fn shift_height(&mut self, id: NodeId, delta: i64) -> Result<Vec<NodeId>> {
        self.check_real(id)?;
        if delta == 0 {
            return Ok(Vec::new());
        }

        let mut visited = HashSet::new();
        let mut nodes = propagation::collect(&self.store, id, &mut visited, Recursion::Unrestricted);

        if delta < 0 {
            nodes.retain(|&node| node != NodeId::BOTTOM);
            visited.remove(&NodeId::BOTTOM);
        }
        let mut targets = Vec::with_capacity(nodes.len());
        for &node in &nodes {
            let target = self
                .store
                .height_of(node)
                .checked_add(delta)
                .ok_or(Error::HeightOverflow { node: id })?;
            targets.push((node, target));
        }

        if delta < 0 {
            for &(node, target) in &targets {
                if target < 1 {
                    return Err(Error::HeightConflict {
                        node: id,
                        anchor: NodeId::TOP,
                    });
                }
                let blocking = self
                    .store
                    .neighbours(node, Relation::Inbound)
                    .find(|parent| !visited.contains(parent) && target <= self.store.height_of(*parent));
                if let Some(anchor) = blocking {
                    return Err(Error::HeightConflict { node: id, anchor });
                }
            }
        }

        propagation::apply(&mut self.store, &nodes, delta);
        tracing::debug!(%id, delta, moved = nodes.len(), "height shifted");
        Ok(nodes)
    }

    /// Fail unless `id` is a registered, non-sentinel node.
    fn check_real(&self, id: NodeId) -> Result<()> {
        if id.is_sentinel() {
            return Err(Error::SentinelNode(id));
        }
        self.store.ensure(id)
    }

    /// Draw an edge between nodes known to be registered.
    fn attach(&mut self, src: NodeId, dest: NodeId) {
        let drawn = self.store.add_edge(src, dest);
        debug_assert!(drawn.is_ok(), "attach {src} -> {dest}: {drawn:?}");
    }

    /// Remove an edge between nodes known to be registered.
    fn detach(&mut self, src: NodeId, dest: NodeId) {
        let removed = self.store.remove_edge(src, dest);
        debug_assert!(removed.is_ok(), "detach {src} -> {dest}: {removed:?}");
    }

    /// Keep Bottom strictly below `above`.
    fn sink_bottom(&mut self, above: NodeId) {
        let floor = self.store.height_of(above) + 1;
        let bottom = self.store.height_of(NodeId::BOTTOM);
        if bottom < floor {
            propagation::apply(&mut self.store, &[NodeId::BOTTOM], floor - bottom);
        }
    }

    /// Give `node` a path to Bottom if it has lost every one.
    ///
    /// Walks real edges downstream and drains the first dead end into
    /// Bottom.
    fn ensure_reaches_bottom(&mut self, node: NodeId) {
        if node.is_sentinel() || reach::reaches(&self.store, node, NodeId::BOTTOM) {
            return;
        }
        let terminal = reach::find_terminal(&self.store, node, Direction::Downstream);
        self.attach(terminal, NodeId::BOTTOM);
        self.sink_bottom(terminal);
        tracing::trace!(%node, %terminal, "bottom reattached");
    }

    /// Give `node` a path from Top if it has lost every one.
    ///
    /// Walks real edges upstream and hangs the first dead end from Top.
    fn ensure_reached_from_top(&mut self, node: NodeId) {
        if node.is_sentinel() || reach::reaches(&self.store, NodeId::TOP, node) {
            return;
        }
        let terminal = reach::find_terminal(&self.store, node, Direction::Upstream);
        self.attach(NodeId::TOP, terminal);
        tracing::trace!(%node, %terminal, "top reattached");
    }
}

impl<P> Default for Flowchart<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Summarizes the chart by listing every node's position and relations.
///
/// Meant for debugging; the layout is not stable.
impl<P> fmt::Display for Flowchart<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for (id, record) in self.store.iter() {
            let position = record.position();
            writeln!(
                f,
                "{} ({},{}) \t In: {{{}}} Out: {{{}}} Lnk: {{{}}} Mnt: {{{}}}",
                id,
                position.height,
                position.rank,
                join(record.inbound()),
                join(record.outbound()),
                join(record.linked()),
                join(record.mentions()),
            )?;
        }
        Ok(())
    }
}

fn join(set: &IndexSet<NodeId>) -> String {
    set.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
