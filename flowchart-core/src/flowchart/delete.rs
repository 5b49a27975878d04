//! Deletion with reconnection.

use smallvec::SmallVec;

use super::connect::settle_where_possible;
use super::Flowchart;
use crate::graph::{NodeId, Relation};
use crate::{Error, Result};

impl<P> Flowchart<P> {
    /// Remove a node, wiring each of its parents straight to each of its
    /// children.
    ///
    /// Sentinel edges are not bridged. Surviving nodes keep their heights
    /// unless a bridging edge needs its destination pushed further down;
    /// gaps left by the removed node stay open. A bridge whose destination
    /// cannot move without breaking a height link keeps the heights it has.
    /// The id is retired and the node's payload is handed back.
    ///
    /// # Errors
    ///
    /// - [`Error::SentinelNode`] for Top or Bottom
    /// - [`Error::UnknownNode`] if the node is not in the chart
    pub fn delete(&mut self, id: NodeId) -> Result<Option<P>> {
        if id.is_sentinel() {
            return Err(Error::SentinelNode(id));
        }
        self.store.ensure(id)?;

        let parents: SmallVec<[NodeId; 4]> = self
            .store
            .neighbours(id, Relation::Inbound)
            .filter(|&node| node != id && node != NodeId::TOP)
            .collect();
        let children: SmallVec<[NodeId; 4]> = self
            .store
            .neighbours(id, Relation::Outbound)
            .filter(|&node| node != id && node != NodeId::BOTTOM)
            .collect();
        let bridges: Vec<(NodeId, NodeId)> = parents
            .iter()
            .flat_map(|&parent| {
                children
                    .iter()
                    .filter(move |&&child| child != parent)
                    .map(move |&child| (parent, child))
            })
            .collect();

        for &(parent, child) in &bridges {
            self.attach(parent, child);
        }
        self.store.unregister(id);
        let unsettled = settle_where_possible(&mut self.store, &bridges);

        let payload = self.payloads.shift_remove(&id);

        for &parent in &parents {
            self.ensure_reaches_bottom(parent);
        }
        for &child in &children {
            self.ensure_reached_from_top(child);
        }
        self.restore_empty_chart();

        tracing::debug!(
            %id,
            parents = parents.len(),
            children = children.len(),
            bridges = bridges.len(),
            unsettled = unsettled.len(),
            "node deleted"
        );
        Ok(payload)
    }
}
