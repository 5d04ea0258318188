//! Field graph subsystem: a DAG of scalar-field nodes composed into one
//! evaluable function.
//!
//! [`FieldGraph`] specializes the generic [`DiGraph`] to [`FieldNode`]
//! payloads. Every required input slot of a node is materialized eagerly as a
//! placeholder "socket" node when the node is inserted, so a node is always
//! composable: an empty socket contributes the placeholder default, an
//! occupied socket is transparent and routes to the connected producer.
pub mod compose;
pub mod field;
pub mod node;
pub mod snapshot;

use glam::Vec2;
use tracing::debug;

pub use crate::fieldgraph::field::{FractalParams, Perlin, ScalarField};
pub use crate::fieldgraph::node::{
    ClampParams, ConstantParams, FieldKind, FieldNode, PerlinParams, ScaleParams,
};
pub use crate::fieldgraph::snapshot::{EdgeSnapshot, GraphSnapshot, NodeSnapshot};
use crate::error::{Error, Result};
use crate::graph::{DiGraph, NodeId};

/// Value an unconnected input slot evaluates to.
pub const PLACEHOLDER_VALUE: f32 = 0.0;

/// A directed acyclic graph of scalar-field nodes with one designated output.
#[derive(Clone, Debug, Default)]
pub struct FieldGraph {
    graph: DiGraph<FieldNode>,
}

impl FieldGraph {
    /// Creates a new, empty field graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
        }
    }

    /// Inserts a node of the given kind, eagerly materializing one
    /// placeholder socket per required input slot.
    pub fn insert(&mut self, kind: FieldKind) -> NodeId {
        self.insert_at(kind, Vec2::ZERO)
    }

    /// Like [`FieldGraph::insert`], with an editor-position hint.
    pub fn insert_at(&mut self, kind: FieldKind, position: Vec2) -> NodeId {
        let slots = kind.required_inputs();
        let mut payload = FieldNode::new(kind);
        payload.position = position;
        let id = self.graph.insert_node(payload);
        for slot in 0..slots {
            let socket = self.graph.insert_node(FieldNode::placeholder(PLACEHOLDER_VALUE));
            self.graph.insert_edge(id, socket, slot as u32);
        }
        debug!("inserted node {:?} with {} sockets", id, slots);
        id
    }

    /// Removes a user-visible node along with its sockets. Connections into
    /// other nodes' sockets are severed, leaving those slots empty again.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        match self.graph.node(id) {
            None => return Err(Error::UnknownNode { id: id.0 }),
            Some(n) if n.is_placeholder() => return Err(Error::UnknownNode { id: id.0 }),
            Some(_) => {}
        }
        let sockets: Vec<NodeId> = self
            .graph
            .edges_from(id)
            .into_iter()
            .map(|(_, e)| e.to)
            .filter(|t| self.is_socket(*t))
            .collect();
        self.graph.erase_node(id);
        for socket in sockets {
            self.graph.erase_node(socket);
        }
        Ok(())
    }

    /// Connects `producer`'s output into `consumer`'s input slot, replacing
    /// any previous connection on that slot.
    pub fn connect(&mut self, consumer: NodeId, slot: u32, producer: NodeId) -> Result<()> {
        if consumer == producer {
            return Err(Error::InvalidConfig(
                "cannot connect a node to itself".into(),
            ));
        }
        let arity = self
            .graph
            .node(consumer)
            .ok_or(Error::UnknownNode { id: consumer.0 })?
            .kind
            .required_inputs();
        if slot as usize >= arity {
            return Err(Error::InvalidSlot { slot, arity });
        }
        if !self.graph.contains(producer) {
            return Err(Error::UnknownNode { id: producer.0 });
        }
        let socket = self
            .socket(consumer, slot)
            .ok_or(Error::InvalidSlot { slot, arity })?;
        if let Some((old, _)) = self.graph.edges_from(socket).into_iter().next() {
            self.graph.erase_edge(old);
        }
        self.graph.insert_edge(socket, producer, 0);
        Ok(())
    }

    /// Disconnects `consumer`'s input slot, reverting it to the placeholder
    /// default. Disconnecting an already-empty slot is fine.
    pub fn disconnect(&mut self, consumer: NodeId, slot: u32) -> Result<()> {
        let arity = self
            .graph
            .node(consumer)
            .ok_or(Error::UnknownNode { id: consumer.0 })?
            .kind
            .required_inputs();
        let socket = self
            .socket(consumer, slot)
            .ok_or(Error::InvalidSlot { slot, arity })?;
        if let Some((old, _)) = self.graph.edges_from(socket).into_iter().next() {
            self.graph.erase_edge(old);
        }
        Ok(())
    }

    /// The producer currently wired into `consumer`'s input slot, if any.
    pub fn input(&self, consumer: NodeId, slot: u32) -> Option<NodeId> {
        let socket = self.socket(consumer, slot)?;
        self.graph.neighbors(socket).first().copied()
    }

    /// Designates the graph's output node. Replaces any previous designation.
    pub fn set_output(&mut self, id: NodeId) -> Result<()> {
        match self.graph.node(id) {
            Some(n) if !n.is_placeholder() => {
                self.graph.set_root(id);
                Ok(())
            }
            _ => Err(Error::UnknownNode { id: id.0 }),
        }
    }

    pub fn output(&self) -> Option<NodeId> {
        self.graph.root()
    }

    /// User-visible nodes (placeholders excluded), in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &FieldNode)> {
        self.graph.nodes().filter(|(_, n)| !n.is_placeholder())
    }

    /// Number of user-visible nodes.
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    /// Number of logical connections (occupied slots) between user-visible
    /// nodes.
    pub fn connection_count(&self) -> usize {
        self.nodes()
            .map(|(id, n)| {
                (0..n.kind.required_inputs() as u32)
                    .filter(|slot| self.input(id, *slot).is_some())
                    .count()
            })
            .sum()
    }

    pub fn node(&self, id: NodeId) -> Option<&FieldNode> {
        self.graph.node(id).filter(|n| !n.is_placeholder())
    }

    /// Mutable access to a node's kind and position. Editing parameters does
    /// not mark any stage changed; the caller owning the graph does that.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut FieldNode> {
        self.graph.node_mut(id).filter(|n| !n.is_placeholder())
    }

    pub(crate) fn inner(&self) -> &DiGraph<FieldNode> {
        &self.graph
    }

    fn socket(&self, consumer: NodeId, slot: u32) -> Option<NodeId> {
        self.graph
            .edges_from(consumer)
            .into_iter()
            .find(|(_, e)| e.slot == slot)
            .map(|(_, e)| e.to)
    }

    fn is_socket(&self, id: NodeId) -> bool {
        self.graph.node(id).is_some_and(|n| n.is_placeholder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_materializes_sockets_eagerly() {
        let mut g = FieldGraph::new();
        let add = g.insert(FieldKind::Add);
        // Two sockets exist behind the scenes but the node listing hides them.
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.inner().len(), 3);
        assert_eq!(g.inner().num_edges_from(add), 2);
    }

    #[test]
    fn connect_fills_and_replaces_a_slot() {
        let mut g = FieldGraph::new();
        let add = g.insert(FieldKind::Add);
        let a = g.insert(FieldKind::constant(1.0));
        let b = g.insert(FieldKind::constant(2.0));

        assert_eq!(g.input(add, 0), None);
        g.connect(add, 0, a).unwrap();
        assert_eq!(g.input(add, 0), Some(a));
        g.connect(add, 0, b).unwrap();
        assert_eq!(g.input(add, 0), Some(b));
        assert_eq!(g.connection_count(), 1);
    }

    #[test]
    fn connect_rejects_bad_slots_and_nodes() {
        let mut g = FieldGraph::new();
        let abs = g.insert(FieldKind::Abs);
        let c = g.insert(FieldKind::constant(1.0));

        assert!(matches!(
            g.connect(abs, 1, c),
            Err(Error::InvalidSlot { slot: 1, arity: 1 })
        ));
        assert!(matches!(
            g.connect(abs, 0, NodeId(999)),
            Err(Error::UnknownNode { .. })
        ));
        assert!(g.connect(abs, 0, abs).is_err());
    }

    #[test]
    fn disconnect_reverts_to_empty_slot() {
        let mut g = FieldGraph::new();
        let abs = g.insert(FieldKind::Abs);
        let c = g.insert(FieldKind::constant(1.0));
        g.connect(abs, 0, c).unwrap();
        g.disconnect(abs, 0).unwrap();
        assert_eq!(g.input(abs, 0), None);
        // Disconnecting again is a no-op.
        g.disconnect(abs, 0).unwrap();
    }

    #[test]
    fn remove_erases_sockets_and_severs_consumers() {
        let mut g = FieldGraph::new();
        let add = g.insert(FieldKind::Add);
        let c = g.insert(FieldKind::constant(1.0));
        g.connect(add, 0, c).unwrap();

        g.remove(c).unwrap();
        assert_eq!(g.input(add, 0), None);

        g.remove(add).unwrap();
        assert!(g.inner().is_empty());
    }

    #[test]
    fn placeholders_cannot_be_addressed_directly() {
        let mut g = FieldGraph::new();
        let abs = g.insert(FieldKind::Abs);
        let socket = g.inner().neighbors(abs)[0];
        assert!(g.node(socket).is_none());
        assert!(matches!(g.remove(socket), Err(Error::UnknownNode { .. })));
        assert!(g.set_output(socket).is_err());
    }
}
