//! Generic owning directed graph with slot-tagged edges.
//!
//! [`DiGraph`] maps monotonically increasing [`NodeId`]s to payloads and keeps
//! a separate edge table so edges can be found and erased both by [`EdgeId`]
//! and by endpoint pair. Edges carry an input-slot index for nodes with more
//! than one input. Acyclicity is a caller invariant, not mechanically
//! enforced; the post-order traversal assumes it.
use std::collections::{BTreeMap, HashSet};

/// Identifier for a node in a [`DiGraph`]. Unique within one graph instance
/// and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Identifier for an edge in a [`DiGraph`], independent of its endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

/// A directed edge from one node to another, tagged with an input slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    /// Which input slot of `from` this edge fills.
    pub slot: u32,
}

/// An owning directed graph with at most one designated root.
#[derive(Clone, Debug)]
pub struct DiGraph<T> {
    nodes: BTreeMap<NodeId, T>,
    edges: BTreeMap<EdgeId, Edge>,
    next_node: u32,
    next_edge: u32,
    root: Option<NodeId>,
}

impl<T> Default for DiGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DiGraph<T> {
    /// Creates a new, empty graph.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            next_node: 0,
            next_edge: 0,
            root: None,
        }
    }

    /// Inserts a node payload and returns its fresh id.
    pub fn insert_node(&mut self, payload: T) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(id, payload);
        id
    }

    /// Inserts a directed edge from `from` to `to`, filling `from`'s input
    /// slot `slot`.
    pub fn insert_edge(&mut self, from: NodeId, to: NodeId, slot: u32) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(id, Edge { from, to, slot });
        id
    }

    /// Removes a node and every edge incident to it. Returns the payload if
    /// the node existed. A removed root leaves the graph rootless.
    pub fn erase_node(&mut self, id: NodeId) -> Option<T> {
        let payload = self.nodes.remove(&id)?;
        self.edges.retain(|_, e| e.from != id && e.to != id);
        if self.root == Some(id) {
            self.root = None;
        }
        Some(payload)
    }

    /// Removes a single edge by id.
    pub fn erase_edge(&mut self, id: EdgeId) -> Option<Edge> {
        self.edges.remove(&id)
    }

    /// Looks up the edge between an endpoint pair. Undefined (first match)
    /// if callers created parallel edges between the same endpoints.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.edges
            .iter()
            .find(|(_, e)| e.from == from && e.to == to)
            .map(|(id, _)| *id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates node ids and payloads in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.nodes.iter().map(|(id, t)| (*id, t))
    }

    /// Outgoing edges of a node, sorted by input slot.
    pub fn edges_from(&self, id: NodeId) -> Vec<(EdgeId, Edge)> {
        let mut out: Vec<(EdgeId, Edge)> = self
            .edges
            .iter()
            .filter(|(_, e)| e.from == id)
            .map(|(eid, e)| (*eid, *e))
            .collect();
        out.sort_by_key(|(_, e)| e.slot);
        out
    }

    /// Targets of a node's outgoing edges, in slot order.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        self.edges_from(id).into_iter().map(|(_, e)| e.to).collect()
    }

    /// Number of outgoing edges of a node.
    pub fn num_edges_from(&self, id: NodeId) -> usize {
        self.edges.values().filter(|e| e.from == id).count()
    }

    /// Designates `id` as the root. Silently replaces a previous designation;
    /// the old root keeps all of its other graph properties.
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Depth-first traversal from `start`, emitting nodes in post-order
    /// relative to dependency direction: a node is visited only once every
    /// node reachable from it via outgoing edges has been visited. Shared
    /// subgraphs are emitted once.
    pub fn visit_post_order(&self, start: NodeId, visit: &mut impl FnMut(NodeId)) {
        let mut seen = HashSet::new();
        self.post_order_inner(start, &mut seen, visit);
    }

    fn post_order_inner(
        &self,
        id: NodeId,
        seen: &mut HashSet<NodeId>,
        visit: &mut impl FnMut(NodeId),
    ) {
        if !self.nodes.contains_key(&id) || !seen.insert(id) {
            return;
        }
        for (_, edge) in self.edges_from(id) {
            self.post_order_inner(edge.to, seen, visit);
        }
        visit(id);
    }
}
