//! Serializable snapshots of field graphs.
//!
//! A snapshot lists the user-visible nodes (type, editor position,
//! parameters) and the logical connections between them. Placeholder sockets
//! never appear; reconstruction re-materializes them by replaying node
//! insertion followed by connection wiring. Node ids in the snapshot are the
//! original graph's ids and are remapped on restore.
use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fieldgraph::{FieldGraph, FieldKind};

/// One user-visible node in a serialized field graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: u32,
    pub kind: FieldKind,
    /// Editor-position hint.
    pub position: [f32; 2],
}

/// One logical connection: `producer` feeds `consumer`'s input slot.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub consumer: u32,
    pub producer: u32,
    pub slot: u32,
}

/// A complete serialized field graph.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
    pub output: Option<u32>,
}

impl FieldGraph {
    /// Captures the user-visible structure of this graph.
    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .nodes()
            .map(|(id, node)| NodeSnapshot {
                id: id.0,
                kind: node.kind.clone(),
                position: node.position.to_array(),
            })
            .collect();

        let mut edges = Vec::new();
        for (id, node) in self.nodes() {
            for slot in 0..node.kind.required_inputs() as u32 {
                if let Some(producer) = self.input(id, slot) {
                    edges.push(EdgeSnapshot {
                        consumer: id.0,
                        producer: producer.0,
                        slot,
                    });
                }
            }
        }

        GraphSnapshot {
            nodes,
            edges,
            output: self.output().map(|id| id.0),
        }
    }

    /// Reconstructs a graph from a snapshot: node insertion first (in the
    /// serialized order), then connection wiring, then the output mark.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self> {
        let mut graph = FieldGraph::new();
        let mut ids = HashMap::with_capacity(snapshot.nodes.len());

        for node in &snapshot.nodes {
            let id = graph.insert_at(node.kind.clone(), Vec2::from_array(node.position));
            ids.insert(node.id, id);
        }

        let lookup = |old: u32| ids.get(&old).copied().ok_or(Error::UnknownNode { id: old });
        for edge in &snapshot.edges {
            graph.connect(lookup(edge.consumer)?, edge.slot, lookup(edge.producer)?)?;
        }
        if let Some(output) = snapshot.output {
            graph.set_output(lookup(output)?)?;
        }
        Ok(graph)
    }
}
