//! Composition algorithm: linearize the field graph into one callable field.
//!
//! The graph is walked post-order from the output node so every node's inputs
//! are composed before the node itself. Empty sockets contribute the
//! placeholder default; occupied sockets are skipped and resolve transparently
//! to their connected producer. A graph without an output composes to `None`,
//! which callers treat as "no field defined" and substitute a default.
use std::collections::HashMap;

use tracing::debug;

use crate::fieldgraph::field::{self, ScalarField};
use crate::fieldgraph::{FieldGraph, PLACEHOLDER_VALUE};
use crate::graph::NodeId;

impl FieldGraph {
    /// Composes the graph into a single evaluable scalar field, or `None`
    /// when no output node is designated.
    pub fn compose(&self) -> Option<ScalarField> {
        let output = self.output()?;

        let mut order = Vec::new();
        self.inner().visit_post_order(output, &mut |id| order.push(id));

        let mut composed: HashMap<NodeId, ScalarField> = HashMap::with_capacity(order.len());
        for id in order {
            let node = self.inner().node(id)?;

            if node.is_placeholder() {
                if self.inner().num_edges_from(id) > 0 {
                    // Occupied socket: the connected producer stands in.
                    continue;
                }
                composed.insert(id, field::constant(PLACEHOLDER_VALUE));
                continue;
            }

            // Inputs in increasing slot order; post-order guarantees each
            // resolved producer is already composed.
            let mut inputs = Vec::with_capacity(node.kind.required_inputs());
            for (_, edge) in self.inner().edges_from(id) {
                let resolved = self.resolve_socket(edge.to);
                inputs.push(composed.get(&resolved)?.clone());
            }
            composed.insert(id, node.kind.compose(inputs));
        }

        let result = composed.remove(&output);
        if result.is_none() {
            debug!("field graph composed to nothing (output {:?})", output);
        }
        result
    }

    fn resolve_socket(&self, id: NodeId) -> NodeId {
        match self.inner().node(id) {
            Some(n) if n.is_placeholder() => {
                self.inner().neighbors(id).first().copied().unwrap_or(id)
            }
            _ => id,
        }
    }
}
