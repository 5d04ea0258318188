//! Surface generators: the source stages of the pipeline.
//!
//! Both generators displace their base shape by a scalar field composed from
//! an owned [`FieldGraph`]. A graph without an output node contributes the
//! default constant field, so an empty graph still generates.
use glam::Vec3;

use crate::artifact::{Artifact, Mesh};
use crate::config::{Configuration, Parameter};
use crate::error::Result;
use crate::fieldgraph::{field, FieldGraph, ScalarField};
use crate::pipeline::stage::{GeneratorOp, StageOp};

fn composed_or_flat(graph: &FieldGraph) -> ScalarField {
    graph.compose().unwrap_or_else(|| field::constant(0.0))
}

/// Generates a subdivided plane in the XZ plane, displaced along Y.
pub struct PlaneGenerator {
    config: Configuration,
    pub graph: FieldGraph,
}

impl PlaneGenerator {
    pub fn new(graph: FieldGraph) -> Self {
        let config = Configuration::new()
            .with("resolution", Parameter::int(32, 1, 1024))
            .with("extent", Parameter::float(2.0, 0.01, 1000.0))
            .with("amplitude", Parameter::float(0.5, 0.0, 100.0));
        Self { config, graph }
    }

    /// A plane with no displacement field.
    pub fn flat() -> Self {
        Self::new(FieldGraph::new())
    }
}

impl StageOp for PlaneGenerator {
    fn name(&self) -> &str {
        "plane"
    }

    fn config(&self) -> &Configuration {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }
}

impl GeneratorOp for PlaneGenerator {
    fn generate(&mut self) -> Result<Artifact> {
        let cells = self.config.int_or("resolution", 32).max(1) as usize;
        let extent = self.config.float_or("extent", 2.0);
        let amplitude = self.config.float_or("amplitude", 0.5);
        let height = composed_or_flat(&self.graph);

        let side = cells + 1;
        let mut mesh = Mesh::new();
        mesh.positions.reserve(side * side);
        for row in 0..side {
            for col in 0..side {
                let x = (col as f32 / cells as f32 - 0.5) * extent;
                let z = (row as f32 / cells as f32 - 0.5) * extent;
                let y = height(Vec3::new(x, 0.0, z)) * amplitude;
                mesh.positions.push(Vec3::new(x, y, z));
            }
        }

        mesh.indices.reserve(cells * cells * 6);
        for row in 0..cells {
            for col in 0..cells {
                let i = (row * side + col) as u32;
                let s = side as u32;
                mesh.indices
                    .extend_from_slice(&[i, i + s, i + 1, i + 1, i + s, i + s + 1]);
            }
        }

        mesh.compute_normals();
        Ok(Artifact::from_mesh(mesh))
    }
}

/// Generates a UV sphere, displaced radially.
pub struct SphereGenerator {
    config: Configuration,
    pub graph: FieldGraph,
}

impl SphereGenerator {
    pub fn new(graph: FieldGraph) -> Self {
        let config = Configuration::new()
            .with("rows", Parameter::int(32, 3, 512))
            .with("columns", Parameter::int(64, 3, 1024))
            .with("radius", Parameter::float(1.0, 0.01, 1000.0))
            .with("amplitude", Parameter::float(0.2, 0.0, 10.0));
        Self { config, graph }
    }

    pub fn round() -> Self {
        Self::new(FieldGraph::new())
    }
}

impl StageOp for SphereGenerator {
    fn name(&self) -> &str {
        "sphere"
    }

    fn config(&self) -> &Configuration {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }
}

impl GeneratorOp for SphereGenerator {
    fn generate(&mut self) -> Result<Artifact> {
        let rows = self.config.int_or("rows", 32).max(3) as usize;
        let columns = self.config.int_or("columns", 64).max(3) as usize;
        let radius = self.config.float_or("radius", 1.0);
        let amplitude = self.config.float_or("amplitude", 0.2);
        let height = composed_or_flat(&self.graph);

        let mut mesh = Mesh::new();
        // One duplicated seam column so the parameterizer can unwrap cleanly.
        for row in 0..=rows {
            let theta = std::f32::consts::PI * row as f32 / rows as f32;
            for col in 0..=columns {
                let phi = std::f32::consts::TAU * col as f32 / columns as f32;
                let unit = Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.cos(),
                    theta.sin() * phi.sin(),
                );
                let r = radius * (1.0 + height(unit) * amplitude);
                mesh.positions.push(unit * r);
            }
        }

        let stride = (columns + 1) as u32;
        for row in 0..rows {
            for col in 0..columns {
                let i = row as u32 * stride + col as u32;
                if row > 0 {
                    mesh.indices.extend_from_slice(&[i, i + 1, i + stride]);
                }
                if row + 1 < rows {
                    mesh.indices
                        .extend_from_slice(&[i + 1, i + stride + 1, i + stride]);
                }
            }
        }

        mesh.compute_normals();
        Ok(Artifact::from_mesh(mesh))
    }
}
