//! Mesh-to-mesh stages: modifiers and parameterizers.
//!
//! Modifiers deform the incoming mesh; parameterizers assign per-vertex UVs
//! without touching positions. Every op here builds a fresh mesh from the
//! input, the incoming artifact is never mutated.
use glam::{Quat, Vec2, Vec3};

use crate::artifact::Artifact;
use crate::config::{Configuration, Parameter};
use crate::error::Result;
use crate::fieldgraph::{field, FieldGraph, ScalarField};
use crate::pipeline::stage::{StageOp, SurfaceOp};

/// Displaces vertices along their normals by a composed scalar field.
pub struct DisplaceModifier {
    config: Configuration,
    pub graph: FieldGraph,
}

impl DisplaceModifier {
    pub fn new(graph: FieldGraph) -> Self {
        let config = Configuration::new().with("strength", Parameter::float(0.25, 0.0, 10.0));
        Self { config, graph }
    }

    fn field(&self) -> ScalarField {
        self.graph.compose().unwrap_or_else(|| field::constant(0.0))
    }
}

impl StageOp for DisplaceModifier {
    fn name(&self) -> &str {
        "displace"
    }

    fn config(&self) -> &Configuration {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }
}

impl SurfaceOp for DisplaceModifier {
    fn apply(&mut self, input: &Artifact) -> Result<Artifact> {
        let strength = self.config.float_or("strength", 0.25);
        let field = self.field();

        let mut mesh = input.mesh.clone();
        let flat_normals = mesh.normals.len() != mesh.positions.len();
        for (i, position) in mesh.positions.iter_mut().enumerate() {
            let normal = if flat_normals {
                Vec3::Y
            } else {
                input.mesh.normals[i]
            };
            *position += normal * (field(*position) * strength);
        }
        mesh.compute_normals();

        Ok(Artifact {
            mesh,
            maps: input.maps.clone(),
        })
    }
}

/// Applies a translate/rotate/scale transform to every vertex.
pub struct TransformModifier {
    config: Configuration,
}

impl TransformModifier {
    pub fn new() -> Self {
        let config = Configuration::new()
            .with("translation", Parameter::vec3(Vec3::ZERO))
            .with("rotation_degrees", Parameter::vec3(Vec3::ZERO))
            .with("scale", Parameter::vec3(Vec3::ONE));
        Self { config }
    }
}

impl Default for TransformModifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StageOp for TransformModifier {
    fn name(&self) -> &str {
        "transform"
    }

    fn config(&self) -> &Configuration {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }
}

impl SurfaceOp for TransformModifier {
    fn apply(&mut self, input: &Artifact) -> Result<Artifact> {
        let translation = self.config.vec3_or("translation", Vec3::ZERO);
        let degrees = self.config.vec3_or("rotation_degrees", Vec3::ZERO);
        let scale = self.config.vec3_or("scale", Vec3::ONE);
        let rotation = Quat::from_euler(
            glam::EulerRot::YXZ,
            degrees.y.to_radians(),
            degrees.x.to_radians(),
            degrees.z.to_radians(),
        );

        let mut mesh = input.mesh.clone();
        for position in mesh.positions.iter_mut() {
            *position = rotation * (*position * scale) + translation;
        }
        // Non-uniform scale skews normals, so rebuild instead of rotating.
        mesh.compute_normals();

        Ok(Artifact {
            mesh,
            maps: input.maps.clone(),
        })
    }
}

/// Projects UVs from above: XZ position mapped into the unit square over the
/// mesh bounds.
pub struct PlanarParameterizer {
    config: Configuration,
}

impl PlanarParameterizer {
    pub fn new() -> Self {
        Self {
            config: Configuration::new(),
        }
    }
}

impl Default for PlanarParameterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StageOp for PlanarParameterizer {
    fn name(&self) -> &str {
        "planar-uv"
    }

    fn config(&self) -> &Configuration {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }
}

impl SurfaceOp for PlanarParameterizer {
    fn apply(&mut self, input: &Artifact) -> Result<Artifact> {
        let mut mesh = input.mesh.clone();
        let Some((min, max)) = mesh.bounds() else {
            mesh.uvs = Vec::new();
            return Ok(Artifact {
                mesh,
                maps: input.maps.clone(),
            });
        };
        let span = (max - min).max(Vec3::splat(f32::EPSILON));

        mesh.uvs = mesh
            .positions
            .iter()
            .map(|p| Vec2::new((p.x - min.x) / span.x, (p.z - min.z) / span.z))
            .collect();

        Ok(Artifact {
            mesh,
            maps: input.maps.clone(),
        })
    }
}

/// Equirectangular UVs from the vertex direction around the mesh centroid.
pub struct SphericalParameterizer {
    config: Configuration,
}

impl SphericalParameterizer {
    pub fn new() -> Self {
        Self {
            config: Configuration::new(),
        }
    }
}

impl Default for SphericalParameterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StageOp for SphericalParameterizer {
    fn name(&self) -> &str {
        "spherical-uv"
    }

    fn config(&self) -> &Configuration {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }
}

impl SurfaceOp for SphericalParameterizer {
    fn apply(&mut self, input: &Artifact) -> Result<Artifact> {
        let mut mesh = input.mesh.clone();
        let center = mesh
            .bounds()
            .map(|(min, max)| (min + max) * 0.5)
            .unwrap_or(Vec3::ZERO);

        mesh.uvs = mesh
            .positions
            .iter()
            .map(|p| {
                let d = (*p - center).normalize_or_zero();
                let u = 0.5 + d.z.atan2(d.x) / std::f32::consts::TAU;
                let v = 0.5 - d.y.clamp(-1.0, 1.0).asin() / std::f32::consts::PI;
                Vec2::new(u, v)
            })
            .collect();

        Ok(Artifact {
            mesh,
            maps: input.maps.clone(),
        })
    }
}
