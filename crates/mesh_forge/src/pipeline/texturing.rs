//! Texturing stages: building and layering the raster map bundle.
//!
//! The texture generator composes its field graph into a displacement raster
//! and derives the rest of the bundle from it. Texture adders layer on top of
//! an existing bundle; when no generator ran before them they warn and pass
//! the artifact through unchanged.
use tracing::warn;

use crate::artifact::{Artifact, TextureMaps};
use crate::config::{Configuration, GradientStop, Parameter};
use crate::error::Result;
use crate::fieldgraph::{field, FieldGraph};
use crate::pipeline::stage::{StageOp, TextureOp};
use crate::rasterize;

/// Builds the full texture map bundle from a composed scalar field.
pub struct FieldTextureGenerator {
    config: Configuration,
    pub graph: FieldGraph,
}

impl FieldTextureGenerator {
    pub fn new(graph: FieldGraph) -> Self {
        let config = Configuration::new()
            .with("normal_strength", Parameter::float(4.0, 0.0, 64.0))
            .with("base_roughness", Parameter::float(0.5, 0.0, 1.0))
            .with("base_metalness", Parameter::float(0.0, 0.0, 1.0))
            .with(
                "albedo",
                Parameter::Gradient {
                    stops: vec![
                        GradientStop {
                            t: 0.0,
                            color: [0.2, 0.25, 0.3],
                        },
                        GradientStop {
                            t: 1.0,
                            color: [0.8, 0.75, 0.6],
                        },
                    ],
                },
            );
        Self { config, graph }
    }
}

impl StageOp for FieldTextureGenerator {
    fn name(&self) -> &str {
        "field-texture"
    }

    fn config(&self) -> &Configuration {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }
}

impl TextureOp for FieldTextureGenerator {
    fn apply(&mut self, input: &Artifact, resolution: usize) -> Result<Artifact> {
        let field = self.graph.compose().unwrap_or_else(|| field::constant(0.0));
        let normal_strength = self.config.float_or("normal_strength", 4.0);
        let base_roughness = self.config.float_or("base_roughness", 0.5);
        let base_metalness = self.config.float_or("base_metalness", 0.0);

        let mut maps = TextureMaps::new(resolution);
        rasterize::fill_from_field(&mut maps.displacement, &field);
        maps.normal = rasterize::normals_from_displacement(&maps.displacement, normal_strength);

        if let Some(gradient) = self.config.get("albedo").cloned() {
            let displacement = &maps.displacement;
            rasterize::fill_rgb(&mut maps.albedo, |x, y| {
                let t = displacement.get(x as isize, y as isize) * 0.5 + 0.5;
                gradient.sample_gradient(t).unwrap_or([0.5, 0.5, 0.5])
            });
        }
        rasterize::fill_scalar(&mut maps.roughness, |_, _| base_roughness);
        rasterize::fill_scalar(&mut maps.metalness, |_, _| base_metalness);
        // Darker where the field digs in, never below half occlusion.
        let displacement = maps.displacement.clone();
        rasterize::fill_scalar(&mut maps.ambient_occlusion, |x, y| {
            let d = displacement.get(x as isize, y as isize);
            (1.0 + d.min(0.0) * 0.5).clamp(0.5, 1.0)
        });

        Ok(Artifact {
            mesh: input.mesh.clone(),
            maps: Some(maps),
        })
    }
}

/// Blends a flat color into the albedo map.
pub struct TintAdder {
    config: Configuration,
}

impl TintAdder {
    pub fn new() -> Self {
        let config = Configuration::new()
            .with("color", Parameter::vec3(glam::Vec3::new(1.0, 1.0, 1.0)))
            .with("strength", Parameter::float(0.5, 0.0, 1.0));
        Self { config }
    }
}

impl Default for TintAdder {
    fn default() -> Self {
        Self::new()
    }
}

impl StageOp for TintAdder {
    fn name(&self) -> &str {
        "tint"
    }

    fn config(&self) -> &Configuration {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }
}

impl TextureOp for TintAdder {
    fn apply(&mut self, input: &Artifact, _resolution: usize) -> Result<Artifact> {
        let Some(maps) = &input.maps else {
            warn!("tint adder ran before any texture generator, passing through");
            return Ok(input.clone());
        };

        let color = self.config.vec3_or("color", glam::Vec3::ONE).to_array();
        let strength = self.config.float_or("strength", 0.5);

        let mut maps = maps.clone();
        for pixel in maps.albedo.data.iter_mut() {
            for c in 0..3 {
                pixel[c] += (color[c] - pixel[c]) * strength;
            }
        }

        Ok(Artifact {
            mesh: input.mesh.clone(),
            maps: Some(maps),
        })
    }
}

/// Adjusts the roughness map, clamped to [0, 1]. The `mode` choice selects
/// between adding the amount and scaling by `1 + amount`.
pub struct RoughnessAdder {
    config: Configuration,
}

impl RoughnessAdder {
    pub fn new() -> Self {
        let config = Configuration::new()
            .with("amount", Parameter::float(0.0, -1.0, 1.0))
            .with("mode", Parameter::choice(&["add", "multiply"], 0));
        Self { config }
    }
}

impl Default for RoughnessAdder {
    fn default() -> Self {
        Self::new()
    }
}

impl StageOp for RoughnessAdder {
    fn name(&self) -> &str {
        "roughness"
    }

    fn config(&self) -> &Configuration {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }
}

impl TextureOp for RoughnessAdder {
    fn apply(&mut self, input: &Artifact, _resolution: usize) -> Result<Artifact> {
        let Some(maps) = &input.maps else {
            warn!("roughness adder ran before any texture generator, passing through");
            return Ok(input.clone());
        };

        let amount = self.config.float_or("amount", 0.0);
        let multiply = self
            .config
            .get("mode")
            .and_then(Parameter::as_choice)
            .unwrap_or(0)
            == 1;

        let mut maps = maps.clone();
        for v in maps.roughness.data.iter_mut() {
            let adjusted = if multiply { *v * (1.0 + amount) } else { *v + amount };
            *v = adjusted.clamp(0.0, 1.0);
        }

        Ok(Artifact {
            mesh: input.mesh.clone(),
            maps: Some(maps),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Mesh;
    use crate::fieldgraph::{FieldGraph, FieldKind};

    fn bare_artifact() -> Artifact {
        Artifact::from_mesh(Mesh::new())
    }

    fn constant_graph(value: f32) -> FieldGraph {
        let mut graph = FieldGraph::new();
        let c = graph.insert(FieldKind::constant(value));
        graph.set_output(c).unwrap();
        graph
    }

    #[test]
    fn generator_fills_every_map_at_the_requested_resolution() {
        let mut op = FieldTextureGenerator::new(constant_graph(0.0));
        let output = op.apply(&bare_artifact(), 16).unwrap();
        let maps = output.maps.unwrap();

        assert_eq!(maps.resolution(), 16);
        assert_eq!(maps.displacement.data.len(), 256);
        assert!(maps.displacement.data.iter().all(|v| *v == 0.0));
        // Flat field, flat normals.
        assert!(maps.normal.data.iter().all(|c| c[2] > 0.99));
        assert!(maps.roughness.data.iter().all(|v| *v == 0.5));
        assert!(maps.metalness.data.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn negative_displacement_darkens_occlusion() {
        let mut op = FieldTextureGenerator::new(constant_graph(-1.0));
        let output = op.apply(&bare_artifact(), 8).unwrap();
        let maps = output.maps.unwrap();
        assert!(maps.ambient_occlusion.data.iter().all(|v| *v == 0.5));
    }

    #[test]
    fn full_strength_tint_replaces_the_albedo() {
        let mut generator = FieldTextureGenerator::new(constant_graph(0.0));
        let textured = generator.apply(&bare_artifact(), 8).unwrap();

        let mut tint = TintAdder::new();
        *tint.config_mut().get_mut("color").unwrap() =
            Parameter::vec3(glam::Vec3::new(1.0, 0.0, 0.0));
        tint.config_mut().get_mut("strength").unwrap().set_float(1.0);

        let output = tint.apply(&textured, 8).unwrap();
        let maps = output.maps.unwrap();
        for pixel in &maps.albedo.data {
            assert!((pixel[0] - 1.0).abs() < 1e-6);
            assert!(pixel[1].abs() < 1e-6);
        }
    }

    #[test]
    fn adders_pass_through_without_maps() {
        let mut tint = TintAdder::new();
        let output = tint.apply(&bare_artifact(), 8).unwrap();
        assert!(output.maps.is_none());

        let mut roughness = RoughnessAdder::new();
        let output = roughness.apply(&bare_artifact(), 8).unwrap();
        assert!(output.maps.is_none());
    }

    #[test]
    fn roughness_adjustment_is_clamped() {
        let mut generator = FieldTextureGenerator::new(constant_graph(0.0));
        let textured = generator.apply(&bare_artifact(), 4).unwrap();

        let mut op = RoughnessAdder::new();
        op.config_mut().get_mut("amount").unwrap().set_float(1.0);
        let output = op.apply(&textured, 4).unwrap();
        let maps = output.maps.unwrap();
        assert!(maps.roughness.data.iter().all(|v| *v == 1.0));
    }

    #[test]
    fn roughness_multiply_mode_scales_the_base() {
        let mut generator = FieldTextureGenerator::new(constant_graph(0.0));
        let textured = generator.apply(&bare_artifact(), 4).unwrap();

        let mut op = RoughnessAdder::new();
        op.config_mut().get_mut("amount").unwrap().set_float(-0.5);
        op.config_mut().get_mut("mode").unwrap().set_choice(1);
        let output = op.apply(&textured, 4).unwrap();
        let maps = output.maps.unwrap();
        // Base roughness 0.5 scaled by (1 - 0.5).
        assert!(maps.roughness.data.iter().all(|v| (*v - 0.25).abs() < 1e-6));
    }
}
