//! Scene parameter files and pipeline assembly.
//!
//! A scene file is a JSON description of one pipeline: the generator shape,
//! its noise parameters, optional modifier and adder layers, and the texture
//! field. The core never reads files itself; this module is the external
//! editor role, building the pipeline and marking stages changed.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use mesh_forge::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorShape {
    Plane,
    Sphere,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplaceParams {
    pub strength: f32,
    pub noise: FractalParams,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TintParams {
    pub color: [f32; 3],
    pub strength: f32,
}

/// One full pipeline description.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneParams {
    pub generator: GeneratorShape,
    /// Grid cells for a plane, rows for a sphere.
    pub mesh_resolution: i32,
    pub amplitude: f32,
    pub surface_noise: FractalParams,
    #[serde(default)]
    pub displace: Option<DisplaceParams>,
    pub texture_noise: FractalParams,
    #[serde(default)]
    pub tint: Option<TintParams>,
    #[serde(default)]
    pub roughness_offset: Option<f32>,
    #[serde(default = "default_texture_resolution")]
    pub texture_resolution: usize,
}

fn default_texture_resolution() -> usize {
    DEFAULT_TEXTURE_RESOLUTION
}

impl Default for SceneParams {
    fn default() -> Self {
        Self {
            generator: GeneratorShape::Plane,
            mesh_resolution: 64,
            amplitude: 0.5,
            surface_noise: FractalParams::default(),
            displace: None,
            texture_noise: FractalParams {
                seed: 7,
                ..FractalParams::default()
            },
            tint: None,
            roughness_offset: None,
            texture_resolution: DEFAULT_TEXTURE_RESOLUTION,
        }
    }
}

impl SceneParams {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scene file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing scene file {}", path.display()))
    }
}

/// Resolves a path to the scene files it names: a file stands for itself, a
/// directory for every `.json` file directly inside it, sorted by name.
pub fn scene_files(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let entries = fs::read_dir(path)
        .with_context(|| format!("reading scene folder {}", path.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    if files.is_empty() {
        anyhow::bail!("no scene files (*.json) in {}", path.display());
    }
    Ok(files)
}

fn fractal_graph(params: &FractalParams) -> FieldGraph {
    let mut graph = FieldGraph::new();
    let noise = graph.insert(FieldKind::Fbm { params: *params });
    let clamp = graph.insert(FieldKind::clamp(-1.0, 1.0));
    // connect and set_output cannot fail on ids this graph just handed out.
    let _ = graph.connect(clamp, 0, noise);
    let _ = graph.set_output(clamp);
    graph
}

/// Builds a ready-to-run pipeline from scene parameters.
pub fn build_pipeline(scene: &SceneParams) -> Pipeline {
    let surface = fractal_graph(&scene.surface_noise);

    let (generator, parameterizer): (Box<dyn GeneratorOp>, Box<dyn SurfaceOp>) =
        match scene.generator {
            GeneratorShape::Plane => {
                let mut op = PlaneGenerator::new(surface);
                if let Some(cell) = op.config_mut().get_mut("resolution") {
                    cell.set_int(scene.mesh_resolution);
                }
                if let Some(cell) = op.config_mut().get_mut("amplitude") {
                    cell.set_float(scene.amplitude);
                }
                (Box::new(op), Box::new(PlanarParameterizer::new()))
            }
            GeneratorShape::Sphere => {
                let mut op = SphereGenerator::new(surface);
                if let Some(cell) = op.config_mut().get_mut("rows") {
                    cell.set_int(scene.mesh_resolution);
                }
                if let Some(cell) = op.config_mut().get_mut("columns") {
                    cell.set_int(scene.mesh_resolution * 2);
                }
                if let Some(cell) = op.config_mut().get_mut("amplitude") {
                    cell.set_float(scene.amplitude);
                }
                (Box::new(op), Box::new(SphericalParameterizer::new()))
            }
        };

    let texture = Box::new(FieldTextureGenerator::new(fractal_graph(
        &scene.texture_noise,
    )));

    let mut pipeline = Pipeline::new(generator, parameterizer, texture);
    pipeline.set_texture_resolution(scene.texture_resolution);

    if let Some(displace) = &scene.displace {
        let mut op = DisplaceModifier::new(fractal_graph(&displace.noise));
        if let Some(cell) = op.config_mut().get_mut("strength") {
            cell.set_float(displace.strength);
        }
        pipeline.add_modifier(Box::new(op));
    }

    if let Some(tint) = &scene.tint {
        let mut op = TintAdder::new();
        if let Some(cell) = op.config_mut().get_mut("color") {
            *cell = Parameter::vec3(glam::Vec3::from_array(tint.color));
        }
        if let Some(cell) = op.config_mut().get_mut("strength") {
            cell.set_float(tint.strength);
        }
        pipeline.add_texture_adder(Box::new(op));
    }

    if let Some(offset) = scene.roughness_offset {
        let mut op = RoughnessAdder::new();
        if let Some(cell) = op.config_mut().get_mut("amount") {
            cell.set_float(offset);
        }
        pipeline.add_texture_adder(Box::new(op));
    }

    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_builds_a_runnable_pipeline() {
        let mut pipeline = build_pipeline(&SceneParams::default());
        let artifact = pipeline.current_artifact().unwrap();
        assert!(artifact.mesh.vertex_count() > 0);
        assert!(artifact.maps.is_some());
        assert!(!artifact.mesh.uvs.is_empty());
    }

    #[test]
    fn scene_round_trips_through_json() {
        let scene = SceneParams {
            generator: GeneratorShape::Sphere,
            displace: Some(DisplaceParams {
                strength: 0.3,
                noise: FractalParams::default(),
            }),
            ..SceneParams::default()
        };
        let text = serde_json::to_string_pretty(&scene).unwrap();
        let back: SceneParams = serde_json::from_str(&text).unwrap();
        assert_eq!(back.generator, GeneratorShape::Sphere);
        assert!(back.displace.is_some());
    }

    #[test]
    fn scene_folder_lists_json_files_sorted() {
        let dir = std::env::temp_dir().join(format!("mesh_forge_scenes_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("b.json"), "{}").unwrap();
        fs::write(dir.join("a.json"), "{}").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let files = scene_files(&dir).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);

        // A single file resolves to itself.
        let single = scene_files(&dir.join("a.json")).unwrap();
        assert_eq!(single.len(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_scene_folder_is_an_error() {
        let dir = std::env::temp_dir().join(format!("mesh_forge_empty_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        assert!(scene_files(&dir).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn optional_layers_add_stages() {
        let mut scene = SceneParams::default();
        assert_eq!(build_pipeline(&scene).stage_count(), 3);
        scene.displace = Some(DisplaceParams {
            strength: 0.2,
            noise: FractalParams::default(),
        });
        scene.tint = Some(TintParams {
            color: [1.0, 0.0, 0.0],
            strength: 0.5,
        });
        scene.roughness_offset = Some(0.1);
        assert_eq!(build_pipeline(&scene).stage_count(), 6);
    }
}
