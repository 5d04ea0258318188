//! The artifact data model: the mesh and raster maps flowing between stages.
//!
//! An [`Artifact`] is an immutable snapshot once produced. Stages receive the
//! previous artifact behind an [`std::sync::Arc`] and either hand it through
//! untouched (disabled) or build a fresh artifact for the next consumer; they
//! never mutate the one they were given.
use glam::{Vec2, Vec3};

/// An indexed triangle mesh with per-vertex attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Triangle index list, three indices per face.
    pub indices: Vec<u32>,
    /// Per-vertex UV coordinates. Empty until a parameterizer ran.
    pub uvs: Vec<Vec2>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Recomputes smooth per-vertex normals from face geometry. Returns
    /// `false` when the index list is not a whole number of triangles.
    pub fn compute_normals(&mut self) -> bool {
        if self.indices.len() % 3 != 0 || self.positions.is_empty() {
            return false;
        }

        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            if i0 >= self.positions.len() || i1 >= self.positions.len() || i2 >= self.positions.len()
            {
                continue;
            }
            let normal = (self.positions[i1] - self.positions[i0])
                .cross(self.positions[i2] - self.positions[i0]);
            accum[i0] += normal;
            accum[i1] += normal;
            accum[i2] += normal;
        }

        self.normals = accum
            .into_iter()
            .map(|n| {
                let len = n.length();
                if len > 0.0 {
                    n / len
                } else {
                    Vec3::Y
                }
            })
            .collect();
        true
    }

    /// Axis-aligned bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter();
        let first = *iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            min = min.min(*p);
            max = max.max(*p);
        }
        Some((min, max))
    }
}

/// A square scalar raster map.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Raster {
    /// Creates a raster of the given size, initialized to zero.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Creates a raster filled with a constant value.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Value at pixel indices, `0.0` outside the bounds.
    pub fn get(&self, x: isize, y: isize) -> f32 {
        if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
            return 0.0;
        }
        self.data[y as usize * self.width + x as usize]
    }

    /// Nearest-cell sample at UV coordinates in [0, 1].
    pub fn sample_uv(&self, uv: Vec2) -> f32 {
        let x = (uv.x * self.width as f32).floor() as isize;
        let y = (uv.y * self.height as f32).floor() as isize;
        self.get(
            x.clamp(0, self.width as isize - 1),
            y.clamp(0, self.height as isize - 1),
        )
    }
}

/// A square RGB raster map.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterRgb {
    pub width: usize,
    pub height: usize,
    pub data: Vec<[f32; 3]>,
}

impl RasterRgb {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![[0.0; 3]; width * height],
        }
    }

    pub fn filled(width: usize, height: usize, color: [f32; 3]) -> Self {
        Self {
            width,
            height,
            data: vec![color; width * height],
        }
    }
}

/// The bundle of derived raster maps produced by the texturing stages.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureMaps {
    pub albedo: RasterRgb,
    pub normal: RasterRgb,
    pub roughness: Raster,
    pub metalness: Raster,
    pub ambient_occlusion: Raster,
    pub displacement: Raster,
}

impl TextureMaps {
    /// Creates a neutral map bundle at the given square resolution.
    pub fn new(resolution: usize) -> Self {
        Self {
            albedo: RasterRgb::filled(resolution, resolution, [0.5, 0.5, 0.5]),
            // Flat tangent-space normal.
            normal: RasterRgb::filled(resolution, resolution, [0.5, 0.5, 1.0]),
            roughness: Raster::filled(resolution, resolution, 0.5),
            metalness: Raster::new(resolution, resolution),
            ambient_occlusion: Raster::filled(resolution, resolution, 1.0),
            displacement: Raster::new(resolution, resolution),
        }
    }

    pub fn resolution(&self) -> usize {
        self.albedo.width
    }
}

/// The value passed between pipeline stages: a mesh plus optional texture
/// maps. Texture maps appear once the texture generator has run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Artifact {
    pub mesh: Mesh,
    pub maps: Option<TextureMaps>,
}

impl Artifact {
    pub fn from_mesh(mesh: Mesh) -> Self {
        Self { mesh, maps: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Mesh {
        Mesh {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            normals: Vec::new(),
            indices: vec![0, 1, 2],
            uvs: Vec::new(),
        }
    }

    #[test]
    fn compute_normals_produces_unit_vectors() {
        let mut mesh = unit_triangle();
        assert!(mesh.compute_normals());
        assert_eq!(mesh.normals.len(), 3);
        for n in &mesh.normals {
            assert!((n.length() - 1.0).abs() < 1e-6);
        }
        // Winding 0->1->2 with these positions faces -Y.
        assert!(mesh.normals[0].y < 0.0);
    }

    #[test]
    fn compute_normals_rejects_ragged_indices() {
        let mut mesh = unit_triangle();
        mesh.indices.push(1);
        assert!(!mesh.compute_normals());
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let mesh = unit_triangle();
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn raster_sampling_clamps_to_edges() {
        let mut raster = Raster::new(2, 2);
        raster.data = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(raster.sample_uv(Vec2::new(0.0, 0.0)), 1.0);
        assert_eq!(raster.sample_uv(Vec2::new(1.0, 1.0)), 4.0);
        assert_eq!(raster.sample_uv(Vec2::new(-5.0, 5.0)), 3.0);
        assert_eq!(raster.get(-1, 0), 0.0);
    }

    #[test]
    fn texture_maps_start_neutral() {
        let maps = TextureMaps::new(4);
        assert_eq!(maps.resolution(), 4);
        assert!(maps.ambient_occlusion.data.iter().all(|v| *v == 1.0));
        assert!(maps.normal.data.iter().all(|c| *c == [0.5, 0.5, 1.0]));
    }
}
