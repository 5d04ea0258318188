//! Parallel per-pixel raster fills.
//!
//! The pixel rows are statically partitioned into contiguous chunks, one per
//! available worker; each worker writes only its own disjoint slice and the
//! call joins before returning. Change-tracking state is never touched here,
//! so this is the only concurrent region in the crate.
use glam::Vec2;
use rayon::prelude::*;

use crate::artifact::{Raster, RasterRgb};
use crate::fieldgraph::ScalarField;

fn rows_per_chunk(height: usize) -> usize {
    let workers = rayon::current_num_threads().max(1);
    height.div_ceil(workers).max(1)
}

/// Fills a scalar raster by evaluating `pixel(x, y)` for every cell.
pub fn fill_scalar(raster: &mut Raster, pixel: impl Fn(usize, usize) -> f32 + Sync) {
    if raster.data.is_empty() {
        return;
    }
    let width = raster.width;
    let chunk_rows = rows_per_chunk(raster.height);

    raster
        .data
        .par_chunks_mut(chunk_rows * width)
        .enumerate()
        .for_each(|(chunk, slice)| {
            let base_row = chunk * chunk_rows;
            for (i, out) in slice.iter_mut().enumerate() {
                let x = i % width;
                let y = base_row + i / width;
                *out = pixel(x, y);
            }
        });
}

/// Fills an RGB raster by evaluating `pixel(x, y)` for every cell.
pub fn fill_rgb(raster: &mut RasterRgb, pixel: impl Fn(usize, usize) -> [f32; 3] + Sync) {
    if raster.data.is_empty() {
        return;
    }
    let width = raster.width;
    let chunk_rows = rows_per_chunk(raster.height);

    raster
        .data
        .par_chunks_mut(chunk_rows * width)
        .enumerate()
        .for_each(|(chunk, slice)| {
            let base_row = chunk * chunk_rows;
            for (i, out) in slice.iter_mut().enumerate() {
                let x = i % width;
                let y = base_row + i / width;
                *out = pixel(x, y);
            }
        });
}

/// Evaluates a scalar field over the unit UV square, one sample per cell
/// center, at the raster's resolution. The field is sampled in the z = 0
/// plane of its 3D domain.
pub fn fill_from_field(raster: &mut Raster, field: &ScalarField) {
    let (w, h) = (raster.width as f32, raster.height as f32);
    fill_scalar(raster, |x, y| {
        let uv = Vec2::new((x as f32 + 0.5) / w, (y as f32 + 0.5) / h);
        field(uv.extend(0.0))
    });
}

/// Derives a tangent-space normal map from a displacement raster using
/// central differences, encoded into [0, 1] RGB.
pub fn normals_from_displacement(displacement: &Raster, strength: f32) -> RasterRgb {
    let mut out = RasterRgb::new(displacement.width, displacement.height);
    fill_rgb(&mut out, |x, y| {
        let (x, y) = (x as isize, y as isize);
        let dx = displacement.get(x + 1, y) - displacement.get(x - 1, y);
        let dy = displacement.get(x, y + 1) - displacement.get(x, y - 1);
        let n = glam::Vec3::new(-dx * strength, -dy * strength, 1.0).normalize();
        [n.x * 0.5 + 0.5, n.y * 0.5 + 0.5, n.z * 0.5 + 0.5]
    });
    out
}
