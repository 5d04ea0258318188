//! Artifact exporters: Wavefront OBJ for the mesh, PNG for the map bundle.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use image::{GrayImage, RgbImage};
use mesh_forge::prelude::{Artifact, Raster, RasterRgb};
use tracing::info;

/// Writes the artifact mesh as a Wavefront OBJ file.
pub fn write_obj(artifact: &Artifact, path: &Path) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating obj file {}", path.display()))?;
    let mut out = BufWriter::new(file);

    let mesh = &artifact.mesh;
    for p in &mesh.positions {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for uv in &mesh.uvs {
        writeln!(out, "vt {} {}", uv.x, uv.y)?;
    }
    for n in &mesh.normals {
        writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
    }

    let has_uvs = mesh.uvs.len() == mesh.positions.len();
    let has_normals = mesh.normals.len() == mesh.positions.len();
    for tri in mesh.indices.chunks_exact(3) {
        // OBJ indices are one-based.
        let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        match (has_uvs, has_normals) {
            (true, true) => writeln!(out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?,
            (true, false) => writeln!(out, "f {a}/{a} {b}/{b} {c}/{c}")?,
            (false, true) => writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?,
            (false, false) => writeln!(out, "f {a} {b} {c}")?,
        }
    }

    info!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "wrote {}",
        path.display()
    );
    Ok(())
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Writes a scalar raster as an 8-bit grayscale PNG.
pub fn write_gray_png(raster: &Raster, path: &Path) -> anyhow::Result<()> {
    let mut img = GrayImage::new(raster.width as u32, raster.height as u32);
    for (i, pixel) in img.pixels_mut().enumerate() {
        pixel.0 = [to_byte(raster.data[i])];
    }
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))
}

/// Writes an RGB raster as an 8-bit PNG.
pub fn write_rgb_png(raster: &RasterRgb, path: &Path) -> anyhow::Result<()> {
    let mut img = RgbImage::new(raster.width as u32, raster.height as u32);
    for (i, pixel) in img.pixels_mut().enumerate() {
        let c = raster.data[i];
        pixel.0 = [to_byte(c[0]), to_byte(c[1]), to_byte(c[2])];
    }
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))
}

/// Writes every texture map of an artifact next to `base` with a map suffix.
pub fn write_maps(artifact: &Artifact, dir: &Path, base: &str) -> anyhow::Result<()> {
    let Some(maps) = &artifact.maps else {
        anyhow::bail!("artifact carries no texture maps");
    };

    write_rgb_png(&maps.albedo, &dir.join(format!("{base}_albedo.png")))?;
    write_rgb_png(&maps.normal, &dir.join(format!("{base}_normal.png")))?;
    write_gray_png(&maps.roughness, &dir.join(format!("{base}_roughness.png")))?;
    write_gray_png(&maps.metalness, &dir.join(format!("{base}_metalness.png")))?;
    write_gray_png(&maps.ambient_occlusion, &dir.join(format!("{base}_ao.png")))?;

    // Displacement can be signed; remap into the printable range.
    let mut displacement = maps.displacement.clone();
    for v in displacement.data.iter_mut() {
        *v = *v * 0.5 + 0.5;
    }
    write_gray_png(&displacement, &dir.join(format!("{base}_displacement.png")))?;

    info!(resolution = maps.resolution(), "wrote texture maps for {base}");
    Ok(())
}
