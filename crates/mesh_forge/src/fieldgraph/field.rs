//! Scalar field primitives: the composed-function type and noise leaves.
//!
//! A [`ScalarField`] is the unit of composition for the field graph: a shared
//! `Vec3 -> f32` function. Noise leaves are permutation-table Perlin noise
//! plus fractal accumulation (fBm and ridged), seeded deterministically so a
//! composed graph evaluates identically across runs.
use std::sync::Arc;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// A composed scalar field, evaluable at any point in space.
pub type ScalarField = Arc<dyn Fn(Vec3) -> f32 + Send + Sync>;

/// A field that returns `value` everywhere.
pub fn constant(value: f32) -> ScalarField {
    Arc::new(move |_| value)
}

/// Parameters shared by the fractal noise leaves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractalParams {
    /// Number of octaves to accumulate.
    pub octaves: u32,
    /// Base frequency of the first octave.
    pub frequency: f32,
    /// Frequency multiplier per octave.
    pub lacunarity: f32,
    /// Amplitude decay per octave.
    pub persistence: f32,
    /// Seed for the permutation tables.
    pub seed: u64,
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            octaves: 6,
            frequency: 2.0,
            lacunarity: 2.0,
            persistence: 0.5,
            seed: 42,
        }
    }
}

/// Classic 3D gradient noise over a seeded permutation table.
/// Output is in approximately [-1, 1].
#[derive(Clone, Debug)]
pub struct Perlin {
    perm: Vec<u8>,
}

impl Perlin {
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut StdRng::seed_from_u64(seed));
        let mut perm = Vec::with_capacity(512);
        perm.extend_from_slice(&table);
        perm.extend_from_slice(&table);
        Self { perm }
    }

    fn fade(t: f32) -> f32 {
        t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
    }

    fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + t * (b - a)
    }

    fn grad(hash: u8, x: f32, y: f32, z: f32) -> f32 {
        let h = hash & 15;
        let u = if h < 8 { x } else { y };
        let v = if h < 4 {
            y
        } else if h == 12 || h == 14 {
            x
        } else {
            z
        };
        let u = if h & 1 == 0 { u } else { -u };
        let v = if h & 2 == 0 { v } else { -v };
        u + v
    }

    pub fn sample(&self, p: Vec3) -> f32 {
        let xi = p.x.floor() as i32 & 255;
        let yi = p.y.floor() as i32 & 255;
        let zi = p.z.floor() as i32 & 255;
        let x = p.x - p.x.floor();
        let y = p.y - p.y.floor();
        let z = p.z - p.z.floor();

        let u = Self::fade(x);
        let v = Self::fade(y);
        let w = Self::fade(z);

        let perm = &self.perm;
        let idx = |i: i32| perm[(i & 511) as usize] as i32;

        let a = idx(xi) + yi;
        let aa = idx(a) + zi;
        let ab = idx(a + 1) + zi;
        let b = idx(xi + 1) + yi;
        let ba = idx(b) + zi;
        let bb = idx(b + 1) + zi;

        let g = |i: i32, dx: f32, dy: f32, dz: f32| Self::grad(perm[(i & 511) as usize], dx, dy, dz);

        let x0 = Self::lerp(g(aa, x, y, z), g(ba, x - 1.0, y, z), u);
        let x1 = Self::lerp(g(ab, x, y - 1.0, z), g(bb, x - 1.0, y - 1.0, z), u);
        let y0 = Self::lerp(x0, x1, v);

        let x2 = Self::lerp(g(aa + 1, x, y, z - 1.0), g(ba + 1, x - 1.0, y, z - 1.0), u);
        let x3 = Self::lerp(
            g(ab + 1, x, y - 1.0, z - 1.0),
            g(bb + 1, x - 1.0, y - 1.0, z - 1.0),
            u,
        );
        let y1 = Self::lerp(x2, x3, v);

        Self::lerp(y0, y1, w)
    }
}

/// Single-octave Perlin field at the given frequency.
pub fn perlin(frequency: f32, seed: u64) -> ScalarField {
    let noise = Perlin::new(seed);
    Arc::new(move |p| noise.sample(p * frequency))
}

fn octave_tables(params: &FractalParams) -> Vec<Perlin> {
    // Each octave gets its own table so octaves decorrelate.
    (0..params.octaves.max(1))
        .map(|octave| Perlin::new(params.seed.wrapping_add(octave as u64 * 31337)))
        .collect()
}

/// Fractal Brownian motion over stacked Perlin octaves, normalized to
/// approximately [-1, 1].
pub fn fbm(params: &FractalParams) -> ScalarField {
    let tables = octave_tables(params);
    let params = *params;
    Arc::new(move |p| {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = params.frequency;
        let mut max_amplitude = 0.0;
        for table in &tables {
            total += table.sample(p * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= params.persistence;
            frequency *= params.lacunarity;
        }
        total / max_amplitude
    })
}

/// Ridged multifractal: inverted absolute noise, sharp crest lines.
/// Output is in approximately [0, 1].
pub fn ridged(params: &FractalParams) -> ScalarField {
    let tables = octave_tables(params);
    let params = *params;
    Arc::new(move |p| {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = params.frequency;
        let mut max_amplitude = 0.0;
        for table in &tables {
            let ridge = 1.0 - table.sample(p * frequency).abs();
            total += ridge * ridge * amplitude;
            max_amplitude += amplitude;
            amplitude *= params.persistence;
            frequency *= params.lacunarity;
        }
        total / max_amplitude
    })
}
