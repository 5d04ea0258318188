mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use mesh_forge::prelude::{FieldGraph, FieldKind, FractalParams};

const CHAIN_DEPTHS: [usize; 4] = [1, 4, 16, 64];
const SAMPLE_COUNTS: [usize; 3] = [1_000, 10_000, 100_000];

fn make_chain_graph(depth: usize) -> FieldGraph {
    let mut graph = FieldGraph::new();
    let mut head = graph.insert(FieldKind::fbm(7));
    for i in 0..depth {
        let scale = graph.insert(FieldKind::scale(1.0 + i as f32 * 0.01));
        graph.connect(scale, 0, head).unwrap();
        head = scale;
    }
    let clamp = graph.insert(FieldKind::clamp(-1.0, 1.0));
    graph.connect(clamp, 0, head).unwrap();
    graph.set_output(clamp).unwrap();
    graph
}

fn make_blend_graph() -> FieldGraph {
    let mut graph = FieldGraph::new();
    let base = graph.insert(FieldKind::Fbm {
        params: FractalParams {
            octaves: 6,
            seed: 11,
            ..FractalParams::default()
        },
    });
    let detail = graph.insert(FieldKind::Ridged {
        params: FractalParams {
            octaves: 4,
            seed: 23,
            ..FractalParams::default()
        },
    });
    let t = graph.insert(FieldKind::constant(0.35));
    let mix = graph.insert(FieldKind::Mix);
    graph.connect(mix, 0, base).unwrap();
    graph.connect(mix, 1, detail).unwrap();
    graph.connect(mix, 2, t).unwrap();
    graph.set_output(mix).unwrap();
    graph
}

fn compose_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose/chain");
    for &depth in &CHAIN_DEPTHS {
        let graph = make_chain_graph(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let field = graph.compose().unwrap();
                black_box(field(Vec3::ZERO));
            });
        });
    }
    group.finish();
}

fn evaluate_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose/evaluate");
    let field = make_blend_graph().compose().unwrap();

    for &samples in &SAMPLE_COUNTS {
        group.throughput(common::samples_throughput(samples));
        group.bench_with_input(BenchmarkId::from_parameter(samples), &samples, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for i in 0..samples {
                    let t = i as f32 * 0.001;
                    sum += field(Vec3::new(t, t * 0.5, t * 0.25));
                }
                black_box(sum);
            });
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = common::field_criterion();
    targets = compose_benches, evaluate_benches
}
criterion_main!(benches);
