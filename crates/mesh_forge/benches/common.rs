use std::time::Duration;

use criterion::{Criterion, Throughput};

/// Criterion tuned for whole pipeline ticks: few samples over a generous
/// window, since a single tick at 512 px costs milliseconds.
pub fn tick_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(10)
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(4))
}

/// Criterion tuned for graph composition and field evaluation, which are
/// cheap enough to sample densely.
pub fn field_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(40)
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_secs(2))
}

/// Pixel throughput of one square raster fill.
#[allow(dead_code)]
pub fn pixels_throughput(resolution: usize) -> Throughput {
    Throughput::Elements((resolution * resolution).max(1) as u64)
}

/// Sample throughput of a field evaluation loop.
#[allow(dead_code)]
pub fn samples_throughput(samples: usize) -> Throughput {
    Throughput::Elements(samples.max(1) as u64)
}
