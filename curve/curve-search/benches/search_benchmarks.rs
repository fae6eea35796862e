//! Benchmarks for curve-search.
//!
//! Run with: cargo bench -p curve-search
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p curve-search -- --save-baseline main
//! 2. After changes: cargo bench -p curve-search -- --baseline main

#![allow(
    clippy::unwrap_used,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

use ce_grid::{GridMesh, MeshMask, Point, Volume};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use curve_search::{ConnectivityTable, Segmenter};
use curve_types::{DataType, InstanceSettings, SegmentationRequest};

// =============================================================================
// Test Volume Generation
// =============================================================================

/// A cube with a bright helical tube through an otherwise costly background.
fn helix_volume(size: usize) -> Volume<f64> {
    let mesh = GridMesh::new(size, size, size).unwrap();
    let half = size as f64 / 2.0;
    let radius = half * 0.6;
    Volume::from_fn(mesh, |p| {
        let t = f64::from(p.z) / size as f64 * std::f64::consts::TAU;
        let cx = radius.mul_add(t.cos(), half);
        let cy = radius.mul_add(t.sin(), half);
        let d = (f64::from(p.x) - cx).hypot(f64::from(p.y) - cy);
        if d < 1.5 { 0.05 } else { 1.0 }
    })
}

fn endpoints(size: usize) -> SegmentationRequest {
    let half = size as f64 / 2.0;
    let radius = half * 0.6;
    let start = Point::new((half + radius) as i32, half as i32, 0);
    let end = Point::new((half + radius) as i32, half as i32, size as i32 - 1);
    SegmentationRequest::new(start, end)
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_graphs(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph");
    group.sample_size(10);

    let size = 16;
    let data = helix_volume(size);
    let mask = MeshMask::all_free(*data.mesh());
    let table = ConnectivityTable::full_neighbors();
    let request = endpoints(size);
    let base = InstanceSettings::new()
        .with_data_type(DataType::Nearest)
        .with_length_penalty(0.1)
        .with_num_threads(1);

    let variants = [
        ("node", base),
        ("edge", base.with_curvature_penalty(0.5)),
        ("edge_pair", base.with_curvature_penalty(0.5).with_torsion_penalty(0.2)),
    ];

    for (name, settings) in variants {
        let segmenter = Segmenter::new(&data, &mask, &table, &settings).unwrap();
        group.bench_with_input(BenchmarkId::new("segment", name), &request, |b, request| {
            b.iter(|| segmenter.segment(black_box(request)).unwrap());
        });
    }

    group.finish();
}

fn bench_a_star(c: &mut Criterion) {
    let mut group = c.benchmark_group("a_star");

    for size in [16, 32] {
        let data = helix_volume(size);
        let mask = MeshMask::all_free(*data.mesh());
        let table = ConnectivityTable::full_neighbors();
        let request = endpoints(size);
        group.throughput(Throughput::Elements(data.mesh().len() as u64));

        for use_a_star in [false, true] {
            let settings = InstanceSettings::new()
                .with_length_penalty(0.1)
                .with_use_a_star(use_a_star);
            let segmenter = Segmenter::new(&data, &mask, &table, &settings).unwrap();
            let id = if use_a_star { "a_star" } else { "dijkstra" };
            group.bench_with_input(BenchmarkId::new(id, size), &request, |b, request| {
                b.iter(|| segmenter.segment(black_box(request)).unwrap());
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_graphs, bench_a_star);
criterion_main!(benches);
