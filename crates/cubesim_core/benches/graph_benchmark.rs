//! # Neighbor Graph Benchmark
//!
//! Measures:
//! 1. `set_neighbor` churn (relinking a row of cubes)
//! 2. A full frame tick after a burst of changes
//!
//! Target: a tick over 255 cubes stays far below one 60 Hz frame.

#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use cubesim_core::{FrameCoordinator, GraphConfig, NeighborGraph, NodeId, NullSurface, RecordingEngine, Side};

fn build(capacity: usize) -> (Arc<NeighborGraph>, Vec<NodeId>) {
    let graph = Arc::new(NeighborGraph::new(capacity, GraphConfig::default()).expect("capacity"));
    let ids = (0..capacity)
        .map(|_| graph.register_node(Arc::new(NullSurface)).expect("register"))
        .collect();
    (graph, ids)
}

/// Relinks every cube to a shifted partner, producing remove+add pairs.
fn relink(graph: &NeighborGraph, ids: &[NodeId], shift: usize) {
    for (i, &node) in ids.iter().enumerate() {
        let other = ids[(i + shift) % ids.len()];
        if other != node {
            let _ = graph.set_neighbor(node, Side::Right, Some(other));
        }
    }
}

fn bench_set_neighbor(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_neighbor_churn");

    for cubes in [3, 32, 255] {
        group.bench_with_input(BenchmarkId::new("relink_row", cubes), &cubes, |b, &cubes| {
            // Fresh graph per batch so the event queue never grows unbounded.
            b.iter_batched(
                || build(cubes),
                |(graph, ids)| {
                    relink(black_box(&graph), &ids, 1);
                    relink(black_box(&graph), &ids, 2);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_tick");

    for cubes in [3, 32, 255] {
        let (graph, ids) = build(cubes);
        let mut frames = FrameCoordinator::new(Arc::clone(&graph));
        let mut engine = RecordingEngine::with_capacity(cubes);
        let mut shift = 1;

        group.bench_with_input(BenchmarkId::new("tick_after_relink", cubes), &cubes, |b, _| {
            b.iter(|| {
                shift = shift % (cubes - 1) + 1;
                relink(&graph, &ids, shift);
                let report = frames.tick(&mut engine, &|node: NodeId| {
                    black_box(node);
                });
                engine.delivered.clear();
                black_box(report)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_set_neighbor, bench_tick);
criterion_main!(benches);
