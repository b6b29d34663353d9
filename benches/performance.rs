// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use csgtopo::geometry::{
    group_face_loops, EdgeAdjacencyIndex, FaceLoop, FaceLoopList, IndexedPoint, PointPolicy,
    SeamEdgeSet, SpatialTree,
};
use csgtopo::TreeConfig;
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_points(count: usize) -> Vec<IndexedPoint<3>> {
    let mut rng = StdRng::seed_from_u64(1);
    (0..count)
        .map(|id| {
            IndexedPoint::new(
                id,
                Point3::new(rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()),
            )
        })
        .collect()
}

/// Quad grid of `n` x `n` faces, all from one source
fn quad_grid(n: usize) -> FaceLoopList {
    let v = |row: usize, col: usize| row * (n + 1) + col;
    let mut loops = FaceLoopList::new();
    for row in 0..n {
        for col in 0..n {
            loops.push(FaceLoop::from_indices(
                0,
                &[v(row, col), v(row, col + 1), v(row + 1, col + 1), v(row + 1, col)],
            ));
        }
    }
    loops
}

fn bench_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_tree");

    for count in [1_000, 10_000] {
        let points = random_points(count);
        group.bench_with_input(BenchmarkId::new("build", count), &points, |b, points| {
            b.iter(|| {
                SpatialTree::<PointPolicy, 3>::from_items(
                    PointPolicy,
                    black_box(points.iter().copied()),
                    &TreeConfig::default(),
                )
            });
        });

        let tree: SpatialTree<PointPolicy, 3> =
            SpatialTree::from_items(PointPolicy, points.iter().copied(), &TreeConfig::default());
        group.bench_with_input(BenchmarkId::new("k_nearest_16", count), &tree, |b, tree| {
            b.iter(|| tree.k_nearest(black_box(Point3::new(0.5, 0.5, 0.5)), 16));
        });
    }

    group.finish();
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");

    for n in [32, 128] {
        let loops = quad_grid(n);
        let index = EdgeAdjacencyIndex::build(&loops);
        let seams = SeamEdgeSet::new();
        group.bench_with_input(BenchmarkId::new("quad_grid", n * n), &loops, |b, loops| {
            b.iter(|| group_face_loops(black_box(loops), &index, &seams));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tree, bench_grouping);
criterion_main!(benches);
