// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use orthant_grid::Aabb;
use orthant_tree::{BoxQuadtree, BuildOptions, ExecutionPolicy, PointOctree};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // xorshift64
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn unit_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
    }
}

fn gen_points(n: usize, span: f64) -> Vec<[f64; 3]> {
    let mut rng = Rng::new(0x5eed);
    (0..n)
        .map(|_| {
            [
                rng.unit_f64() * span,
                rng.unit_f64() * span,
                rng.unit_f64() * span,
            ]
        })
        .collect()
}

fn gen_rects(n: usize, span: f64) -> Vec<Aabb<f64, 2>> {
    let mut rng = Rng::new(0xb0b);
    (0..n)
        .map(|_| {
            let x = rng.unit_f64() * span;
            let y = rng.unit_f64() * span;
            let w = 0.2 + rng.unit_f64() * span * 0.02;
            let h = 0.2 + rng.unit_f64() * span * 0.02;
            Aabb::new([x, y], [x + w, y + h])
        })
        .collect()
}

fn bench_point_build_and_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_octree");
    for &n in &[1_000_usize, 10_000] {
        let points = gen_points(n, 1_000.0);
        let options = BuildOptions {
            max_depth: 6,
            ..BuildOptions::default()
        };
        group.throughput(Throughput::Elements(n as u64));

        group.bench_function(format!("build_n{n}"), |b| {
            b.iter(|| {
                let tree = PointOctree::from_points(black_box(&points), &options).unwrap();
                black_box(tree.nodes().len());
            })
        });

        let tree = PointOctree::from_points(&points, &options).unwrap();
        let window = Aabb::new([100.0; 3], [300.0; 3]);
        group.bench_function(format!("range_n{n}"), |b| {
            b.iter(|| black_box(tree.range_search(&points, black_box(&window))))
        });
        group.bench_function(format!("knn10_n{n}"), |b| {
            b.iter(|| black_box(tree.nearest_neighbors(&points, black_box(&[500.0; 3]), 10)))
        });
    }
    group.finish();
}

fn bench_box_build_and_collide(c: &mut Criterion) {
    let mut group = c.benchmark_group("box_quadtree");
    for &n in &[1_000_usize, 10_000] {
        let rects = gen_rects(n, 1_000.0);
        let options = BuildOptions {
            max_depth: 6,
            ..BuildOptions::default()
        };
        group.throughput(Throughput::Elements(n as u64));

        for (label, policy) in [
            ("sequential", ExecutionPolicy::Sequential),
            ("parallel", ExecutionPolicy::Parallel),
        ] {
            group.bench_function(format!("build_{label}_n{n}"), |b| {
                b.iter_batched(
                    || BuildOptions { policy, ..options.clone() },
                    |opts| {
                        let tree = BoxQuadtree::from_boxes(black_box(&rects), &opts).unwrap();
                        black_box(tree.nodes().len());
                    },
                    BatchSize::SmallInput,
                )
            });
        }

        let tree = BoxQuadtree::from_boxes(&rects, &options).unwrap();
        group.bench_function(format!("collisions_n{n}"), |b| {
            b.iter(|| black_box(tree.collision_detection(&rects, ExecutionPolicy::Sequential)))
        });
        let window = Aabb::new([100.0, 100.0], [300.0, 300.0]);
        group.bench_function(format!("range_n{n}"), |b| {
            b.iter(|| black_box(tree.range_search(&rects, black_box(&window), false)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_point_build_and_query, bench_box_build_and_collide);
criterion_main!(benches);
