// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Randomized equivalence tests against brute-force linear scans.
//!
//! Every query the trees accelerate has an obvious O(n) or O(n^2)
//! reference; seeded inputs keep failures reproducible.

use alloc::vec::Vec;

use rand::prelude::*;
use rand::rngs::StdRng;

use orthant_grid::{Aabb, point_distance_squared};

use crate::build::{BuildOptions, ExecutionPolicy};
use crate::node::EntityId;
use crate::traversal::OrdScalar;
use crate::{BoxQuadtree, PointOctree, PointTree};

fn random_points(rng: &mut StdRng, n: usize) -> Vec<[f64; 3]> {
    (0..n)
        .map(|_| [rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)])
        .collect()
}

fn random_boxes(rng: &mut StdRng, n: usize) -> Vec<Aabb<f64, 2>> {
    (0..n)
        .map(|_| {
            let x = rng.gen_range(0.0..90.0);
            let y = rng.gen_range(0.0..90.0);
            let w = rng.gen_range(0.1..12.0);
            let h = rng.gen_range(0.1..12.0);
            Aabb::new([x, y], [x + w, y + h])
        })
        .collect()
}

fn point_options() -> BuildOptions<Aabb<f64, 3>> {
    BuildOptions {
        max_depth: 4,
        max_elements_per_node: 4,
        ..BuildOptions::default()
    }
}

fn box_options(split_depth: u8) -> BuildOptions<Aabb<f64, 2>> {
    BuildOptions {
        max_depth: 4,
        max_elements_per_node: 4,
        split_depth,
        ..BuildOptions::default()
    }
}

#[test]
fn range_search_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(11);
    let points = random_points(&mut rng, 400);
    let tree = PointOctree::from_points(&points, &point_options()).unwrap();

    for _ in 0..40 {
        let lo = [rng.gen_range(0.0..80.0), rng.gen_range(0.0..80.0), rng.gen_range(0.0..80.0)];
        let query = Aabb::new(lo, [lo[0] + 25.0, lo[1] + 25.0, lo[2] + 25.0]);
        let expected: Vec<EntityId> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| query.contains_point(p))
            .map(|(i, _)| i as EntityId)
            .collect();
        assert_eq!(tree.range_search(&points, &query), expected);
    }
}

#[test]
fn nearest_neighbors_matches_k_smallest() {
    let mut rng = StdRng::seed_from_u64(12);
    let points = random_points(&mut rng, 300);
    let tree = PointOctree::from_points(&points, &point_options()).unwrap();

    for _ in 0..25 {
        let q = [rng.gen_range(-10.0..110.0), rng.gen_range(-10.0..110.0), rng.gen_range(-10.0..110.0)];
        let k = rng.gen_range(1..12_usize);
        let mut expected: Vec<(OrdScalar<f64>, EntityId)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (OrdScalar(point_distance_squared(p, &q)), i as EntityId))
            .collect();
        expected.sort_unstable();
        let expected: Vec<EntityId> = expected.into_iter().take(k).map(|(_, i)| i).collect();
        assert_eq!(tree.nearest_neighbors(&points, &q, k), expected);
    }
}

#[test]
fn point_plane_queries_match_linear_scan() {
    let mut rng = StdRng::seed_from_u64(13);
    let points = random_points(&mut rng, 250);
    let tree = PointOctree::from_points(&points, &point_options()).unwrap();

    for _ in 0..20 {
        let normal = [1.0, rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)];
        let offset = rng.gen_range(10.0..90.0);
        let tolerance = rng.gen_range(0.0..5.0);
        let dist = |p: &[f64; 3]| normal[0] * p[0] + normal[1] * p[1] + normal[2] * p[2] - offset;

        let banded: Vec<EntityId> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| dist(p).abs() <= tolerance)
            .map(|(i, _)| i as EntityId)
            .collect();
        assert_eq!(
            tree.plane_search(&points, &normal, offset, tolerance),
            banded
        );

        let positive: Vec<EntityId> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| dist(p) >= -tolerance)
            .map(|(i, _)| i as EntityId)
            .collect();
        assert_eq!(
            tree.plane_positive_segmentation(&points, &normal, offset, tolerance),
            positive
        );
    }
}

#[test]
fn frustum_culling_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(14);
    let points = random_points(&mut rng, 250);
    let tree = PointOctree::from_points(&points, &point_options()).unwrap();

    let planes = alloc::vec![
        ([1.0, 0.0, 0.0], 20.0),
        ([-1.0, 0.0, 0.0], -80.0),
        ([0.0, 1.0, 0.0], 30.0),
        ([0.0, 0.0, -1.0], -70.0),
    ];
    let expected: Vec<EntityId> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            planes
                .iter()
                .all(|(n, o)| n[0] * p[0] + n[1] * p[1] + n[2] * p[2] - o >= 0.0)
        })
        .map(|(i, _)| i as EntityId)
        .collect();
    assert_eq!(tree.frustum_culling(&points, &planes, 0.0), expected);
}

#[test]
fn box_range_search_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(21);
    let boxes = random_boxes(&mut rng, 300);
    for split_depth in [0, 2] {
        let tree = BoxQuadtree::from_boxes(&boxes, &box_options(split_depth)).unwrap();
        for _ in 0..30 {
            let lo = [rng.gen_range(0.0..70.0), rng.gen_range(0.0..70.0)];
            let query = Aabb::new(lo, [lo[0] + 30.0, lo[1] + 30.0]);

            let overlapping: Vec<EntityId> = boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| query.overlaps_strictly(b))
                .map(|(i, _)| i as EntityId)
                .collect();
            assert_eq!(tree.range_search(&boxes, &query, false), overlapping);

            let contained: Vec<EntityId> = boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| query.contains_box(b))
                .map(|(i, _)| i as EntityId)
                .collect();
            assert_eq!(tree.range_search(&boxes, &query, true), contained);
        }
    }
}

#[test]
fn pick_search_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(22);
    let boxes = random_boxes(&mut rng, 300);
    let tree = BoxQuadtree::from_boxes(&boxes, &box_options(2)).unwrap();

    for _ in 0..60 {
        let at = [rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)];
        let expected: Vec<EntityId> = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.contains_point(&at))
            .map(|(i, _)| i as EntityId)
            .collect();
        assert_eq!(tree.pick_search(&boxes, &at), expected);
    }
}

#[test]
fn collision_detection_matches_all_pairs() {
    let mut rng = StdRng::seed_from_u64(23);
    let boxes = random_boxes(&mut rng, 220);
    let mut expected: Vec<(EntityId, EntityId)> = Vec::new();
    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            if boxes[i].overlaps_strictly(&boxes[j]) {
                expected.push((i as EntityId, j as EntityId));
            }
        }
    }
    for split_depth in [0, 1, 2] {
        let tree = BoxQuadtree::from_boxes(&boxes, &box_options(split_depth)).unwrap();
        assert_eq!(
            tree.collision_detection(&boxes, ExecutionPolicy::Sequential),
            expected,
            "split depth {split_depth}"
        );
        assert_eq!(
            tree.collision_detection(&boxes, ExecutionPolicy::Parallel),
            expected,
            "split depth {split_depth}, parallel"
        );
    }
}

#[test]
fn ray_hits_match_linear_scan() {
    let mut rng = StdRng::seed_from_u64(24);
    let boxes = random_boxes(&mut rng, 200);
    let tree = BoxQuadtree::from_boxes(&boxes, &box_options(2)).unwrap();

    for _ in 0..40 {
        let origin = [rng.gen_range(-20.0..120.0), rng.gen_range(-20.0..120.0)];
        let dir = [rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)];
        if dir == [0.0, 0.0] {
            continue;
        }
        let mut expected: Vec<(OrdScalar<f64>, EntityId)> = boxes
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.ray_entry(&origin, &dir, 0.0).map(|t| (OrdScalar(t), i as EntityId)))
            .collect();
        expected.sort_unstable();

        let hits = tree.ray_intersected_all(&boxes, &origin, &dir, 0.0);
        let got: Vec<(OrdScalar<f64>, EntityId)> =
            hits.iter().map(|&(id, t)| (OrdScalar(t), id)).collect();
        assert_eq!(got, expected);
        assert_eq!(
            tree.ray_intersected_first(&boxes, &origin, &dir, 0.0),
            expected.first().map(|&(_, id)| id)
        );
    }
}

#[test]
fn box_plane_queries_match_linear_scan() {
    let mut rng = StdRng::seed_from_u64(25);
    let boxes = random_boxes(&mut rng, 250);
    let tree = BoxQuadtree::from_boxes(&boxes, &box_options(2)).unwrap();

    for _ in 0..20 {
        let normal = [rng.gen_range(-1.0..1.0_f64).max(0.05), rng.gen_range(-1.0..1.0)];
        let offset = rng.gen_range(5.0..95.0);
        let tolerance = rng.gen_range(0.0..4.0);

        let crossing: Vec<EntityId> = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| {
                let (lo, hi) = b.plane_distance_range(&normal, offset);
                lo <= tolerance && hi >= -tolerance
            })
            .map(|(i, _)| i as EntityId)
            .collect();
        assert_eq!(
            tree.plane_intersection(&boxes, &normal, offset, tolerance),
            crossing
        );

        let positive: Vec<EntityId> = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.plane_distance_range(&normal, offset).0 >= -tolerance)
            .map(|(i, _)| i as EntityId)
            .collect();
        assert_eq!(
            tree.plane_positive_segmentation(&boxes, &normal, offset, tolerance),
            positive
        );
    }
}

#[test]
fn edit_round_trip_restores_random_trees() {
    let mut rng = StdRng::seed_from_u64(26);
    let boxes = random_boxes(&mut rng, 120);
    let original = BoxQuadtree::from_boxes(&boxes, &box_options(2)).unwrap();
    let mut edited = original.clone();
    for _ in 0..30 {
        let id = rng.gen_range(0..boxes.len()) as EntityId;
        edited.erase(id).unwrap();
        edited.insert(id, &boxes).unwrap();
    }
    assert_eq!(edited, original);

    let points = random_points(&mut StdRng::seed_from_u64(27), 150);
    let original = PointOctree::from_points(&points, &point_options()).unwrap();
    let mut edited = original.clone();
    for _ in 0..30 {
        let id = rng.gen_range(0..points.len()) as EntityId;
        edited.erase(id).unwrap();
        edited.insert(id, &points).unwrap();
    }
    assert_eq!(edited, original);
}

#[test]
fn incremental_inserts_agree_with_queries() {
    let mut rng = StdRng::seed_from_u64(28);
    let boxes = random_boxes(&mut rng, 80);
    // Build over an empty span, then insert everything one by one.
    let mut tree = BoxQuadtree::from_boxes(
        &[],
        &BuildOptions {
            world_box: Some(Aabb::new([0.0, 0.0], [102.0, 102.0])),
            ..box_options(2)
        },
    )
    .unwrap();
    for id in 0..boxes.len() {
        tree.insert(id as EntityId, &boxes).unwrap();
    }

    let query = Aabb::new([10.0, 10.0], [60.0, 60.0]);
    let expected: Vec<EntityId> = boxes
        .iter()
        .enumerate()
        .filter(|(_, b)| query.overlaps_strictly(b))
        .map(|(i, _)| i as EntityId)
        .collect();
    assert_eq!(tree.range_search(&boxes, &query, false), expected);

    let mut pairs: Vec<(EntityId, EntityId)> = Vec::new();
    for i in 0..boxes.len() {
        for j in (i + 1)..boxes.len() {
            if boxes[i].overlaps_strictly(&boxes[j]) {
                pairs.push((i as EntityId, j as EntityId));
            }
        }
    }
    assert_eq!(
        tree.collision_detection(&boxes, ExecutionPolicy::Sequential),
        pairs
    );
}

#[test]
fn builds_are_deterministic_across_modes() {
    let mut rng = StdRng::seed_from_u64(29);
    let boxes = random_boxes(&mut rng, 300);
    let sequential = BoxQuadtree::from_boxes(&boxes, &box_options(2)).unwrap();
    let again = BoxQuadtree::from_boxes(&boxes, &box_options(2)).unwrap();
    let parallel = BoxQuadtree::from_boxes(
        &boxes,
        &BuildOptions {
            policy: ExecutionPolicy::Parallel,
            ..box_options(2)
        },
    )
    .unwrap();
    assert_eq!(sequential, again);
    assert_eq!(sequential, parallel);
}

#[test]
fn generic_dimensions_build_and_query() {
    // A 4-dimensional tree exercises the generic code paths.
    let points: Vec<[f32; 4]> = (0..60)
        .map(|i| {
            let f = i as f32;
            [
                (f * 0.31).fract() * 10.0,
                (f * 0.57).fract() * 10.0,
                (f * 0.73).fract() * 10.0,
                (f * 0.91).fract() * 10.0,
            ]
        })
        .collect();
    let tree = PointTree::<orthant_grid::ArrayAdaptor<f32>, 4>::from_points(
        &points,
        &BuildOptions {
            max_depth: 3,
            max_elements_per_node: 3,
            ..BuildOptions::default()
        },
    )
    .unwrap();

    let query: Aabb<f32, 4> = Aabb::new([0.0; 4], [5.0; 4]);
    let expected: Vec<EntityId> = points
        .iter()
        .enumerate()
        .filter(|(_, p)| query.contains_point(p))
        .map(|(i, _)| i as EntityId)
        .collect();
    assert_eq!(tree.range_search(&points, &query), expected);

    // Dimension 7 cannot represent a child mask.
    let far: Vec<[f32; 7]> = alloc::vec![[0.0; 7], [1.0; 7]];
    let err = PointTree::<orthant_grid::ArrayAdaptor<f32>, 7>::from_points(
        &far,
        &BuildOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err, crate::TreeError::DimensionTooLarge(7));
}
