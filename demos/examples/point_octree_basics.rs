// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point octree basics.
//!
//! Build an octree over a point cloud, then run range, nearest-neighbor,
//! and pick queries.
//!
//! Run:
//! - `cargo run -p orthant_demos --example point_octree_basics`

use orthant_grid::Aabb;
use orthant_tree::{BuildOptions, PointOctree};

fn main() {
    // A small helix of points.
    let points: Vec<[f64; 3]> = (0..64)
        .map(|i| {
            let t = f64::from(i) * 0.3;
            [4.0 + 3.0 * t.cos(), 4.0 + 3.0 * t.sin(), t * 0.5]
        })
        .collect();

    let tree = PointOctree::from_points(
        &points,
        &BuildOptions {
            max_depth: 4,
            max_elements_per_node: 4,
            ..BuildOptions::default()
        },
    )
    .unwrap();
    println!("indexed {} points into {} nodes", points.len(), tree.nodes().len());

    // Everything in a window around the helix start.
    let window = Aabb::new([5.0, 3.0, 0.0], [8.0, 6.0, 2.0]);
    let visible = tree.range_search(&points, &window);
    println!("{} points in {window:?}", visible.len());

    // The five points closest to the axis midpoint.
    let nearest = tree.nearest_neighbors(&points, &[4.0, 4.0, 5.0], 5);
    println!("nearest to the center: {nearest:?}");
    assert_eq!(nearest.len(), 5);

    // Pick an exact point.
    let hit = tree.pick_search(&points, &points[17]);
    assert_eq!(hit, [17]);
    println!("picked {hit:?} at {:?}", points[17]);
}
