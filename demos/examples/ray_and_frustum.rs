// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ray casting and frustum culling over a box octree.
//!
//! Run:
//! - `cargo run -p orthant_demos --example ray_and_frustum`

use orthant_grid::Aabb;
use orthant_tree::{BoxOctree, BuildOptions};

fn main() {
    // A floor of unit cubes in the z = 0 plane.
    let cubes: Vec<Aabb<f64, 3>> = (0..100)
        .map(|i| {
            let x = f64::from(i % 10) * 1.5;
            let y = f64::from(i / 10) * 1.5;
            Aabb::new([x, y, 0.0], [x + 1.0, y + 1.0, 1.0])
        })
        .collect();

    let tree = BoxOctree::from_boxes(
        &cubes,
        &BuildOptions {
            max_depth: 4,
            max_elements_per_node: 8,
            ..BuildOptions::default()
        },
    )
    .unwrap();

    // A ray skimming the floor diagonally.
    let origin = [-1.0, -1.0, 0.5];
    let dir = [1.0, 1.0, 0.0];
    let first = tree.ray_intersected_first(&cubes, &origin, &dir, 0.0);
    println!("first cube on the diagonal: {first:?}");
    let all = tree.ray_intersected_all(&cubes, &origin, &dir, 0.0);
    println!("{} cubes along the ray:", all.len());
    for (id, t) in &all {
        println!("  cube {id} at t = {t:.2}");
    }

    // A viewing volume covering the lower-left corner of the floor.
    let planes = vec![
        ([1.0, 0.0, 0.0], -0.5),  // x >= -0.5
        ([-1.0, 0.0, 0.0], -6.0), // x <= 6
        ([0.0, 1.0, 0.0], -0.5),  // y >= -0.5
        ([0.0, -1.0, 0.0], -6.0), // y <= 6
    ];
    let seen = tree.frustum_culling(&cubes, &planes, 0.0);
    println!("{} cubes inside the volume", seen.len());
    assert!(!seen.is_empty());
}
