// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collision detection over kurbo rectangles.
//!
//! Build a box quadtree over a pile of rectangles, list every overlapping
//! pair, and hit-test a point.
//!
//! Run:
//! - `cargo run -p orthant_demos --example rect_collisions`

use kurbo::{Point, Rect};
use orthant_tree::adapters::kurbo::KurboAdaptor;
use orthant_tree::{BoxTree, BuildOptions, ExecutionPolicy};

fn main() {
    // A deterministic scatter of rectangles, some overlapping.
    let rects: Vec<Rect> = (0..40)
        .map(|i| {
            let f = f64::from(i);
            let x = (f * 13.7).rem_euclid(300.0);
            let y = (f * 29.3).rem_euclid(300.0);
            Rect::new(x, y, x + 30.0 + (f * 3.1).rem_euclid(40.0), y + 25.0)
        })
        .collect();

    let tree = BoxTree::<KurboAdaptor, 2>::from_boxes(
        &rects,
        &BuildOptions {
            max_depth: 5,
            max_elements_per_node: 4,
            ..BuildOptions::default()
        },
    )
    .unwrap();
    println!("indexed {} rects into {} nodes", rects.len(), tree.nodes().len());

    let pairs = tree.collision_detection(&rects, ExecutionPolicy::Parallel);
    println!("{} overlapping pairs", pairs.len());
    for &(a, b) in pairs.iter().take(8) {
        println!("  {a} x {b}: {:?} / {:?}", rects[a as usize], rects[b as usize]);
    }

    // Who is under the cursor?
    let cursor = Point::new(150.0, 150.0);
    let under = tree.pick_search(&rects, &cursor);
    println!("under {cursor:?}: {under:?}");
}
