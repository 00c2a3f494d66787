// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Orthant Tree: N-dimensional Morton-keyed orthotrees for points and boxes.
//!
//! An orthotree (quadtree in 2D, octree in 3D, hyperoctree beyond) indexes
//! point or axis-aligned-box entities for fast spatial queries: range
//! search, point pick, k-nearest-neighbors, ray intersection, hyperplane
//! tests, frustum culling, and all-pairs collision detection.
//!
//! Nodes are addressed by a Morton Z-order [`LocationCode`] and stored in a
//! flat associative table rather than a chain of child pointers, which
//! gives O(1) node access, cheap ancestor/descendant arithmetic, and a bulk
//! builder that is a sort over codes followed by a single fold.
//!
//! - [`PointTree`]: one leaf-depth code per entity; adds nearest-neighbor
//!   search.
//! - [`BoxTree`]: each box at its smallest enclosing cell, with a
//!   configurable deeper split strategy for boxes that straddle child
//!   boundaries; adds collision detection and ray queries.
//!
//! Trees are plain values over the caller's entity span: queries take the
//! span and `&self` (callable concurrently), edits take `&mut self`. Given
//! identical inputs and execution mode, outputs are bitwise identical.
//!
//! # Example
//!
//! ```rust
//! use orthant_grid::Aabb;
//! use orthant_tree::{BoxQuadtree, BuildOptions, ExecutionPolicy};
//!
//! let boxes = vec![
//!     Aabb::new([0.0, 0.0], [1.0, 1.0]),
//!     Aabb::new([1.0, 1.0], [2.0, 2.0]),
//!     Aabb::new([1.2, 1.2], [2.8, 2.8]),
//! ];
//! let tree = BoxQuadtree::from_boxes(
//!     &boxes,
//!     &BuildOptions {
//!         max_depth: 3,
//!         ..BuildOptions::default()
//!     },
//! )
//! .unwrap();
//!
//! // Boxes overlapping a viewport (touching faces do not count)...
//! let hits = tree.range_search(&boxes, &Aabb::new([1.0, 1.0], [3.0, 3.0]), false);
//! assert_eq!(hits, [1, 2]);
//!
//! // ...and all-pairs collisions.
//! let pairs = tree.collision_detection(&boxes, ExecutionPolicy::Sequential);
//! assert_eq!(pairs, [(1, 2)]);
//! ```
//!
//! Geometry types plug in through [`orthant_grid::Adaptor`]; plain `[S; D]`
//! points and [`orthant_grid::Aabb`] boxes work out of the box, and the
//! `kurbo` feature adapts `kurbo::Point`/`kurbo::Rect`.
//!
//! The `parallel` feature adds a rayon-backed [`ExecutionPolicy::Parallel`]
//! mode for bulk builds and collision scans; results are identical to
//! sequential execution.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;
mod box_tree;
mod build;
mod traversal;
mod error;
mod node;
mod point_tree;

#[cfg(test)]
mod comparison_tests;

pub use orthant_grid::{Aabb, Adaptor, ArrayAdaptor, LocationCode, Scalar};

pub use box_tree::BoxTree;
pub use build::{BuildOptions, ExecutionPolicy};
pub use error::{DEPTH_LIMIT, DIMENSION_LIMIT, EditError, TreeError};
pub use node::{EntityId, Node, NodeTable};
pub use point_tree::PointTree;

/// Point quadtree over `[S; 2]` points.
pub type PointQuadtree<S = f64> = PointTree<ArrayAdaptor<S>, 2>;
/// Point octree over `[S; 3]` points.
pub type PointOctree<S = f64> = PointTree<ArrayAdaptor<S>, 3>;
/// Box quadtree over [`Aabb<S, 2>`] boxes.
pub type BoxQuadtree<S = f64> = BoxTree<ArrayAdaptor<S>, 2>;
/// Box octree over [`Aabb<S, 3>`] boxes.
pub type BoxOctree<S = f64> = BoxTree<ArrayAdaptor<S>, 3>;
