// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Orthant Grid: scalars, N-dimensional AABBs, geometry adaptors, Morton
//! location codes, and world-to-lattice mapping.
//!
//! This is the lower layer of the Orthant workspace. It has no dependencies
//! and no spatial structure of its own; [`orthant_tree`] builds the actual
//! trees on top of it.
//!
//! - [`Scalar`]: the arithmetic the trees need, for `f32` and `f64`.
//! - [`Aabb`]: `[S; D]` corner boxes with the derived predicates (strict
//!   overlap, inclusive containment, distance lower bounds, ray slabs,
//!   hyperplane distance ranges).
//! - [`Adaptor`]: per-component access to user point/box types;
//!   [`ArrayAdaptor`] for plain arrays.
//! - [`LocationCode`]: Morton codes with a self-delimiting sentinel bit and
//!   parent/child/ancestor arithmetic.
//! - [`GridSpace`]: a world box subdivided `2^depth`-per-axis, mapping world
//!   geometry to lattice cells and back.
//!
//! # Example
//!
//! ```rust
//! use orthant_grid::{Aabb, GridSpace, LocationCode};
//!
//! let grid: GridSpace<f64, 2> =
//!     GridSpace::new(Aabb::new([0.0, 0.0], [8.0, 8.0]), 3).unwrap();
//!
//! // A point maps to a full-depth cell...
//! let code = grid.point_code(&[1.5, 6.0]);
//! assert_eq!(code.depth(), 3);
//!
//! // ...and codes knit cells together structurally.
//! assert!(LocationCode::ROOT.is_ancestor_of(code));
//! assert!(grid.cell(code).contains_point(&[1.5, 6.0]));
//! ```
//!
//! This crate is `no_std` and uses `alloc` only in tests.
//!
//! [`orthant_tree`]: https://docs.rs/orthant_tree

#![no_std]

#[cfg(test)]
extern crate alloc;

pub mod adaptor;
pub mod code;
pub mod grid;
pub mod types;

pub use adaptor::{Adaptor, ArrayAdaptor};
pub use code::LocationCode;
pub use grid::{DegenerateAxis, GridSpace};
pub use types::{Aabb, Scalar, point_distance_squared};
