// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping between world space and the integer lattice at maximum depth.
//!
//! A [`GridSpace`] fixes a world box and a maximum depth `L`, and maps world
//! coordinates to cells of the uniform `2^L`-per-axis lattice. Everything
//! out of domain clamps to the nearest edge cell; nothing is discarded.

use crate::code::LocationCode;
use crate::types::{Aabb, Scalar, le, lt};

/// World box with a zero-extent axis; the grid cannot subdivide it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DegenerateAxis(pub usize);

impl core::fmt::Display for DegenerateAxis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "world box has zero extent on dimension {}", self.0)
    }
}

impl core::error::Error for DegenerateAxis {}

/// Uniform subdivision of a world box down to a maximum depth.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridSpace<S, const D: usize> {
    bounds: Aabb<S, D>,
    extent: [S; D],
    scale: [S; D],
    max_depth: u8,
}

impl<S: Scalar, const D: usize> GridSpace<S, D> {
    /// Create a grid over `bounds` with `2^max_depth` cells per axis.
    pub fn new(bounds: Aabb<S, D>, max_depth: u8) -> Result<Self, DegenerateAxis> {
        let cells = S::from_u64(1 << max_depth);
        let mut extent = [S::zero(); D];
        let mut scale = [S::zero(); D];
        for d in 0..D {
            let e = S::sub(bounds.max[d], bounds.min[d]);
            if le(e, S::zero()) {
                return Err(DegenerateAxis(d));
            }
            extent[d] = e;
            scale[d] = S::div(cells, e);
        }
        Ok(Self {
            bounds,
            extent,
            scale,
            max_depth,
        })
    }

    /// The world box this grid subdivides.
    pub fn bounds(&self) -> &Aabb<S, D> {
        &self.bounds
    }

    /// Maximum depth of the subdivision.
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Lattice coordinates of a world point, clamped to the grid.
    pub fn point_to_grid(&self, p: &[S; D]) -> [u64; D] {
        core::array::from_fn(|d| self.coord(p[d], d))
    }

    /// Lattice cell range `[min, max]` covered by a world box, clamped.
    ///
    /// A maximum corner lying exactly on a cell boundary belongs to the
    /// lower cell, so a box tiling the grid maps to exactly the cells it
    /// fills.
    pub fn box_to_grid(&self, b: &Aabb<S, D>) -> ([u64; D], [u64; D]) {
        let min = core::array::from_fn(|d| self.coord(b.min[d], d));
        let max = core::array::from_fn(|d| self.max_coord(b.max[d], d));
        (min, max)
    }

    /// Full-depth location code of the cell containing a world point.
    pub fn point_code(&self, p: &[S; D]) -> LocationCode<D> {
        LocationCode::encode(&self.point_to_grid(p), self.max_depth)
    }

    /// Depth of the smallest cell that fully contains the lattice range.
    pub fn canonical_depth(&self, grid_min: &[u64; D], grid_max: &[u64; D]) -> u8 {
        let mut diff = 0_u64;
        for d in 0..D {
            diff |= grid_min[d] ^ grid_max[d];
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "bit length of a u64 fits u8"
        )]
        let straddle_levels = (u64::BITS - diff.leading_zeros()) as u8;
        self.max_depth - straddle_levels
    }

    /// Location code of the smallest cell fully containing a world box.
    pub fn box_code(&self, b: &Aabb<S, D>) -> LocationCode<D> {
        let (grid_min, grid_max) = self.box_to_grid(b);
        let depth = self.canonical_depth(&grid_min, &grid_max);
        let shift = self.max_depth - depth;
        let coarse = core::array::from_fn(|d| grid_min[d] >> shift);
        LocationCode::encode(&coarse, depth)
    }

    /// World box of the cell a location code addresses.
    pub fn cell(&self, code: LocationCode<D>) -> Aabb<S, D> {
        let (grid, depth) = code.decode();
        let cells = S::from_u64(1 << depth);
        let mut min = [S::zero(); D];
        let mut max = [S::zero(); D];
        for d in 0..D {
            let step = S::div(self.extent[d], cells);
            min[d] = S::add(self.bounds.min[d], S::mul(S::from_u64(grid[d]), step));
            max[d] = S::add(self.bounds.min[d], S::mul(S::from_u64(grid[d] + 1), step));
        }
        Aabb::new(min, max)
    }

    fn coord(&self, value: S, dim: usize) -> u64 {
        let limit = (1_u64 << self.max_depth) - 1;
        if le(value, self.bounds.min[dim]) {
            return 0;
        }
        let scaled = S::mul(S::sub(value, self.bounds.min[dim]), self.scale[dim]);
        let cell = S::trunc_to_u64(scaled);
        cell.min(limit)
    }

    fn max_coord(&self, value: S, dim: usize) -> u64 {
        let cell = self.coord(value, dim);
        // Boundary rule: an exact multiple closes the cell below it.
        let scaled = S::mul(S::sub(value, self.bounds.min[dim]), self.scale[dim]);
        if cell > 0 && !lt(S::from_u64(cell), scaled) {
            cell - 1
        } else {
            cell
        }
    }
}
