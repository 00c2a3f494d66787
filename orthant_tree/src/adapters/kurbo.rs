// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D adapter for [`kurbo`] geometry.
//!
//! Lets the trees index `kurbo::Point` and `kurbo::Rect` spans directly:
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use orthant_tree::adapters::kurbo::KurboAdaptor;
//! use orthant_tree::{BoxTree, BuildOptions, ExecutionPolicy};
//!
//! let rects = vec![
//!     Rect::new(0.0, 0.0, 40.0, 40.0),
//!     Rect::new(30.0, 30.0, 70.0, 70.0),
//!     Rect::new(200.0, 0.0, 240.0, 40.0),
//! ];
//! let tree = BoxTree::<KurboAdaptor, 2>::from_boxes(&rects, &BuildOptions::default()).unwrap();
//!
//! let hits = tree.pick_search(&rects, &Point::new(35.0, 35.0));
//! assert_eq!(hits, [0, 1]);
//! let pairs = tree.collision_detection(&rects, ExecutionPolicy::Sequential);
//! assert_eq!(pairs, [(0, 1)]);
//! ```

use kurbo::{Point, Rect};
use orthant_grid::Adaptor;

/// Adaptor over `kurbo::Point` / `kurbo::Rect` with `f64` scalars.
pub struct KurboAdaptor;

impl Adaptor<2> for KurboAdaptor {
    type Scalar = f64;
    type Point = Point;
    type Box = Rect;

    #[inline]
    fn point_coord(point: &Point, dim: usize) -> f64 {
        match dim {
            0 => point.x,
            _ => point.y,
        }
    }

    #[inline]
    fn set_point_coord(point: &mut Point, dim: usize, value: f64) {
        match dim {
            0 => point.x = value,
            _ => point.y = value,
        }
    }

    #[inline]
    fn box_min(b: &Rect, dim: usize) -> f64 {
        match dim {
            0 => b.x0,
            _ => b.y0,
        }
    }

    #[inline]
    fn box_max(b: &Rect, dim: usize) -> f64 {
        match dim {
            0 => b.x1,
            _ => b.y1,
        }
    }

    #[inline]
    fn set_box_min(b: &mut Rect, dim: usize, value: f64) {
        match dim {
            0 => b.x0 = value,
            _ => b.y0 = value,
        }
    }

    #[inline]
    fn set_box_max(b: &mut Rect, dim: usize, value: f64) {
        match dim {
            0 => b.x1 = value,
            _ => b.y1 = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildOptions;
    use crate::point_tree::PointTree;
    use alloc::vec::Vec;

    #[test]
    fn kurbo_points_round_trip_through_queries() {
        let points: Vec<Point> = (0..20)
            .map(|i| Point::new(f64::from(i) * 5.0, f64::from(i % 7) * 9.0))
            .collect();
        let tree =
            PointTree::<KurboAdaptor, 2>::from_points(&points, &BuildOptions::default()).unwrap();

        let viewport = Rect::new(0.0, 0.0, 30.0, 30.0);
        let visible = tree.range_search(&points, &viewport);
        let expected: Vec<u32> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| viewport.contains(**p))
            .map(|(i, _)| i as u32)
            .collect();
        assert_eq!(visible, expected);

        // Closest is id 8 at (40, 9).
        let nearest = tree.nearest_neighbors(&points, &Point::new(51.0, 9.0), 1);
        assert_eq!(nearest, [8]);
    }
}
