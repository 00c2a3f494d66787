// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry adaptor: the contract between user geometry types and the trees.
//!
//! The trees never look inside a point or a box directly; they go through an
//! [`Adaptor`] that exposes per-component access on points and on box
//! corners. Every other geometric predicate is derived from those accessors
//! (see [`Aabb`]), so adapting a new geometry library is six small
//! functions. [`ArrayAdaptor`] covers plain `[S; D]` points and [`Aabb`]
//! boxes out of the box.

use core::marker::PhantomData;

use crate::types::{Aabb, Scalar};

/// Access to user-supplied point and box types of compile-time dimension `D`.
pub trait Adaptor<const D: usize> {
    /// Scalar type of all coordinates.
    type Scalar: Scalar;
    /// User point type.
    type Point: Clone;
    /// User axis-aligned box type.
    type Box: Clone;

    /// Read component `dim` of a point.
    fn point_coord(point: &Self::Point, dim: usize) -> Self::Scalar;

    /// Write component `dim` of a point.
    fn set_point_coord(point: &mut Self::Point, dim: usize, value: Self::Scalar);

    /// Read component `dim` of the box's minimum corner.
    fn box_min(b: &Self::Box, dim: usize) -> Self::Scalar;

    /// Read component `dim` of the box's maximum corner.
    fn box_max(b: &Self::Box, dim: usize) -> Self::Scalar;

    /// Write component `dim` of the box's minimum corner.
    fn set_box_min(b: &mut Self::Box, dim: usize, value: Self::Scalar);

    /// Write component `dim` of the box's maximum corner.
    fn set_box_max(b: &mut Self::Box, dim: usize, value: Self::Scalar);

    /// All components of a point as an array.
    fn point_coords(point: &Self::Point) -> [Self::Scalar; D] {
        core::array::from_fn(|d| Self::point_coord(point, d))
    }

    /// A user box in the internal AABB form.
    fn box_aabb(b: &Self::Box) -> Aabb<Self::Scalar, D> {
        Aabb::new(
            core::array::from_fn(|d| Self::box_min(b, d)),
            core::array::from_fn(|d| Self::box_max(b, d)),
        )
    }
}

/// Built-in adaptor for `[S; D]` points and [`Aabb<S, D>`] boxes.
pub struct ArrayAdaptor<S>(PhantomData<S>);

impl<S: Scalar, const D: usize> Adaptor<D> for ArrayAdaptor<S> {
    type Scalar = S;
    type Point = [S; D];
    type Box = Aabb<S, D>;

    #[inline]
    fn point_coord(point: &Self::Point, dim: usize) -> S {
        point[dim]
    }

    #[inline]
    fn set_point_coord(point: &mut Self::Point, dim: usize, value: S) {
        point[dim] = value;
    }

    #[inline]
    fn box_min(b: &Self::Box, dim: usize) -> S {
        b.min[dim]
    }

    #[inline]
    fn box_max(b: &Self::Box, dim: usize) -> S {
        b.max[dim]
    }

    #[inline]
    fn set_box_min(b: &mut Self::Box, dim: usize, value: S) {
        b.min[dim] = value;
    }

    #[inline]
    fn set_box_max(b: &mut Self::Box, dim: usize, value: S) {
        b.max[dim] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_adaptor_roundtrips_components() {
        let mut p = [1.0_f64, 2.0, 3.0];
        assert_eq!(<ArrayAdaptor<f64> as Adaptor<3>>::point_coord(&p, 2), 3.0);
        <ArrayAdaptor<f64> as Adaptor<3>>::set_point_coord(&mut p, 0, -1.0);
        assert_eq!(
            <ArrayAdaptor<f64> as Adaptor<3>>::point_coords(&p),
            [-1.0, 2.0, 3.0]
        );

        let b = Aabb::new([0.0_f64, 0.0], [2.0, 4.0]);
        let aabb = <ArrayAdaptor<f64> as Adaptor<2>>::box_aabb(&b);
        assert_eq!(aabb, b);
    }
}
