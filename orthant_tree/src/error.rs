// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for tree construction and edits.
//!
//! Queries never error: an empty tree, an unknown id, or a box no entity
//! touches all yield empty results.

use orthant_grid::DegenerateAxis;
use thiserror::Error;

use crate::node::EntityId;

/// Deepest subdivision the bit-packed codes support.
pub const DEPTH_LIMIT: u8 = 10;

/// Widest dimension whose child bitmask fits a `u64`.
pub const DIMENSION_LIMIT: usize = 6;

/// Fatal configuration errors reported at build time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// `max_depth` must lie in `1..=DEPTH_LIMIT`.
    #[error("max depth {0} is outside 1..={DEPTH_LIMIT}")]
    MaxDepthOutOfRange(u8),
    /// A `2^D`-wide child bitmask must fit a `u64`.
    #[error("dimension {0} exceeds the supported ceiling of {DIMENSION_LIMIT}")]
    DimensionTooLarge(usize),
    /// `D * max_depth` bits plus the sentinel must fit a `u64`.
    #[error("a code of {0} bits does not fit the 64-bit keyspace")]
    CodeCapacityExceeded(usize),
    /// The world box cannot be subdivided along some axis.
    #[error(transparent)]
    DegenerateWorldBox(#[from] DegenerateAxis),
}

/// Errors reported by the incremental edit operations.
///
/// The tree is left unchanged when an edit fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    /// The id names no indexed entity (erase/update) or lies outside the
    /// caller's entity span (insert).
    #[error("entity {0} is not indexed by the tree")]
    UnknownEntity(EntityId),
}
