// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bulk construction: per-entity codes, a sort over the shared keyspace,
//! and a recursive fold into the node table.
//!
//! Every entity (or box fragment) becomes one [`BuildItem`] carrying its
//! placement code aligned to the leaf-depth keyspace. Sorting the items by
//! `(base, depth, id)` lines them up along the space-filling curve with
//! ancestors ahead of their descendants, so the fold is a single top-down
//! partition: a range small enough to own outright stops, anything else
//! peels the entities that live at the current depth and splits the rest
//! into child buckets.

use alloc::vec::Vec;
use smallvec::SmallVec;

use orthant_grid::LocationCode;

use crate::error::{DEPTH_LIMIT, DIMENSION_LIMIT, TreeError};
use crate::node::{EntityId, Node, NodeTable};

/// How bulk work (code computation, sorting, collision scans) is executed.
///
/// `Parallel` dispatches over rayon worker threads when the `parallel`
/// feature is enabled and quietly degrades to sequential execution when it
/// is not, so callers can thread the knob through unconditionally. Outputs
/// are identical either way.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ExecutionPolicy {
    /// Single-threaded execution.
    #[default]
    Sequential,
    /// Unordered multi-threaded execution with deterministic output.
    Parallel,
}

/// Parameters for bulk construction.
#[derive(Clone, Debug)]
pub struct BuildOptions<B> {
    /// Depth of the leaf lattice, `1..=10`.
    pub max_depth: u8,
    /// Nodes owning at most this many entities are not subdivided.
    pub max_elements_per_node: usize,
    /// World box covering the entities; computed from them when `None`.
    pub world_box: Option<B>,
    /// Levels below a box's smallest enclosing cell into which a straddling
    /// box is replicated. Box trees only; point trees ignore it.
    pub split_depth: u8,
    /// Execution mode for the build.
    pub policy: ExecutionPolicy,
}

impl<B> Default for BuildOptions<B> {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_elements_per_node: 21,
            world_box: None,
            split_depth: 2,
            policy: ExecutionPolicy::Sequential,
        }
    }
}

/// One placement of one entity in the shared `max_depth` keyspace.
///
/// `base` is the Morton bits of the placement cell's first leaf descendant;
/// `depth` is the cell's own depth. The derived lexicographic order is the
/// sort the fold consumes, and including the id makes it total, so an
/// unstable (and parallel) sort is deterministic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct BuildItem {
    pub(crate) base: u64,
    pub(crate) depth: u8,
    pub(crate) id: EntityId,
}

impl BuildItem {
    pub(crate) fn new<const D: usize>(code: LocationCode<D>, max_depth: u8, id: EntityId) -> Self {
        Self {
            base: code.leaf_base(max_depth),
            depth: code.depth(),
            id,
        }
    }
}

/// Check the compile-time/runtime ceilings shared by both tree kinds.
pub(crate) fn validate_dimensions<const D: usize>(max_depth: u8) -> Result<(), TreeError> {
    if D > DIMENSION_LIMIT {
        return Err(TreeError::DimensionTooLarge(D));
    }
    if max_depth == 0 || max_depth > DEPTH_LIMIT {
        return Err(TreeError::MaxDepthOutOfRange(max_depth));
    }
    if !LocationCode::<D>::fits(max_depth as usize) {
        return Err(TreeError::CodeCapacityExceeded(D * max_depth as usize + 1));
    }
    Ok(())
}

#[cfg(feature = "parallel")]
pub(crate) fn sort_items(items: &mut [BuildItem], policy: ExecutionPolicy) {
    use rayon::prelude::*;
    match policy {
        ExecutionPolicy::Sequential => items.sort_unstable(),
        ExecutionPolicy::Parallel => items.par_sort_unstable(),
    }
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn sort_items(items: &mut [BuildItem], _policy: ExecutionPolicy) {
    items.sort_unstable();
}

/// Fold sorted items into a node table.
pub(crate) fn fold_items<const D: usize>(
    items: &[BuildItem],
    max_depth: u8,
    max_elements: usize,
) -> NodeTable<D> {
    debug_assert!(items.is_sorted());
    let mut table = NodeTable::new();
    if !items.is_empty() {
        fold_node(&mut table, items, LocationCode::ROOT, max_depth, max_elements);
    }
    table
}

fn fold_node<const D: usize>(
    table: &mut NodeTable<D>,
    items: &[BuildItem],
    code: LocationCode<D>,
    max_depth: u8,
    max_elements: usize,
) {
    let depth = code.depth();
    let mut node = Node::default();

    if items.len() <= max_elements || depth == max_depth {
        node.set_entities(items.iter().map(|it| it.id).collect::<SmallVec<_>>());
        table.insert(code, node);
        return;
    }

    // Entities whose placement cell is this node sort first in the range.
    let owned = items.iter().take_while(|it| it.depth == depth).count();
    node.set_entities(items[..owned].iter().map(|it| it.id).collect::<SmallVec<_>>());

    let shift = (max_depth - depth - 1) as usize * D;
    let mask = (1_u64 << D) - 1;
    let mut rest = &items[owned..];
    while !rest.is_empty() {
        let child = (rest[0].base >> shift) & mask;
        let len = rest
            .iter()
            .take_while(|it| (it.base >> shift) & mask == child)
            .count();
        node.set_child(child);
        fold_node(table, &rest[..len], code.child(child), max_depth, max_elements);
        rest = &rest[len..];
    }

    table.insert(code, node);
}

/// Call `emit` with the code of every lattice cell in `[lo, hi]` at `depth`.
///
/// This is the replication step of the box split strategy; the cell range
/// derives from the box corners, so every emitted cell overlaps the box.
pub(crate) fn codes_for_cell_range<const D: usize>(
    lo: &[u64; D],
    hi: &[u64; D],
    depth: u8,
    mut emit: impl FnMut(LocationCode<D>),
) {
    let mut cur = *lo;
    loop {
        emit(LocationCode::<D>::encode(&cur, depth));
        let mut d = 0;
        loop {
            if d == D {
                return;
            }
            if cur[d] < hi[d] {
                cur[d] += 1;
                break;
            }
            cur[d] = lo[d];
            d += 1;
        }
    }
}
