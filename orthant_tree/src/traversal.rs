// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State and traversal machinery shared by the point and box trees.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::marker::PhantomData;

use orthant_grid::{Aabb, Adaptor, GridSpace, LocationCode, Scalar};
use smallvec::SmallVec;

use crate::node::{EntityId, Node, NodeTable};

/// Total order over partially ordered scalars.
///
/// Inputs are assumed finite; incomparable values collapse to `Equal`, the
/// same convention the primitive helpers in `orthant_grid` use.
#[derive(Copy, Clone, Debug)]
pub(crate) struct OrdScalar<S>(pub(crate) S);

impl<S: Scalar> PartialEq for OrdScalar<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == core::cmp::Ordering::Equal
    }
}

impl<S: Scalar> Eq for OrdScalar<S> {}

impl<S: Scalar> PartialOrd for OrdScalar<S> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: Scalar> Ord for OrdScalar<S> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(core::cmp::Ordering::Equal)
    }
}

/// Signed offset of a point against the hyperplane `dot(normal, x) = offset`.
pub(crate) fn signed_distance<S: Scalar, const D: usize>(
    normal: &[S; D],
    offset: S,
    p: &[S; D],
) -> S {
    let mut acc = S::sub(S::zero(), offset);
    for d in 0..D {
        acc = S::add(acc, S::mul(normal[d], p[d]));
    }
    acc
}

/// Strict scalar comparison with the crate's incomparable-is-equal rule.
pub(crate) fn lt<S: Scalar>(a: S, b: S) -> bool {
    matches!(a.partial_cmp(&b), Some(core::cmp::Ordering::Less))
}

/// Canonical query result order: ascending, deduplicated ids.
pub(crate) fn finish(mut out: Vec<EntityId>) -> Vec<EntityId> {
    out.sort_unstable();
    out.dedup();
    out
}

/// Grid, node table, and build parameters common to both tree kinds.
pub(crate) struct TreeCore<A: Adaptor<D>, const D: usize> {
    pub(crate) grid: GridSpace<A::Scalar, D>,
    pub(crate) table: NodeTable<D>,
    pub(crate) max_elements: usize,
    _adaptor: PhantomData<fn() -> A>,
}

impl<A: Adaptor<D>, const D: usize> TreeCore<A, D> {
    pub(crate) fn new(
        grid: GridSpace<A::Scalar, D>,
        table: NodeTable<D>,
        max_elements: usize,
    ) -> Self {
        Self {
            grid,
            table,
            max_elements,
            _adaptor: PhantomData,
        }
    }

    pub(crate) fn cell(&self, code: LocationCode<D>) -> Aabb<A::Scalar, D> {
        self.grid.cell(code)
    }

    /// Child codes of a node, ascending.
    pub(crate) fn children<'a>(
        &self,
        code: LocationCode<D>,
        node: &'a Node,
    ) -> impl Iterator<Item = LocationCode<D>> + use<'a, A, D> {
        node.child_indices().map(move |i| code.child(i))
    }

    /// Breadth-first traversal; `selector` gates a node (and its subtree),
    /// `procedure` runs on every accepted node.
    pub(crate) fn visit_bfs(
        &self,
        mut selector: impl FnMut(LocationCode<D>, &Node) -> bool,
        mut procedure: impl FnMut(LocationCode<D>, &Node),
    ) {
        let mut queue: VecDeque<LocationCode<D>> = VecDeque::new();
        if !self.table.is_empty() {
            queue.push_back(LocationCode::ROOT);
        }
        while let Some(code) = queue.pop_front() {
            let Some(node) = self.table.get(code) else {
                continue;
            };
            if !selector(code, node) {
                continue;
            }
            procedure(code, node);
            queue.extend(self.children(code, node));
        }
    }

    /// Depth-first pre-order traversal with the same contract as
    /// [`Self::visit_bfs`].
    pub(crate) fn visit_dfs(
        &self,
        mut selector: impl FnMut(LocationCode<D>, &Node) -> bool,
        mut procedure: impl FnMut(LocationCode<D>, &Node),
    ) {
        let mut stack: Vec<LocationCode<D>> = Vec::new();
        if !self.table.is_empty() {
            stack.push(LocationCode::ROOT);
        }
        while let Some(code) = stack.pop() {
            let Some(node) = self.table.get(code) else {
                continue;
            };
            if !selector(code, node) {
                continue;
            }
            procedure(code, node);
            let before = stack.len();
            stack.extend(self.children(code, node));
            stack[before..].reverse();
        }
    }

    /// Owner node for an entity placed at `target`, creating at most one
    /// node. The walk follows the existing split structure down `target`'s
    /// ancestor chain: an unsplit node absorbs the entity where the bulk
    /// builder would have collapsed it, while a split node missing the
    /// required child grows that one bucket.
    pub(crate) fn locate_or_create_owner(&mut self, target: LocationCode<D>) -> LocationCode<D> {
        if self.table.is_empty() {
            self.table.ensure(LocationCode::ROOT);
        }
        let tdepth = target.depth();
        let mut owner = LocationCode::ROOT;
        for level in 1..=tdepth {
            let next = target.ancestor(tdepth - level);
            let Some(node) = self.table.get(owner) else {
                break;
            };
            if node.has_child(next.child_index()) {
                owner = next;
            } else if node.is_leaf() {
                break;
            } else {
                self.table.ensure(next);
                return next;
            }
        }
        owner
    }

    /// Remove `id` from every node owning it, pruning emptied nodes.
    pub(crate) fn erase_everywhere(&mut self, id: EntityId) -> bool {
        let owners: SmallVec<[LocationCode<D>; 8]> = self
            .table
            .iter()
            .filter(|(_, n)| n.has_entity(id))
            .map(|(c, _)| c)
            .collect();
        if owners.is_empty() {
            return false;
        }
        for &code in &owners {
            if let Some(node) = self.table.get_mut(code) {
                node.remove_entity(id);
            }
        }
        for &code in &owners {
            self.table.prune_upward(code);
        }
        true
    }

    /// Rename owner ids in place; `remap` returning `None` drops the id.
    pub(crate) fn update_indexes(&mut self, mut remap: impl FnMut(EntityId) -> Option<EntityId>) {
        let codes: Vec<LocationCode<D>> = self.table.codes().collect();
        for &code in &codes {
            if let Some(node) = self.table.get_mut(code) {
                let renamed = node
                    .take_entities()
                    .into_iter()
                    .filter_map(&mut remap)
                    .collect();
                node.set_entities(renamed);
            }
        }
        // Deepest-first so cascades see already-pruned children.
        for &code in codes.iter().rev() {
            self.table.prune_upward(code);
        }
    }
}

impl<A: Adaptor<D>, const D: usize> Clone for TreeCore<A, D> {
    fn clone(&self) -> Self {
        Self {
            grid: self.grid,
            table: self.table.clone(),
            max_elements: self.max_elements,
            _adaptor: PhantomData,
        }
    }
}

impl<A: Adaptor<D>, const D: usize> PartialEq for TreeCore<A, D> {
    fn eq(&self, other: &Self) -> bool {
        self.grid == other.grid
            && self.max_elements == other.max_elements
            && self.table == other.table
    }
}

impl<A: Adaptor<D>, const D: usize> core::fmt::Debug for TreeCore<A, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TreeCore")
            .field("grid", &self.grid)
            .field("nodes", &self.table.len())
            .field("max_elements", &self.max_elements)
            .finish_non_exhaustive()
    }
}
