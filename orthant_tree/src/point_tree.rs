// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Point orthotree: one full-depth location code per entity.

use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Reverse;

use orthant_grid::{Aabb, Adaptor, GridSpace, LocationCode, Scalar, point_distance_squared};
use smallvec::SmallVec;

use crate::build::{BuildItem, BuildOptions, fold_items, sort_items, validate_dimensions};
use crate::traversal::{OrdScalar, TreeCore, finish, lt, signed_distance};
use crate::error::{EditError, TreeError};
use crate::node::{EntityId, Node, NodeTable};

/// An orthotree over point entities.
///
/// The tree does not own the points; every query and edit takes the
/// caller's span, and entity ids are indices into it. Queries return ids in
/// ascending order (nearest-first for [`Self::nearest_neighbors`]) and
/// never error.
pub struct PointTree<A: Adaptor<D>, const D: usize> {
    core: TreeCore<A, D>,
}

impl<A: Adaptor<D>, const D: usize> PointTree<A, D> {
    /// Bulk-build a tree over `points`.
    ///
    /// The world box is taken from `options` or computed from the span;
    /// out-of-domain points clamp to the nearest edge cell.
    pub fn from_points(
        points: &[A::Point],
        options: &BuildOptions<A::Box>,
    ) -> Result<Self, TreeError> {
        validate_dimensions::<D>(options.max_depth)?;
        let bounds = match &options.world_box {
            Some(b) => A::box_aabb(b),
            None => bounds_of_points::<A, D>(points),
        };
        let grid = GridSpace::new(bounds, options.max_depth)?;

        let coords: Vec<[A::Scalar; D]> = points.iter().map(|p| A::point_coords(p)).collect();
        let mut items = point_items(&grid, &coords, options.policy);
        sort_items(&mut items, options.policy);
        let table = fold_items::<D>(&items, options.max_depth, options.max_elements_per_node);

        Ok(Self {
            core: TreeCore::new(grid, table, options.max_elements_per_node),
        })
    }

    /// The world box the grid subdivides.
    pub fn world_bounds(&self) -> &Aabb<A::Scalar, D> {
        self.core.grid.bounds()
    }

    /// Depth of the leaf lattice.
    pub fn max_depth(&self) -> u8 {
        self.core.grid.max_depth()
    }

    /// The flat code-keyed node table.
    pub fn nodes(&self) -> &NodeTable<D> {
        &self.core.table
    }

    /// Ids of all points inside `range` (inclusive faces), ascending.
    pub fn range_search(&self, points: &[A::Point], range: &A::Box) -> Vec<EntityId> {
        let query = A::box_aabb(range);
        let mut out = Vec::new();
        self.core.visit_dfs(
            |code, _| query.overlaps(&self.core.cell(code)),
            |_, node| {
                for &id in node.entities() {
                    if let Some(p) = points.get(id as usize)
                        && query.contains_point(&A::point_coords(p))
                    {
                        out.push(id);
                    }
                }
            },
        );
        finish(out)
    }

    /// Ids of all points coinciding with `at`, ascending.
    pub fn pick_search(&self, points: &[A::Point], at: &A::Point) -> Vec<EntityId> {
        let target = A::point_coords(at);
        let mut out = Vec::new();
        self.walk_point_chain(&target, |node| {
            for &id in node.entities() {
                if let Some(p) = points.get(id as usize)
                    && A::point_coords(p) == target
                {
                    out.push(id);
                }
            }
        });
        finish(out)
    }

    /// The `k` points nearest to `query`, ascending by Euclidean distance
    /// and by id among exact ties. Duplicate points are returned separately.
    ///
    /// Cell distances lower-bound point distances only for points inside
    /// the world box; points that were clamped in from outside may be
    /// missed in favor of closer in-domain ones.
    pub fn nearest_neighbors(
        &self,
        points: &[A::Point],
        query: &A::Point,
        k: usize,
    ) -> Vec<EntityId> {
        if k == 0 || self.core.table.is_empty() {
            return Vec::new();
        }
        let q = A::point_coords(query);

        // Best-first over lower bounds: nodes enter with the distance to
        // their cell, entities with their exact distance. An entity popped
        // from the frontier cannot be beaten by anything still queued.
        let mut frontier: BinaryHeap<Reverse<Queued<A::Scalar, D>>> = BinaryHeap::new();
        frontier.push(Reverse(Queued {
            lower_bound: OrdScalar(A::Scalar::zero()),
            item: Candidate::Node(LocationCode::ROOT),
        }));
        // Max-heap of the k best exact distances seen so far.
        let mut best: BinaryHeap<OrdScalar<A::Scalar>> = BinaryHeap::new();
        let mut found: Vec<(OrdScalar<A::Scalar>, EntityId)> = Vec::new();

        while let Some(Reverse(next)) = frontier.pop() {
            if best.len() == k
                && let Some(worst) = best.peek()
                && *worst < next.lower_bound
            {
                break;
            }
            match next.item {
                Candidate::Node(code) => {
                    let Some(node) = self.core.table.get(code) else {
                        continue;
                    };
                    for &id in node.entities() {
                        let Some(p) = points.get(id as usize) else {
                            continue;
                        };
                        frontier.push(Reverse(Queued {
                            lower_bound: OrdScalar(point_distance_squared(&A::point_coords(p), &q)),
                            item: Candidate::Entity(id),
                        }));
                    }
                    for child in self.core.children(code, node) {
                        frontier.push(Reverse(Queued {
                            lower_bound: OrdScalar(
                                self.core.cell(child).distance_squared_to_point(&q),
                            ),
                            item: Candidate::Node(child),
                        }));
                    }
                }
                Candidate::Entity(id) => {
                    found.push((next.lower_bound, id));
                    best.push(next.lower_bound);
                    if best.len() > k {
                        best.pop();
                    }
                }
            }
        }

        found.sort_unstable();
        found.truncate(k);
        found.into_iter().map(|(_, id)| id).collect()
    }

    /// Ids of points within `tolerance` of the hyperplane
    /// `dot(normal, x) = offset`, ascending.
    pub fn plane_search(
        &self,
        points: &[A::Point],
        normal: &A::Point,
        offset: A::Scalar,
        tolerance: A::Scalar,
    ) -> Vec<EntityId> {
        let n = A::point_coords(normal);
        let neg_tol = A::Scalar::sub(A::Scalar::zero(), tolerance);
        self.plane_filtered(points, &n, offset, move |lo, hi| {
            !(lt(tolerance, lo) || lt(hi, neg_tol))
        }, move |d| !lt(tolerance, d) && !lt(d, neg_tol))
    }

    /// Ids of points on the positive side of the hyperplane, within
    /// `tolerance`, ascending.
    pub fn plane_positive_segmentation(
        &self,
        points: &[A::Point],
        normal: &A::Point,
        offset: A::Scalar,
        tolerance: A::Scalar,
    ) -> Vec<EntityId> {
        let n = A::point_coords(normal);
        let neg_tol = A::Scalar::sub(A::Scalar::zero(), tolerance);
        self.plane_filtered(
            points,
            &n,
            offset,
            move |_, hi| !lt(hi, neg_tol),
            move |d| !lt(d, neg_tol),
        )
    }

    /// Ids of points inside the convex volume bounded by `planes`
    /// (positive side of each), within `tolerance`, ascending.
    pub fn frustum_culling(
        &self,
        points: &[A::Point],
        planes: &[(A::Point, A::Scalar)],
        tolerance: A::Scalar,
    ) -> Vec<EntityId> {
        let planes: Vec<([A::Scalar; D], A::Scalar)> = planes
            .iter()
            .map(|(n, o)| (A::point_coords(n), *o))
            .collect();
        let neg_tol = A::Scalar::sub(A::Scalar::zero(), tolerance);
        let mut out = Vec::new();
        self.core.visit_dfs(
            |code, _| {
                let cell = self.core.cell(code);
                planes
                    .iter()
                    .all(|(n, o)| !lt(cell.plane_distance_range(n, *o).1, neg_tol))
            },
            |_, node| {
                for &id in node.entities() {
                    let Some(p) = points.get(id as usize) else {
                        continue;
                    };
                    let coords = A::point_coords(p);
                    if planes
                        .iter()
                        .all(|(n, o)| !lt(signed_distance(n, *o, &coords), neg_tol))
                    {
                        out.push(id);
                    }
                }
            },
        );
        finish(out)
    }

    /// Breadth-first node traversal. `selector` gates a node and its
    /// subtree; `procedure` runs on accepted nodes.
    pub fn visit_nodes(
        &self,
        selector: impl FnMut(LocationCode<D>, &Node) -> bool,
        procedure: impl FnMut(LocationCode<D>, &Node),
    ) {
        self.core.visit_bfs(selector, procedure);
    }

    /// Depth-first pre-order variant of [`Self::visit_nodes`].
    pub fn visit_nodes_dfs(
        &self,
        selector: impl FnMut(LocationCode<D>, &Node) -> bool,
        procedure: impl FnMut(LocationCode<D>, &Node),
    ) {
        self.core.visit_dfs(selector, procedure);
    }

    /// Index `points[id]`, creating at most one new node.
    ///
    /// If the owner ends up over the element limit it demotes its entities
    /// into their child cells, one level at a time.
    pub fn insert(&mut self, id: EntityId, points: &[A::Point]) -> Result<(), EditError> {
        let p = points
            .get(id as usize)
            .ok_or(EditError::UnknownEntity(id))?;
        let target = self.core.grid.point_code(&A::point_coords(p));
        let owner = self.core.locate_or_create_owner(target);
        if let Some(node) = self.core.table.get_mut(owner) {
            node.add_entity(id);
        }
        self.demote_overflowing(owner, points);
        Ok(())
    }

    /// Remove `id` from the tree.
    pub fn erase(&mut self, id: EntityId) -> Result<(), EditError> {
        if self.core.erase_everywhere(id) {
            Ok(())
        } else {
            Err(EditError::UnknownEntity(id))
        }
    }

    /// Re-index `id` after its point moved: erase, then insert.
    pub fn update(&mut self, id: EntityId, points: &[A::Point]) -> Result<(), EditError> {
        self.erase(id)?;
        self.insert(id, points)
    }

    /// Bulk-rename owner ids; `remap` returning `None` drops the entity.
    pub fn update_indexes(&mut self, remap: impl FnMut(EntityId) -> Option<EntityId>) {
        self.core.update_indexes(remap);
    }

    fn walk_point_chain(&self, target: &[A::Scalar; D], mut f: impl FnMut(&Node)) {
        let full = self.core.grid.point_code(target);
        let max_depth = self.core.grid.max_depth();
        let mut code = LocationCode::ROOT;
        loop {
            let Some(node) = self.core.table.get(code) else {
                return;
            };
            f(node);
            if code.depth() == max_depth {
                return;
            }
            let next = full.ancestor(max_depth - code.depth() - 1);
            if !node.has_child(next.child_index()) {
                return;
            }
            code = next;
        }
    }

    fn plane_filtered(
        &self,
        points: &[A::Point],
        normal: &[A::Scalar; D],
        offset: A::Scalar,
        cell_pass: impl Fn(A::Scalar, A::Scalar) -> bool,
        point_pass: impl Fn(A::Scalar) -> bool,
    ) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.core.visit_dfs(
            |code, _| {
                let (lo, hi) = self.core.cell(code).plane_distance_range(normal, offset);
                cell_pass(lo, hi)
            },
            |_, node| {
                for &id in node.entities() {
                    if let Some(p) = points.get(id as usize)
                        && point_pass(signed_distance(normal, offset, &A::point_coords(p)))
                    {
                        out.push(id);
                    }
                }
            },
        );
        finish(out)
    }

    fn demote_overflowing(&mut self, code: LocationCode<D>, points: &[A::Point]) {
        let max_depth = self.core.grid.max_depth();
        let ids = match self.core.table.get_mut(code) {
            Some(node)
                if node.is_leaf()
                    && node.entities().len() > self.core.max_elements
                    && code.depth() < max_depth =>
            {
                node.take_entities()
            }
            _ => return,
        };
        let levels_above_child = max_depth - code.depth() - 1;
        let mut stay: SmallVec<[EntityId; 4]> = SmallVec::new();
        let mut touched: SmallVec<[LocationCode<D>; 8]> = SmallVec::new();
        for id in ids {
            let Some(p) = points.get(id as usize) else {
                stay.push(id);
                continue;
            };
            let child = self
                .core
                .grid
                .point_code(&A::point_coords(p))
                .ancestor(levels_above_child);
            self.core.table.ensure(child);
            if let Some(node) = self.core.table.get_mut(child) {
                node.add_entity(id);
            }
            if !touched.contains(&child) {
                touched.push(child);
            }
        }
        if let Some(node) = self.core.table.get_mut(code) {
            node.set_entities(stay);
        }
        for child in touched {
            self.demote_overflowing(child, points);
        }
    }
}

impl<A: Adaptor<D>, const D: usize> Clone for PointTree<A, D> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<A: Adaptor<D>, const D: usize> PartialEq for PointTree<A, D> {
    fn eq(&self, other: &Self) -> bool {
        self.core == other.core
    }
}

impl<A: Adaptor<D>, const D: usize> core::fmt::Debug for PointTree<A, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PointTree")
            .field("core", &self.core)
            .finish()
    }
}

enum Candidate<const D: usize> {
    Node(LocationCode<D>),
    Entity(EntityId),
}

impl<const D: usize> Candidate<D> {
    fn rank(&self) -> (u8, u64) {
        match self {
            Self::Entity(id) => (0, u64::from(*id)),
            Self::Node(code) => (1, code.raw()),
        }
    }
}

struct Queued<S, const D: usize> {
    lower_bound: OrdScalar<S>,
    item: Candidate<D>,
}

impl<S: Scalar, const D: usize> PartialEq for Queued<S, D> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == core::cmp::Ordering::Equal
    }
}

impl<S: Scalar, const D: usize> Eq for Queued<S, D> {}

impl<S: Scalar, const D: usize> PartialOrd for Queued<S, D> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: Scalar, const D: usize> Ord for Queued<S, D> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.lower_bound
            .cmp(&other.lower_bound)
            .then_with(|| self.item.rank().cmp(&other.item.rank()))
    }
}

fn bounds_of_points<A: Adaptor<D>, const D: usize>(points: &[A::Point]) -> Aabb<A::Scalar, D> {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        // Empty span, no world box given: any non-degenerate box serves.
        return Aabb::new([A::Scalar::zero(); D], [A::Scalar::one(); D]);
    };
    let first = A::point_coords(first);
    let mut bounds = Aabb::new(first, first);
    for p in iter {
        bounds.expand_to_point(&A::point_coords(p));
    }
    bounds
}

fn point_items<S: Scalar, const D: usize>(
    grid: &GridSpace<S, D>,
    coords: &[[S; D]],
    policy: crate::build::ExecutionPolicy,
) -> Vec<BuildItem> {
    let max_depth = grid.max_depth();
    let one = |(i, c): (usize, &[S; D])| {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "entity ids are 32-bit by design"
        )]
        let id = i as EntityId;
        BuildItem::new(grid.point_code(c), max_depth, id)
    };
    #[cfg(feature = "parallel")]
    if policy == crate::build::ExecutionPolicy::Parallel {
        use rayon::prelude::*;
        return coords.par_iter().enumerate().map(one).collect();
    }
    let _ = policy;
    coords.iter().enumerate().map(one).collect()
}
