// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Box orthotree: canonical-node storage with the deeper split strategy.
//!
//! A box lives at the smallest cell that fully contains it. With a split
//! depth `k > 0`, a box whose canonical cell is much larger than itself is
//! replicated into every overlapping cell `k` levels further down, which
//! trades duplicate ownership (queries deduplicate by id) for selectivity.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use orthant_grid::{Aabb, Adaptor, GridSpace, LocationCode, Scalar};
use smallvec::SmallVec;

use crate::build::{
    BuildItem, BuildOptions, ExecutionPolicy, codes_for_cell_range, fold_items, sort_items,
    validate_dimensions,
};
use crate::traversal::{OrdScalar, TreeCore, finish, lt};
use crate::error::{EditError, TreeError};
use crate::node::{EntityId, Node, NodeTable};

/// An orthotree over axis-aligned box entities.
///
/// The tree does not own the boxes; every query and edit takes the caller's
/// span, and entity ids are indices into it. Queries return ids in
/// ascending order (parameter-ascending for rays, `(min, max)` pairs for
/// collisions) and never error.
pub struct BoxTree<A: Adaptor<D>, const D: usize> {
    core: TreeCore<A, D>,
    split_depth: u8,
}

impl<A: Adaptor<D>, const D: usize> BoxTree<A, D> {
    /// Bulk-build a tree over `boxes`.
    ///
    /// The world box is taken from `options` or computed from the span;
    /// out-of-domain geometry clamps to the nearest edge cells.
    pub fn from_boxes(boxes: &[A::Box], options: &BuildOptions<A::Box>) -> Result<Self, TreeError> {
        validate_dimensions::<D>(options.max_depth)?;
        let aabbs: Vec<Aabb<A::Scalar, D>> = boxes.iter().map(|b| A::box_aabb(b)).collect();
        let bounds = match &options.world_box {
            Some(b) => A::box_aabb(b),
            None => bounds_of_boxes(&aabbs),
        };
        let grid = GridSpace::new(bounds, options.max_depth)?;

        let mut items = box_items(&grid, &aabbs, options.split_depth, options.policy);
        sort_items(&mut items, options.policy);
        let table = fold_items::<D>(&items, options.max_depth, options.max_elements_per_node);

        Ok(Self {
            core: TreeCore::new(grid, table, options.max_elements_per_node),
            split_depth: options.split_depth,
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

    /// Levels of replication below a box's canonical cell.
    pub fn split_depth(&self) -> u8 {
        self.split_depth
    }

    /// The flat code-keyed node table.
    pub fn nodes(&self) -> &NodeTable<D> {
        &self.core.table
    }

    /// Ids of boxes inside `range` (when `fully_contained`) or overlapping
    /// it with positive measure (otherwise), ascending.
    pub fn range_search(
        &self,
        boxes: &[A::Box],
        range: &A::Box,
        fully_contained: bool,
    ) -> Vec<EntityId> {
        let query = A::box_aabb(range);
        let mut out = Vec::new();
        self.core.visit_dfs(
            |code, _| query.overlaps(&self.core.cell(code)),
            |_, node| {
                for &id in node.entities() {
                    let Some(b) = boxes.get(id as usize) else {
                        continue;
                    };
                    let e = A::box_aabb(b);
                    let accept = if fully_contained {
                        query.contains_box(&e)
                    } else {
                        query.overlaps_strictly(&e)
                    };
                    if accept {
                        out.push(id);
                    }
                }
            },
        );
        finish(out)
    }

    /// Ids of boxes containing `at` (inclusive faces), ascending.
    pub fn pick_search(&self, boxes: &[A::Box], at: &A::Point) -> Vec<EntityId> {
        let target = A::point_coords(at);
        let full = self.core.grid.point_code(&target);
        let max_depth = self.core.grid.max_depth();
        let mut out = Vec::new();
        let mut code = LocationCode::ROOT;
        loop {
            let Some(node) = self.core.table.get(code) else {
                break;
            };
            for &id in node.entities() {
                if let Some(b) = boxes.get(id as usize)
                    && A::box_aabb(b).contains_point(&target)
                {
                    out.push(id);
                }
            }
            if code.depth() == max_depth {
                break;
            }
            let next = full.ancestor(max_depth - code.depth() - 1);
            if !node.has_child(next.child_index()) {
                break;
            }
            code = next;
        }
        finish(out)
    }

    /// All `(i, j)` pairs, `i < j`, whose boxes overlap with positive
    /// measure, ascending.
    ///
    /// Split-depth replication can surface a pair several times; the result
    /// is deduplicated. `policy` selects the sequential ancestor-stack walk
    /// or a per-node parallel scan; both produce the same output.
    pub fn collision_detection(
        &self,
        boxes: &[A::Box],
        policy: ExecutionPolicy,
    ) -> Vec<(EntityId, EntityId)> {
        let aabbs: Vec<Aabb<A::Scalar, D>> = boxes.iter().map(|b| A::box_aabb(b)).collect();
        let mut pairs = match policy {
            ExecutionPolicy::Sequential => self.collide_sequential(&aabbs),
            ExecutionPolicy::Parallel => self.collide_parallel(&aabbs),
        };
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Id of the first box hit by the ray, by entry parameter then id.
    pub fn ray_intersected_first(
        &self,
        boxes: &[A::Box],
        origin: &A::Point,
        dir: &A::Point,
        tolerance: A::Scalar,
    ) -> Option<EntityId> {
        let o = A::point_coords(origin);
        let v = A::point_coords(dir);
        let mut best: Option<(OrdScalar<A::Scalar>, EntityId)> = None;
        if !self.core.table.is_empty() {
            self.ray_first_rec(LocationCode::ROOT, boxes, &o, &v, tolerance, &mut best);
        }
        best.map(|(_, id)| id)
    }

    /// Every box hit by the ray with its entry parameter, ascending by
    /// parameter then id; replicated boxes keep their nearest hit.
    pub fn ray_intersected_all(
        &self,
        boxes: &[A::Box],
        origin: &A::Point,
        dir: &A::Point,
        tolerance: A::Scalar,
    ) -> Vec<(EntityId, A::Scalar)> {
        let o = A::point_coords(origin);
        let v = A::point_coords(dir);
        let mut hits: Vec<(OrdScalar<A::Scalar>, EntityId)> = Vec::new();
        self.core.visit_dfs(
            |code, _| self.core.cell(code).ray_entry(&o, &v, tolerance).is_some(),
            |_, node| {
                for &id in node.entities() {
                    if let Some(b) = boxes.get(id as usize)
                        && let Some(t) = A::box_aabb(b).ray_entry(&o, &v, tolerance)
                    {
                        hits.push((OrdScalar(t), id));
                    }
                }
            },
        );
        hits.sort_unstable();
        let mut seen: BTreeSet<EntityId> = BTreeSet::new();
        hits.retain(|&(_, id)| seen.insert(id));
        hits.into_iter().map(|(t, id)| (id, t.0)).collect()
    }

    /// Ids of boxes straddling the hyperplane `dot(normal, x) = offset`
    /// within `tolerance`, ascending.
    pub fn plane_intersection(
        &self,
        boxes: &[A::Box],
        normal: &A::Point,
        offset: A::Scalar,
        tolerance: A::Scalar,
    ) -> Vec<EntityId> {
        let n = A::point_coords(normal);
        let neg_tol = A::Scalar::sub(A::Scalar::zero(), tolerance);
        self.plane_filtered(boxes, &n, offset, move |lo, hi| {
            !(lt(tolerance, lo) || lt(hi, neg_tol))
        })
    }

    /// Ids of boxes on the positive side of the hyperplane, within
    /// `tolerance`, ascending.
    pub fn plane_positive_segmentation(
        &self,
        boxes: &[A::Box],
        normal: &A::Point,
        offset: A::Scalar,
        tolerance: A::Scalar,
    ) -> Vec<EntityId> {
        let n = A::point_coords(normal);
        let neg_tol = A::Scalar::sub(A::Scalar::zero(), tolerance);
        self.plane_filtered(boxes, &n, offset, move |lo, _| !lt(lo, neg_tol))
    }

    /// Ids of boxes inside the convex volume bounded by `planes` (positive
    /// side of each), within `tolerance`, ascending.
    pub fn frustum_culling(
        &self,
        boxes: &[A::Box],
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
                    let Some(b) = boxes.get(id as usize) else {
                        continue;
                    };
                    let e = A::box_aabb(b);
                    if planes
                        .iter()
                        .all(|(n, o)| !lt(e.plane_distance_range(n, *o).0, neg_tol))
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

    /// Index `boxes[id]`, placing every split fragment.
    ///
    /// Owners that end up over the element limit demote their entities into
    /// child cells, one level at a time.
    pub fn insert(&mut self, id: EntityId, boxes: &[A::Box]) -> Result<(), EditError> {
        let b = boxes
            .get(id as usize)
            .ok_or(EditError::UnknownEntity(id))?;
        let mut targets: SmallVec<[LocationCode<D>; 8]> = SmallVec::new();
        fragment_codes(&self.core.grid, &A::box_aabb(b), self.split_depth, |c| {
            targets.push(c);
        });
        for target in targets {
            let owner = self.core.locate_or_create_owner(target);
            if let Some(node) = self.core.table.get_mut(owner) {
                node.add_entity(id);
            }
            self.demote_overflowing(owner, boxes);
        }
        Ok(())
    }

    /// Remove `id` (every fragment of it) from the tree.
    pub fn erase(&mut self, id: EntityId) -> Result<(), EditError> {
        if self.core.erase_everywhere(id) {
            Ok(())
        } else {
            Err(EditError::UnknownEntity(id))
        }
    }

    /// Re-index `id` after its box moved: erase, then insert.
    pub fn update(&mut self, id: EntityId, boxes: &[A::Box]) -> Result<(), EditError> {
        self.erase(id)?;
        self.insert(id, boxes)
    }

    /// Bulk-rename owner ids; `remap` returning `None` drops the entity.
    pub fn update_indexes(&mut self, remap: impl FnMut(EntityId) -> Option<EntityId>) {
        self.core.update_indexes(remap);
    }

    fn collide_sequential(&self, aabbs: &[Aabb<A::Scalar, D>]) -> Vec<(EntityId, EntityId)> {
        let mut out = Vec::new();
        if !self.core.table.is_empty() {
            let mut stack: Vec<EntityId> = Vec::new();
            self.collide_rec(LocationCode::ROOT, aabbs, &mut stack, &mut out);
        }
        out
    }

    fn collide_rec(
        &self,
        code: LocationCode<D>,
        aabbs: &[Aabb<A::Scalar, D>],
        stack: &mut Vec<EntityId>,
        out: &mut Vec<(EntityId, EntityId)>,
    ) {
        let Some(node) = self.core.table.get(code) else {
            return;
        };
        let ids = node.entities();
        for (i, &a) in ids.iter().enumerate() {
            let Some(abox) = aabbs.get(a as usize) else {
                continue;
            };
            // Against everything owned by an ancestor on the current path.
            for &b in stack.iter() {
                if a != b
                    && let Some(bbox) = aabbs.get(b as usize)
                    && abox.overlaps_strictly(bbox)
                {
                    out.push((a.min(b), a.max(b)));
                }
            }
            // Against later siblings in this node; ids ascend, so i < j.
            for &b in &ids[i + 1..] {
                if let Some(bbox) = aabbs.get(b as usize)
                    && abox.overlaps_strictly(bbox)
                {
                    out.push((a, b));
                }
            }
        }
        let mark = stack.len();
        stack.extend_from_slice(ids);
        for child in self.core.children(code, node) {
            self.collide_rec(child, aabbs, stack, out);
        }
        stack.truncate(mark);
    }

    #[cfg(feature = "parallel")]
    fn collide_parallel(&self, aabbs: &[Aabb<A::Scalar, D>]) -> Vec<(EntityId, EntityId)> {
        use rayon::prelude::*;
        let nodes: Vec<(LocationCode<D>, &Node)> = self.core.table.iter().collect();
        nodes
            .par_iter()
            .map(|&(code, node)| {
                let mut local = Vec::new();
                let ids = node.entities();
                for (i, &a) in ids.iter().enumerate() {
                    let Some(abox) = aabbs.get(a as usize) else {
                        continue;
                    };
                    for &b in &ids[i + 1..] {
                        if let Some(bbox) = aabbs.get(b as usize)
                            && abox.overlaps_strictly(bbox)
                        {
                            local.push((a, b));
                        }
                    }
                }
                // Each node also scans its ancestor chain, covering every
                // ancestor/descendant pair exactly once from below.
                let mut anc = code;
                while !anc.is_root() {
                    anc = anc.parent();
                    let Some(up) = self.core.table.get(anc) else {
                        continue;
                    };
                    for &a in ids {
                        let Some(abox) = aabbs.get(a as usize) else {
                            continue;
                        };
                        for &b in up.entities() {
                            if a != b
                                && let Some(bbox) = aabbs.get(b as usize)
                                && abox.overlaps_strictly(bbox)
                            {
                                local.push((a.min(b), a.max(b)));
                            }
                        }
                    }
                }
                local
            })
            .reduce(Vec::new, |mut acc, mut part| {
                acc.append(&mut part);
                acc
            })
    }

    #[cfg(not(feature = "parallel"))]
    fn collide_parallel(&self, aabbs: &[Aabb<A::Scalar, D>]) -> Vec<(EntityId, EntityId)> {
        self.collide_sequential(aabbs)
    }

    fn ray_first_rec(
        &self,
        code: LocationCode<D>,
        boxes: &[A::Box],
        o: &[A::Scalar; D],
        v: &[A::Scalar; D],
        tolerance: A::Scalar,
        best: &mut Option<(OrdScalar<A::Scalar>, EntityId)>,
    ) {
        let Some(node) = self.core.table.get(code) else {
            return;
        };
        let Some(t_cell) = self.core.cell(code).ray_entry(o, v, tolerance) else {
            return;
        };
        if let Some((best_t, _)) = best
            && *best_t < OrdScalar(t_cell)
        {
            return;
        }
        for &id in node.entities() {
            if let Some(b) = boxes.get(id as usize)
                && let Some(t) = A::box_aabb(b).ray_entry(o, v, tolerance)
            {
                let cand = (OrdScalar(t), id);
                if best.is_none_or(|cur| cand < cur) {
                    *best = Some(cand);
                }
            }
        }
        // Children in entry order, nearest subtree first.
        let mut ordered: SmallVec<[(OrdScalar<A::Scalar>, LocationCode<D>); 8]> = self
            .core
            .children(code, node)
            .filter_map(|child| {
                self.core
                    .cell(child)
                    .ray_entry(o, v, tolerance)
                    .map(|t| (OrdScalar(t), child))
            })
            .collect();
        ordered.sort_unstable();
        for (_, child) in ordered {
            self.ray_first_rec(child, boxes, o, v, tolerance, best);
        }
    }

    fn plane_filtered(
        &self,
        boxes: &[A::Box],
        normal: &[A::Scalar; D],
        offset: A::Scalar,
        accept: impl Fn(A::Scalar, A::Scalar) -> bool,
    ) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.core.visit_dfs(
            |code, _| {
                let (lo, hi) = self.core.cell(code).plane_distance_range(normal, offset);
                accept(lo, hi)
            },
            |_, node| {
                for &id in node.entities() {
                    if let Some(b) = boxes.get(id as usize) {
                        let (lo, hi) = A::box_aabb(b).plane_distance_range(normal, offset);
                        if accept(lo, hi) {
                            out.push(id);
                        }
                    }
                }
            },
        );
        finish(out)
    }

    /// Split an overflowing leaf the way the bulk fold would have.
    ///
    /// The fold splits on the number of placement fragments in a node's
    /// range, not on unique ids, so the same pressure is recomputed from
    /// geometry here; fragments pinned at this depth stay put.
    fn demote_overflowing(&mut self, code: LocationCode<D>, boxes: &[A::Box]) {
        let max_depth = self.core.grid.max_depth();
        let depth = code.depth();
        match self.core.table.get(code) {
            Some(node) if node.is_leaf() && depth < max_depth => {}
            _ => return,
        }
        let ids: SmallVec<[EntityId; 4]> = self
            .core
            .table
            .get(code)
            .map(|n| n.entities().iter().copied().collect())
            .unwrap_or_default();

        let mut pressure = 0_usize;
        let mut placements: SmallVec<[(EntityId, SmallVec<[LocationCode<D>; 8]>); 4]> =
            SmallVec::new();
        for &id in &ids {
            let mut deeper: SmallVec<[LocationCode<D>; 8]> = SmallVec::new();
            let mut pinned = boxes.get(id as usize).is_none();
            if let Some(b) = boxes.get(id as usize) {
                fragment_codes(&self.core.grid, &A::box_aabb(b), self.split_depth, |frag| {
                    if frag == code {
                        pinned = true;
                    } else if code.is_ancestor_of(frag) {
                        deeper.push(frag);
                    }
                });
            }
            if pinned || deeper.is_empty() {
                pressure += 1;
                placements.push((id, SmallVec::new()));
            } else {
                pressure += deeper.len();
                placements.push((id, deeper));
            }
        }
        if pressure <= self.core.max_elements {
            return;
        }

        let mut stay: SmallVec<[EntityId; 4]> = SmallVec::new();
        let mut touched: SmallVec<[LocationCode<D>; 8]> = SmallVec::new();
        for (id, deeper) in placements {
            if deeper.is_empty() {
                stay.push(id);
                continue;
            }
            for frag in deeper {
                let child = frag.ancestor(frag.depth() - depth - 1);
                self.core.table.ensure(child);
                if let Some(node) = self.core.table.get_mut(child) {
                    node.add_entity(id);
                }
                if !touched.contains(&child) {
                    touched.push(child);
                }
            }
        }
        if let Some(node) = self.core.table.get_mut(code) {
            node.set_entities(stay);
        }
        for child in touched {
            self.demote_overflowing(child, boxes);
        }
    }
}

impl<A: Adaptor<D>, const D: usize> Clone for BoxTree<A, D> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            split_depth: self.split_depth,
        }
    }
}

impl<A: Adaptor<D>, const D: usize> PartialEq for BoxTree<A, D> {
    fn eq(&self, other: &Self) -> bool {
        self.split_depth == other.split_depth && self.core == other.core
    }
}

impl<A: Adaptor<D>, const D: usize> core::fmt::Debug for BoxTree<A, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoxTree")
            .field("core", &self.core)
            .field("split_depth", &self.split_depth)
            .finish()
    }
}

/// Emit the placement codes of one box: every cell overlapping it at
/// `split_depth` levels below its canonical cell (clamped to the leaf
/// depth). With `split_depth` zero this is the canonical code alone.
fn fragment_codes<S: Scalar, const D: usize>(
    grid: &GridSpace<S, D>,
    aabb: &Aabb<S, D>,
    split_depth: u8,
    emit: impl FnMut(LocationCode<D>),
) {
    let (grid_min, grid_max) = grid.box_to_grid(aabb);
    let canonical = grid.canonical_depth(&grid_min, &grid_max);
    let target = canonical.saturating_add(split_depth).min(grid.max_depth());
    let shift = grid.max_depth() - target;
    let lo = core::array::from_fn(|d| grid_min[d] >> shift);
    let hi = core::array::from_fn(|d| grid_max[d] >> shift);
    codes_for_cell_range(&lo, &hi, target, emit);
}

fn bounds_of_boxes<S: Scalar, const D: usize>(aabbs: &[Aabb<S, D>]) -> Aabb<S, D> {
    let mut iter = aabbs.iter();
    let Some(first) = iter.next() else {
        // Empty span, no world box given: any non-degenerate box serves.
        return Aabb::new([S::zero(); D], [S::one(); D]);
    };
    let mut bounds = *first;
    for b in iter {
        bounds.expand_to_box(b);
    }
    bounds
}

fn box_items<S: Scalar, const D: usize>(
    grid: &GridSpace<S, D>,
    aabbs: &[Aabb<S, D>],
    split_depth: u8,
    policy: ExecutionPolicy,
) -> Vec<BuildItem> {
    let max_depth = grid.max_depth();
    let one = |(i, aabb): (usize, &Aabb<S, D>)| {
        let mut items: SmallVec<[BuildItem; 4]> = SmallVec::new();
        fragment_codes(grid, aabb, split_depth, |code| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "entity ids are 32-bit by design"
            )]
            items.push(BuildItem::new(code, max_depth, i as EntityId));
        });
        items
    };
    #[cfg(feature = "parallel")]
    if policy == ExecutionPolicy::Parallel {
        use rayon::prelude::*;
        return aabbs
            .par_iter()
            .enumerate()
            .map(one)
            .flatten_iter()
            .collect();
    }
    let _ = policy;
    aabbs.iter().enumerate().flat_map(one).collect()
}
