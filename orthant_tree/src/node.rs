// Copyright 2026 the Orthant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node records and the flat code-keyed node table.

use alloc::collections::BTreeMap;
use smallvec::SmallVec;

use orthant_grid::LocationCode;

/// Index of an entity in the caller's span.
pub type EntityId = u32;

/// One cell of the tree: which children exist, and which entities live here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    child_mask: u64,
    entities: SmallVec<[EntityId; 4]>,
}

impl Node {
    /// Bitmask over the `2^D` child codes; bit `i` is set iff child `i`
    /// exists in the table.
    pub fn child_mask(&self) -> u64 {
        self.child_mask
    }

    /// Entities owned by this node, ascending by id.
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Whether no child cells exist below this node.
    pub fn is_leaf(&self) -> bool {
        self.child_mask == 0
    }

    /// Whether child `i` exists.
    pub fn has_child(&self, i: u64) -> bool {
        self.child_mask & (1 << i) != 0
    }

    /// Child indices present, ascending.
    pub fn child_indices(&self) -> impl Iterator<Item = u64> + '_ {
        let mut mask = self.child_mask;
        core::iter::from_fn(move || {
            if mask == 0 {
                return None;
            }
            let i = mask.trailing_zeros() as u64;
            mask &= mask - 1;
            Some(i)
        })
    }

    pub(crate) fn set_child(&mut self, i: u64) {
        self.child_mask |= 1 << i;
    }

    pub(crate) fn clear_child(&mut self, i: u64) {
        self.child_mask &= !(1 << i);
    }

    /// Add an entity, keeping the id order; duplicates are ignored.
    pub(crate) fn add_entity(&mut self, id: EntityId) {
        if let Err(pos) = self.entities.binary_search(&id) {
            self.entities.insert(pos, id);
        }
    }

    /// Remove an entity if present; returns whether it was there.
    pub(crate) fn remove_entity(&mut self, id: EntityId) -> bool {
        match self.entities.binary_search(&id) {
            Ok(pos) => {
                self.entities.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub(crate) fn set_entities(&mut self, mut ids: SmallVec<[EntityId; 4]>) {
        ids.sort_unstable();
        ids.dedup();
        self.entities = ids;
    }

    pub(crate) fn take_entities(&mut self) -> SmallVec<[EntityId; 4]> {
        core::mem::take(&mut self.entities)
    }

    pub(crate) fn has_entity(&self, id: EntityId) -> bool {
        self.entities.binary_search(&id).is_ok()
    }
}

/// Flat associative table from location code to node record.
///
/// The ordered map iterates codes depth-major in Morton order, which is the
/// stable space-filling traversal the queries and equality checks rely on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeTable<const D: usize> {
    nodes: BTreeMap<LocationCode<D>, Node>,
}

impl<const D: usize> NodeTable<D> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by code.
    pub fn get(&self, code: LocationCode<D>) -> Option<&Node> {
        self.nodes.get(&code)
    }

    /// The root node, present iff the tree is non-empty.
    pub fn root(&self) -> Option<&Node> {
        self.get(LocationCode::ROOT)
    }

    /// Iterate `(code, node)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (LocationCode<D>, &Node)> {
        self.nodes.iter().map(|(c, n)| (*c, n))
    }

    pub(crate) fn get_mut(&mut self, code: LocationCode<D>) -> Option<&mut Node> {
        self.nodes.get_mut(&code)
    }

    pub(crate) fn insert(&mut self, code: LocationCode<D>, node: Node) {
        self.nodes.insert(code, node);
    }

    pub(crate) fn contains(&self, code: LocationCode<D>) -> bool {
        self.nodes.contains_key(&code)
    }

    pub(crate) fn codes(&self) -> impl Iterator<Item = LocationCode<D>> + '_ {
        self.nodes.keys().copied()
    }

    /// Create `code` (and any missing ancestors), wiring child mask bits.
    pub(crate) fn ensure(&mut self, code: LocationCode<D>) {
        if self.nodes.contains_key(&code) {
            return;
        }
        self.nodes.insert(code, Node::default());
        let mut c = code;
        while !c.is_root() {
            let parent = c.parent();
            let existed = self.nodes.contains_key(&parent);
            self.nodes
                .entry(parent)
                .or_default()
                .set_child(c.child_index());
            if existed {
                break;
            }
            c = parent;
        }
    }

    /// Delete `code` if it is an empty leaf, cascading to emptied ancestors.
    pub(crate) fn prune_upward(&mut self, code: LocationCode<D>) {
        let mut c = code;
        loop {
            let Some(node) = self.nodes.get(&c) else { return };
            if !node.is_leaf() || !node.entities.is_empty() {
                return;
            }
            self.nodes.remove(&c);
            if c.is_root() {
                return;
            }
            let parent = c.parent();
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.clear_child(c.child_index());
            }
            c = parent;
        }
    }
}
