//! Slab-style allocation for tree nodes and row anchors.
//!
//! Batches are planned over and over with the same shapes, so the pools
//! recycle slots across batches: `reset` rewinds the cursor without dropping
//! capacity, and `alloc` overwrites stale slots before growing the backing
//! vector.

use crate::graph::tree::{NodeId, Row, RowId, TreeNode};

/// Bump allocator that reuses its slots after `reset`.
#[derive(Debug)]
pub struct Pool<T> {
    slots: Vec<T>,
    cursor: usize,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Pool {
            slots: Vec::new(),
            cursor: 0,
        }
    }

    /// Stores `value` in the next slot and returns its index.
    pub fn alloc(&mut self, value: T) -> u32 {
        let index = self.cursor;
        if index < self.slots.len() {
            self.slots[index] = value;
        } else {
            self.slots.push(value);
        }
        self.cursor += 1;
        index as u32
    }

    pub fn get(&self, index: u32) -> &T {
        debug_assert!((index as usize) < self.cursor, "stale pool index {index}");
        &self.slots[index as usize]
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Rewinds the cursor; slot contents stay allocated for reuse.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Drops all capacity.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Pool::new()
    }
}

/// Owning store for every tree node and row anchor of a batch.
///
/// All cross-references between nodes go through [`NodeId`] indices into
/// this store, so graphs and planners borrow it instead of owning slices of
/// each other.
#[derive(Debug, Default)]
pub struct TreeStore {
    nodes: Pool<TreeNode>,
    rows: Pool<Row>,
}

impl TreeStore {
    pub fn new() -> Self {
        TreeStore::default()
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        self.nodes.get(id.0)
    }

    pub fn row(&self, id: RowId) -> &Row {
        self.rows.get(id.0)
    }

    pub(crate) fn alloc_node(&mut self, node: TreeNode) -> NodeId {
        NodeId(self.nodes.alloc(node))
    }

    pub(crate) fn alloc_row(&mut self, row: Row) -> RowId {
        RowId(self.rows.alloc(row))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Recycles all slots for the next batch.
    pub fn reset(&mut self) {
        self.nodes.reset();
        self.rows.reset();
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.rows.clear();
    }
}
