//! Per-row binary trees over half-open column ranges.
//!
//! Every realized row owns one tree. Ranges split at their midpoint until a
//! single column remains, with two shortcuts: ranges without pending edges
//! collapse to [`NodeKind::Empty`], and ranges at or under the configured
//! packing width collapse to a [`NodeKind::Bits`] payload instead of
//! descending further.

use crate::bits::BitVec;
use crate::config::PlanConfig;
use crate::graph::cursor::ColumnCursor;
use crate::graph::pool::TreeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct RowId(pub u32);

/// One realized row: its node index, column span and tree root.
#[derive(Debug, Clone, Copy)]
pub struct Row {
    pub node: u32,
    pub col_begin: u32,
    pub col_end: u32,
    pub root: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Range split at its midpoint; both children exist.
    Internal { left: NodeId, right: NodeId },
    /// Single column carrying a signed delta.
    Leaf { sign: i32 },
    /// Packed range: resulting adjacency bits after applying deltas to the
    /// previous level.
    Bits(BitVec),
    /// Range without pending edges.
    Empty,
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub depth: u32,
    pub col_begin: u32,
    pub col_end: u32,
    pub has_edge: bool,
    pub edge_count: u32,
    pub is_lowlevel: bool,
    pub kind: NodeKind,
}

impl TreeNode {
    pub fn width(&self) -> u32 {
        self.col_end - self.col_begin
    }

    pub fn is_leaf(&self) -> bool {
        self.width() == 1
    }

    /// Sign of a single-column leaf; panics on any other kind.
    pub fn leaf_sign(&self) -> i32 {
        match self.kind {
            NodeKind::Leaf { sign } => {
                assert_ne!(sign, 0);
                sign
            }
            _ => panic!(
                "leaf_sign on a node spanning [{}, {})",
                self.col_begin, self.col_end
            ),
        }
    }
}

/// Builds the tree over `[col_begin, col_end)`, consuming the cursor's
/// entries in column order, and returns the subtree root.
pub(crate) fn build_tree(
    store: &mut TreeStore,
    cursor: &mut ColumnCursor<'_>,
    col_begin: u32,
    col_end: u32,
    depth: u32,
    cfg: &PlanConfig,
) -> NodeId {
    // Row 0 realizes an empty range when self loops are off.
    assert!(col_begin <= col_end);
    let width = col_end - col_begin;
    let has_edge = cursor.has_edge(col_begin, col_end);
    // Count before descending: recursion consumes the entries.
    let edge_count = cursor.num_edges(col_begin, col_end);

    let mut is_lowlevel = false;
    let kind = if !has_edge {
        NodeKind::Empty
    } else if width == 1 {
        NodeKind::Leaf {
            sign: cursor.add_edge(col_begin),
        }
    } else if cfg.packs(width) {
        is_lowlevel = true;
        NodeKind::Bits(pack_bits(cursor, col_begin, col_end))
    } else {
        let mid = (col_begin + col_end) / 2;
        let left = build_tree(store, cursor, col_begin, mid, depth + 1, cfg);
        let right = build_tree(store, cursor, mid, col_end, depth + 1, cfg);
        NodeKind::Internal { left, right }
    };

    store.alloc_node(TreeNode {
        depth,
        col_begin,
        col_end,
        has_edge,
        edge_count,
        is_lowlevel,
        kind,
    })
}

/// Packs `[begin, end)` into adjacency bits: the previous level's history
/// seeded first, then each pending signed delta applied on top.
fn pack_bits(cursor: &mut ColumnCursor<'_>, begin: u32, end: u32) -> BitVec {
    let mut bits = BitVec::new(end - begin);
    for col in begin..end {
        if cursor.had_edge(col) {
            bits.set(col - begin);
        }
    }
    while let Some(col) = cursor.next_edge() {
        if col >= end {
            break;
        }
        let sign = cursor.add_edge(col);
        if sign > 0 {
            bits.set(col - begin);
        } else {
            bits.clear(col - begin);
        }
    }
    bits
}
