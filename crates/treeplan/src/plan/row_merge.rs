//! Pairwise row-state merging, level by level.
//!
//! Row states collapse like a Fenwick tree: level 0 pairs up adjacent row
//! roots, every further level pairs up the previous level's outputs. A
//! window that starts mid-graph is padded on the left with carried prefix
//! states, one per set bit of `node_start`, so merged states line up with
//! absolute row positions.

use crate::bits::{bit_at, num_ones};
use crate::graph::{SparseGraph, TreeStore};
use crate::plan::JobPlanner;

/// Gather lists per merge level, left (0) and right (1) operands apart.
///
/// Level 0 reads row roots: finished root jobs through `top_*[side][0]`,
/// everything else as vocabulary ids (0 empty, 1 add leaf, 2 delete leaf)
/// through the flat `bot_*[side]`. Levels above read the previous level's
/// outputs through `top_*[side][lv]`. `prev_*` pull carried prefix states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowMerge {
    pub bot_froms: [Vec<u32>; 2],
    pub bot_tos: [Vec<u32>; 2],
    pub top_froms: [Vec<Vec<u32>>; 2],
    pub top_tos: [Vec<Vec<u32>>; 2],
    pub prev_froms: [Vec<Vec<u32>>; 2],
    pub prev_tos: [Vec<Vec<u32>>; 2],
    pub max_levels: u32,
}

pub(crate) fn build(
    planner: &JobPlanner,
    graphs: &[SparseGraph],
    store: &TreeStore,
) -> (RowMerge, u32) {
    let mut out = RowMerge::default();
    let mut fallbacks = 0u32;
    for side in 0..2 {
        out.top_froms[side].push(Vec::new());
        out.top_tos[side].push(Vec::new());
        out.prev_froms[side].push(Vec::new());
        out.prev_tos[side].push(Vec::new());
    }

    let mut offset = 0u32;
    let mut prev_offset = 0u32;
    let mut layer_sizes: Vec<u32> = Vec::new();
    let mut used_cnts: Vec<u32> = Vec::new();
    let mut has_next = false;

    for g in graphs {
        let carry = g.node_start() & 1;
        used_cnts.push(carry);
        let ub = (g.active_rows().len() as u32 + carry) / 2;
        for j in 0..ub {
            for k in 0..2usize {
                let row_pos = (j * 2 + k as u32) as i64 - carry as i64;
                if row_pos < 0 {
                    // Left operand comes from the carried prefix state.
                    out.prev_froms[k][0].push(prev_offset);
                    out.prev_tos[k][0].push(j + offset);
                    continue;
                }
                let root_id = store.row(g.active_rows()[row_pos as usize]).root;
                let root = store.node(root_id);
                if root.has_edge && !root.is_leaf() && !root.is_lowlevel {
                    let pos = planner.position_of(planner.require_job(root_id));
                    out.top_froms[k][0].push(pos);
                    out.top_tos[k][0].push(j + offset);
                } else {
                    let bid = if root.has_edge && !root.is_leaf() {
                        fallbacks += 1;
                        2 + planner.position_of(planner.require_job(root_id))
                    } else if !root.has_edge {
                        0
                    } else if root.leaf_sign() > 0 {
                        1
                    } else {
                        2
                    };
                    out.bot_froms[k].push(bid);
                    out.bot_tos[k].push(j + offset);
                }
            }
        }
        offset += ub;
        layer_sizes.push(ub);
        if ub >= 2 || bit_at(g.node_start(), 1) {
            has_next = true;
        }
        prev_offset += num_ones(g.node_start());
    }

    let mut lv = 1u32;
    while has_next {
        has_next = false;
        for side in 0..2 {
            out.top_froms[side].push(Vec::new());
            out.top_tos[side].push(Vec::new());
            out.prev_froms[side].push(Vec::new());
            out.prev_tos[side].push(Vec::new());
        }
        let mut old_offset = 0u32;
        prev_offset = 0;
        offset = 0;
        for (i, g) in graphs.iter().enumerate() {
            let carry = bit_at(g.node_start(), lv) as u32;
            let ub = (layer_sizes[i] + carry) / 2;
            let lvl = lv as usize;
            for j in 0..ub {
                for k in 0..2usize {
                    let row_pos = (j * 2 + k as u32 + old_offset) as i64 - carry as i64;
                    if row_pos < old_offset as i64 {
                        out.prev_froms[k][lvl].push(prev_offset + used_cnts[i]);
                        out.prev_tos[k][lvl].push(offset + j);
                        continue;
                    }
                    out.top_froms[k][lvl].push(row_pos as u32);
                    out.top_tos[k][lvl].push(offset + j);
                }
            }
            used_cnts[i] += carry;
            old_offset += layer_sizes[i];
            layer_sizes[i] = ub;
            offset += ub;
            if ub >= 2 || bit_at(g.node_start(), lv + 1) {
                has_next = true;
            }
            prev_offset += num_ones(g.node_start());
        }
        lv += 1;
    }
    out.max_levels = lv;
    (out, fallbacks)
}
