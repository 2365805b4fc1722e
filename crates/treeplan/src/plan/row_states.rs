//! Flat per-row input states.
//!
//! Each graph contributes a start-of-sequence state followed by one state
//! per active row except the last: row states feed the next row's
//! prediction, so the final row is never an input. States across the batch
//! share one index space; `offset` tracks each graph's base.

use crate::graph::{SparseGraph, TreeStore};
use crate::plan::JobPlanner;

/// Gather lists for the flat row-state embedding.
///
/// `bot_*` scatter vocabulary ids (0 start-of-sequence, 1 empty row, 2 add
/// leaf, 3 delete leaf) and `prev_*` scatter finished root-job states; `tos`
/// are destinations in the shared state buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowStates {
    pub bot_froms: Vec<u32>,
    pub bot_tos: Vec<u32>,
    pub prev_froms: Vec<u32>,
    pub prev_tos: Vec<u32>,
}

pub(crate) fn build(
    planner: &JobPlanner,
    graphs: &[SparseGraph],
    store: &TreeStore,
) -> RowStates {
    let mut out = RowStates::default();
    let mut offset = 0u32;
    for g in graphs {
        // The last row only serves as a prediction target.
        let ub = g.active_rows().len().saturating_sub(1);
        out.bot_froms.push(0);
        out.bot_tos.push(offset);
        offset += 1;
        for j in 0..ub {
            let root_id = store.row(g.active_rows()[j]).root;
            let root = store.node(root_id);
            if root.has_edge && !root.is_leaf() && !root.is_lowlevel {
                let pos = planner.position_of(planner.require_job(root_id));
                out.prev_froms.push(pos);
                out.prev_tos.push(j as u32 + offset);
            } else {
                // Packed roots fall through with the start-of-sequence id.
                let bid = if !root.has_edge {
                    1
                } else if root.is_leaf() {
                    if root.leaf_sign() > 0 {
                        2
                    } else {
                        3
                    }
                } else {
                    0
                };
                out.bot_froms.push(bid);
                out.bot_tos.push(j as u32 + offset);
            }
        }
        offset += ub as u32;
    }
    out
}
