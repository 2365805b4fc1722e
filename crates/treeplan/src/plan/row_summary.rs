//! Prefix summaries of row states, one pass per Fenwick layer.
//!
//! Every absolute row index `j + node_start` decomposes into set bits; the
//! summary of rows `[0, j)` is the running merge of one source per set bit.
//! The first pass seeds every row's first source, later passes fold in one
//! more source for rows whose index has that many set bits. `step_froms` /
//! `step_nexts` diff consecutive passes so the consumer knows which states
//! are final and which continue into the next pass.

use std::collections::HashMap;

use crate::bits::{bit_at, num_ones};
use crate::graph::{SparseGraph, TreeStore};
use crate::plan::JobPlanner;

/// Scheduling tables for the summary passes.
///
/// `step_inputs[p]` / `step_indices[p]` are pass `p`'s source ids and
/// destination states. Sources below the per-batch offset are vocabulary
/// ids (0 start-of-sequence, 1 empty row, 2 add leaf, 3 delete leaf);
/// sources at or above it address root jobs, carried prefix states and
/// upper merge layers, in that order. `next_state_froms` summarizes the
/// full window for the next generation step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSummary {
    pub(crate) tree_idx_map: Vec<HashMap<u64, u32>>,
    pub step_inputs: Vec<Vec<u32>>,
    pub step_indices: Vec<Vec<u32>>,
    pub step_froms: Vec<Vec<u32>>,
    pub step_tos: Vec<Vec<u32>>,
    pub step_nexts: Vec<Vec<u32>>,
    pub next_state_froms: Vec<u32>,
    pub max_steps: u32,
}

pub(crate) fn build(
    planner: &JobPlanner,
    graphs: &[SparseGraph],
    store: &TreeStore,
) -> (RowSummary, u32) {
    let mut out = RowSummary::default();
    let mut fallbacks = 0u32;

    let mut layer_sizes: Vec<u32> = Vec::new();
    let mut used_cnts: Vec<u32> = Vec::new();
    let mut past_cnts: Vec<u32> = Vec::new();
    let mut tot_past = 0u32;
    for g in graphs {
        layer_sizes.push(g.active_rows().len() as u32);
        out.tree_idx_map.push(HashMap::new());
        used_cnts.push(0);
        let past = num_ones(g.node_start());
        past_cnts.push(past);
        tot_past += past;
    }

    // Ids 0..4 are the vocabulary, then level-0 binary jobs when packing is
    // on, then one id per carried prefix state, then everything layered.
    let mut has_job = true;
    let mut layer = 0u32;
    let mut global_offset = 4u32;
    if planner.config().bits_compress > 0 {
        global_offset += planner.tree().n_bin_per_level.first().copied().unwrap_or(0);
    }
    let past_start_offset = global_offset;
    global_offset += tot_past;

    while has_job {
        has_job = false;
        let mut past_offset = past_start_offset;
        for (i, g) in graphs.iter().enumerate() {
            let num_rows = g.active_rows().len() as u64;
            let mut cnt = 0u32;
            let cur_bit = bit_at(g.node_start(), layer) as u64;
            let key_base = layer as u64 * num_rows;
            if layer == 0 {
                for j in 0..layer_sizes[i] {
                    let root_id = store.row(g.active_rows()[j as usize]).root;
                    let root = store.node(root_id);
                    let key = key_base + j as u64 + cur_bit;
                    if root.has_edge && !root.is_leaf() && !root.is_lowlevel {
                        out.tree_idx_map[i].insert(key, cnt + global_offset);
                        cnt += 1;
                    } else {
                        let bid = if root.has_edge && !root.is_leaf() {
                            fallbacks += 1;
                            3 + planner.position_of(planner.require_job(root_id))
                        } else if !root.has_edge {
                            1
                        } else if root.leaf_sign() > 0 {
                            2
                        } else {
                            3
                        };
                        out.tree_idx_map[i].insert(key, bid);
                    }
                }
            } else {
                for j in 0..layer_sizes[i] {
                    out.tree_idx_map[i].insert(key_base + j as u64 + cur_bit, global_offset + j);
                }
                cnt = layer_sizes[i];
            }
            if cur_bit == 1 {
                // The carried prefix state takes the slot left of this
                // layer's first entry.
                out.tree_idx_map[i].insert(key_base, past_offset + used_cnts[i]);
                used_cnts[i] += 1;
            }
            global_offset += cnt;
            past_offset += num_ones(g.node_start());
        }
        for (i, g) in graphs.iter().enumerate() {
            let bit = bit_at(g.node_start(), layer) as u32;
            layer_sizes[i] = (layer_sizes[i] + bit) / 2;
            if layer_sizes[i] > 0 || used_cnts[i] != past_cnts[i] {
                has_job = true;
            }
        }
        layer += 1;
        out.step_inputs.push(Vec::new());
        out.step_indices.push(Vec::new());
    }

    let mut global_offset = 0u32;
    let mut max_steps = 0u32;
    for (i, g) in graphs.iter().enumerate() {
        let num_rows = g.active_rows().len() as u32;
        for j in 0..=num_rows {
            let mut k = j + g.node_start();
            if k == 0 {
                out.step_inputs[0].push(0);
                out.step_indices[0].push(global_offset);
                if max_steps == 0 {
                    max_steps = 1;
                }
                continue;
            }
            let mut layer = 0u32;
            let mut step = 0usize;
            while k != 0 {
                let cur_bit = k & 1;
                k /= 2;
                if cur_bit == 1 {
                    let num_prev = g.node_start() >> layer;
                    let prev_bit = bit_at(g.node_start(), layer) as i64;
                    let pos = 2 * k as i64 - num_prev as i64 + prev_bit;
                    assert!(pos >= 0);
                    let key = layer as u64 * num_rows as u64 + pos as u64;
                    let src = match out.tree_idx_map[i].get(&key) {
                        Some(&src) => src,
                        None => panic!(
                            "summary source missing for graph {i} layer {layer} position {pos}"
                        ),
                    };
                    if j < num_rows {
                        assert!(step < out.step_inputs.len());
                        out.step_inputs[step].push(src);
                        out.step_indices[step].push(global_offset + j);
                        step += 1;
                    } else {
                        out.next_state_froms.push(src);
                    }
                }
                layer += 1;
            }
            if step as u32 > max_steps {
                max_steps = step as u32;
            }
        }
        global_offset += num_rows;
    }

    let mut pass = 0usize;
    while pass + 1 < max_steps as usize {
        out.step_tos.push(Vec::new());
        out.step_nexts.push(Vec::new());
        out.step_froms.push(Vec::new());

        let mut y = 0usize;
        for x in 0..out.step_indices[pass].len() {
            let value = out.step_indices[pass][x];
            let cur = &out.step_indices[pass + 1];
            if y >= cur.len() || value < cur[y] {
                // This state is done after the current pass.
                out.step_froms[pass].push(x as u32);
                out.step_tos[pass].push(value);
            } else {
                assert_eq!(value, cur[y]);
                out.step_nexts[pass].push(x as u32);
                y += 1;
            }
        }
        pass += 1;
    }
    out.max_steps = max_steps.saturating_sub(1);
    (out, fallbacks)
}
