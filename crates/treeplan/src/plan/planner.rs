//! Job collection over realized trees.
//!
//! A "job" is one tree node the downstream engine must evaluate. Cell jobs
//! are splitting nodes whose state merges two child states; binary jobs are
//! packed leaf ranges fed through the bit embedding path. Jobs are grouped
//! by tree depth so one engine step can batch every job of a level, and the
//! `TreeSchedule` edge lists say where each job reads its children from.

use std::collections::HashMap;

use crate::config::PlanConfig;
use crate::graph::{NodeId, NodeKind, SparseGraph, TreeStore};
use crate::plan::{row_merge, row_states, row_summary, RowMerge, RowStates, RowSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct JobId(pub u32);

/// Counters describing the last planned batch.
///
/// `bit_fallback` counts schedule slots that had to reference a packed
/// node's job position instead of a plain vocabulary id; it stays zero
/// unless bit packing is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub cell_jobs: u32,
    pub binary_jobs: u32,
    pub bit_fallback: u32,
}

/// Per-depth gather lists for evaluating tree jobs bottom-up.
///
/// Index `[side]` distinguishes left (0) from right (1) children. At each
/// depth, `prev_froms`/`prev_tos` wire child jobs into their parents while
/// `bot_froms` carries vocabulary ids (0 empty, 1 add, 2 delete) for
/// children that are not jobs themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSchedule {
    pub n_cell_per_level: Vec<u32>,
    pub n_bin_per_level: Vec<u32>,
    pub binary_feats: Vec<Vec<NodeId>>,
    pub bot_froms: [Vec<Vec<u32>>; 2],
    pub bot_tos: [Vec<Vec<u32>>; 2],
    pub prev_froms: [Vec<Vec<u32>>; 2],
    pub prev_tos: [Vec<Vec<u32>>; 2],
    pub child_has_edge: [Vec<Vec<bool>>; 2],
    pub child_edge_count: [Vec<Vec<u32>>; 2],
}

/// Collects jobs for a batch of realized graphs and derives every schedule
/// the engine consumes: the per-depth tree schedule plus the flat, merged
/// and Fenwick-style row state schedules.
#[derive(Debug, Default)]
pub struct JobPlanner {
    cfg: PlanConfig,
    jobs: Vec<NodeId>,
    job_position: Vec<u32>,
    job_of: HashMap<NodeId, JobId>,
    tree: TreeSchedule,
    row_states: RowStates,
    row_merge: RowMerge,
    row_summary: RowSummary,
    stats: PlanStats,
}

impl JobPlanner {
    pub fn new(cfg: PlanConfig) -> Self {
        JobPlanner {
            cfg,
            ..JobPlanner::default()
        }
    }

    pub fn config(&self) -> &PlanConfig {
        &self.cfg
    }

    pub fn stats(&self) -> PlanStats {
        self.stats
    }

    pub fn tree(&self) -> &TreeSchedule {
        &self.tree
    }

    pub fn row_states(&self) -> &RowStates {
        &self.row_states
    }

    pub fn row_merge(&self) -> &RowMerge {
        &self.row_merge
    }

    pub fn row_summary(&self) -> &RowSummary {
        &self.row_summary
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn job_node(&self, job: JobId) -> NodeId {
        self.jobs[job.0 as usize]
    }

    pub fn job_of(&self, node: NodeId) -> Option<JobId> {
        self.job_of.get(&node).copied()
    }

    /// Position of a job within its (kind, depth) group.
    pub fn position_of(&self, job: JobId) -> u32 {
        self.job_position[job.0 as usize]
    }

    pub(crate) fn require_job(&self, node_id: NodeId) -> JobId {
        match self.job_of.get(&node_id) {
            Some(&job) => job,
            None => panic!("node {node_id:?} referenced before a job was assigned"),
        }
    }

    /// Drops the previous batch's jobs and schedules.
    pub fn reset(&mut self) {
        self.jobs.clear();
        self.job_position.clear();
        self.job_of.clear();
        self.tree = TreeSchedule::default();
        self.row_states = RowStates::default();
        self.row_merge = RowMerge::default();
        self.row_summary = RowSummary::default();
        self.stats = PlanStats::default();
    }

    /// Plans the whole batch: walks every active row's tree collecting jobs,
    /// then builds the three row-level schedules over the collected jobs.
    pub fn plan_batch(&mut self, graphs: &[SparseGraph], store: &TreeStore) {
        self.reset();
        for g in graphs {
            for &row_id in g.active_rows() {
                let root = store.row(row_id).root;
                self.collect_jobs(root, store);
            }
        }
        self.row_states = row_states::build(self, graphs, store);
        let (merge, merge_fallbacks) = row_merge::build(self, graphs, store);
        self.row_merge = merge;
        self.stats.bit_fallback += merge_fallbacks;
        let (summary, summary_fallbacks) = row_summary::build(self, graphs, store);
        self.row_summary = summary;
        self.stats.bit_fallback += summary_fallbacks;
    }

    /// Post-order walk: children become jobs before any parent references
    /// their positions.
    fn collect_jobs(&mut self, node_id: NodeId, store: &TreeStore) {
        match store.node(node_id).kind {
            NodeKind::Internal { left, right } => {
                self.collect_jobs(left, store);
                self.collect_jobs(right, store);
                self.add_job(node_id, store);
            }
            NodeKind::Bits(_) => {
                self.add_job(node_id, store);
            }
            NodeKind::Leaf { .. } | NodeKind::Empty => {}
        }
    }

    pub(crate) fn add_job(&mut self, node_id: NodeId, store: &TreeStore) -> JobId {
        let node = store.node(node_id);
        let job_id = JobId(self.jobs.len() as u32);
        let depth = node.depth as usize;

        if node.is_lowlevel {
            grow_levels(&mut self.tree.n_bin_per_level, depth);
            grow_levels(&mut self.tree.binary_feats, depth);
            let pos = self.tree.n_bin_per_level[depth];
            self.job_position.push(pos);
            self.tree.n_bin_per_level[depth] += 1;
            self.jobs.push(node_id);
            self.job_of.insert(node_id, job_id);
            self.tree.binary_feats[depth].push(node_id);
            self.stats.binary_jobs += 1;
            return job_id;
        }

        grow_levels(&mut self.tree.n_cell_per_level, depth);
        for side in 0..2 {
            grow_levels(&mut self.tree.bot_froms[side], depth);
            grow_levels(&mut self.tree.bot_tos[side], depth);
            grow_levels(&mut self.tree.prev_froms[side], depth);
            grow_levels(&mut self.tree.prev_tos[side], depth);
            grow_levels(&mut self.tree.child_has_edge[side], depth);
            grow_levels(&mut self.tree.child_edge_count[side], depth);
        }
        let pos = self.tree.n_cell_per_level[depth];
        self.job_position.push(pos);
        self.tree.n_cell_per_level[depth] += 1;
        self.jobs.push(node_id);
        self.job_of.insert(node_id, job_id);
        self.stats.cell_jobs += 1;

        let (left, right) = match node.kind {
            NodeKind::Internal { left, right } => (left, right),
            ref other => panic!("cell job on a non-splitting node {other:?}"),
        };
        for (side, ch_id) in [left, right].into_iter().enumerate() {
            let ch = store.node(ch_id);
            self.tree.child_has_edge[side][depth].push(ch.has_edge);
            self.tree.child_edge_count[side][depth].push(ch.edge_count);
            if ch.has_edge && !ch.is_leaf() && !ch.is_lowlevel {
                let ch_pos = self.position_of(self.require_job(ch_id));
                self.tree.prev_froms[side][depth].push(ch_pos);
                self.tree.prev_tos[side][depth].push(pos);
            } else {
                // Bottom edges only carry leaf and empty vocabulary ids.
                let bid = if !ch.has_edge {
                    0
                } else if ch.is_leaf() {
                    if ch.leaf_sign() > 0 {
                        1
                    } else {
                        2
                    }
                } else {
                    self.stats.bit_fallback += 1;
                    2 + self.position_of(self.require_job(ch_id))
                };
                self.tree.bot_froms[side][depth].push(bid);
                self.tree.bot_tos[side][depth].push(pos);
            }
        }
        job_id
    }
}

/// Grows a per-depth list with defaults until `list[depth]` exists.
fn grow_levels<T: Default>(list: &mut Vec<T>, depth: usize) {
    while list.len() <= depth {
        list.push(T::default());
    }
}
