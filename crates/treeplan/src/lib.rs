//! Dependency-ordered job schedules for batched autoregressive graph
//! generation: per-row binary trees over column ranges, plus Fenwick-style
//! cross-row state schedules, all consumed by an external tensor engine.

pub mod bits;
pub mod config;
pub mod error;
pub mod graph;
pub mod plan;

pub use config::PlanConfig;
pub use error::GraphError;
pub use graph::{
    ColEntry, ColumnCursor, NodeId, NodeKind, Partition, Pool, Row, RowId, SparseGraph, TreeNode,
    TreeStore,
};
pub use plan::{
    build_batch, GraphInput, JobId, JobPlanner, PlanStats, RowMerge, RowStates, RowSummary,
    TreeSchedule,
};
