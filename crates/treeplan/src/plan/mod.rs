//! Schedules derived from a batch of realized graphs.

mod batch;
mod planner;
mod row_merge;
mod row_states;
mod row_summary;

pub use batch::{build_batch, GraphInput};
pub use planner::{JobId, JobPlanner, PlanStats, TreeSchedule};
pub use row_merge::RowMerge;
pub use row_states::RowStates;
pub use row_summary::RowSummary;
