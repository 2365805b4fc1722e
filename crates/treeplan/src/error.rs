use thiserror::Error;

/// Input-validation failures surfaced while loading graph buffers or
/// realizing a window.
///
/// Scheduling-invariant violations are deliberately not represented here:
/// those are construction bugs, not bad input, and abort via panic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("previous-label buffer holds {got} entries, expected {expected} for {num_nodes} nodes")]
    LabelBufferSize {
        num_nodes: usize,
        expected: usize,
        got: usize,
    },
    #[error("edge buffers disagree: {endpoints} endpoints for {signs} signs")]
    EdgeBufferSize { endpoints: usize, signs: usize },
    #[error("edge {index} has zero weight")]
    ZeroWeight { index: usize },
    #[error("edge {index} endpoint {node} is outside 0..{num_nodes}")]
    EndpointOutOfRange {
        index: usize,
        node: i32,
        num_nodes: usize,
    },
    #[error("edge {index} ({row}, {col}) does not fit a {n_left}x{n_right} bipartite layout")]
    PartitionMismatch {
        index: usize,
        row: i32,
        col: i32,
        n_left: u32,
        n_right: u32,
    },
    #[error("row {row} lists column {col} twice")]
    DuplicateColumn { row: u32, col: u32 },
    #[error("window [{start}, {end}) does not fit a graph of {num_nodes} nodes")]
    WindowOutOfRange {
        start: u32,
        end: u32,
        num_nodes: usize,
    },
}
