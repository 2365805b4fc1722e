//! Graph-side state: delta buffers, per-row trees and their backing pools.

mod cursor;
mod pool;
mod sparse;
mod tree;

pub use cursor::ColumnCursor;
pub use pool::{Pool, TreeStore};
pub use sparse::{ColEntry, Partition, SparseGraph};
pub use tree::{NodeId, NodeKind, Row, RowId, TreeNode};
