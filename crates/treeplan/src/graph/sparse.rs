//! Incrementally revealed sparse delta graphs.
//!
//! A graph arrives as two flat buffers: the previous level's 0/1 adjacency
//! (strict lower triangle, row-major) and a list of signed edge deltas. Rows
//! are realized lazily: [`SparseGraph::realize_nodes`] builds trees only for
//! the window of rows the current step predicts.

use crate::config::PlanConfig;
use crate::error::GraphError;
use crate::graph::cursor::ColumnCursor;
use crate::graph::pool::TreeStore;
use crate::graph::tree::{build_tree, Row, RowId};

/// One signed delta in a row, kept sorted by column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColEntry {
    pub col: u32,
    pub sign: i32,
}

/// Bipartite layout: rows index the left part, columns the right part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub n_left: u32,
    pub n_right: u32,
}

#[derive(Debug)]
pub struct SparseGraph {
    pub graph_id: usize,
    num_nodes: u32,
    num_edges: u32,
    edge_list: Vec<Vec<ColEntry>>,
    prev_adj: Vec<Vec<u8>>,
    pub(crate) active_rows: Vec<RowId>,
    pub(crate) node_start: u32,
    pub(crate) node_end: u32,
}

impl SparseGraph {
    pub fn new(graph_id: usize, num_nodes: u32) -> Self {
        SparseGraph {
            graph_id,
            num_nodes,
            num_edges: 0,
            edge_list: vec![Vec::new(); num_nodes as usize],
            prev_adj: vec![Vec::new(); num_nodes as usize],
            active_rows: Vec::new(),
            node_start: 0,
            node_end: 0,
        }
    }

    pub fn num_nodes(&self) -> u32 {
        self.num_nodes
    }

    pub fn num_edges(&self) -> u32 {
        self.num_edges
    }

    pub fn node_start(&self) -> u32 {
        self.node_start
    }

    pub fn node_end(&self) -> u32 {
        self.node_end
    }

    /// Rows realized by the last `realize_nodes` call, window order.
    pub fn active_rows(&self) -> &[RowId] {
        &self.active_rows
    }

    /// Sorted deltas of one row.
    pub fn row_entries(&self, row: u32) -> &[ColEntry] {
        &self.edge_list[row as usize]
    }

    /// Loads the previous level's adjacency: one 0/1 entry per strict
    /// lower-triangle cell, row-major, `n * (n - 1) / 2` in total. Row 0
    /// keeps an empty history.
    pub fn load_prev_labels(&mut self, labels: &[i32]) -> Result<(), GraphError> {
        let n = self.num_nodes as usize;
        let expected = n * n.saturating_sub(1) / 2;
        if labels.len() != expected {
            return Err(GraphError::LabelBufferSize {
                num_nodes: n,
                expected,
                got: labels.len(),
            });
        }
        let mut offset = 0;
        for i in 1..n {
            self.prev_adj[i] = labels[offset..offset + i]
                .iter()
                .map(|&v| (v == 1) as u8)
                .collect();
            offset += i;
        }
        Ok(())
    }

    /// Loads signed edge deltas from interleaved endpoint pairs.
    ///
    /// Endpoints are normalized into row-major lower-triangle form: without a
    /// partition the larger endpoint becomes the row, with one the smaller
    /// endpoint must fall in the left part and the larger is rebased into the
    /// right part. Rows end up sorted by column with duplicates rejected.
    pub fn load_edges(
        &mut self,
        pairs: &[i32],
        signs: &[i32],
        partition: Option<Partition>,
    ) -> Result<(), GraphError> {
        if pairs.len() != signs.len() * 2 {
            return Err(GraphError::EdgeBufferSize {
                endpoints: pairs.len(),
                signs: signs.len(),
            });
        }
        for (index, &sign) in signs.iter().enumerate() {
            if sign == 0 {
                return Err(GraphError::ZeroWeight { index });
            }
            let mut x = pairs[index * 2];
            let mut y = pairs[index * 2 + 1];
            match partition {
                None => {
                    if x < y {
                        std::mem::swap(&mut x, &mut y);
                    }
                    if y < 0 {
                        return Err(GraphError::EndpointOutOfRange {
                            index,
                            node: y,
                            num_nodes: self.num_nodes as usize,
                        });
                    }
                }
                Some(p) => {
                    if x > y {
                        std::mem::swap(&mut x, &mut y);
                    }
                    if x < 0 || x >= p.n_left as i32 || y < p.n_left as i32 {
                        return Err(GraphError::PartitionMismatch {
                            index,
                            row: x,
                            col: y,
                            n_left: p.n_left,
                            n_right: p.n_right,
                        });
                    }
                    y -= p.n_left as i32;
                    if y >= p.n_right as i32 {
                        return Err(GraphError::PartitionMismatch {
                            index,
                            row: x,
                            col: y,
                            n_left: p.n_left,
                            n_right: p.n_right,
                        });
                    }
                }
            }
            if x >= self.num_nodes as i32 {
                return Err(GraphError::EndpointOutOfRange {
                    index,
                    node: x,
                    num_nodes: self.num_nodes as usize,
                });
            }
            self.edge_list[x as usize].push(ColEntry { col: y as u32, sign });
        }
        self.num_edges += signs.len() as u32;

        for row in &mut self.edge_list {
            row.sort_by_key(|entry| entry.col);
        }
        for (row, entries) in self.edge_list.iter().enumerate() {
            for pair in entries.windows(2) {
                if pair[0].col == pair[1].col {
                    return Err(GraphError::DuplicateColumn {
                        row: row as u32,
                        col: pair[0].col,
                    });
                }
            }
        }
        Ok(())
    }

    /// Builds one tree per row in `[node_start, node_end)` and records them
    /// as the active window.
    ///
    /// `cols` overrides every row's column span (bipartite layouts); without
    /// it row `i` spans `[0, i)`, or `[0, i + 1)` with self loops.
    pub fn realize_nodes(
        &mut self,
        store: &mut TreeStore,
        node_start: u32,
        node_end: u32,
        cols: Option<(u32, u32)>,
        cfg: &PlanConfig,
    ) -> Result<(), GraphError> {
        if node_start > node_end || node_end > self.num_nodes {
            return Err(GraphError::WindowOutOfRange {
                start: node_start,
                end: node_end,
                num_nodes: self.num_nodes as usize,
            });
        }
        self.active_rows.clear();
        for i in node_start..node_end {
            let (col_begin, col_end) =
                cols.unwrap_or((0, if cfg.self_loops { i + 1 } else { i }));
            let root = {
                let mut cursor =
                    ColumnCursor::new(&self.edge_list[i as usize], &self.prev_adj[i as usize]);
                build_tree(store, &mut cursor, col_begin, col_end, 0, cfg)
            };
            let row = store.alloc_row(Row {
                node: i,
                col_begin,
                col_end,
                root,
            });
            self.active_rows.push(row);
        }
        self.node_start = node_start;
        self.node_end = node_end;
        Ok(())
    }
}
