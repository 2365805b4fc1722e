//! One-call batch assembly: load, realize, plan.

use anyhow::{bail, Context, Result};

use crate::graph::{Partition, SparseGraph, TreeStore};
use crate::plan::JobPlanner;

/// Borrowed description of one graph in a batch.
///
/// `prev_labels` and the edge buffers are independently optional: a first
/// generation step has no history, a fully empty graph has no deltas.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphInput<'a> {
    pub graph_id: usize,
    pub num_nodes: u32,
    pub prev_labels: Option<&'a [i32]>,
    pub edge_pairs: Option<&'a [i32]>,
    pub edge_signs: Option<&'a [i32]>,
    pub partition: Option<Partition>,
    pub window: (u32, u32),
    pub cols: Option<(u32, u32)>,
}

/// Loads every input, realizes its window into `store` and plans the whole
/// batch on `planner`. The store is recycled; the returned graphs keep the
/// row handles the planner's schedules refer to.
pub fn build_batch(
    inputs: &[GraphInput<'_>],
    store: &mut TreeStore,
    planner: &mut JobPlanner,
) -> Result<Vec<SparseGraph>> {
    store.reset();
    let cfg = planner.config().clone();
    let mut graphs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let mut g = SparseGraph::new(input.graph_id, input.num_nodes);
        if let Some(labels) = input.prev_labels {
            g.load_prev_labels(labels)
                .with_context(|| format!("graph {}: previous labels", input.graph_id))?;
        }
        match (input.edge_pairs, input.edge_signs) {
            (Some(pairs), Some(signs)) => {
                g.load_edges(pairs, signs, input.partition)
                    .with_context(|| format!("graph {}: edges", input.graph_id))?;
            }
            (None, None) => {}
            _ => bail!(
                "graph {}: edge pairs and signs must be provided together",
                input.graph_id
            ),
        }
        let (start, end) = input.window;
        g.realize_nodes(store, start, end, input.cols, &cfg)
            .with_context(|| format!("graph {}: window", input.graph_id))?;
        graphs.push(g);
    }
    planner.plan_batch(&graphs, store);
    Ok(graphs)
}
