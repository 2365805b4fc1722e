use treeplan::{
    build_batch, GraphError, GraphInput, JobId, JobPlanner, NodeKind, Partition, PlanConfig,
    SparseGraph, TreeStore,
};

fn zero_labels(num_nodes: u32) -> Vec<i32> {
    vec![0; (num_nodes * (num_nodes - 1) / 2) as usize]
}

fn edge_buffers(edges: &[(i32, i32, i32)]) -> (Vec<i32>, Vec<i32>) {
    let mut pairs = Vec::new();
    let mut signs = Vec::new();
    for &(x, y, sign) in edges {
        pairs.extend([x, y]);
        signs.push(sign);
    }
    (pairs, signs)
}

fn realized(
    num_nodes: u32,
    edges: &[(i32, i32, i32)],
    window: (u32, u32),
    cfg: &PlanConfig,
    store: &mut TreeStore,
) -> SparseGraph {
    let mut g = SparseGraph::new(0, num_nodes);
    g.load_prev_labels(&zero_labels(num_nodes)).expect("labels");
    let (pairs, signs) = edge_buffers(edges);
    g.load_edges(&pairs, &signs, None).expect("edges");
    g.realize_nodes(store, window.0, window.1, None, cfg)
        .expect("window");
    g
}

#[test]
fn mid_graph_window_plans_one_cell_job() {
    let mut store = TreeStore::new();
    let cfg = PlanConfig::default();
    let g = realized(3, &[(1, 0, 1), (2, 0, -1), (2, 1, 1)], (1, 3), &cfg, &mut store);

    let mut planner = JobPlanner::new(cfg);
    planner.plan_batch(std::slice::from_ref(&g), &store);

    assert_eq!(planner.job_count(), 1);
    assert_eq!(planner.stats().cell_jobs, 1);
    assert_eq!(planner.stats().binary_jobs, 0);
    assert_eq!(planner.tree().n_cell_per_level, vec![1]);

    // Row 2's root merges a delete leaf (left) and an add leaf (right).
    assert_eq!(planner.tree().bot_froms[0], vec![vec![2]]);
    assert_eq!(planner.tree().bot_froms[1], vec![vec![1]]);
    assert_eq!(planner.tree().bot_tos[0], vec![vec![0]]);

    // Flat states: SOS, then row 1 as an add leaf; row 2 is the target.
    assert_eq!(planner.row_states().bot_froms, vec![0, 2]);
    assert_eq!(planner.row_states().bot_tos, vec![0, 1]);
    assert!(planner.row_states().prev_froms.is_empty());
}

#[test]
fn odd_window_start_carries_a_prefix_state() {
    let mut store = TreeStore::new();
    let cfg = PlanConfig::default();
    let g = realized(3, &[(1, 0, 1), (2, 0, -1), (2, 1, 1)], (1, 3), &cfg, &mut store);

    let mut planner = JobPlanner::new(cfg);
    planner.plan_batch(std::slice::from_ref(&g), &store);

    // node_start = 1: the level-0 left operand is the carried prefix state.
    let merge = planner.row_merge();
    assert_eq!(merge.max_levels, 1);
    assert_eq!(merge.prev_froms[0][0], vec![0]);
    assert_eq!(merge.prev_tos[0][0], vec![0]);
    assert_eq!(merge.bot_froms[1], vec![1]);
    assert_eq!(merge.bot_tos[1], vec![0]);
    assert!(merge.bot_froms[0].is_empty());
    assert!(merge.top_froms[0][0].is_empty());

    // Summary sources: 4 is the carried prefix state, 6 the level-1 merge.
    let summary = planner.row_summary();
    assert_eq!(summary.step_inputs[0], vec![4, 6]);
    assert_eq!(summary.step_indices[0], vec![0, 1]);
    assert_eq!(summary.max_steps, 0);
    assert_eq!(summary.next_state_froms, vec![6, 6]);
}

#[test]
fn four_row_batch_builds_every_schedule() {
    let mut store = TreeStore::new();
    let cfg = PlanConfig::default();
    let edges = [(2, 0, 1), (2, 1, -1), (3, 0, 1), (3, 2, -1)];
    let g = realized(4, &edges, (0, 4), &cfg, &mut store);

    let mut planner = JobPlanner::new(cfg);
    planner.plan_batch(std::slice::from_ref(&g), &store);

    // Jobs: row 2's root, row 3's right half, row 3's root.
    assert_eq!(planner.job_count(), 3);
    assert_eq!(planner.tree().n_cell_per_level, vec![2, 1]);
    assert_eq!(planner.position_of(JobId(0)), 0);
    assert_eq!(planner.position_of(JobId(1)), 0);
    assert_eq!(planner.position_of(JobId(2)), 1);

    // Dense ids map back to their tree nodes and round-trip through the
    // side table.
    let row3_root = store.row(g.active_rows()[3]).root;
    assert_eq!(planner.job_node(JobId(2)), row3_root);
    assert_eq!(planner.job_of(row3_root), Some(JobId(2)));

    let tree = planner.tree();
    assert_eq!(tree.bot_froms[0], vec![vec![1, 1], vec![0]]);
    assert_eq!(tree.bot_tos[0], vec![vec![0, 1], vec![0]]);
    assert_eq!(tree.bot_froms[1], vec![vec![2], vec![2]]);
    assert_eq!(tree.bot_tos[1], vec![vec![0], vec![0]]);
    assert_eq!(tree.prev_froms[1], vec![vec![0], vec![]]);
    assert_eq!(tree.prev_tos[1], vec![vec![1], vec![]]);
    assert_eq!(tree.child_has_edge[0], vec![vec![true, true], vec![false]]);
    assert_eq!(tree.child_edge_count[1], vec![vec![1, 1], vec![1]]);

    let states = planner.row_states();
    assert_eq!(states.bot_froms, vec![0, 1, 1]);
    assert_eq!(states.bot_tos, vec![0, 1, 2]);
    assert_eq!(states.prev_froms, vec![0]);
    assert_eq!(states.prev_tos, vec![3]);

    let merge = planner.row_merge();
    assert_eq!(merge.max_levels, 2);
    assert_eq!(merge.bot_froms[0], vec![0]);
    assert_eq!(merge.bot_froms[1], vec![0]);
    assert_eq!(merge.top_froms[0], vec![vec![0], vec![0]]);
    assert_eq!(merge.top_tos[0], vec![vec![1], vec![0]]);
    assert_eq!(merge.top_froms[1], vec![vec![1], vec![1]]);
    assert_eq!(merge.top_tos[1], vec![vec![1], vec![0]]);

    let summary = planner.row_summary();
    assert_eq!(summary.step_inputs[0], vec![0, 1, 6, 4]);
    assert_eq!(summary.step_indices[0], vec![0, 1, 2, 3]);
    assert_eq!(summary.step_inputs[1], vec![6]);
    assert_eq!(summary.step_indices[1], vec![3]);
    assert_eq!(summary.max_steps, 1);
    assert_eq!(summary.next_state_froms, vec![8]);
    assert_eq!(summary.step_froms[0], vec![0, 1, 2]);
    assert_eq!(summary.step_tos[0], vec![0, 1, 2]);
    assert_eq!(summary.step_nexts[0], vec![3]);
}

#[test]
fn two_graph_batch_interleaves_offsets() {
    let mut store = TreeStore::new();
    let cfg = PlanConfig::default();
    let g0 = realized(3, &[(1, 0, 1), (2, 0, -1), (2, 1, 1)], (1, 3), &cfg, &mut store);
    let edges = [(2, 0, 1), (2, 1, -1), (3, 0, 1), (3, 2, -1)];
    let g1 = {
        let mut g = SparseGraph::new(1, 4);
        g.load_prev_labels(&zero_labels(4)).expect("labels");
        let (pairs, signs) = edge_buffers(&edges);
        g.load_edges(&pairs, &signs, None).expect("edges");
        g.realize_nodes(&mut store, 0, 4, None, &cfg).expect("window");
        g
    };

    let mut planner = JobPlanner::new(cfg);
    let graphs = vec![g0, g1];
    planner.plan_batch(&graphs, &store);

    assert_eq!(planner.job_count(), 4);
    assert_eq!(planner.tree().n_cell_per_level, vec![3, 1]);

    let states = planner.row_states();
    assert_eq!(states.bot_froms, vec![0, 2, 0, 1, 1]);
    assert_eq!(states.bot_tos, vec![0, 1, 2, 3, 4]);
    assert_eq!(states.prev_froms, vec![1]);
    assert_eq!(states.prev_tos, vec![5]);

    let merge = planner.row_merge();
    assert_eq!(merge.max_levels, 2);
    assert_eq!(merge.prev_froms[0][0], vec![0]);
    assert_eq!(merge.bot_froms[0], vec![0]);
    assert_eq!(merge.bot_tos[0], vec![1]);
    assert_eq!(merge.bot_froms[1], vec![1, 0]);
    assert_eq!(merge.bot_tos[1], vec![0, 1]);
    assert_eq!(merge.top_froms[0], vec![vec![1], vec![1]]);
    assert_eq!(merge.top_tos[0], vec![vec![2], vec![0]]);
    // Upper levels address the previous level's global positions.
    assert_eq!(merge.top_froms[1], vec![vec![2], vec![2]]);

    let summary = planner.row_summary();
    assert_eq!(summary.step_inputs[0], vec![4, 8, 0, 1, 9, 6]);
    assert_eq!(summary.step_indices[0], vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(summary.step_inputs[1], vec![9]);
    assert_eq!(summary.step_indices[1], vec![5]);
    assert_eq!(summary.next_state_froms, vec![8, 8, 11]);
    assert_eq!(summary.max_steps, 1);
    assert_eq!(summary.step_froms[0], vec![0, 1, 2, 3, 4]);
    assert_eq!(summary.step_nexts[0], vec![5]);
}

#[test]
fn packed_ranges_become_binary_jobs() {
    let mut store = TreeStore::new();
    let cfg = PlanConfig {
        bits_compress: 4,
        ..PlanConfig::default()
    };
    let g = realized(9, &[(8, 0, 1), (8, 5, 1)], (8, 9), &cfg, &mut store);

    let mut planner = JobPlanner::new(cfg);
    planner.plan_batch(std::slice::from_ref(&g), &store);

    assert_eq!(planner.stats().binary_jobs, 2);
    assert_eq!(planner.stats().cell_jobs, 1);
    assert_eq!(planner.tree().n_bin_per_level, vec![0, 2]);
    assert_eq!(planner.tree().n_cell_per_level, vec![1]);
    assert_eq!(planner.tree().binary_feats[1].len(), 2);

    // Both packed halves feed the root through the fallback ids 2 + pos.
    assert_eq!(planner.stats().bit_fallback, 2);
    assert_eq!(planner.tree().bot_froms[0], vec![vec![2]]);
    assert_eq!(planner.tree().bot_froms[1], vec![vec![3]]);

    // The packed halves carry the delta-applied adjacency bits.
    let feats = &planner.tree().binary_feats[1];
    match &store.node(feats[0]).kind {
        NodeKind::Bits(bits) => {
            assert!(bits.get(0));
            assert!(!bits.get(1));
        }
        other => panic!("left half should pack, got {other:?}"),
    }
    match &store.node(feats[1]).kind {
        NodeKind::Bits(bits) => {
            assert!(bits.get(1));
            assert!(!bits.get(0));
        }
        other => panic!("right half should pack, got {other:?}"),
    }
    assert_eq!(planner.row_summary().next_state_froms, vec![5, 4]);
}

#[test]
fn bipartite_windows_use_fixed_column_spans() {
    let p = Partition {
        n_left: 2,
        n_right: 3,
    };
    let mut g = SparseGraph::new(0, 2);
    g.load_edges(&[0, 3], &[1], Some(p)).expect("edges");

    let mut store = TreeStore::new();
    let cfg = PlanConfig::default();
    g.realize_nodes(&mut store, 0, 2, Some((0, 3)), &cfg)
        .expect("window");

    for &row_id in g.active_rows() {
        let row = store.row(row_id);
        assert_eq!((row.col_begin, row.col_end), (0, 3));
    }

    let mut planner = JobPlanner::new(cfg);
    planner.plan_batch(std::slice::from_ref(&g), &store);
    assert_eq!(planner.tree().n_cell_per_level, vec![1, 1]);
    // Row 0's finished root feeds state 1 of the flat schedule.
    assert_eq!(planner.row_states().prev_froms, vec![0]);
    assert_eq!(planner.row_states().prev_tos, vec![1]);
}

#[test]
fn self_loops_widen_the_diagonal() {
    let mut g = SparseGraph::new(0, 2);
    g.load_prev_labels(&[0]).expect("labels");
    g.load_edges(&[1, 1], &[1], None).expect("edges");

    let mut store = TreeStore::new();
    let cfg = PlanConfig {
        self_loops: true,
        ..PlanConfig::default()
    };
    g.realize_nodes(&mut store, 0, 2, None, &cfg).expect("window");

    let row1 = store.row(g.active_rows()[1]);
    assert_eq!((row1.col_begin, row1.col_end), (0, 2));
    match store.node(row1.root).kind {
        NodeKind::Internal { right, .. } => {
            assert_eq!(store.node(right).kind, NodeKind::Leaf { sign: 1 });
        }
        ref other => panic!("diagonal row should split, got {other:?}"),
    }
}

#[test]
fn replanning_the_same_batch_is_stable() {
    let cfg = PlanConfig::default();
    let labels = zero_labels(4);
    let (pairs, signs) = edge_buffers(&[(2, 0, 1), (2, 1, -1), (3, 0, 1), (3, 2, -1)]);
    let inputs = [GraphInput {
        graph_id: 0,
        num_nodes: 4,
        prev_labels: Some(&labels),
        edge_pairs: Some(&pairs),
        edge_signs: Some(&signs),
        window: (0, 4),
        ..GraphInput::default()
    }];

    let mut store = TreeStore::new();
    let mut planner = JobPlanner::new(cfg);
    build_batch(&inputs, &mut store, &mut planner).expect("first batch");
    let tree = planner.tree().clone();
    let states = planner.row_states().clone();
    let merge = planner.row_merge().clone();
    let summary = planner.row_summary().clone();
    let stats = planner.stats();

    build_batch(&inputs, &mut store, &mut planner).expect("second batch");
    assert_eq!(planner.tree(), &tree);
    assert_eq!(planner.row_states(), &states);
    assert_eq!(planner.row_merge(), &merge);
    assert_eq!(planner.row_summary(), &summary);
    assert_eq!(planner.stats(), stats);
}

#[test]
fn build_batch_plans_multiple_graphs_with_mixed_windows() {
    let labels0 = zero_labels(3);
    let (pairs0, signs0) = edge_buffers(&[(1, 0, 1), (2, 0, -1), (2, 1, 1)]);
    let labels1 = zero_labels(4);
    let (pairs1, signs1) = edge_buffers(&[(2, 0, 1), (2, 1, -1), (3, 0, 1), (3, 2, -1)]);
    let inputs = [
        GraphInput {
            graph_id: 0,
            num_nodes: 3,
            prev_labels: Some(&labels0),
            edge_pairs: Some(&pairs0),
            edge_signs: Some(&signs0),
            window: (1, 3),
            ..GraphInput::default()
        },
        GraphInput {
            graph_id: 1,
            num_nodes: 4,
            prev_labels: Some(&labels1),
            edge_pairs: Some(&pairs1),
            edge_signs: Some(&signs1),
            window: (0, 4),
            ..GraphInput::default()
        },
    ];

    let mut store = TreeStore::new();
    let mut planner = JobPlanner::new(PlanConfig::default());
    let graphs = build_batch(&inputs, &mut store, &mut planner).expect("batch");

    assert_eq!(graphs.len(), 2);
    assert_eq!((graphs[0].node_start(), graphs[0].node_end()), (1, 3));
    assert_eq!((graphs[1].node_start(), graphs[1].node_end()), (0, 4));

    // Graph 0 contributes a carried prefix (start 1), graph 1 starts at the
    // origin; the driver must land on the same combined schedules as
    // planning the realized graphs directly.
    assert_eq!(planner.job_count(), 4);
    assert_eq!(planner.tree().n_cell_per_level, vec![3, 1]);
    assert_eq!(planner.row_states().bot_froms, vec![0, 2, 0, 1, 1]);
    assert_eq!(planner.row_states().prev_froms, vec![1]);
    assert_eq!(planner.row_states().prev_tos, vec![5]);
    assert_eq!(planner.row_merge().max_levels, 2);
    assert_eq!(planner.row_merge().prev_froms[0][0], vec![0]);

    let summary = planner.row_summary();
    assert_eq!(summary.step_inputs[0], vec![4, 8, 0, 1, 9, 6]);
    assert_eq!(summary.step_indices[0], vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(summary.next_state_froms, vec![8, 8, 11]);
    assert_eq!(summary.max_steps, 1);
}

#[test]
fn build_batch_reports_which_graph_failed() {
    let mut store = TreeStore::new();
    let mut planner = JobPlanner::new(PlanConfig::default());

    let pairs = [1, 0];
    let signs = [0];
    let inputs = [GraphInput {
        graph_id: 7,
        num_nodes: 3,
        edge_pairs: Some(&pairs),
        edge_signs: Some(&signs),
        window: (1, 3),
        ..GraphInput::default()
    }];
    let err = build_batch(&inputs, &mut store, &mut planner).expect_err("zero weight");
    assert!(format!("{err:#}").contains("graph 7: edges"));
    assert_eq!(
        err.downcast_ref::<GraphError>(),
        Some(&GraphError::ZeroWeight { index: 0 })
    );

    let signs = [1];
    let inputs = [GraphInput {
        graph_id: 3,
        num_nodes: 3,
        edge_pairs: Some(&pairs),
        edge_signs: Some(&signs),
        window: (1, 9),
        ..GraphInput::default()
    }];
    let err = build_batch(&inputs, &mut store, &mut planner).expect_err("bad window");
    assert!(format!("{err:#}").contains("graph 3: window"));
    assert_eq!(
        err.downcast_ref::<GraphError>(),
        Some(&GraphError::WindowOutOfRange {
            start: 1,
            end: 9,
            num_nodes: 3,
        })
    );
}

#[test]
fn build_batch_rejects_half_provided_edges() {
    let mut store = TreeStore::new();
    let mut planner = JobPlanner::new(PlanConfig::default());
    let pairs = [1, 0];
    let inputs = [GraphInput {
        graph_id: 0,
        num_nodes: 2,
        edge_pairs: Some(&pairs),
        window: (0, 2),
        ..GraphInput::default()
    }];
    let err = build_batch(&inputs, &mut store, &mut planner).expect_err("signs missing");
    assert!(format!("{err}").contains("must be provided together"));
}
