//! End-to-end: NN-Descent build -> edge file -> load + refine -> search.

use proxgraph_core::graph::Neighbor;
use proxgraph_core::search::{ground_truth, mean_recall, recall};
use proxgraph_core::storage::{load_snapshot, save_snapshot};
use proxgraph_core::{
    Dataset, GraphConfig, GraphIndex, HybridConfig, HybridIndex, LshConfig, NnDescentBuilder,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;

const DIM: usize = 4;

fn uniform(n: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..DIM).map(|_| rng.gen_range(0.0..10.0)).collect())
        .collect()
}

fn edge_set(graph: &GraphIndex) -> HashSet<(u32, u32, u32)> {
    graph
        .nodes()
        .iter()
        .flat_map(|node| {
            node.neighbors()
                .iter()
                .map(move |e| (node.id, e.id, e.distance.to_bits()))
        })
        .collect()
}

#[test]
fn test_build_save_load_refine_search() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = Arc::new(Dataset::from_vectors(uniform(1200, 1)).unwrap());
    let queries = Dataset::from_vectors(uniform(40, 2)).unwrap();

    let (built, stats) = NnDescentBuilder::new(GraphConfig::new(10))
        .build(Arc::clone(&dataset), &mut StdRng::seed_from_u64(42))
        .unwrap();
    assert!(stats.converged);

    // 1200 nodes -> two shard files
    let shards = dir.path().join("shards");
    built.save_edges(&shards).unwrap();
    assert!(shards.join("0.csv").exists());
    assert!(shards.join("1.csv").exists());

    let (mut graph, report) =
        GraphIndex::load_edges(Arc::clone(&dataset), GraphConfig::new(10), &shards).unwrap();
    assert_eq!(report.files, 2);
    assert!(report.errors.is_empty());
    assert_eq!(edge_set(&graph), edge_set(&built));

    graph.refine();
    assert!(graph.max_out_degree() <= 20);

    let truth = ground_truth(&dataset, graph.metric(), &queries, 10);
    let starts: Vec<u32> = (0..20).map(|i| i * 60).collect();

    let mut beam = Vec::new();
    let mut list = Vec::new();
    let mut tolerant_beam = Vec::new();
    let mut tolerant_list = Vec::new();
    for (qid, q) in queries.iter() {
        let expected = &truth[qid as usize].neighbors;
        beam.push(recall(&graph.beam_search(q, 10, 64, &starts, 20).neighbors, expected, 10));
        list.push(recall(&graph.list_search(q, 10, &starts, 64).neighbors, expected, 10));
        tolerant_beam.push(recall(
            &graph.tolerant_beam_search(q, 10, 64, &starts, 20, 3).neighbors,
            expected,
            10,
        ));
        tolerant_list.push(recall(
            &graph.tolerant_list_search(q, 10, &starts, 64, 3).neighbors,
            expected,
            10,
        ));
    }

    for (name, recalls) in [
        ("beam", &beam),
        ("list", &list),
        ("tolerant beam", &tolerant_beam),
        ("tolerant list", &tolerant_list),
    ] {
        let r = mean_recall(recalls);
        assert!(r >= 0.9, "{name} search mean recall {r}");
    }
}

#[test]
fn test_unbounded_save_reload_reproduces_edge_set() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = Arc::new(Dataset::from_vectors(uniform(300, 3)).unwrap());
    let (mut graph, _) = NnDescentBuilder::new(GraphConfig::new(6))
        .build(Arc::clone(&dataset), &mut StdRng::seed_from_u64(5))
        .unwrap();
    graph.make_bidirectional();

    let path = dir.path().join("graph.csv");
    graph.save_edges(&path).unwrap();
    let cfg = GraphConfig::new(6).unbounded_import();
    let (reloaded, report) = GraphIndex::load_edges(dataset, cfg, &path).unwrap();

    assert_eq!(report.edges_kept, graph.edge_count());
    assert_eq!(edge_set(&reloaded), edge_set(&graph));
}

#[test]
fn test_snapshot_of_refined_graph() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = Arc::new(Dataset::from_vectors(uniform(200, 4)).unwrap());
    let (mut graph, _) = NnDescentBuilder::new(GraphConfig::new(6))
        .build(Arc::clone(&dataset), &mut StdRng::seed_from_u64(6))
        .unwrap();
    graph.refine();

    let path = dir.path().join("snap").join("graph.pgs");
    save_snapshot(&graph, &path).unwrap();
    let restored = load_snapshot(&path, dataset).unwrap();
    assert_eq!(edge_set(&restored), edge_set(&graph));
}

#[test]
fn test_hybrid_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = Arc::new(Dataset::from_vectors(uniform(800, 7)).unwrap());
    let queries = Dataset::from_vectors(uniform(30, 8)).unwrap();

    let (built, _) = NnDescentBuilder::new(GraphConfig::new(10))
        .build(Arc::clone(&dataset), &mut StdRng::seed_from_u64(42))
        .unwrap();
    let path = dir.path().join("graph.csv");
    built.save_edges(&path).unwrap();

    let lsh = LshConfig::default().with_tables(4).with_hashes(4).with_width(8.0);
    let (index, _) = HybridIndex::build(
        Arc::clone(&dataset),
        &path,
        GraphConfig::new(10),
        HybridConfig::default().with_lsh(lsh).with_ef(64),
    )
    .unwrap();

    let truth = ground_truth(&dataset, index.graph().metric(), &queries, 10);
    let mut recalls = Vec::new();
    for (qid, q) in queries.iter() {
        let out = index.search_parallel(q, 10);
        assert_eq!(out.neighbors.len(), 10);
        let ids: HashSet<u32> = out.ids().into_iter().collect();
        assert_eq!(ids.len(), 10, "merged result has duplicates");
        let sorted = out
            .neighbors
            .windows(2)
            .all(|w| Neighbor::cmp_by_distance(&w[0], &w[1]).is_le());
        assert!(sorted);
        recalls.push(recall(&out.neighbors, &truth[qid as usize].neighbors, 10));
    }
    let r = mean_recall(&recalls);
    assert!(r >= 0.9, "hybrid mean recall {r}");
}
