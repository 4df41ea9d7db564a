//! Search benchmark on synthetic uniform data.
//! Measures Recall@10, QPS and work counters for every search strategy.
//!
//! Usage: cargo bench --bench search_synthetic

use proxgraph_core::hybrid::{collapse_to_medoids, ROUTING_TABLE};
use proxgraph_core::search::{ground_truth, recall, SearchOutcome};
use proxgraph_core::{
    Dataset, DistanceMetric, GraphConfig, HybridConfig, HybridIndex, LshConfig, LshTables,
    NnDescentBuilder,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;

const N: usize = 20_000;
const N_QUERY: usize = 500;
const DIM: usize = 16;
const K: usize = 10;

fn uniform(n: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let vectors = (0..n)
        .map(|_| (0..DIM).map(|_| rng.gen_range(0.0..1.0)).collect())
        .collect();
    Dataset::from_vectors(vectors).expect("synthetic data is well formed")
}

fn run<F>(label: &str, queries: &Dataset, truth: &[SearchOutcome], search: F)
where
    F: Fn(u32, &[f32]) -> SearchOutcome,
{
    let t0 = Instant::now();
    let mut total_recall = 0.0f64;
    let mut total_hops = 0usize;
    let mut total_dists = 0usize;
    for (qid, q) in queries.iter() {
        let out = search(qid, q);
        total_recall += recall(&out.neighbors, &truth[qid as usize].neighbors, K);
        total_hops += out.stats.hops;
        total_dists += out.stats.dist_calcs;
    }
    let elapsed = t0.elapsed();
    let n = queries.len() as f64;
    println!(
        "  {:<22} | {:.4}    | {:>9.1} | {:>6.1} | {:>8.1}",
        label,
        total_recall / n,
        n / elapsed.as_secs_f64(),
        total_hops as f64 / n,
        total_dists as f64 / n
    );
}

fn main() {
    println!("=== Search Benchmark: uniform {N} x {DIM}d ===");
    println!();

    let dataset = Arc::new(uniform(N, 1));
    let queries = uniform(N_QUERY, 2);

    let t0 = Instant::now();
    let truth = ground_truth(&dataset, DistanceMetric::Euclidean, &queries, K);
    println!("Exact scan: {:.2}s", t0.elapsed().as_secs_f64());

    let t0 = Instant::now();
    let (mut graph, stats) = NnDescentBuilder::new(GraphConfig::new(20))
        .build(Arc::clone(&dataset), &mut StdRng::seed_from_u64(42))
        .expect("valid config");
    println!(
        "NN-Descent: {:.2}s, {} rounds, converged={}",
        t0.elapsed().as_secs_f64(),
        stats.rounds,
        stats.converged
    );

    let t0 = Instant::now();
    let refine = graph.refine();
    println!(
        "Refine: {:.2}s, {} -> {} edges",
        t0.elapsed().as_secs_f64(),
        refine.edges_before,
        refine.edges_after
    );

    println!();
    println!("  strategy               | Recall@10 |    QPS    |  hops  | dists");
    println!("  -----------------------+-----------+-----------+--------+---------");

    let starts: Vec<u32> = (0..50).map(|i| (i * N / 50) as u32).collect();
    for ef in [20, 50, 100] {
        run(&format!("beam ef={ef}"), &queries, &truth, |_, q| {
            graph.beam_search(q, K, ef, &starts, starts.len())
        });
        run(&format!("tolerant beam ef={ef}"), &queries, &truth, |_, q| {
            graph.tolerant_beam_search(q, K, ef, &starts, starts.len(), 3)
        });
    }
    for l in [20, 50, 100] {
        run(&format!("list l={l}"), &queries, &truth, |_, q| {
            graph.list_search(q, K, &starts, l)
        });
        run(&format!("tolerant list l={l}"), &queries, &truth, |_, q| {
            graph.tolerant_list_search(q, K, &starts, l, 3)
        });
    }

    let lsh = LshConfig::default().with_hashes(6).with_width(0.5);
    let mut tables = LshTables::build(&dataset, &lsh).expect("valid LSH config");
    collapse_to_medoids(&mut tables, ROUTING_TABLE, &dataset, graph.metric());
    let hybrid = HybridIndex::from_parts(
        graph,
        tables,
        HybridConfig::default().with_lsh(lsh).with_ef(50),
    );
    run("hybrid parallel ef=50", &queries, &truth, |_, q| {
        let out = hybrid.search_parallel(q, K);
        SearchOutcome {
            neighbors: out.neighbors,
            stats: out.stats,
        }
    });

    println!();
    println!("=== Benchmark complete ===");
}
