//! NN-Descent k-NN graph construction.
//!
//! Builds a k-NN graph without any precomputed input:
//! 1. every node is filled with random neighbors drawn from a caller-provided RNG;
//! 2. rounds of two-hop propagation follow. Each round materializes one read-only
//!    snapshot holding both forward and reverse edges, then every node (in
//!    parallel) offers the neighbors of its snapshot neighbors to its own bounded
//!    list. Updates made during a round only become visible through the next
//!    round's snapshot.
//!
//! A round that accepts no insertion is a fixed point and ends construction.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::graph::index::{GraphConfig, GraphIndex};
use rand::Rng;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Diagnostics from a finished build.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Refinement rounds executed, including the final zero-update round.
    pub rounds: usize,
    /// Accepted insertions per round.
    pub updates_per_round: Vec<usize>,
    /// `true` if the last round accepted nothing.
    pub converged: bool,
    pub elapsed: Duration,
}

/// NN-Descent graph builder.
#[derive(Debug, Clone)]
pub struct NnDescentBuilder {
    config: GraphConfig,
    max_rounds: Option<usize>,
}

impl NnDescentBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            max_rounds: None,
        }
    }

    /// Stop after `rounds` refinement rounds even if not converged.
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    /// Build a k-NN graph with `config.degree` neighbors per node
    /// (`N - 1` for datasets smaller than `degree + 1`).
    ///
    /// All randomness comes from `rng`; a seeded RNG makes the build reproducible.
    pub fn build<R: Rng>(
        &self,
        dataset: Arc<Dataset>,
        rng: &mut R,
    ) -> Result<(GraphIndex, BuildStats)> {
        self.config.validate()?;
        let start = Instant::now();
        let mut graph = GraphIndex::new_bounded(dataset, self.config.clone());

        random_init(&mut graph, rng);
        tracing::debug!("NN-Descent: random initialization of {} nodes done", graph.len());

        let mut stats = BuildStats::default();
        loop {
            if self.max_rounds.is_some_and(|max| stats.rounds >= max) {
                tracing::warn!(
                    "NN-Descent stopped after {} rounds without converging",
                    stats.rounds
                );
                break;
            }
            let snapshot = undirected_snapshot(&graph);
            let updated = descend_round(&mut graph, &snapshot);
            stats.rounds += 1;
            stats.updates_per_round.push(updated);
            tracing::debug!("NN-Descent round {}: {} updates", stats.rounds, updated);
            if updated == 0 {
                stats.converged = true;
                break;
            }
        }

        stats.elapsed = start.elapsed();
        tracing::info!(
            "NN-Descent built {} nodes (degree {}) in {} rounds, {:?}",
            graph.len(),
            self.config.degree,
            stats.rounds,
            stats.elapsed
        );
        Ok((graph, stats))
    }
}

/// Fill every node with uniformly random other nodes until it holds
/// `min(degree, N - 1)` neighbors.
fn random_init<R: Rng>(graph: &mut GraphIndex, rng: &mut R) {
    let n = graph.len();
    if n < 2 {
        return;
    }
    let target = graph.config().degree.min(n - 1);
    let dataset = Arc::clone(graph.dataset());
    let metric = graph.metric();

    for node in &mut graph.nodes {
        let base = dataset.vector(node.id);
        while node.len() < target {
            let other = rng.gen_range(0..n) as u32;
            if node.contains(other) {
                continue;
            }
            let dist = metric.distance(base, dataset.vector(other));
            node.add_neighbor(dist, other);
        }
    }
}

/// Per-node list of forward and reverse neighbor ids, deduplicated.
fn undirected_snapshot(graph: &GraphIndex) -> Vec<Vec<u32>> {
    let mut lists: Vec<Vec<u32>> = vec![Vec::new(); graph.len()];
    for node in graph.nodes() {
        for neighbor in node.neighbor_ids() {
            lists[node.id as usize].push(neighbor);
            lists[neighbor as usize].push(node.id);
        }
    }
    lists.par_iter_mut().for_each(|list| {
        list.sort_unstable();
        list.dedup();
    });
    lists
}

/// One propagation round. Each node is mutated only by its own task.
/// Returns the number of accepted insertions.
fn descend_round(graph: &mut GraphIndex, snapshot: &[Vec<u32>]) -> usize {
    let dataset = Arc::clone(graph.dataset());
    let metric = graph.metric();

    graph
        .nodes
        .par_iter_mut()
        .map(|node| {
            let base = dataset.vector(node.id);
            let mut accepted = 0;
            for &hop1 in &snapshot[node.id as usize] {
                for &hop2 in &snapshot[hop1 as usize] {
                    if node.contains(hop2) {
                        continue;
                    }
                    let dist = metric.distance(base, dataset.vector(hop2));
                    if node.add_neighbor(dist, hop2) {
                        accepted += 1;
                    }
                }
            }
            accepted
        })
        .sum()
}
