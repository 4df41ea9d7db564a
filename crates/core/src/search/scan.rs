//! Exact k-nearest-neighbor search by linear scan.
//!
//! Used as the ground-truth baseline for measuring graph search recall.

use crate::dataset::Dataset;
use crate::graph::distance::DistanceMetric;
use crate::graph::node::Neighbor;
use crate::search::heap::BoundedMaxHeap;
use crate::search::types::{SearchOutcome, SearchStats};
use rayon::prelude::*;
use std::time::Instant;

/// Exact `k` nearest neighbors of `query`, ascending by distance.
pub fn linear_scan(
    dataset: &Dataset,
    metric: DistanceMetric,
    query: &[f32],
    k: usize,
) -> SearchOutcome {
    let start = Instant::now();
    let mut best = BoundedMaxHeap::new(k);
    for (id, vector) in dataset.iter() {
        let dist = metric.distance(query, vector);
        if best.admits(dist) {
            best.push(Neighbor::new(dist, id));
        }
    }
    SearchOutcome {
        neighbors: best.into_sorted_vec(),
        stats: SearchStats {
            dist_calcs: dataset.len(),
            elapsed: start.elapsed(),
            ..SearchStats::default()
        },
    }
}

/// [`linear_scan`] for every vector of `queries`, in parallel. Output is
/// indexed by query id.
pub fn ground_truth(
    dataset: &Dataset,
    metric: DistanceMetric,
    queries: &Dataset,
    k: usize,
) -> Vec<SearchOutcome> {
    let start = Instant::now();
    let outcomes: Vec<SearchOutcome> = (0..queries.len() as u32)
        .into_par_iter()
        .map(|qid| linear_scan(dataset, metric, queries.vector(qid), k))
        .collect();
    tracing::info!(
        "Exact scan of {} queries over {} vectors took {:?}",
        queries.len(),
        dataset.len(),
        start.elapsed()
    );
    outcomes
}
