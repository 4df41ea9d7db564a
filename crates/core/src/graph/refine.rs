//! Edge refinement: bidirectionalization and diversity pruning.
//!
//! Turns an arbitrary candidate graph into a navigable index. Reverse edges
//! are inserted first, then every node at or above `max_degree` is pruned with
//! the relative-neighborhood test: a candidate is kept only if no already-kept
//! neighbor is closer to it than it is to the node itself.

use crate::graph::index::GraphIndex;
use crate::graph::node::Neighbor;
use rayon::prelude::*;
use std::sync::Arc;

/// Counters from [`GraphIndex::refine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RefineStats {
    pub edges_before: usize,
    pub reverse_edges_added: usize,
    pub nodes_pruned: usize,
    pub edges_after: usize,
}

impl GraphIndex {
    /// For every edge `u -> v` with distance `d`, insert `v -> u` with the same `d`.
    ///
    /// Reverse edges bypass the import limit; duplicate and self targets are
    /// still rejected. The metric is assumed symmetric, so the distance is copied
    /// rather than recomputed. Runs sequentially because it writes into nodes
    /// other than the one being read. Returns the number of edges added.
    pub fn make_bidirectional(&mut self) -> usize {
        let forward: Vec<(u32, Neighbor)> = self
            .nodes
            .iter()
            .flat_map(|node| node.neighbors().iter().map(move |&e| (node.id, e)))
            .collect();

        let mut added = 0;
        for (src, edge) in forward {
            if self.nodes[edge.id as usize].push_edge(edge.distance, src) {
                added += 1;
            }
        }
        self.sort_all_neighbors();
        tracing::debug!("Bidirectionalization added {} reverse edges", added);
        added
    }

    /// Prune every node holding at least `max_degree` edges down to `max_degree`
    /// using diversity selection, topped up with the nearest rejected candidates.
    ///
    /// Nodes are independent, so pruning runs in parallel. Discarded edges are
    /// gone for good. Returns the number of nodes pruned.
    pub fn optimize_edges(&mut self) -> usize {
        let max_degree = self.config().max_degree;
        let dataset = Arc::clone(self.dataset());
        let metric = self.metric();

        let pruned = self
            .nodes
            .par_iter_mut()
            .filter(|node| node.len() >= max_degree)
            .map(|node| {
                let mut candidates = node.neighbors().to_vec();
                candidates.sort_unstable_by(Neighbor::cmp_by_distance);
                let kept = select_diverse(&candidates, max_degree, |a, b| {
                    metric.distance(dataset.vector(a), dataset.vector(b))
                });
                node.replace_neighbors(kept);
            })
            .count();

        tracing::debug!(
            "Diversity pruning reduced {} nodes to max_degree {}",
            pruned,
            max_degree
        );
        pruned
    }

    /// Bidirectionalize, then prune. Leaves every edge list sorted by distance.
    pub fn refine(&mut self) -> RefineStats {
        let edges_before = self.edge_count();
        let reverse_edges_added = self.make_bidirectional();
        let nodes_pruned = self.optimize_edges();
        let stats = RefineStats {
            edges_before,
            reverse_edges_added,
            nodes_pruned,
            edges_after: self.edge_count(),
        };
        tracing::info!(
            "Refined graph: {} edges -> +{} reverse -> {} after pruning {} nodes",
            stats.edges_before,
            stats.reverse_edges_added,
            stats.edges_after,
            stats.nodes_pruned
        );
        stats
    }
}

/// Relative-neighborhood edge selection over candidates sorted ascending by
/// distance to the base node.
///
/// The nearest candidate is always kept. A later candidate `c` is kept only if
/// every kept `s` satisfies `pair_distance(c, s) >= c.distance`. If fewer than
/// `max_degree` survive, the nearest rejected candidates fill the rest.
pub fn select_diverse<F>(sorted: &[Neighbor], max_degree: usize, pair_distance: F) -> Vec<Neighbor>
where
    F: Fn(u32, u32) -> f32,
{
    let mut selected: Vec<Neighbor> = Vec::with_capacity(max_degree);
    let mut taken = vec![false; sorted.len()];

    for (i, candidate) in sorted.iter().enumerate() {
        if selected.len() >= max_degree {
            break;
        }
        let is_diverse = selected
            .iter()
            .all(|kept| pair_distance(candidate.id, kept.id) >= candidate.distance);
        if is_diverse {
            selected.push(*candidate);
            taken[i] = true;
        }
    }

    for (i, candidate) in sorted.iter().enumerate() {
        if selected.len() >= max_degree {
            break;
        }
        if !taken[i] {
            selected.push(*candidate);
        }
    }

    selected.sort_unstable_by(Neighbor::cmp_by_distance);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::graph::index::GraphConfig;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn dataset(points: Vec<Vec<f32>>) -> Arc<Dataset> {
        Arc::new(Dataset::from_vectors(points).unwrap())
    }

    fn complete_graph(ds: Arc<Dataset>, cfg: GraphConfig) -> GraphIndex {
        let n = ds.len() as u32;
        let metric = cfg.metric;
        let adjacency = (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| j != i)
                    .map(|j| Neighbor::new(metric.distance(ds.vector(i), ds.vector(j)), j))
                    .collect()
            })
            .collect();
        GraphIndex::from_adjacency(ds, cfg, adjacency).unwrap()
    }

    // ── Bidirectionalization ───────────────────────────────────────────

    #[test]
    fn test_make_bidirectional_adds_reverse_edges() {
        let ds = dataset(vec![vec![0.0], vec![1.0], vec![5.0]]);
        let adjacency = vec![vec![Neighbor::new(1.0, 1), Neighbor::new(5.0, 2)], vec![], vec![]];
        let mut graph = GraphIndex::from_adjacency(ds, GraphConfig::new(1), adjacency).unwrap();

        let added = graph.make_bidirectional();
        assert_eq!(added, 2);
        assert!(graph.node(1).unwrap().contains(0));
        assert!(graph.node(2).unwrap().contains(0));
        assert_eq!(graph.node(2).unwrap().neighbors()[0].distance, 5.0);

        // Already symmetric: nothing more to add
        assert_eq!(graph.make_bidirectional(), 0);
    }

    #[test]
    fn test_make_bidirectional_ignores_import_limit() {
        let ds = dataset(vec![vec![0.0], vec![1.0], vec![2.0]]);
        let mut graph = GraphIndex::new(ds, GraphConfig::new(1));
        graph.nodes[0].add_neighbor(1.0, 1);
        graph.nodes[2].add_neighbor(1.0, 1);
        graph.nodes[1].add_neighbor(1.0, 0);
        graph.make_bidirectional();
        assert_eq!(graph.node(1).unwrap().len(), 2);
    }

    // ── Diversity selection ────────────────────────────────────────────

    #[test]
    fn test_select_diverse_rejects_dominated_direction() {
        // Base at 0; candidates at 1, 2 (same side) and -3 (other side).
        let positions = [0.0f32, 1.0, 2.0, -3.0];
        let sorted = vec![
            Neighbor::new(1.0, 1),
            Neighbor::new(2.0, 2),
            Neighbor::new(3.0, 3),
        ];
        let dist = |a: u32, b: u32| (positions[a as usize] - positions[b as usize]).abs();

        let kept = select_diverse(&sorted, 2, dist);
        let ids: Vec<u32> = kept.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 3], "node 2 is behind node 1 and must lose to node 3");

        // With room for all three, the dominated candidate fills the last slot.
        let kept = select_diverse(&sorted, 3, dist);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_select_diverse_keeps_nearest_first() {
        let sorted = vec![Neighbor::new(0.5, 9), Neighbor::new(0.6, 4)];
        let kept = select_diverse(&sorted, 1, |_, _| 0.0);
        assert_eq!(kept, vec![Neighbor::new(0.5, 9)]);
    }

    // ── Pruning ────────────────────────────────────────────────────────

    #[test]
    fn test_optimize_edges_enforces_max_degree() {
        let mut rng = StdRng::seed_from_u64(11);
        let points: Vec<Vec<f32>> = (0..40)
            .map(|_| vec![rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0)])
            .collect();
        let cfg = GraphConfig::new(3).unbounded_import();
        let mut graph = complete_graph(dataset(points), cfg);

        let pruned = graph.optimize_edges();
        assert_eq!(pruned, 40);
        for node in graph.nodes() {
            assert!(node.len() <= 6, "node {} has {} edges", node.id, node.len());
            assert!(node.is_sorted());
            assert!(!node.contains(u32::MAX));
        }
    }

    #[test]
    fn test_optimize_edges_leaves_small_nodes_alone() {
        let ds = dataset(vec![vec![0.0], vec![1.0], vec![2.0]]);
        let adjacency = vec![vec![Neighbor::new(2.0, 2), Neighbor::new(1.0, 1)], vec![], vec![]];
        let mut graph = GraphIndex::from_adjacency(ds, GraphConfig::new(2), adjacency).unwrap();
        assert_eq!(graph.optimize_edges(), 0);
        assert_eq!(graph.node(0).unwrap().len(), 2);
    }

    #[test]
    fn test_refine_bounds_degree_after_bidirectional() {
        let mut rng = StdRng::seed_from_u64(12);
        let points: Vec<Vec<f32>> = (0..60).map(|_| vec![rng.gen_range(0.0..1.0)]).collect();
        let ds = dataset(points);
        // star graph: everyone points at node 0, so node 0 receives 59 reverse edges
        let adjacency = (0..60u32)
            .map(|i| {
                if i == 0 {
                    vec![]
                } else {
                    vec![Neighbor::new(ds.vector(i)[0].abs(), 0)]
                }
            })
            .collect();
        let mut graph = GraphIndex::from_adjacency(ds, GraphConfig::new(4), adjacency).unwrap();
        let stats = graph.refine();
        assert_eq!(stats.reverse_edges_added, 59);
        assert!(graph.max_out_degree() <= 8);
        assert_eq!(graph.node(0).unwrap().len(), 8);
    }
}
