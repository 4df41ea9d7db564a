//! Search result and instrumentation types.

use crate::graph::node::Neighbor;
use std::time::Duration;

/// Work counters collected by a single search.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchStats {
    /// Nodes expanded.
    pub hops: usize,
    /// Distance evaluations, including the ones against start ids.
    pub dist_calcs: usize,
    /// Adjacency entries read while expanding nodes.
    pub node_accesses: usize,
    pub elapsed: Duration,
    /// Distance from the query to the nearest seed; `0.0` when nothing was seeded.
    pub dist_from_start: f32,
}

impl SearchStats {
    /// Componentwise maximum of two counter sets.
    ///
    /// This is how the hybrid orchestrator combines per-table searches. It
    /// reports the most expensive table, not the total work done.
    pub fn max(&self, other: &Self) -> Self {
        Self {
            hops: self.hops.max(other.hops),
            dist_calcs: self.dist_calcs.max(other.dist_calcs),
            node_accesses: self.node_accesses.max(other.node_accesses),
            elapsed: self.elapsed.max(other.elapsed),
            dist_from_start: self.dist_from_start.max(other.dist_from_start),
        }
    }
}

/// The `k` best neighbors of a query, ascending by distance, plus counters.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub neighbors: Vec<Neighbor>,
    pub stats: SearchStats,
}

impl SearchOutcome {
    /// Result ids in rank order.
    pub fn ids(&self) -> Vec<u32> {
        self.neighbors.iter().map(|n| n.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}
