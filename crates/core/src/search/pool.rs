//! Candidate containers for the greedy search skeleton.
//!
//! A pool decides which candidate is expanded next, which discovered
//! neighbors it keeps, and what the final ranking is. The skeleton owns
//! everything else (seeding, visited tracking, counters, termination).

use crate::graph::node::Neighbor;
use crate::search::heap::{BoundedMaxHeap, Frontier};

/// The candidate a pool wants expanded next.
#[derive(Debug, Clone, Copy)]
pub struct Next {
    pub candidate: Neighbor,
    /// `false` once the pool's own stop rule says no further improvement is
    /// expected. Strict searches stop here; patient ones may continue.
    pub within_bound: bool,
}

/// Pluggable candidate container.
pub trait CandidatePool {
    /// Seed with distinct start candidates sorted ascending by distance.
    fn seed(&mut self, seeds: &[Neighbor]);

    /// Take the next candidate to expand, or `None` once nothing is left.
    fn next(&mut self) -> Option<Next>;

    /// Offer a newly discovered neighbor of the node being expanded.
    /// Returns `true` if it improved the result pool.
    fn admit(&mut self, neighbor: Neighbor) -> bool;

    /// Called once after every expansion.
    fn finish_hop(&mut self) {}

    /// The `k` nearest kept candidates, ascending.
    fn into_nearest(self, k: usize) -> Vec<Neighbor>;
}

/// Min-ordered frontier plus a best-pool capped at `ef`.
#[derive(Debug)]
pub struct BeamPool {
    frontier: Frontier,
    best: BoundedMaxHeap,
}

impl BeamPool {
    pub fn new(ef: usize) -> Self {
        Self {
            frontier: Frontier::with_capacity(ef * 2),
            best: BoundedMaxHeap::new(ef),
        }
    }
}

impl CandidatePool for BeamPool {
    fn seed(&mut self, seeds: &[Neighbor]) {
        for &seed in seeds {
            self.frontier.push(seed);
            self.best.push(seed);
        }
    }

    fn next(&mut self) -> Option<Next> {
        let candidate = self.frontier.pop()?;
        let within_bound = self.best.worst().map_or(true, |worst| candidate.distance <= worst);
        Some(Next {
            candidate,
            within_bound,
        })
    }

    fn admit(&mut self, neighbor: Neighbor) -> bool {
        if !self.best.admits(neighbor.distance) {
            return false;
        }
        self.frontier.push(neighbor);
        self.best.push(neighbor);
        true
    }

    fn into_nearest(self, k: usize) -> Vec<Neighbor> {
        let mut nearest = self.best.into_sorted_vec();
        nearest.truncate(k);
        nearest
    }
}

#[derive(Debug, Clone, Copy)]
struct Ranked {
    neighbor: Neighbor,
    checked: bool,
}

/// Flat list ranked by distance, expanded front to back.
///
/// The first `l` ranks are the result window. A strict list is truncated to
/// `l` after every hop; a patient list keeps the overflow so it can fall back
/// on it once the window is fully checked. Both see the same window.
#[derive(Debug)]
pub struct RankedList {
    entries: Vec<Ranked>,
    l: usize,
    keep_overflow: bool,
    /// Window boundary captured when the current hop started.
    hop_bound: f32,
}

impl RankedList {
    pub fn new(l: usize, keep_overflow: bool) -> Self {
        Self {
            entries: Vec::with_capacity(l * 2),
            l,
            keep_overflow,
            hop_bound: f32::INFINITY,
        }
    }

    fn window_bound(&self) -> f32 {
        if self.entries.len() >= self.l {
            self.entries[self.l - 1].neighbor.distance
        } else {
            f32::INFINITY
        }
    }
}

impl CandidatePool for RankedList {
    fn seed(&mut self, seeds: &[Neighbor]) {
        self.entries.extend(seeds.iter().map(|&neighbor| Ranked {
            neighbor,
            checked: false,
        }));
    }

    fn next(&mut self) -> Option<Next> {
        let rank = self.entries.iter().position(|e| !e.checked)?;
        self.hop_bound = self.window_bound();
        let entry = &mut self.entries[rank];
        entry.checked = true;
        Some(Next {
            candidate: entry.neighbor,
            within_bound: rank < self.l,
        })
    }

    fn admit(&mut self, neighbor: Neighbor) -> bool {
        self.entries.push(Ranked {
            neighbor,
            checked: false,
        });
        neighbor.distance < self.hop_bound
    }

    fn finish_hop(&mut self) {
        self.entries
            .sort_by(|a, b| a.neighbor.cmp_by_distance(&b.neighbor));
        if !self.keep_overflow {
            self.entries.truncate(self.l);
        }
    }

    fn into_nearest(self, k: usize) -> Vec<Neighbor> {
        self.entries
            .into_iter()
            .take(k.min(self.l))
            .map(|e| e.neighbor)
            .collect()
    }
}
