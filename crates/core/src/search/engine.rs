//! Greedy graph search.
//!
//! All four public strategies run through [`greedy_search`], which is
//! parameterized by three choices:
//! - [`SeedPolicy`]: seed with the single nearest start id or with all of them;
//! - a [`CandidatePool`]: bounded beam ([`BeamPool`]) or ranked list ([`RankedList`]);
//! - [`Termination`]: stop at the pool's bound, or tolerate a number of
//!   consecutive non-improving hops past it.
//!
//! Searches only read the graph. Per-thread scratch space (the visited set)
//! lives in a thread-local, so any number of searches can run concurrently.

use crate::graph::index::GraphIndex;
use crate::graph::node::Neighbor;
use crate::graph::visited::VisitedSet;
use crate::search::pool::{BeamPool, CandidatePool, RankedList};
use crate::search::types::{SearchOutcome, SearchStats};
use std::cell::RefCell;
use std::time::Instant;

thread_local! {
    /// Reused across searches on the same thread to avoid a per-query allocation.
    static SEARCH_VISITED: RefCell<VisitedSet> = RefCell::new(VisitedSet::with_nodes(0));
}

/// How start ids become seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedPolicy {
    /// Evaluate the first `n_start` start ids and seed only the nearest one.
    /// The others are neither seeded nor marked visited.
    Nearest { n_start: usize },
    /// Seed every distinct start id.
    All,
}

/// When the search loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Stop at the first candidate outside the pool's bound.
    Strict,
    /// Past the bound, keep expanding until more than `tol` consecutive hops
    /// failed to improve the pool.
    Patience { tol: usize },
}

/// The shared search loop.
///
/// Out-of-range start ids are skipped. With no valid seed the outcome is empty.
pub fn greedy_search<P: CandidatePool>(
    graph: &GraphIndex,
    query: &[f32],
    k: usize,
    start_ids: &[u32],
    seed_policy: SeedPolicy,
    mut pool: P,
    termination: Termination,
) -> SearchOutcome {
    let start = Instant::now();
    let mut stats = SearchStats::default();

    let neighbors = SEARCH_VISITED.with(|cell| {
        let mut visited = cell.borrow_mut();
        visited.prepare(graph.len());

        let seeds = select_seeds(graph, query, start_ids, seed_policy, &mut visited, &mut stats);
        let Some(nearest_seed) = seeds.first() else {
            return Vec::new();
        };
        stats.dist_from_start = nearest_seed.distance;
        pool.seed(&seeds);

        let mut unimproved_hops = 0usize;
        while let Some(next) = pool.next() {
            if !next.within_bound {
                match termination {
                    Termination::Strict => break,
                    Termination::Patience { tol } if unimproved_hops > tol => break,
                    Termination::Patience { .. } => {}
                }
            }

            stats.hops += 1;
            let Some(node) = graph.node(next.candidate.id) else {
                continue;
            };
            let mut improved = false;
            for neighbor_id in node.neighbor_ids() {
                stats.node_accesses += 1;
                if !visited.mark(neighbor_id) {
                    continue;
                }
                let dist = graph.distance_to(query, neighbor_id);
                stats.dist_calcs += 1;
                if pool.admit(Neighbor::new(dist, neighbor_id)) {
                    improved = true;
                }
            }
            pool.finish_hop();

            if improved {
                unimproved_hops = 0;
            } else {
                unimproved_hops += 1;
            }
        }

        pool.into_nearest(k)
    });

    stats.elapsed = start.elapsed();
    SearchOutcome { neighbors, stats }
}

/// Evaluate start ids and return the seeds, ascending by distance.
fn select_seeds(
    graph: &GraphIndex,
    query: &[f32],
    start_ids: &[u32],
    policy: SeedPolicy,
    visited: &mut VisitedSet,
    stats: &mut SearchStats,
) -> Vec<Neighbor> {
    let n = graph.len() as u32;
    match policy {
        SeedPolicy::Nearest { n_start } => {
            let nearest = start_ids
                .iter()
                .take(n_start)
                .filter(|&&id| id < n)
                .map(|&id| {
                    stats.dist_calcs += 1;
                    Neighbor::new(graph.distance_to(query, id), id)
                })
                .min_by(Neighbor::cmp_by_distance);
            match nearest {
                Some(seed) => {
                    visited.mark(seed.id);
                    vec![seed]
                }
                None => Vec::new(),
            }
        }
        SeedPolicy::All => {
            let mut seeds: Vec<Neighbor> = start_ids
                .iter()
                .filter(|&&id| id < n)
                .filter(|&&id| visited.mark(id))
                .map(|&id| {
                    stats.dist_calcs += 1;
                    Neighbor::new(graph.distance_to(query, id), id)
                })
                .collect();
            seeds.sort_by(Neighbor::cmp_by_distance);
            seeds
        }
    }
}

impl GraphIndex {
    /// Bounded beam search.
    ///
    /// Evaluates the first `n_start` of `start_ids` and seeds only the nearest.
    /// Keeps a best-pool of `ef` entries and stops as soon as the nearest
    /// unexpanded candidate is further than the worst pooled entry.
    pub fn beam_search(
        &self,
        query: &[f32],
        k: usize,
        ef: usize,
        start_ids: &[u32],
        n_start: usize,
    ) -> SearchOutcome {
        greedy_search(
            self,
            query,
            k,
            start_ids,
            SeedPolicy::Nearest { n_start },
            BeamPool::new(ef.max(1)),
            Termination::Strict,
        )
    }

    /// Bounded-list search.
    ///
    /// Seeds a ranked list with every start id and repeatedly expands the
    /// best unchecked entry, truncating the list to `l` after each hop. Stops
    /// once the first `l` entries are all checked.
    pub fn list_search(
        &self,
        query: &[f32],
        k: usize,
        start_ids: &[u32],
        l: usize,
    ) -> SearchOutcome {
        greedy_search(
            self,
            query,
            k,
            start_ids,
            SeedPolicy::All,
            RankedList::new(l.max(1), false),
            Termination::Strict,
        )
    }

    /// [`beam_search`](Self::beam_search) that keeps going past the pool bound
    /// until more than `tol` consecutive hops admit nothing.
    pub fn tolerant_beam_search(
        &self,
        query: &[f32],
        k: usize,
        ef: usize,
        start_ids: &[u32],
        n_start: usize,
        tol: usize,
    ) -> SearchOutcome {
        greedy_search(
            self,
            query,
            k,
            start_ids,
            SeedPolicy::Nearest { n_start },
            BeamPool::new(ef.max(1)),
            Termination::Patience { tol },
        )
    }

    /// [`list_search`](Self::list_search) that keeps expanding entries beyond
    /// rank `l` until more than `tol` consecutive hops leave the window unchanged.
    pub fn tolerant_list_search(
        &self,
        query: &[f32],
        k: usize,
        start_ids: &[u32],
        l: usize,
        tol: usize,
    ) -> SearchOutcome {
        greedy_search(
            self,
            query,
            k,
            start_ids,
            SeedPolicy::All,
            RankedList::new(l.max(1), true),
            Termination::Patience { tol },
        )
    }
}
