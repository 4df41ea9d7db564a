//! Merging of per-table search outcomes.

use crate::graph::node::Neighbor;
use crate::search::types::{SearchOutcome, SearchStats};
use std::collections::HashSet;

/// Union of all per-table results, deduplicated by id, ascending, truncated to `k`.
///
/// Counters are folded with [`SearchStats::max`]: the merged stats describe the
/// most expensive table rather than the sum over tables.
pub fn merge_outcomes(outcomes: &[SearchOutcome], k: usize) -> SearchOutcome {
    let mut seen: HashSet<u32> = HashSet::new();
    let mut neighbors: Vec<Neighbor> = Vec::new();
    let mut stats = SearchStats::default();

    for outcome in outcomes {
        for &neighbor in &outcome.neighbors {
            if seen.insert(neighbor.id) {
                neighbors.push(neighbor);
            }
        }
        stats = stats.max(&outcome.stats);
    }

    neighbors.sort_by(Neighbor::cmp_by_distance);
    neighbors.truncate(k);
    SearchOutcome { neighbors, stats }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(pairs: &[(f32, u32)], hops: usize, dist_calcs: usize) -> SearchOutcome {
        SearchOutcome {
            neighbors: pairs.iter().map(|&(d, id)| Neighbor::new(d, id)).collect(),
            stats: SearchStats {
                hops,
                dist_calcs,
                ..SearchStats::default()
            },
        }
    }

    #[test]
    fn test_merge_dedups_shared_id() {
        let a = outcome(&[(0.5, 7), (1.0, 3)], 4, 10);
        let b = outcome(&[(0.5, 7), (0.8, 9)], 6, 8);
        let merged = merge_outcomes(&[a, b], 10);
        assert_eq!(merged.ids(), vec![7, 9, 3]);
        assert_eq!(merged.ids().iter().filter(|&&id| id == 7).count(), 1);
    }

    #[test]
    fn test_merge_truncates_and_takes_max_counters() {
        let a = outcome(&[(2.0, 1), (3.0, 2)], 4, 10);
        let b = outcome(&[(1.0, 5), (4.0, 6)], 6, 8);
        let merged = merge_outcomes(&[a, b], 2);
        assert_eq!(merged.ids(), vec![5, 1]);
        assert_eq!(merged.stats.hops, 6);
        assert_eq!(merged.stats.dist_calcs, 10);
    }

    #[test]
    fn test_merge_nothing() {
        let merged = merge_outcomes(&[], 5);
        assert!(merged.is_empty());
        assert_eq!(merged.stats, SearchStats::default());
    }
}
