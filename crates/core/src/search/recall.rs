//! Recall of an approximate result against ground truth.

use crate::graph::node::Neighbor;
use std::collections::HashSet;

/// Fraction of the first `k` ground-truth ids found among the first `k` results.
///
/// Returns `1.0` when there is nothing to find.
pub fn recall(result: &[Neighbor], truth: &[Neighbor], k: usize) -> f64 {
    let expected: HashSet<u32> = truth.iter().take(k).map(|n| n.id).collect();
    if expected.is_empty() {
        return 1.0;
    }
    let found = result
        .iter()
        .take(k)
        .filter(|n| expected.contains(&n.id))
        .count();
    found as f64 / expected.len() as f64
}

/// Mean of per-query recalls.
pub fn mean_recall(recalls: &[f64]) -> f64 {
    if recalls.is_empty() {
        return 0.0;
    }
    recalls.iter().sum::<f64>() / recalls.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ids: &[u32]) -> Vec<Neighbor> {
        ids.iter().map(|&id| Neighbor::new(id as f32, id)).collect()
    }

    #[test]
    fn test_recall() {
        assert_eq!(recall(&ids(&[1, 2, 3]), &ids(&[1, 2, 3]), 3), 1.0);
        assert_eq!(recall(&ids(&[1, 9, 3]), &ids(&[1, 2, 3]), 3), 2.0 / 3.0);
        assert_eq!(recall(&ids(&[]), &ids(&[1, 2]), 2), 0.0);
        assert_eq!(recall(&ids(&[5]), &ids(&[]), 2), 1.0);
        // only the first k results count
        assert_eq!(recall(&ids(&[9, 1]), &ids(&[1]), 1), 0.0);
    }

    #[test]
    fn test_mean_recall() {
        assert_eq!(mean_recall(&[1.0, 0.5]), 0.75);
        assert_eq!(mean_recall(&[]), 0.0);
    }
}
