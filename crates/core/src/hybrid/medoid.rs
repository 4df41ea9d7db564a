//! Medoid selection and routing-table collapse.

use crate::dataset::Dataset;
use crate::graph::distance::DistanceMetric;
use crate::hybrid::lsh::SeedTables;
use rayon::prelude::*;

/// Member of `ids` with the smallest summed distance to all other members.
/// Ties go to the lower id. `None` for an empty set.
pub fn medoid(dataset: &Dataset, metric: DistanceMetric, ids: &[u32]) -> Option<u32> {
    ids.par_iter()
        .map(|&candidate| {
            let base = dataset.vector(candidate);
            let total: f64 = ids
                .iter()
                .map(|&other| metric.distance(base, dataset.vector(other)) as f64)
                .sum();
            (total, candidate)
        })
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, id)| id)
}

/// Replace every bucket of `table` with its medoid, so a lookup yields exactly
/// one canonical start point. Returns the number of buckets rewritten.
pub fn collapse_to_medoids<T: SeedTables>(
    tables: &mut T,
    table: usize,
    dataset: &Dataset,
    metric: DistanceMetric,
) -> usize {
    let buckets = tables.buckets_mut(table);
    let count = buckets.len();
    buckets.into_par_iter().for_each(|bucket| {
        if let Some(center) = medoid(dataset, metric, bucket.as_slice()) {
            *bucket = vec![center];
        }
    });
    tracing::debug!("Collapsed {} buckets of table {} to medoids", count, table);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hybrid::lsh::{LshConfig, LshTables};

    #[test]
    fn test_medoid_of_line_is_median() {
        let ds = Dataset::from_vectors(vec![
            vec![0.0],
            vec![1.0],
            vec![2.0],
            vec![3.0],
            vec![100.0],
        ])
        .unwrap();
        assert_eq!(medoid(&ds, DistanceMetric::Euclidean, &[0, 1, 2, 3, 4]), Some(2));
        assert_eq!(medoid(&ds, DistanceMetric::Euclidean, &[4]), Some(4));
        assert_eq!(medoid(&ds, DistanceMetric::Euclidean, &[]), None);
    }

    #[test]
    fn test_medoid_tie_prefers_lower_id() {
        let ds = Dataset::from_vectors(vec![vec![0.0], vec![1.0]]).unwrap();
        assert_eq!(medoid(&ds, DistanceMetric::Euclidean, &[1, 0]), Some(0));
    }

    #[test]
    fn test_collapse_leaves_single_member_of_bucket() {
        let ds = Dataset::from_vectors((0..50).map(|i| vec![i as f32 * 0.1]).collect()).unwrap();
        let mut tables = LshTables::build(&ds, &LshConfig::default().with_tables(2)).unwrap();
        let before: Vec<Vec<u32>> = tables.buckets_mut(0).into_iter().map(|b| b.clone()).collect();

        let collapsed = collapse_to_medoids(&mut tables, 0, &ds, DistanceMetric::Euclidean);
        assert_eq!(collapsed, before.len());
        for (id, v) in ds.iter() {
            let bucket = tables.bucket(0, v).unwrap();
            assert_eq!(bucket.len(), 1);
            let original = before.iter().find(|b| b.contains(&id)).unwrap();
            assert!(original.contains(&bucket[0]));
        }
        // other tables are untouched
        let untouched: usize = tables.buckets_mut(1).iter().map(|b| b.len()).sum();
        assert_eq!(untouched, 50);
    }
}
