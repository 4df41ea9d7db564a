//! Fixed-dimension vector dataset with dense ids.
//!
//! Vectors are stored contiguously in one `f32` arena; vector `id` occupies
//! `data[id * dimension..(id + 1) * dimension]`. Graph nodes refer to their
//! vector by id and never own a copy.

use crate::error::{GraphError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// An immutable set of vectors addressed by dense ids `0..len()`.
#[derive(Debug, Clone)]
pub struct Dataset {
    data: Vec<f32>,
    dimension: usize,
    len: usize,
}

impl Dataset {
    /// Builds a dataset from owned vectors. All vectors must share one non-zero
    /// dimension and every coordinate must be finite.
    pub fn from_vectors(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = match vectors.first() {
            Some(v) => v.len(),
            None => return Err(GraphError::EmptyDataset),
        };
        if dimension == 0 {
            return Err(GraphError::InvalidConfig(
                "vectors must have at least one dimension".into(),
            ));
        }
        let mut data = Vec::with_capacity(vectors.len() * dimension);
        for (id, v) in vectors.iter().enumerate() {
            if v.len() != dimension {
                return Err(GraphError::DimensionMismatch {
                    expected: dimension,
                    actual: v.len(),
                });
            }
            if !v.iter().all(|x| x.is_finite()) {
                return Err(GraphError::InvalidConfig(format!(
                    "vector {id} has a non-finite coordinate"
                )));
            }
            data.extend_from_slice(v);
        }
        Ok(Self {
            data,
            dimension,
            len: vectors.len(),
        })
    }

    /// Loads up to `limit` vectors from a CSV file, one comma-separated vector per line.
    /// Line `i` becomes id `i`. Blank lines are skipped.
    pub fn load_csv(path: &Path, limit: Option<usize>) -> Result<Self> {
        let file = File::open(path).map_err(|source| GraphError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut vectors = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            if limit.is_some_and(|n| vectors.len() >= n) {
                break;
            }
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let vector = line
                .split(',')
                .map(|field| field.trim().parse::<f32>())
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| GraphError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    reason: e.to_string(),
                })?;
            // "NaN" and "inf" parse as f32
            if !vector.iter().all(|x| x.is_finite()) {
                return Err(GraphError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    reason: "non-finite coordinate".into(),
                });
            }
            vectors.push(vector);
        }

        let dataset = Self::from_vectors(vectors)?;
        tracing::info!(
            "Loaded {} vectors of dimension {} from {:?}",
            dataset.len(),
            dataset.dimension(),
            path
        );
        Ok(dataset)
    }

    /// Returns the vector stored under `id`. O(1) slice into the arena.
    #[inline]
    pub fn vector(&self, id: u32) -> &[f32] {
        let start = id as usize * self.dimension;
        &self.data[start..start + self.dimension]
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates `(id, vector)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[f32])> + '_ {
        self.data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(i, v)| (i as u32, v))
    }
}
