//! Multi-table p-stable LSH used to pick graph search seeds.
//!
//! Each table concatenates `m` Euclidean (E2LSH) hash functions
//! `h(v) = floor((a·v + b) / w)` with `a ~ N(0, I)` and `b ~ U[0, w)`.
//! A table maps the resulting key to the ids of every dataset vector that
//! hashes to it.

use crate::config;
use crate::dataset::Dataset;
use crate::error::{GraphError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A source of seed ids: `num_tables` independent hash tables keyed by query.
///
/// Implementations must be shareable across the threads of a parallel search.
pub trait SeedTables: Send + Sync {
    fn num_tables(&self) -> usize;

    /// Ids in the bucket `query` hashes to in `table`, if that bucket exists.
    fn bucket(&self, table: usize, query: &[f32]) -> Option<&[u32]>;

    /// Every bucket of `table`, for in-place rewriting.
    fn buckets_mut(&mut self, table: usize) -> Vec<&mut Vec<u32>>;
}

/// Parameters of [`LshTables`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LshConfig {
    /// Hash functions concatenated per table (`m`).
    pub hashes: usize,
    /// Quantization width (`w`).
    pub width: f32,
    /// Number of tables (`L`).
    pub tables: usize,
    pub seed: u64,
}

impl LshConfig {
    pub fn with_hashes(mut self, hashes: usize) -> Self {
        self.hashes = hashes;
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_tables(mut self, tables: usize) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.hashes == 0 {
            return Err(GraphError::InvalidConfig("LSH hashes must be positive".into()));
        }
        if self.tables == 0 {
            return Err(GraphError::InvalidConfig("LSH tables must be positive".into()));
        }
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(GraphError::InvalidConfig(format!(
                "LSH width must be a positive number, got {}",
                self.width
            )));
        }
        Ok(())
    }
}

impl Default for LshConfig {
    fn default() -> Self {
        Self {
            hashes: config::LSH_DEFAULT_HASHES,
            width: config::LSH_DEFAULT_WIDTH,
            tables: config::LSH_DEFAULT_TABLES,
            seed: config::LSH_DEFAULT_SEED,
        }
    }
}

/// Concatenated hash key of one table.
pub type BucketKey = Vec<i32>;

/// `m` projections of one table, stored row-major.
#[derive(Debug, Clone)]
struct TableHash {
    directions: Vec<f32>,
    offsets: Vec<f32>,
    dimension: usize,
    width: f32,
}

impl TableHash {
    fn sample<R: Rng>(rng: &mut R, hashes: usize, dimension: usize, width: f32) -> Self {
        let directions = (0..hashes * dimension)
            .map(|_| rng.sample::<f32, _>(StandardNormal))
            .collect();
        let offsets = (0..hashes).map(|_| rng.gen_range(0.0..width)).collect();
        Self {
            directions,
            offsets,
            dimension,
            width,
        }
    }

    fn key(&self, v: &[f32]) -> BucketKey {
        self.directions
            .chunks_exact(self.dimension)
            .zip(&self.offsets)
            .map(|(a, &b)| {
                let dot: f32 = a.iter().zip(v).map(|(x, y)| x * y).sum();
                ((dot + b) / self.width).floor() as i32
            })
            .collect()
    }
}

/// `L` independently drawn LSH tables over a dataset.
#[derive(Debug, Clone)]
pub struct LshTables {
    hashes: Vec<TableHash>,
    tables: Vec<HashMap<BucketKey, Vec<u32>>>,
    dimension: usize,
}

impl LshTables {
    /// Draw the hash functions from `config.seed` and hash every vector into
    /// every table. Tables are filled in parallel; bucket ids stay ascending.
    pub fn build(dataset: &Dataset, config: &LshConfig) -> Result<Self> {
        config.validate()?;
        let dimension = dataset.dimension();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let hashes: Vec<TableHash> = (0..config.tables)
            .map(|_| TableHash::sample(&mut rng, config.hashes, dimension, config.width))
            .collect();

        let tables: Vec<HashMap<BucketKey, Vec<u32>>> = hashes
            .par_iter()
            .map(|hash| {
                let mut table: HashMap<BucketKey, Vec<u32>> = HashMap::new();
                for (id, vector) in dataset.iter() {
                    table.entry(hash.key(vector)).or_default().push(id);
                }
                table
            })
            .collect();

        tracing::info!(
            "Built {} LSH tables (m={}, w={}) over {} vectors, {} buckets in table 0",
            tables.len(),
            config.hashes,
            config.width,
            dataset.len(),
            tables.first().map_or(0, HashMap::len)
        );
        Ok(Self {
            hashes,
            tables,
            dimension,
        })
    }

    /// Hash key of `query` in `table`.
    pub fn key(&self, table: usize, query: &[f32]) -> Option<BucketKey> {
        if query.len() != self.dimension {
            return None;
        }
        self.hashes.get(table).map(|hash| hash.key(query))
    }

    /// Number of distinct buckets in `table`.
    pub fn bucket_count(&self, table: usize) -> usize {
        self.tables.get(table).map_or(0, HashMap::len)
    }
}

impl SeedTables for LshTables {
    fn num_tables(&self) -> usize {
        self.tables.len()
    }

    fn bucket(&self, table: usize, query: &[f32]) -> Option<&[u32]> {
        let key = self.key(table, query)?;
        self.tables[table].get(&key).map(Vec::as_slice)
    }

    fn buckets_mut(&mut self, table: usize) -> Vec<&mut Vec<u32>> {
        match self.tables.get_mut(table) {
            Some(buckets) => buckets.values_mut().collect(),
            None => Vec::new(),
        }
    }
}
