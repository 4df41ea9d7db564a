//! Hybrid LSH + graph search.
//!
//! LSH tables pick where a graph search starts; the graph does the rest.
//! Table 0 is the routing table: after construction each of its buckets is
//! collapsed to the bucket's medoid, so a single-table query always starts from
//! one canonical node. The parallel query runs one beam search per table and
//! merges the results.

pub mod lsh;
pub mod medoid;
pub mod merge;

pub use lsh::{BucketKey, LshConfig, LshTables, SeedTables};
pub use medoid::{collapse_to_medoids, medoid};
pub use merge::merge_outcomes;

use crate::config;
use crate::dataset::Dataset;
use crate::error::{GraphError, Result};
use crate::graph::index::{GraphConfig, GraphIndex};
use crate::graph::io::LoadReport;
use crate::graph::node::Neighbor;
use crate::search::types::{SearchOutcome, SearchStats};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Index of the table whose buckets are collapsed to medoids.
pub const ROUTING_TABLE: usize = 0;

/// Search parameters of a [`HybridIndex`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridConfig {
    pub lsh: LshConfig,
    /// Beam width of every per-table search.
    pub ef: usize,
    /// Bucket members evaluated before a beam search picks its seed.
    pub n_start: usize,
}

impl HybridConfig {
    pub fn with_lsh(mut self, lsh: LshConfig) -> Self {
        self.lsh = lsh;
        self
    }

    pub fn with_ef(mut self, ef: usize) -> Self {
        self.ef = ef;
        self
    }

    pub fn with_n_start(mut self, n_start: usize) -> Self {
        self.n_start = n_start;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.lsh.validate()?;
        if self.ef == 0 {
            return Err(GraphError::InvalidConfig("ef must be positive".into()));
        }
        if self.n_start == 0 {
            return Err(GraphError::InvalidConfig("n_start must be positive".into()));
        }
        Ok(())
    }
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            lsh: LshConfig::default(),
            ef: config::DEFAULT_EF,
            n_start: config::DEFAULT_START_IDS,
        }
    }
}

/// Result of a hybrid query with per-phase timings.
#[derive(Debug, Clone, Default)]
pub struct HybridOutcome {
    pub neighbors: Vec<Neighbor>,
    /// Graph search counters (per-table maximum for parallel queries).
    pub stats: SearchStats,
    /// Start id candidates offered to the graph search (largest over tables).
    pub bucket_size: usize,
    pub lsh_time: Duration,
    pub graph_time: Duration,
    pub merge_time: Duration,
    /// Wall time of the whole query.
    pub time: Duration,
}

impl HybridOutcome {
    pub fn ids(&self) -> Vec<u32> {
        self.neighbors.iter().map(|n| n.id).collect()
    }
}

/// A frozen graph plus the seed tables that route queries into it.
#[derive(Debug)]
pub struct HybridIndex<T: SeedTables = LshTables> {
    graph: GraphIndex,
    tables: T,
    config: HybridConfig,
}

impl HybridIndex<LshTables> {
    /// Build LSH tables over `dataset`, collapse the routing table to medoids,
    /// then load the companion graph from `edge_path` and refine it.
    pub fn build(
        dataset: Arc<Dataset>,
        edge_path: &Path,
        graph_config: GraphConfig,
        config: HybridConfig,
    ) -> Result<(Self, LoadReport)> {
        config.validate()?;
        let mut tables = LshTables::build(&dataset, &config.lsh)?;
        collapse_to_medoids(&mut tables, ROUTING_TABLE, &dataset, graph_config.metric);

        let (mut graph, report) = GraphIndex::load_edges(dataset, graph_config, edge_path)?;
        graph.refine();
        tracing::info!(
            "Hybrid index ready: {} nodes, {} tables, {} routing buckets",
            graph.len(),
            tables.num_tables(),
            tables.bucket_count(ROUTING_TABLE)
        );
        Ok((Self::from_parts(graph, tables, config), report))
    }
}

impl<T: SeedTables> HybridIndex<T> {
    /// Combine an already refined graph with seed tables as they are.
    pub fn from_parts(graph: GraphIndex, tables: T, config: HybridConfig) -> Self {
        Self {
            graph,
            tables,
            config,
        }
    }

    pub fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    pub fn tables(&self) -> &T {
        &self.tables
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// Seed ids for `query` in `table`. A missing or empty bucket falls back to
    /// [`config::FALLBACK_SEED_ID`].
    fn seeds(&self, table: usize, query: &[f32]) -> Vec<u32> {
        match self.tables.bucket(table, query) {
            Some(ids) if !ids.is_empty() => ids.to_vec(),
            _ => vec![config::FALLBACK_SEED_ID],
        }
    }

    /// One table lookup followed by one beam search.
    fn search_table(
        &self,
        table: usize,
        query: &[f32],
        k: usize,
    ) -> (SearchOutcome, usize, Duration) {
        let lsh_start = Instant::now();
        let start_ids = self.seeds(table, query);
        let lsh_time = lsh_start.elapsed();
        let outcome = self
            .graph
            .beam_search(query, k, self.config.ef, &start_ids, self.config.n_start);
        (outcome, start_ids.len(), lsh_time)
    }

    /// Query through the routing table only.
    pub fn search(&self, query: &[f32], k: usize) -> HybridOutcome {
        let start = Instant::now();
        let (outcome, bucket_size, lsh_time) = self.search_table(ROUTING_TABLE, query, k);
        HybridOutcome {
            neighbors: outcome.neighbors,
            graph_time: outcome.stats.elapsed,
            stats: outcome.stats,
            bucket_size,
            lsh_time,
            merge_time: Duration::ZERO,
            time: start.elapsed(),
        }
    }

    /// Query every table in parallel and merge.
    ///
    /// Every per-table search runs to completion before the merge. Results are
    /// deduplicated by id; counters and phase timings are per-table maxima.
    pub fn search_parallel(&self, query: &[f32], k: usize) -> HybridOutcome {
        let start = Instant::now();
        let per_table: Vec<(SearchOutcome, usize, Duration)> = (0..self.tables.num_tables())
            .into_par_iter()
            .map(|table| self.search_table(table, query, k))
            .collect();

        let merge_start = Instant::now();
        let outcomes: Vec<SearchOutcome> = per_table.iter().map(|(o, _, _)| o.clone()).collect();
        let merged = merge_outcomes(&outcomes, k);
        let bucket_size = per_table.iter().map(|(_, b, _)| *b).max().unwrap_or(0);
        let lsh_time = per_table
            .iter()
            .map(|(_, _, t)| *t)
            .max()
            .unwrap_or(Duration::ZERO);
        let merge_time = merge_start.elapsed();

        HybridOutcome {
            neighbors: merged.neighbors,
            graph_time: merged.stats.elapsed,
            stats: merged.stats,
            bucket_size,
            lsh_time,
            merge_time,
            time: start.elapsed(),
        }
    }
}
