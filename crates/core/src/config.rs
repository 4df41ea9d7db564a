//! Global configuration constants for proxgraph.
//!
//! All tuning defaults and file-format constants are defined here.
//! These are compile-time constants; runtime configuration is carried by
//! [`GraphConfig`](crate::graph::GraphConfig), [`LshConfig`](crate::hybrid::LshConfig)
//! and [`HybridConfig`](crate::hybrid::HybridConfig), which the CLI fills from arguments.

/// Default construction fan-out (`degree`) of a graph node.
///
/// NN-Descent keeps exactly this many neighbors per node; the loader uses it
/// as the import limit unless unbounded import is requested.
pub const DEFAULT_DEGREE: usize = 20;

/// Factor applied to `degree` to derive the hard pruning cap (`max_degree`).
pub const MAX_DEGREE_FACTOR: usize = 2;

/// Default beam width (`ef`) for beam search.
///
/// Controls the size of the best-so-far pool. Higher values improve recall
/// at the cost of more distance evaluations.
pub const DEFAULT_EF: usize = 50;

/// Default pool size (`l`) for bounded-list search.
pub const DEFAULT_LIST_SIZE: usize = 50;

/// Default patience (`tol`) for the tolerant search variants.
///
/// A tolerant search may stop after more than `tol` consecutive hops that
/// did not improve its result pool.
pub const DEFAULT_TOLERANCE: usize = 3;

/// Default number of results returned per query.
pub const DEFAULT_K: usize = 10;

/// Default number of offered start ids a beam search evaluates before
/// picking its single seed.
pub const DEFAULT_START_IDS: usize = 50;

/// Number of node ids stored per shard file in the sharded edge layout.
///
/// Node `id` lives in shard file `{id / EDGE_SHARD_SIZE}.csv`.
pub const EDGE_SHARD_SIZE: usize = 1000;

/// Extension that selects the single-file edge layout.
pub const EDGE_FILE_EXTENSION: &str = "csv";

/// Seed id used when a hash bucket lookup misses during hybrid search.
pub const FALLBACK_SEED_ID: u32 = 0;

/// Default seed for the NN-Descent random initialization.
pub const DEFAULT_BUILD_SEED: u64 = 42;

/// Default number of hash functions concatenated per LSH table (`m`).
pub const LSH_DEFAULT_HASHES: usize = 8;

/// Default quantization width (`w`) of the p-stable LSH projections.
pub const LSH_DEFAULT_WIDTH: f32 = 4.0;

/// Default number of independent LSH tables (`L`).
///
/// The parallel hybrid search runs one graph search per table.
pub const LSH_DEFAULT_TABLES: usize = 4;

/// Default seed for the LSH projection draws.
pub const LSH_DEFAULT_SEED: u64 = 7;
