//! # proxgraph-core
//!
//! Proximity-graph approximate nearest neighbor engine: NN-Descent k-NN graph
//! construction, an edge-file load + refine pipeline (bidirectionalization and
//! diversity pruning), greedy beam and list searches with strict or patient
//! termination, and a hybrid LSH-seeded multi-table search.
//!
//! This is the library crate with no async dependencies; the `proxgraph`
//! binary drives it from the command line.

/// Global configuration constants: defaults and file-format parameters.
pub mod config;
/// In-memory vector storage with dense ids.
pub mod dataset;
/// Error type and `Result` alias.
pub mod error;
/// Proximity graph: nodes, NN-Descent builder, edge-file I/O and refinement.
pub mod graph;
/// LSH seed tables, medoid routing and the parallel multi-table search.
pub mod hybrid;
/// CSV benchmark logs and ground-truth loading.
pub mod report;
/// Query engine: the greedy search skeleton, exact scan and recall.
pub mod search;
/// Checksummed binary graph snapshots.
pub mod storage;

pub use dataset::Dataset;
pub use error::{GraphError, Result};
pub use graph::{DistanceMetric, GraphConfig, GraphIndex, Neighbor, NnDescentBuilder};
pub use hybrid::{HybridConfig, HybridIndex, HybridOutcome, LshConfig, LshTables};
pub use search::{SearchOutcome, SearchStats};
