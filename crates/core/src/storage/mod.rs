//! Disk persistence for frozen graphs.
//!
//! Edge CSV files (see [`crate::graph::io`]) are the interchange format;
//! snapshots are the compact checksummed format for reloading a refined graph.

/// Snapshot save/load with CRC32 footer and atomic writes.
pub mod snapshot;

pub use snapshot::{load_snapshot, save_snapshot};
