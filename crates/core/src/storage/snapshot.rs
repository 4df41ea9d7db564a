//! Binary snapshots of a frozen graph.
//!
//! A snapshot stores the graph config and every node's edge list, not the
//! vectors: it is restored against the same [`Dataset`]. The bincode payload is
//! followed by an 8-byte footer `[magic "PGS1"][CRC32 BE]`, and writes go
//! through a temp file + rename so a crash never leaves a torn snapshot.

use crate::dataset::Dataset;
use crate::error::{GraphError, Result};
use crate::graph::index::{GraphConfig, GraphIndex};
use crate::graph::node::Neighbor;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Magic bytes placed before the CRC32 footer.
const SNAPSHOT_MAGIC: &[u8; 4] = b"PGS1";

const FOOTER_LEN: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
struct GraphSnapshot {
    config: GraphConfig,
    dimension: usize,
    adjacency: Vec<Vec<Neighbor>>,
}

impl GraphSnapshot {
    /// Structural checks against the dataset the snapshot is restored onto.
    fn validate(&self, dataset: &Dataset) -> Result<()> {
        if self.dimension != dataset.dimension() {
            return Err(GraphError::DimensionMismatch {
                expected: dataset.dimension(),
                actual: self.dimension,
            });
        }
        if self.adjacency.len() != dataset.len() {
            return Err(GraphError::Snapshot(format!(
                "snapshot has {} nodes, dataset has {}",
                self.adjacency.len(),
                dataset.len()
            )));
        }
        let n = dataset.len() as u32;
        for (id, edges) in self.adjacency.iter().enumerate() {
            let mut seen = HashSet::with_capacity(edges.len());
            for edge in edges {
                if edge.id >= n {
                    return Err(GraphError::Snapshot(format!(
                        "node {} references id {} outside 0..{}",
                        id, edge.id, n
                    )));
                }
                if edge.id as usize == id {
                    return Err(GraphError::Snapshot(format!("node {} has a self-edge", id)));
                }
                if !seen.insert(edge.id) {
                    return Err(GraphError::Snapshot(format!(
                        "node {} lists neighbor {} twice",
                        id, edge.id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Write `graph` to `path` atomically.
pub fn save_snapshot(graph: &GraphIndex, path: &Path) -> Result<()> {
    let snapshot = GraphSnapshot {
        config: graph.config().clone(),
        dimension: graph.dataset().dimension(),
        adjacency: graph.adjacency(),
    };
    let bytes = bincode::serialize(&snapshot)?;
    let crc = crc32fast::hash(&bytes);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let mut output = Vec::with_capacity(bytes.len() + FOOTER_LEN);
    output.extend_from_slice(&bytes);
    output.extend_from_slice(SNAPSHOT_MAGIC);
    output.extend_from_slice(&crc.to_be_bytes());

    fs::write(tmp_path, &output)?;
    fs::rename(tmp_path, path)?;

    tracing::info!(
        "Saved graph snapshot {:?} ({} nodes, {} bytes, CRC32={:#010x})",
        path,
        graph.len(),
        bytes.len(),
        crc
    );
    Ok(())
}

/// Restore a graph saved by [`save_snapshot`] onto `dataset`.
///
/// Fails on a missing or mismatched footer, a CRC mismatch, or an adjacency
/// that does not fit the dataset.
pub fn load_snapshot(path: &Path, dataset: Arc<Dataset>) -> Result<GraphIndex> {
    let raw = fs::read(path).map_err(|source| GraphError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    if raw.len() < FOOTER_LEN || &raw[raw.len() - FOOTER_LEN..raw.len() - 4] != SNAPSHOT_MAGIC {
        return Err(GraphError::Snapshot(format!(
            "{:?} is not a graph snapshot (missing footer)",
            path
        )));
    }
    let payload = &raw[..raw.len() - FOOTER_LEN];
    let stored_crc = u32::from_be_bytes([
        raw[raw.len() - 4],
        raw[raw.len() - 3],
        raw[raw.len() - 2],
        raw[raw.len() - 1],
    ]);
    let computed_crc = crc32fast::hash(payload);
    if computed_crc != stored_crc {
        return Err(GraphError::Snapshot(format!(
            "CRC32 mismatch: expected {:#010x}, got {:#010x}. File may be corrupted: {:?}",
            stored_crc, computed_crc, path
        )));
    }
    tracing::debug!("Snapshot CRC32 verified: {:#010x}", stored_crc);

    let snapshot: GraphSnapshot = bincode::deserialize(payload)?;
    snapshot.validate(&dataset)?;
    let graph = GraphIndex::from_adjacency(dataset, snapshot.config, snapshot.adjacency)?;

    tracing::info!(
        "Loaded graph snapshot {:?} ({} nodes, {} edges)",
        path,
        graph.len(),
        graph.edge_count()
    );
    Ok(graph)
}
