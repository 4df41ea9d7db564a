//! Edge-file import and export.
//!
//! Edges are CSV rows `src,dst,distance`. Two layouts are accepted:
//! - a single file whose name ends in `.csv`;
//! - a directory of shard files `0.csv, 1.csv, ...` where node `id` is stored
//!   in shard `id / EDGE_SHARD_SIZE`.
//!
//! A missing or unreadable file aborts the load. A malformed row is rejected
//! on its own and reported in [`LoadReport::errors`]; the rest of the file loads.

use crate::config;
use crate::dataset::Dataset;
use crate::error::{GraphError, Result};
use crate::graph::index::{GraphConfig, GraphIndex};
use crate::graph::node::Neighbor;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One parsed edge row.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EdgeRecord {
    src: u32,
    dst: u32,
    distance: f32,
}

/// Summary of an edge-file load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Files read (1 for the single-file layout).
    pub files: usize,
    /// Well-formed rows read.
    pub edges_read: usize,
    /// Rows that ended up as edges (after duplicate/self rejection and the import limit).
    pub edges_kept: usize,
    /// One [`GraphError::Parse`] per rejected row.
    pub errors: Vec<GraphError>,
}

impl LoadReport {
    /// Number of malformed rows.
    pub fn rejected(&self) -> usize {
        self.errors.len()
    }
}

/// `true` if `path` names a single edge file rather than a shard directory.
pub fn is_single_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(config::EDGE_FILE_EXTENSION)
}

/// Number of shard files needed for `n` nodes.
pub fn shard_count(n: usize) -> usize {
    n.div_ceil(config::EDGE_SHARD_SIZE)
}

fn shard_path(dir: &Path, shard: usize) -> PathBuf {
    dir.join(format!("{}.{}", shard, config::EDGE_FILE_EXTENSION))
}

impl GraphIndex {
    /// Load a precomputed candidate graph over `dataset`.
    ///
    /// Each row is offered to its source node with unbounded-import insertion
    /// under `config.import_limit`; which edges survive a limit depends on file
    /// order. Every edge list is sorted by distance once loading finishes.
    pub fn load_edges(
        dataset: Arc<Dataset>,
        config: GraphConfig,
        path: &Path,
    ) -> Result<(Self, LoadReport)> {
        config.validate()?;
        let n = dataset.len();
        let mut graph = GraphIndex::new(dataset, config);
        let mut report = LoadReport::default();

        let parsed: Vec<(Vec<EdgeRecord>, Vec<GraphError>)> = if is_single_file(path) {
            vec![read_edge_file(path, n)?]
        } else {
            (0..shard_count(n))
                .into_par_iter()
                .map(|shard| read_edge_file(&shard_path(path, shard), n))
                .collect::<Result<Vec<_>>>()?
        };

        report.files = parsed.len();
        for (records, errors) in parsed {
            report.edges_read += records.len();
            report.errors.extend(errors);
            for r in records {
                if graph.nodes[r.src as usize].add_neighbor(r.distance, r.dst) {
                    report.edges_kept += 1;
                }
            }
        }
        graph.sort_all_neighbors();

        for err in &report.errors {
            tracing::warn!("Skipped edge row: {}", err);
        }
        tracing::info!(
            "Loaded {} of {} edges from {:?} ({} files, {} malformed rows)",
            report.edges_kept,
            report.edges_read,
            path,
            report.files,
            report.rejected()
        );
        Ok((graph, report))
    }

    /// Write every edge as `src,dst,distance` using the layout selected by `path`.
    ///
    /// Distances are written in shortest round-trip form, so loading the output
    /// with an unbounded import limit reproduces the same edge set.
    pub fn save_edges(&self, path: &Path) -> Result<()> {
        if is_single_file(path) {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let mut w = BufWriter::new(File::create(path)?);
            for node in self.nodes() {
                write_node_edges(&mut w, node.id, node.neighbors())?;
            }
            w.flush()?;
        } else {
            fs::create_dir_all(path)?;
            for (shard, chunk) in self.nodes().chunks(config::EDGE_SHARD_SIZE).enumerate() {
                let mut w = BufWriter::new(File::create(shard_path(path, shard))?);
                for node in chunk {
                    write_node_edges(&mut w, node.id, node.neighbors())?;
                }
                w.flush()?;
            }
        }
        tracing::info!("Saved {} edges to {:?}", self.edge_count(), path);
        Ok(())
    }
}

fn write_node_edges<W: Write>(
    w: &mut W,
    src: u32,
    edges: &[Neighbor],
) -> std::io::Result<()> {
    for edge in edges {
        writeln!(w, "{},{},{}", src, edge.id, edge.distance)?;
    }
    Ok(())
}

/// Read one edge file. Opening failures are fatal; bad rows are collected.
fn read_edge_file(path: &Path, n: usize) -> Result<(Vec<EdgeRecord>, Vec<GraphError>)> {
    let file = File::open(path).map_err(|source| GraphError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    let mut errors = Vec::new();

    // Raw byte rows: a row that is not UTF-8 is malformed, not an I/O failure.
    for (i, raw) in reader.split(b'\n').enumerate() {
        let raw = raw?;
        let row = match std::str::from_utf8(&raw) {
            Ok(row) => row.trim(),
            Err(_) => {
                errors.push(GraphError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    reason: "invalid UTF-8".to_string(),
                });
                continue;
            }
        };
        if row.is_empty() {
            continue;
        }
        match parse_edge_row(row, n) {
            Ok(record) => records.push(record),
            Err(reason) => errors.push(GraphError::Parse {
                path: path.to_path_buf(),
                line: i + 1,
                reason,
            }),
        }
    }
    Ok((records, errors))
}

fn parse_edge_row(line: &str, n: usize) -> std::result::Result<EdgeRecord, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 3 {
        return Err(format!("expected 3 columns, found {}", fields.len()));
    }
    let parse_id = |field: &str, name: &str| -> std::result::Result<u32, String> {
        let id: u32 = field
            .parse()
            .map_err(|_| format!("{name} id {field:?} is not a non-negative integer"))?;
        if id as usize >= n {
            return Err(format!("{name} id {id} outside 0..{n}"));
        }
        Ok(id)
    };
    let src = parse_id(fields[0], "source")?;
    let dst = parse_id(fields[1], "target")?;
    let distance: f32 = fields[2]
        .parse()
        .map_err(|_| format!("distance {:?} is not a number", fields[2]))?;
    if distance.is_nan() {
        return Err("distance is NaN".to_string());
    }
    Ok(EdgeRecord { src, dst, distance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn line_dataset(n: usize) -> Arc<Dataset> {
        Arc::new(Dataset::from_vectors((0..n).map(|i| vec![i as f32]).collect()).unwrap())
    }

    fn edge_set(graph: &GraphIndex) -> HashSet<(u32, u32, u32)> {
        graph
            .nodes()
            .iter()
            .flat_map(|n| n.neighbors().iter().map(move |e| (n.id, e.id, e.distance.to_bits())))
            .collect()
    }

    // ── Row parsing ────────────────────────────────────────────────────

    #[test]
    fn test_parse_edge_row() {
        let r = parse_edge_row("1,2,0.5", 3).unwrap();
        assert_eq!(
            r,
            EdgeRecord {
                src: 1,
                dst: 2,
                distance: 0.5
            }
        );
        assert!(parse_edge_row("1,2", 3).is_err());
        assert!(parse_edge_row("1,2,0.5,9", 3).is_err());
        assert!(parse_edge_row("a,2,0.5", 3).is_err());
        assert!(parse_edge_row("1,7,0.5", 3).is_err());
        assert!(parse_edge_row("-1,2,0.5", 3).is_err());
        assert!(parse_edge_row("1,2,NaN", 3).is_err());
    }

    #[test]
    fn test_shard_layout_helpers() {
        assert!(is_single_file(Path::new("graph/edges.csv")));
        assert!(!is_single_file(Path::new("graph/edges")));
        assert_eq!(shard_count(1), 1);
        assert_eq!(shard_count(1000), 1);
        assert_eq!(shard_count(1001), 2);
    }

    // ── Loading ────────────────────────────────────────────────────────

    #[test]
    fn test_load_single_file_with_limit_and_sorting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.csv");
        fs::write(&path, "0,3,3\n0,1,1\n0,2,2\n1,0,1\n").unwrap();

        let (graph, report) =
            GraphIndex::load_edges(line_dataset(4), GraphConfig::new(2), &path).unwrap();
        assert_eq!(report.edges_read, 4);
        assert_eq!(report.edges_kept, 3);
        // limit 2 keeps the first two rows in file order, then sorts
        let ids: Vec<u32> = graph.node(0).unwrap().neighbor_ids().collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(graph.node(0).unwrap().is_sorted());
    }

    #[test]
    fn test_load_reports_malformed_rows_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.csv");
        fs::write(&path, "0,1,1\nnot,a,row\n1,2\n\n2,1,1\n").unwrap();

        let (graph, report) = GraphIndex::load_edges(
            line_dataset(3),
            GraphConfig::new(2).unbounded_import(),
            &path,
        )
        .unwrap();
        assert_eq!(report.edges_kept, 2);
        assert_eq!(report.rejected(), 2);
        let lines: Vec<usize> = report
            .errors
            .iter()
            .map(|e| match e {
                GraphError::Parse { line, .. } => *line,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(lines, vec![2, 3]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_load_rejects_non_utf8_row_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.csv");
        fs::write(&path, b"0,1,1\n\xff\xfe,1\n1,2,1\n").unwrap();

        let (graph, report) = GraphIndex::load_edges(
            line_dataset(3),
            GraphConfig::new(2).unbounded_import(),
            &path,
        )
        .unwrap();
        assert_eq!(report.edges_kept, 2);
        assert_eq!(report.rejected(), 1);
        match &report.errors[0] {
            GraphError::Parse { line, reason, .. } => {
                assert_eq!(*line, 2);
                assert_eq!(reason, "invalid UTF-8");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(graph.node(0).unwrap().contains(1));
        assert!(graph.node(1).unwrap().contains(2));
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let err = GraphIndex::load_edges(
            line_dataset(3),
            GraphConfig::new(2),
            Path::new("/nonexistent/g.csv"),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::FileOpen { .. }));
    }

    #[test]
    fn test_load_missing_shard_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0.csv"), "0,1,1\n").unwrap();
        // 1500 nodes need shards 0.csv and 1.csv
        let err = GraphIndex::load_edges(line_dataset(1500), GraphConfig::new(2), dir.path())
            .unwrap_err();
        assert!(matches!(err, GraphError::FileOpen { .. }));
    }

    // ── Round trips ────────────────────────────────────────────────────

    #[test]
    fn test_save_and_reload_single_file_unbounded() {
        let dataset = line_dataset(6);
        let adjacency = (0..6u32)
            .map(|i| {
                (0..6u32)
                    .filter(|&j| j != i)
                    .map(|j| Neighbor::new((i as f32 - j as f32).abs() / 3.0, j))
                    .collect()
            })
            .collect();
        let cfg = GraphConfig::new(2).unbounded_import();
        let graph = GraphIndex::from_adjacency(Arc::clone(&dataset), cfg.clone(), adjacency)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("edges.csv");
        graph.save_edges(&path).unwrap();
        let (reloaded, report) = GraphIndex::load_edges(dataset, cfg, &path).unwrap();

        assert_eq!(report.rejected(), 0);
        assert_eq!(edge_set(&graph), edge_set(&reloaded));
    }

    #[test]
    fn test_save_and_reload_sharded_directory() {
        let n = 2100;
        let dataset = line_dataset(n);
        let adjacency = (0..n as u32)
            .map(|i| vec![Neighbor::new(1.0, (i + 1) % n as u32)])
            .collect();
        let cfg = GraphConfig::new(4).unbounded_import();
        let graph = GraphIndex::from_adjacency(Arc::clone(&dataset), cfg.clone(), adjacency)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        graph.save_edges(dir.path()).unwrap();
        assert!(dir.path().join("2.csv").exists());
        assert!(!dir.path().join("3.csv").exists());

        let (reloaded, report) = GraphIndex::load_edges(dataset, cfg, dir.path()).unwrap();
        assert_eq!(report.files, 3);
        assert_eq!(edge_set(&graph), edge_set(&reloaded));
    }
}
