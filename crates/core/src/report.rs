//! Benchmark output: per-query log rows and result rows as CSV.
//!
//! Log file columns:
//! `time,lsh_time,graph_time,merge_time,n_bucket_content,n_node_access,n_dist_calc,n_hop,dist_from_start,recall`
//! with times in microseconds. Result file columns: `query_id,data_id,dist`.
//! A result file doubles as ground truth for later runs.

use crate::error::{GraphError, Result};
use crate::graph::node::Neighbor;
use crate::hybrid::HybridOutcome;
use crate::search::types::SearchOutcome;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

pub const LOG_HEADER: &str = "time,lsh_time,graph_time,merge_time,n_bucket_content,\
n_node_access,n_dist_calc,n_hop,dist_from_start,recall";

pub const RESULT_HEADER: &str = "query_id,data_id,dist";

/// One query's counters, as written to the log file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRow {
    pub time: Duration,
    pub lsh_time: Duration,
    pub graph_time: Duration,
    pub merge_time: Duration,
    pub bucket_size: usize,
    pub node_accesses: usize,
    pub dist_calcs: usize,
    pub hops: usize,
    pub dist_from_start: f32,
    pub recall: f64,
}

impl LogRow {
    fn to_csv(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            self.time.as_micros(),
            self.lsh_time.as_micros(),
            self.graph_time.as_micros(),
            self.merge_time.as_micros(),
            self.bucket_size,
            self.node_accesses,
            self.dist_calcs,
            self.hops,
            self.dist_from_start,
            self.recall
        )
    }
}

/// Collected rows of a benchmark run, in query order.
#[derive(Debug, Default)]
pub struct SearchLog {
    rows: Vec<LogRow>,
    results: Vec<Vec<Neighbor>>,
}

impl SearchLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a plain graph search.
    pub fn push_search(&mut self, outcome: &SearchOutcome, recall: f64) {
        let stats = &outcome.stats;
        self.rows.push(LogRow {
            time: stats.elapsed,
            graph_time: stats.elapsed,
            node_accesses: stats.node_accesses,
            dist_calcs: stats.dist_calcs,
            hops: stats.hops,
            dist_from_start: stats.dist_from_start,
            recall,
            ..LogRow::default()
        });
        self.results.push(outcome.neighbors.clone());
    }

    /// Record a hybrid search, including its phase timings.
    pub fn push_hybrid(&mut self, outcome: &HybridOutcome, recall: f64) {
        let stats = &outcome.stats;
        self.rows.push(LogRow {
            time: outcome.time,
            lsh_time: outcome.lsh_time,
            graph_time: outcome.graph_time,
            merge_time: outcome.merge_time,
            bucket_size: outcome.bucket_size,
            node_accesses: stats.node_accesses,
            dist_calcs: stats.dist_calcs,
            hops: stats.hops,
            dist_from_start: stats.dist_from_start,
            recall,
        });
        self.results.push(outcome.neighbors.clone());
    }

    pub fn rows(&self) -> &[LogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn mean_recall(&self) -> f64 {
        let recalls: Vec<f64> = self.rows.iter().map(|r| r.recall).collect();
        crate::search::recall::mean_recall(&recalls)
    }

    /// Write the log and result files, replacing existing ones.
    pub fn save(&self, log_path: &Path, result_path: &Path) -> Result<()> {
        let mut log = BufWriter::new(File::create(log_path)?);
        writeln!(log, "{}", LOG_HEADER)?;
        for row in &self.rows {
            writeln!(log, "{}", row.to_csv())?;
        }
        log.flush()?;

        let mut results = BufWriter::new(File::create(result_path)?);
        writeln!(results, "{}", RESULT_HEADER)?;
        for (query_id, neighbors) in self.results.iter().enumerate() {
            for n in neighbors {
                writeln!(results, "{},{},{}", query_id, n.id, n.distance)?;
            }
        }
        results.flush()?;

        tracing::info!(
            "Wrote {} query logs to {:?} and results to {:?}",
            self.rows.len(),
            log_path,
            result_path
        );
        Ok(())
    }
}

/// Read a result file back as ground truth, indexed by query id.
///
/// The header line is optional. Query ids need not be contiguous; missing
/// ones get an empty list. Rows keep file order within a query.
pub fn load_ground_truth(path: &Path) -> Result<Vec<Vec<Neighbor>>> {
    let file = File::open(path).map_err(|source| GraphError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut truth: Vec<Vec<Neighbor>> = Vec::new();

    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || (i == 0 && line == RESULT_HEADER) {
            continue;
        }
        let parse_error = |reason: String| GraphError::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            reason,
        };
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [query, data, dist] = fields.as_slice() else {
            return Err(parse_error(format!("expected 3 columns, found {}", fields.len())));
        };
        let query: usize = query
            .parse()
            .map_err(|e| parse_error(format!("query id {query:?}: {e}")))?;
        let data: u32 = data
            .parse()
            .map_err(|e| parse_error(format!("data id {data:?}: {e}")))?;
        let dist: f32 = dist
            .parse()
            .map_err(|e| parse_error(format!("distance {dist:?}: {e}")))?;

        if truth.len() <= query {
            truth.resize_with(query + 1, Vec::new);
        }
        truth[query].push(Neighbor::new(dist, data));
    }
    Ok(truth)
}
