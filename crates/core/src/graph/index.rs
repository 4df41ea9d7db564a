//! Graph index structure and configuration.
//!
//! [`GraphConfig`] carries the degree parameters and distance metric.
//! [`GraphIndex`] owns every node; node id equals its position in the node array
//! and its vector's id in the shared [`Dataset`].

use crate::config;
use crate::dataset::Dataset;
use crate::error::{GraphError, Result};
use crate::graph::distance::DistanceMetric;
use crate::graph::node::{DegreeLimit, GraphNode, InsertPolicy, Neighbor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Degree parameters and metric of a proximity graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Construction fan-out: neighbors kept per node by NN-Descent.
    pub degree: usize,
    /// Hard cap enforced by diversity pruning (typically `2 * degree`).
    pub max_degree: usize,
    /// Limit applied by the edge-file loader before pruning.
    pub import_limit: DegreeLimit,
    pub metric: DistanceMetric,
}

impl GraphConfig {
    /// Config with `max_degree = 2 * degree` and an import limit of `degree`.
    pub fn new(degree: usize) -> Self {
        Self {
            degree,
            max_degree: degree * config::MAX_DEGREE_FACTOR,
            import_limit: DegreeLimit::AtMost(degree),
            metric: DistanceMetric::default(),
        }
    }

    pub fn with_max_degree(mut self, max_degree: usize) -> Self {
        self.max_degree = max_degree;
        self
    }

    /// Load every edge of the input file, regardless of `degree`.
    pub fn unbounded_import(mut self) -> Self {
        self.import_limit = DegreeLimit::Unbounded;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.degree == 0 {
            return Err(GraphError::InvalidConfig("degree must be positive".into()));
        }
        if self.max_degree == 0 {
            return Err(GraphError::InvalidConfig(
                "max_degree must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new(config::DEFAULT_DEGREE)
    }
}

/// A proximity graph over a dataset.
///
/// Mutated only while it is built or refined; all search entry points take `&self`.
#[derive(Debug, Clone)]
pub struct GraphIndex {
    pub(crate) nodes: Vec<GraphNode>,
    config: GraphConfig,
    dataset: Arc<Dataset>,
}

impl GraphIndex {
    /// Empty-edged graph whose nodes use unbounded-import insertion under
    /// `config.import_limit`. Starting point of the edge-file loader.
    pub fn new(dataset: Arc<Dataset>, config: GraphConfig) -> Self {
        let policy = InsertPolicy::Import(config.import_limit);
        Self::with_policy(dataset, config, policy)
    }

    /// Empty-edged graph whose nodes use eager-bounded insertion with cap `degree`.
    /// Starting point of NN-Descent.
    pub(crate) fn new_bounded(dataset: Arc<Dataset>, config: GraphConfig) -> Self {
        let policy = InsertPolicy::Bounded(config.degree);
        Self::with_policy(dataset, config, policy)
    }

    fn with_policy(dataset: Arc<Dataset>, config: GraphConfig, policy: InsertPolicy) -> Self {
        let nodes = (0..dataset.len() as u32)
            .map(|id| GraphNode::new(id, policy))
            .collect();
        Self {
            nodes,
            config,
            dataset,
        }
    }

    /// Rebuild a graph from a per-node adjacency list (snapshot restore).
    /// Every list must reference ids inside the dataset.
    pub fn from_adjacency(
        dataset: Arc<Dataset>,
        config: GraphConfig,
        adjacency: Vec<Vec<Neighbor>>,
    ) -> Result<Self> {
        if adjacency.len() != dataset.len() {
            return Err(GraphError::Snapshot(format!(
                "adjacency covers {} nodes, dataset has {}",
                adjacency.len(),
                dataset.len()
            )));
        }
        let n = dataset.len() as u32;
        let mut graph = Self::new(dataset, config);
        for (node, edges) in graph.nodes.iter_mut().zip(adjacency) {
            if let Some(bad) = edges.iter().find(|e| e.id >= n) {
                return Err(GraphError::Snapshot(format!(
                    "node {} references id {} outside 0..{}",
                    node.id, bad.id, n
                )));
            }
            node.replace_neighbors(edges);
        }
        Ok(graph)
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: u32) -> Option<&GraphNode> {
        self.nodes.get(id as usize)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    #[inline]
    pub fn metric(&self) -> DistanceMetric {
        self.config.metric
    }

    #[inline]
    pub fn vector(&self, id: u32) -> &[f32] {
        self.dataset.vector(id)
    }

    /// Distance from an arbitrary query vector to node `id`.
    #[inline]
    pub fn distance_to(&self, query: &[f32], id: u32) -> f32 {
        self.config.metric.distance(query, self.dataset.vector(id))
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(GraphNode::len).sum()
    }

    /// Largest out-degree of any node.
    pub fn max_out_degree(&self) -> usize {
        self.nodes.iter().map(GraphNode::len).max().unwrap_or(0)
    }

    /// Sort every node's edges ascending by distance.
    pub fn sort_all_neighbors(&mut self) {
        for node in &mut self.nodes {
            node.sort_neighbors();
        }
    }

    /// Copy of every node's edge list, indexed by node id.
    pub fn adjacency(&self) -> Vec<Vec<Neighbor>> {
        self.nodes.iter().map(|n| n.neighbors().to_vec()).collect()
    }
}
