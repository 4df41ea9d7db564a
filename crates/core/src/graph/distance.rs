//! Distance metrics used by graph construction and search.
//!
//! Every metric returns a value where **lower is closer** and is symmetric in
//! its two arguments; bidirectionalization relies on that symmetry when it
//! copies an edge's distance onto the reverse edge.

use serde::{Deserialize, Serialize};

/// Distance function over `f32` vectors of equal dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceMetric {
    /// Euclidean (L2) distance. Range: \[0, ∞).
    #[default]
    Euclidean,
    /// Squared Euclidean distance (L2²). Same ordering as `Euclidean`, no sqrt.
    SquaredEuclidean,
    /// Cosine distance: `1 - cosine_similarity`. Range: \[0, 2\].
    Cosine,
    /// Negative dot product: `-dot(a, b)`. Lower = higher similarity.
    DotProduct,
}

impl DistanceMetric {
    /// Distance between two vectors of equal length.
    #[inline]
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            DistanceMetric::Euclidean => euclidean_sq(a, b).sqrt(),
            DistanceMetric::SquaredEuclidean => euclidean_sq(a, b),
            DistanceMetric::Cosine => {
                let dot = dot_product(a, b);
                let norm = (dot_product(a, a) * dot_product(b, b)).sqrt();
                if norm == 0.0 {
                    1.0
                } else {
                    1.0 - dot / norm
                }
            }
            DistanceMetric::DotProduct => -dot_product(a, b),
        }
    }

    /// Parses a metric name as accepted on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Some(DistanceMetric::Euclidean),
            "sqeuclidean" | "l2sq" => Some(DistanceMetric::SquaredEuclidean),
            "cosine" | "angular" => Some(DistanceMetric::Cosine),
            "dot" | "ip" => Some(DistanceMetric::DotProduct),
            _ => None,
        }
    }
}

// Chunked by 4 so the compiler can vectorize the accumulation.
#[inline]
fn euclidean_sq(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = [0.0f32; 4];
    let chunks_a = a.chunks_exact(4);
    let chunks_b = b.chunks_exact(4);
    let tail: f32 = chunks_a
        .remainder()
        .iter()
        .zip(chunks_b.remainder())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();
    for (ca, cb) in chunks_a.zip(chunks_b) {
        for i in 0..4 {
            let d = ca[i] - cb[i];
            acc[i] += d * d;
        }
    }
    acc.iter().sum::<f32>() + tail
}

#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    let mut acc = [0.0f32; 4];
    let chunks_a = a.chunks_exact(4);
    let chunks_b = b.chunks_exact(4);
    let tail: f32 = chunks_a
        .remainder()
        .iter()
        .zip(chunks_b.remainder())
        .map(|(x, y)| x * y)
        .sum();
    for (ca, cb) in chunks_a.zip(chunks_b) {
        for i in 0..4 {
            acc[i] += ca[i] * cb[i];
        }
    }
    acc.iter().sum::<f32>() + tail
}
