//! Query engine over a frozen [`GraphIndex`](crate::graph::GraphIndex).

pub mod engine;
pub mod heap;
pub mod pool;
pub mod recall;
pub mod scan;
pub mod types;

pub use engine::{greedy_search, SeedPolicy, Termination};
pub use heap::BoundedMaxHeap;
pub use pool::{BeamPool, CandidatePool, Next, RankedList};
pub use recall::{mean_recall, recall};
pub use scan::{ground_truth, linear_scan};
pub use types::{SearchOutcome, SearchStats};
