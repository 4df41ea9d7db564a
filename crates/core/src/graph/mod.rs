//! Proximity graph: nodes, construction, edge-file I/O and refinement.

pub mod distance;
pub mod index;
pub mod io;
pub mod nndescent;
pub mod node;
pub mod refine;
pub mod visited;

pub use distance::DistanceMetric;
pub use index::{GraphConfig, GraphIndex};
pub use io::LoadReport;
pub use nndescent::{BuildStats, NnDescentBuilder};
pub use node::{DegreeLimit, EdgeOrder, GraphNode, InsertPolicy, Neighbor};
pub use refine::{select_diverse, RefineStats};
pub use visited::VisitedSet;
