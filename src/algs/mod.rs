//! Re-export public algorithms.

pub mod adjacency;
pub mod grading;
pub mod sweep;

pub use adjacency::{FaceLink, FaceMatches, match_faces};
pub use grading::{AxisGrading, GradingEngine, GradingRegion, GradingRegionSpec, RegionKind};
pub use sweep::{fill_cyclic, sweep_blend};
