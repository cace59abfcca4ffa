//! MeshError: unified error type for terrain-block-mesh public APIs
//!
//! Every stage of a mesh build (grading, core topology, cylinder wrap) reports
//! failures through this type. A build either completes or aborts with the
//! first error encountered; nothing is downgraded or retried.

use thiserror::Error;

use crate::topology::block::{BlockId, Face};
use crate::topology::point::PointId;

/// Unified error type for terrain-block-mesh operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// Malformed, missing, or out-of-range grading or cylinder parameters.
    #[error("Configuration error: {0}")]
    Config(String),
    /// A grading region declares zero blocks with non-zero width, or the reverse.
    #[error("Division by zero: region {region} has width {width} and {blocks} blocks")]
    DivideByZero {
        region: usize,
        width: f64,
        blocks: usize,
    },
    /// The block topology cannot be closed.
    #[error("Consistency error: {0}")]
    Consistency(String),
    /// A face signature was claimed by more than two block faces.
    #[error("Consistency error: face {face:?} of block {block} duplicates an already matched face")]
    OverMatchedFace { block: BlockId, face: Face },
    /// Cylinder section/subsection/connection counts are inconsistent.
    #[error("Topology error: {0}")]
    Topology(String),
    /// The rescaled block boundaries do not reproduce the axis length.
    #[error("Grading error on axis {axis}: final boundary {actual} deviates from axis length {expected}")]
    Grading {
        axis: usize,
        expected: f64,
        actual: f64,
    },
    /// Block boundaries along an axis are not strictly increasing.
    #[error("Grading error on axis {axis}: boundary {index} at {position} does not exceed its predecessor")]
    NonMonotonicGrading {
        axis: usize,
        index: usize,
        position: f64,
    },
    /// A geometric primitive was degenerate (zero-length direction, empty path).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    /// A point id does not exist in the point store.
    #[error("Unknown point {0}")]
    MissingPoint(PointId),
    /// A block id does not exist in the block collection.
    #[error("Unknown block {0}")]
    MissingBlock(BlockId),
    /// A patch name was referenced but never declared.
    #[error("Unknown patch `{0}`")]
    MissingPatch(String),
    /// A spline's end points differ from its vertices.
    #[error("Spline {a}-{b} does not end on its vertices")]
    DetachedSpline { a: PointId, b: PointId },
    /// A face was assigned to a second patch.
    #[error("Face {face:?} of block {block} already belongs to patch `{existing}`")]
    FaceAlreadyPatched {
        block: BlockId,
        face: Face,
        existing: String,
    },
}

impl MeshError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        MeshError::Config(message.into())
    }

    pub(crate) fn topology(message: impl Into<String>) -> Self {
        MeshError::Topology(message.into())
    }

    pub(crate) fn consistency(message: impl Into<String>) -> Self {
        MeshError::Consistency(message.into())
    }

    pub(crate) fn geometry(message: impl Into<String>) -> Self {
        MeshError::InvalidGeometry(message.into())
    }
}
