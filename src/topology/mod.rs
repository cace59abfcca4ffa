//! Block topology data model.
//!
//! This module provides the types every stage of a mesh build shares:
//! - [`PointId`] handles into the deduplicated [`PointStore`]
//! - structured hexahedral [`Block`]s with their face/edge numbering
//! - [`Spline`]s curving block edges
//! - boundary [`Patch`]es, including cyclic pairs

pub mod block;
pub mod patch;
pub mod point;
pub mod point_store;
pub mod spline;

pub use block::{Block, BlockId, Edge, Face, FaceSignature, Level};
pub use patch::{Patch, PatchFace, PatchFaceKey, PatchId, PatchType};
pub use point::PointId;
pub use point_store::PointStore;
pub use spline::{Spline, SplineKey};
