#![cfg_attr(docsrs, feature(doc_cfg))]
//! # terrain-block-mesh
//!
//! terrain-block-mesh builds structured, block-hexahedral mesh topologies over
//! rectangular terrain domains. It splits the domain into an addressable grid of
//! blocks, grades block sizes along both horizontal axes, curves block edges
//! with splines that follow the terrain, and can wrap the rectangular core in a
//! concentric cylindrical ring of blocks that connects seamlessly to it.
//!
//! ## Features
//! - Deduplicated point store with index handles shared by all blocks
//! - Face-signature adjacency discovery and boundary closure checks
//! - Region-based block grading with smooth interpolating regions
//! - Multi-block splines from paths, Hermite tangents, parallel interpolation
//!   and averaging of neighboring lines
//! - Cylinder sections with typed point/block addressing
//! - Serde configuration input and serializable output for mesh writers
//!
//! ## Usage
//!
//! ```no_run
//! use terrain_block_mesh::prelude::*;
//!
//! let config = MeshConfig::new([1000.0, 800.0, 300.0], [10, 8], [4, 4, 20]);
//! let hill = |x: f64, y: f64| 20.0 * (-((x - 500.0).powi(2) + (y - 400.0).powi(2)) / 1e5).exp();
//! let mesh = build_terrain_mesh(&config, &hill)?;
//! println!("{} blocks", mesh.blocks().len());
//! # Ok::<(), MeshError>(())
//! ```
//!
//! Invariant checks run in debug builds, or in release builds with the
//! `strict-invariants` or `check-invariants` feature.

pub mod algs;
pub mod block_manager;
pub mod debug_invariants;
pub mod geometry;
pub mod mesh_error;
pub mod mesh_generation;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::grading::{AxisGrading, GradingEngine, GradingRegionSpec, RegionKind};
    pub use crate::block_manager::{BlockManager, BlockRun, BoxGrid, InterpolationMode};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::{FlatTerrain, Point3, TerrainSurface};
    pub use crate::mesh_error::MeshError;
    pub use crate::mesh_generation::{
        CylinderConfig, CylinderTopology, MeshConfig, Periodicity, TerrainMesh, build_terrain_mesh,
    };
    pub use crate::topology::{
        Block, BlockId, Edge, Face, Level, Patch, PatchType, PointId, PointStore, Spline, SplineKey,
    };
}
