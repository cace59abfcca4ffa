//! Geometry primitives consumed by the block topology.
//!
//! Only what the mesher needs: `[f64; 3]` arithmetic and a ground-height
//! query. Everything else about the terrain is owned by the caller.

pub mod terrain;
pub mod vector;

pub use terrain::{BlendBand, CyclicBlend, FlatTerrain, TerrainSurface};
pub use vector::Point3;
