//! Build parameters.
//!
//! All types deserialize from any serde format with defaults for the optional
//! parts; reading them from a file is left to the caller.

use serde::{Deserialize, Serialize};

use crate::algs::grading::GradingRegionSpec;
use crate::geometry::Point3;
use crate::mesh_error::MeshError;
use crate::topology::point_store::DEFAULT_RESOLUTION;

fn default_resolution() -> f64 {
    DEFAULT_RESOLUTION
}

fn default_one() -> f64 {
    1.0
}

fn default_spline_points() -> [usize; 2] {
    [8, 8]
}

fn default_arc_points() -> usize {
    8
}

fn default_linear_fraction() -> f64 {
    0.5
}

fn default_start_direction() -> Point3 {
    [-1.0, -1.0, 0.0]
}

/// Optional periodic identification of opposite core sides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Periodicity {
    #[serde(default)]
    pub x: bool,
    #[serde(default)]
    pub y: bool,
    /// Depth of the band next to each periodic side in which the terrain is
    /// blended towards a common profile; `0` leaves the terrain untouched.
    #[serde(default)]
    pub blend_depth: f64,
}

impl Periodicity {
    /// No periodic directions.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Concentric ring of blocks around the rectangular core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CylinderConfig {
    /// Outer radius, measured from the core centre.
    pub radius: f64,
    /// Subsections per angular section; its length is the section count.
    pub sub_sections: Vec<usize>,
    /// Horizontal direction from the centre to the start spoke of section 0.
    #[serde(default = "default_start_direction")]
    pub first_section_start_direction: Point3,
    pub radial_blocks: usize,
    /// Cells per radial block.
    pub radial_cells: usize,
    /// Size of the outermost radial block relative to the innermost.
    #[serde(default = "default_one")]
    pub radial_grading: f64,
    /// Share of radial layers blending from the core to the circle.
    #[serde(default = "default_linear_fraction")]
    pub linear_fraction: f64,
    /// Inner points of every arc spline.
    #[serde(default = "default_arc_points")]
    pub arc_points: usize,
}

impl CylinderConfig {
    pub fn section_nr(&self) -> usize {
        self.sub_sections.len()
    }

    /// Radial layer from which on every layer is an exact circle.
    pub fn linear_layer(&self) -> usize {
        let n = (self.linear_fraction * self.radial_blocks as f64).round() as usize;
        n.clamp(1, self.radial_blocks)
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(MeshError::config(format!(
                "cylinder radius must be positive, got {}",
                self.radius
            )));
        }
        if self.sub_sections.is_empty() || self.sub_sections.contains(&0) {
            return Err(MeshError::config(
                "cylinder needs at least one section, each with at least one subsection",
            ));
        }
        if self.radial_blocks == 0 || self.radial_cells == 0 {
            return Err(MeshError::config("cylinder radial block and cell counts must be positive"));
        }
        if !(self.radial_grading.is_finite() && self.radial_grading > 0.0) {
            return Err(MeshError::config(format!(
                "radial grading must be positive, got {}",
                self.radial_grading
            )));
        }
        if !(0.0..=1.0).contains(&self.linear_fraction) {
            return Err(MeshError::config(format!(
                "linear fraction must lie in [0, 1], got {}",
                self.linear_fraction
            )));
        }
        let [dx, dy, _] = self.first_section_start_direction;
        if dx.hypot(dy) <= f64::EPSILON {
            return Err(MeshError::config("first section start direction has no horizontal part"));
        }
        Ok(())
    }
}

/// Everything a terrain block mesh build needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    /// South-west corner of the domain; its z is the reference of `dimensions[2]`.
    #[serde(default)]
    pub origin: Point3,
    /// Domain extent along x and y, and height of the domain top above `origin[2]`.
    pub dimensions: [f64; 3],
    /// Core blocks along x and y.
    pub blocks: [usize; 2],
    /// Cells per block along x, y and z.
    pub cells: [usize; 3],
    /// Grading regions along x.
    #[serde(default)]
    pub grading_x: Vec<GradingRegionSpec>,
    /// Grading regions along y.
    #[serde(default)]
    pub grading_y: Vec<GradingRegionSpec>,
    /// Vertical cell grading of every block.
    #[serde(default = "default_one")]
    pub z_grading: f64,
    /// Inner spline points per block along x and y on the terrain.
    #[serde(default = "default_spline_points")]
    pub spline_points: [usize; 2],
    /// Merge distance of the point store.
    #[serde(default = "default_resolution")]
    pub resolution: f64,
    #[serde(default)]
    pub periodic: Periodicity,
    #[serde(default)]
    pub cylinder: Option<CylinderConfig>,
}

impl MeshConfig {
    /// Plain box without grading, splines or cylinder.
    pub fn new(dimensions: [f64; 3], blocks: [usize; 2], cells: [usize; 3]) -> Self {
        Self {
            origin: [0.0; 3],
            dimensions,
            blocks,
            cells,
            grading_x: Vec::new(),
            grading_y: Vec::new(),
            z_grading: 1.0,
            spline_points: default_spline_points(),
            resolution: DEFAULT_RESOLUTION,
            periodic: Periodicity::none(),
            cylinder: None,
        }
    }

    /// Height of the domain top.
    pub fn top(&self) -> f64 {
        self.origin[2] + self.dimensions[2]
    }

    /// Horizontal centre of the core.
    pub fn centre(&self) -> Point3 {
        [
            self.origin[0] + 0.5 * self.dimensions[0],
            self.origin[1] + 0.5 * self.dimensions[1],
            self.origin[2],
        ]
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        if self.dimensions.iter().any(|d| !(d.is_finite() && *d > 0.0)) {
            return Err(MeshError::config(format!(
                "domain dimensions must be positive, got {:?}",
                self.dimensions
            )));
        }
        if self.blocks.contains(&0) || self.cells.contains(&0) {
            return Err(MeshError::config("block and cell counts must be positive"));
        }
        if !(self.z_grading.is_finite() && self.z_grading > 0.0) {
            return Err(MeshError::config(format!(
                "z grading must be positive, got {}",
                self.z_grading
            )));
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(MeshError::config(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        let blend = self.periodic.blend_depth;
        if !(blend.is_finite() && blend >= 0.0) {
            return Err(MeshError::config(format!("periodic blend depth must be non-negative, got {blend}")));
        }
        for (periodic, axis) in [(self.periodic.x, 0), (self.periodic.y, 1)] {
            if periodic && blend > 0.5 * self.dimensions[axis] {
                return Err(MeshError::config(format!(
                    "periodic blend depth {blend} exceeds half the domain along axis {axis}"
                )));
            }
        }
        if let Some(cyl) = &self.cylinder {
            cyl.validate()?;
            if self.periodic.x || self.periodic.y {
                return Err(MeshError::config("a cylinder cannot be combined with periodic sides"));
            }
        }
        Ok(())
    }
}
