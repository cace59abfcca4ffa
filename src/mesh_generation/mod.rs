//! Terrain block mesh generation with optional cylinder ring and periodic sides.
//!
//! [`build_terrain_mesh`] runs the fixed pipeline
//!
//! 1. grading of both horizontal axes,
//! 2. the rectangular core of `nx × ny` blocks between terrain and top,
//!    with ground splines following the terrain,
//! 3. the cylinder ring around the core, if configured,
//! 4. final adjacency and closure checks.

pub mod config;
pub mod cylinder;

use serde::Serialize;

use crate::algs::grading::{AxisGrading, GradingEngine};
use crate::block_manager::{BlockManager, BoxGrid};
use crate::debug_invariants::DebugInvariants;
use crate::geometry::{BlendBand, CyclicBlend, Point3, TerrainSurface};
use crate::mesh_error::MeshError;
use crate::topology::block::{Block, Face, Level};
use crate::topology::patch::{Patch, PatchFaceKey, PatchId, PatchType};
use crate::topology::point::PointId;
use crate::topology::spline::Spline;

pub use config::{CylinderConfig, MeshConfig, Periodicity};
pub use cylinder::{BoxSide, CylinderBlockKey, CylinderPointKey, CylinderTopology};

/// Patch holding the ground faces.
pub const PATCH_GROUND: &str = "ground";
/// Patch holding the domain top faces.
pub const PATCH_TOP: &str = "top";
/// Patch of the minimum-x core side.
pub const PATCH_WEST: &str = "west";
/// Patch of the maximum-x core side.
pub const PATCH_EAST: &str = "east";
/// Patch of the minimum-y core side.
pub const PATCH_SOUTH: &str = "south";
/// Patch of the maximum-y core side.
pub const PATCH_NORTH: &str = "north";
/// Patch of the outer cylinder wall.
pub const PATCH_OUTER: &str = "outer";

fn invalid_geometry(message: impl Into<String>) -> MeshError {
    MeshError::InvalidGeometry(message.into())
}

/// A finished block mesh.
#[derive(Clone, Debug)]
pub struct TerrainMesh {
    manager: BlockManager,
    grading: [AxisGrading; 2],
    cylinder: Option<CylinderTopology>,
}

/// Borrowed, serializable view of a [`TerrainMesh`].
#[derive(Debug, Serialize)]
pub struct MeshView<'a> {
    pub points: &'a [Point3],
    pub blocks: &'a [Block],
    pub splines: Vec<&'a Spline>,
    pub patches: &'a [Patch],
}

impl TerrainMesh {
    pub fn manager(&self) -> &BlockManager {
        &self.manager
    }

    pub fn points(&self) -> &[Point3] {
        self.manager.points().as_slice()
    }

    pub fn blocks(&self) -> &[Block] {
        self.manager.blocks()
    }

    pub fn splines(&self) -> impl Iterator<Item = &Spline> {
        self.manager.splines()
    }

    pub fn patches(&self) -> &[Patch] {
        self.manager.patches()
    }

    pub fn patch(&self, name: &str) -> Result<&Patch, MeshError> {
        self.manager.patch(name)
    }

    /// Grading of horizontal axis 0 (x) or 1 (y).
    pub fn grading(&self, axis: usize) -> Option<&AxisGrading> {
        self.grading.get(axis)
    }

    pub fn box_grid(&self) -> Result<&BoxGrid, MeshError> {
        self.manager.box_grid()
    }

    pub fn cylinder(&self) -> Option<&CylinderTopology> {
        self.cylinder.as_ref()
    }

    pub fn view(&self) -> MeshView<'_> {
        MeshView {
            points: self.points(),
            blocks: self.blocks(),
            splines: self.splines().collect(),
            patches: self.patches(),
        }
    }
}

impl Serialize for TerrainMesh {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view().serialize(serializer)
    }
}

/// Grades both horizontal axes.
pub fn grade_axes(config: &MeshConfig) -> Result<[AxisGrading; 2], MeshError> {
    let gx = GradingEngine::new(0, config.dimensions[0], config.blocks[0], config.cells[0])?
        .run(&config.grading_x)?;
    let gy = GradingEngine::new(1, config.dimensions[1], config.blocks[1], config.cells[1])?
        .run(&config.grading_y)?;
    Ok([gx, gy])
}

/// Places the core points and blocks and attaches the core grid.
fn build_core(
    bm: &mut BlockManager,
    config: &MeshConfig,
    grading: &[AxisGrading; 2],
    terrain: &dyn TerrainSurface,
) -> Result<(), MeshError> {
    let [nx, ny] = config.blocks;
    let top = config.top();
    let mut columns: Vec<[PointId; 2]> = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        let y = config.origin[1] + grading[1].boundaries[j];
        for i in 0..=nx {
            let x = config.origin[0] + grading[0].boundaries[i];
            let z = terrain.height(x, y);
            if !(z.is_finite() && z < top) {
                return Err(invalid_geometry(format!(
                    "terrain height {z} at ({x}, {y}) does not stay below the top {top}"
                )));
            }
            columns.push([bm.add_point([x, y, z]), bm.add_point([x, y, top])]);
        }
    }

    let column = |i: usize, j: usize| columns[i + j * (nx + 1)];
    let mut blocks = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let (c0, c1, c2, c3) = (column(i, j), column(i + 1, j), column(i + 1, j + 1), column(i, j + 1));
            let corners = [c0[0], c1[0], c2[0], c3[0], c0[1], c1[1], c2[1], c3[1]];
            let id = bm.add_block(corners, config.cells)?;
            bm.set_block_grading(id, 0, grading[0].cell_ratios[i])?;
            bm.set_block_grading(id, 1, grading[1].cell_ratios[j])?;
            bm.set_block_grading(id, 2, config.z_grading)?;
            blocks.push(id);
        }
    }
    bm.set_box_grid(BoxGrid::new(nx, ny, columns, blocks)?)
}

/// Declares the patches and assigns the core faces.
fn set_core_patches(bm: &mut BlockManager, config: &MeshConfig) -> Result<(), MeshError> {
    let ground = bm.add_patch(PATCH_GROUND, PatchType::Wall)?;
    let top = bm.add_patch(PATCH_TOP, PatchType::Patch)?;
    let grid = bm.box_grid()?.clone();
    let (nx, ny) = (grid.nx(), grid.ny());
    for j in 0..ny {
        for i in 0..nx {
            let key = Some(PatchFaceKey(i as u32, j as u32));
            bm.add_patch_face(ground, grid.block(i, j), Face::Low, key)?;
            bm.add_patch_face(top, grid.block(i, j), Face::High, key)?;
        }
    }
    if config.cylinder.is_some() {
        bm.add_patch(PATCH_OUTER, PatchType::Patch)?;
        return Ok(());
    }

    let sides: [(&str, Face, Vec<(usize, usize)>); 4] = [
        (PATCH_WEST, Face::West, (0..ny).map(|j| (0, j)).collect()),
        (PATCH_EAST, Face::East, (0..ny).map(|j| (nx - 1, j)).collect()),
        (PATCH_SOUTH, Face::South, (0..nx).map(|i| (i, 0)).collect()),
        (PATCH_NORTH, Face::North, (0..nx).map(|i| (i, ny - 1)).collect()),
    ];
    for (name, face, cells) in sides {
        let id: PatchId = bm.add_patch(name, PatchType::Patch)?;
        for (k, (i, j)) in cells.into_iter().enumerate() {
            bm.add_patch_face(id, grid.block(i, j), face, Some(PatchFaceKey(k as u32, 0)))?;
        }
    }
    if config.periodic.x {
        bm.set_cyclic_pair(PATCH_WEST, PATCH_EAST)?;
    }
    if config.periodic.y {
        bm.set_cyclic_pair(PATCH_SOUTH, PATCH_NORTH)?;
    }
    Ok(())
}

/// Wraps the core in the cylinder ring.
fn build_cylinder(
    bm: &mut BlockManager,
    config: &MeshConfig,
    cyl: &CylinderConfig,
    terrain: &dyn TerrainSurface,
) -> Result<CylinderTopology, MeshError> {
    let mut topo = CylinderTopology::new(cyl, config.centre(), config.top(), bm)?;
    topo.find_section_connections(bm)?;
    topo.iterate_section_connections(bm)?;
    topo.calc_cylinder_points(bm, terrain)?;
    topo.calc_cylinder_blocks(bm, config.cells[2], config.z_grading)?;
    let (ground, top, outer) = (
        bm.patch_id(PATCH_GROUND)?,
        bm.patch_id(PATCH_TOP)?,
        bm.patch_id(PATCH_OUTER)?,
    );
    topo.set_cylinder_patches(bm, ground, top, outer)?;
    topo.set_cylinder_splines(bm, terrain)?;
    Ok(topo)
}

/// Terrain blend bands of the periodic axes, if a blend depth is set.
fn periodic_bands(config: &MeshConfig) -> (Option<BlendBand>, Option<BlendBand>) {
    let depth = config.periodic.blend_depth;
    let band = |periodic: bool, axis: usize| {
        (periodic && depth > 0.0).then(|| BlendBand {
            lo: config.origin[axis],
            hi: config.origin[axis] + config.dimensions[axis],
            depth,
        })
    };
    (band(config.periodic.x, 0), band(config.periodic.y, 1))
}

/// Builds the complete block mesh for `config` over `terrain`.
pub fn build_terrain_mesh(config: &MeshConfig, terrain: &dyn TerrainSurface) -> Result<TerrainMesh, MeshError> {
    config.validate()?;

    let grading = grade_axes(config)?;
    log::info!(
        "graded axes: {} x {} blocks",
        grading[0].block_count(),
        grading[1].block_count()
    );

    let blended;
    let terrain: &dyn TerrainSurface = match periodic_bands(config) {
        (None, None) => terrain,
        (x, y) => {
            log::info!("blending terrain over {} towards the periodic sides", config.periodic.blend_depth);
            blended = CyclicBlend::new(terrain, x, y);
            &blended
        }
    };

    let mut bm = BlockManager::new(config.resolution)?;
    build_core(&mut bm, config, &grading, terrain)?;
    set_core_patches(&mut bm, config)?;
    bm.find_all_neighbors()?;
    let terrain_splines = bm.set_terrain_splines(terrain, config.spline_points)?;
    log::info!(
        "core: {} blocks, {} points, {terrain_splines} terrain splines",
        bm.block_count(),
        bm.points().len()
    );

    let cylinder = match &config.cylinder {
        Some(cyl) => {
            let topo = build_cylinder(&mut bm, config, cyl, terrain)?;
            log::info!(
                "cylinder: {} sections, {} blocks",
                topo.section_nr(),
                topo.block_count()
            );
            Some(topo)
        }
        None => None,
    };

    bm.find_all_neighbors()?;
    bm.check_closure()?;
    bm.check(config.resolution)?;
    bm.debug_assert_invariants();
    log::info!(
        "mesh complete: {} blocks, {} points, {} splines, {} patches",
        bm.block_count(),
        bm.points().len(),
        bm.spline_count(),
        bm.patches().len()
    );

    Ok(TerrainMesh {
        manager: bm,
        grading,
        cylinder,
    })
}

/// Ground and top point of every core column, row by row.
pub fn core_columns(mesh: &TerrainMesh) -> Result<Vec<[Point3; 2]>, MeshError> {
    let grid = mesh.box_grid()?;
    let mut out = Vec::with_capacity(grid.point_ids().len());
    for j in 0..=grid.ny() {
        for i in 0..=grid.nx() {
            let lo = mesh.manager().point(grid.point(i, j, Level::Low))?;
            let hi = mesh.manager().point(grid.point(i, j, Level::High))?;
            out.push([lo, hi]);
        }
    }
    Ok(out)
}
