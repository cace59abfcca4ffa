//! Concentric ring of blocks around the rectangular core.
//!
//! The circle around the core centre is cut into angular sections, each
//! split into subsections. Every subsection start is a *slot*; slots are
//! numbered counter-clockwise from the start spoke of section 0, and each
//! core boundary point (in walk order) is connected to exactly one slot.
//! Radial layer 0 is the core boundary itself, layers from `n_lin` on are
//! exact circles, and the layers in between blend from the box outline to
//! the circle along the spokes.
//!
//! Points are addressed by [`CylinderPointKey`], blocks by
//! [`CylinderBlockKey`]. The end spoke of section `s` is the start spoke of
//! section `s + 1`, so `(s, sub[s], n, level)` and `(s + 1, 0, n, level)`
//! name the same point.

use std::f64::consts::{FRAC_PI_2, TAU};

use hashbrown::HashMap as FastMap;
use itertools::Itertools;
use serde::Serialize;

use crate::algs::grading::{cell_size_ratios, grading_fraction};
use crate::algs::sweep::fill_cyclic;
use crate::block_manager::BlockManager;
use crate::geometry::vector::{self, angle_distance, horizontal_angle};
use crate::geometry::{Point3, TerrainSurface};
use crate::mesh_error::MeshError;
use crate::mesh_generation::config::CylinderConfig;
use crate::topology::block::{BlockId, Face, Level};
use crate::topology::patch::{PatchFaceKey, PatchId};
use crate::topology::point::PointId;
use crate::topology::spline::Spline;

/// Address of a cylinder point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CylinderPointKey {
    pub section: usize,
    pub subsection: usize,
    pub radial: usize,
    pub level: Level,
}

impl CylinderPointKey {
    pub fn new(section: usize, subsection: usize, radial: usize, level: Level) -> Self {
        Self {
            section,
            subsection,
            radial,
            level,
        }
    }
}

/// Core side a cylinder block column is attached to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BoxSide {
    South,
    East,
    North,
    West,
}

impl BoxSide {
    fn of(face: Face) -> Result<BoxSide, MeshError> {
        match face {
            Face::South => Ok(BoxSide::South),
            Face::East => Ok(BoxSide::East),
            Face::North => Ok(BoxSide::North),
            Face::West => Ok(BoxSide::West),
            other => Err(MeshError::topology(format!("{other:?} is not a core side"))),
        }
    }
}

/// Address of a cylinder block: the core block `(i, j)` on `side` it grows
/// out of, and its radial layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CylinderBlockKey {
    pub side: BoxSide,
    pub i: usize,
    pub j: usize,
    pub radial: usize,
}

/// Spoke distances per section, given per radial layer.
///
/// Sections with `Some` are pinned; the others are filled layer by layer by
/// cyclic sweep blending between the pinned ones.
pub fn propagate_section_distances(
    pinned: &[Option<Vec<f64>>],
    layers: usize,
) -> Result<Vec<Vec<f64>>, MeshError> {
    if pinned.iter().flatten().any(|d| d.len() != layers) {
        return Err(MeshError::topology(format!(
            "pinned section distances must cover {layers} layers"
        )));
    }
    let mut out = vec![vec![0.0; layers]; pinned.len()];
    for n in 0..layers {
        let column: Vec<Option<f64>> = pinned.iter().map(|p| p.as_ref().map(|d| d[n])).collect();
        for (s, v) in fill_cyclic(&column)?.into_iter().enumerate() {
            out[s][n] = v;
        }
    }
    Ok(out)
}

/// Addressing and geometry of the cylinder ring.
#[derive(Clone, Debug)]
pub struct CylinderTopology {
    config: CylinderConfig,
    centre: Point3,
    top: f64,
    start_angle: f64,
    rho_max: f64,
    radii: Vec<f64>,
    slot_offsets: Vec<usize>,
    slot_of_walk: Vec<usize>,
    walk_of_slot: Vec<usize>,
    explicit: Vec<bool>,
    distances: Vec<Vec<f64>>,
    points: FastMap<CylinderPointKey, PointId>,
    blocks: FastMap<CylinderBlockKey, BlockId>,
    block_order: Vec<(CylinderBlockKey, usize)>,
}

impl CylinderTopology {
    /// Prepares the ring around the core already held by `bm`.
    ///
    /// Fails if the radius does not clear every core corner.
    pub fn new(config: &CylinderConfig, centre: Point3, top: f64, bm: &BlockManager) -> Result<Self, MeshError> {
        config.validate()?;
        let grid = bm.box_grid()?;
        let (nx, ny) = (grid.nx(), grid.ny());
        let mut rho_max: f64 = 0.0;
        for (i, j) in [(0, 0), (nx, 0), (nx, ny), (0, ny)] {
            let p = bm.point(grid.point(i, j, Level::Low))?;
            rho_max = rho_max.max((p[0] - centre[0]).hypot(p[1] - centre[1]));
        }
        if config.radius <= rho_max {
            return Err(MeshError::config(format!(
                "cylinder radius {} does not exceed the core extent {rho_max}",
                config.radius
            )));
        }

        let nr = config.radial_blocks;
        let radii = (0..=nr)
            .map(|n| {
                let f = grading_fraction(n, nr, nr, config.radial_grading, true);
                rho_max + (config.radius - rho_max) * f
            })
            .collect();

        let mut slot_offsets = Vec::with_capacity(config.section_nr() + 1);
        let mut acc = 0;
        for &sub in &config.sub_sections {
            slot_offsets.push(acc);
            acc += sub;
        }
        slot_offsets.push(acc);

        let sections = config.section_nr();
        Ok(Self {
            config: config.clone(),
            centre,
            top,
            start_angle: horizontal_angle(config.first_section_start_direction),
            rho_max,
            radii,
            slot_offsets,
            slot_of_walk: Vec::new(),
            walk_of_slot: Vec::new(),
            explicit: vec![false; sections],
            distances: vec![Vec::new(); sections],
            points: FastMap::new(),
            blocks: FastMap::new(),
            block_order: Vec::new(),
        })
    }

    pub fn config(&self) -> &CylinderConfig {
        &self.config
    }

    pub fn section_nr(&self) -> usize {
        self.config.section_nr()
    }

    /// Total number of subsections around the circle.
    pub fn slot_count(&self) -> usize {
        self.slot_offsets[self.section_nr()]
    }

    /// Largest horizontal distance of a core corner from the centre.
    pub fn core_extent(&self) -> f64 {
        self.rho_max
    }

    /// Nominal radius of every radial layer; layer 0 is the core extent.
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// First radial layer that is an exact circle.
    pub fn linear_layer(&self) -> usize {
        self.config.linear_layer()
    }

    /// Slot of subsection `u` of section `s`; `u == sub[s]` wraps onto the
    /// next section's start spoke.
    pub fn slot(&self, section: usize, subsection: usize) -> usize {
        (self.slot_offsets[section % self.section_nr()] + subsection) % self.slot_count()
    }

    /// Section and subsection of slot `t`.
    pub fn section_of_slot(&self, t: usize) -> (usize, usize) {
        let t = t % self.slot_count();
        let s = self.slot_offsets.partition_point(|&o| o <= t) - 1;
        (s, t - self.slot_offsets[s])
    }

    /// Angle of slot `t` around the centre.
    pub fn slot_angle(&self, t: usize) -> f64 {
        let (s, u) = self.section_of_slot(t);
        let frac = (s as f64 + u as f64 / self.config.sub_sections[s] as f64) / self.section_nr() as f64;
        (self.start_angle + frac * TAU).rem_euclid(TAU)
    }

    fn spoke(&self, t: usize) -> Point3 {
        let a = self.slot_angle(t);
        [a.cos(), a.sin(), 0.0]
    }

    /// Slot connected to core walk point `n`.
    pub fn connection(&self, n: usize) -> Option<usize> {
        self.slot_of_walk.get(n).copied()
    }

    /// True if section `s` starts on a core corner.
    pub fn is_explicit(&self, section: usize) -> Result<bool, MeshError> {
        self.explicit
            .get(section)
            .copied()
            .ok_or_else(|| MeshError::topology(format!("no cylinder section {section}")))
    }

    /// Spoke distance of section `s` at every radial layer.
    pub fn section_distances(&self, section: usize) -> Result<&[f64], MeshError> {
        match self.distances.get(section) {
            Some(d) if !d.is_empty() => Ok(d),
            Some(_) => Err(MeshError::topology("cylinder section distances have not been computed")),
            None => Err(MeshError::topology(format!("no cylinder section {section}"))),
        }
    }

    /// Connects every core boundary point to one slot.
    ///
    /// Both the walk and the slots run counter-clockwise, so the connection
    /// is a cyclic shift. The start spoke of section 0 is anchored at the core
    /// corner closest in angle to it, and the other slots follow in walk order.
    /// Fails if the counts differ or a spoke turns back towards the core.
    pub fn find_section_connections(&mut self, bm: &BlockManager) -> Result<(), MeshError> {
        let grid = bm.box_grid()?;
        let walk_len = grid.walk_len();
        let slots = self.slot_count();
        if slots != walk_len {
            return Err(MeshError::topology(format!(
                "{slots} subsections around the cylinder, core boundary has {walk_len} points"
            )));
        }

        let walk_angles = (0..walk_len)
            .map(|n| {
                let (_, _, id) = bm.walk_box(n, Level::Low)?;
                Ok(horizontal_angle(vector::sub(bm.point(id)?, self.centre)))
            })
            .collect::<Result<Vec<f64>, MeshError>>()?;
        let start = self.slot_angle(0);
        let anchor = (0..walk_len)
            .filter(|&n| grid.is_corner(n))
            .min_by(|&a, &b| {
                angle_distance(walk_angles[a], start).total_cmp(&angle_distance(walk_angles[b], start))
            })
            .ok_or_else(|| MeshError::topology("core boundary has no corners"))?;

        for t in 0..slots {
            let n = (t + anchor) % walk_len;
            let offset = angle_distance(walk_angles[n], self.slot_angle(t));
            if offset >= FRAC_PI_2 {
                return Err(MeshError::topology(format!(
                    "slot {t} points {:.1} degrees away from core boundary point {n}",
                    offset.to_degrees()
                )));
            }
        }

        self.walk_of_slot = (0..slots).map(|t| (t + anchor) % walk_len).collect();
        self.slot_of_walk = (0..walk_len).map(|n| (n + slots - anchor) % slots).collect();
        self.explicit = (0..self.section_nr())
            .map(|s| grid.is_corner(self.walk_of_slot[self.slot(s, 0)]))
            .collect();
        log::debug!(
            "cylinder: {slots} slots anchored at core point {anchor}, explicit sections {:?}",
            self.explicit.iter().positions(|&e| e).collect::<Vec<_>>()
        );
        Ok(())
    }

    fn inner_point(&self, t: usize, bm: &BlockManager) -> Result<Point3, MeshError> {
        let n = *self.walk_of_slot.get(t % self.slot_count()).ok_or_else(|| {
            MeshError::topology("cylinder connections have not been computed")
        })?;
        let (_, _, id) = bm.walk_box(n, Level::Low)?;
        bm.point(id)
    }

    /// Distance along the start spoke of `section` from its core point to
    /// the circle of radial layer `n`.
    pub fn calc_section_distance(&self, section: usize, n: usize, bm: &BlockManager) -> Result<f64, MeshError> {
        let t = self.slot(section, 0);
        let inner = self.inner_point(t, bm)?;
        let dir = self.spoke(t);
        let r = *self.radii.get(n).ok_or_else(|| {
            MeshError::config(format!("radial layer {n} beyond {}", self.radii.len() - 1))
        })?;
        let rel = [inner[0] - self.centre[0], inner[1] - self.centre[1], 0.0];
        let b = vector::dot(rel, dir);
        let c = vector::dot(rel, rel) - r * r;
        let disc = b * b - c;
        if disc < 0.0 {
            return Err(MeshError::geometry(format!(
                "spoke of section {section} misses the circle of layer {n}"
            )));
        }
        Ok(-b + disc.sqrt())
    }

    /// Computes the spoke distance of every section at every layer.
    ///
    /// Sections starting on a core corner are exact; the others follow by
    /// cyclic sweep blending between them.
    pub fn iterate_section_connections(&mut self, bm: &BlockManager) -> Result<(), MeshError> {
        let layers = self.radii.len();
        let pinned = (0..self.section_nr())
            .map(|s| {
                if self.explicit[s] {
                    (0..layers)
                        .map(|n| self.calc_section_distance(s, n, bm))
                        .collect::<Result<Vec<_>, _>>()
                        .map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect::<Result<Vec<_>, MeshError>>()?;
        self.distances = propagate_section_distances(&pinned, layers)?;
        Ok(())
    }

    /// Spoke distance of slot `t` at layer `n`, linear between the section's
    /// two bounding spokes.
    pub fn slot_distance(&self, t: usize, n: usize) -> Result<f64, MeshError> {
        let (s, u) = self.section_of_slot(t);
        let next = (s + 1) % self.section_nr();
        let layer = |section: usize| {
            self.section_distances(section)?
                .get(n)
                .copied()
                .ok_or_else(|| MeshError::topology(format!("no radial layer {n} in section {section}")))
        };
        let w = u as f64 / self.config.sub_sections[s] as f64;
        Ok((1.0 - w) * layer(s)? + w * layer(next)?)
    }

    fn key_of_slot(&self, t: usize, n: usize, level: Level) -> CylinderPointKey {
        let (s, u) = self.section_of_slot(t);
        CylinderPointKey::new(s, u, n, level)
    }

    /// Point id at `key`.
    pub fn point(&self, key: CylinderPointKey) -> Option<PointId> {
        let t = self.slot(key.section, key.subsection);
        self.points.get(&self.key_of_slot(t, key.radial, key.level)).copied()
    }

    fn slot_point(&self, t: usize, n: usize, level: Level) -> Result<PointId, MeshError> {
        let key = self.key_of_slot(t, n, level);
        self.points
            .get(&key)
            .copied()
            .ok_or_else(|| MeshError::topology(format!("cylinder point {key:?} missing")))
    }

    pub fn block(&self, key: CylinderBlockKey) -> Option<BlockId> {
        self.blocks.get(&key).copied()
    }

    /// Cylinder blocks in creation order with the slot they start at.
    pub fn blocks(&self) -> impl Iterator<Item = (CylinderBlockKey, BlockId)> + '_ {
        self.block_order.iter().map(|(k, _)| (*k, self.blocks[k]))
    }

    pub fn block_count(&self) -> usize {
        self.block_order.len()
    }

    fn horizontal_position(&self, t: usize, n: usize, bm: &BlockManager) -> Result<Point3, MeshError> {
        let dir = self.spoke(t);
        if n >= self.linear_layer() {
            let r = self.radii[n];
            return Ok([self.centre[0] + r * dir[0], self.centre[1] + r * dir[1], 0.0]);
        }
        let inner = self.inner_point(t, bm)?;
        let d = self.slot_distance(t, n)?;
        Ok([inner[0] + d * dir[0], inner[1] + d * dir[1], 0.0])
    }

    /// Places every cylinder point. Layer 0 reuses the core boundary points.
    pub fn calc_cylinder_points(&mut self, bm: &mut BlockManager, terrain: &dyn TerrainSurface) -> Result<(), MeshError> {
        for t in 0..self.slot_count() {
            let walk = *self.walk_of_slot.get(t).ok_or_else(|| {
                MeshError::topology("cylinder connections have not been computed")
            })?;
            for level in Level::BOTH {
                let (_, _, id) = bm.walk_box(walk, level)?;
                self.points.insert(self.key_of_slot(t, 0, level), id);
            }
            for n in 1..self.radii.len() {
                let [x, y, _] = self.horizontal_position(t, n, bm)?;
                let ground = terrain.height(x, y);
                if ground >= self.top {
                    return Err(MeshError::geometry(format!(
                        "terrain height {ground} at ({x}, {y}) reaches the top {}",
                        self.top
                    )));
                }
                for level in Level::BOTH {
                    let z = match level {
                        Level::Low => ground,
                        Level::High => self.top,
                    };
                    let id = bm.add_point([x, y, z]);
                    self.points.insert(self.key_of_slot(t, n, level), id);
                }
            }
        }
        Ok(())
    }

    /// Builds one block per slot and radial layer.
    ///
    /// Local x runs clockwise from slot `t + 1` to slot `t`, local y outward
    /// and z up. Cell counts and grading along x follow the core block the
    /// column grows out of.
    pub fn calc_cylinder_blocks(
        &mut self,
        bm: &mut BlockManager,
        z_cells: usize,
        z_grading: f64,
    ) -> Result<(), MeshError> {
        let grid = bm.box_grid()?.clone();
        let nr = self.config.radial_blocks;
        let widths: Vec<f64> = self.radii.windows(2).map(|w| w[1] - w[0]).collect();
        let radial_ratios = if (self.config.radial_grading - 1.0).abs() > f64::EPSILON {
            cell_size_ratios(&widths, self.config.radial_cells)
        } else {
            vec![1.0; nr]
        };

        for t in 0..self.slot_count() {
            let walk = *self.walk_of_slot.get(t).ok_or_else(|| {
                MeshError::topology("cylinder connections have not been computed")
            })?;
            let seg = grid.walk_segment(walk);
            let core = bm.block(seg.block)?;
            let along = core.cells()[seg.axis];
            let core_ratio = core.grading()[seg.axis];
            let x_ratio = if seg.forward { 1.0 / core_ratio } else { core_ratio };
            let side = BoxSide::of(seg.face)?;

            for n in 0..nr {
                let mut corners = [PointId::new(0); 8];
                for level in Level::BOTH {
                    let o = 4 * level.index();
                    corners[o] = self.slot_point(t + 1, n, level)?;
                    corners[o + 1] = self.slot_point(t, n, level)?;
                    corners[o + 2] = self.slot_point(t, n + 1, level)?;
                    corners[o + 3] = self.slot_point(t + 1, n + 1, level)?;
                }
                let id = bm.add_block(corners, [along, self.config.radial_cells, z_cells])?;
                bm.set_block_grading(id, 0, x_ratio)?;
                bm.set_block_grading(id, 1, radial_ratios[n])?;
                bm.set_block_grading(id, 2, z_grading)?;
                let key = CylinderBlockKey {
                    side,
                    i: seg.cell.0,
                    j: seg.cell.1,
                    radial: n,
                };
                if self.blocks.insert(key, id).is_some() {
                    return Err(MeshError::topology(format!("cylinder block {key:?} built twice")));
                }
                self.block_order.push((key, t));
            }
        }
        log::debug!("cylinder: {} blocks in {nr} radial layers", self.block_order.len());
        Ok(())
    }

    /// Assigns the ground, top and outer faces of the ring.
    pub fn set_cylinder_patches(
        &self,
        bm: &mut BlockManager,
        ground: PatchId,
        top: PatchId,
        outer: PatchId,
    ) -> Result<(), MeshError> {
        let outermost = self.config.radial_blocks - 1;
        for &(key, t) in &self.block_order {
            let id = self.blocks[&key];
            bm.add_patch_face(ground, id, Face::Low, None)?;
            bm.add_patch_face(top, id, Face::High, None)?;
            if key.radial == outermost {
                bm.add_patch_face(outer, id, Face::North, Some(PatchFaceKey(t as u32, 0)))?;
            }
        }
        Ok(())
    }

    /// Curves the ring edges: arcs on every circular layer, and terrain
    /// following ground edges below them.
    pub fn set_cylinder_splines(&self, bm: &mut BlockManager, terrain: &dyn TerrainSurface) -> Result<usize, MeshError> {
        let inner = self.config.arc_points;
        let slots = self.slot_count();
        let mut written = 0;

        for n in self.linear_layer()..self.radii.len() {
            let r = self.radii[n];
            for t in 0..slots {
                let a0 = self.slot_angle(t);
                let span = (self.slot_angle(t + 1) - a0).rem_euclid(TAU);
                for level in Level::BOTH {
                    let pts = (1..=inner).map(|j| {
                        let a = a0 + span * j as f64 / (inner + 1) as f64;
                        let (x, y) = (self.centre[0] + r * a.cos(), self.centre[1] + r * a.sin());
                        let z = match level {
                            Level::Low => terrain.height(x, y),
                            Level::High => self.top,
                        };
                        [x, y, z]
                    });
                    let (a, b) = (self.slot_point(t, n, level)?, self.slot_point(t + 1, n, level)?);
                    let spline = Spline::new(bm.points(), a, b, pts)?;
                    bm.set_spline(spline)?;
                    written += 1;
                }
            }
        }

        if !terrain.is_flat() {
            for t in 0..slots {
                for n in 0..self.radii.len() - 1 {
                    let mut edges = vec![(
                        self.slot_point(t, n, Level::Low)?,
                        self.slot_point(t, n + 1, Level::Low)?,
                    )];
                    if n + 1 < self.linear_layer() {
                        edges.push((
                            self.slot_point(t, n + 1, Level::Low)?,
                            self.slot_point(t + 1, n + 1, Level::Low)?,
                        ));
                    }
                    for (a, b) in edges {
                        let (pa, pb) = (bm.point(a)?, bm.point(b)?);
                        let pts = vector::linear_points(pa, pb, inner, false, false)
                            .into_iter()
                            .map(|p| [p[0], p[1], terrain.height(p[0], p[1])]);
                        let spline = Spline::new(bm.points(), a, b, pts)?;
                        bm.set_spline(spline)?;
                        written += 1;
                    }
                }
            }
        }
        log::debug!("cylinder: {written} splines");
        Ok(written)
    }
}
