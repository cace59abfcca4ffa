//! Owner of every point, block, spline and patch of a mesh build.
//!
//! The [`BlockManager`] is the single mutable store a build works on. Blocks
//! reference points by [`PointId`] and splines by [`SplineKey`]; splines are
//! registered once and attached to every block edge that shares their two
//! vertices. Adjacency is discovered in one pass by
//! [`find_all_neighbors`](BlockManager::find_all_neighbors) once all blocks
//! exist.
//!
//! Multi-block spline placement lives in [`splines`], run walking in [`runs`],
//! and addressing of the rectangular core in [`box_grid`].

pub mod box_grid;
pub mod runs;
pub mod splines;

use std::collections::BTreeMap;

use hashbrown::HashMap as FastMap;

use crate::algs::adjacency::match_faces;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::Point3;
use crate::geometry::vector;
use crate::mesh_error::MeshError;
use crate::topology::block::{Block, BlockId, Edge, Face, Level};
use crate::topology::patch::{Patch, PatchFace, PatchFaceKey, PatchId, PatchType, cyclic_face_pairs};
use crate::topology::point::PointId;
use crate::topology::point_store::PointStore;
use crate::topology::spline::{Spline, SplineKey};

pub use box_grid::{BoxGrid, WalkSegment};
pub use runs::BlockRun;
pub use splines::InterpolationMode;

/// Owns points, blocks, splines and patches of one mesh.
#[derive(Clone, Debug, Default)]
pub struct BlockManager {
    points: PointStore,
    blocks: Vec<Block>,
    edges: FastMap<SplineKey, Vec<(BlockId, Edge)>>,
    splines: BTreeMap<SplineKey, Spline>,
    patches: Vec<Patch>,
    patch_names: FastMap<String, PatchId>,
    grid: Option<BoxGrid>,
    topology_ready: bool,
}

impl BlockManager {
    /// Empty manager merging points closer than `resolution`.
    pub fn new(resolution: f64) -> Result<Self, MeshError> {
        Ok(Self {
            points: PointStore::new(resolution)?,
            ..Self::default()
        })
    }

    pub fn points(&self) -> &PointStore {
        &self.points
    }

    /// Inserts a point, returning the id of an existing one within resolution.
    pub fn add_point(&mut self, p: Point3) -> PointId {
        self.points.insert(p)
    }

    pub fn point(&self, id: PointId) -> Result<Point3, MeshError> {
        self.points.try_get(id)
    }

    /// Adds a hexahedron over eight existing points.
    pub fn add_block(&mut self, corners: [PointId; 8], cells: [usize; 3]) -> Result<BlockId, MeshError> {
        for &c in &corners {
            self.points.try_get(c)?;
        }
        if cells.contains(&0) {
            return Err(MeshError::config(format!(
                "block cell counts must be positive, got {cells:?}"
            )));
        }
        let id = BlockId::new(self.blocks.len() as u32);
        let mut block = Block::new(id, corners, cells);
        for edge in Edge::all() {
            let (a, b) = block.edge_vertices(edge);
            let key = SplineKey::new(a, b);
            if self.splines.contains_key(&key) {
                block.set_spline(edge, Some(key));
            }
            self.edges.entry(key).or_default().push((id, edge));
        }
        self.blocks.push(block);
        self.topology_ready = false;
        Ok(id)
    }

    pub fn block(&self, id: BlockId) -> Result<&Block, MeshError> {
        self.blocks.get(id.index()).ok_or(MeshError::MissingBlock(id))
    }

    fn block_mut(&mut self, id: BlockId) -> Result<&mut Block, MeshError> {
        self.blocks.get_mut(id.index()).ok_or(MeshError::MissingBlock(id))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Sets the ratio of last to first cell width of a block along `axis`.
    pub fn set_block_grading(&mut self, id: BlockId, axis: usize, ratio: f64) -> Result<(), MeshError> {
        if axis > 2 || !(ratio.is_finite() && ratio > 0.0) {
            return Err(MeshError::config(format!(
                "invalid grading {ratio} on axis {axis} of block {id}"
            )));
        }
        self.block_mut(id)?.set_grading(axis, ratio);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // patches
    // ---------------------------------------------------------------------

    /// Declares a new, empty patch.
    pub fn add_patch(&mut self, name: &str, kind: PatchType) -> Result<PatchId, MeshError> {
        if self.patch_names.contains_key(name) {
            return Err(MeshError::config(format!("patch `{name}` declared twice")));
        }
        let id = PatchId::new(self.patches.len() as u16);
        self.patches.push(Patch::new(name, kind));
        self.patch_names.insert(name.to_owned(), id);
        Ok(id)
    }

    pub fn patch_id(&self, name: &str) -> Result<PatchId, MeshError> {
        self.patch_names
            .get(name)
            .copied()
            .ok_or_else(|| MeshError::MissingPatch(name.to_owned()))
    }

    pub fn patch(&self, name: &str) -> Result<&Patch, MeshError> {
        Ok(&self.patches[self.patch_id(name)?.index()])
    }

    /// Patches in declaration order.
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// Assigns a block face to a patch. A face joins at most one patch.
    pub fn add_patch_face(
        &mut self,
        patch: PatchId,
        block: BlockId,
        face: Face,
        key: Option<PatchFaceKey>,
    ) -> Result<(), MeshError> {
        if patch.index() >= self.patches.len() {
            return Err(MeshError::MissingPatch(format!("#{}", patch.index())));
        }
        if let Some(existing) = self.block(block)?.patch(face) {
            return Err(MeshError::FaceAlreadyPatched {
                block,
                face,
                existing: self.patches[existing.index()].name().to_owned(),
            });
        }
        self.patches[patch.index()].push(PatchFace { block, face, key })?;
        self.block_mut(block)?.set_patch(face, patch);
        Ok(())
    }

    /// Turns two declared patches into a cyclic pair.
    pub fn set_cyclic_pair(&mut self, a: &str, b: &str) -> Result<(), MeshError> {
        let ia = self.patch_id(a)?;
        let ib = self.patch_id(b)?;
        if ia == ib {
            return Err(MeshError::config(format!("patch `{a}` cannot be its own cyclic partner")));
        }
        self.patches[ia.index()].set_cyclic(b);
        self.patches[ib.index()].set_cyclic(a);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // splines
    // ---------------------------------------------------------------------

    /// Registers a spline and attaches it to every block edge joining its
    /// two vertices, replacing any earlier spline on that edge.
    pub fn set_spline(&mut self, spline: Spline) -> Result<SplineKey, MeshError> {
        spline.validate(&self.points)?;
        let key = spline.key();
        let owners = self.edges.get(&key).cloned().ok_or_else(|| {
            MeshError::consistency(format!(
                "no block edge joins {} and {}",
                spline.vertex_a(),
                spline.vertex_b()
            ))
        })?;
        for (block, edge) in owners {
            self.block_mut(block)?.set_spline(edge, Some(key));
        }
        self.splines.insert(key, spline);
        Ok(key)
    }

    pub fn spline(&self, key: SplineKey) -> Option<&Spline> {
        self.splines.get(&key)
    }

    /// All splines in key order.
    pub fn splines(&self) -> impl Iterator<Item = &Spline> {
        self.splines.values()
    }

    pub fn spline_count(&self) -> usize {
        self.splines.len()
    }

    /// The spline between `a` and `b`, oriented to start at `a`.
    pub fn spline_between(&self, a: PointId, b: PointId) -> Option<Spline> {
        let s = self.splines.get(&SplineKey::new(a, b))?;
        Some(if s.vertex_a() == a { s.clone() } else { s.reversed() })
    }

    /// The curve of the edge from `a` to `b`: its spline if one is set,
    /// otherwise a straight line with `inner` points.
    pub fn edge_curve(&self, a: PointId, b: PointId, inner: usize) -> Result<Spline, MeshError> {
        match self.spline_between(a, b) {
            Some(s) => Ok(s),
            None => Spline::straight(&self.points, a, b, inner),
        }
    }

    // ---------------------------------------------------------------------
    // topology
    // ---------------------------------------------------------------------

    /// Links every pair of blocks sharing a face. Returns the number of links.
    pub fn find_all_neighbors(&mut self) -> Result<usize, MeshError> {
        for block in &mut self.blocks {
            block.clear_neighbors();
        }
        let matches = match_faces(&self.blocks)?;
        for link in &matches.links {
            self.blocks[link.a.0.index()].set_neighbor(link.a.1, Some(link.b.0));
            self.blocks[link.b.0.index()].set_neighbor(link.b.1, Some(link.a.0));
        }
        log::debug!(
            "{} blocks: {} interior faces, {} boundary faces",
            self.blocks.len(),
            matches.links.len(),
            matches.boundary.len()
        );
        self.topology_ready = true;
        Ok(matches.links.len())
    }

    /// True once neighbors have been computed for the current block set.
    pub fn topology_ready(&self) -> bool {
        self.topology_ready
    }

    pub(crate) fn require_topology(&self) -> Result<(), MeshError> {
        if self.topology_ready {
            Ok(())
        } else {
            Err(MeshError::consistency("block neighbors have not been computed"))
        }
    }

    /// Every boundary face must belong to a patch.
    pub fn check_closure(&self) -> Result<(), MeshError> {
        self.require_topology()?;
        for block in &self.blocks {
            for face in Face::ALL {
                if block.is_boundary(face) && block.patch(face).is_none() {
                    return Err(MeshError::consistency(format!(
                        "boundary face {face:?} of block {} has no patch",
                        block.id()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Full consistency check of the block structure.
    ///
    /// Verifies spline end points, neighbor symmetry, that patched faces are
    /// boundary faces, closure, and that cyclic partners pair up with one
    /// common translation (within `tolerance`).
    pub fn check(&self, tolerance: f64) -> Result<(), MeshError> {
        for spline in self.splines.values() {
            spline.validate(&self.points)?;
        }
        self.require_topology()?;

        for block in &self.blocks {
            for face in Face::ALL {
                if let Some(n) = block.neighbor(face) {
                    let other = self.block(n)?;
                    let back = other.face_towards(block.id()).ok_or_else(|| {
                        MeshError::consistency(format!(
                            "block {n} does not link back to block {}",
                            block.id()
                        ))
                    })?;
                    if other.face_signature(back) != block.face_signature(face) {
                        return Err(MeshError::consistency(format!(
                            "blocks {} and {n} are linked through different faces",
                            block.id()
                        )));
                    }
                    if block.patch(face).is_some() {
                        return Err(MeshError::consistency(format!(
                            "interior face {face:?} of block {} is patched",
                            block.id()
                        )));
                    }
                }
            }
        }
        self.check_closure()?;

        for patch in self.patches.iter().filter(|p| p.is_cyclic()) {
            let partner_name = patch.cyclic_partner().unwrap_or_default();
            let partner = self.patch(partner_name)?;
            let pairs = cyclic_face_pairs(patch, partner)?;
            let mut offset: Option<Point3> = None;
            for (fa, fb) in pairs {
                let d = vector::sub(self.face_centre(fb)?, self.face_centre(fa)?);
                match offset {
                    None => offset = Some(d),
                    Some(o) if vector::distance(o, d) > tolerance => {
                        return Err(MeshError::consistency(format!(
                            "cyclic patches `{}` and `{partner_name}` are not a pure translation",
                            patch.name()
                        )));
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    fn face_centre(&self, f: &PatchFace) -> Result<Point3, MeshError> {
        let corners = self.block(f.block)?.face_corners(f.face);
        let mut c = [0.0; 3];
        for id in corners {
            c = vector::add(c, self.points.try_get(id)?);
        }
        Ok(vector::scale(c, 0.25))
    }

    // ---------------------------------------------------------------------
    // rectangular core
    // ---------------------------------------------------------------------

    /// Attaches the addressing of the rectangular core.
    pub fn set_box_grid(&mut self, grid: BoxGrid) -> Result<(), MeshError> {
        for &b in grid.block_ids() {
            self.block(b)?;
        }
        for &[lo, hi] in grid.point_ids() {
            self.points.try_get(lo)?;
            self.points.try_get(hi)?;
        }
        self.grid = Some(grid);
        Ok(())
    }

    pub fn box_grid(&self) -> Result<&BoxGrid, MeshError> {
        self.grid
            .as_ref()
            .ok_or_else(|| MeshError::consistency("no rectangular core has been built"))
    }

    /// Number of steps around the core boundary, `2 (nx + ny)`.
    pub fn walk_box_len(&self) -> usize {
        self.grid.as_ref().map_or(0, BoxGrid::walk_len)
    }

    /// Core boundary point `n` of the counter-clockwise walk starting at the
    /// south-west corner and heading east, as `(i, j, point)`. `n` wraps.
    pub fn walk_box(&self, n: usize, level: Level) -> Result<(usize, usize, PointId), MeshError> {
        let grid = self.box_grid()?;
        let (i, j) = grid.walk_ij(n);
        Ok((i, j, grid.point(i, j, level)))
    }
}

impl DebugInvariants for BlockManager {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "BlockManager");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        self.points.validate_invariants()?;
        for (key, spline) in &self.splines {
            if spline.key() != *key {
                return Err(MeshError::consistency(format!(
                    "spline {}-{} stored under a foreign key",
                    spline.vertex_a(),
                    spline.vertex_b()
                )));
            }
        }
        for block in &self.blocks {
            for edge in Edge::all() {
                if let Some(key) = block.spline(edge) {
                    if !self.splines.contains_key(&key) {
                        return Err(MeshError::consistency(format!(
                            "edge {} of block {} references a missing spline",
                            edge.index(),
                            block.id()
                        )));
                    }
                }
            }
        }
        if self.topology_ready {
            self.check(self.points.resolution())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two unit cubes along x, all boundary faces in one wall patch.
    pub(crate) fn two_blocks() -> (BlockManager, BlockId, BlockId) {
        let mut bm = BlockManager::new(1e-3).unwrap();
        let mut ids = Vec::new();
        for k in 0..2 {
            for j in 0..2 {
                for i in 0..3 {
                    ids.push(bm.add_point([i as f64, j as f64, k as f64]));
                }
            }
        }
        let p = |i: usize, j: usize, k: usize| ids[i + 3 * j + 6 * k];
        let hex = |i: usize| {
            [
                p(i, 0, 0),
                p(i + 1, 0, 0),
                p(i + 1, 1, 0),
                p(i, 1, 0),
                p(i, 0, 1),
                p(i + 1, 0, 1),
                p(i + 1, 1, 1),
                p(i, 1, 1),
            ]
        };
        let a = bm.add_block(hex(0), [2, 2, 2]).unwrap();
        let b = bm.add_block(hex(1), [2, 2, 2]).unwrap();
        (bm, a, b)
    }

    #[test]
    fn neighbors_are_symmetric() {
        let (mut bm, a, b) = two_blocks();
        assert_eq!(bm.find_all_neighbors().unwrap(), 1);
        assert_eq!(bm.block(a).unwrap().neighbor(Face::East), Some(b));
        assert_eq!(bm.block(b).unwrap().neighbor(Face::West), Some(a));
        assert!(bm.block(a).unwrap().is_boundary(Face::West));
    }

    #[test]
    fn closure_needs_every_boundary_face() {
        let (mut bm, a, b) = two_blocks();
        bm.find_all_neighbors().unwrap();
        let wall = bm.add_patch("walls", PatchType::Wall).unwrap();
        for (id, skip) in [(a, Face::East), (b, Face::West)] {
            for face in Face::ALL.into_iter().filter(|&f| f != skip && f != Face::High) {
                bm.add_patch_face(wall, id, face, None).unwrap();
            }
        }
        assert!(matches!(bm.check_closure(), Err(MeshError::Consistency(_))));
        bm.add_patch_face(wall, a, Face::High, None).unwrap();
        bm.add_patch_face(wall, b, Face::High, None).unwrap();
        bm.check(1e-6).unwrap();
        bm.validate_invariants().unwrap();
    }

    #[test]
    fn face_joins_one_patch() {
        let (mut bm, a, _) = two_blocks();
        let p = bm.add_patch("p", PatchType::Patch).unwrap();
        let q = bm.add_patch("q", PatchType::Patch).unwrap();
        bm.add_patch_face(p, a, Face::West, None).unwrap();
        let err = bm.add_patch_face(q, a, Face::West, None).unwrap_err();
        assert!(matches!(err, MeshError::FaceAlreadyPatched { ref existing, .. } if existing == "p"));
        assert!(bm.add_patch("p", PatchType::Wall).is_err());
        assert!(matches!(bm.patch("nope"), Err(MeshError::MissingPatch(_))));
    }

    #[test]
    fn spline_attaches_to_shared_edges() {
        let (mut bm, a, b) = two_blocks();
        let (v0, v1) = bm.block(a).unwrap().edge_vertices(Edge::new(5).unwrap());
        let s = Spline::new(bm.points(), v0, v1, [[1.1, 0.5, 0.0]]).unwrap();
        let key = bm.set_spline(s).unwrap();
        assert_eq!(bm.block(a).unwrap().spline(Edge::new(5).unwrap()), Some(key));
        assert_eq!(bm.block(b).unwrap().spline(Edge::new(4).unwrap()), Some(key));
        let back = bm.spline_between(v1, v0).unwrap();
        assert_eq!(back.vertex_a(), v1);
        assert_eq!(back.first_point(), bm.point(v1).unwrap());
    }

    #[test]
    fn spline_needs_a_block_edge() {
        let (mut bm, a, _) = two_blocks();
        // diagonal of the bottom face is no block edge
        let (v0, v2) = (bm.block(a).unwrap().corner(0), bm.block(a).unwrap().corner(2));
        let s = Spline::straight(bm.points(), v0, v2, 2).unwrap();
        assert!(matches!(bm.set_spline(s), Err(MeshError::Consistency(_))));
    }
}
