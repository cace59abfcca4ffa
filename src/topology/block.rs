//! Structured hexahedral blocks.
//!
//! Corner, face and edge numbering follow the blockMesh convention:
//!
//! ```text
//!        7 ---- 6          z
//!       /|     /|          |  y
//!      4 ---- 5 |          | /
//!      | 3 ---|-2          |/
//!      |/     |/           +---- x
//!      0 ---- 1
//! ```
//!
//! Faces are numbered x-min, x-max, y-min, y-max, z-min, z-max and named
//! after the compass (west/east/south/north) plus low/high. Edges 0-3 run
//! along x, 4-7 along y and 8-11 along z, each from its low to its high end.

use std::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::topology::patch::PatchId;
use crate::topology::point::PointId;
use crate::topology::spline::SplineKey;

/// Index of a block in the block collection.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BlockId(u32);

impl BlockId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        BlockId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlockId").field(&self.0).finish()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local `(i, j, k)` position of each corner in the unit cube.
pub const CORNER_IJK: [[u8; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

/// Corner number at local position `ijk`.
pub fn corner_at(ijk: [u8; 3]) -> usize {
    match ijk {
        [0, 0, 0] => 0,
        [1, 0, 0] => 1,
        [1, 1, 0] => 2,
        [0, 1, 0] => 3,
        [0, 0, 1] => 4,
        [1, 0, 1] => 5,
        [1, 1, 1] => 6,
        _ => 7,
    }
}

/// A block face.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Face {
    West,
    East,
    South,
    North,
    Low,
    High,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::West,
        Face::East,
        Face::South,
        Face::North,
        Face::Low,
        Face::High,
    ];

    /// blockMesh face number.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Axis normal to the face: 0 = x, 1 = y, 2 = z.
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    /// True for the face at the high end of its axis.
    pub fn is_high(self) -> bool {
        self.index() % 2 == 1
    }

    pub fn from_axis(axis: usize, high: bool) -> Face {
        Face::ALL[2 * axis + usize::from(high)]
    }

    pub fn opposite(self) -> Face {
        Face::from_axis(self.axis(), !self.is_high())
    }

    /// Corner numbers of the face, ordered with the normal pointing outwards.
    pub fn corners(self) -> [usize; 4] {
        match self {
            Face::West => [0, 4, 7, 3],
            Face::East => [1, 2, 6, 5],
            Face::South => [0, 1, 5, 4],
            Face::North => [3, 7, 6, 2],
            Face::Low => [0, 3, 2, 1],
            Face::High => [4, 5, 6, 7],
        }
    }
}

/// Vertical level of a point: on the ground or at the domain top.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub const BOTH: [Level; 2] = [Level::Low, Level::High];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A block edge, numbered 0..12.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Edge(u8);

impl Edge {
    pub const COUNT: usize = 12;

    const CORNERS: [(usize, usize); 12] = [
        (0, 1),
        (3, 2),
        (7, 6),
        (4, 5),
        (0, 3),
        (1, 2),
        (5, 6),
        (4, 7),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];

    /// Edge number `i`, if `i < 12`.
    pub fn new(i: usize) -> Option<Edge> {
        (i < Self::COUNT).then_some(Edge(i as u8))
    }

    /// Edge number `i` for a known-good constant index.
    pub const fn nth(i: u8) -> Edge {
        assert!(i < 12, "edge index out of range");
        Edge(i)
    }

    pub fn all() -> impl Iterator<Item = Edge> {
        (0..Self::COUNT as u8).map(Edge)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Axis the edge runs along.
    pub fn axis(self) -> usize {
        self.index() / 4
    }

    /// Start and end corner, from the low to the high end of the axis.
    pub fn corners(self) -> (usize, usize) {
        Self::CORNERS[self.index()]
    }

    /// Edge joining the two corners, in either order.
    pub fn between(a: usize, b: usize) -> Option<Edge> {
        Self::CORNERS
            .iter()
            .position(|&(p, q)| (p, q) == (a, b) || (p, q) == (b, a))
            .map(|i| Edge(i as u8))
    }

    /// The parallel edge obtained by reflecting this one across `axis`.
    ///
    /// Reflecting across the edge's own axis returns the edge unchanged.
    pub fn mirrored(self, axis: usize) -> Edge {
        if axis == self.axis() {
            return self;
        }
        let (a, b) = self.corners();
        let flip = |c: usize| {
            let mut ijk = CORNER_IJK[c];
            ijk[axis] = 1 - ijk[axis];
            corner_at(ijk)
        };
        Edge::between(flip(a), flip(b)).unwrap_or(self)
    }

    /// True if both corners of the edge lie on `face`.
    pub fn lies_on(self, face: Face) -> bool {
        let (a, b) = self.corners();
        let side = u8::from(face.is_high());
        CORNER_IJK[a][face.axis()] == side && CORNER_IJK[b][face.axis()] == side
    }
}

/// Order-independent identity of a quadrilateral face.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FaceSignature([PointId; 4]);

impl FaceSignature {
    pub fn new(corners: [PointId; 4]) -> Self {
        let mut sorted = corners;
        sorted.sort_unstable();
        FaceSignature(sorted)
    }

    /// True if two corners coincide, i.e. the face has collapsed.
    pub fn is_degenerate(&self) -> bool {
        self.0.iter().tuple_windows().any(|(a, b)| a == b)
    }
}

/// A structured hexahedral block.
#[derive(Clone, Debug, Serialize)]
pub struct Block {
    id: BlockId,
    corners: [PointId; 8],
    neighbors: [Option<BlockId>; 6],
    splines: [Option<SplineKey>; 12],
    patches: [Option<PatchId>; 6],
    cells: [usize; 3],
    grading: [f64; 3],
}

impl Block {
    pub(crate) fn new(id: BlockId, corners: [PointId; 8], cells: [usize; 3]) -> Self {
        Self {
            id,
            corners,
            neighbors: [None; 6],
            splines: [None; 12],
            patches: [None; 6],
            cells,
            grading: [1.0; 3],
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn corners(&self) -> &[PointId; 8] {
        &self.corners
    }

    pub fn corner(&self, i: usize) -> PointId {
        self.corners[i]
    }

    pub fn face_corners(&self, face: Face) -> [PointId; 4] {
        face.corners().map(|c| self.corners[c])
    }

    pub fn face_signature(&self, face: Face) -> FaceSignature {
        FaceSignature::new(self.face_corners(face))
    }

    /// Start and end vertex of `edge`.
    pub fn edge_vertices(&self, edge: Edge) -> (PointId, PointId) {
        let (a, b) = edge.corners();
        (self.corners[a], self.corners[b])
    }

    pub fn neighbor(&self, face: Face) -> Option<BlockId> {
        self.neighbors[face.index()]
    }

    /// Face of this block that touches `other`, if they are neighbors.
    pub fn face_towards(&self, other: BlockId) -> Option<Face> {
        Face::ALL
            .into_iter()
            .find(|&f| self.neighbors[f.index()] == Some(other))
    }

    pub fn is_boundary(&self, face: Face) -> bool {
        self.neighbors[face.index()].is_none()
    }

    pub fn spline(&self, edge: Edge) -> Option<SplineKey> {
        self.splines[edge.index()]
    }

    pub fn patch(&self, face: Face) -> Option<PatchId> {
        self.patches[face.index()]
    }

    /// Cell counts along the local x, y and z axes.
    pub fn cells(&self) -> [usize; 3] {
        self.cells
    }

    /// Ratio of last to first cell width along each local axis.
    pub fn grading(&self) -> [f64; 3] {
        self.grading
    }

    /// The grading as written in a block definition.
    pub fn grading_command(&self) -> String {
        let [gx, gy, gz] = self.grading;
        format!("simpleGrading ({gx} {gy} {gz})")
    }

    pub(crate) fn set_neighbor(&mut self, face: Face, other: Option<BlockId>) {
        self.neighbors[face.index()] = other;
    }

    pub(crate) fn set_spline(&mut self, edge: Edge, key: Option<SplineKey>) {
        self.splines[edge.index()] = key;
    }

    pub(crate) fn set_patch(&mut self, face: Face, patch: PatchId) {
        self.patches[face.index()] = Some(patch);
    }

    pub(crate) fn set_grading(&mut self, axis: usize, ratio: f64) {
        self.grading[axis] = ratio;
    }

    pub(crate) fn clear_neighbors(&mut self) {
        self.neighbors = [None; 6];
    }

    /// Corner number holding point `p`.
    pub fn local_corner(&self, p: PointId) -> Option<usize> {
        self.corners.iter().position(|&c| c == p)
    }
}
