//! Addressing of the rectangular block core.
//!
//! The core is an `nx × ny` grid of blocks, one block high, over an
//! `(nx + 1) × (ny + 1)` grid of ground/top point pairs.

use serde::Serialize;

use crate::mesh_error::MeshError;
use crate::topology::block::{BlockId, Face, Level};
use crate::topology::point::PointId;

/// One step of the boundary walk: the core block side it runs along.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WalkSegment {
    pub block: BlockId,
    /// Grid position `(i, j)` of the block.
    pub cell: (usize, usize),
    pub face: Face,
    /// Horizontal axis the segment runs along.
    pub axis: usize,
    /// True if the walk runs toward increasing coordinate.
    pub forward: bool,
}

/// Block and point ids of the rectangular core by grid position.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoxGrid {
    nx: usize,
    ny: usize,
    points: Vec<[PointId; 2]>,
    blocks: Vec<BlockId>,
}

impl BoxGrid {
    /// `points[i + j (nx + 1)]` holds the ground and top point of column
    /// `(i, j)`; `blocks[i + j nx]` the block of cell `(i, j)`.
    pub fn new(
        nx: usize,
        ny: usize,
        points: Vec<[PointId; 2]>,
        blocks: Vec<BlockId>,
    ) -> Result<Self, MeshError> {
        if nx == 0 || ny == 0 {
            return Err(MeshError::config("core needs at least one block per axis"));
        }
        if points.len() != (nx + 1) * (ny + 1) || blocks.len() != nx * ny {
            return Err(MeshError::consistency(format!(
                "core grid {nx}x{ny} got {} point columns and {} blocks",
                points.len(),
                blocks.len()
            )));
        }
        Ok(Self { nx, ny, points, blocks })
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn point(&self, i: usize, j: usize, level: Level) -> PointId {
        self.points[i + j * (self.nx + 1)][level.index()]
    }

    pub fn block(&self, i: usize, j: usize) -> BlockId {
        self.blocks[i + j * self.nx]
    }

    pub fn point_ids(&self) -> &[[PointId; 2]] {
        &self.points
    }

    pub fn block_ids(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn walk_len(&self) -> usize {
        2 * (self.nx + self.ny)
    }

    /// True if walk point `n` is one of the four box corners.
    pub fn is_corner(&self, n: usize) -> bool {
        let n = n % self.walk_len();
        n == 0 || n == self.nx || n == self.nx + self.ny || n == 2 * self.nx + self.ny
    }

    /// Grid position of walk point `n`, counter-clockwise from the south-west
    /// corner heading east. `n` wraps.
    pub fn walk_ij(&self, n: usize) -> (usize, usize) {
        let (nx, ny) = (self.nx, self.ny);
        let n = n % self.walk_len();
        if n < nx {
            (n, 0)
        } else if n < nx + ny {
            (nx, n - nx)
        } else if n < 2 * nx + ny {
            (nx - (n - nx - ny), ny)
        } else {
            (0, ny - (n - 2 * nx - ny))
        }
    }

    /// The core block side between walk points `n` and `n + 1`.
    pub fn walk_segment(&self, n: usize) -> WalkSegment {
        let (nx, ny) = (self.nx, self.ny);
        let n = n % self.walk_len();
        let (cell, face, axis, forward) = if n < nx {
            ((n, 0), Face::South, 0, true)
        } else if n < nx + ny {
            ((nx - 1, n - nx), Face::East, 1, true)
        } else if n < 2 * nx + ny {
            let m = n - nx - ny;
            ((nx - m - 1, ny - 1), Face::North, 0, false)
        } else {
            let m = n - 2 * nx - ny;
            ((0, ny - m - 1), Face::West, 1, false)
        };
        WalkSegment {
            block: self.block(cell.0, cell.1),
            cell,
            face,
            axis,
            forward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(nx: usize, ny: usize) -> BoxGrid {
        let points = (0..(nx + 1) * (ny + 1))
            .map(|k| [PointId::new(2 * k as u32), PointId::new(2 * k as u32 + 1)])
            .collect();
        let blocks = (0..nx * ny).map(|k| BlockId::new(k as u32)).collect();
        BoxGrid::new(nx, ny, points, blocks).unwrap()
    }

    #[test]
    fn walk_goes_round_counter_clockwise() {
        let g = grid(3, 2);
        let walk: Vec<_> = (0..g.walk_len()).map(|n| g.walk_ij(n)).collect();
        assert_eq!(
            walk,
            vec![(0, 0), (1, 0), (2, 0), (3, 0), (3, 1), (3, 2), (2, 2), (1, 2), (0, 2), (0, 1)]
        );
        assert_eq!(g.walk_ij(10), (0, 0));
        assert!(g.is_corner(3) && g.is_corner(5) && g.is_corner(8) && !g.is_corner(9));
    }

    #[test]
    fn segments_follow_the_walk() {
        let g = grid(3, 2);
        assert_eq!(g.walk_segment(0).block, g.block(0, 0));
        assert_eq!(g.walk_segment(3).face, Face::East);
        let north = g.walk_segment(5);
        assert_eq!((north.block, north.face, north.forward), (g.block(2, 1), Face::North, false));
        let west = g.walk_segment(9);
        assert_eq!((west.block, west.face, west.cell), (g.block(0, 0), Face::West, (0, 0)));
    }

    #[test]
    fn rejects_wrong_sizes() {
        assert!(BoxGrid::new(2, 2, vec![], vec![]).is_err());
        assert!(BoxGrid::new(0, 2, vec![], vec![]).is_err());
    }
}
