//! Contiguous runs of blocks and the vertex lines along them.

use crate::block_manager::BlockManager;
use crate::geometry::Point3;
use crate::geometry::vector::chord_parameters;
use crate::mesh_error::MeshError;
use crate::topology::block::{BlockId, CORNER_IJK, Edge, Face, corner_at};
use crate::topology::point::PointId;

/// Blocks reached by repeatedly stepping through one face direction.
///
/// Each step records the block and the face through which the run leaves
/// it, in that block's own frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRun {
    steps: Vec<(BlockId, Face)>,
    closed: bool,
}

impl BlockRun {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[(BlockId, Face)] {
        &self.steps
    }

    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.steps.iter().map(|&(b, _)| b)
    }

    /// True if the run came back to its first block.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl BlockManager {
    /// Walks from `start` through `face` and onward in the same direction.
    ///
    /// The run ends at the boundary, on returning to `start`, or after `max`
    /// blocks. Asking for more blocks than the run holds is a configuration
    /// error.
    pub fn block_run(&self, start: BlockId, face: Face, max: Option<usize>) -> Result<BlockRun, MeshError> {
        self.require_topology()?;
        let mut steps = Vec::new();
        let mut closed = false;
        let (mut current, mut exit) = (start, face);
        loop {
            steps.push((current, exit));
            if max.is_some_and(|m| steps.len() >= m) {
                break;
            }
            let Some(next) = self.block(current)?.neighbor(exit) else {
                break;
            };
            if next == start {
                closed = true;
                break;
            }
            let entry = self.block(next)?.face_towards(current).ok_or_else(|| {
                MeshError::consistency(format!("block {next} does not link back to {current}"))
            })?;
            current = next;
            exit = entry.opposite();
        }
        if let Some(m) = max {
            if steps.len() < m {
                return Err(MeshError::config(format!(
                    "run from block {start} through {face:?} holds {} blocks, {m} requested",
                    steps.len()
                )));
            }
        }
        Ok(BlockRun { steps, closed })
    }

    /// Vertices along `edge` of the run's first block and its continuation
    /// through every following block, ordered in run direction.
    pub fn inter_block_vertex_path(&self, run: &BlockRun, edge: Edge) -> Result<Vec<PointId>, MeshError> {
        let Some(&(first, exit)) = run.steps().first() else {
            return Err(MeshError::config("empty block run"));
        };
        if edge.axis() != exit.axis() {
            return Err(MeshError::config(format!(
                "edge {} does not run along the run direction {exit:?}",
                edge.index()
            )));
        }
        let (a, b) = self.block(first)?.edge_vertices(edge);
        let mut path = if exit.is_high() { vec![a, b] } else { vec![b, a] };

        for &(id, exit) in &run.steps()[1..] {
            let block = self.block(id)?;
            let v = path[path.len() - 1];
            let c = block.local_corner(v).ok_or_else(|| {
                MeshError::consistency(format!("block {id} does not contain vertex {v}"))
            })?;
            let mut ijk = CORNER_IJK[c];
            if ijk[exit.axis()] == u8::from(exit.is_high()) {
                return Err(MeshError::consistency(format!(
                    "vertex {v} lies on the exit face of block {id}"
                )));
            }
            ijk[exit.axis()] = 1 - ijk[exit.axis()];
            path.push(block.corner(corner_at(ijk)));
        }
        Ok(path)
    }

    /// Coordinates of the vertex path.
    pub fn inter_block_vertex_points(&self, run: &BlockRun, edge: Edge) -> Result<Vec<Point3>, MeshError> {
        self.inter_block_vertex_path(run, edge)?
            .into_iter()
            .map(|v| self.point(v))
            .collect()
    }

    /// Every point along the line, spline interiors included. Straight
    /// segments contribute `inner` evenly spaced points.
    pub fn inter_block_path(&self, run: &BlockRun, edge: Edge, inner: usize) -> Result<Vec<Point3>, MeshError> {
        let vertices = self.inter_block_vertex_path(run, edge)?;
        let mut out = vec![self.point(vertices[0])?];
        for pair in vertices.windows(2) {
            let curve = self.edge_curve(pair[0], pair[1], inner)?;
            out.extend_from_slice(&curve.points()[1..]);
        }
        Ok(out)
    }

    /// Normalized arc-length parameter of each vertex along the line.
    pub fn block_line_s_list(&self, run: &BlockRun, edge: Edge) -> Result<Vec<f64>, MeshError> {
        Ok(chord_parameters(&self.inter_block_vertex_points(run, edge)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_manager::tests::two_blocks;

    #[test]
    fn run_stops_at_boundary() {
        let (mut bm, a, b) = two_blocks();
        bm.find_all_neighbors().unwrap();
        let run = bm.block_run(a, Face::East, None).unwrap();
        assert_eq!(run.blocks().collect::<Vec<_>>(), vec![a, b]);
        assert!(!run.is_closed());
        assert_eq!(bm.block_run(a, Face::East, Some(1)).unwrap().len(), 1);
        assert!(matches!(bm.block_run(a, Face::East, Some(3)), Err(MeshError::Config(_))));
    }

    #[test]
    fn vertex_path_crosses_blocks() {
        let (mut bm, a, b) = two_blocks();
        bm.find_all_neighbors().unwrap();
        let run = bm.block_run(a, Face::East, None).unwrap();
        let path = bm.inter_block_vertex_points(&run, Edge::new(0).unwrap()).unwrap();
        assert_eq!(path, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert_eq!(bm.block_line_s_list(&run, Edge::new(0).unwrap()).unwrap(), vec![0.0, 0.5, 1.0]);

        // walking west from b reverses the line
        let back = bm.block_run(b, Face::West, None).unwrap();
        let path = bm.inter_block_vertex_points(&back, Edge::new(3).unwrap()).unwrap();
        assert_eq!(path[0], [2.0, 0.0, 1.0]);
        assert_eq!(path[2], [0.0, 0.0, 1.0]);
        assert!(bm.inter_block_vertex_path(&back, Edge::new(4).unwrap()).is_err());
    }

    #[test]
    fn full_path_samples_straight_edges() {
        let (mut bm, a, _) = two_blocks();
        bm.find_all_neighbors().unwrap();
        let run = bm.block_run(a, Face::East, None).unwrap();
        let pts = bm.inter_block_path(&run, Edge::new(0).unwrap(), 1).unwrap();
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[1], [0.5, 0.0, 0.0]);
    }
}
