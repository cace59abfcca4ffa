//! Splines spanning several blocks.
//!
//! All operations work on a [`BlockRun`] and the line of block edges it
//! follows. The line is cut into one spline per block; every cut lands
//! exactly on the shared vertex, so neighboring splines always meet.

use serde::{Deserialize, Serialize};

use crate::block_manager::{BlockManager, BlockRun};
use crate::geometry::vector::{self, chord_parameters, lerp};
use crate::geometry::{Point3, TerrainSurface};
use crate::mesh_error::MeshError;
use crate::topology::block::{BlockId, CORNER_IJK, Edge, Face, corner_at};
use crate::topology::point::PointId;
use crate::topology::spline::{Spline, SplineKey};

/// How interior lines are weighted between two bounding lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    /// By arc length along the run.
    #[default]
    Distance,
    /// By block index along the run.
    Index,
}

fn hermite(p0: Point3, p1: Point3, t0: Point3, t1: Point3, t: f64) -> Point3 {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    let mut out = vector::scale(p0, h00);
    out = vector::add(out, vector::scale(t0, h10));
    out = vector::add(out, vector::scale(p1, h01));
    vector::add(out, vector::scale(t1, h11))
}

/// Lagrange polynomial through `points` at parameters `params`, evaluated at `s`.
fn lagrange(params: &[f64], points: &[Point3], s: f64) -> Point3 {
    let mut out = [0.0; 3];
    for (i, (&si, &pi)) in params.iter().zip(points).enumerate() {
        let w: f64 = params
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &sj)| (s - sj) / (si - sj))
            .product();
        out = vector::add(out, vector::scale(pi, w));
    }
    out
}

fn uniform_parameters(inner: usize) -> Vec<f64> {
    let jmax = (inner + 1) as f64;
    (1..=inner).map(|j| j as f64 / jmax).collect()
}

/// Point of a curve reconstructed from its chord and a deviation.
fn on_chord(a: Point3, b: Point3, u: f64, deviation: Point3) -> Point3 {
    vector::add(lerp(a, b, u), deviation)
}

impl BlockManager {
    /// Curves the line along `edge` of the run through `path`.
    ///
    /// The path is split at the points nearest to each interior vertex; the
    /// points between two splits become the inner points of that block's
    /// spline. Path ends and split points are replaced by the exact vertices.
    pub fn set_inter_block_spline(
        &mut self,
        run: &BlockRun,
        edge: Edge,
        path: &[Point3],
    ) -> Result<Vec<SplineKey>, MeshError> {
        let vertices = self.inter_block_vertex_path(run, edge)?;
        let m = vertices.len() - 1;
        if path.len() < m + 1 {
            return Err(MeshError::geometry(format!(
                "path of {} points cannot span {m} blocks",
                path.len()
            )));
        }
        let last = path.len() - 1;
        let mut splits = vec![0usize; m + 1];
        splits[m] = last;
        for k in 1..m {
            let target = self.point(vertices[k])?;
            let lo = splits[k - 1] + 1;
            let hi = last - (m - k);
            splits[k] = (lo..=hi)
                .min_by(|&x, &y| {
                    vector::distance(path[x], target).total_cmp(&vector::distance(path[y], target))
                })
                .unwrap_or(lo);
        }

        let mut keys = Vec::with_capacity(m);
        for k in 0..m {
            let inner = path[splits[k] + 1..splits[k + 1]].iter().copied();
            let spline = Spline::new(&self.points, vertices[k], vertices[k + 1], inner)?;
            keys.push(self.set_spline(spline)?);
        }
        Ok(keys)
    }

    /// Curves the line along `edge` of the run by cubic Hermite segments.
    ///
    /// The curve passes through every vertex of the line. End tangents take
    /// the given directions, interior tangents are the central differences of
    /// the neighboring vertices; every tangent is scaled to its segment's
    /// chord. Each block gets `inner` points.
    pub fn set_inter_block_spline_hermite(
        &mut self,
        run: &BlockRun,
        edge: Edge,
        tangent_start: Point3,
        tangent_end: Point3,
        inner: usize,
    ) -> Result<Vec<SplineKey>, MeshError> {
        let vertices = self.inter_block_vertex_path(run, edge)?;
        let p = self.inter_block_vertex_points(run, edge)?;
        let m = p.len() - 1;
        let dir_start = vector::normalized(tangent_start)
            .ok_or_else(|| MeshError::geometry("zero start tangent"))?;
        let dir_end =
            vector::normalized(tangent_end).ok_or_else(|| MeshError::geometry("zero end tangent"))?;

        let tangents: Vec<Point3> = (0..=m)
            .map(|k| match k {
                0 => vector::scale(dir_start, vector::distance(p[0], p[1])),
                k if k == m => vector::scale(dir_end, vector::distance(p[m - 1], p[m])),
                k => vector::scale(vector::sub(p[k + 1], p[k - 1]), 0.5),
            })
            .collect();

        let params = uniform_parameters(inner);
        let mut keys = Vec::with_capacity(m);
        for k in 0..m {
            let pts = params
                .iter()
                .map(|&t| hermite(p[k], p[k + 1], tangents[k], tangents[k + 1], t));
            let spline = Spline::new(&self.points, vertices[k], vertices[k + 1], pts)?;
            keys.push(self.set_spline(spline)?);
        }
        Ok(keys)
    }

    /// Curves the line along `edge` of the run through its own vertices.
    ///
    /// Each block's segment is sampled from the polynomial of degree
    /// `order - 1` through the `order` vertices around it, parametrized by
    /// chord length along the whole line. An existing spline keeps its point
    /// count; new ones get `inner` points.
    pub fn interpolate_inter_block_spline(
        &mut self,
        run: &BlockRun,
        edge: Edge,
        order: usize,
        inner: usize,
    ) -> Result<Vec<SplineKey>, MeshError> {
        if order < 2 {
            return Err(MeshError::config(format!("interpolation order {order} is below 2")));
        }
        let vertices = self.inter_block_vertex_path(run, edge)?;
        let p = self.inter_block_vertex_points(run, edge)?;
        let m = p.len() - 1;
        let s = chord_parameters(&p);
        let order = order.min(m + 1);

        let mut keys = Vec::with_capacity(m);
        for k in 0..m {
            let lo = (k + 1).saturating_sub(order / 2).min(m + 1 - order);
            let window = lo..lo + order;
            let count = self
                .spline_between(vertices[k], vertices[k + 1])
                .map_or(inner, |existing| existing.inner_points().len());
            let pts: Vec<Point3> = uniform_parameters(count)
                .into_iter()
                .map(|u| lagrange(&s[window.clone()], &p[window.clone()], s[k] + u * (s[k + 1] - s[k])))
                .collect();
            let spline = Spline::new(&self.points, vertices[k], vertices[k + 1], pts)?;
            keys.push(self.set_spline(spline)?);
        }
        log::debug!("interpolated a line of {m} blocks with order {order}");
        Ok(keys)
    }

    /// Fills the block interfaces of a run with splines interpolated between
    /// the first and last interface.
    ///
    /// `edge_start` lies on the entry face of the run's first block and
    /// `edge_end` on the exit face of its last block; both must belong to the
    /// same family of parallel edges. Each interior spline keeps its point
    /// count if it already exists. Returns the number of splines written.
    pub fn interpolate_parallel_splines(
        &mut self,
        run: &BlockRun,
        edge_start: Edge,
        edge_end: Edge,
        mode: InterpolationMode,
    ) -> Result<usize, MeshError> {
        let Some(&(first, exit)) = run.steps().first() else {
            return Err(MeshError::config("empty block run"));
        };
        if !edge_start.lies_on(exit.opposite()) {
            return Err(MeshError::config(format!(
                "edge {} is not on the entry face of block {first}",
                edge_start.index()
            )));
        }

        let (mut a, mut b) = self.block(first)?.edge_vertices(edge_start);
        let mut lines: Vec<(PointId, PointId)> = vec![(a, b)];
        for &(id, exit) in run.steps() {
            let block = self.block(id)?;
            let flip = |v: PointId| -> Result<PointId, MeshError> {
                let c = block.local_corner(v).ok_or_else(|| {
                    MeshError::consistency(format!("block {id} does not contain vertex {v}"))
                })?;
                let mut ijk = CORNER_IJK[c];
                ijk[exit.axis()] = 1 - ijk[exit.axis()];
                Ok(block.corner(corner_at(ijk)))
            };
            a = flip(a)?;
            b = flip(b)?;
            lines.push((a, b));
        }

        let (last_id, _) = run.steps()[run.len() - 1];
        let (ea, eb) = self.block(last_id)?.edge_vertices(edge_end);
        if SplineKey::new(ea, eb) != SplineKey::new(a, b) {
            return Err(MeshError::consistency(format!(
                "edge {} of block {last_id} is not parallel to edge {} of block {first}",
                edge_end.index(),
                edge_start.index()
            )));
        }

        let m = lines.len() - 1;
        if m < 2 {
            return Ok(0);
        }
        let weights: Vec<f64> = match mode {
            InterpolationMode::Index => (0..=m).map(|k| k as f64 / m as f64).collect(),
            InterpolationMode::Distance => {
                let side_a: Vec<Point3> = lines.iter().map(|l| self.point(l.0)).collect::<Result<_, _>>()?;
                let side_b: Vec<Point3> = lines.iter().map(|l| self.point(l.1)).collect::<Result<_, _>>()?;
                chord_parameters(&side_a)
                    .into_iter()
                    .zip(chord_parameters(&side_b))
                    .map(|(x, y)| 0.5 * (x + y))
                    .collect()
            }
        };

        let bound_first = self.edge_curve(lines[0].0, lines[0].1, 0)?;
        let bound_last = self.edge_curve(lines[m].0, lines[m].1, 0)?;
        let default_inner = bound_first.inner_points().len().max(bound_last.inner_points().len());

        let mut written = 0;
        for k in 1..m {
            let (va, vb) = lines[k];
            let params = match self.spline_between(va, vb) {
                Some(existing) => {
                    let s = existing.s_list();
                    s[1..s.len() - 1].to_vec()
                }
                None => uniform_parameters(default_inner),
            };
            if params.is_empty() {
                continue;
            }
            let (pa, pb) = (self.point(va)?, self.point(vb)?);
            let w = weights[k];
            let pts: Vec<Point3> = params
                .iter()
                .map(|&u| {
                    let dev = lerp(bound_first.deviation_at(u), bound_last.deviation_at(u), w);
                    on_chord(pa, pb, u, dev)
                })
                .collect();
            let spline = Spline::new(&self.points, va, vb, pts)?;
            self.set_spline(spline)?;
            written += 1;
        }
        log::debug!("interpolated {written} parallel splines over {} blocks", run.len());
        Ok(written)
    }

    /// Sets the splines on the line shared by two side-by-side runs to the
    /// average curve of the two lines opposite to it.
    ///
    /// `edge_this` is the opposite line's edge in `start`; the shared line is
    /// its mirror across the face toward `neighbor`. The run follows
    /// `face_along_line` for at most `max` blocks. Returns the number of
    /// splines written.
    pub fn set_average_inter_block_spline(
        &mut self,
        start: BlockId,
        neighbor: BlockId,
        face_along_line: Face,
        edge_this: Edge,
        max: Option<usize>,
    ) -> Result<usize, MeshError> {
        let side = self.block(start)?.face_towards(neighbor).ok_or_else(|| {
            MeshError::config(format!("blocks {start} and {neighbor} are not neighbors"))
        })?;
        if edge_this.lies_on(side) {
            return Err(MeshError::config(format!(
                "edge {} lies on the face toward block {neighbor}",
                edge_this.index()
            )));
        }
        let shared_edge = edge_this.mirrored(side.axis());
        let run = self.block_run(start, face_along_line, max)?;
        let shared = self.inter_block_vertex_path(&run, shared_edge)?;
        let opposite = self.inter_block_vertex_path(&run, edge_this)?;

        let mut written = 0;
        for (k, id) in run.blocks().enumerate() {
            let (s0, s1) = (shared[k], shared[k + 1]);
            let block = self.block(id)?;
            let side_k = Face::ALL
                .into_iter()
                .find(|&f| {
                    let c = block.face_corners(f);
                    c.contains(&s0) && c.contains(&s1) && !c.contains(&opposite[k])
                })
                .ok_or_else(|| MeshError::consistency(format!("no side face in block {id}")))?;
            let other_id = block.neighbor(side_k).ok_or_else(|| {
                MeshError::consistency(format!("block {id} has no neighbor on {side_k:?}"))
            })?;
            let other = self.block(other_id)?;
            let across = other.face_towards(id).ok_or_else(|| {
                MeshError::consistency(format!("block {other_id} does not link back to {id}"))
            })?;
            let flip = |v: PointId| -> Result<PointId, MeshError> {
                let c = other.local_corner(v).ok_or_else(|| {
                    MeshError::consistency(format!("block {other_id} does not contain vertex {v}"))
                })?;
                let mut ijk = CORNER_IJK[c];
                ijk[across.axis()] = 1 - ijk[across.axis()];
                Ok(other.corner(corner_at(ijk)))
            };
            let (q0, q1) = (flip(s0)?, flip(s1)?);

            let this_curve = self.edge_curve(opposite[k], opposite[k + 1], 0)?;
            let other_curve = self.edge_curve(q0, q1, 0)?;
            let inner = this_curve.inner_points().len().max(other_curve.inner_points().len());
            if inner == 0 {
                continue;
            }
            let (p0, p1) = (self.point(s0)?, self.point(s1)?);
            let pts: Vec<Point3> = uniform_parameters(inner)
                .into_iter()
                .map(|u| {
                    let dev = vector::midpoint(this_curve.deviation_at(u), other_curve.deviation_at(u));
                    on_chord(p0, p1, u, dev)
                })
                .collect();
            let spline = Spline::new(&self.points, s0, s1, pts)?;
            self.set_spline(spline)?;
            written += 1;
        }
        Ok(written)
    }

    /// Curves the ground edges of the rectangular core onto the terrain.
    ///
    /// Every grid line along x and y is sampled with `inner[axis]` points per
    /// block. Flat terrain needs no splines. Returns the number of splines
    /// written.
    pub fn set_terrain_splines(
        &mut self,
        terrain: &dyn TerrainSurface,
        inner: [usize; 2],
    ) -> Result<usize, MeshError> {
        if terrain.is_flat() {
            return Ok(0);
        }
        let grid = self.box_grid()?.clone();
        let (nx, ny) = (grid.nx(), grid.ny());
        let mut lines: Vec<(BlockId, Face, Edge, usize)> = Vec::with_capacity(nx + ny + 2);
        for j in 0..=ny {
            let edge = if j < ny { Edge::nth(0) } else { Edge::nth(1) };
            lines.push((grid.block(0, j.min(ny - 1)), Face::East, edge, 0));
        }
        for i in 0..=nx {
            let edge = if i < nx { Edge::nth(4) } else { Edge::nth(5) };
            lines.push((grid.block(i.min(nx - 1), 0), Face::North, edge, 1));
        }

        let mut written = 0;
        for (block, face, edge, axis) in lines {
            let run = self.block_run(block, face, None)?;
            let vertices = self.inter_block_vertex_points(&run, edge)?;
            let mut path = vec![vertices[0]];
            for pair in vertices.windows(2) {
                for p in vector::linear_points(pair[0], pair[1], inner[axis], false, true) {
                    let z = terrain.height(p[0], p[1]);
                    path.push([p[0], p[1], z]);
                }
                // the block vertex itself keeps its stored height
                if let Some(end) = path.last_mut() {
                    *end = pair[1];
                }
            }
            written += self.set_inter_block_spline(&run, edge, &path)?.len();
        }
        log::debug!("{written} terrain splines on the core ground");
        Ok(written)
    }
}
