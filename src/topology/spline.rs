//! Splines curving block edges.
//!
//! A [`Spline`] is an ordered point sequence from vertex A to vertex B. The
//! first and last entries are always bit-identical copies of the two vertex
//! coordinates in the [`PointStore`]; everything in between is free.

use serde::Serialize;

use crate::geometry::Point3;
use crate::geometry::vector::{self, chord_parameters, lerp};
use crate::mesh_error::MeshError;
use crate::topology::point::PointId;
use crate::topology::point_store::PointStore;

/// Orientation-free key of the edge a spline curves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SplineKey {
    pub lo: PointId,
    pub hi: PointId,
}

impl SplineKey {
    pub fn new(a: PointId, b: PointId) -> Self {
        if a <= b {
            SplineKey { lo: a, hi: b }
        } else {
            SplineKey { lo: b, hi: a }
        }
    }
}

/// An ordered point sequence between two vertices.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Spline {
    vertex_a: PointId,
    vertex_b: PointId,
    points: Vec<Point3>,
}

impl Spline {
    /// Builds a spline from the points strictly between `a` and `b`.
    pub fn new(
        store: &PointStore,
        a: PointId,
        b: PointId,
        between: impl IntoIterator<Item = Point3>,
    ) -> Result<Self, MeshError> {
        if a == b {
            return Err(MeshError::geometry(format!(
                "spline needs two distinct vertices, got {a} twice"
            )));
        }
        let pa = store.try_get(a)?;
        let pb = store.try_get(b)?;
        let mut points = vec![pa];
        points.extend(between);
        points.push(pb);
        Ok(Self {
            vertex_a: a,
            vertex_b: b,
            points,
        })
    }

    /// A straight spline with `inner` evenly spaced points.
    pub fn straight(store: &PointStore, a: PointId, b: PointId, inner: usize) -> Result<Self, MeshError> {
        let pa = store.try_get(a)?;
        let pb = store.try_get(b)?;
        Self::new(store, a, b, vector::linear_points(pa, pb, inner, false, false))
    }

    pub fn vertex_a(&self) -> PointId {
        self.vertex_a
    }

    pub fn vertex_b(&self) -> PointId {
        self.vertex_b
    }

    pub fn key(&self) -> SplineKey {
        SplineKey::new(self.vertex_a, self.vertex_b)
    }

    /// All points, vertices included.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Points strictly between the two vertices.
    pub fn inner_points(&self) -> &[Point3] {
        &self.points[1..self.points.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn first_point(&self) -> Point3 {
        self.points[0]
    }

    pub fn last_point(&self) -> Point3 {
        self.points[self.points.len() - 1]
    }

    /// The same curve running from B to A.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            vertex_a: self.vertex_b,
            vertex_b: self.vertex_a,
            points,
        }
    }

    /// Orients the spline so that it runs along `direction`.
    ///
    /// Returns true if the vertices were swapped.
    pub fn order(&mut self, direction: Point3) -> bool {
        let chord = vector::sub(self.last_point(), self.first_point());
        if vector::dot(chord, direction) < 0.0 {
            *self = self.reversed();
            return true;
        }
        false
    }

    /// Normalized chord-length parameter of every point.
    pub fn s_list(&self) -> Vec<f64> {
        chord_parameters(&self.points)
    }

    /// Point at normalized chord-length parameter `u ∈ [0, 1]`.
    pub fn point_at(&self, u: f64) -> Point3 {
        if u <= 0.0 {
            return self.first_point();
        }
        if u >= 1.0 {
            return self.last_point();
        }
        let s = self.s_list();
        let k = s.partition_point(|&v| v <= u).clamp(1, s.len() - 1);
        let span = s[k] - s[k - 1];
        let t = if span > 0.0 { (u - s[k - 1]) / span } else { 0.0 };
        lerp(self.points[k - 1], self.points[k], t)
    }

    /// Offset of the curve from its straight chord at parameter `u`.
    pub fn deviation_at(&self, u: f64) -> Point3 {
        let straight = lerp(self.first_point(), self.last_point(), u.clamp(0.0, 1.0));
        vector::sub(self.point_at(u), straight)
    }

    /// Blends the curve toward its straight chord near one end.
    ///
    /// The vertex at the chosen end stays put; the next `mix_size` points are
    /// pulled onto the chord with a weight decaying linearly to zero. `None`
    /// mixes over the whole spline.
    pub fn mix_with_linear(&mut self, at_first: bool, mix_size: Option<usize>) {
        let n = self.points.len();
        let size = mix_size.unwrap_or(n - 1).min(n - 1);
        if size == 0 {
            return;
        }
        let (a, b) = (self.first_point(), self.last_point());
        let last = n - 1;
        for k in 1..size.min(last) {
            let idx = if at_first { k } else { last - k };
            let u = idx as f64 / last as f64;
            let w = k as f64 / size as f64;
            let linear = lerp(a, b, u);
            self.points[idx] = lerp(linear, self.points[idx], w);
        }
    }

    /// Checks that the end points still coincide with the stored vertices.
    pub fn validate(&self, store: &PointStore) -> Result<(), MeshError> {
        let pa = store.try_get(self.vertex_a)?;
        let pb = store.try_get(self.vertex_b)?;
        if self.first_point() != pa || self.last_point() != pb {
            return Err(MeshError::DetachedSpline {
                a: self.vertex_a,
                b: self.vertex_b,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (PointStore, PointId, PointId) {
        let mut s = PointStore::default();
        let a = s.insert([0.0, 0.0, 0.0]);
        let b = s.insert([4.0, 0.0, 0.0]);
        (s, a, b)
    }

    #[test]
    fn ends_on_vertices() {
        let (s, a, b) = store();
        let sp = Spline::new(&s, a, b, [[1.0, 1.0, 0.0], [3.0, 1.0, 0.0]]).unwrap();
        assert_eq!(sp.first_point(), [0.0, 0.0, 0.0]);
        assert_eq!(sp.last_point(), [4.0, 0.0, 0.0]);
        assert_eq!(sp.inner_points().len(), 2);
        sp.validate(&s).unwrap();
    }

    #[test]
    fn order_swaps_against_direction() {
        let (s, a, b) = store();
        let mut sp = Spline::straight(&s, a, b, 3).unwrap();
        assert!(!sp.order([1.0, 0.0, 0.0]));
        assert!(sp.order([-1.0, 0.0, 0.0]));
        assert_eq!(sp.vertex_a(), b);
        assert_eq!(sp.first_point(), [4.0, 0.0, 0.0]);
        assert_eq!(sp.key(), SplineKey::new(a, b));
    }

    #[test]
    fn point_at_walks_the_polyline() {
        let (s, a, b) = store();
        let sp = Spline::new(&s, a, b, [[2.0, 2.0, 0.0]]).unwrap();
        let mid = sp.point_at(0.5);
        assert!((mid[0] - 2.0).abs() < 1e-12 && (mid[1] - 2.0).abs() < 1e-12);
        let dev = sp.deviation_at(0.5);
        assert!((dev[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn full_mix_straightens() {
        let (s, a, b) = store();
        let mut sp = Spline::new(&s, a, b, [[1.0, 1.0, 0.0], [2.0, 1.0, 0.0], [3.0, 1.0, 0.0]]).unwrap();
        sp.mix_with_linear(true, Some(1));
        assert_eq!(sp.points()[1], [1.0, 1.0, 0.0]);
        sp.mix_with_linear(true, Some(4));
        // first inner point is pulled a quarter of the way back toward the chord
        assert!((sp.points()[1][1] - 0.25).abs() < 1e-12);
        assert_eq!(sp.last_point(), [4.0, 0.0, 0.0]);
    }

    #[test]
    fn rejects_identical_vertices() {
        let (s, a, _) = store();
        assert!(Spline::new(&s, a, a, []).is_err());
    }
}
