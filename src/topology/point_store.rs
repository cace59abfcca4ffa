//! Deduplicated global point table.
//!
//! Points are identified by a fuzzy coordinate key: each coordinate is
//! rounded to a multiple of the store's resolution, so two insertions closer
//! than the resolution resolve to the same [`PointId`]. All mutation goes
//! through the store, which keeps the key table and the coordinates in sync.

use hashbrown::HashMap as FastMap;

use crate::debug_invariants::DebugInvariants;
use crate::geometry::Point3;
use crate::mesh_error::MeshError;
use crate::topology::point::PointId;

/// Default point resolution, in mesh units.
pub const DEFAULT_RESOLUTION: f64 = 0.001;

/// Rounded coordinate key used for deduplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointKey([i64; 3]);

impl PointKey {
    /// Key of `p` at the given resolution.
    pub fn of(p: Point3, resolution: f64) -> Self {
        let r = |v: f64| {
            let k = (v / resolution).round();
            // -0.0 and 0.0 must land on the same key
            if k == 0.0 { 0 } else { k as i64 }
        };
        PointKey([r(p[0]), r(p[1]), r(p[2])])
    }
}

/// Owner of every vertex coordinate in a mesh build.
#[derive(Clone, Debug)]
pub struct PointStore {
    resolution: f64,
    points: Vec<Point3>,
    index: FastMap<PointKey, PointId>,
}

impl Default for PointStore {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            points: Vec::new(),
            index: FastMap::new(),
        }
    }
}

impl PointStore {
    /// Creates an empty store with the given deduplication resolution.
    pub fn new(resolution: f64) -> Result<Self, MeshError> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(MeshError::config(format!(
                "point resolution must be positive, got {resolution}"
            )));
        }
        Ok(Self {
            resolution,
            ..Self::default()
        })
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Inserts `p`, or returns the id of an existing point with the same key.
    pub fn insert(&mut self, p: Point3) -> PointId {
        let key = PointKey::of(p, self.resolution);
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = PointId::new(self.points.len() as u32);
        self.points.push(p);
        self.index.insert(key, id);
        id
    }

    pub fn get(&self, id: PointId) -> Option<Point3> {
        self.points.get(id.index()).copied()
    }

    /// Coordinates of `id`, or [`MeshError::MissingPoint`].
    pub fn try_get(&self, id: PointId) -> Result<Point3, MeshError> {
        self.get(id).ok_or(MeshError::MissingPoint(id))
    }

    pub fn as_slice(&self) -> &[Point3] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = (PointId, Point3)> + '_ {
        self.points
            .iter()
            .enumerate()
            .map(|(i, &p)| (PointId::new(i as u32), p))
    }
}

impl DebugInvariants for PointStore {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "PointStore");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        if self.index.len() != self.points.len() {
            return Err(MeshError::consistency(format!(
                "point store holds {} points but {} keys",
                self.points.len(),
                self.index.len()
            )));
        }
        for (id, p) in self.iter() {
            match self.index.get(&PointKey::of(p, self.resolution)) {
                Some(&k) if k == id => {}
                _ => return Err(MeshError::MissingPoint(id)),
            }
        }
        Ok(())
    }
}
