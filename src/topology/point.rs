//! `PointId`: a strong, zero-cost handle for block vertices
//!
//! Every vertex of the block topology lives exactly once in the
//! [`PointStore`](crate::topology::point_store::PointStore); blocks, splines
//! and the cylinder addressing refer to it through a `PointId`, never through
//! a copy of its coordinates.
//!
//! This module provides:
//! - A transparent `PointId` newtype around `u32`, matching the vertex index
//!   written to the mesh description.
//! - Implementations of common traits (`Debug`, `Display`, ordering, hashing,
//!   serde) so `PointId` can be used in maps and printed easily.

use std::fmt;

/// Index of a vertex in the global point table.
///
/// # Memory layout
/// This type is `repr(transparent)` over `u32`.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct PointId(u32);

impl PointId {
    /// Creates a `PointId` from a table index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        PointId(index)
    }

    /// Position of the vertex in the point table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the inner `u32` value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Custom `Debug` implementation to display as `PointId(raw_value)`.
impl fmt::Debug for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PointId").field(&self.0).finish()
    }
}

/// Prints only the raw index, as it appears in the vertex list.
impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_and_index() {
        let p = PointId::new(42);
        assert_eq!(p.get(), 42);
        assert_eq!(p.index(), 42);
    }

    #[test]
    fn debug_and_display() {
        let p = PointId::new(7);
        assert_eq!(format!("{:?}", p), "PointId(7)");
        assert_eq!(format!("{}", p), "7");
    }

    #[test]
    fn json_is_a_bare_integer() {
        let p = PointId::new(123);
        let s = serde_json::to_string(&p).unwrap();
        assert_eq!(s, "123");
        let p2: PointId = serde_json::from_str(&s).unwrap();
        assert_eq!(p2, p);
    }
}
