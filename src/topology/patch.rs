//! Named groups of boundary faces.
//!
//! A [`Patch`] collects `(block, face)` pairs under one boundary name and
//! type. Cyclic patches name a partner patch; the two are paired face by face
//! in insertion order, so their face counts must agree.

use std::fmt;

use hashbrown::HashMap as FastMap;
use serde::Serialize;

use crate::mesh_error::MeshError;
use crate::topology::block::{BlockId, Face};

/// Index of a patch in the block manager's patch list.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PatchId(u16);

impl PatchId {
    pub const fn new(index: u16) -> Self {
        PatchId(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PatchId").field(&self.0).finish()
    }
}

/// Boundary type written for a patch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PatchType {
    Patch,
    Wall,
    Cyclic { partner: String },
}

/// Structured position of a face inside its patch, e.g. `(i, j)` on a box side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PatchFaceKey(pub u32, pub u32);

/// One face of a patch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatchFace {
    pub block: BlockId,
    pub face: Face,
    pub key: Option<PatchFaceKey>,
}

/// A named, typed list of block faces.
#[derive(Clone, Debug, Serialize)]
pub struct Patch {
    name: String,
    kind: PatchType,
    faces: Vec<PatchFace>,
    #[serde(skip)]
    by_key: FastMap<PatchFaceKey, usize>,
}

impl Patch {
    pub fn new(name: impl Into<String>, kind: PatchType) -> Self {
        Self {
            name: name.into(),
            kind,
            faces: Vec::new(),
            by_key: FastMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PatchType {
        &self.kind
    }

    pub fn is_cyclic(&self) -> bool {
        matches!(self.kind, PatchType::Cyclic { .. })
    }

    pub fn cyclic_partner(&self) -> Option<&str> {
        match &self.kind {
            PatchType::Cyclic { partner } => Some(partner),
            _ => None,
        }
    }

    pub fn set_cyclic(&mut self, partner: impl Into<String>) {
        self.kind = PatchType::Cyclic {
            partner: partner.into(),
        };
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn faces(&self) -> &[PatchFace] {
        &self.faces
    }

    /// Face stored under `key`.
    pub fn face(&self, key: PatchFaceKey) -> Option<&PatchFace> {
        self.by_key.get(&key).map(|&i| &self.faces[i])
    }

    pub fn contains_key(&self, key: PatchFaceKey) -> bool {
        self.by_key.contains_key(&key)
    }

    pub(crate) fn push(&mut self, face: PatchFace) -> Result<(), MeshError> {
        if let Some(key) = face.key {
            if self.by_key.contains_key(&key) {
                return Err(MeshError::consistency(format!(
                    "patch `{}` already holds a face with key {key:?}",
                    self.name
                )));
            }
            self.by_key.insert(key, self.faces.len());
        }
        self.faces.push(face);
        Ok(())
    }
}

/// Pairs the faces of two cyclic partner patches in insertion order.
///
/// Fails unless each patch names the other and both hold the same number of
/// faces.
pub fn cyclic_face_pairs<'a>(
    a: &'a Patch,
    b: &'a Patch,
) -> Result<Vec<(&'a PatchFace, &'a PatchFace)>, MeshError> {
    if a.cyclic_partner() != Some(b.name()) || b.cyclic_partner() != Some(a.name()) {
        return Err(MeshError::consistency(format!(
            "patches `{}` and `{}` are not cyclic partners",
            a.name(),
            b.name()
        )));
    }
    if a.len() != b.len() {
        return Err(MeshError::consistency(format!(
            "cyclic patches `{}` ({} faces) and `{}` ({} faces) differ in size",
            a.name(),
            a.len(),
            b.name(),
            b.len()
        )));
    }
    Ok(a.faces().iter().zip(b.faces()).collect())
}
