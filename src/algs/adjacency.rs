//! Face matching between hexahedral blocks.
//
// Each block face is keyed by its sorted corner ids. The first face to claim a
// key becomes its owner; the second one is linked to the owner in both
// directions; a third claim means the block topology is broken.

use hashbrown::HashMap as FastMap;

use crate::mesh_error::MeshError;
use crate::topology::block::{Block, BlockId, Face, FaceSignature};

/// Two block faces sharing the same four corners.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FaceLink {
    pub a: (BlockId, Face),
    pub b: (BlockId, Face),
}

/// Outcome of matching every face of a block collection.
#[derive(Clone, Debug, Default)]
pub struct FaceMatches {
    pub links: Vec<FaceLink>,
    /// Faces with no partner, in block order.
    pub boundary: Vec<(BlockId, Face)>,
}

/// Matches the faces of `blocks` by corner signature.
///
/// Fails with [`MeshError::OverMatchedFace`] when a signature is claimed by
/// more than two faces, and with a consistency error for collapsed faces.
pub fn match_faces(blocks: &[Block]) -> Result<FaceMatches, MeshError> {
    let mut owner: FastMap<FaceSignature, (BlockId, Face)> =
        FastMap::with_capacity(blocks.len() * 3);
    let mut matched: FastMap<FaceSignature, ()> = FastMap::new();
    let mut links = Vec::new();

    for block in blocks {
        for face in Face::ALL {
            let sig = block.face_signature(face);
            if sig.is_degenerate() {
                return Err(MeshError::consistency(format!(
                    "face {face:?} of block {} has coincident corners",
                    block.id()
                )));
            }
            if matched.contains_key(&sig) {
                return Err(MeshError::OverMatchedFace {
                    block: block.id(),
                    face,
                });
            }
            match owner.remove(&sig) {
                Some(first) => {
                    if first.0 == block.id() {
                        return Err(MeshError::consistency(format!(
                            "block {} touches itself on faces {:?} and {face:?}",
                            block.id(),
                            first.1
                        )));
                    }
                    links.push(FaceLink {
                        a: first,
                        b: (block.id(), face),
                    });
                    matched.insert(sig, ());
                }
                None => {
                    owner.insert(sig, (block.id(), face));
                }
            }
        }
    }

    let mut boundary: Vec<(BlockId, Face)> = owner.into_values().collect();
    boundary.sort_unstable();
    Ok(FaceMatches { links, boundary })
}
