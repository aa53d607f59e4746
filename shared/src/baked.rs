//! Baked structure dump types.
//!
//! The offline `structure_baker` tool writes these with bincode so a world can be
//! seeded with hand-picked ruins without re-running generation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::blocks::BlockKind;
use crate::structures::StructureSpec;
use crate::voxel::VoxelEdits;

pub const BAKED_STRUCTURES_VERSION: u32 = 2;

/// Versioned set of baked structures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakedStructures {
    pub version: u32,
    pub seed: u32,
    pub structures: Vec<BakedStructure>,
    pub stamps: Vec<BakedStamp>,
}

/// One structure and the voxels it wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakedStructure {
    /// Name from the request manifest
    pub name: String,
    pub spec: StructureSpec,
    pub base_y: i32,
    pub voxels: Vec<BakedVoxel>,
    pub treasures: Vec<[i32; 3]>,
}

/// One stamp (igloo, tower, trench, ...) and the voxels it wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakedStamp {
    pub name: String,
    /// Stamp id, e.g. "tower"
    pub kind: String,
    pub origin: [i32; 3],
    pub voxels: Vec<BakedVoxel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BakedVoxel {
    pub pos: [i32; 3],
    /// `None` for dug-out voxels
    pub block: Option<BlockKind>,
    pub collidable: bool,
}

/// Flatten edits into a stable, sorted voxel list.
pub fn bake_voxels(edits: &VoxelEdits) -> Vec<BakedVoxel> {
    let mut voxels: Vec<BakedVoxel> = edits
        .iter()
        .map(|(pos, edit)| BakedVoxel {
            pos: pos.to_array(),
            block: edit.block,
            collidable: edit.collidable,
        })
        .collect();
    voxels.sort_by_key(|v| (v.pos[1], v.pos[2], v.pos[0]));
    voxels
}

impl BakedStructures {
    pub fn new(seed: u32) -> Self {
        Self {
            version: BAKED_STRUCTURES_VERSION,
            seed,
            structures: Vec::new(),
            stamps: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, String> {
        bincode::serialize(self).map_err(|e| format!("bincode serialize failed: {e}"))
    }
}

/// Load baked structures from bytes (bincode).
pub fn load_baked_structures_from_bytes(bytes: &[u8]) -> Result<BakedStructures, String> {
    let baked: BakedStructures =
        bincode::deserialize(bytes).map_err(|e| format!("bincode deserialize failed: {e}"))?;
    if baked.version != BAKED_STRUCTURES_VERSION {
        return Err(format!(
            "Unsupported BakedStructures version {} (expected {})",
            baked.version, BAKED_STRUCTURES_VERSION
        ));
    }
    Ok(baked)
}

/// Load baked structures from a file path (bincode).
pub fn load_baked_structures_from_file(path: impl AsRef<Path>) -> Result<BakedStructures, String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| format!("failed to read {path:?}: {e}"))?;
    load_baked_structures_from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::{StructureShape, StructureSize};
    use crate::voxel::BlockSink;
    use bevy::prelude::IVec3;

    #[test]
    fn test_bake_voxels_sorted() {
        let mut edits = VoxelEdits::new();
        edits.add_block(IVec3::new(1, 5, 0), Some(BlockKind::Stone), true);
        edits.add_block(IVec3::new(0, 2, 0), None, false);
        let voxels = bake_voxels(&edits);
        assert_eq!(voxels[0].pos, [0, 2, 0]);
        assert_eq!(voxels[0].block, None);
        assert_eq!(voxels[1].pos, [1, 5, 0]);
    }

    #[test]
    fn test_rejects_other_versions() {
        let mut baked = BakedStructures::new(7);
        baked.structures.push(BakedStructure {
            name: "gate".to_string(),
            spec: StructureSpec {
                world_x: 1,
                world_z: 2,
                size: StructureSize::Small,
                shape: StructureShape::Circle,
                buried: false,
            },
            base_y: 9,
            voxels: Vec::new(),
            treasures: vec![[1, 10, 2]],
        });
        baked.stamps.push(BakedStamp {
            name: "ditch".to_string(),
            kind: "trench".to_string(),
            origin: [4, 11, 4],
            voxels: vec![BakedVoxel {
                pos: [4, 10, 4],
                block: None,
                collidable: false,
            }],
        });
        let bytes = baked.to_bytes().unwrap();
        assert_eq!(load_baked_structures_from_bytes(&bytes).unwrap(), baked);

        baked.version = 99;
        let bytes = baked.to_bytes().unwrap();
        let err = load_baked_structures_from_bytes(&bytes).unwrap_err();
        assert!(err.contains("99"));
        assert!(load_baked_structures_from_bytes(&[1, 2, 3]).is_err());
    }
}
