//! World snapshot persistence - disk I/O for built worlds
//!
//! A snapshot holds every voxel edit, ruin and tree the host generated, serialized
//! with bincode. Uses atomic writes (temp file + rename) to prevent corruption.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use shared::baked::{bake_voxels, BakedVoxel};
use shared::{PlacedStructure, StructureSpec, TreePosition, VoxelEdits};

pub const SNAPSHOT_VERSION: u32 = 1;

/// What one ruin left behind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuinRecord {
    pub spec: StructureSpec,
    pub base_y: i32,
    pub treasures: Vec<[i32; 3]>,
    pub friendly_ghosts: u32,
    pub hostile_ghosts: u32,
}

impl From<&PlacedStructure> for RuinRecord {
    fn from(placed: &PlacedStructure) -> Self {
        Self {
            spec: placed.spec,
            base_y: placed.base_y,
            treasures: placed.treasures.iter().map(|t| t.to_array()).collect(),
            friendly_ghosts: placed.friendly_ghosts,
            hostile_ghosts: placed.hostile_ghosts,
        }
    }
}

/// Everything needed to restore a generated world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub version: u32,
    pub seed: u32,
    /// Chunk radius around spawn that was built
    pub radius: i32,
    pub voxels: Vec<BakedVoxel>,
    pub ruins: Vec<RuinRecord>,
    pub trees: Vec<TreePosition>,
}

impl WorldSnapshot {
    pub fn capture(seed: u32, radius: i32, edits: &VoxelEdits, ruins: &[RuinRecord], trees: &[TreePosition]) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            seed,
            radius,
            voxels: bake_voxels(edits),
            ruins: ruins.to_vec(),
            trees: trees.to_vec(),
        }
    }
}

/// Save a snapshot to disk (atomic write via temp file)
pub fn save_snapshot(snapshot: &WorldSnapshot, path: &Path) -> Result<(), String> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    }
    let temp_path = path.with_extension("tmp");

    // Serialize
    let bytes = bincode::serialize(snapshot)
        .map_err(|e| format!("Serialize error: {}", e))?;

    // Write to temp file
    std::fs::write(&temp_path, &bytes)
        .map_err(|e| format!("Write temp file error: {}", e))?;

    // Atomic rename
    std::fs::rename(&temp_path, path)
        .map_err(|e| format!("Rename error: {}", e))?;

    info!("Saved world snapshot to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Load a snapshot from disk
///
/// Returns:
/// - Ok(snapshot) if the file exists and is valid
/// - Err(message) if it is missing, corrupted or from another version
pub fn load_snapshot(path: &Path) -> Result<WorldSnapshot, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let snapshot: WorldSnapshot = bincode::deserialize(&bytes)
        .map_err(|e| format!("Failed to deserialize {}: {}", path.display(), e))?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(format!(
            "Snapshot version mismatch: found v{}, expected v{}",
            snapshot.version, SNAPSHOT_VERSION
        ));
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{BlockKind, BlockSink, StructureShape, StructureSize, TreeKind};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ruin_snapshot_{}_{}.bin", name, std::process::id()))
    }

    fn sample_snapshot() -> WorldSnapshot {
        let mut edits = VoxelEdits::new();
        edits.add_block(IVec3::new(3, 9, -2), Some(BlockKind::StoneBrick), true);
        edits.add_block(IVec3::new(3, 10, -2), None, false);
        let ruin = RuinRecord {
            spec: StructureSpec {
                world_x: 3,
                world_z: -2,
                size: StructureSize::Small,
                shape: StructureShape::Square,
                buried: false,
            },
            base_y: 9,
            treasures: vec![[3, 10, -2]],
            friendly_ghosts: 1,
            hostile_ghosts: 0,
        };
        WorldSnapshot::capture(12345, 2, &edits, &[ruin], &[TreePosition::new(40.0, 40.0, TreeKind::Oak)])
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let snapshot = sample_snapshot();
        save_snapshot(&snapshot, &path).unwrap();
        assert!(!path.with_extension("tmp").exists());
        assert_eq!(load_snapshot(&path).unwrap(), snapshot);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_other_versions() {
        let path = temp_path("version");
        let mut snapshot = sample_snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;
        save_snapshot(&snapshot, &path).unwrap();
        let err = load_snapshot(&path).unwrap_err();
        assert!(err.contains("version mismatch"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_snapshot(&temp_path("missing")).unwrap_err();
        assert!(err.contains("Failed to read"));
    }
}
