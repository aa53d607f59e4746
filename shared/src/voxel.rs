//! World-side collaborators the generators write to and read from.
//!
//! Generators never own the voxel world. They push blocks through a [`BlockSink`]
//! and read terrain through a [`HeightSource`]; plain closures work for both.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::blocks::BlockKind;
use crate::terrain::MAX_TERRAIN_HEIGHT;

/// Receives placed voxels. `None` removes whatever is at `pos`.
/// Re-placing the same coordinate overwrites.
pub trait BlockSink {
    fn add_block(&mut self, pos: IVec3, block: Option<BlockKind>, collidable: bool);
}

impl<F> BlockSink for F
where
    F: FnMut(IVec3, Option<BlockKind>, bool),
{
    fn add_block(&mut self, pos: IVec3, block: Option<BlockKind>, collidable: bool) {
        self(pos, block, collidable)
    }
}

/// Terrain surface lookup. May return `None` or out-of-range values when the
/// column is unknown; callers fall back instead of trusting the value.
pub trait HeightSource {
    fn height_at(&self, x: i32, z: i32) -> Option<f32>;
}

impl<F> HeightSource for F
where
    F: Fn(i32, i32) -> Option<f32>,
{
    fn height_at(&self, x: i32, z: i32) -> Option<f32> {
        self(x, z)
    }
}

/// One recorded edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelEdit {
    /// `None` means the block was dug out
    pub block: Option<BlockKind>,
    pub collidable: bool,
}

/// Sparse map of generator edits layered over the procedural terrain.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct VoxelEdits {
    edits: HashMap<IVec3, VoxelEdit>,
}

impl VoxelEdits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pos: IVec3) -> Option<&VoxelEdit> {
        self.edits.get(&pos)
    }

    /// Placed (not removed) block at a position
    pub fn block_at(&self, pos: IVec3) -> Option<BlockKind> {
        self.edits.get(&pos).and_then(|e| e.block)
    }

    pub fn is_removed(&self, pos: IVec3) -> bool {
        matches!(self.edits.get(&pos), Some(VoxelEdit { block: None, .. }))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IVec3, &VoxelEdit)> {
        self.edits.iter()
    }

    /// Positions holding a placed block
    pub fn solid_positions(&self) -> impl Iterator<Item = IVec3> + '_ {
        self.edits
            .iter()
            .filter(|(_, e)| e.block.is_some())
            .map(|(p, _)| *p)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }
}

impl BlockSink for VoxelEdits {
    fn add_block(&mut self, pos: IVec3, block: Option<BlockKind>, collidable: bool) {
        self.edits.insert(pos, VoxelEdit { block, collidable });
    }
}

/// Distance of the retry samples when the centre column has no usable height
pub const GROUND_RETRY_OFFSET: i32 = 4;
/// Ground height assumed when no sample returns a usable value
pub const FALLBACK_GROUND_HEIGHT: i32 = 20;
/// Lowest y any generated block may occupy; y = 0 is bedrock
pub const WORLD_FLOOR_Y: i32 = 1;
/// Highest y a structure may be anchored at
pub const WORLD_CEILING_Y: i32 = 255;

/// Whether a sampled height can be trusted.
#[inline]
fn usable_height(value: Option<f32>) -> Option<i32> {
    let h = value?;
    if h.is_finite() && (0.0..=MAX_TERRAIN_HEIGHT as f32).contains(&h) {
        Some(h.floor() as i32)
    } else {
        None
    }
}

/// Ground height at a column, tolerant of missing or garbage samples.
///
/// Tries the column itself, then the four cardinal neighbours
/// [`GROUND_RETRY_OFFSET`] blocks away, then gives up and returns `fallback`.
pub fn resolve_ground_height(heights: &dyn HeightSource, x: i32, z: i32, fallback: i32) -> i32 {
    if let Some(h) = usable_height(heights.height_at(x, z)) {
        return h;
    }
    let o = GROUND_RETRY_OFFSET;
    let retried = [(o, 0), (-o, 0), (0, o), (0, -o)].iter().find_map(|&(dx, dz)| {
        usable_height(heights.height_at(x + dx, z + dz)).map(|h| (h, x + dx, z + dz))
    });

    match retried {
        Some((h, rx, rz)) => {
            debug!("No usable ground at ({}, {}), using ({}, {}) at y {}", x, z, rx, rz, h);
            h
        }
        None => {
            debug!("No usable ground around ({}, {}), falling back to y {}", x, z, fallback);
            fallback
        }
    }
}
