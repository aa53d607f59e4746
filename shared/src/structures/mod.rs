//! Procedural ruins - ruins, buried vaults and walled compounds left in the voxel world.
//!
//! Placement is decided per chunk from seeded noise ([`placement`]), the outline of
//! each ruin comes from its shape ([`footprint`]), and [`materialize`] stamps the
//! voxels through the caller's [`BlockSink`](crate::voxel::BlockSink).

pub mod footprint;
pub mod materialize;
pub mod placement;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::hash_noise::pick_weighted;
use crate::terrain::{ChunkCoord, CHUNK_SIZE};
use crate::voxel::{BlockSink, HeightSource};

pub use footprint::{is_boundary_cell, is_in_shape, is_on_shape_edge, Footprint};
pub use placement::StructureGenerator;

/// Fraction of chunks that roll a structure (~3%)
pub const STRUCTURE_FREQUENCY: f64 = 0.03;
/// Extra clearance kept between a structure origin and the nearest tree, in blocks
pub const TREE_CLEARANCE: f32 = 10.0;
/// Share of the top layer that keeps its ceiling
pub const CEILING_COVERAGE: f64 = 0.4;
/// Share of wall voxels that survive crumbling
pub const WALL_KEEP_CHANCE: f64 = 0.9;
/// Doorways are cut from local y = 1 up to this height
pub const DOORWAY_HEIGHT: i32 = 2;
/// Share of a buried structure's height sunk below the surface
pub const BURIED_FRACTION: f64 = 0.75;

/// Outer dimensions of a size class, in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureDimensions {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
}

/// Footprint/height class of a ruin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureSize {
    Small,
    Medium,
    Large,
    Colossal,
}

impl StructureSize {
    /// Iteration order of the rarity walk
    pub const ALL: [StructureSize; 4] = [
        StructureSize::Small,
        StructureSize::Medium,
        StructureSize::Large,
        StructureSize::Colossal,
    ];

    pub const fn dimensions(&self) -> StructureDimensions {
        match self {
            StructureSize::Small => StructureDimensions { width: 5, height: 4, depth: 5 },
            StructureSize::Medium => StructureDimensions { width: 9, height: 6, depth: 9 },
            StructureSize::Large => StructureDimensions { width: 15, height: 10, depth: 15 },
            StructureSize::Colossal => StructureDimensions { width: 25, height: 15, depth: 25 },
        }
    }

    pub const fn rarity(&self) -> f64 {
        match self {
            StructureSize::Small => 0.70,
            StructureSize::Medium => 0.20,
            StructureSize::Large => 0.08,
            StructureSize::Colossal => 0.02,
        }
    }

    pub const fn id(&self) -> &'static str {
        match self {
            StructureSize::Small => "small",
            StructureSize::Medium => "medium",
            StructureSize::Large => "large",
            StructureSize::Colossal => "colossal",
        }
    }

    /// Rarity-weighted pick for a `[0, 1)` roll.
    pub fn pick(roll: f64) -> Self {
        let table = Self::ALL.map(|s| (s, s.rarity()));
        pick_weighted(&table, roll).unwrap_or(StructureSize::Small)
    }
}

impl FromStr for StructureSize {
    type Err = StructureRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|size| size.id() == name)
            .ok_or_else(|| StructureRequestError::UnknownSize(s.to_string()))
    }
}

/// Footprint outline rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureShape {
    Square,
    Rectangle,
    LShape,
    TShape,
    Cross,
    UShape,
    Circle,
}

impl StructureShape {
    /// Iteration order of the rarity walk
    pub const ALL: [StructureShape; 7] = [
        StructureShape::Square,
        StructureShape::Rectangle,
        StructureShape::LShape,
        StructureShape::TShape,
        StructureShape::Cross,
        StructureShape::UShape,
        StructureShape::Circle,
    ];

    pub const fn rarity(&self) -> f64 {
        match self {
            StructureShape::Square => 0.30,
            StructureShape::Rectangle => 0.20,
            StructureShape::LShape => 0.15,
            StructureShape::TShape => 0.10,
            StructureShape::Cross => 0.10,
            StructureShape::UShape => 0.10,
            StructureShape::Circle => 0.05,
        }
    }

    pub const fn id(&self) -> &'static str {
        match self {
            StructureShape::Square => "square",
            StructureShape::Rectangle => "rectangle",
            StructureShape::LShape => "lshape",
            StructureShape::TShape => "tshape",
            StructureShape::Cross => "cross",
            StructureShape::UShape => "ushape",
            StructureShape::Circle => "circle",
        }
    }

    /// Shapes whose edge is found with the generic neighbour test
    pub const fn is_composite(&self) -> bool {
        matches!(
            self,
            StructureShape::LShape | StructureShape::TShape | StructureShape::Cross | StructureShape::UShape
        )
    }

    /// Rarity-weighted pick for a `[0, 1)` roll.
    pub fn pick(roll: f64) -> Self {
        let table = Self::ALL.map(|s| (s, s.rarity()));
        pick_weighted(&table, roll).unwrap_or(StructureShape::Square)
    }
}

impl FromStr for StructureShape {
    type Err = StructureRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace(['-', '_', ' '], "");
        Self::ALL
            .iter()
            .copied()
            .find(|shape| shape.id() == name)
            .ok_or_else(|| StructureRequestError::UnknownShape(s.to_string()))
    }
}

/// Why a manual structure request was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureRequestError {
    UnknownSize(String),
    UnknownShape(String),
}

impl fmt::Display for StructureRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureRequestError::UnknownSize(name) => {
                let known: Vec<&str> = StructureSize::ALL.iter().map(|s| s.id()).collect();
                write!(f, "unknown structure size '{name}' (expected one of {})", known.join(", "))
            }
            StructureRequestError::UnknownShape(name) => {
                let known: Vec<&str> = StructureShape::ALL.iter().map(|s| s.id()).collect();
                write!(f, "unknown structure shape '{name}' (expected one of {})", known.join(", "))
            }
        }
    }
}

impl std::error::Error for StructureRequestError {}

/// One ruin, decided for a chunk (or requested by hand).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureSpec {
    pub world_x: i32,
    pub world_z: i32,
    pub size: StructureSize,
    pub shape: StructureShape,
    pub buried: bool,
}

impl StructureSpec {
    pub fn dimensions(&self) -> StructureDimensions {
        self.size.dimensions()
    }

    pub fn footprint(&self) -> Footprint {
        let dims = self.dimensions();
        Footprint::new(self.shape, dims.width, dims.depth)
    }

    /// Chunk holding the origin column
    pub fn origin_chunk(&self) -> ChunkCoord {
        ChunkCoord::from_block(self.world_x, self.world_z)
    }

    /// Inclusive world-space column bounds of the footprint box
    pub fn column_bounds(&self) -> (IVec2, IVec2) {
        let fp = self.footprint();
        (
            IVec2::new(self.world_x - fp.half_width, self.world_z - fp.half_depth),
            IVec2::new(self.world_x + fp.half_width, self.world_z + fp.half_depth),
        )
    }

    /// Whether the footprint box overlaps a chunk's columns
    pub fn overlaps_chunk(&self, chunk: ChunkCoord) -> bool {
        let (min, max) = self.column_bounds();
        let origin = chunk.origin();
        let chunk_max = origin + IVec2::splat(CHUNK_SIZE - 1);
        min.x <= chunk_max.x && max.x >= origin.x && min.y <= chunk_max.y && max.y >= origin.y
    }
}

/// Entity placement delegated to the world. Every method defaults to a no-op.
pub trait StructureHooks {
    /// Treasure billboard resting on the floor
    fn place_treasure(&mut self, _pos: IVec3) {}
    fn spawn_friendly_ghost(&mut self, _pos: Vec3) {}
    fn spawn_hostile_ghost(&mut self, _pos: Vec3) {}
}

/// Hooks that just record what was requested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedSpawns {
    pub treasures: Vec<IVec3>,
    pub friendly_ghosts: Vec<Vec3>,
    pub hostile_ghosts: Vec<Vec3>,
}

impl CollectedSpawns {
    pub fn is_empty(&self) -> bool {
        self.treasures.is_empty() && self.friendly_ghosts.is_empty() && self.hostile_ghosts.is_empty()
    }
}

impl StructureHooks for CollectedSpawns {
    fn place_treasure(&mut self, pos: IVec3) {
        self.treasures.push(pos);
    }

    fn spawn_friendly_ghost(&mut self, pos: Vec3) {
        self.friendly_ghosts.push(pos);
    }

    fn spawn_hostile_ghost(&mut self, pos: Vec3) {
        self.hostile_ghosts.push(pos);
    }
}

/// Everything a materialization call writes to or reads from.
pub struct StructureContext<'a> {
    pub blocks: &'a mut dyn BlockSink,
    pub heights: &'a dyn HeightSource,
    pub hooks: Option<&'a mut dyn StructureHooks>,
    pub is_night: bool,
    /// Manual spawns build at the player's feet instead of the terrain surface
    pub player_y_override: Option<i32>,
}

impl<'a> StructureContext<'a> {
    pub fn new(blocks: &'a mut dyn BlockSink, heights: &'a dyn HeightSource) -> Self {
        Self {
            blocks,
            heights,
            hooks: None,
            is_night: false,
            player_y_override: None,
        }
    }

    pub fn with_hooks(mut self, hooks: &'a mut dyn StructureHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn at_night(mut self, is_night: bool) -> Self {
        self.is_night = is_night;
        self
    }

    pub fn with_player_y(mut self, y: i32) -> Self {
        self.player_y_override = Some(y);
        self
    }
}

/// What a materialization call produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedStructure {
    pub spec: StructureSpec,
    /// World y of the floor layer
    pub base_y: i32,
    pub blocks_placed: usize,
    pub treasures: Vec<IVec3>,
    pub friendly_ghosts: u32,
    pub hostile_ghosts: u32,
}
