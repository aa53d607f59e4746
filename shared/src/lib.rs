//! Shared world generation used by the world host and the offline tools.
//!
//! Everything in here is deterministic in the world seed: terrain heights, biomes,
//! trees and ruins come out the same on every machine.

pub mod baked;
pub mod blocks;
pub mod components;
pub mod config;
pub mod hash_noise;
pub mod stamps;
pub mod structures;
pub mod terrain;
pub mod trees;
pub mod voxel;

pub use blocks::{BlockKind, BlockPalette, PaletteTable};
pub use components::{Ghost, GhostKind, Ruin, Treasure, WorldTime};
pub use config::GeneratorConfig;
pub use hash_noise::{NoiseChannel, SeededNoise};
pub use structures::{
    CollectedSpawns, PlacedStructure, StructureContext, StructureGenerator, StructureHooks, StructureRequestError,
    StructureShape, StructureSize, StructureSpec,
};
pub use terrain::{Biome, ChunkCoord, TerrainGenerator, WorldTerrain, CHUNK_SIZE, WORLD_SEED};
pub use trees::{generate_chunk_trees, TreeIndex, TreeKind, TreePosition};
pub use voxel::{resolve_ground_height, BlockSink, HeightSource, VoxelEdit, VoxelEdits};

/// World-host simulation rate
pub const FIXED_TIMESTEP_HZ: f64 = 60.0;
