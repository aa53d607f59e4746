//! Procedural voxel terrain heights and biomes.
//! Uses deterministic noise so every host generates identical terrain from seed.
//!
//! Scale: 1 unit = 1 block
//! - Chunks are 16 x 16 block columns
//! - Surface heights stay within 1..=MAX_TERRAIN_HEIGHT

use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::voxel::HeightSource;

/// World generation seed - same seed = same world
pub const WORLD_SEED: u32 = 12345;

/// Chunk size in blocks (both X and Z)
pub const CHUNK_SIZE: i32 = 16;

/// Highest valid terrain surface. Heights above this are treated as unknown.
pub const MAX_TERRAIN_HEIGHT: i32 = 64;
/// Sea-level-ish baseline the biome profiles are built on
pub const BASE_HEIGHT: f32 = 16.0;

/// Biome types available in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Plains,
    Forest,
    Desert,
    Snowy,
    Swamp,
    Mountains,
}

impl Biome {
    pub const ALL: [Biome; 6] = [
        Biome::Plains,
        Biome::Forest,
        Biome::Desert,
        Biome::Snowy,
        Biome::Swamp,
        Biome::Mountains,
    ];

    /// Stable name used for palette lookup and manifests
    pub const fn name(&self) -> &'static str {
        match self {
            Biome::Plains => "plains",
            Biome::Forest => "forest",
            Biome::Desert => "desert",
            Biome::Snowy => "snowy",
            Biome::Swamp => "swamp",
            Biome::Mountains => "mountains",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }

    /// Block placed on the surface of a column in this biome
    pub const fn surface_block(&self) -> crate::blocks::BlockKind {
        use crate::blocks::BlockKind;
        match self {
            Biome::Desert => BlockKind::Sand,
            Biome::Snowy => BlockKind::Snow,
            Biome::Mountains => BlockKind::Stone,
            Biome::Swamp => BlockKind::Dirt,
            Biome::Plains | Biome::Forest => BlockKind::Grass,
        }
    }
}

/// Chunk coordinate (integer grid position)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Component, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a world block column
    pub fn from_block(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(CHUNK_SIZE),
            z: z.div_euclid(CHUNK_SIZE),
        }
    }

    /// World block coordinates of the chunk's corner (min x, min z)
    pub fn origin(&self) -> IVec2 {
        IVec2::new(self.x * CHUNK_SIZE, self.z * CHUNK_SIZE)
    }

    /// Whether a world block column lies inside this chunk
    #[inline]
    pub fn contains_column(&self, x: i32, z: i32) -> bool {
        Self::from_block(x, z) == *self
    }

    /// Get chunks in a radius around this chunk
    pub fn chunks_in_radius(&self, radius: i32) -> Vec<ChunkCoord> {
        let mut chunks = Vec::new();
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                chunks.push(ChunkCoord::new(self.x + dx, self.z + dz));
            }
        }
        chunks
    }

    /// This chunk and its 8 neighbours
    pub fn neighborhood(&self) -> Vec<ChunkCoord> {
        self.chunks_in_radius(1)
    }
}

/// Terrain generator using Perlin noise
pub struct TerrainGenerator {
    height_noise: Perlin,
    temperature_noise: Perlin,
    moisture_noise: Perlin,
    ridge_noise: Perlin,
    detail_noise: Perlin,
    seed: u32,
}

impl TerrainGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            height_noise: Perlin::new(seed),
            temperature_noise: Perlin::new(seed.wrapping_add(1000)),
            moisture_noise: Perlin::new(seed.wrapping_add(1500)),
            ridge_noise: Perlin::new(seed.wrapping_add(2000)),
            detail_noise: Perlin::new(seed.wrapping_add(3000)),
            seed,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    fn temperature(&self, x: f32, z: f32) -> f32 {
        let scale = 0.004;
        self.temperature_noise.get([x as f64 * scale, z as f64 * scale]) as f32
    }

    fn moisture(&self, x: f32, z: f32) -> f32 {
        let scale = 0.005;
        self.moisture_noise.get([x as f64 * scale + 50.0, z as f64 * scale + 50.0]) as f32
    }

    /// 0 on lowlands, rising towards 1 on mountain ridges
    fn ridge_factor(&self, x: f32, z: f32) -> f32 {
        let scale = 0.006;
        let ridge = self.ridge_noise.get([x as f64 * scale, z as f64 * scale]) as f32;
        let t = ((ridge - 0.35) / 0.3).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }

    /// Get the biome at a world block column
    pub fn get_biome(&self, x: i32, z: i32) -> Biome {
        let (fx, fz) = (x as f32, z as f32);
        if self.ridge_factor(fx, fz) > 0.5 {
            return Biome::Mountains;
        }

        let temperature = self.temperature(fx, fz);
        let moisture = self.moisture(fx, fz);

        if temperature < -0.35 {
            Biome::Snowy
        } else if temperature > 0.35 && moisture < 0.0 {
            Biome::Desert
        } else if moisture > 0.45 {
            Biome::Swamp
        } else if moisture > 0.1 {
            Biome::Forest
        } else {
            Biome::Plains
        }
    }

    /// Surface height (top solid block) at a world block column.
    /// Mountain ridges blend in with a smoothstep so biome borders do not form cliffs.
    pub fn get_height(&self, x: i32, z: i32) -> i32 {
        let (fx, fz) = (x as f32, z as f32);

        // Broad rolling base shared by every biome
        let base_scale = 0.01;
        let base = self.height_noise.get([fx as f64 * base_scale, fz as f64 * base_scale]) as f32 * 6.0;

        // Small bumps
        let detail_scale = 0.08;
        let detail = self.detail_noise.get([fx as f64 * detail_scale, fz as f64 * detail_scale]) as f32 * 1.5;

        let moisture = self.moisture(fx, fz);
        // Swamps sink, dry land rises a little
        let wetness = -moisture.clamp(-0.5, 0.8) * 4.0;

        let ridge = self.ridge_factor(fx, fz);
        let peaks = self.ridge_noise.get([fx as f64 * 0.03 + 400.0, fz as f64 * 0.03 + 400.0]) as f32;
        let mountain = ridge * (18.0 + peaks.abs() * 20.0);

        let height = BASE_HEIGHT + base + detail + wetness + mountain;
        (height.round() as i32).clamp(1, MAX_TERRAIN_HEIGHT - 4)
    }
}

impl HeightSource for TerrainGenerator {
    fn height_at(&self, x: i32, z: i32) -> Option<f32> {
        Some(self.get_height(x, z) as f32)
    }
}

/// Resource holding the terrain generator
#[derive(Resource)]
pub struct WorldTerrain {
    pub generator: TerrainGenerator,
}

impl WorldTerrain {
    pub fn new(seed: u32) -> Self {
        Self {
            generator: TerrainGenerator::new(seed),
        }
    }
}

impl Default for WorldTerrain {
    fn default() -> Self {
        Self::new(WORLD_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_from_block_negative() {
        assert_eq!(ChunkCoord::from_block(0, 0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_block(15, 15), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_block(16, -1), ChunkCoord::new(1, -1));
        assert_eq!(ChunkCoord::from_block(-16, -17), ChunkCoord::new(-1, -2));
        assert!(ChunkCoord::new(-1, 0).contains_column(-1, 3));
        assert!(!ChunkCoord::new(-1, 0).contains_column(0, 3));
    }

    #[test]
    fn test_neighborhood_is_three_by_three() {
        let around = ChunkCoord::new(4, -2).neighborhood();
        assert_eq!(around.len(), 9);
        assert!(around.contains(&ChunkCoord::new(3, -3)));
        assert!(around.contains(&ChunkCoord::new(5, -1)));
    }

    #[test]
    fn test_heights_in_valid_range() {
        let terrain = TerrainGenerator::new(WORLD_SEED);
        for x in (-400..400).step_by(7) {
            for z in (-400..400).step_by(11) {
                let h = terrain.get_height(x, z);
                assert!(h >= 1 && h <= MAX_TERRAIN_HEIGHT, "height {h} at ({x}, {z})");
            }
        }
    }

    #[test]
    fn test_terrain_is_deterministic() {
        let a = TerrainGenerator::new(99);
        let b = TerrainGenerator::new(99);
        for i in -50..50 {
            assert_eq!(a.get_height(i * 13, i * 7), b.get_height(i * 13, i * 7));
            assert_eq!(a.get_biome(i * 13, i * 7), b.get_biome(i * 13, i * 7));
        }
    }

    #[test]
    fn test_biome_names_round_trip() {
        for biome in Biome::ALL {
            assert_eq!(Biome::from_name(biome.name()), Some(biome));
        }
        assert_eq!(Biome::from_name(" Desert "), Some(Biome::Desert));
        assert_eq!(Biome::from_name("lava"), None);
    }
}
