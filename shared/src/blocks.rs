//! Voxel materials and biome palettes for generated structures.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::hash_noise::pick_weighted;
use crate::terrain::Biome;

/// Voxel materials the generators can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Stone,
    Cobblestone,
    MossyCobblestone,
    StoneBrick,
    CrackedStoneBrick,
    Sandstone,
    SmoothSandstone,
    ChiseledSandstone,
    Snow,
    PackedIce,
    Ice,
    OakPlanks,
    SprucePlanks,
    OakLog,
    Brick,
    Dirt,
    Grass,
    Sand,
    Gravel,
    Glass,
}

impl BlockKind {
    /// Stable string id used by manifests and snapshots.
    pub const fn id(&self) -> &'static str {
        match self {
            BlockKind::Stone => "stone",
            BlockKind::Cobblestone => "cobblestone",
            BlockKind::MossyCobblestone => "mossy_cobblestone",
            BlockKind::StoneBrick => "stone_brick",
            BlockKind::CrackedStoneBrick => "cracked_stone_brick",
            BlockKind::Sandstone => "sandstone",
            BlockKind::SmoothSandstone => "smooth_sandstone",
            BlockKind::ChiseledSandstone => "chiseled_sandstone",
            BlockKind::Snow => "snow",
            BlockKind::PackedIce => "packed_ice",
            BlockKind::Ice => "ice",
            BlockKind::OakPlanks => "oak_planks",
            BlockKind::SprucePlanks => "spruce_planks",
            BlockKind::OakLog => "oak_log",
            BlockKind::Brick => "brick",
            BlockKind::Dirt => "dirt",
            BlockKind::Grass => "grass",
            BlockKind::Sand => "sand",
            BlockKind::Gravel => "gravel",
            BlockKind::Glass => "glass",
        }
    }

    /// Players can walk through these
    pub const fn is_collidable(&self) -> bool {
        !matches!(self, BlockKind::Snow)
    }
}

/// Draw weights for the three palette slots (primary, secondary, accent).
pub const PALETTE_WEIGHTS: [f64; 3] = [0.60, 0.25, 0.15];

/// Key of the fallback palette in a [`PaletteTable`].
pub const DEFAULT_PALETTE_KEY: &str = "default";

/// Three materials drawn 60/25/15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPalette {
    pub materials: [BlockKind; 3],
}

impl BlockPalette {
    pub const DEFAULT: Self = Self::new(
        BlockKind::StoneBrick,
        BlockKind::Cobblestone,
        BlockKind::MossyCobblestone,
    );

    pub const fn new(primary: BlockKind, secondary: BlockKind, accent: BlockKind) -> Self {
        Self {
            materials: [primary, secondary, accent],
        }
    }

    /// Built-in palette for a biome.
    pub fn for_biome(biome: Biome) -> Self {
        match biome {
            Biome::Plains => Self::new(
                BlockKind::Cobblestone,
                BlockKind::StoneBrick,
                BlockKind::CrackedStoneBrick,
            ),
            Biome::Forest => Self::new(
                BlockKind::MossyCobblestone,
                BlockKind::Cobblestone,
                BlockKind::OakLog,
            ),
            Biome::Desert => Self::new(
                BlockKind::Sandstone,
                BlockKind::SmoothSandstone,
                BlockKind::ChiseledSandstone,
            ),
            Biome::Snowy => Self::new(BlockKind::PackedIce, BlockKind::Snow, BlockKind::Ice),
            Biome::Swamp => Self::new(
                BlockKind::MossyCobblestone,
                BlockKind::Dirt,
                BlockKind::SprucePlanks,
            ),
            Biome::Mountains => Self::new(
                BlockKind::Stone,
                BlockKind::CrackedStoneBrick,
                BlockKind::Gravel,
            ),
        }
    }

    /// Weighted draw for a `[0, 1)` roll.
    pub fn pick(&self, roll: f64) -> BlockKind {
        let table = [
            (self.materials[0], PALETTE_WEIGHTS[0]),
            (self.materials[1], PALETTE_WEIGHTS[1]),
            (self.materials[2], PALETTE_WEIGHTS[2]),
        ];
        pick_weighted(&table, roll).unwrap_or(self.materials[0])
    }
}

/// Palettes keyed by biome name, with a `default` fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteTable {
    pub entries: HashMap<String, BlockPalette>,
}

impl PaletteTable {
    /// Built-in palettes for every biome plus the fallback.
    pub fn builtin() -> Self {
        let mut entries: HashMap<String, BlockPalette> = Biome::ALL
            .iter()
            .map(|b| (b.name().to_string(), BlockPalette::for_biome(*b)))
            .collect();
        entries.insert(DEFAULT_PALETTE_KEY.to_string(), BlockPalette::DEFAULT);
        Self { entries }
    }

    /// Palette for a biome name, ignoring case; unknown names use `default`.
    pub fn get(&self, biome_name: &str) -> BlockPalette {
        let key = biome_name.trim().to_lowercase();
        self.entries
            .get(&key)
            .or_else(|| {
                self.entries
                    .iter()
                    .filter(|(name, _)| name.trim().to_lowercase() == key)
                    .min_by(|a, b| a.0.cmp(b.0))
                    .map(|(_, palette)| palette)
            })
            .or_else(|| self.entries.get(DEFAULT_PALETTE_KEY))
            .copied()
            .unwrap_or(BlockPalette::DEFAULT)
    }

    pub fn for_biome(&self, biome: Biome) -> BlockPalette {
        self.get(biome.name())
    }
}

impl Default for PaletteTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_weights_sum_to_one() {
        let total: f64 = PALETTE_WEIGHTS.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_palette_pick_boundaries() {
        let palette = BlockPalette::for_biome(Biome::Desert);
        assert_eq!(palette.pick(0.0), BlockKind::Sandstone);
        assert_eq!(palette.pick(0.59), BlockKind::Sandstone);
        assert_eq!(palette.pick(0.60), BlockKind::SmoothSandstone);
        assert_eq!(palette.pick(0.84), BlockKind::SmoothSandstone);
        assert_eq!(palette.pick(0.86), BlockKind::ChiseledSandstone);
        assert_eq!(palette.pick(0.9999), BlockKind::ChiseledSandstone);
    }

    #[test]
    fn test_unknown_biome_falls_back_to_default() {
        let table = PaletteTable::builtin();
        assert_eq!(table.get("volcanic_wasteland"), BlockPalette::DEFAULT);
        assert_eq!(table.get("snowy"), BlockPalette::for_biome(Biome::Snowy));
    }

    #[test]
    fn test_palette_lookup_ignores_case() {
        let table = PaletteTable::builtin();
        let desert = BlockPalette::for_biome(Biome::Desert);
        assert_eq!(table.get("Desert"), desert);
        assert_eq!(table.get(" DESERT "), desert);

        // Keys written with capitals in a config file still match
        let mut custom = PaletteTable::builtin();
        let swamp = BlockPalette::for_biome(Biome::Swamp);
        custom.entries.insert("Tundra".to_string(), swamp);
        assert_eq!(custom.get("tundra"), swamp);
    }

    #[test]
    fn test_missing_default_still_resolves() {
        let table = PaletteTable {
            entries: HashMap::new(),
        };
        assert_eq!(table.get("desert"), BlockPalette::DEFAULT);
    }
}
