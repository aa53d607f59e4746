//! Generator configuration.
//!
//! Defaults live in code; a RON file can override any subset of fields:
//!
//! ```ron
//! (
//!     seed: 54321,
//!     structure_frequency: 0.05,
//!     palettes: (entries: { "default": (materials: (Brick, Cobblestone, Gravel)) }),
//! )
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::blocks::PaletteTable;
use crate::structures::{CEILING_COVERAGE, STRUCTURE_FREQUENCY, TREE_CLEARANCE, WALL_KEEP_CHANCE};
use crate::terrain::WORLD_SEED;
use crate::voxel::FALLBACK_GROUND_HEIGHT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u32,
    /// Fraction of chunks that roll a structure
    pub structure_frequency: f64,
    /// Extra blocks added to half a structure's larger side to get the tree-free
    /// radius around its origin
    pub tree_clearance: f32,
    /// Ground height used when the terrain cannot be sampled
    pub fallback_ground_height: i32,
    pub ceiling_coverage: f64,
    pub wall_keep_chance: f64,
    pub palettes: PaletteTable,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: WORLD_SEED,
            structure_frequency: STRUCTURE_FREQUENCY,
            tree_clearance: TREE_CLEARANCE,
            fallback_ground_height: FALLBACK_GROUND_HEIGHT,
            ceiling_coverage: CEILING_COVERAGE,
            wall_keep_chance: WALL_KEEP_CHANCE,
            palettes: PaletteTable::builtin(),
        }
    }
}

impl GeneratorConfig {
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("structure_frequency", self.structure_frequency),
            ("ceiling_coverage", self.ceiling_coverage),
            ("wall_keep_chance", self.wall_keep_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within 0..=1 (got {value})"));
            }
        }
        if !self.tree_clearance.is_finite() || self.tree_clearance < 0.0 {
            return Err(format!(
                "tree_clearance must be a non-negative number (got {})",
                self.tree_clearance
            ));
        }
        if self.fallback_ground_height < 1 {
            return Err(format!(
                "fallback_ground_height must be at least 1 (got {})",
                self.fallback_ground_height
            ));
        }
        Ok(())
    }

    /// Parse and validate a RON document.
    pub fn from_ron_str(text: &str) -> Result<Self, String> {
        let config: GeneratorConfig =
            ron::from_str(text).map_err(|e| format!("ron parse failed: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a RON config from disk.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| format!("failed to read {path:?}: {e}"))?;
        Self::from_ron_str(&text).map_err(|e| format!("{path:?}: {e}"))
    }

    pub fn to_ron_string(&self) -> Result<String, String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| format!("ron serialize failed: {e}"))
    }
}
