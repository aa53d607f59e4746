//! Seeded sine-hash noise for structure decisions.
//!
//! Every structure roll is a pure function of integer coordinates and the world seed,
//! so two generators with the same seed always agree. Independent decisions read
//! different [`NoiseChannel`]s, which keeps them decorrelated even though they are
//! keyed by the same chunk coordinates.

use serde::{Deserialize, Serialize};

const HASH_A: f64 = 12.9898;
const HASH_B: f64 = 78.233;
const HASH_SCALE: f64 = 43758.5453;

/// Scale/offset applied to both inputs before hashing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseChannel {
    pub scale_a: f64,
    pub scale_b: f64,
    pub offset_a: f64,
    pub offset_b: f64,
}

impl NoiseChannel {
    /// Does this chunk get a structure at all
    pub const PRESENCE: Self = Self::new(1.0, 1.0, 0.0, 0.0);
    pub const SIZE: Self = Self::new(1.7, 2.3, 101.0, 59.0);
    pub const SHAPE: Self = Self::new(2.9, 1.3, 211.0, 149.0);
    pub const BURIAL: Self = Self::new(3.7, 4.1, 307.0, 263.0);
    pub const OFFSET_X: Self = Self::new(5.3, 0.7, 401.0, 353.0);
    pub const OFFSET_Z: Self = Self::new(0.9, 6.1, 503.0, 449.0);
    /// How far an unburied ruin settles into the ground (1-2 blocks)
    pub const SETTLE: Self = Self::new(0.37, 0.53, 601.0, 557.0);
    pub const CEILING: Self = Self::new(1.1, 0.9, 701.0, 653.0);
    pub const CRUMBLE: Self = Self::new(0.83, 1.19, 809.0, 757.0);
    pub const MATERIAL: Self = Self::new(1.31, 0.77, 907.0, 859.0);
    pub const TREASURE: Self = Self::new(2.17, 1.63, 1009.0, 953.0);
    pub const GHOST: Self = Self::new(0.61, 0.47, 1103.0, 1051.0);
    pub const RUBBLE: Self = Self::new(1.45, 1.85, 1201.0, 1153.0);

    pub const fn new(scale_a: f64, scale_b: f64, offset_a: f64, offset_b: f64) -> Self {
        Self {
            scale_a,
            scale_b,
            offset_a,
            offset_b,
        }
    }
}

/// Deterministic `[0, 1)` noise keyed by a world seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeededNoise {
    seed: u32,
}

impl SeededNoise {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// `frac(sin(a * 12.9898 + b * 78.233 + seed) * 43758.5453)`.
    #[inline]
    pub fn sample(&self, a: f64, b: f64) -> f64 {
        let v = (a * HASH_A + b * HASH_B + self.seed as f64).sin() * HASH_SCALE;
        let f = v - v.floor();
        // `v - floor(v)` can round up to exactly 1.0 for tiny negative v
        if f >= 1.0 {
            0.0
        } else {
            f
        }
    }

    /// Sample a named channel at 2D integer-ish coordinates.
    #[inline]
    pub fn channel(&self, channel: NoiseChannel, a: f64, b: f64) -> f64 {
        self.sample(
            a * channel.scale_a + channel.offset_a,
            b * channel.scale_b + channel.offset_b,
        )
    }

    /// Per-voxel sample; the height is folded into both horizontal inputs.
    #[inline]
    pub fn voxel(&self, channel: NoiseChannel, x: i32, y: i32, z: i32) -> f64 {
        self.channel(
            channel,
            x as f64 + y as f64 * 0.618,
            z as f64 - y as f64 * 1.414,
        )
    }

    /// The `index`-th draw of a channel at a fixed position (treasure #i, ghost #i, ...).
    #[inline]
    pub fn indexed(&self, channel: NoiseChannel, a: i32, b: i32, index: u32) -> f64 {
        self.channel(
            channel,
            a as f64 + index as f64 * 17.0,
            b as f64 - index as f64 * 13.0,
        )
    }
}

/// Walk `table` in order, accumulating weights, and return the first entry whose
/// cumulative weight exceeds `roll`. Falls back to the last entry when rounding
/// leaves the total just under `roll`.
pub fn pick_weighted<T: Copy>(table: &[(T, f64)], roll: f64) -> Option<T> {
    let mut cumulative = 0.0;
    for &(value, weight) in table {
        cumulative += weight;
        if roll < cumulative {
            return Some(value);
        }
    }
    table.last().map(|&(value, _)| value)
}
