//! Per-chunk structure decisions and the memo that keeps them stable.

use bevy::prelude::*;
use std::collections::HashMap;

use super::{StructureShape, StructureSize, StructureSpec};
use crate::config::GeneratorConfig;
use crate::hash_noise::{NoiseChannel, SeededNoise};
use crate::terrain::{ChunkCoord, CHUNK_SIZE};
use crate::trees::{TreeIndex, TreePosition};

/// Burial roll above which a ruin is sunk into the ground
const BURIAL_THRESHOLD: f64 = 0.75;

/// Owns everything structure generation needs to stay deterministic: the seed,
/// the decision memo and the trees structures must keep away from.
#[derive(Resource, Debug, Clone)]
pub struct StructureGenerator {
    pub(super) config: GeneratorConfig,
    pub(super) noise: SeededNoise,
    /// `None` entries are remembered rejections
    decisions: HashMap<ChunkCoord, Option<StructureSpec>>,
    trees: TreeIndex,
}

impl Default for StructureGenerator {
    fn default() -> Self {
        Self::with_config(GeneratorConfig::default())
    }
}

impl StructureGenerator {
    pub fn new(seed: u32) -> Self {
        Self::with_config(GeneratorConfig::with_seed(seed))
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Self {
            noise: SeededNoise::new(config.seed),
            config,
            decisions: HashMap::new(),
            trees: TreeIndex::new(),
        }
    }

    pub fn seed(&self) -> u32 {
        self.noise.seed()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn noise(&self) -> &SeededNoise {
        &self.noise
    }

    /// Register a tree. Only decisions made afterwards see it.
    pub fn record_tree(&mut self, tree: TreePosition) {
        self.trees.insert(tree);
    }

    pub fn record_trees(&mut self, trees: impl IntoIterator<Item = TreePosition>) {
        self.trees.extend(trees);
    }

    pub fn trees(&self) -> &TreeIndex {
        &self.trees
    }

    /// What this chunk would hold if its presence roll succeeded and no tree
    /// was in the way. Pure in `(chunk, seed)`.
    pub fn candidate_for(&self, chunk: ChunkCoord) -> StructureSpec {
        let (cx, cz) = (chunk.x as f64, chunk.z as f64);
        let noise = &self.noise;

        let size = StructureSize::pick(noise.channel(NoiseChannel::SIZE, cx, cz));
        let shape = StructureShape::pick(noise.channel(NoiseChannel::SHAPE, cx, cz));
        let buried = noise.channel(NoiseChannel::BURIAL, cx, cz) > BURIAL_THRESHOLD;

        let offset = |channel: NoiseChannel| {
            let roll = noise.channel(channel, cx, cz);
            ((roll * CHUNK_SIZE as f64).floor() as i32).clamp(0, CHUNK_SIZE - 1)
        };
        let origin = chunk.origin();

        StructureSpec {
            world_x: origin.x + offset(NoiseChannel::OFFSET_X),
            world_z: origin.y + offset(NoiseChannel::OFFSET_Z),
            size,
            shape,
            buried,
        }
    }

    /// Presence roll only
    pub fn rolls_structure(&self, chunk: ChunkCoord) -> bool {
        let roll = self.noise.channel(NoiseChannel::PRESENCE, chunk.x as f64, chunk.z as f64);
        roll >= 1.0 - self.config.structure_frequency
    }

    /// Radius around a structure origin that must be free of trees.
    pub fn clearance_radius(&self, size: StructureSize) -> f32 {
        let dims = size.dimensions();
        dims.width.max(dims.depth) as f32 / 2.0 + self.config.tree_clearance
    }

    /// Whether a known tree blocks `spec`.
    pub fn collides_with_trees(&self, spec: &StructureSpec) -> bool {
        let center = Vec2::new(spec.world_x as f32, spec.world_z as f32);
        self.trees.any_within(center, self.clearance_radius(spec.size))
    }

    /// The structure for a chunk, decided on first call and memoized forever.
    pub fn decide_structure(&mut self, chunk: ChunkCoord) -> Option<StructureSpec> {
        if let Some(decision) = self.decisions.get(&chunk) {
            return *decision;
        }

        let decision = if self.rolls_structure(chunk) {
            let spec = self.candidate_for(chunk);
            if self.collides_with_trees(&spec) {
                debug!(
                    "Structure in chunk ({}, {}) rejected: tree within {:.1} blocks",
                    chunk.x,
                    chunk.z,
                    self.clearance_radius(spec.size)
                );
                None
            } else {
                Some(spec)
            }
        } else {
            None
        };

        self.decisions.insert(chunk, decision);
        decision
    }

    /// Memoized decision without computing one. `None` = never asked.
    pub fn cached_decision(&self, chunk: ChunkCoord) -> Option<Option<StructureSpec>> {
        self.decisions.get(&chunk).copied()
    }

    /// Number of chunks decided so far (hits and misses)
    pub fn cached_decisions(&self) -> usize {
        self.decisions.len()
    }

    /// Structures from this chunk and its 8 neighbours whose footprint box
    /// reaches into `chunk`, sorted by origin chunk.
    pub fn structures_touching_chunk(&mut self, chunk: ChunkCoord) -> Vec<StructureSpec> {
        let mut found: Vec<StructureSpec> = chunk
            .neighborhood()
            .into_iter()
            .filter_map(|neighbor| self.decide_structure(neighbor))
            .filter(|spec| spec.overlaps_chunk(chunk))
            .collect();
        found.sort_by_key(|spec| spec.origin_chunk());
        found
    }
}
