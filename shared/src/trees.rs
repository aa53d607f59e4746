//! Deterministic tree placement and the tree registry structures avoid.
//!
//! Trees are scattered per chunk from Perlin density, the same way for every host.
//! The registry is a spatial hash so collision checks against structure candidates
//! only look at nearby cells instead of every tree in the world.

use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::terrain::{Biome, ChunkCoord, TerrainGenerator, CHUNK_SIZE};

/// Size of each spatial grid cell in blocks.
pub const TREE_CELL_SIZE: f32 = 16.0;

/// Spacing of the tree candidate grid inside a chunk
const TREE_GRID_SPACING: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeKind {
    Oak,
    Birch,
    Pine,
    Palm,
    Dead,
}

impl TreeKind {
    pub const fn id(&self) -> &'static str {
        match self {
            TreeKind::Oak => "oak",
            TreeKind::Birch => "birch",
            TreeKind::Pine => "pine",
            TreeKind::Palm => "palm",
            TreeKind::Dead => "dead",
        }
    }
}

/// A tree the world has placed, in world block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreePosition {
    pub x: f32,
    pub z: f32,
    pub kind: TreeKind,
}

impl TreePosition {
    pub fn new(x: f32, z: f32, kind: TreeKind) -> Self {
        Self { x, z, kind }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

/// Spatial hash of known trees.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    /// Map from grid cell (x, z) to indices into `trees`.
    cells: HashMap<(i32, i32), Vec<usize>>,
    trees: Vec<TreePosition>,
}

impl TreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn world_to_cell(pos: Vec2) -> (i32, i32) {
        (
            (pos.x / TREE_CELL_SIZE).floor() as i32,
            (pos.y / TREE_CELL_SIZE).floor() as i32,
        )
    }

    pub fn insert(&mut self, tree: TreePosition) {
        let cell = Self::world_to_cell(tree.position());
        let idx = self.trees.len();
        self.trees.push(tree);
        self.cells.entry(cell).or_default().push(idx);
    }

    pub fn extend(&mut self, trees: impl IntoIterator<Item = TreePosition>) {
        for tree in trees {
            self.insert(tree);
        }
    }

    /// Whether any tree lies within `radius` (inclusive) of `center`.
    pub fn any_within(&self, center: Vec2, radius: f32) -> bool {
        let min_cell = Self::world_to_cell(center - Vec2::splat(radius));
        let max_cell = Self::world_to_cell(center + Vec2::splat(radius));
        let radius_sq = radius * radius;

        for cx in min_cell.0..=max_cell.0 {
            for cz in min_cell.1..=max_cell.1 {
                let Some(indices) = self.cells.get(&(cx, cz)) else {
                    continue;
                };
                if indices
                    .iter()
                    .any(|&idx| self.trees[idx].position().distance_squared(center) <= radius_sq)
                {
                    return true;
                }
            }
        }
        false
    }

    pub fn trees(&self) -> &[TreePosition] {
        &self.trees
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

/// Deterministically generate the trees of one chunk.
pub fn generate_chunk_trees(terrain: &TerrainGenerator, chunk: ChunkCoord) -> Vec<TreePosition> {
    let mut out = Vec::new();

    let seed = terrain.seed();
    let placement_noise = Perlin::new(seed.wrapping_add(5000));
    let density_noise = Perlin::new(seed.wrapping_add(6000));
    let variety_noise = Perlin::new(seed.wrapping_add(7000));

    let origin = chunk.origin();
    let steps = CHUNK_SIZE / TREE_GRID_SPACING;
    let spacing = TREE_GRID_SPACING as f32;

    for gz in 0..steps {
        for gx in 0..steps {
            let base_x = origin.x as f32 + gx as f32 * spacing + spacing * 0.5;
            let base_z = origin.y as f32 + gz as f32 * spacing + spacing * 0.5;

            // Deterministic jitter, kept inside the grid cell
            let jitter_x = placement_noise.get([base_x as f64 * 0.1, base_z as f64 * 0.1]) as f32 * spacing * 0.4;
            let jitter_z = placement_noise.get([base_z as f64 * 0.1, base_x as f64 * 0.1]) as f32 * spacing * 0.4;

            let world_x = (base_x + jitter_x).floor();
            let world_z = (base_z + jitter_z).floor();

            let biome = terrain.get_biome(world_x as i32, world_z as i32);
            let density = density_noise.get([world_x as f64 * 0.05, world_z as f64 * 0.05]) as f32;
            let variety = variety_noise.get([world_x as f64 * 0.3, world_z as f64 * 0.3]) as f32;

            let kind = match biome {
                // Dense woods
                Biome::Forest if density > 0.0 => Some(if variety > 0.2 { TreeKind::Birch } else { TreeKind::Oak }),
                Biome::Snowy if density > 0.25 => Some(TreeKind::Pine),
                Biome::Mountains if density > 0.45 => Some(TreeKind::Pine),
                Biome::Plains if density > 0.5 => Some(TreeKind::Oak),
                Biome::Swamp if density > 0.2 => Some(if variety > 0.0 { TreeKind::Dead } else { TreeKind::Oak }),
                // Rare oasis palms and dead trees
                Biome::Desert if density > 0.6 => Some(if variety > 0.0 { TreeKind::Palm } else { TreeKind::Dead }),
                _ => None,
            };

            if let Some(kind) = kind {
                out.push(TreePosition::new(world_x, world_z, kind));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::WORLD_SEED;

    #[test]
    fn test_tree_index_basic() {
        let mut index = TreeIndex::new();
        index.insert(TreePosition::new(10.0, 10.0, TreeKind::Oak));

        assert!(index.any_within(Vec2::new(12.0, 10.0), 2.0));
        assert!(!index.any_within(Vec2::new(12.0, 10.0), 1.9));
        assert!(!index.any_within(Vec2::new(100.0, 100.0), 20.0));
    }

    #[test]
    fn test_tree_index_crosses_cells() {
        let mut index = TreeIndex::new();
        // Tree in a negative cell, query centred in a positive one
        index.insert(TreePosition::new(-3.0, -3.0, TreeKind::Pine));
        assert!(index.any_within(Vec2::new(20.0, 0.0), 24.0));
        assert!(!index.any_within(Vec2::new(20.0, 0.0), 22.0));
    }

    #[test]
    fn test_chunk_trees_deterministic_and_inside_chunk() {
        let terrain = TerrainGenerator::new(WORLD_SEED);
        for cx in -4..4 {
            for cz in -4..4 {
                let chunk = ChunkCoord::new(cx, cz);
                let a = generate_chunk_trees(&terrain, chunk);
                let b = generate_chunk_trees(&terrain, chunk);
                assert_eq!(a, b);
                for tree in &a {
                    assert!(chunk.contains_column(tree.x as i32, tree.z as i32));
                }
            }
        }
    }
}
