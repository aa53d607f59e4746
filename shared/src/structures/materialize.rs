//! Turning a [`StructureSpec`] into voxels, treasure and ghosts.
//!
//! Geometry is a pure function of the [`StructureSpec`], the seed and the sampled ground, so
//! re-materializing a structure (or materializing it chunk by chunk) writes the
//! same voxels every time.

use bevy::prelude::*;

use super::{
    Footprint, PlacedStructure, StructureContext, StructureShape, StructureSize, StructureSpec,
    StructureGenerator, StructureRequestError, BURIED_FRACTION, DOORWAY_HEIGHT,
};
use crate::blocks::{BlockKind, BlockPalette};
use crate::hash_noise::NoiseChannel;
use crate::stamps::stamp_rubble;
use crate::terrain::{Biome, ChunkCoord};
use crate::voxel::{resolve_ground_height, BlockSink, HeightSource, WORLD_CEILING_Y, WORLD_FLOOR_Y};

/// Noise draws tried per treasure before scanning the footprint
const TREASURE_ATTEMPTS: u32 = 12;

/// Chance of a friendly ghost haunting a surface ruin (day, night)
const FRIENDLY_GHOST_CHANCE: (f64, f64) = (0.80, 0.95);
/// Chance of a second friendly ghost after dark
const SECOND_FRIENDLY_NIGHT_CHANCE: f64 = 0.50;
/// Chance of a hostile ghost in any ruin (day, night)
const HOSTILE_GHOST_CHANCE: (f64, f64) = (0.60, 0.90);
/// Chance of a second hostile ghost after dark
const SECOND_HOSTILE_NIGHT_CHANCE: f64 = 0.40;

/// Ghost draws, by index into the ghost channel
const GHOST_FRIENDLY: u32 = 0;
const GHOST_FRIENDLY_NIGHT: u32 = 1;
const GHOST_HOSTILE: u32 = 2;
const GHOST_HOSTILE_NIGHT: u32 = 3;

/// How far rubble spreads past a ruin's footprint
const RUBBLE_MARGIN: i32 = 3;

/// Treasure markers for a footprint width.
pub fn treasure_count(width: i32) -> usize {
    match width {
        w if w < 7 => 1,
        w if w < 12 => 2,
        w if w < 20 => 3,
        _ => 4,
    }
}

impl StructureGenerator {
    /// Ground height under a structure origin, honouring the manual-spawn override.
    /// The override is clamped to the buildable range.
    pub fn ground_height(&self, spec: &StructureSpec, ctx: &StructureContext) -> i32 {
        if let Some(y) = ctx.player_y_override {
            return y.clamp(WORLD_FLOOR_Y, WORLD_CEILING_Y);
        }
        resolve_ground_height(ctx.heights, spec.world_x, spec.world_z, self.config.fallback_ground_height)
    }

    /// World y of the floor layer: sunk for buried ruins, settled 1-2 blocks otherwise,
    /// never below the world floor.
    pub fn structure_base_y(&self, spec: &StructureSpec, ground: i32) -> i32 {
        let sink = if spec.buried {
            let height = spec.dimensions().height;
            ((height as f64 * BURIED_FRACTION).floor() as i32).max(1)
        } else {
            let roll = self
                .noise
                .channel(NoiseChannel::SETTLE, spec.world_x as f64, spec.world_z as f64);
            1 + i32::from(roll >= 0.5)
        };
        (ground - sink).max(WORLD_FLOOR_Y)
    }

    /// Materialize a whole structure.
    pub fn generate_structure(
        &self,
        spec: &StructureSpec,
        biome: Biome,
        ctx: &mut StructureContext,
    ) -> PlacedStructure {
        self.generate_structure_clipped(spec, biome, ctx, None)
    }

    /// Materialize the part of a structure inside `clip` (or all of it).
    ///
    /// Treasure and ghosts belong to the chunk holding the origin; clipped calls for
    /// any other chunk only write voxels.
    pub fn generate_structure_clipped(
        &self,
        spec: &StructureSpec,
        biome: Biome,
        ctx: &mut StructureContext,
        clip: Option<ChunkCoord>,
    ) -> PlacedStructure {
        let palette = self.config.palettes.for_biome(biome);
        self.materialize(spec, palette, ctx, clip)
    }

    fn materialize(
        &self,
        spec: &StructureSpec,
        palette: BlockPalette,
        ctx: &mut StructureContext,
        clip: Option<ChunkCoord>,
    ) -> PlacedStructure {
        let ground = self.ground_height(spec, ctx);
        let base_y = self.structure_base_y(spec, ground);
        let blocks_placed = self.place_voxels(spec, palette, base_y, ctx, clip);

        let mut placed = PlacedStructure {
            spec: *spec,
            base_y,
            blocks_placed,
            treasures: Vec::new(),
            friendly_ghosts: 0,
            hostile_ghosts: 0,
        };

        let owns_entities = clip.map_or(true, |chunk| chunk == spec.origin_chunk());
        if owns_entities {
            self.place_treasure(spec, base_y, ctx, &mut placed);
            self.spawn_ghosts(spec, base_y, ctx, &mut placed);
            debug!(
                "Placed {} {} ruin at ({}, {}, {}){}: {} blocks, {} treasure, {}/{} ghosts",
                spec.size.id(),
                spec.shape.id(),
                spec.world_x,
                base_y,
                spec.world_z,
                if spec.buried { " buried" } else { "" },
                placed.blocks_placed,
                placed.treasures.len(),
                placed.friendly_ghosts,
                placed.hostile_ghosts
            );
        }

        placed
    }

    fn place_voxels(
        &self,
        spec: &StructureSpec,
        palette: BlockPalette,
        base_y: i32,
        ctx: &mut StructureContext,
        clip: Option<ChunkCoord>,
    ) -> usize {
        let fp = spec.footprint();
        let height = spec.dimensions().height;
        let noise = &self.noise;
        let mut placed = 0;

        for (lx, lz) in fp.cells() {
            let (wx, wz) = (spec.world_x + lx, spec.world_z + lz);
            if clip.is_some_and(|chunk| !chunk.contains_column(wx, wz)) {
                continue;
            }
            let edge = fp.is_edge(lx, lz);
            let door = edge && fp.is_doorway(lx, lz);

            for ly in 0..height {
                let wy = base_y + ly;
                let floor = ly == 0;
                let ceiling = ly == height - 1
                    && noise.voxel(NoiseChannel::CEILING, wx, wy, wz) < self.config.ceiling_coverage;
                let wall = edge
                    && !(door && (1..=DOORWAY_HEIGHT).contains(&ly))
                    && noise.voxel(NoiseChannel::CRUMBLE, wx, wy, wz) < self.config.wall_keep_chance;

                if floor || ceiling || wall {
                    let block = palette.pick(noise.voxel(NoiseChannel::MATERIAL, wx, wy, wz));
                    ctx.blocks.add_block(IVec3::new(wx, wy, wz), Some(block), block.is_collidable());
                    placed += 1;
                }
            }
        }

        placed
    }

    /// Local column drawn from the `index`-th sample of a channel.
    fn noise_cell(&self, spec: &StructureSpec, fp: &Footprint, channel: NoiseChannel, index: u32) -> (i32, i32) {
        let roll_x = self.noise.indexed(channel, spec.world_x, spec.world_z, index * 2);
        let roll_z = self.noise.indexed(channel, spec.world_x, spec.world_z, index * 2 + 1);
        let lx = -fp.half_width + (roll_x * fp.width() as f64).floor() as i32;
        let lz = -fp.half_depth + (roll_z * fp.depth() as f64).floor() as i32;
        (lx.min(fp.half_width), lz.min(fp.half_depth))
    }

    /// Interior floor columns for treasure, noise first, then a row scan.
    fn treasure_cells(&self, spec: &StructureSpec) -> Vec<(i32, i32)> {
        let fp = spec.footprint();
        let wanted = treasure_count(fp.width());
        let interior = |&(x, z): &(i32, i32)| fp.contains(x, z) && !fp.is_edge(x, z);
        let mut cells: Vec<(i32, i32)> = Vec::with_capacity(wanted);

        for attempt in 0..wanted as u32 * TREASURE_ATTEMPTS {
            if cells.len() == wanted {
                break;
            }
            let cell = self.noise_cell(spec, &fp, NoiseChannel::TREASURE, attempt);
            if interior(&cell) && !cells.contains(&cell) {
                cells.push(cell);
            }
        }

        // Thin shapes may have few interior columns; fall back to walls
        let scan: Vec<(i32, i32)> = fp.cells().filter(interior).chain(fp.cells()).collect();
        for cell in scan {
            if cells.len() == wanted {
                break;
            }
            if !cells.contains(&cell) {
                cells.push(cell);
            }
        }

        cells
    }

    fn place_treasure(&self, spec: &StructureSpec, base_y: i32, ctx: &mut StructureContext, placed: &mut PlacedStructure) {
        for (lx, lz) in self.treasure_cells(spec) {
            let pos = IVec3::new(spec.world_x + lx, base_y + 1, spec.world_z + lz);
            if let Some(hooks) = ctx.hooks.as_deref_mut() {
                hooks.place_treasure(pos);
            }
            placed.treasures.push(pos);
        }
    }

    fn spawn_ghosts(&self, spec: &StructureSpec, base_y: i32, ctx: &mut StructureContext, placed: &mut PlacedStructure) {
        let fp = spec.footprint();
        let night = ctx.is_night;
        let roll = |index| self.noise.indexed(NoiseChannel::GHOST, spec.world_x, spec.world_z, index);
        let chance = |(day, at_night): (f64, f64)| if night { at_night } else { day };

        let ghost_pos = |index: u32| {
            let (lx, lz) = self.noise_cell(spec, &fp, NoiseChannel::GHOST, index + 8);
            let (lx, lz) = if fp.contains(lx, lz) { (lx, lz) } else { (0, 0) };
            Vec3::new(
                (spec.world_x + lx) as f32 + 0.5,
                (base_y + 1) as f32,
                (spec.world_z + lz) as f32 + 0.5,
            )
        };

        let mut friendly = Vec::new();
        if !spec.buried {
            if roll(GHOST_FRIENDLY) < chance(FRIENDLY_GHOST_CHANCE) {
                friendly.push(ghost_pos(GHOST_FRIENDLY));
            }
            if night && roll(GHOST_FRIENDLY_NIGHT) < SECOND_FRIENDLY_NIGHT_CHANCE {
                friendly.push(ghost_pos(GHOST_FRIENDLY_NIGHT));
            }
        }

        let mut hostile = Vec::new();
        if roll(GHOST_HOSTILE) < chance(HOSTILE_GHOST_CHANCE) {
            hostile.push(ghost_pos(GHOST_HOSTILE));
        }
        if night && roll(GHOST_HOSTILE_NIGHT) < SECOND_HOSTILE_NIGHT_CHANCE {
            hostile.push(ghost_pos(GHOST_HOSTILE_NIGHT));
        }

        placed.friendly_ghosts = friendly.len() as u32;
        placed.hostile_ghosts = hostile.len() as u32;

        if let Some(hooks) = ctx.hooks.as_deref_mut() {
            for pos in friendly {
                hooks.spawn_friendly_ghost(pos);
            }
            for pos in hostile {
                hooks.spawn_hostile_ghost(pos);
            }
        }
    }

    /// Materialize every structure whose footprint reaches into `chunk`, including
    /// ones that originate in a neighbouring chunk. Only voxels inside `chunk` are
    /// written.
    pub fn generate_chunk_structures(
        &mut self,
        chunk: ChunkCoord,
        biome_at: impl Fn(i32, i32) -> Biome,
        ctx: &mut StructureContext,
    ) -> Vec<PlacedStructure> {
        self.structures_touching_chunk(chunk)
            .iter()
            .map(|spec| {
                let biome = biome_at(spec.world_x, spec.world_z);
                self.generate_structure_clipped(spec, biome, ctx, Some(chunk))
            })
            .collect()
    }

    /// Drop fallen blocks on the ground around a surface ruin, outside its
    /// footprint. Buried ruins leave no rubble. Returns the blocks written.
    pub fn scatter_rubble(
        &self,
        placed: &PlacedStructure,
        biome: Biome,
        sink: &mut dyn BlockSink,
        heights: &dyn HeightSource,
    ) -> usize {
        let spec = &placed.spec;
        if spec.buried {
            return 0;
        }
        let fp = spec.footprint();
        let radius = fp.half_width.max(fp.half_depth) + RUBBLE_MARGIN;
        let mut dropped = 0;
        let mut outside = |pos: IVec3, block: Option<BlockKind>, collidable: bool| {
            if !fp.contains(pos.x - spec.world_x, pos.z - spec.world_z) {
                sink.add_block(pos, block, collidable);
                dropped += 1;
            }
        };
        stamp_rubble(
            &self.noise,
            spec.world_x,
            spec.world_z,
            radius,
            fp.width() as u32,
            self.config.palettes.for_biome(biome),
            &mut outside,
            heights,
        );
        dropped
    }

    /// Manual spawn by name ("large", "l-shape", ...). Unknown names are rejected
    /// before anything is written. Unknown biome names use the default palette.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_structure_by_name(
        &self,
        world_x: i32,
        world_z: i32,
        size: &str,
        shape: &str,
        buried: bool,
        biome: &str,
        ctx: &mut StructureContext,
    ) -> Result<PlacedStructure, StructureRequestError> {
        let parsed = size
            .parse::<StructureSize>()
            .and_then(|size| shape.parse::<StructureShape>().map(|shape| (size, shape)));
        let (size, shape) = match parsed {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Rejected structure request at ({}, {}): {}", world_x, world_z, e);
                return Err(e);
            }
        };

        let spec = StructureSpec {
            world_x,
            world_z,
            size,
            shape,
            buried,
        };
        let palette = self.config.palettes.get(biome);
        Ok(self.materialize(&spec, palette, ctx, None))
    }
}
