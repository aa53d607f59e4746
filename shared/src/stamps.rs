//! Standalone voxel stamps - igloos, pyramids, walls, towers, forts, houses, trenches, rubble.
//!
//! Stamps sit on the terrain surface (one block above the sampled ground) and share
//! the ground fallback of structure generation. Nothing is ever written at or below
//! bedrock (y = 0).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::blocks::{BlockKind, BlockPalette, PaletteTable, DEFAULT_PALETTE_KEY};
use crate::hash_noise::{NoiseChannel, SeededNoise};
use crate::voxel::{resolve_ground_height, BlockSink, HeightSource, FALLBACK_GROUND_HEIGHT, WORLD_FLOOR_Y};

/// Spacing between arrow slits up a tower face
pub const ARROW_SLIT_SPACING: i32 = 4;
/// Extra height of a house's back wall over its front wall
pub const HOUSE_BACK_WALL_RISE: i32 = 2;
/// Width of the gap left in a fortification's south wall
pub const GATE_WIDTH: i32 = 3;

/// Result of one stamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StampReport {
    /// Lowest y the stamp built from
    pub base_y: i32,
    pub placed: usize,
    pub removed: usize,
}

impl StampReport {
    fn absorb(&mut self, other: StampReport) {
        self.placed += other.placed;
        self.removed += other.removed;
    }
}

/// Axis a wall or trench runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallAxis {
    X,
    Z,
}

impl WallAxis {
    fn step(&self) -> IVec2 {
        match self {
            WallAxis::X => IVec2::X,
            WallAxis::Z => IVec2::Y,
        }
    }

    fn across(&self) -> IVec2 {
        match self {
            WallAxis::X => IVec2::Y,
            WallAxis::Z => IVec2::X,
        }
    }
}

/// Write-side guard shared by every stamp: drops anything below the world floor
/// and counts what went through.
struct StampWriter<'a> {
    sink: &'a mut dyn BlockSink,
    report: StampReport,
}

impl<'a> StampWriter<'a> {
    fn new(sink: &'a mut dyn BlockSink, base_y: i32) -> Self {
        Self {
            sink,
            report: StampReport {
                base_y,
                ..Default::default()
            },
        }
    }

    fn place(&mut self, pos: IVec3, block: BlockKind) {
        if pos.y < WORLD_FLOOR_Y {
            return;
        }
        self.sink.add_block(pos, Some(block), block.is_collidable());
        self.report.placed += 1;
    }

    fn dig(&mut self, pos: IVec3) {
        if pos.y < WORLD_FLOOR_Y {
            return;
        }
        self.sink.add_block(pos, None, false);
        self.report.removed += 1;
    }

    fn finish(self) -> StampReport {
        self.report
    }
}

/// Surface height with the usual fallback
fn surface(heights: &dyn HeightSource, x: i32, z: i32) -> i32 {
    resolve_ground_height(heights, x, z, FALLBACK_GROUND_HEIGHT)
}

/// First buildable layer above the surface
fn build_base(heights: &dyn HeightSource, x: i32, z: i32) -> i32 {
    (surface(heights, x, z) + 1).max(WORLD_FLOOR_Y)
}

#[inline]
fn ring_distance(dx: i32, dz: i32) -> f32 {
    ((dx * dx + dz * dz) as f32).sqrt()
}

/// Hollow snow dome with a 1-wide, 2-high entrance facing south (+z).
pub fn stamp_igloo(
    world_x: i32,
    world_z: i32,
    radius: i32,
    material: BlockKind,
    sink: &mut dyn BlockSink,
    heights: &dyn HeightSource,
) -> StampReport {
    let radius = radius.max(2);
    let base_y = build_base(heights, world_x, world_z);
    let mut out = StampWriter::new(sink, base_y);
    let r = radius as f32;

    for dy in 0..=radius {
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let d = ((dx * dx + dy * dy + dz * dz) as f32).sqrt();
                if d > r + 0.5 || d <= r - 0.5 {
                    continue;
                }
                // Entrance tunnel through the south wall
                if dx == 0 && dz > 0 && dy <= 1 {
                    continue;
                }
                out.place(IVec3::new(world_x + dx, base_y + dy, world_z + dz), material);
            }
        }
    }

    out.finish()
}

/// Stepped, hollow pyramid. Each layer is a square ring one block narrower than
/// the one below; the bottom layer is a solid floor. Entrance on the north face.
pub fn stamp_pyramid(
    world_x: i32,
    world_z: i32,
    half_size: i32,
    material: BlockKind,
    sink: &mut dyn BlockSink,
    heights: &dyn HeightSource,
) -> StampReport {
    let half_size = half_size.max(1);
    let base_y = build_base(heights, world_x, world_z);
    let mut out = StampWriter::new(sink, base_y);

    for ly in 0..=half_size {
        let half = half_size - ly;
        for dz in -half..=half {
            for dx in -half..=half {
                let ring = dx.abs() == half || dz.abs() == half;
                if ly > 0 && !ring {
                    continue;
                }
                let entrance = dx == 0 && dz == -half && (1..=2).contains(&ly) && half > 0;
                if entrance {
                    continue;
                }
                out.place(IVec3::new(world_x + dx, base_y + ly, world_z + dz), material);
            }
        }
    }

    out.finish()
}

/// Straight wall starting at `(world_x, world_z)` and running `length` blocks
/// along `axis`. Follows the terrain column by column; every other column carries
/// a merlon on top.
#[allow(clippy::too_many_arguments)]
pub fn stamp_wall(
    world_x: i32,
    world_z: i32,
    length: i32,
    height: i32,
    axis: WallAxis,
    material: BlockKind,
    sink: &mut dyn BlockSink,
    heights: &dyn HeightSource,
) -> StampReport {
    let base_y = build_base(heights, world_x, world_z);
    let mut out = StampWriter::new(sink, base_y);
    let step = axis.step();

    for i in 0..length.max(0) {
        let column = IVec2::new(world_x, world_z) + step * i;
        let column_base = build_base(heights, column.x, column.y);
        let top = if i % 2 == 0 { height } else { height - 1 };
        for ly in 0..=top {
            out.place(IVec3::new(column.x, column_base + ly, column.y), material);
        }
    }

    out.finish()
}

/// Hollow round tower: solid floor, arrow slits on the four cardinal faces every
/// [`ARROW_SLIT_SPACING`] blocks, a ground-floor door facing south and a
/// crenellated parapet.
pub fn stamp_tower(
    world_x: i32,
    world_z: i32,
    radius: i32,
    height: i32,
    material: BlockKind,
    sink: &mut dyn BlockSink,
    heights: &dyn HeightSource,
) -> StampReport {
    let radius = radius.max(2);
    let height = height.max(4);
    let base_y = build_base(heights, world_x, world_z);
    let mut out = StampWriter::new(sink, base_y);
    let r = radius as f32;

    for dz in -radius..=radius {
        for dx in -radius..=radius {
            let d = ring_distance(dx, dz);
            if d > r + 0.5 {
                continue;
            }
            let wall = d > r - 0.5;
            let cardinal = (dx == 0 && dz.abs() == radius) || (dz == 0 && dx.abs() == radius);
            let door = dx == 0 && dz == radius;

            for ly in 0..height {
                if ly > 0 && !wall {
                    continue;
                }
                if door && (1..=2).contains(&ly) {
                    continue;
                }
                let slit = cardinal && ly > 2 && ly < height - 1 && ly % ARROW_SLIT_SPACING == 2;
                if slit {
                    continue;
                }
                out.place(IVec3::new(world_x + dx, base_y + ly, world_z + dz), material);
            }

            // Parapet merlons on alternating wall blocks
            if wall && (dx + dz).rem_euclid(2) == 0 {
                out.place(IVec3::new(world_x + dx, base_y + height, world_z + dz), material);
            }
        }
    }

    out.finish()
}

/// Square enclosure: four crenellated walls, a tower on each corner and a gate
/// gap in the middle of the south wall.
pub fn stamp_fortification(
    world_x: i32,
    world_z: i32,
    half_size: i32,
    wall_height: i32,
    material: BlockKind,
    sink: &mut dyn BlockSink,
    heights: &dyn HeightSource,
) -> StampReport {
    let h = half_size.max(GATE_WIDTH + 2);
    let (west, east) = (world_x - h, world_x + h);
    let (north, south) = (world_z - h, world_z + h);
    let side = 2 * h + 1;
    let gate_half = GATE_WIDTH / 2;

    let mut report = StampReport {
        base_y: build_base(heights, world_x, world_z),
        ..Default::default()
    };

    // 1. North, west and east walls
    report.absorb(stamp_wall(west, north, side, wall_height, WallAxis::X, material, sink, heights));
    report.absorb(stamp_wall(west, north, side, wall_height, WallAxis::Z, material, sink, heights));
    report.absorb(stamp_wall(east, north, side, wall_height, WallAxis::Z, material, sink, heights));

    // 2. South wall in two halves around the gate
    let left_len = (world_x - gate_half) - west;
    report.absorb(stamp_wall(west, south, left_len, wall_height, WallAxis::X, material, sink, heights));
    let right_start = world_x + gate_half + 1;
    report.absorb(stamp_wall(right_start, south, east - right_start + 1, wall_height, WallAxis::X, material, sink, heights));

    // 3. Corner towers
    for (cx, cz) in [(west, north), (east, north), (west, south), (east, south)] {
        report.absorb(stamp_tower(cx, cz, 2, wall_height + 3, material, sink, heights));
    }

    debug!("Fortification at ({}, {}): {} blocks", world_x, world_z, report.placed);
    report
}

/// Single-room house with its front (door) wall on the north side (`-z`) and a
/// mono-pitch roof rising toward the back wall.
#[allow(clippy::too_many_arguments)]
pub fn stamp_house(
    world_x: i32,
    world_z: i32,
    width: i32,
    depth: i32,
    wall_height: i32,
    wall_material: BlockKind,
    roof_material: BlockKind,
    sink: &mut dyn BlockSink,
    heights: &dyn HeightSource,
) -> StampReport {
    let width = width.max(3);
    let depth = depth.max(3);
    let wall_height = wall_height.max(3);
    let base_y = build_base(heights, world_x, world_z);
    let mut out = StampWriter::new(sink, base_y);
    let door_x = width / 2;

    // Wall height at a row, front to back
    let row_height = |lz: i32| wall_height + (HOUSE_BACK_WALL_RISE * lz + (depth - 1) / 2) / (depth - 1);

    for lz in 0..depth {
        for lx in 0..width {
            let (x, z) = (world_x + lx, world_z + lz);
            out.place(IVec3::new(x, base_y, z), wall_material);

            let perimeter = lx == 0 || lx == width - 1 || lz == 0 || lz == depth - 1;
            let top = row_height(lz);
            if perimeter {
                for ly in 1..=top {
                    let door = lz == 0 && lx == door_x && ly <= 2;
                    if !door {
                        out.place(IVec3::new(x, base_y + ly, z), wall_material);
                    }
                }
            }
            out.place(IVec3::new(x, base_y + top + 1, z), roof_material);
        }
    }

    out.finish()
}

/// Dig a trench `length` blocks along `axis` and `width` blocks across, removing
/// `depth` blocks from the surface down. Stops above bedrock.
#[allow(clippy::too_many_arguments)]
pub fn stamp_trench(
    world_x: i32,
    world_z: i32,
    length: i32,
    width: i32,
    depth: i32,
    axis: WallAxis,
    sink: &mut dyn BlockSink,
    heights: &dyn HeightSource,
) -> StampReport {
    let start = IVec2::new(world_x, world_z);
    let mut out = StampWriter::new(sink, surface(heights, world_x, world_z));

    for i in 0..length.max(0) {
        for j in 0..width.max(0) {
            let column = start + axis.step() * i + axis.across() * j;
            let top = surface(heights, column.x, column.y);
            let bottom = (top - depth + 1).max(WORLD_FLOOR_Y);
            for y in bottom..=top {
                out.dig(IVec3::new(column.x, y, column.y));
            }
        }
    }

    out.finish()
}

/// Scatter `count` fallen blocks within `radius` of a ruin. Seeded, so the same
/// ruin always drops the same rubble.
#[allow(clippy::too_many_arguments)]
pub fn stamp_rubble(
    noise: &SeededNoise,
    world_x: i32,
    world_z: i32,
    radius: i32,
    count: u32,
    palette: BlockPalette,
    sink: &mut dyn BlockSink,
    heights: &dyn HeightSource,
) -> StampReport {
    let radius = radius.max(1);
    let span = (2 * radius + 1) as f64;
    let mut out = StampWriter::new(sink, build_base(heights, world_x, world_z));

    for i in 0..count {
        let roll_x = noise.indexed(NoiseChannel::RUBBLE, world_x, world_z, i * 2);
        let roll_z = noise.indexed(NoiseChannel::RUBBLE, world_x, world_z, i * 2 + 1);
        let dx = ((roll_x * span).floor() as i32).min(2 * radius) - radius;
        let dz = ((roll_z * span).floor() as i32).min(2 * radius) - radius;
        let (x, z) = (world_x + dx, world_z + dz);
        let block = palette.pick(noise.channel(NoiseChannel::MATERIAL, x as f64, z as f64));
        out.place(IVec3::new(x, build_base(heights, x, z), z), block);
    }

    out.finish()
}

/// A stamp and its dimensions as plain data, as written in bake manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StampKind {
    Igloo {
        radius: i32,
        material: BlockKind,
    },
    Pyramid {
        half_size: i32,
        material: BlockKind,
    },
    Wall {
        length: i32,
        height: i32,
        axis: WallAxis,
        material: BlockKind,
    },
    Tower {
        radius: i32,
        height: i32,
        material: BlockKind,
    },
    Fortification {
        half_size: i32,
        wall_height: i32,
        material: BlockKind,
    },
    House {
        width: i32,
        depth: i32,
        wall_height: i32,
        wall_material: BlockKind,
        roof_material: BlockKind,
    },
    Trench {
        length: i32,
        width: i32,
        depth: i32,
        axis: WallAxis,
    },
    Rubble {
        radius: i32,
        count: u32,
        /// Palette key; `default` when omitted
        #[serde(default)]
        biome: Option<String>,
    },
}

impl StampKind {
    pub fn id(&self) -> &'static str {
        match self {
            StampKind::Igloo { .. } => "igloo",
            StampKind::Pyramid { .. } => "pyramid",
            StampKind::Wall { .. } => "wall",
            StampKind::Tower { .. } => "tower",
            StampKind::Fortification { .. } => "fortification",
            StampKind::House { .. } => "house",
            StampKind::Trench { .. } => "trench",
            StampKind::Rubble { .. } => "rubble",
        }
    }

    /// Stamp at a world column. Only rubble draws on `noise` and `palettes`.
    pub fn apply(
        &self,
        world_x: i32,
        world_z: i32,
        noise: &SeededNoise,
        palettes: &PaletteTable,
        sink: &mut dyn BlockSink,
        heights: &dyn HeightSource,
    ) -> StampReport {
        let (x, z) = (world_x, world_z);
        match self {
            StampKind::Igloo { radius, material } => stamp_igloo(x, z, *radius, *material, sink, heights),
            StampKind::Pyramid { half_size, material } => stamp_pyramid(x, z, *half_size, *material, sink, heights),
            StampKind::Wall {
                length,
                height,
                axis,
                material,
            } => stamp_wall(x, z, *length, *height, *axis, *material, sink, heights),
            StampKind::Tower {
                radius,
                height,
                material,
            } => stamp_tower(x, z, *radius, *height, *material, sink, heights),
            StampKind::Fortification {
                half_size,
                wall_height,
                material,
            } => stamp_fortification(x, z, *half_size, *wall_height, *material, sink, heights),
            StampKind::House {
                width,
                depth,
                wall_height,
                wall_material,
                roof_material,
            } => stamp_house(x, z, *width, *depth, *wall_height, *wall_material, *roof_material, sink, heights),
            StampKind::Trench {
                length,
                width,
                depth,
                axis,
            } => stamp_trench(x, z, *length, *width, *depth, *axis, sink, heights),
            StampKind::Rubble { radius, count, biome } => {
                let palette = palettes.get(biome.as_deref().unwrap_or(DEFAULT_PALETTE_KEY));
                stamp_rubble(noise, x, z, *radius, *count, palette, sink, heights)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::VoxelEdits;

    fn flat(height: f32) -> impl Fn(i32, i32) -> Option<f32> {
        move |_x, _z| Some(height)
    }

    #[test]
    fn test_igloo_shell_and_entrance() {
        let mut edits = VoxelEdits::new();
        let report = stamp_igloo(0, 0, 4, BlockKind::Snow, &mut edits, &flat(10.0));
        assert_eq!(report.base_y, 11);
        // Hollow inside, capped on top
        assert_eq!(edits.block_at(IVec3::new(0, 12, 0)), None);
        assert_eq!(edits.block_at(IVec3::new(0, 15, 0)), Some(BlockKind::Snow));
        // Entrance on the south side, solid on the north
        assert_eq!(edits.block_at(IVec3::new(0, 11, 4)), None);
        assert_eq!(edits.block_at(IVec3::new(0, 12, 4)), None);
        assert_eq!(edits.block_at(IVec3::new(0, 11, -4)), Some(BlockKind::Snow));
        // Snow is walk-through
        assert!(edits.iter().all(|(_, e)| !e.collidable));
    }

    #[test]
    fn test_pyramid_tapers() {
        let mut edits = VoxelEdits::new();
        let report = stamp_pyramid(0, 0, 5, BlockKind::Sandstone, &mut edits, &flat(10.0));
        let base = report.base_y;
        // Solid floor, hollow layers above
        assert!(edits.block_at(IVec3::new(0, base, 0)).is_some());
        assert!(edits.block_at(IVec3::new(0, base + 1, 0)).is_none());
        assert!(edits.block_at(IVec3::new(4, base + 1, 4)).is_some());
        assert!(edits.block_at(IVec3::new(5, base + 1, 5)).is_none());
        // Apex
        assert!(edits.block_at(IVec3::new(0, base + 5, 0)).is_some());
        assert!(edits.solid_positions().all(|p| p.y <= base + 5));
        // North entrance
        assert!(edits.block_at(IVec3::new(0, base + 1, -4)).is_none());
        assert!(edits.block_at(IVec3::new(1, base + 1, -4)).is_some());
    }

    #[test]
    fn test_wall_merlons_alternate() {
        let mut edits = VoxelEdits::new();
        let report = stamp_wall(0, 0, 6, 3, WallAxis::X, BlockKind::StoneBrick, &mut edits, &flat(10.0));
        assert_eq!(report.base_y, 11);
        for x in 0..6 {
            assert!(edits.block_at(IVec3::new(x, 13, 0)).is_some());
            assert_eq!(edits.block_at(IVec3::new(x, 14, 0)).is_some(), x % 2 == 0);
        }
        // 6 columns of 3 plus 3 merlons
        assert_eq!(report.placed, 21);
    }

    #[test]
    fn test_wall_follows_terrain() {
        let slope = |x: i32, _z: i32| -> Option<f32> { Some(10.0 + x as f32) };
        let mut edits = VoxelEdits::new();
        stamp_wall(0, 0, 4, 2, WallAxis::X, BlockKind::Cobblestone, &mut edits, &slope);
        assert!(edits.block_at(IVec3::new(0, 11, 0)).is_some());
        assert!(edits.block_at(IVec3::new(3, 14, 0)).is_some());
        assert!(edits.block_at(IVec3::new(3, 13, 0)).is_none());
    }

    #[test]
    fn test_tower_slits_and_door() {
        let mut edits = VoxelEdits::new();
        let report = stamp_tower(0, 0, 3, 12, BlockKind::StoneBrick, &mut edits, &flat(10.0));
        let base = report.base_y;
        // Door
        assert!(edits.block_at(IVec3::new(0, base + 1, 3)).is_none());
        assert!(edits.block_at(IVec3::new(0, base + 2, 3)).is_none());
        assert!(edits.block_at(IVec3::new(0, base + 1, -3)).is_some());
        // Slits at 6 and 10 on every cardinal face
        for (x, z) in [(0, -3), (3, 0), (-3, 0), (0, 3)] {
            assert!(edits.block_at(IVec3::new(x, base + 6, z)).is_none());
            assert!(edits.block_at(IVec3::new(x, base + 10, z)).is_none());
            assert!(edits.block_at(IVec3::new(x, base + 5, z)).is_some());
        }
        // Hollow with a floor
        assert!(edits.block_at(IVec3::new(0, base, 0)).is_some());
        assert!(edits.block_at(IVec3::new(0, base + 3, 0)).is_none());
        // Parapet alternates
        assert!(edits.block_at(IVec3::new(3, base + 12, 1)).is_some());
        assert!(edits.block_at(IVec3::new(3, base + 12, 0)).is_none());
    }

    #[test]
    fn test_fortification_gate() {
        let mut edits = VoxelEdits::new();
        let report = stamp_fortification(0, 0, 10, 4, BlockKind::Cobblestone, &mut edits, &flat(10.0));
        assert_eq!(report.base_y, 11);
        // Gate gap in the south wall
        for x in -1..=1 {
            assert!(edits.block_at(IVec3::new(x, 12, 10)).is_none());
        }
        assert!(edits.block_at(IVec3::new(-2, 12, 10)).is_some());
        assert!(edits.block_at(IVec3::new(2, 12, 10)).is_some());
        // North wall is closed
        assert!(edits.block_at(IVec3::new(0, 12, -10)).is_some());
        // Corner tower rises above the walls
        assert!(edits.solid_positions().any(|p| p.y > 11 + 4));
    }

    #[test]
    fn test_house_slope_and_door() {
        let mut edits = VoxelEdits::new();
        let report = stamp_house(
            0,
            0,
            5,
            5,
            3,
            BlockKind::OakPlanks,
            BlockKind::SprucePlanks,
            &mut edits,
            &flat(10.0),
        );
        let base = report.base_y;
        // Front wall 3 high, back wall 5 high
        assert_eq!(edits.block_at(IVec3::new(0, base + 3, 0)), Some(BlockKind::OakPlanks));
        assert_eq!(edits.block_at(IVec3::new(0, base + 4, 0)), Some(BlockKind::SprucePlanks));
        assert_eq!(edits.block_at(IVec3::new(0, base + 5, 4)), Some(BlockKind::OakPlanks));
        assert_eq!(edits.block_at(IVec3::new(0, base + 6, 4)), Some(BlockKind::SprucePlanks));
        // One door, front wall only
        assert!(edits.block_at(IVec3::new(2, base + 1, 0)).is_none());
        assert!(edits.block_at(IVec3::new(2, base + 2, 0)).is_none());
        assert!(edits.block_at(IVec3::new(2, base + 3, 0)).is_some());
        assert!(edits.block_at(IVec3::new(2, base + 1, 4)).is_some());
        // Floor and empty interior
        assert!(edits.block_at(IVec3::new(2, base, 2)).is_some());
        assert!(edits.block_at(IVec3::new(2, base + 1, 2)).is_none());
    }

    #[test]
    fn test_trench_removes_blocks() {
        let mut edits = VoxelEdits::new();
        let report = stamp_trench(0, 0, 5, 2, 3, WallAxis::Z, &mut edits, &flat(10.0));
        assert_eq!(report.removed, 5 * 2 * 3);
        assert_eq!(report.placed, 0);
        assert!(edits.is_removed(IVec3::new(0, 10, 0)));
        assert!(edits.is_removed(IVec3::new(1, 8, 4)));
        assert!(edits.get(IVec3::new(0, 7, 0)).is_none());
        assert!(edits.get(IVec3::new(2, 10, 0)).is_none());
    }

    #[test]
    fn test_trench_never_reaches_bedrock() {
        let mut edits = VoxelEdits::new();
        stamp_trench(0, 0, 4, 4, 50, WallAxis::X, &mut edits, &flat(3.0));
        assert!(!edits.is_empty());
        assert!(edits.iter().all(|(p, _)| p.y >= WORLD_FLOOR_Y));

        let mut edits = VoxelEdits::new();
        let report = stamp_trench(0, 0, 2, 2, 5, WallAxis::X, &mut edits, &flat(0.0));
        assert_eq!(report.removed, 0);
    }

    #[test]
    fn test_stamps_survive_missing_terrain() {
        let void = |_x: i32, _z: i32| -> Option<f32> { None };
        let mut edits = VoxelEdits::new();
        let report = stamp_tower(0, 0, 3, 8, BlockKind::Stone, &mut edits, &void);
        assert_eq!(report.base_y, FALLBACK_GROUND_HEIGHT + 1);
        let report = stamp_igloo(30, 30, 3, BlockKind::Snow, &mut edits, &|_x: i32, _z: i32| -> Option<f32> { Some(f32::NAN) });
        assert_eq!(report.base_y, FALLBACK_GROUND_HEIGHT + 1);
    }

    #[test]
    fn test_rubble_is_seeded_and_nearby() {
        let noise = SeededNoise::new(12345);
        let palette = BlockPalette::DEFAULT;
        let mut a = VoxelEdits::new();
        let mut b = VoxelEdits::new();
        stamp_rubble(&noise, 50, -20, 6, 20, palette, &mut a, &flat(12.0));
        stamp_rubble(&noise, 50, -20, 6, 20, palette, &mut b, &flat(12.0));
        assert_eq!(a, b);
        assert!(!a.is_empty());
        for p in a.solid_positions() {
            assert!((p.x - 50).abs() <= 6 && (p.z + 20).abs() <= 6);
            assert_eq!(p.y, 13);
        }
    }

    #[test]
    fn test_stamp_kinds_from_manifest_text() {
        let kinds: Vec<StampKind> = ron::from_str(
            r#"[
                Igloo(radius: 4, material: Snow),
                Wall(length: 9, height: 4, axis: X, material: StoneBrick),
                House(width: 5, depth: 6, wall_height: 3, wall_material: OakPlanks, roof_material: Brick),
                Trench(length: 6, width: 2, depth: 3, axis: Z),
                Rubble(radius: 5, count: 8),
            ]"#,
        )
        .unwrap();
        let ids: Vec<_> = kinds.iter().map(|k| k.id()).collect();
        assert_eq!(ids, ["igloo", "wall", "house", "trench", "rubble"]);
        assert_eq!(
            kinds[4],
            StampKind::Rubble {
                radius: 5,
                count: 8,
                biome: None
            }
        );
    }

    #[test]
    fn test_stamp_kind_matches_direct_call() {
        let noise = SeededNoise::new(12345);
        let palettes = PaletteTable::builtin();
        let heights = flat(10.0);

        let mut direct = VoxelEdits::new();
        let expected = stamp_tower(3, -7, 3, 9, BlockKind::Stone, &mut direct, &heights);
        let mut via_kind = VoxelEdits::new();
        let tower = StampKind::Tower {
            radius: 3,
            height: 9,
            material: BlockKind::Stone,
        };
        assert_eq!(tower.apply(3, -7, &noise, &palettes, &mut via_kind, &heights), expected);
        assert_eq!(direct, via_kind);

        let mut direct = VoxelEdits::new();
        stamp_rubble(&noise, 0, 0, 5, 8, BlockPalette::DEFAULT, &mut direct, &heights);
        let mut via_kind = VoxelEdits::new();
        let rubble = StampKind::Rubble {
            radius: 5,
            count: 8,
            biome: None,
        };
        rubble.apply(0, 0, &noise, &palettes, &mut via_kind, &heights);
        assert_eq!(direct, via_kind);
    }
}
