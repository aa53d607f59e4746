//! World building: chunk streaming, trees, ruins and the entities they spawn

use std::collections::VecDeque;
use std::path::PathBuf;

use bevy::app::AppExit;
use bevy::prelude::*;
use shared::{
    generate_chunk_trees, ChunkCoord, CollectedSpawns, Ghost, GhostKind, Ruin, StructureContext,
    StructureGenerator, Treasure, VoxelEdits, WorldTerrain, WorldTime, FIXED_TIMESTEP_HZ,
};

use crate::persistence::{save_snapshot, RuinRecord, WorldSnapshot};

/// Host settings, read once from the environment at startup
#[derive(Resource, Debug, Clone)]
pub struct WorldSettings {
    pub seed: u32,
    /// Chunks built in every direction around spawn
    pub radius: i32,
    pub chunks_per_tick: usize,
    pub snapshot_path: Option<PathBuf>,
}

/// Progress of the world build
#[derive(Resource, Debug, Default)]
pub struct WorldBuild {
    pub pending: VecDeque<ChunkCoord>,
    pub chunks_built: usize,
    pub ruins: Vec<RuinRecord>,
    pub finished: bool,
}

/// Queue every chunk in range, nearest first, and register the trees around them.
///
/// Trees go in before any structure is decided: a ruin near the edge of the
/// build area must still see trees one chunk further out.
pub fn setup_world(
    settings: Res<WorldSettings>,
    terrain: Res<WorldTerrain>,
    mut generator: ResMut<StructureGenerator>,
    mut build: ResMut<WorldBuild>,
) {
    for chunk in ChunkCoord::new(0, 0).chunks_in_radius(settings.radius + 1) {
        generator.record_trees(generate_chunk_trees(&terrain.generator, chunk));
    }

    queue_chunks(&mut build, settings.radius);

    info!(
        "World build queued: seed {}, {} chunks, {} trees",
        settings.seed,
        build.pending.len(),
        generator.trees().len()
    );
}

/// Queue the chunks within `radius` of spawn, nearest first.
fn queue_chunks(build: &mut WorldBuild, radius: i32) {
    let mut chunks = ChunkCoord::new(0, 0).chunks_in_radius(radius);
    chunks.sort_by_key(|c| (c.x * c.x + c.z * c.z, *c));
    build.pending = chunks.into();
}

/// Advance the world clock every tick.
pub fn tick_world_time(mut world_time: ResMut<WorldTime>) {
    world_time.advance(1.0 / FIXED_TIMESTEP_HZ as f32);
}

/// Materialize the next few queued chunks and spawn what their ruins asked for.
pub fn generate_pending_chunks(
    mut commands: Commands,
    settings: Res<WorldSettings>,
    terrain: Res<WorldTerrain>,
    world_time: Res<WorldTime>,
    mut generator: ResMut<StructureGenerator>,
    mut edits: ResMut<VoxelEdits>,
    mut build: ResMut<WorldBuild>,
) {
    for _ in 0..settings.chunks_per_tick.max(1) {
        let Some(chunk) = build.pending.pop_front() else {
            break;
        };

        let mut spawns = CollectedSpawns::default();
        let placed = {
            let mut ctx = StructureContext::new(&mut *edits, &terrain.generator)
                .with_hooks(&mut spawns)
                .at_night(world_time.is_night());
            generator.generate_chunk_structures(chunk, |x, z| terrain.generator.get_biome(x, z), &mut ctx)
        };

        for ruin in placed.iter().filter(|p| p.spec.origin_chunk() == chunk) {
            let biome = terrain.generator.get_biome(ruin.spec.world_x, ruin.spec.world_z);
            let rubble = generator.scatter_rubble(ruin, biome, &mut *edits, &terrain.generator);
            debug!(
                "Ruin at ({}, {}) dropped {} rubble blocks",
                ruin.spec.world_x, ruin.spec.world_z, rubble
            );
            commands.spawn((
                Ruin {
                    spec: ruin.spec,
                    base_y: ruin.base_y,
                },
                Transform::from_xyz(ruin.spec.world_x as f32, ruin.base_y as f32, ruin.spec.world_z as f32),
            ));
            build.ruins.push(RuinRecord::from(ruin));
        }

        spawn_collected(&mut commands, &spawns, chunk);
        build.chunks_built += 1;
    }
}

/// Turn hook requests into entities.
fn spawn_collected(commands: &mut Commands, spawns: &CollectedSpawns, chunk: ChunkCoord) {
    for block in &spawns.treasures {
        commands.spawn((Treasure { block: *block }, Transform::from_translation(block.as_vec3())));
    }

    let ghosts = spawns
        .friendly_ghosts
        .iter()
        .map(|pos| (GhostKind::Friendly, *pos))
        .chain(spawns.hostile_ghosts.iter().map(|pos| (GhostKind::Hostile, *pos)));
    for (kind, pos) in ghosts {
        let home = IVec2::new(pos.x.floor() as i32, pos.z.floor() as i32);
        commands.spawn((Ghost { kind, home }, Transform::from_translation(pos)));
    }

    if !spawns.is_empty() {
        debug!(
            "Chunk ({}, {}): {} treasure, {} friendly / {} hostile ghosts",
            chunk.x,
            chunk.z,
            spawns.treasures.len(),
            spawns.friendly_ghosts.len(),
            spawns.hostile_ghosts.len()
        );
    }
}

/// Once the queue drains: write the snapshot (if configured) and exit.
pub fn finish_world_build(
    settings: Res<WorldSettings>,
    edits: Res<VoxelEdits>,
    generator: Res<StructureGenerator>,
    mut build: ResMut<WorldBuild>,
    mut app_exit: MessageWriter<AppExit>,
) {
    if build.finished || !build.pending.is_empty() {
        return;
    }
    build.finished = true;

    info!(
        "World built: {} chunks, {} ruins, {} voxel edits",
        build.chunks_built,
        build.ruins.len(),
        edits.len()
    );

    let Some(path) = settings.snapshot_path.as_ref() else {
        app_exit.write(AppExit::Success);
        return;
    };

    let snapshot = WorldSnapshot::capture(
        settings.seed,
        settings.radius,
        &edits,
        &build.ruins,
        generator.trees().trees(),
    );
    match save_snapshot(&snapshot, path) {
        Ok(()) => {
            app_exit.write(AppExit::Success);
        }
        Err(e) => {
            error!("Failed to save world snapshot: {}", e);
            app_exit.write(AppExit::error());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::WORLD_SEED;

    fn test_app(radius: i32) -> App {
        let mut app = App::new();
        app.insert_resource(WorldSettings {
            seed: WORLD_SEED,
            radius,
            chunks_per_tick: 100,
            snapshot_path: None,
        });
        app.insert_resource(WorldTerrain::new(WORLD_SEED));
        app.insert_resource(StructureGenerator::new(WORLD_SEED));
        app.init_resource::<VoxelEdits>();
        app.init_resource::<WorldTime>();
        app.init_resource::<WorldBuild>();
        app.add_systems(Update, generate_pending_chunks);
        app
    }

    /// Full host setup, trees included
    fn forested_app(radius: i32) -> App {
        let mut app = test_app(radius);
        app.add_systems(Startup, setup_world);
        app
    }

    /// Chunks queued without trees, so every rolled ruin is kept
    fn clearing_app(radius: i32) -> App {
        let mut app = test_app(radius);
        app.add_systems(Startup, |settings: Res<WorldSettings>, mut build: ResMut<WorldBuild>| {
            queue_chunks(&mut build, settings.radius);
        });
        app
    }

    #[test]
    fn test_builds_every_queued_chunk() {
        let mut app = forested_app(2);
        app.update();

        let build = app.world().resource::<WorldBuild>();
        assert!(build.pending.is_empty());
        assert_eq!(build.chunks_built, 25);
        // Every ruin is recorded once, by its origin chunk
        let mut origins: Vec<_> = build.ruins.iter().map(|r| r.spec.origin_chunk()).collect();
        origins.sort();
        origins.dedup();
        assert_eq!(origins.len(), build.ruins.len());
    }

    #[test]
    fn test_queue_is_nearest_first() {
        let mut build = WorldBuild::default();
        queue_chunks(&mut build, 3);
        assert_eq!(build.pending.len(), 49);
        assert_eq!(build.pending.front(), Some(&ChunkCoord::new(0, 0)));
        let distances: Vec<i32> = build.pending.iter().map(|c| c.x * c.x + c.z * c.z).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_spawned_entities_match_records() {
        let mut app = clearing_app(3);
        app.update();

        let ruins = app.world().resource::<WorldBuild>().ruins.clone();
        // Chunks (0, 0), (2, -3) and (3, 1) roll ruins at this seed
        assert_eq!(ruins.len(), 3);
        let expected_ghosts: u32 = ruins.iter().map(|r| r.friendly_ghosts + r.hostile_ghosts).sum();
        let expected_treasure: usize = ruins.iter().map(|r| r.treasures.len()).sum();
        assert!(expected_treasure >= ruins.len());

        let world = app.world_mut();
        assert_eq!(world.query::<&Ruin>().iter(world).count(), ruins.len());
        assert_eq!(world.query::<&Ghost>().iter(world).count() as u32, expected_ghosts);
        assert_eq!(world.query::<&Treasure>().iter(world).count(), expected_treasure);
    }

    #[test]
    fn test_ruins_leave_rubble_outside_their_walls() {
        let mut app = clearing_app(3);
        app.update();

        let world = app.world();
        let edits = world.resource::<VoxelEdits>();
        let first = &world.resource::<WorldBuild>().ruins[0];
        let fp = first.spec.footprint();
        // Rubble lands just past the footprint
        let reach = fp.half_width.max(fp.half_depth) + 3;
        let rubble = edits.solid_positions().filter(|p| {
            let (lx, lz) = (p.x - first.spec.world_x, p.z - first.spec.world_z);
            !fp.contains(lx, lz) && lx.abs() <= reach && lz.abs() <= reach
        });
        assert!(rubble.count() > 0);
    }

    #[test]
    fn test_world_build_is_deterministic() {
        let mut a = clearing_app(3);
        let mut b = clearing_app(3);
        a.update();
        b.update();
        let ruins = &a.world().resource::<WorldBuild>().ruins;
        assert!(!ruins.is_empty());
        assert_eq!(*a.world().resource::<VoxelEdits>(), *b.world().resource::<VoxelEdits>());
        assert_eq!(*ruins, b.world().resource::<WorldBuild>().ruins);
    }
}
