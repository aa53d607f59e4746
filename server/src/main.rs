//! World Host - Headless Bevy app that builds the world around spawn
//!
//! Streams chunks outward from the origin, places trees and ruins, spawns the
//! ghosts and treasure the ruins ask for, then writes a snapshot and exits.
//!
//! Environment:
//! - `WORLD_SEED`: world seed (default from the config, else `shared::WORLD_SEED`)
//! - `WORLD_RADIUS`: chunk radius to build around spawn (default 4)
//! - `WORLD_SNAPSHOT`: where to write the bincode snapshot (skipped when unset)
//! - `WORLD_CONFIG`: optional RON generator config

mod persistence;
mod world;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use shared::{GeneratorConfig, StructureGenerator, VoxelEdits, WorldTerrain, WorldTime, FIXED_TIMESTEP_HZ};
use std::path::PathBuf;
use std::time::Duration;

use world::{WorldBuild, WorldSettings};

const DEFAULT_RADIUS: i32 = 4;
const CHUNKS_PER_TICK: usize = 8;

fn tick_duration() -> Duration {
    Duration::from_secs_f64(1.0 / FIXED_TIMESTEP_HZ)
}

/// Parse an environment variable, warning (and ignoring it) when malformed.
fn env_value<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}

/// Generator config from `WORLD_CONFIG`, falling back to defaults.
fn load_config() -> GeneratorConfig {
    let Ok(path) = std::env::var("WORLD_CONFIG") else {
        return GeneratorConfig::default();
    };
    match GeneratorConfig::load_from_file(&path) {
        Ok(config) => {
            info!("Loaded generator config from {}", path);
            config
        }
        Err(e) => {
            warn!("Failed to load generator config: {} (using defaults)", e);
            GeneratorConfig::default()
        }
    }
}

fn main() {
    let mut app = App::new();

    // Headless plugins (no rendering), one world tick per frame
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(tick_duration())));
    app.add_plugins(bevy::log::LogPlugin::default());

    let mut config = load_config();
    if let Some(seed) = env_value::<u32>("WORLD_SEED") {
        config.seed = seed;
    }
    let settings = WorldSettings {
        seed: config.seed,
        radius: env_value::<i32>("WORLD_RADIUS").unwrap_or(DEFAULT_RADIUS).max(0),
        chunks_per_tick: CHUNKS_PER_TICK,
        snapshot_path: std::env::var("WORLD_SNAPSHOT").ok().map(PathBuf::from),
    };

    // Deterministic world terrain and structure generator, same seed
    app.insert_resource(WorldTerrain::new(config.seed));
    app.insert_resource(StructureGenerator::with_config(config));
    app.init_resource::<VoxelEdits>();
    app.init_resource::<WorldTime>();
    app.init_resource::<WorldBuild>();
    app.insert_resource(settings.clone());

    app.add_systems(Startup, world::setup_world);
    app.add_systems(
        Update,
        (
            world::tick_world_time,
            world::generate_pending_chunks,
            world::finish_world_build,
        )
            .chain(),
    );

    info!(
        "Starting world host: seed {}, radius {} chunks",
        settings.seed, settings.radius
    );
    app.run();
}
