//! Offline structure baking tool.
//!
//! Reads a RON manifest of named structure and stamp requests (default
//! `tools/structure_baker/structures_manifest.ron`), generates each one on the
//! procedural terrain, structures through the manual spawn path, and writes a
//! bincode dump (default `structures.bin`).
//!
//! Usage: `structure_baker [manifest.ron] [output.bin]`

use std::fs;
use std::path::PathBuf;

use bevy::app::AppExit;
use bevy::prelude::*;
use serde::Deserialize;

use shared::baked::{bake_voxels, BakedStamp, BakedStructure, BakedStructures};
use shared::stamps::StampKind;
use shared::{
    CollectedSpawns, StructureContext, StructureGenerator, StructureRequestError, TerrainGenerator, VoxelEdits,
    WORLD_SEED,
};

// -----------------------------------------------------------------------------
// Manifest types
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct StructureManifest {
    version: u32,
    #[serde(default)]
    seed: Option<u32>,
    requests: Vec<StructureRequest>,
    #[serde(default)]
    stamps: Vec<StampRequest>,
}

#[derive(Debug, Clone, Deserialize)]
struct StructureRequest {
    name: String,
    x: i32,
    z: i32,
    size: String,  // e.g. "large"
    shape: String, // e.g. "l-shape"
    #[serde(default)]
    buried: bool,
    /// Palette key; the terrain's biome at (x, z) when omitted
    #[serde(default)]
    biome: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StampRequest {
    name: String,
    x: i32,
    z: i32,
    kind: StampKind,
}

#[derive(Resource)]
struct BakeConfig {
    manifest_path: PathBuf,
    output_path: PathBuf,
}

/// Outcome of one manifest
struct BakeOutcome {
    baked: BakedStructures,
    rejected: Vec<(String, StructureRequestError)>,
}

fn main() {
    let mut args = std::env::args().skip(1);
    let manifest_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tools/structure_baker/structures_manifest.ron"));
    let output_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("structures.bin"));

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(bevy::log::LogPlugin::default());

    app.insert_resource(BakeConfig {
        manifest_path,
        output_path,
    });

    app.add_systems(Startup, run_bake);

    app.run();
}

fn parse_manifest(text: &str) -> Result<StructureManifest, String> {
    let manifest: StructureManifest = ron::from_str(text).map_err(|e| format!("ron parse failed: {e}"))?;
    if manifest.version != 1 {
        return Err(format!(
            "Unsupported manifest version {} (expected 1)",
            manifest.version
        ));
    }
    Ok(manifest)
}

/// Generate every request in its own voxel buffer.
fn bake_manifest(manifest: &StructureManifest) -> BakeOutcome {
    let seed = manifest.seed.unwrap_or(WORLD_SEED);
    let terrain = TerrainGenerator::new(seed);
    let generator = StructureGenerator::new(seed);

    let mut baked = BakedStructures::new(seed);
    let mut rejected = Vec::new();

    for request in &manifest.requests {
        let biome = request
            .biome
            .clone()
            .unwrap_or_else(|| terrain.get_biome(request.x, request.z).name().to_string());

        let mut edits = VoxelEdits::new();
        let mut spawns = CollectedSpawns::default();
        let result = {
            let mut ctx = StructureContext::new(&mut edits, &terrain).with_hooks(&mut spawns);
            generator.spawn_structure_by_name(
                request.x,
                request.z,
                &request.size,
                &request.shape,
                request.buried,
                &biome,
                &mut ctx,
            )
        };

        match result {
            Ok(placed) => {
                info!(
                    "Baked '{}': {} {} at ({}, {}, {}), {} voxels",
                    request.name,
                    placed.spec.size.id(),
                    placed.spec.shape.id(),
                    placed.spec.world_x,
                    placed.base_y,
                    placed.spec.world_z,
                    edits.len()
                );
                baked.structures.push(BakedStructure {
                    name: request.name.clone(),
                    spec: placed.spec,
                    base_y: placed.base_y,
                    voxels: bake_voxels(&edits),
                    treasures: spawns.treasures.iter().map(|t| t.to_array()).collect(),
                });
            }
            Err(e) => rejected.push((request.name.clone(), e)),
        }
    }

    for request in &manifest.stamps {
        let mut edits = VoxelEdits::new();
        let report = request.kind.apply(
            request.x,
            request.z,
            generator.noise(),
            &generator.config().palettes,
            &mut edits,
            &terrain,
        );
        info!(
            "Baked '{}': {} at ({}, {}, {}), {} placed, {} removed",
            request.name,
            request.kind.id(),
            request.x,
            report.base_y,
            request.z,
            report.placed,
            report.removed
        );
        baked.stamps.push(BakedStamp {
            name: request.name.clone(),
            kind: request.kind.id().to_string(),
            origin: [request.x, report.base_y, request.z],
            voxels: bake_voxels(&edits),
        });
    }

    BakeOutcome { baked, rejected }
}

fn run_bake(config: Res<BakeConfig>, mut app_exit: MessageWriter<AppExit>) {
    let outcome = fs::read_to_string(&config.manifest_path)
        .map_err(|e| format!("Failed to read manifest at {:?}: {e}", config.manifest_path))
        .and_then(|text| parse_manifest(&text))
        .map(|manifest| bake_manifest(&manifest));

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{}", e);
            app_exit.write(AppExit::error());
            return;
        }
    };

    for (name, reason) in &outcome.rejected {
        warn!("Request '{}' rejected: {}", name, reason);
    }

    let written = outcome
        .baked
        .to_bytes()
        .and_then(|bytes| {
            let tmp = config.output_path.with_extension("tmp");
            fs::write(&tmp, &bytes)
                .and_then(|_| fs::rename(&tmp, &config.output_path))
                .map(|_| bytes.len())
                .map_err(|e| format!("Failed to write output {:?}: {e}", config.output_path))
        });

    match written {
        Ok(len) => {
            info!(
                "Wrote {} structures and {} stamps ({} bytes) to {:?}",
                outcome.baked.structures.len(),
                outcome.baked.stamps.len(),
                len,
                config.output_path
            );
            if outcome.rejected.is_empty() {
                app_exit.write(AppExit::Success);
            } else {
                app_exit.write(AppExit::error());
            }
        }
        Err(e) => {
            error!("{}", e);
            app_exit.write(AppExit::error());
        }
    }
}
