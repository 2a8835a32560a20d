//! # GLINT Runner
//!
//! Headless scene runner. Populates a grid of meshes and a fly camera,
//! drives input and extracts one frame per tick, then tears the world down.
//!
//! ```bash
//! glint --config glint.toml
//! RUST_LOG=glint_core=debug glint --frames 2 --grid 2
//! ```

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use glint_scene::{
    attach_input, dispatch_input, extract_frame, spawn_camera, spawn_mesh, CameraComponent,
    FlyController, HostBuffers, InputEvent, Key, Mesh, MeshComponent, SceneEcs,
    TransformComponent,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, SceneConfig};

/// Built-in mesh when no OBJ file is configured.
const TRIANGLE_OBJ: &str = "\
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 1.0
f 1//1 2//1 3//1
";

#[derive(Parser)]
#[command(name = "glint", about = "Headless scene runner for the GLINT ECS")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of frames to run
    #[arg(short, long)]
    frames: Option<u32>,

    /// Override the mesh grid size
    #[arg(short, long)]
    grid: Option<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };
    if let Some(frames) = args.frames {
        config.scene.frames = frames;
    }
    if let Some(grid) = args.grid {
        config.scene.grid_size = grid;
    }
    config.validate()?;

    let mut ecs = SceneEcs::with_config(&config.ecs)?;
    let mut buffers = HostBuffers::new();
    populate(&mut ecs, &mut buffers, &config.scene)?;
    info!(
        entities = ecs.live_entities(),
        buffers = buffers.len(),
        "scene populated"
    );

    run(&mut ecs, &config.scene)?;

    let diverged = ecs.clear();
    info!(diverged, "scene torn down");
    Ok(())
}

/// Spawns the camera and one mesh entity per grid cell.
fn populate(ecs: &mut SceneEcs, buffers: &mut HostBuffers, scene: &SceneConfig) -> Result<()> {
    let mesh = match &scene.mesh {
        Some(path) => Mesh::load_obj(path)?,
        None => Mesh::parse_obj(TRIANGLE_OBJ)?,
    };
    let mesh = MeshComponent::upload(buffers, &mesh);

    #[allow(clippy::cast_precision_loss)]
    let extent = scene.grid_size as f32 * scene.spacing;
    let camera = spawn_camera(
        ecs,
        CameraComponent::new(scene.fov, scene.aspect, 0.1, extent * 4.0 + 100.0),
        TransformComponent::from_translation(Vec3::new(0.0, extent * 0.5, extent + 10.0)),
    )?;
    attach_input(ecs, camera, Box::<FlyController>::default())?;

    #[allow(clippy::cast_precision_loss)]
    let offset = (scene.grid_size.saturating_sub(1)) as f32 * scene.spacing * 0.5;
    for row in 0..scene.grid_size {
        for column in 0..scene.grid_size {
            #[allow(clippy::cast_precision_loss)]
            let position = Vec3::new(
                column as f32 * scene.spacing - offset,
                0.0,
                row as f32 * scene.spacing - offset,
            );
            spawn_mesh(ecs, mesh, TransformComponent::from_translation(position))
                .with_context(|| format!("spawning grid cell ({row}, {column})"))?;
        }
    }
    Ok(())
}

/// Runs the frame loop: input, then extraction.
fn run(ecs: &mut SceneEcs, scene: &SceneConfig) -> Result<()> {
    let mut draws = 0u64;
    let mut vertices = 0u64;

    for frame in 0..scene.frames {
        let events = scripted_input(frame, scene.frames);
        dispatch_input(ecs, &events, scene.frame_time);

        let data = extract_frame(ecs)?;
        debug!(
            frame,
            draws = data.draws.len(),
            camera = ?data.camera_pos,
            "frame extracted"
        );
        draws += data.draws.len() as u64;
        vertices += data.total_vertices();
    }

    info!(frames = scene.frames, draws, vertices, "run complete");
    Ok(())
}

/// Flies forward for the first half of the run, then strafes right.
fn scripted_input(frame: u32, frames: u32) -> Vec<InputEvent> {
    let half = frames / 2;
    match frame {
        0 => vec![InputEvent::Key {
            key: Key::Forward,
            pressed: true,
        }],
        f if f == half => vec![
            InputEvent::Key {
                key: Key::Forward,
                pressed: false,
            },
            InputEvent::Key {
                key: Key::Right,
                pressed: true,
            },
        ],
        _ => Vec::new(),
    }
}
