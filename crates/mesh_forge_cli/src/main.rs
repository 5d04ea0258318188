//! mesh_forge CLI - renders scene files to OBJ + PNG and benchmarks ticks.
#![forbid(unsafe_code)]

mod export;
mod scene;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::scene::{build_pipeline, SceneParams};

/// Staged procedural surface generator.
#[derive(Parser)]
#[command(name = "mesh_forge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one pipeline tick and export the artifact.
    Render {
        /// Scene parameter file (JSON). Defaults are used when omitted.
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Output directory for generated files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Base name for output files.
        #[arg(short, long, default_value = "surface")]
        name: String,
    },

    /// Time full pipeline ticks across texture resolutions, for every scene
    /// file in a folder.
    Bench {
        /// Scene file, or folder of scene files (*.json).
        scenes: PathBuf,

        /// Full ticks to average per resolution.
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },

    /// Write the default scene parameter file as a starting point.
    Init {
        /// Where to write the scene file.
        #[arg(short, long, default_value = "./scene.json")]
        output: PathBuf,
    },
}

const BENCH_RESOLUTIONS: [usize; 5] = [64, 128, 256, 512, 1024];

fn load_scene(path: Option<&PathBuf>) -> anyhow::Result<SceneParams> {
    match path {
        Some(path) => SceneParams::load(path),
        None => Ok(SceneParams::default()),
    }
}

fn render(scene: Option<PathBuf>, output: PathBuf, name: String) -> anyhow::Result<()> {
    let scene = load_scene(scene.as_ref())?;
    fs::create_dir_all(&output)
        .with_context(|| format!("creating output directory {}", output.display()))?;

    let mut pipeline = build_pipeline(&scene);
    let start = Instant::now();
    let artifact = pipeline.current_artifact()?;
    info!(
        stages = pipeline.stage_count(),
        recomputes = pipeline.total_recomputes(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "pipeline tick finished"
    );

    export::write_obj(&artifact, &output.join(format!("{name}.obj")))?;
    export::write_maps(&artifact, &output, &name)?;
    Ok(())
}

fn bench(scenes: PathBuf, runs: u32) -> anyhow::Result<()> {
    let runs = runs.max(1);

    for file in scene::scene_files(&scenes)? {
        let scene = SceneParams::load(&file)?;
        println!("{}", file.display());

        for resolution in BENCH_RESOLUTIONS {
            let mut pipeline = build_pipeline(&scene);
            pipeline.set_texture_resolution(resolution);

            let mut total_ms = 0.0;
            for _ in 0..runs {
                pipeline.invalidate_all();
                let start = Instant::now();
                let artifact = pipeline.current_artifact()?;
                total_ms += start.elapsed().as_secs_f64() * 1000.0;
                std::hint::black_box(artifact.mesh.vertex_count());
            }

            println!(
                "  {resolution:>5} px  {:>9.2} ms/tick",
                total_ms / runs as f64
            );
        }
    }
    Ok(())
}

fn init(output: PathBuf) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(&SceneParams::default())?;
    fs::write(&output, text)
        .with_context(|| format!("writing scene file {}", output.display()))?;
    info!("wrote {}", output.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    match Cli::parse().command {
        Commands::Render {
            scene,
            output,
            name,
        } => render(scene, output, name),
        Commands::Bench { scenes, runs } => bench(scenes, runs),
        Commands::Init { output } => init(output),
    }
}
