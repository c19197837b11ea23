//! pointbake - NCCA point bake tool
//!
//! Bakes OBJ frame sequences to point bake XML, applies bakes back onto OBJ
//! meshes, and converts bakes to per-vertex channel clips.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use pointbake_cli::{convert, manifest};

#[derive(Parser)]
#[command(name = "pointbake")]
#[command(about = "NCCA point bake tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bake an OBJ frame sequence
    Export {
        /// Frame pattern, '#' run replaced by the frame number (e.g. shark.####.obj)
        frames: String,

        /// Output point bake file
        #[arg(short, long)]
        output: PathBuf,

        /// First frame
        #[arg(long)]
        start: i32,

        /// End frame (exclusive)
        #[arg(long)]
        end: i32,

        /// Mesh name written into the bake (default: output file stem)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Apply a bake to a template OBJ, one OBJ per frame
    Import {
        /// Input point bake file
        bake: PathBuf,

        /// Template OBJ whose vertices are replaced
        #[arg(short, long)]
        mesh: PathBuf,

        /// Output frame pattern (e.g. out/shark.####.obj)
        #[arg(short, long)]
        output: String,
    },

    /// Convert a bake to per-vertex translate channels (JSON)
    Channels {
        /// Input point bake file
        bake: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print bake metadata
    Info {
        /// Input point bake file
        bake: PathBuf,

        /// Only read the header, skip counting frames
        #[arg(long)]
        header_only: bool,
    },

    /// Re-export a frame range of an existing bake
    Trim {
        /// Input point bake file
        bake: PathBuf,

        /// Output point bake file
        #[arg(short, long)]
        output: PathBuf,

        /// First frame
        #[arg(long)]
        start: i32,

        /// End frame (exclusive)
        #[arg(long)]
        end: i32,
    },

    /// Bake every sequence in a manifest file
    Build {
        /// Path to bake.toml manifest
        #[arg(default_value = "bake.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without baking
    Check {
        /// Path to bake.toml manifest
        #[arg(default_value = "bake.toml")]
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            frames,
            output,
            start,
            end,
            name,
        } => {
            let name = name.unwrap_or_else(|| {
                output
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string()
            });
            tracing::info!("Baking {:?} [{}, {}) -> {:?}", frames, start, end, output);
            convert::export_sequence(&frames, &output, start, end, &name)?;
        }

        Commands::Import { bake, mesh, output } => {
            tracing::info!("Applying {:?} to {:?} -> {:?}", bake, mesh, output);
            convert::import_to_obj(&bake, &mesh, &output)?;
        }

        Commands::Channels { bake, output } => {
            tracing::info!("Converting {:?} -> {:?}", bake, output);
            convert::export_channels(&bake, &output)?;
        }

        Commands::Info { bake, header_only } => {
            let (meta, frames) = convert::describe(&bake, header_only)?;
            tracing::info!("Point bake {:?}:", bake);
            tracing::info!("  mesh: {}", meta.mesh_name);
            tracing::info!("  vertices: {}", meta.num_verts);
            tracing::info!(
                "  range: [{}, {}) ({} frames declared)",
                meta.start_frame,
                meta.end_frame,
                meta.num_frames
            );
            tracing::info!("  translate mode: {}", meta.translate_mode);
            if let Some(frames) = frames {
                tracing::info!("  frames stored: {}", frames);
            }
        }

        Commands::Trim {
            bake,
            output,
            start,
            end,
        } => {
            tracing::info!("Trimming {:?} to [{}, {}) -> {:?}", bake, start, end, output);
            convert::trim(&bake, &output, start, end)?;
        }

        Commands::Build { manifest, output } => {
            tracing::info!("Building bakes from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }
    }

    Ok(())
}
