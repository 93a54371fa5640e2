//! Tempo CLI - Drive a measured render loop from the command line

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{config, run};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tempo")]
#[command(about = "Frame-timing overlay for GPU render loops", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a render loop and print the overlay panels as they refresh
    Run {
        /// Number of frames to render
        #[arg(long, default_value = "300")]
        frames: u32,

        /// Simulated CPU work per frame in milliseconds
        #[arg(long, default_value = "2.0")]
        work_ms: f64,

        /// Frame rate the loop is paced to
        #[arg(long, default_value = "60")]
        target_fps: u32,

        /// Path to a TOML overlay configuration
        #[arg(long)]
        config: Option<String>,

        /// Render a clear pass on a headless wgpu device and time it on the GPU
        #[arg(long)]
        wgpu: bool,

        /// Show one panel at a time, cycling every second
        #[arg(long)]
        minimal: bool,

        /// Print the final snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective overlay configuration as TOML
    Config {
        /// Path to a TOML overlay configuration
        #[arg(long)]
        config: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            frames,
            work_ms,
            target_fps,
            config,
            wgpu,
            minimal,
            json,
        } => run::run(run::RunArgs {
            frames,
            work_ms,
            target_fps,
            config,
            wgpu,
            minimal,
            json,
        }),
        Commands::Config { config } => config::run(config.as_deref()),
    }
}
