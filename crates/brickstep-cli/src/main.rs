//! Brickstep - Main entry point
//!
//! Loads an assembly manifest and steps through its build instructions
//! from an interactive console.

mod config;
mod console;
mod scene;

use anyhow::{Context, Result};
use brickstep_core::{AssemblyManifest, Instructions, Navigator};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::scene::TracingAnimator;

#[derive(Parser, Debug)]
#[command(name = "brickstep")]
#[command(about = "Step-by-step build instructions for hierarchical assemblies")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "brickstep.toml")]
    config: PathBuf,

    /// Assembly manifest (overrides the configured path)
    #[arg(short, long)]
    assembly: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Go to a single step from a cleared model and exit
    #[arg(long)]
    goto: Option<String>,

    /// Print all step labels and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Brickstep v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config(&args.config)?;

    let assembly_path = args
        .assembly
        .unwrap_or_else(|| PathBuf::from(&config.assembly.path));
    let manifest = AssemblyManifest::from_file(&assembly_path)
        .with_context(|| format!("Failed to load assembly {}", assembly_path.display()))?;
    info!(path = %assembly_path.display(), assembly = %manifest.name, "Assembly loaded");

    // Malformed authored step numbers fail the load here
    let instructions = Instructions::new(manifest.into_root()?, TracingAnimator::default())?;

    if args.list {
        for label in instructions.labels() {
            println!("{}", label);
        }
        return Ok(());
    }

    let navigator = Navigator::new(instructions, config.stepper.step_speed());

    if let Some(step) = args.goto {
        navigator.reset(true).await?;
        let outcome = navigator.go_to_step(&step).await?.await?;
        println!("Go-to {}", outcome);
        let animations = navigator.instructions().lock().await.animator().triggered();
        info!(animations, "Done");
        return Ok(());
    }

    console::run(navigator, &config).await
}
