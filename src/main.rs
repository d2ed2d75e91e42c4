use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use turntable_stitcher::{Config, StitchEngine};

#[derive(Parser)]
#[command(
    name = "turntable-stitcher",
    version,
    about = "Stitch turntable renders into a wiki sprite strip",
    long_about = "Turntable-Stitcher crops every rendered angle of a model to its opaque content, scales all frames uniformly, pastes them into one horizontal strip and writes the offset sidecar the wiki's 3D viewer slices it with."
)]
struct Cli {
    /// Directory containing the rendered frames (render00.png, render01.png, ...)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory that receives the strip image and the sidecar
    #[arg(short, long)]
    output: PathBuf,

    /// Output format (png, jpeg)
    #[arg(short, long)]
    format: Option<String>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Turntable steps (defaults to frame count / vertical steps)
    #[arg(long)]
    y_rotations: Option<u32>,

    /// Camera tilt steps on each side of level
    #[arg(long)]
    x_rotations: Option<u32>,

    /// Long edge of each frame in the strip, in pixels
    #[arg(long)]
    target_dimension: Option<u32>,

    /// Image URL written into the sidecar
    #[arg(long)]
    url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(format) = &self.format {
            config.output.format = format.clone();
        }
        if let Some(y_rotations) = self.y_rotations {
            config.layout.y_rotations = Some(y_rotations);
        }
        if let Some(x_rotations) = self.x_rotations {
            config.layout.x_rotations = x_rotations;
        }
        if let Some(target_dimension) = self.target_dimension {
            config.layout.target_dimension = target_dimension;
        }
        if let Some(url) = &self.url {
            config.sidecar.url = url.clone();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("Starting Turntable-Stitcher v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(|e| anyhow::anyhow!(e.user_message()))?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    cli.apply_overrides(&mut config);

    let engine = StitchEngine::new(config);
    let report = engine
        .run(&cli.input, &cli.output)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    info!("Strip saved to: {:?}", report.image_path);
    info!("Offsets saved to: {:?}", report.sidecar_path);
    Ok(())
}
