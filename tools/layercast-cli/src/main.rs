//! Layercast CLI — Command-line interface for compositing and recording.
//!
//! Usage:
//!   layercast record [OPTIONS]     Composite and record to a file
//!   layercast codecs               Report codec negotiation results
//!   layercast simulate <SCRIPT>    Replay a gesture script on a stage
//!   layercast check                Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "layercast",
    about = "Real-time camera and overlay compositing with capture",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite the camera and overlay assets and record the result
    Record {
        /// Output directory (defaults to the configured recordings dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Image files to import as overlay layers
        #[arg(long)]
        image: Vec<PathBuf>,

        /// Video files to import as overlay layers
        #[arg(long)]
        video: Vec<PathBuf>,

        /// Scale applied to imported overlays (percent of canvas width)
        #[arg(long, default_value = "100")]
        scale: f64,

        /// Center position applied to imported overlays, as "x,y" percent
        #[arg(long, default_value = "50,50")]
        position: String,

        /// Disable the camera background
        #[arg(long)]
        no_camera: bool,

        /// Disable microphone capture
        #[arg(long)]
        no_mic: bool,

        /// Capture frame rate
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Stop automatically after this many seconds (Ctrl+C otherwise)
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Report which recording codecs the installed plugins support
    Codecs,

    /// Replay a JSONL gesture script against a stage and print the
    /// resulting layer transforms
    Simulate {
        /// Path to the gesture script (one pointer event per line)
        script: PathBuf,

        /// Natural width of the simulated layer
        #[arg(long, default_value = "1000")]
        width: u32,

        /// Natural height of the simulated layer
        #[arg(long, default_value = "1000")]
        height: u32,

        /// On-screen width of the simulated canvas element
        #[arg(long)]
        display_width: Option<f64>,

        /// On-screen height of the simulated canvas element
        #[arg(long)]
        display_height: Option<f64>,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    layercast_common::logging::init_logging(&layercast_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::Record {
            output,
            image,
            video,
            scale,
            position,
            no_camera,
            no_mic,
            fps,
            duration,
        } => {
            commands::record::run(
                output, image, video, scale, &position, !no_camera, !no_mic, fps, duration,
            )
            .await
        }
        Commands::Codecs => commands::codecs::run(),
        Commands::Simulate {
            script,
            width,
            height,
            display_width,
            display_height,
        } => commands::simulate::run(script, width, height, display_width, display_height),
        Commands::Check => commands::check::run(),
    }
}
