// Reflex vision server
// Starts the configured cameras and runs the target-tracking loop until Ctrl-C

mod runner;

use clap::Parser;
use reflex_eye::server_config::DEFAULT_CONFIG_PATH;
use runner::RunOptions;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reflex")]
#[command(about = "Camera server with retro-reflective target tracking", long_about = None)]
#[command(version)]
struct Cli {
    /// Camera-server configuration (JSON)
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Vision configuration (TOML); built-in defaults when omitted
    #[arg(long)]
    vision_config: Option<PathBuf>,

    /// Write processed frames to this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Keep one of every N processed frames when writing to --output-dir
    #[arg(long, default_value = "30")]
    save_every: u64,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Write the final telemetry table as JSON to this file
    #[arg(long)]
    dump_telemetry: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let stats = runner::run(RunOptions {
        config: cli.config,
        vision_config: cli.vision_config,
        output_dir: cli.output_dir,
        save_every: cli.save_every,
        max_frames: cli.max_frames,
        dump_telemetry: cli.dump_telemetry,
    })
    .await?;

    info!(
        "Processed {} frames ({} estimates, {} acquisition failures)",
        stats.frames, stats.estimates, stats.acquisition_failures
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["reflex"]);
        assert_eq!(cli.config, PathBuf::from("/boot/frc.json"));
        assert_eq!(cli.save_every, 30);
        assert!(cli.max_frames.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "reflex",
            "/tmp/frc.json",
            "--vision-config",
            "/tmp/vision.toml",
            "--output-dir",
            "/tmp/out",
            "--save-every",
            "5",
            "--max-frames",
            "100",
            "--dump-telemetry",
            "/tmp/nt.json",
        ]);
        assert_eq!(cli.config, PathBuf::from("/tmp/frc.json"));
        assert_eq!(cli.vision_config, Some(PathBuf::from("/tmp/vision.toml")));
        assert_eq!(cli.save_every, 5);
        assert_eq!(cli.max_frames, Some(100));
        assert!(cli.dump_telemetry.is_some());
    }
}
