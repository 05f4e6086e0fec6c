//! A capture session from configuration files through to loop shutdown

use anyhow::Context;
use reflex_core::MemoryBus;
use reflex_eye::{
    CameraRegistry, CaptureLoop, FrameSink, ImageDirSink, LatestFrameSink, LoopStats,
    ServerConfig, VisionConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

pub struct RunOptions {
    pub config: PathBuf,
    pub vision_config: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub save_every: u64,
    pub max_frames: Option<u64>,
    pub dump_telemetry: Option<PathBuf>,
}

/// Start cameras and drive the capture loop on a blocking thread
///
/// Returns when the frame limit is reached or Ctrl-C is received.
pub async fn run(opts: RunOptions) -> anyhow::Result<LoopStats> {
    let server = ServerConfig::load(&opts.config)?;
    let vision = match &opts.vision_config {
        Some(path) => VisionConfig::load(path)
            .with_context(|| format!("loading vision config {}", path.display()))?,
        None => VisionConfig::default(),
    };
    info!("Team {} ({:?} mode)", server.team, server.nt_mode);

    let bus = Arc::new(MemoryBus::new());
    let registry = CameraRegistry::start(&server, vision.constants.resolution, bus.as_ref())?;
    let source = registry.select(vision.source.as_deref())?;

    let sink: Arc<dyn FrameSink> = match &opts.output_dir {
        Some(dir) => Arc::new(ImageDirSink::new(dir, &vision.stream_name, opts.save_every)?),
        None => Arc::new(LatestFrameSink::new()),
    };

    let mut capture = CaptureLoop::new(&vision, source, sink, bus.clone())?;
    let stop = capture.stop_handle();
    let max_frames = opts.max_frames;
    let mut task = tokio::task::spawn_blocking(move || capture.run(max_frames));

    let stats = tokio::select! {
        joined = &mut task => joined?,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            stop.stop();
            task.await?
        }
    };

    registry.detach(bus.as_ref());

    if let Some(path) = &opts.dump_telemetry {
        let snapshot = bus.snapshot()?;
        std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)
            .with_context(|| format!("writing telemetry to {}", path.display()))?;
        info!("Telemetry written to {}", path.display());
    }
    Ok(stats)
}
