//! The frame loop
//!
//! Each cycle grabs a frame, runs the pipeline, applies exposure changes,
//! publishes the estimate with an overlay, and always hands the frame to
//! the output sink. Nothing that goes wrong inside a cycle stops the loop.

use crate::annotation::annotate;
use crate::camera::{FrameSink, VideoSource};
use crate::config::VisionConfig;
use crate::error::VisionError;
use crate::pipeline::TargetPipeline;
use crate::processing::TargetEstimate;
use crate::publisher::TargetPublisher;
use crate::Frame;
use parking_lot::RwLock;
use reflex_core::TelemetryBus;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    pub frames: u64,
    pub acquisition_failures: u64,
    pub estimates: u64,
    pub exposure_changes: u64,
}

/// Result of one loop iteration
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub acquired: bool,
    pub contours_found: usize,
    pub estimate: Option<TargetEstimate>,
}

/// Clears the loop's running flag from another thread
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<RwLock<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        *self.0.write() = false;
    }

    pub fn is_stopped(&self) -> bool {
        !*self.0.read()
    }
}

pub struct CaptureLoop {
    pipeline: TargetPipeline,
    publisher: TargetPublisher,
    source: Arc<dyn VideoSource>,
    sink: Arc<dyn FrameSink>,
    timeout: Duration,
    frame: Frame,
    last_exposure: f64,
    is_running: Arc<RwLock<bool>>,
    stats: LoopStats,
}

impl CaptureLoop {
    /// Build the loop and seed the exposure entry on the bus
    pub fn new(
        config: &VisionConfig,
        source: Arc<dyn VideoSource>,
        sink: Arc<dyn FrameSink>,
        bus: Arc<dyn TelemetryBus>,
    ) -> Result<Self, VisionError> {
        let pipeline = TargetPipeline::new(config)?;
        let publisher = TargetPublisher::new(bus, &config.telemetry)?;
        publisher.init_exposure();

        let (width, height) = config.constants.resolution;
        info!(
            "Capture loop on '{}' at {}x{}, stream '{}'",
            source.name(),
            width,
            height,
            config.stream_name
        );

        Ok(Self {
            pipeline,
            publisher,
            source,
            sink,
            timeout: config.acquire_timeout(),
            frame: Frame::new(width, height),
            last_exposure: config.telemetry.default_exposure,
            is_running: Arc::new(RwLock::new(true)),
            stats: LoopStats::default(),
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.is_running.clone())
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn last_exposure(&self) -> f64 {
        self.last_exposure
    }

    /// Frame buffer as of the last cycle, annotated if a target was found
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn run_once(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        match self.source.grab_frame(&mut self.frame, self.timeout) {
            Ok(()) => report.acquired = true,
            Err(e) => {
                self.stats.acquisition_failures += 1;
                warn!("{}", e);
            }
        }

        if report.acquired {
            let output = self.pipeline.process(&self.frame);
            report.contours_found = output.contours_found;
            if let Some(first) = &output.first_candidate {
                self.publisher.publish_first_contour(first);
            }
            report.estimate = output.estimate;
        }

        self.apply_exposure();

        if let Some(estimate) = &report.estimate {
            annotate(&mut self.frame, estimate);
            self.publisher.publish_estimate(estimate);
            self.stats.estimates += 1;
        }

        if let Err(e) = self.sink.put_frame(&self.frame) {
            warn!("Failed to publish frame: {}", e);
        }
        self.stats.frames += 1;
        report
    }

    /// Loop until stopped or `max_frames` cycles have run
    pub fn run(&mut self, max_frames: Option<u64>) -> LoopStats {
        let start = self.stats.frames;
        while *self.is_running.read() {
            if max_frames.map_or(false, |max| self.stats.frames - start >= max) {
                break;
            }
            self.run_once();
        }
        info!("Capture loop finished: {:?}", self.stats);
        self.stats
    }

    fn apply_exposure(&mut self) {
        let exposure = self.publisher.read_exposure();
        if !exposure.is_finite() || exposure == self.last_exposure {
            return;
        }
        // A failed push leaves the old value so the next cycle retries it
        match self.source.set_exposure_manual(exposure as i32) {
            Ok(()) => {
                self.last_exposure = exposure;
                self.stats.exposure_changes += 1;
                info!("Exposure set to {}", exposure as i32);
                debug!("Exposure applied to '{}'", self.source.name());
            }
            Err(e) => warn!("Failed to set exposure on '{}': {}", self.source.name(), e),
        }
    }
}
