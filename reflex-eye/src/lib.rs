//! reflex-eye: target vision for an FRC robot camera
//!
//! Thresholds camera frames in HSL or RGB, extracts and filters region
//! boundaries, and turns the best surviving contour into bearing,
//! elevation and distance estimates published on the telemetry bus.
//!
//! Cameras are configured from the camera-server JSON file; switched
//! cameras rebind to a physical camera whenever their telemetry key changes.

pub mod annotation;
pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod processing;
pub mod publisher;
pub mod server_config;

/// Camera frame, 8-bit RGB
pub type Frame = image::RgbImage;
/// Binary mask: 255 for foreground, 0 for background
pub type Mask = image::GrayImage;

pub use camera::{
    CameraRegistry, FrameSink, ImageDirSink, ImageSequenceSource, LatestFrameSink, SourceSelector,
    SwitchedCamera, VideoSource,
};
pub use capture::{CaptureLoop, CycleReport, LoopStats, StopHandle};
pub use config::{
    Bounds, CameraConstants, ColorSpace, FilterCriteria, TelemetryConfig, ThresholdConfig,
    VisionConfig,
};
pub use error::VisionError;
pub use pipeline::{PipelineOutput, TargetPipeline};
pub use publisher::TargetPublisher;
pub use server_config::{CameraSpec, NtMode, ServerConfig, SwitchedCameraSpec};
