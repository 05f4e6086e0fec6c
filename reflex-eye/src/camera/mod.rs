//! Camera sources, output sinks and switched cameras

pub mod registry;
pub mod sink;
pub mod source;
pub mod switched;

pub use registry::CameraRegistry;
pub use sink::{FrameSink, ImageDirSink, LatestFrameSink};
pub use source::{ImageSequenceSource, VideoSource};
pub use switched::{SelectorPhase, SourceSelector, SwitchedCamera};
