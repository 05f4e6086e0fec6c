//! Output streams for processed frames

use crate::error::VisionError;
use crate::Frame;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Receives one frame per capture-loop iteration
pub trait FrameSink: Send + Sync {
    fn put_frame(&self, frame: &Frame) -> Result<(), VisionError>;
}

/// Writes every `every`-th frame as `<stream>-<seq>.png`
pub struct ImageDirSink {
    dir: PathBuf,
    stream_name: String,
    every: u64,
    seq: AtomicU64,
}

impl ImageDirSink {
    pub fn new(dir: impl AsRef<Path>, stream_name: &str, every: u64) -> Result<Self, VisionError> {
        if every == 0 {
            return Err(VisionError::Config("Frame save interval must be at least 1".to_string()));
        }
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        info!("Stream '{}' writing every {} frame(s) to {}", stream_name, every, dir.display());
        Ok(Self {
            dir,
            stream_name: stream_name.to_string(),
            every,
            seq: AtomicU64::new(0),
        })
    }

    pub fn frames_received(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }
}

impl FrameSink for ImageDirSink {
    fn put_frame(&self, frame: &Frame) -> Result<(), VisionError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        if seq % self.every != 0 {
            return Ok(());
        }
        let path = self.dir.join(format!("{}-{:06}.png", self.stream_name, seq));
        frame.save(&path)?;
        Ok(())
    }
}

/// Keeps only the most recent frame in memory
#[derive(Default)]
pub struct LatestFrameSink {
    latest: RwLock<Option<Frame>>,
    count: AtomicU64,
}

impl LatestFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<Frame> {
        self.latest.read().clone()
    }

    pub fn frames_received(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl FrameSink for LatestFrameSink {
    fn put_frame(&self, frame: &Frame) -> Result<(), VisionError> {
        let mut latest = self.latest.write();
        match latest.as_mut() {
            Some(existing) if existing.dimensions() == frame.dimensions() => {
                existing.copy_from_slice(frame);
            }
            _ => *latest = Some(frame.clone()),
        }
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
