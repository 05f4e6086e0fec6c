//! Frame sources

use crate::error::VisionError;
use crate::Frame;
use image::imageops::{self, FilterType};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A camera the capture loop can pull frames from
///
/// Implementations are shared between the capture thread and whatever
/// thread delivers control changes, so every method takes `&self`.
pub trait VideoSource: Send + Sync {
    fn name(&self) -> &str;

    /// Overwrite `frame` with the next image, blocking at most `timeout`
    fn grab_frame(&self, frame: &mut Frame, timeout: Duration) -> Result<(), VisionError>;

    fn set_exposure_manual(&self, value: i32) -> Result<(), VisionError>;
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

struct SequenceState {
    cursor: usize,
    last_grab: Option<Instant>,
    exposure: Option<i32>,
}

/// Replays still images from disk as a paced camera
///
/// A directory is played in lexicographic file order and loops; a single
/// file is served on every grab. Images are resized to the session
/// resolution when they differ.
pub struct ImageSequenceSource {
    name: String,
    files: Vec<PathBuf>,
    resolution: (u32, u32),
    frame_interval: Duration,
    state: Mutex<SequenceState>,
}

impl ImageSequenceSource {
    pub fn open(
        name: &str,
        path: impl AsRef<Path>,
        resolution: (u32, u32),
        fps: u32,
    ) -> Result<Self, VisionError> {
        let path = path.as_ref();
        if resolution.0 == 0 || resolution.1 == 0 {
            return Err(VisionError::Camera("Invalid camera resolution".to_string()));
        }

        let files = if path.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_image_extension(p))
                .collect();
            files.sort();
            files
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(VisionError::Camera(format!(
                "Camera '{}': path {} is neither an image nor a directory",
                name,
                path.display()
            )));
        };

        if files.is_empty() {
            return Err(VisionError::Camera(format!(
                "Camera '{}': no images under {}",
                name,
                path.display()
            )));
        }

        let fps = if fps == 0 { 30 } else { fps };
        info!(
            "Camera '{}' replaying {} image(s) from {} at {}x{} @ {}fps",
            name,
            files.len(),
            path.display(),
            resolution.0,
            resolution.1,
            fps
        );

        Ok(Self {
            name: name.to_string(),
            files,
            resolution,
            frame_interval: Duration::from_secs_f64(1.0 / fps as f64),
            state: Mutex::new(SequenceState {
                cursor: 0,
                last_grab: None,
                exposure: None,
            }),
        })
    }

    pub fn frame_count(&self) -> usize {
        self.files.len()
    }

    /// Last manual exposure pushed to this camera
    pub fn exposure(&self) -> Option<i32> {
        self.state.lock().exposure
    }
}

impl VideoSource for ImageSequenceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn grab_frame(&self, frame: &mut Frame, timeout: Duration) -> Result<(), VisionError> {
        let mut state = self.state.lock();

        if let Some(last) = state.last_grab {
            let elapsed = last.elapsed();
            if elapsed < self.frame_interval {
                let wait = self.frame_interval - elapsed;
                if wait > timeout {
                    std::thread::sleep(timeout);
                    return Err(VisionError::Acquisition(format!(
                        "Camera '{}' timed out after {:?}",
                        self.name, timeout
                    )));
                }
                std::thread::sleep(wait);
            }
        }
        state.last_grab = Some(Instant::now());

        let path = &self.files[state.cursor];
        state.cursor = (state.cursor + 1) % self.files.len();

        let decoded = image::open(path)
            .map_err(|e| {
                VisionError::Acquisition(format!("Failed to decode {}: {}", path.display(), e))
            })?
            .to_rgb8();

        let (width, height) = self.resolution;
        *frame = if decoded.dimensions() == (width, height) {
            decoded
        } else {
            debug!(
                "Resizing {} from {:?} to {}x{}",
                path.display(),
                decoded.dimensions(),
                width,
                height
            );
            imageops::resize(&decoded, width, height, FilterType::Triangle)
        };
        Ok(())
    }

    fn set_exposure_manual(&self, value: i32) -> Result<(), VisionError> {
        self.state.lock().exposure = Some(value);
        Ok(())
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
