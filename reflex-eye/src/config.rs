//! Configuration for reflex-eye

use crate::error::VisionError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Working color space for the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// Channels are (hue, saturation, luminance); hue in [0,180], the others in [0,255]
    Hsl,
    /// Channels are (red, green, blue)
    Rgb,
}

/// Inclusive `[min, max]` interval
///
/// `min > max` is not rejected; such a bound simply admits nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn is_nan(&self) -> bool {
        self.min.is_nan() || self.max.is_nan()
    }
}

/// Color-space choice plus one range per channel, in channel order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub color_space: ColorSpace,
    pub ranges: [Bounds; 3],
}

impl ThresholdConfig {
    pub fn hsl(hue: Bounds, saturation: Bounds, luminance: Bounds) -> Self {
        Self {
            color_space: ColorSpace::Hsl,
            ranges: [hue, saturation, luminance],
        }
    }

    pub fn rgb(red: Bounds, green: Bounds, blue: Bounds) -> Self {
        Self {
            color_space: ColorSpace::Rgb,
            ranges: [red, green, blue],
        }
    }

    /// Bright, desaturated blobs: retro-reflective tape under a ring light
    pub fn hsl_default() -> Self {
        Self::hsl(
            Bounds::new(0.0, 180.0),
            Bounds::new(0.0, 64.507_640_067_911_7),
            Bounds::new(165.107_913_669_064_74, 255.0),
        )
    }

    /// Green-cyan target lit by a green LED ring
    pub fn rgb_default() -> Self {
        Self::rgb(
            Bounds::new(0.0, 43.0),
            Bounds::new(101.0, 255.0),
            Bounds::new(61.0, 255.0),
        )
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self::rgb_default()
    }
}

/// Shape and size bounds a contour has to satisfy to count as a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub min_area: f64,
    pub min_perimeter: f64,
    pub width: Bounds,
    pub height: Bounds,
    /// Percentage of contour area over convex hull area
    pub solidity: Bounds,
    pub vertices: Bounds,
    /// Width over height
    pub ratio: Bounds,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            min_area: 50.0,
            min_perimeter: 0.0,
            width: Bounds::new(0.0, 1000.0),
            height: Bounds::new(0.0, 1000.0),
            solidity: Bounds::new(0.0, 53.0),
            vertices: Bounds::new(0.0, 1_000_000.0),
            ratio: Bounds::new(0.0, 1000.0),
        }
    }
}

impl FilterCriteria {
    /// Wide, hollow strip two to three times wider than tall
    pub fn wide_strip() -> Self {
        Self {
            min_area: 200.0,
            min_perimeter: 100.0,
            width: Bounds::new(100.0, 1000.0),
            height: Bounds::new(0.0, 1000.0),
            solidity: Bounds::new(0.0, 28.692_699_490_662_132),
            vertices: Bounds::new(0.0, 1_000_000.0),
            ratio: Bounds::new(2.0, 3.0),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_area.is_nan() || self.min_perimeter.is_nan() {
            return Err("Filter minimums must be numbers".to_string());
        }
        let named = [
            ("width", &self.width),
            ("height", &self.height),
            ("solidity", &self.solidity),
            ("vertices", &self.vertices),
            ("ratio", &self.ratio),
        ];
        for (name, bounds) in named {
            if bounds.is_nan() {
                return Err(format!("Filter {} bounds must be numbers", name));
            }
        }
        Ok(())
    }
}

/// Fixed optical and physical constants of the camera mount and target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConstants {
    /// Frame size in pixels (width, height)
    pub resolution: (u32, u32),
    /// Bearing at the frame edge (normalized x = 1), degrees
    pub hfov: f64,
    /// Elevation at the frame edge (normalized y = 1), degrees
    pub vfov: f64,
    /// Upward tilt of the optical axis, degrees
    pub tilt_angle: f64,
    /// Lens height above the floor, meters
    pub camera_height: f64,
    /// Height of the tracked target edge, meters
    pub target_height: f64,
    /// Physical distance between the two tracked extreme points, meters
    pub target_width: f64,
}

impl Default for CameraConstants {
    fn default() -> Self {
        Self {
            resolution: (1280, 720),
            hfov: 70.42,
            vfov: 43.30,
            tilt_angle: 8.32,
            camera_height: 0.58,
            target_height: 1.02,
            target_width: 0.99695,
        }
    }
}

impl CameraConstants {
    /// Vertical offset between target and lens
    pub fn height_delta(&self) -> f64 {
        self.target_height - self.camera_height
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err("Resolution must be non-zero".to_string());
        }
        if self.resolution.0 > 7680 || self.resolution.1 > 4320 {
            return Err("Resolution too large (max 8K)".to_string());
        }
        if !(self.hfov > 0.0 && self.hfov < 180.0) || !(self.vfov > 0.0 && self.vfov < 180.0) {
            return Err("Field of view must be within (0, 180) degrees".to_string());
        }
        if !self.tilt_angle.is_finite() {
            return Err("Tilt angle must be finite".to_string());
        }
        if !(self.target_width > 0.0) {
            return Err("Target width must be positive".to_string());
        }
        if !self.height_delta().is_finite() {
            return Err("Camera and target heights must be finite".to_string());
        }
        Ok(())
    }
}

/// Where results go on the telemetry bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Table receiving the target estimate
    pub target_table: String,
    /// Table holding the exposure control and the first-contour diagnostic
    pub dashboard_table: String,
    pub exposure_key: String,
    pub default_exposure: f64,
    /// Publish the x of the first examined contour every frame
    pub publish_first_contour: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            target_table: "Target Info".to_string(),
            dashboard_table: "SmartDashboard".to_string(),
            exposure_key: "Exposure".to_string(),
            default_exposure: 1.0,
            publish_first_contour: true,
        }
    }
}

/// Vision system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub threshold: ThresholdConfig,
    pub filter: FilterCriteria,
    /// Only keep outermost boundaries when extracting contours
    pub external_only: bool,
    pub constants: CameraConstants,
    pub telemetry: TelemetryConfig,
    /// Name of the processed output stream
    pub stream_name: String,
    /// Upper bound on a single frame grab
    pub acquire_timeout_ms: u64,
    /// Camera or switched camera feeding the loop; first camera when unset
    pub source: Option<String>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdConfig::default(),
            filter: FilterCriteria::default(),
            external_only: false,
            constants: CameraConstants::default(),
            telemetry: TelemetryConfig::default(),
            stream_name: "Rectangle".to_string(),
            acquire_timeout_ms: 1000,
            source: None,
        }
    }
}

impl VisionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, VisionError> {
        let config: VisionConfig = toml::from_str(text)?;
        config.validate().map_err(VisionError::Config)?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.constants.validate()?;
        self.filter.validate()?;

        if self.threshold.ranges.iter().any(Bounds::is_nan) {
            return Err("Threshold bounds must be numbers".to_string());
        }
        if self.stream_name.trim().is_empty() {
            return Err("Stream name must not be empty".to_string());
        }
        if self.telemetry.target_table.is_empty() || self.telemetry.dashboard_table.is_empty() {
            return Err("Telemetry table names must not be empty".to_string());
        }
        if self.acquire_timeout_ms == 0 {
            return Err("Acquire timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}
