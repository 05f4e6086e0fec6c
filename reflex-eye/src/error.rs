//! Error types for reflex-eye

use reflex_core::Error as CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Frame acquisition failed: {0}")]
    Acquisition(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<VisionError> for CoreError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::Core(inner) => inner,
            VisionError::Config(msg) => CoreError::Configuration(msg),
            other => CoreError::Telemetry(format!("Vision error: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_error_display() {
        let err = VisionError::Camera("Test error".to_string());
        assert!(err.to_string().contains("Camera error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_vision_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let vision_err: VisionError = io_err.into();
        match vision_err {
            VisionError::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_vision_error_to_core_error() {
        let core_err: CoreError = VisionError::Acquisition("timeout".to_string()).into();
        match core_err {
            CoreError::Telemetry(msg) => {
                assert!(msg.contains("Vision error"));
                assert!(msg.contains("timeout"));
            }
            _ => panic!("Expected Telemetry error"),
        }

        let core_err: CoreError = VisionError::Config("bad fov".to_string()).into();
        assert!(matches!(core_err, CoreError::Configuration(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: VisionError = bad.into();
        assert!(matches!(err, VisionError::Json(_)));
    }
}
