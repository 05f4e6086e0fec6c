//! Cameras built from the server configuration, plus their switched views

use crate::camera::source::{ImageSequenceSource, VideoSource};
use crate::camera::switched::{SourceSelector, SwitchedCamera};
use crate::error::VisionError;
use crate::server_config::{ServerConfig, SwitchedCameraSpec};
use reflex_core::{ListenerHandle, TelemetryBus};
use std::sync::Arc;
use tracing::info;

const DEFAULT_FPS: u32 = 30;

struct SwitchedEntry {
    camera: Arc<SwitchedCamera>,
    selector: Arc<SourceSelector>,
    handle: ListenerHandle,
}

/// Every camera started for a session
pub struct CameraRegistry {
    cameras: Vec<Arc<dyn VideoSource>>,
    switched: Vec<SwitchedEntry>,
}

impl CameraRegistry {
    /// Start the configured cameras, then the switched cameras over them
    pub fn start(
        config: &ServerConfig,
        resolution: (u32, u32),
        bus: &dyn TelemetryBus,
    ) -> Result<Self, VisionError> {
        let mut cameras: Vec<Arc<dyn VideoSource>> = Vec::with_capacity(config.cameras.len());
        for spec in &config.cameras {
            info!("Starting camera '{}' on {}", spec.name, spec.path);
            let source = ImageSequenceSource::open(
                &spec.name,
                &spec.path,
                resolution,
                spec.fps.unwrap_or(DEFAULT_FPS),
            )
            .map_err(|e| match e {
                VisionError::Camera(msg) => VisionError::Config(msg),
                other => other,
            })?;
            cameras.push(Arc::new(source));
        }

        let mut registry = Self::with_cameras(cameras);
        for spec in &config.switched_cameras {
            registry.start_switched(spec, bus);
        }
        Ok(registry)
    }

    pub fn with_cameras(cameras: Vec<Arc<dyn VideoSource>>) -> Self {
        Self {
            cameras,
            switched: Vec::new(),
        }
    }

    pub fn start_switched(
        &mut self,
        spec: &SwitchedCameraSpec,
        bus: &dyn TelemetryBus,
    ) -> Arc<SwitchedCamera> {
        info!("Starting switched camera '{}' on {}", spec.name, spec.key);
        let camera = Arc::new(SwitchedCamera::new(&spec.name, self.cameras.clone()));
        let selector = Arc::new(SourceSelector::new(&spec.key, camera.clone()));
        let handle = selector.attach(bus);
        self.switched.push(SwitchedEntry {
            camera: camera.clone(),
            selector,
            handle,
        });
        camera
    }

    pub fn cameras(&self) -> &[Arc<dyn VideoSource>] {
        &self.cameras
    }

    pub fn switched(&self) -> impl Iterator<Item = &Arc<SwitchedCamera>> {
        self.switched.iter().map(|e| &e.camera)
    }

    pub fn selectors(&self) -> impl Iterator<Item = &Arc<SourceSelector>> {
        self.switched.iter().map(|e| &e.selector)
    }

    /// Physical cameras first, then switched cameras
    pub fn find(&self, name: &str) -> Option<Arc<dyn VideoSource>> {
        self.cameras
            .iter()
            .find(|c| c.name() == name)
            .cloned()
            .or_else(|| {
                self.switched
                    .iter()
                    .find(|e| e.camera.name() == name)
                    .map(|e| e.camera.clone() as Arc<dyn VideoSource>)
            })
    }

    pub fn primary(&self) -> Option<Arc<dyn VideoSource>> {
        self.cameras.first().cloned()
    }

    /// The camera the capture loop should read from
    pub fn select(&self, name: Option<&str>) -> Result<Arc<dyn VideoSource>, VisionError> {
        match name {
            Some(name) => self
                .find(name)
                .ok_or_else(|| VisionError::Config(format!("No camera named '{}'", name))),
            None => self
                .primary()
                .ok_or_else(|| VisionError::Config("No cameras configured".to_string())),
        }
    }

    /// Unsubscribe every selector from `bus`
    pub fn detach(&self, bus: &dyn TelemetryBus) {
        for entry in &self.switched {
            bus.remove_listener(entry.handle);
        }
    }
}
