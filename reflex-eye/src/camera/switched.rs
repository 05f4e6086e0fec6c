//! Runtime-selectable camera and the telemetry-driven selector behind it

use crate::camera::source::VideoSource;
use crate::error::VisionError;
use crate::Frame;
use parking_lot::{Mutex, RwLock};
use reflex_core::{EntryNotification, ListenerHandle, TelemetryBus, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A logical camera backed by one of several physical cameras
///
/// The binding is swapped under a write lock; readers clone the bound `Arc`
/// and release the lock before grabbing, so a rebind never waits on a
/// frame acquisition and a grab never sees a half-updated binding.
pub struct SwitchedCamera {
    name: String,
    cameras: Vec<Arc<dyn VideoSource>>,
    current: RwLock<Option<usize>>,
}

impl SwitchedCamera {
    pub fn new(name: &str, cameras: Vec<Arc<dyn VideoSource>>) -> Self {
        Self {
            name: name.to_string(),
            cameras,
            current: RwLock::new(None),
        }
    }

    pub fn cameras(&self) -> &[Arc<dyn VideoSource>] {
        &self.cameras
    }

    pub fn current_index(&self) -> Option<usize> {
        *self.current.read()
    }

    /// Bind to `index`; out-of-range indices leave the binding untouched
    pub fn bind(&self, index: usize) -> bool {
        if index >= self.cameras.len() {
            return false;
        }
        *self.current.write() = Some(index);
        true
    }

    fn bound(&self) -> Option<Arc<dyn VideoSource>> {
        let current = *self.current.read();
        current.and_then(|i| self.cameras.get(i).cloned())
    }
}

impl VideoSource for SwitchedCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn grab_frame(&self, frame: &mut Frame, timeout: Duration) -> Result<(), VisionError> {
        match self.bound() {
            Some(camera) => camera.grab_frame(frame, timeout),
            None => Err(VisionError::Acquisition(format!(
                "Switched camera '{}' has no source selected",
                self.name
            ))),
        }
    }

    fn set_exposure_manual(&self, value: i32) -> Result<(), VisionError> {
        match self.bound() {
            Some(camera) => camera.set_exposure_manual(value),
            None => Ok(()),
        }
    }
}

/// Where a selector is within one notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorPhase {
    Idle,
    Resolving,
    Bound,
}

/// Rebinds a [`SwitchedCamera`] whenever its selection key changes
///
/// A numeric value is an index into the camera list, truncated toward
/// zero. A string value is matched exactly against camera names, first
/// match wins. Anything unresolved keeps the previous binding.
pub struct SourceSelector {
    key: String,
    camera: Arc<SwitchedCamera>,
    phase: Mutex<SelectorPhase>,
}

impl SourceSelector {
    pub fn new(key: &str, camera: Arc<SwitchedCamera>) -> Self {
        Self {
            key: key.to_string(),
            camera,
            phase: Mutex::new(SelectorPhase::Idle),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn camera(&self) -> &Arc<SwitchedCamera> {
        &self.camera
    }

    pub fn phase(&self) -> SelectorPhase {
        *self.phase.lock()
    }

    pub fn resolve(&self, value: &Value) -> Option<usize> {
        let cameras = self.camera.cameras();
        match value {
            Value::Double(n) => {
                let index = n.trunc();
                if index.is_finite() && index >= 0.0 && index < cameras.len() as f64 {
                    Some(index as usize)
                } else {
                    None
                }
            }
            Value::String(name) => cameras.iter().position(|c| c.name() == name.as_str()),
            Value::Boolean(_) => None,
        }
    }

    /// Handle one notification; returns the index bound, if any
    pub fn on_value(&self, value: &Value) -> Option<usize> {
        // Held for the whole update so concurrent notifications apply in turn
        let mut phase = self.phase.lock();
        *phase = SelectorPhase::Resolving;

        let resolved = self.resolve(value);
        match resolved {
            Some(index) if self.camera.bind(index) => {
                *phase = SelectorPhase::Bound;
                info!(
                    "Switched camera '{}' now on '{}'",
                    self.camera.name(),
                    self.camera.cameras()[index].name()
                );
            }
            _ => debug!(
                "Switched camera '{}': could not resolve {:?} from '{}'",
                self.camera.name(),
                value,
                self.key
            ),
        }

        *phase = SelectorPhase::Idle;
        resolved
    }

    /// Subscribe to the selection key; fires at once if it already has a value
    pub fn attach(self: &Arc<Self>, bus: &dyn TelemetryBus) -> ListenerHandle {
        let selector = Arc::clone(self);
        bus.add_listener(
            &self.key,
            Arc::new(move |n: &EntryNotification| {
                selector.on_value(&n.value);
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use reflex_core::MemoryBus;

    struct Solid {
        name: String,
        color: [u8; 3],
        exposure: Mutex<Option<i32>>,
    }

    impl Solid {
        fn new(name: &str, color: [u8; 3]) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                color,
                exposure: Mutex::new(None),
            })
        }
    }

    impl VideoSource for Solid {
        fn name(&self) -> &str {
            &self.name
        }

        fn grab_frame(&self, frame: &mut Frame, _timeout: Duration) -> Result<(), VisionError> {
            *frame = Frame::from_pixel(2, 2, Rgb(self.color));
            Ok(())
        }

        fn set_exposure_manual(&self, value: i32) -> Result<(), VisionError> {
            *self.exposure.lock() = Some(value);
            Ok(())
        }
    }

    fn switched() -> (Arc<Solid>, Arc<Solid>, Arc<SwitchedCamera>) {
        let front = Solid::new("Front", [255, 0, 0]);
        let back = Solid::new("Back", [0, 0, 255]);
        let cameras: Vec<Arc<dyn VideoSource>> = vec![front.clone(), back.clone()];
        (front, back, Arc::new(SwitchedCamera::new("Switched", cameras)))
    }

    #[test]
    fn test_unbound_grab_fails() {
        let (_, _, camera) = switched();
        let mut frame = Frame::new(1, 1);
        assert!(matches!(
            camera.grab_frame(&mut frame, Duration::from_millis(1)),
            Err(VisionError::Acquisition(_))
        ));
        assert!(camera.set_exposure_manual(3).is_ok());
    }

    #[test]
    fn test_grab_and_exposure_follow_binding() {
        let (front, back, camera) = switched();
        let mut frame = Frame::new(1, 1);
        assert!(camera.bind(1));
        camera.grab_frame(&mut frame, Duration::from_millis(1)).unwrap();
        assert_eq!(frame.get_pixel(0, 0), &Rgb([0, 0, 255]));
        camera.set_exposure_manual(12).unwrap();
        assert_eq!(*back.exposure.lock(), Some(12));
        assert_eq!(*front.exposure.lock(), None);
        assert!(!camera.bind(2));
        assert_eq!(camera.current_index(), Some(1));
    }

    #[test]
    fn test_resolve_rules() {
        let (_, _, camera) = switched();
        let selector = SourceSelector::new("/camera/select", camera);
        assert_eq!(selector.resolve(&Value::Double(1.9)), Some(1));
        assert_eq!(selector.resolve(&Value::Double(-0.5)), Some(0));
        assert_eq!(selector.resolve(&Value::Double(-1.0)), None);
        assert_eq!(selector.resolve(&Value::Double(2.0)), None);
        assert_eq!(selector.resolve(&Value::Double(f64::NAN)), None);
        assert_eq!(selector.resolve(&Value::Double(f64::INFINITY)), None);
        assert_eq!(selector.resolve(&Value::from("Back")), Some(1));
        assert_eq!(selector.resolve(&Value::from("back")), None);
        assert_eq!(selector.resolve(&Value::Boolean(true)), None);
    }

    #[test]
    fn test_attach_fires_on_existing_value() {
        let bus = MemoryBus::new();
        bus.put("/camera/select", Value::from("Back"));
        let (_, _, camera) = switched();
        let selector = Arc::new(SourceSelector::new("/camera/select", camera.clone()));
        selector.attach(&bus);
        assert_eq!(camera.current_index(), Some(1));
        assert_eq!(selector.phase(), SelectorPhase::Idle);

        bus.put("/camera/select", Value::Double(0.0));
        assert_eq!(camera.current_index(), Some(0));
        bus.put("/camera/select", Value::from("Side"));
        assert_eq!(camera.current_index(), Some(0));
    }
}
