//! Writes pipeline results to the telemetry bus

use crate::config::TelemetryConfig;
use crate::error::VisionError;
use crate::processing::{BoundingBox, TargetEstimate};
use reflex_core::{Table, TelemetryBus};
use std::sync::Arc;

pub const KEY_FIRST_CONTOUR_X: &str = "amos_x";
pub const KEY_COSINE_QUOTIENT: &str = "weird num";
pub const KEY_BEARING_LEFT: &str = "bearing left";
pub const KEY_BEARING_RIGHT: &str = "bearing right";
pub const KEY_ELEVATION_LEFT: &str = "elevationLeft";
pub const KEY_ELEVATION_RIGHT: &str = "elevationRight";
pub const KEY_BEARING: &str = "bearing";
pub const KEY_ELEVATION: &str = "elevation";
pub const KEY_DISTANCE: &str = "distance";
pub const KEY_LEFT_DISTANCE: &str = "left d";
pub const KEY_RIGHT_DISTANCE: &str = "right d";

pub struct TargetPublisher {
    target: Table,
    dashboard: Table,
    exposure_key: String,
    default_exposure: f64,
    publish_first_contour: bool,
}

impl TargetPublisher {
    pub fn new(bus: Arc<dyn TelemetryBus>, config: &TelemetryConfig) -> Result<Self, VisionError> {
        Ok(Self {
            target: Table::new(bus.clone(), &config.target_table)?,
            dashboard: Table::new(bus, &config.dashboard_table)?,
            exposure_key: config.exposure_key.clone(),
            default_exposure: config.default_exposure,
            publish_first_contour: config.publish_first_contour,
        })
    }

    pub fn target_table(&self) -> &Table {
        &self.target
    }

    pub fn dashboard_table(&self) -> &Table {
        &self.dashboard
    }

    /// Seed the exposure entry with its default
    pub fn init_exposure(&self) {
        self.dashboard
            .put_number(&self.exposure_key, self.default_exposure);
    }

    pub fn read_exposure(&self) -> f64 {
        self.dashboard
            .get_number(&self.exposure_key, self.default_exposure)
    }

    pub fn publish_first_contour(&self, bbox: &BoundingBox) {
        if self.publish_first_contour {
            self.dashboard.put_number(KEY_FIRST_CONTOUR_X, bbox.x as f64);
        }
    }

    /// Publish every value the estimate carries; missing ones are skipped
    pub fn publish_estimate(&self, estimate: &TargetEstimate) {
        let t = &self.target;
        if let Some(quotient) = estimate.cosine_quotient {
            t.put_number(KEY_COSINE_QUOTIENT, quotient);
        }

        t.put_number(KEY_BEARING_LEFT, estimate.bearing_left);
        t.put_number(KEY_BEARING_RIGHT, estimate.bearing_right);
        t.put_number(KEY_ELEVATION_LEFT, estimate.elevation_left);
        t.put_number(KEY_ELEVATION_RIGHT, estimate.elevation_right);

        let optional = [
            (KEY_BEARING, estimate.bearing),
            (KEY_ELEVATION, estimate.elevation),
            (KEY_DISTANCE, estimate.distance),
            (KEY_LEFT_DISTANCE, estimate.left_distance),
            (KEY_RIGHT_DISTANCE, estimate.right_distance),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                t.put_number(key, v);
            }
        }
    }
}
