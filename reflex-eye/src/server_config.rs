//! Camera-server configuration (`/boot/frc.json`)
//!
//! The file lists the physical cameras to start and any switched cameras
//! driven from the telemetry bus. Required fields missing is a hard error;
//! unknown fields are kept untouched in [`CameraSpec::raw`].

use crate::error::VisionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_CONFIG_PATH: &str = "/boot/frc.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NtMode {
    #[default]
    Client,
    Server,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSpec {
    pub name: String,
    pub path: String,
    #[serde(rename = "pixel format", default)]
    pub pixel_format: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<u32>,
    #[serde(default)]
    pub brightness: Option<Json>,
    #[serde(rename = "white balance", default)]
    pub white_balance: Option<Json>,
    #[serde(default)]
    pub exposure: Option<Json>,
    #[serde(default)]
    pub properties: Option<Vec<Json>>,
    /// Stream server settings, passed through as-is
    #[serde(default)]
    pub stream: Option<Json>,
    #[serde(skip)]
    pub raw: Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchedCameraSpec {
    pub name: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub team: u32,
    pub nt_mode: NtMode,
    pub cameras: Vec<CameraSpec>,
    pub switched_cameras: Vec<SwitchedCameraSpec>,
}

fn parse_error(msg: impl Into<String>) -> VisionError {
    VisionError::Config(msg.into())
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            VisionError::Config(format!("could not open '{}': {}", path.display(), e))
        })?;
        let config = Self::from_json_str(&text).map_err(|e| match e {
            VisionError::Config(msg) => {
                VisionError::Config(format!("config error in '{}': {}", path.display(), msg))
            }
            other => other,
        })?;
        info!(
            "Loaded {} with {} camera(s), {} switched",
            path.display(),
            config.cameras.len(),
            config.switched_cameras.len()
        );
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, VisionError> {
        let root: Json = serde_json::from_str(text)?;
        let root = root
            .as_object()
            .ok_or_else(|| parse_error("must be JSON object"))?;

        let team = root
            .get("team")
            .and_then(Json::as_u64)
            .and_then(|t| u32::try_from(t).ok())
            .ok_or_else(|| parse_error("could not read team number"))?;

        let nt_mode = match root.get("ntmode") {
            None => NtMode::Client,
            Some(mode) => match mode.as_str().map(str::to_ascii_lowercase).as_deref() {
                Some("client") => NtMode::Client,
                Some("server") => NtMode::Server,
                _ => {
                    error!("could not understand ntmode value '{}'", mode);
                    NtMode::Client
                }
            },
        };

        let cameras = root
            .get("cameras")
            .and_then(Json::as_array)
            .ok_or_else(|| parse_error("could not read cameras"))?
            .iter()
            .map(parse_camera)
            .collect::<Result<Vec<_>, _>>()?;

        let switched_cameras = match root.get("switched cameras") {
            None => Vec::new(),
            Some(list) => list
                .as_array()
                .ok_or_else(|| parse_error("could not read switched cameras"))?
                .iter()
                .map(parse_switched)
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(Self {
            team,
            nt_mode,
            cameras,
            switched_cameras,
        })
    }

    pub fn find_camera(&self, name: &str) -> Option<&CameraSpec> {
        self.cameras.iter().find(|c| c.name == name)
    }
}

fn string_field<'a>(obj: &'a Map<String, Json>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Json::as_str)
}

fn parse_camera(value: &Json) -> Result<CameraSpec, VisionError> {
    let obj = value
        .as_object()
        .ok_or_else(|| parse_error("could not read camera name"))?;
    let name = string_field(obj, "name").ok_or_else(|| parse_error("could not read camera name"))?;
    if string_field(obj, "path").is_none() {
        return Err(parse_error(format!("camera '{}': could not read path", name)));
    }

    let mut spec: CameraSpec = serde_json::from_value(value.clone())
        .map_err(|e| parse_error(format!("camera '{}': {}", name, e)))?;
    spec.raw = value.clone();
    Ok(spec)
}

fn parse_switched(value: &Json) -> Result<SwitchedCameraSpec, VisionError> {
    let obj = value
        .as_object()
        .ok_or_else(|| parse_error("could not read switched camera name"))?;
    let name = string_field(obj, "name")
        .ok_or_else(|| parse_error("could not read switched camera name"))?;
    let key = string_field(obj, "key")
        .ok_or_else(|| parse_error(format!("switched camera '{}': could not read key", name)))?;
    Ok(SwitchedCameraSpec {
        name: name.to_string(),
        key: key.to_string(),
    })
}
