//! Key/value telemetry bus
//!
//! The robot controller and the dashboard share a flat namespace of values.
//! Vision code reads a handful of control values from it and publishes its
//! estimates back. Writes are last-write-wins per key; there is no
//! transactional grouping across keys.

use crate::error::{Error, Result};
use parking_lot::{ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// A single value stored on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Double(f64),
    String(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Double(_) => "double",
            Value::String(_) => "string",
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// Why a listener is being called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    /// Delivered once when the listener attaches to a key that already has a value
    Immediate,
    /// The key did not exist before this write
    New,
    /// The key existed and the write changed its value
    Update,
}

#[derive(Debug, Clone)]
pub struct EntryNotification {
    pub key: String,
    pub value: Value,
    pub kind: NotifyKind,
}

pub type Listener = Arc<dyn Fn(&EntryNotification) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

/// Shared key/value store with change notifications
pub trait TelemetryBus: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn put(&self, key: &str, value: Value);

    /// Attach a listener to `key`. It fires immediately if the key has a
    /// value, then on every creation or change of that key.
    fn add_listener(&self, key: &str, listener: Listener) -> ListenerHandle;

    fn remove_listener(&self, handle: ListenerHandle) -> bool;

    fn get_number(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(|v| v.as_f64()).unwrap_or(default)
    }

    fn put_number(&self, key: &str, value: f64) {
        self.put(key, Value::Double(value));
    }

    /// Strict read: a missing key is `Ok(None)`, a non-numeric value is an error.
    fn try_get_number(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Double(v)) => Ok(Some(v)),
            Some(other) => Err(Error::TypeMismatch {
                key: key.to_string(),
                expected: "double".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }
}

/// Named sub-table view: keys are stored as `/<table>/<key>`
#[derive(Clone)]
pub struct Table {
    bus: Arc<dyn TelemetryBus>,
    name: String,
}

impl Table {
    pub fn new(bus: Arc<dyn TelemetryBus>, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::Telemetry("Table name must not be empty".to_string()));
        }
        if name.contains('/') {
            return Err(Error::Telemetry(format!(
                "Table name '{}' must not contain '/'",
                name
            )));
        }
        Ok(Self {
            bus,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully qualified bus key for `key` in this table
    pub fn path(&self, key: &str) -> String {
        format!("/{}/{}", self.name, key)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.bus.get(&self.path(key))
    }

    pub fn get_number(&self, key: &str, default: f64) -> f64 {
        self.bus.get_number(&self.path(key), default)
    }

    pub fn put_number(&self, key: &str, value: f64) {
        self.bus.put_number(&self.path(key), value);
    }

    pub fn put_string(&self, key: &str, value: &str) {
        self.bus.put(&self.path(key), Value::from(value));
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}

/// In-process bus
///
/// Listeners run on the writer's thread with the entry and listener maps
/// unlocked, so a listener may read or write the bus itself. Deliveries are
/// serialized bus-wide and arrive in the order the writes were stored.
pub struct MemoryBus {
    entries: RwLock<HashMap<String, Value>>,
    // Taken before a store and held until its listeners return
    delivery: ReentrantMutex<()>,
    listeners: RwLock<HashMap<String, Vec<(ListenerHandle, Listener)>>>,
    next_listener: AtomicU64,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            delivery: ReentrantMutex::new(()),
            listeners: RwLock::new(HashMap::new()),
            next_listener: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Sorted JSON object of every key currently on the bus
    pub fn snapshot(&self) -> Result<serde_json::Value> {
        let sorted: BTreeMap<String, Value> = self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::to_value(sorted).map_err(|e| Error::Serialization(e.to_string()))
    }

    fn notify(&self, key: &str, value: &Value, kind: NotifyKind) {
        let targets: Vec<Listener> = match self.listeners.read().get(key) {
            Some(list) => list.iter().map(|(_, l)| l.clone()).collect(),
            None => return,
        };
        let notification = EntryNotification {
            key: key.to_string(),
            value: value.clone(),
            kind,
        };
        for listener in targets {
            listener(&notification);
        }
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryBus for MemoryBus {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: Value) {
        let _delivery = self.delivery.lock();
        let kind = {
            let mut entries = self.entries.write();
            match entries.insert(key.to_string(), value.clone()) {
                None => Some(NotifyKind::New),
                Some(previous) if previous == value => None,
                Some(_) => Some(NotifyKind::Update),
            }
        };
        trace!("put {} = {:?}", key, value);
        if let Some(kind) = kind {
            self.notify(key, &value, kind);
        }
    }

    fn add_listener(&self, key: &str, listener: Listener) -> ListenerHandle {
        let handle = ListenerHandle(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let _delivery = self.delivery.lock();
        self.listeners
            .write()
            .entry(key.to_string())
            .or_default()
            .push((handle, listener.clone()));
        debug!("Listener {:?} attached to '{}'", handle, key);

        if let Some(current) = self.get(key) {
            listener(&EntryNotification {
                key: key.to_string(),
                value: current,
                kind: NotifyKind::Immediate,
            });
        }
        handle
    }

    fn remove_listener(&self, handle: ListenerHandle) -> bool {
        let mut listeners = self.listeners.write();
        for list in listeners.values_mut() {
            if let Some(pos) = list.iter().position(|(h, _)| *h == handle) {
                list.remove(pos);
                return true;
            }
        }
        false
    }
}
