//! reflex-core: shared plumbing for the reflex vision stack
//!
//! Holds the error type used across crates and the key/value telemetry bus
//! the vision loop publishes its estimates to.

pub mod error;
pub mod telemetry;

pub use error::{Error, Result};
pub use telemetry::{
    EntryNotification, Listener, ListenerHandle, MemoryBus, NotifyKind, Table, TelemetryBus, Value,
};
