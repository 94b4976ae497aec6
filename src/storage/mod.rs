//! Namespaced key/value persistence.
//!
//! Configuration survives reboots in three namespaces:
//!
//! | Namespace | Keys |
//! |-----------|------|
//! | `wifi`    | `ssid`, `pass` |
//! | `config`  | `schema`, `device`, `numLights`, `light<i>` |
//! | `light`   | `state<i>` |
//!
//! A [`Storage`] backend hands out one [`NamespaceHandle`] per
//! [`Storage::open`] call. The handle is the open namespace: reads and writes
//! go through it and dropping it closes the namespace. Writes are durable
//! when the setter returns, since callers may restart the device right after.
//!
//! [`ConfigStore`] wraps a backend with the typed `get`-with-default /
//! `set` contract used by the rest of the firmware.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - in RAM, for tests
//! - [`FileStorage`] - one JSON file per namespace (host only)
//! - [`NvsStorage`] - ESP-IDF NVS flash (ESP32 only)

use log::{debug, info, warn};
use std::fmt;

#[cfg(not(feature = "esp32"))]
mod file;
mod memory;
#[cfg(feature = "esp32")]
mod nvs;

#[cfg(not(feature = "esp32"))]
pub use file::FileStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "esp32")]
pub use nvs::NvsStorage;

/// Current layout version written to `config/schema`.
pub const SCHEMA_VERSION: i32 = 1;

/// Key holding the layout version inside [`Namespace::Config`].
pub const SCHEMA_KEY: &str = "schema";

/// Storage partitions used by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// WiFi station credentials.
    Wifi,
    /// Device identity and light configuration.
    Config,
    /// Persisted light states.
    Light,
}

impl Namespace {
    /// Name of the namespace as stored on the medium.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wifi => "wifi",
            Self::Config => "config",
            Self::Light => "light",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a namespace is opened for reading only or for writing too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

/// A key/value backend partitioned into namespaces.
pub trait Storage {
    /// An open namespace. Dropping it closes the namespace.
    type Handle<'a>: NamespaceHandle
    where
        Self: 'a;

    /// Open `namespace`. Read-only opens of a namespace that was never
    /// written may fail; callers treat that as "every key unset".
    fn open(&self, namespace: Namespace, mode: OpenMode) -> Result<Self::Handle<'_>, StorageError>;
}

/// Typed access to the keys of one open namespace.
///
/// Getters return `Ok(None)` for keys that are not set.
pub trait NamespaceHandle {
    fn get_str(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn get_bool(&self, key: &str) -> Result<Option<bool>, StorageError>;
    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StorageError>;
    fn get_i32(&self, key: &str) -> Result<Option<i32>, StorageError>;
    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), StorageError>;
    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Errors reported by storage backends.
#[derive(Debug)]
pub enum StorageError {
    /// Write attempted through a read-only handle.
    ReadOnly(Namespace),
    /// A key holds a value of a different type than requested.
    TypeMismatch { key: String },
    /// Stored data could not be decoded.
    Corrupted(String),
    /// Filesystem error (host backend).
    Io(std::io::Error),
    /// ESP-IDF NVS error.
    #[cfg(feature = "esp32")]
    Esp(esp_idf_sys::EspError),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly(ns) => write!(f, "namespace '{}' is open read-only", ns),
            Self::TypeMismatch { key } => write!(f, "key '{}' holds a different type", key),
            Self::Corrupted(reason) => write!(f, "corrupted storage: {}", reason),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            #[cfg(feature = "esp32")]
            Self::Esp(e) => write!(f, "NVS error: {:?}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(feature = "esp32")]
impl From<esp_idf_sys::EspError> for StorageError {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Self::Esp(e)
    }
}

/// Typed configuration store over a [`Storage`] backend.
///
/// Each call opens the namespace, performs the operation and closes it again,
/// so no namespace stays open across a connection attempt or a delay.
pub struct ConfigStore<S> {
    backend: S,
}

impl<S: Storage> ConfigStore<S> {
    /// Wrap a storage backend.
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Give the backend back (used when the device shuts down).
    pub fn into_inner(self) -> S {
        self.backend
    }

    /// Borrow the backend.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Read a string, falling back to `default` when unset or unreadable.
    pub fn get_str(&self, namespace: Namespace, key: &str, default: &str) -> String {
        self.read(namespace, key, |h, k| h.get_str(k))
            .unwrap_or_else(|| default.to_string())
    }

    /// Read a boolean, falling back to `default` when unset or unreadable.
    pub fn get_bool(&self, namespace: Namespace, key: &str, default: bool) -> bool {
        self.read(namespace, key, |h, k| h.get_bool(k))
            .unwrap_or(default)
    }

    /// Read an integer, falling back to `default` when unset or unreadable.
    pub fn get_i32(&self, namespace: Namespace, key: &str, default: i32) -> i32 {
        self.read(namespace, key, |h, k| h.get_i32(k))
            .unwrap_or(default)
    }

    /// Overwrite a string value.
    pub fn set_str(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(namespace, |h| h.set_str(key, value))
    }

    /// Overwrite a boolean value.
    pub fn set_bool(&self, namespace: Namespace, key: &str, value: bool) -> Result<(), StorageError> {
        self.write(namespace, |h| h.set_bool(key, value))
    }

    /// Overwrite an integer value.
    pub fn set_i32(&self, namespace: Namespace, key: &str, value: i32) -> Result<(), StorageError> {
        self.write(namespace, |h| h.set_i32(key, value))
    }

    /// Run several operations against one open namespace.
    ///
    /// The namespace is closed when `f` returns.
    pub fn with_namespace<'s, T>(
        &'s self,
        namespace: Namespace,
        mode: OpenMode,
        f: impl FnOnce(&mut S::Handle<'s>) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut handle = self.backend.open(namespace, mode)?;
        f(&mut handle)
    }

    /// Stamp the layout version.
    ///
    /// There are no older layouts to migrate from yet; an absent or older
    /// version is simply overwritten. A newer version (firmware downgrade)
    /// is logged and the data read best-effort.
    pub fn ensure_schema(&self) {
        let stored = self.read(Namespace::Config, SCHEMA_KEY, |h, k| h.get_i32(k));
        match stored {
            Some(v) if v == SCHEMA_VERSION => debug!("Storage schema v{}", v),
            Some(v) if v > SCHEMA_VERSION => warn!(
                "Storage schema v{} is newer than supported v{}, reading best-effort",
                v, SCHEMA_VERSION
            ),
            _ => {
                info!("Stamping storage schema v{}", SCHEMA_VERSION);
                if let Err(e) = self.set_i32(Namespace::Config, SCHEMA_KEY, SCHEMA_VERSION) {
                    warn!("Failed to write storage schema: {}", e);
                }
            }
        }
    }

    fn read<'s, T>(
        &'s self,
        namespace: Namespace,
        key: &str,
        get: impl FnOnce(&S::Handle<'s>, &str) -> Result<Option<T>, StorageError>,
    ) -> Option<T> {
        let handle = match self.backend.open(namespace, OpenMode::ReadOnly) {
            Ok(handle) => handle,
            Err(e) => {
                debug!("Namespace '{}' unavailable, using default: {}", namespace, e);
                return None;
            }
        };
        match get(&handle, key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read {}/{}: {}", namespace, key, e);
                None
            }
        }
    }

    fn write<'s>(
        &'s self,
        namespace: Namespace,
        set: impl FnOnce(&mut S::Handle<'s>) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        let mut handle = self.backend.open(namespace, OpenMode::ReadWrite)?;
        set(&mut handle)
    }
}
