//! NVS flash storage for ESP32.
//!
//! Every [`Storage::open`] creates a fresh `EspNvs` handle on the shared
//! default partition; dropping the handle closes the namespace. ESP-IDF
//! commits each `set_*` before returning.

use super::{Namespace, NamespaceHandle, OpenMode, Storage, StorageError};
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

/// Largest string value read back from NVS (names, SSIDs, passwords).
const MAX_STR_LEN: usize = 96;

/// [`Storage`] on the ESP-IDF default NVS partition.
#[derive(Clone)]
pub struct NvsStorage {
    partition: EspDefaultNvsPartition,
}

impl NvsStorage {
    /// Use an already-taken default partition.
    pub fn new(partition: EspDefaultNvsPartition) -> Self {
        Self { partition }
    }
}

impl Storage for NvsStorage {
    type Handle<'a> = NvsNamespace;

    fn open(&self, namespace: Namespace, mode: OpenMode) -> Result<NvsNamespace, StorageError> {
        let nvs = EspNvs::new(
            self.partition.clone(),
            namespace.as_str(),
            mode == OpenMode::ReadWrite,
        )?;
        Ok(NvsNamespace {
            nvs,
            namespace,
            mode,
        })
    }
}

/// Open NVS namespace.
pub struct NvsNamespace {
    nvs: EspNvs<NvsDefault>,
    namespace: Namespace,
    mode: OpenMode,
}

impl NvsNamespace {
    fn writable(&self) -> Result<(), StorageError> {
        match self.mode {
            OpenMode::ReadWrite => Ok(()),
            OpenMode::ReadOnly => Err(StorageError::ReadOnly(self.namespace)),
        }
    }
}

impl NamespaceHandle for NvsNamespace {
    fn get_str(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut buf = [0u8; MAX_STR_LEN + 1];
        Ok(self.nvs.get_str(key, &mut buf)?.map(str::to_string))
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writable()?;
        self.nvs.set_str(key, value)?;
        Ok(())
    }

    // NVS has no bool type; stored as u8.
    fn get_bool(&self, key: &str) -> Result<Option<bool>, StorageError> {
        Ok(self.nvs.get_u8(key)?.map(|v| v != 0))
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StorageError> {
        self.writable()?;
        self.nvs.set_u8(key, u8::from(value))?;
        Ok(())
    }

    fn get_i32(&self, key: &str) -> Result<Option<i32>, StorageError> {
        Ok(self.nvs.get_i32(key)?)
    }

    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), StorageError> {
        self.writable()?;
        self.nvs.set_i32(key, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.writable()?;
        self.nvs.remove(key)?;
        Ok(())
    }
}
