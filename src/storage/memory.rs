//! In-memory storage backend.
//!
//! Behaves like the flash backends (typed values, read-only handles) but
//! keeps everything in RAM. Used by tests and by anything that needs a
//! throwaway device.

use super::{Namespace, NamespaceHandle, OpenMode, Storage, StorageError};
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum StoredValue {
    Str(String),
    Bool(bool),
    Int(i32),
}

/// RAM-only [`Storage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    namespaces: RefCell<HashMap<Namespace, HashMap<String, StoredValue>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored in `namespace`.
    pub fn key_count(&self, namespace: Namespace) -> usize {
        self.namespaces
            .borrow()
            .get(&namespace)
            .map_or(0, HashMap::len)
    }
}

impl Storage for MemoryStorage {
    type Handle<'a> = MemoryNamespace<'a>;

    fn open(&self, namespace: Namespace, mode: OpenMode) -> Result<MemoryNamespace<'_>, StorageError> {
        Ok(MemoryNamespace {
            storage: self,
            namespace,
            mode,
        })
    }
}

/// Open namespace of a [`MemoryStorage`].
pub struct MemoryNamespace<'a> {
    storage: &'a MemoryStorage,
    namespace: Namespace,
    mode: OpenMode,
}

impl MemoryNamespace<'_> {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.storage
            .namespaces
            .borrow()
            .get(&self.namespace)
            .and_then(|keys| keys.get(key))
            .cloned()
    }

    fn put(&mut self, key: &str, value: StoredValue) -> Result<(), StorageError> {
        if self.mode == OpenMode::ReadOnly {
            return Err(StorageError::ReadOnly(self.namespace));
        }
        self.storage
            .namespaces
            .borrow_mut()
            .entry(self.namespace)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}

fn mismatch(key: &str) -> StorageError {
    StorageError::TypeMismatch {
        key: key.to_string(),
    }
}

impl NamespaceHandle for MemoryNamespace<'_> {
    fn get_str(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.get(key) {
            None => Ok(None),
            Some(StoredValue::Str(s)) => Ok(Some(s)),
            Some(_) => Err(mismatch(key)),
        }
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.put(key, StoredValue::Str(value.to_string()))
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>, StorageError> {
        match self.get(key) {
            None => Ok(None),
            Some(StoredValue::Bool(b)) => Ok(Some(b)),
            Some(_) => Err(mismatch(key)),
        }
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StorageError> {
        self.put(key, StoredValue::Bool(value))
    }

    fn get_i32(&self, key: &str) -> Result<Option<i32>, StorageError> {
        match self.get(key) {
            None => Ok(None),
            Some(StoredValue::Int(v)) => Ok(Some(v)),
            Some(_) => Err(mismatch(key)),
        }
    }

    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), StorageError> {
        self.put(key, StoredValue::Int(value))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.mode == OpenMode::ReadOnly {
            return Err(StorageError::ReadOnly(self.namespace));
        }
        if let Some(keys) = self.storage.namespaces.borrow_mut().get_mut(&self.namespace) {
            keys.remove(key);
        }
        Ok(())
    }
}
