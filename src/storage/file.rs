//! File-backed storage for host builds.
//!
//! Each namespace is a JSON object in `<dir>/<namespace>.json`. Opening a
//! namespace loads the file; every write rewrites it through a temporary
//! file, syncs it and renames it into place before returning, so a value is
//! on disk once the setter returns. A file that no longer decodes fails
//! read-only opens and is started over by the next writer.

use super::{Namespace, NamespaceHandle, OpenMode, Storage, StorageError};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// [`Storage`] that keeps each namespace in a JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` as the storage root. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, namespace: Namespace) -> PathBuf {
        self.dir.join(format!("{}.json", namespace.as_str()))
    }
}

impl Storage for FileStorage {
    type Handle<'a> = FileNamespace;

    fn open(&self, namespace: Namespace, mode: OpenMode) -> Result<FileNamespace, StorageError> {
        let path = self.path_for(namespace);
        let values = match fs::read_to_string(&path) {
            Ok(text) => match decode(&path, &text) {
                Ok(map) => map,
                // A writer starts over so the next write replaces the bad file.
                Err(e) if mode == OpenMode::ReadWrite => {
                    warn!("Discarding namespace '{}': {}", namespace, e);
                    Map::new()
                }
                Err(e) => return Err(e),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No file for namespace '{}' at {:?}", namespace, path);
                Map::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(FileNamespace {
            path,
            namespace,
            mode,
            values,
        })
    }
}

fn decode(path: &Path, text: &str) -> Result<Map<String, Value>, StorageError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StorageError::Corrupted(format!(
            "{:?} does not hold an object",
            path
        ))),
        Err(e) => Err(StorageError::Corrupted(format!("{:?}: {}", path, e))),
    }
}

/// Open namespace of a [`FileStorage`].
pub struct FileNamespace {
    path: PathBuf,
    namespace: Namespace,
    mode: OpenMode,
    values: Map<String, Value>,
}

impl FileNamespace {
    fn put(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        if self.mode == OpenMode::ReadOnly {
            return Err(StorageError::ReadOnly(self.namespace));
        }
        self.values.insert(key.to_string(), value);
        self.flush()
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let text = serde_json::to_string_pretty(&self.values)
            .map_err(|e| StorageError::Corrupted(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn mismatch(key: &str) -> StorageError {
        StorageError::TypeMismatch {
            key: key.to_string(),
        }
    }
}

impl NamespaceHandle for FileNamespace {
    fn get_str(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(Self::mismatch(key)),
        }
    }

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.put(key, Value::String(value.to_string()))
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>, StorageError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(Self::mismatch(key)),
        }
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), StorageError> {
        self.put(key, Value::Bool(value))
    }

    fn get_i32(&self, key: &str) -> Result<Option<i32>, StorageError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| Self::mismatch(key)),
        }
    }

    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), StorageError> {
        self.put(key, Value::from(value))
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.mode == OpenMode::ReadOnly {
            return Err(StorageError::ReadOnly(self.namespace));
        }
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
