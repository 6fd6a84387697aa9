use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};

use rosterly_core::ports::{StagingError, StagingStore};

/// Durable staging state as a single JSON object on disk. Every write
/// rewrites the whole document; the file stays small (one key per
/// staged concern), which keeps partial-update handling out of readers.
pub struct JsonFileStagingStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStagingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), guard: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>, StagingError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            other => Err(StagingError::Malformed(format!(
                "expected a JSON object at `{}`, found {}",
                self.path.display(),
                value_kind(&other)
            ))),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), StagingError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let rendered = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, rendered)?;
        Ok(())
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl StagingStore for JsonFileStagingStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StagingError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let document = self.read_document()?;
        Ok(document.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StagingError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document = self.read_document()?;
        document.insert(key.to_string(), value);
        self.write_document(&document)
    }

    fn remove(&self, key: &str) -> Result<(), StagingError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document = self.read_document()?;
        if document.remove(key).is_some() {
            self.write_document(&document)?;
        }
        Ok(())
    }
}
