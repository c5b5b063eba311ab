use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::ports::KeyValueStore;

/// Key-value store persisted as a single JSON object on disk.
///
/// A missing file reads as an empty store. Writes replace the whole file
/// through a temporary sibling and a rename so readers never observe a
/// partially written object.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("store file {:?} not found, starting empty", self.path);
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(map) => Ok(map),
            other => Err(TransportError::Backend(format!(
                "store file {} holds {} instead of an object",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(map)?;
        let tmp_path = self.path.with_extension("json.tmp");
        if let Err(e) = publish(&tmp_path, &self.path, &bytes).await {
            match tokio::fs::remove_file(&tmp_path).await {
                Err(cleanup) if cleanup.kind() != std::io::ErrorKind::NotFound => {
                    warn!("failed to remove {:?}: {}", tmp_path, cleanup);
                }
                _ => {}
            }
            return Err(e.into());
        }
        Ok(())
    }
}

/// Write `bytes` to `tmp_path`, sync it, then rename it over `path`.
async fn publish(tmp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(tmp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(tmp_path, path).await
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        map.insert(key.to_string(), value);
        self.write_all(&map).await
    }
}
