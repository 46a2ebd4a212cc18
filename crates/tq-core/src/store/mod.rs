//! Durable queue directory: one JSON record per item plus `order.json`.
//!
//! Every write goes to `<name>.part`, is fsynced, then renamed over the
//! target, so a crash leaves either the old record or the new one.

mod write;


use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::object::ItemStatus;

pub use write::TEMP_SUFFIX;

/// File holding the ordered list of pending ids.
pub const ORDER_FILE: &str = "order.json";

const RECORD_EXT: &str = "json";

/// Handle to a queue directory. Cheap to clone; holds no open files.
#[derive(Debug, Clone)]
pub struct QueueStore {
    dir: PathBuf,
}

impl QueueStore {
    /// Open the queue directory, creating it if missing.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        let invalid = id.is_empty()
            || id.starts_with('.')
            || id.contains('/')
            || id.contains('\\')
            || id == "order";
        if invalid {
            return Err(StoreError::InvalidId { id: id.to_string() });
        }
        Ok(self.dir.join(format!("{}.{}", id, RECORD_EXT)))
    }

    fn order_path(&self) -> PathBuf {
        self.dir.join(ORDER_FILE)
    }

    /// Overwrite the record for `id`.
    pub fn save<T: Serialize + ?Sized>(&self, id: &str, record: &T) -> Result<(), StoreError> {
        let path = self.record_path(id)?;
        let bytes = serde_json::to_vec(record).map_err(|source| StoreError::Serialize {
            id: id.to_string(),
            source,
        })?;
        write::write_atomic(&path, &bytes)
    }

    /// Overwrite the record for `id` with `status` merged into its top level.
    pub fn save_with_status<T: Serialize + ?Sized>(
        &self,
        id: &str,
        record: &T,
        status: ItemStatus,
    ) -> Result<(), StoreError> {
        let mut value = serde_json::to_value(record).map_err(|source| StoreError::Serialize {
            id: id.to_string(),
            source,
        })?;
        if let Value::Object(map) = &mut value {
            map.insert("status".to_string(), Value::String(status.as_str().to_string()));
        }
        self.save(id, &value)
    }

    /// Load and decode the record for `id`. `Ok(None)` when it does not exist.
    pub fn load<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, StoreError> {
        match self.load_raw(id)? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Parse {
                    id: id.to_string(),
                    source,
                }),
        }
    }

    /// Load the record for `id` as untyped JSON.
    pub fn load_raw(&self, id: &str) -> Result<Option<Value>, StoreError> {
        let path = self.record_path(id)?;
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                id: id.to_string(),
                source,
            })
    }

    /// Remove the record for `id`. A missing record is not an error.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.record_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Replace `order.json` with `ids`.
    pub fn save_order<'a, I>(&self, ids: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let ids: Vec<&String> = ids.into_iter().collect();
        let bytes = serde_json::to_vec(&ids).map_err(|source| StoreError::Serialize {
            id: "order".to_string(),
            source,
        })?;
        write::write_atomic(&self.order_path(), &bytes)
    }

    /// Read `order.json`. A missing or malformed file is reset to `[]` on
    /// disk and read as empty.
    pub fn load_order(&self) -> Result<Vec<String>, StoreError> {
        let path = self.order_path();
        match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<String>>(&bytes) {
                Ok(order) => return Ok(order),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "queue order unreadable, resetting");
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(&path, e)),
        }
        self.save_order(std::iter::empty())?;
        Ok(Vec::new())
    }

    /// Ids of every record in the directory, sorted. Skips the order file and
    /// leftover temp files.
    pub fn entries(&self) -> Result<Vec<String>, StoreError> {
        let rd = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut ids = Vec::new();
        for entry in rd {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name == ORDER_FILE || name.ends_with(TEMP_SUFFIX) {
                continue;
            }
            if let Some(id) = name.strip_suffix(".json") {
                if !id.is_empty() && !id.starts_with('.') {
                    ids.push(id.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Remove `.part` files left behind by an interrupted write. Returns how
    /// many were removed.
    pub fn sweep_temp_files(&self) -> Result<usize, StoreError> {
        let rd = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut removed = 0;
        for entry in rd {
            let entry = entry.map_err(|e| StoreError::io(&self.dir, e))?;
            let path = entry.path();
            let is_temp = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(TEMP_SUFFIX))
                .unwrap_or(false);
            if !is_temp {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(&path, e)),
            }
        }
        Ok(removed)
    }
}
