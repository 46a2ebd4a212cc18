//! Atomic whole-file replacement.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `a.json` → `a.json.part`).
pub(crate) fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Write `bytes` to `final_path` via a synced temp file and a rename.
pub(crate) fn write_atomic(final_path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let temp = temp_path(final_path);
    let mut file = File::create(&temp).map_err(|e| StoreError::io(&temp, e))?;
    file.write_all(bytes).map_err(|e| StoreError::io(&temp, e))?;
    file.sync_all().map_err(|e| StoreError::io(&temp, e))?;
    drop(file);
    std::fs::rename(&temp, final_path).map_err(|e| StoreError::io(final_path, e))
}
