//! File writing helpers.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{OutputError, Result};

/// Create an output directory (and its parents) if absent.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| OutputError::write(dir, source))
}

/// Write `bytes` to `path` so readers never observe a partial file.
///
/// The content goes to a temporary file next to the target, which is then
/// renamed over it. On failure the temporary file is removed and any
/// previous file at `path` is left untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = parent_dir(path);
    ensure_dir(&parent)?;
    let mut temp = NamedTempFile::new_in(&parent).map_err(|source| OutputError::write(&parent, source))?;
    temp.write_all(bytes)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|source| OutputError::write(path, source))?;
    temp.persist(path)
        .map_err(|error| OutputError::write(path, error.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
