//! JSON document persistence with file locking.
//!
//! Every document in the local store goes through these two functions:
//! reads take a shared lock, writes go to a locked temp file that is
//! synced and then renamed over the original.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read a whole file under a shared lock
fn read_locked(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    let unlocked = file.unlock();
    read?;
    unlocked?;
    Ok(contents)
}

/// Load a JSON document for display
///
/// Returns `None` if the file doesn't exist.
/// If the file is unreadable or corrupted, logs a warning and returns `None`.
/// Never feed the result back into a write: use [`load_json_strict`] there.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        tracing::debug!("No document at {:?}", path);
        return Ok(None);
    }

    let contents = match read_locked(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!("Failed to read {:?}: {}. Treating as empty.", path, e);
            return Ok(None);
        }
    };

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}. Treating as empty.", path, e);
            Ok(None)
        }
    }
}

/// Load a JSON document that is about to be modified and written back
///
/// Returns `None` only if the file doesn't exist. A file that exists but
/// cannot be read or parsed is an [`Error::Storage`], so the caller never
/// overwrites data it failed to see.
pub fn load_json_strict<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = read_locked(path)
        .map_err(|e| Error::Storage(format!("Failed to read {:?}: {}", path, e)))?;

    serde_json::from_str::<T>(&contents).map(Some).map_err(|e| {
        tracing::error!("Refusing to modify unreadable document {:?}: {}", path, e);
        Error::Storage(format!("Stored document {:?} is unreadable: {}", path, e))
    })
}

/// Save a JSON document atomically with exclusive locking
///
/// 1. Write to a temp file in the same directory
/// 2. Sync to disk
/// 3. Rename over the original
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Storage(format!("document path {:?} has no parent", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved document to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested/doc.json");

        let mut doc = BTreeMap::new();
        doc.insert("goal".to_string(), 2200);
        save_json(&path, &doc).unwrap();

        let loaded: Option<BTreeMap<String, i32>> = load_json(&path).unwrap();
        assert_eq!(loaded, Some(doc));
    }

    #[test]
    fn test_missing_file_is_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let loaded: Option<Vec<u32>> = load_json(&temp_dir.path().join("nope.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupted_file_is_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let loaded: Option<Vec<u32>> = load_json(&path).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_strict_load_rejects_corrupted_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let result: Result<Option<Vec<u32>>> = load_json_strict(&path);
        assert!(matches!(result, Err(Error::Storage(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ invalid json }");
    }

    #[test]
    fn test_strict_load_missing_and_valid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("doc.json");

        let missing: Option<Vec<u32>> = load_json_strict(&path).unwrap();
        assert!(missing.is_none());

        save_json(&path, &vec![7u32]).unwrap();
        let loaded: Option<Vec<u32>> = load_json_strict(&path).unwrap();
        assert_eq!(loaded, Some(vec![7]));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("doc.json");
        save_json(&path, &vec![1, 2, 3]).unwrap();
        save_json(&path, &vec![4]).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "doc.json")
            .collect();
        assert!(extras.is_empty(), "found extras: {:?}", extras);
    }
}
