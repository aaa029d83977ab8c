//! Reading and atomically writing JSON data files.

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::{StoreError, paths::ensure_dir};

/// Reads `path`, returning `T::default()` if it does not exist or is empty.
///
/// # Errors
///
/// Returns [`StoreError`] if the file cannot be read or is not valid JSON
/// for `T`.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("{} does not exist yet", path.display());
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };

    if contents.trim().is_empty() {
        return Ok(T::default());
    }

    Ok(serde_json::from_str(&contents)?)
}

/// Writes `value` as pretty JSON to `path`.
///
/// Uses an atomic write pattern (write to `.tmp`, then rename) so an
/// interrupted run never leaves a truncated file behind.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization or any file operation fails.
pub fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");

    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("burglary_map_json_file_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_file_loads_default() {
        let dir = temp_dir("missing");
        let map: BTreeMap<String, u32> = load_or_default(&dir.join("none.json")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn write_then_load() {
        let dir = temp_dir("write_then_load");
        let path = dir.join("nested").join("file.json");
        let map = BTreeMap::from([("a".to_string(), 1_u32)]);

        write_atomic(&path, &map).unwrap();
        let back: BTreeMap<String, u32> = load_or_default(&path).unwrap();

        assert_eq!(back, map);
        assert!(!dir.join("nested").join("file.json.tmp").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_file_loads_default() {
        let dir = temp_dir("empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.json");
        std::fs::write(&path, "  \n").unwrap();

        let map: BTreeMap<String, u32> = load_or_default(&path).unwrap();
        assert!(map.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = temp_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        let result: Result<BTreeMap<String, u32>, _> = load_or_default(&path);
        assert!(matches!(result, Err(StoreError::Json(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
