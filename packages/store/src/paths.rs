#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the data directory.
//!
//! Defaults to `<workspace>/data`; set `BURGLARY_MAP_DATA_DIR` to use
//! another directory.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "BURGLARY_MAP_DATA_DIR";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the project root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the data directory, honouring [`DATA_DIR_ENV`].
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map_or_else(|| project_root().join("data"), PathBuf::from)
}

/// The set of files making up one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Paths under [`data_dir`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(data_dir())
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The structured record store.
    #[must_use]
    pub fn store(&self) -> PathBuf {
        self.root.join("data.json")
    }

    #[must_use]
    pub fn geocode_cache(&self) -> PathBuf {
        self.root.join("geocode_cache.json")
    }

    #[must_use]
    pub fn geocode_failures(&self) -> PathBuf {
        self.root.join("geocode_failures.json")
    }

    #[must_use]
    pub fn report_links(&self) -> PathBuf {
        self.root.join("report_links.json")
    }

    /// The frontend export read by the static map page.
    #[must_use]
    pub fn frontend_export(&self) -> PathBuf {
        self.root.join("docs").join("data.json")
    }
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
