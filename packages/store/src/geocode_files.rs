//! Persistence for the geocode cache and failure log.
//!
//! Flushing merges the in-memory state with whatever is on disk before
//! writing, so entries added to the files by another process are kept.

use burglary_map_geocoder::cache::{GeocodeCache, GeocodeFailureLog, GeocodeState};

use crate::{StoreError, json_file, paths::DataPaths};

/// Reads both geocode files, treating missing files as empty.
///
/// # Errors
///
/// Returns [`StoreError`] if either file exists but cannot be parsed.
pub fn load_state(paths: &DataPaths) -> Result<GeocodeState, StoreError> {
    let cache: GeocodeCache = json_file::load_or_default(&paths.geocode_cache())?;
    let failures: GeocodeFailureLog = json_file::load_or_default(&paths.geocode_failures())?;
    log::info!(
        "Loaded {} cached geocodes and {} geocode failures",
        cache.len(),
        failures.len()
    );
    Ok(GeocodeState::new(cache, failures))
}

/// Merges `state` with the files on disk and writes both back.
///
/// In-memory entries win over disk entries, failures resolved in this
/// process stay removed.
///
/// # Errors
///
/// Returns [`StoreError`] if a file cannot be read, parsed or written.
pub fn flush_state(paths: &DataPaths, state: &mut GeocodeState) -> Result<(), StoreError> {
    let disk_cache: GeocodeCache = json_file::load_or_default(&paths.geocode_cache())?;
    state.cache.absorb(disk_cache);
    json_file::write_atomic(&paths.geocode_cache(), &state.cache)?;

    let disk_failures: GeocodeFailureLog =
        json_file::load_or_default(&paths.geocode_failures())?;
    state.failures.absorb(disk_failures);
    json_file::write_atomic(&paths.geocode_failures(), &state.failures)?;

    log::debug!(
        "Flushed {} cached geocodes and {} geocode failures",
        state.cache.len(),
        state.failures.len()
    );
    Ok(())
}
