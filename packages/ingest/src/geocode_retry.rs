//! Second pass over the geocode failure log.
//!
//! Every logged failure is resolved again. Fixed failures leave the log,
//! and their coordinates are copied onto stored entries with the same
//! address and city that still lack them.

use std::sync::Arc;

use burglary_map_geocoder::{address::sanitize_address, cache::GeocodeState, resolver::Resolver};
use burglary_map_source::progress::ProgressCallback;
use burglary_map_store::{StoreError, geocode_files, paths::DataPaths, structured::RecordStore};

use crate::IngestError;

/// Resolutions between flushes to disk.
pub const FLUSH_EVERY: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrySummary {
    pub attempted: usize,
    pub fixed: usize,
    pub still_failing: usize,
    /// Stored entries that received coordinates.
    pub backfilled: usize,
}

/// Retries up to `limit` logged failures, in key order.
///
/// # Errors
///
/// Returns [`IngestError::Store`] if the geocode files or the record store
/// cannot be read or written.
pub async fn retry_failures(
    resolver: &Resolver,
    paths: &DataPaths,
    limit: Option<usize>,
    progress: Arc<dyn ProgressCallback>,
) -> Result<RetrySummary, IngestError> {
    let mut state = geocode_files::load_state(paths)?;
    let mut store = RecordStore::load(&paths.store())?;

    let failures: Vec<_> = state
        .failures
        .iter()
        .map(|(_, failure)| failure.clone())
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    log::info!(
        "Retrying {} of {} geocode failures",
        failures.len(),
        state.failures.len()
    );

    let mut summary = RetrySummary::default();
    let mut store_dirty = false;
    progress.set_total(failures.len() as u64);

    for failure in failures {
        progress.set_message(format!("{}, {}", failure.address, failure.city));
        summary.attempted += 1;

        if let Some(found) = resolver
            .resolve(&failure.address, &failure.city, &mut state)
            .await
        {
            summary.fixed += 1;
            let updated = store.backfill_coordinates(
                |address, city| city == failure.city && sanitize_address(address) == failure.address,
                found.coordinates,
                found.is_degraded(),
            );
            summary.backfilled += updated;
            store_dirty |= updated > 0;
        } else {
            summary.still_failing += 1;
        }
        progress.inc(1);

        if summary.attempted % FLUSH_EVERY == 0 {
            flush(paths, &mut state, &store, &mut store_dirty)?;
        }
    }

    flush(paths, &mut state, &store, &mut store_dirty)?;

    progress.finish(format!("{} fixed", summary.fixed));
    log::info!(
        "Geocode retry: {} fixed, {} still failing, {} stored entries updated",
        summary.fixed,
        summary.still_failing,
        summary.backfilled
    );
    Ok(summary)
}

fn flush(
    paths: &DataPaths,
    state: &mut GeocodeState,
    store: &RecordStore,
    store_dirty: &mut bool,
) -> Result<(), StoreError> {
    geocode_files::flush_state(paths, state)?;
    if *store_dirty {
        store.save(&paths.store())?;
        *store_dirty = false;
    }
    Ok(())
}
