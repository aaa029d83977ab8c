#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Run-level driver: turns police daily reports into a geocoded,
//! deduplicated incident store and the map's frontend export.
//!
//! A run walks the pending report URLs one at a time. For each report it
//! fetches the rendered text, extracts break-ins, geocodes every new
//! incident, merges it into the store and flushes the geocode cache and
//! failure log. A report that cannot be fetched is skipped and left
//! pending; nothing inside the loop aborts the run.

pub mod geocode_retry;
pub mod interactive;
pub mod links;

#[cfg(test)]
mod test_support;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use burglary_map_geocoder::{GeocodeError, cache::GeocodeState, resolver::Resolver, service_registry};
use burglary_map_incident_models::IncidentRecord;
use burglary_map_parser::{extract_report, report::report_context_for_url};
use burglary_map_source::{
    ReportSource, SourceError,
    politi::PolitiClient,
    progress::ProgressCallback,
    region_def::{self, RegionDefinition},
};
use burglary_map_store::{
    StoreError,
    export::{FrontendExport, write_frontend_export},
    geocode_files,
    paths::DataPaths,
    report_links::ReportLinks,
    structured::RecordStore,
};
use chrono::{NaiveDate, Utc};

use crate::links::{LinkSyncSummary, SyncMode, SyncOptions};

/// Errors that end a command before its per-report loop starts, or that
/// come from a whole-file operation.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Unknown geocoding service: {0}")]
    UnknownService(String),

    #[error("No enabled geocoding service")]
    NoService,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reports_processed: usize,
    /// Reports whose fetch failed after every retry.
    pub reports_skipped: usize,
    pub entries_added: usize,
    /// Incidents already in the store.
    pub duplicates: usize,
    /// Entry blocks the parser dropped.
    pub blocks_rejected: usize,
    pub geocoded: usize,
    /// Geocoded incidents whose coordinates lie outside the region.
    pub degraded: usize,
    /// Incidents that could not be geocoded during this run.
    pub geocode_failures: usize,
    /// Size of the failure log after the run.
    pub outstanding_failures: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reports processed ({} skipped), {} entries added ({} duplicates, {} blocks rejected), \
             {} geocoded ({} outside region), {} geocode failures ({} outstanding)",
            self.reports_processed,
            self.reports_skipped,
            self.entries_added,
            self.duplicates,
            self.blocks_rejected,
            self.geocoded,
            self.degraded,
            self.geocode_failures,
            self.outstanding_failures,
        )
    }
}

/// Options for [`run_pipeline`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Region id; the first configured region when unset.
    pub region: Option<String>,
    /// Geocoding service id; the default service when unset.
    pub provider: Option<String>,
    /// Maximum number of reports to process, taken from the newest pending
    /// reports.
    pub limit: Option<usize>,
    /// Maximum number of listing pages to check for new links.
    pub max_pages: Option<u32>,
    /// Reprocess reports that were already processed.
    pub include_processed: bool,
}

/// Options for [`retry_geocodes`].
#[derive(Debug, Clone, Default)]
pub struct RetryOptions {
    pub region: Option<String>,
    pub provider: Option<String>,
    /// Maximum number of failures to retry.
    pub limit: Option<usize>,
    /// Query providers again for queries cached as having no result.
    pub refresh_misses: bool,
}

/// Looks up a region by id, or returns the default region.
///
/// # Errors
///
/// Returns [`IngestError::UnknownRegion`] if `id` names no region.
pub fn resolve_region(id: Option<&str>) -> Result<RegionDefinition, IngestError> {
    id.map_or_else(
        || Ok(region_def::default_region()),
        |id| region_def::find_region(id).ok_or_else(|| IngestError::UnknownRegion(id.to_string())),
    )
}

/// Builds a resolver for `region` backed by the selected geocoding service.
///
/// # Errors
///
/// Returns [`IngestError`] if the service is unknown, none is enabled, or
/// its HTTP client cannot be built.
pub fn build_resolver(
    region: &RegionDefinition,
    service_id: Option<&str>,
    refresh_misses: bool,
) -> Result<Resolver, IngestError> {
    let service = match service_id {
        Some(id) => service_registry::find_service(id)
            .ok_or_else(|| IngestError::UnknownService(id.to_string()))?,
        None => service_registry::default_service().ok_or(IngestError::NoService)?,
    };
    log::info!("Geocoding with {} ({})", service.name, service.id);

    let mut config = region.resolver_config(service.rate_limit());
    config.refresh_misses = refresh_misses;
    Ok(Resolver::new(service.connect()?, config))
}

/// Loads the report link ledger, tagging a new one with the region's
/// listing district.
///
/// # Errors
///
/// Returns [`IngestError::Store`] if the ledger exists but cannot be read.
pub fn load_ledger(paths: &DataPaths, region: &RegionDefinition) -> Result<ReportLinks, IngestError> {
    let mut ledger = ReportLinks::load(&paths.report_links())?;
    if ledger.district.is_empty() {
        ledger.district.clone_from(&region.district_query);
    } else if ledger.district != region.district_query {
        log::warn!(
            "Link ledger belongs to {}, not {}",
            ledger.district,
            region.district_query
        );
    }
    Ok(ledger)
}

/// Processes `urls` in order.
///
/// Each fetched report is extracted, its new incidents geocoded and
/// merged into the store (saved after every added entry), and the geocode
/// state flushed. The report is then marked processed in `ledger`.
///
/// # Errors
///
/// Returns [`IngestError::Store`] only if the store or geocode files cannot
/// be loaded up front. Failures while processing a report are logged and
/// counted.
pub async fn run_reports(
    source: &dyn ReportSource,
    resolver: &Resolver,
    region: &RegionDefinition,
    paths: &DataPaths,
    ledger: &mut ReportLinks,
    urls: &[String],
    progress: Arc<dyn ProgressCallback>,
) -> Result<RunSummary, IngestError> {
    let start = Instant::now();
    let mut run = ReportRun {
        resolver,
        region,
        paths,
        store: RecordStore::load(&paths.store())?,
        state: geocode_files::load_state(paths)?,
        summary: RunSummary::default(),
        today: Utc::now().date_naive(),
    };
    log::info!(
        "Processing {} reports ({} stored entries)",
        urls.len(),
        run.store.len()
    );

    progress.set_total(urls.len() as u64);
    for url in urls {
        progress.set_message(url.clone());
        match source.fetch_report_text(url).await {
            Ok(text) => {
                run.process_report(url, &text).await;
                run.summary.reports_processed += 1;
                ledger.mark_processed(url.clone());
                if let Err(e) = ledger.save(&paths.report_links()) {
                    log::error!("Failed to save link ledger: {e}");
                }
            }
            Err(e) => {
                log::error!("Skipping report {url}: {e}");
                run.summary.reports_skipped += 1;
            }
        }
        progress.inc(1);
    }

    let mut summary = run.summary;
    summary.outstanding_failures = run.state.failures.len();
    progress.finish(format!("{} reports processed", summary.reports_processed));
    log::info!(
        "Run complete in {:.1}s: {summary}",
        start.elapsed().as_secs_f64()
    );
    Ok(summary)
}

/// Mutable state of one [`run_reports`] call.
struct ReportRun<'a> {
    resolver: &'a Resolver,
    region: &'a RegionDefinition,
    paths: &'a DataPaths,
    store: RecordStore,
    state: GeocodeState,
    summary: RunSummary,
    today: NaiveDate,
}

impl ReportRun<'_> {
    async fn process_report(&mut self, url: &str, text: &str) {
        let ctx = report_context_for_url(url, self.today);
        let extraction = extract_report(text, url, &self.region.name, ctx);
        self.summary.blocks_rejected += extraction.rejected.len();
        log::info!(
            "{url}: {} ({} incidents, {} rejected)",
            extraction.status,
            extraction.records.len(),
            extraction.rejected.len()
        );

        for mut record in extraction.records {
            if self.store.contains_record(&record) {
                log::debug!(
                    "Already stored: {}, {} on {}",
                    record.address,
                    record.city,
                    record.date_key()
                );
                self.summary.duplicates += 1;
                continue;
            }

            self.locate(&mut record).await;

            if self.store.merge_record(&record) {
                self.summary.entries_added += 1;
                if let Err(e) = self.store.save(&self.paths.store()) {
                    log::error!("Failed to save record store: {e}");
                }
            }
        }

        if let Err(e) = geocode_files::flush_state(self.paths, &mut self.state) {
            log::error!("Failed to flush geocode state: {e}");
        }
    }

    async fn locate(&mut self, record: &mut IncidentRecord) {
        let Some(found) = self
            .resolver
            .resolve(&record.address, &record.city, &mut self.state)
            .await
        else {
            self.summary.geocode_failures += 1;
            return;
        };

        self.summary.geocoded += 1;
        if found.is_degraded() {
            self.summary.degraded += 1;
        }
        record.coordinates = Some(found.coordinates);
        record.outside_region = found.is_degraded();
    }
}

/// Syncs recent links, processes pending reports and writes the frontend
/// export.
///
/// A failed link sync is logged and the run continues with the links
/// already known.
///
/// # Errors
///
/// Returns [`IngestError`] if the region, service, or data files cannot be
/// set up, or the export cannot be written.
pub async fn run_pipeline(
    paths: &DataPaths,
    options: &RunOptions,
    progress: Arc<dyn ProgressCallback>,
) -> Result<RunSummary, IngestError> {
    let region = resolve_region(options.region.as_deref())?;
    let source = PolitiClient::new(region.district_query.clone())?;
    let resolver = build_resolver(&region, options.provider.as_deref(), false)?;
    let mut ledger = load_ledger(paths, &region)?;

    let sync = SyncOptions {
        from: region.listing_start,
        to: None,
        mode: SyncMode::Recent,
        max_pages: options.max_pages,
    };
    if let Err(e) = links::sync_links(&source, &mut ledger, &paths.report_links(), &sync).await {
        log::error!("Link sync failed, continuing with known links: {e}");
    }

    let urls = ledger.pending(options.include_processed, options.limit);

    let summary = run_reports(
        &source,
        &resolver,
        &region,
        paths,
        &mut ledger,
        &urls,
        progress,
    )
    .await?;

    export_frontend(paths)?;
    Ok(summary)
}

/// Refreshes the link ledger for a region.
///
/// # Errors
///
/// Returns [`IngestError`] if the region is unknown, or the listing or the
/// ledger file fails.
pub async fn sync_region_links(
    paths: &DataPaths,
    region_id: Option<&str>,
    mode: SyncMode,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    max_pages: Option<u32>,
) -> Result<LinkSyncSummary, IngestError> {
    let region = resolve_region(region_id)?;
    let source = PolitiClient::new(region.district_query.clone())?;
    let mut ledger = load_ledger(paths, &region)?;
    let options = SyncOptions {
        from: from.unwrap_or(region.listing_start),
        to,
        mode,
        max_pages,
    };
    links::sync_links(&source, &mut ledger, &paths.report_links(), &options).await
}

/// Re-resolves logged geocode failures with a freshly built resolver.
///
/// # Errors
///
/// Returns [`IngestError`] if the resolver cannot be built or the data
/// files cannot be read or written.
pub async fn retry_geocodes(
    paths: &DataPaths,
    options: &RetryOptions,
    progress: Arc<dyn ProgressCallback>,
) -> Result<geocode_retry::RetrySummary, IngestError> {
    let region = resolve_region(options.region.as_deref())?;
    let resolver = build_resolver(&region, options.provider.as_deref(), options.refresh_misses)?;
    geocode_retry::retry_failures(&resolver, paths, options.limit, progress).await
}

/// Writes `docs/data.json` from the record store.
///
/// # Errors
///
/// Returns [`IngestError::Store`] if the store cannot be read or the export
/// cannot be written.
pub fn export_frontend(paths: &DataPaths) -> Result<FrontendExport, IngestError> {
    let store = RecordStore::load(&paths.store())?;
    Ok(write_frontend_export(&store, &paths.frontend_export())?)
}
