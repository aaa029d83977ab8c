//! Stub source and provider shared by the driver tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use burglary_map_geocoder::{
    Candidate, GeocodeError, GeocodeProvider, GeocodingProvider, bounds::BoundingBox,
    resolver::Resolver,
};
use burglary_map_incident_models::Coordinates;
use burglary_map_source::{ListingQuery, ReportSource, SourceError, region_def::RegionDefinition};
use burglary_map_store::paths::DataPaths;

/// Fresh data directory under the system temp dir.
pub fn temp_paths(name: &str) -> DataPaths {
    let dir = std::env::temp_dir().join(format!("burglary_map_ingest_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    DataPaths::new(dir)
}

pub fn candidate(coords: Coordinates) -> Candidate {
    Candidate {
        coordinates: coords,
        display_name: None,
    }
}

pub fn resolver_for(provider: StubProvider, region: &RegionDefinition) -> Resolver {
    Resolver::new(Box::new(provider), region.resolver_config(Duration::ZERO))
}

/// Answers searches from a queue, then with no candidates.
#[derive(Default)]
pub struct StubProvider {
    pub calls: Arc<AtomicUsize>,
    responses: Mutex<VecDeque<Result<Vec<Candidate>, GeocodeError>>>,
}

impl StubProvider {
    pub fn respond(self, response: Result<Vec<Candidate>, GeocodeError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }
}

#[async_trait]
impl GeocodeProvider for StubProvider {
    fn provider(&self) -> GeocodingProvider {
        GeocodingProvider::Nominatim
    }

    async fn search(
        &self,
        _query: &str,
        _limit: usize,
        _viewbox: &BoundingBox,
    ) -> Result<Vec<Candidate>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Serves fixed listing pages and report bodies. Unknown reports and
/// pages fail.
#[derive(Default)]
pub struct StubSource {
    pages: BTreeMap<u32, Vec<String>>,
    reports: BTreeMap<String, String>,
    pub listed_pages: Arc<Mutex<Vec<u32>>>,
    page_size: usize,
}

impl StubSource {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_page(mut self, page: u32, links: &[&str]) -> Self {
        self.pages
            .insert(page, links.iter().map(ToString::to_string).collect());
        self
    }

    pub fn with_report(mut self, url: &str, text: &str) -> Self {
        self.reports.insert(url.to_string(), text.to_string());
        self
    }
}

#[async_trait]
impl ReportSource for StubSource {
    fn id(&self) -> &str {
        "stub"
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn list_reports(&self, query: &ListingQuery) -> Result<Vec<String>, SourceError> {
        self.listed_pages.lock().unwrap().push(query.page);
        self.pages
            .get(&query.page)
            .cloned()
            .ok_or_else(|| SourceError::Normalization {
                message: format!("no page {}", query.page),
            })
    }

    async fn fetch_report_text(&self, url: &str) -> Result<String, SourceError> {
        self.reports
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::Exhausted {
                attempts: 3,
                last_error: format!("HTTP 404 from {url}"),
            })
    }
}
