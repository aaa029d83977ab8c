//! Cache-first, region-bounded address resolution.
//!
//! For one `(address, city)` pair the resolver expands the address and
//! city variants into an ordered list of query strings, then:
//!
//! 1. returns the first cached coordinate pair that lies inside the region
//!    box, without touching the network;
//! 2. otherwise queries the provider for each query in turn, accepting the
//!    first candidate inside the box, or the top-ranked candidate as a
//!    degraded result;
//! 3. otherwise records a "not found" failure with every query tried.

use std::time::Duration;

use burglary_map_incident_models::is_unknown_city;

use crate::{
    Candidate, GeocodeProvider, GeocodedAddress, MatchQuality, ResultSource,
    address::{MetroArea, address_variants, build_query, city_variants, failure_key, sanitize_address},
    bounds::BoundingBox,
    cache::{GeocodeFailure, GeocodeState},
};

/// Candidates requested per provider query.
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Region and throttling settings for a [`Resolver`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Results inside this box are accepted as in-region.
    pub bounds: BoundingBox,
    /// Country name appended to every query (e.g. `"Denmark"`).
    pub country: String,
    /// Metro area used to qualify suburb names.
    pub metro: Option<MetroArea>,
    /// Pause before every provider call.
    pub rate_limit: Duration,
    /// Candidates requested per query.
    pub result_limit: usize,
    /// Re-query providers for queries cached as having no result.
    pub refresh_misses: bool,
}

impl ResolverConfig {
    #[must_use]
    pub fn new(bounds: BoundingBox, country: impl Into<String>) -> Self {
        Self {
            bounds,
            country: country.into(),
            metro: None,
            rate_limit: Duration::ZERO,
            result_limit: DEFAULT_RESULT_LIMIT,
            refresh_misses: false,
        }
    }
}

/// Resolves addresses against a cache and a single provider.
pub struct Resolver {
    provider: Box<dyn GeocodeProvider>,
    config: ResolverConfig,
}

impl Resolver {
    #[must_use]
    pub fn new(provider: Box<dyn GeocodeProvider>, config: ResolverConfig) -> Self {
        Self { provider, config }
    }

    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Builds every query string for `address` (already sanitized) and
    /// `city`, in the order they are attempted.
    #[must_use]
    pub fn queries(&self, address: &str, city: &str) -> Vec<String> {
        let cities = city_variants(city, self.config.metro.as_ref());
        address_variants(address)
            .iter()
            .flat_map(|addr| {
                cities
                    .iter()
                    .map(|c| build_query(addr, c, &self.config.country))
            })
            .collect()
    }

    /// Resolves `address` in `city`, mutating `state` in place.
    ///
    /// Returns `None` when the city is unknown or no query produced a
    /// result; in both cases a failure is recorded under
    /// `"{sanitized address}, {city}"`. A successful resolution removes any
    /// earlier failure under that key.
    pub async fn resolve(
        &self,
        address: &str,
        city: &str,
        state: &mut GeocodeState,
    ) -> Option<GeocodedAddress> {
        let address = sanitize_address(address);
        log::debug!("Sanitized address: {address}");
        let key = failure_key(&address, city);

        if is_unknown_city(city) {
            log::warn!("Unknown city for '{address}', not geocoding");
            state
                .failures
                .record(key, GeocodeFailure::unknown_city(address, city));
            return None;
        }

        let queries = self.queries(&address, city);

        if let Some(hit) = self.cached_in_region(&queries, state) {
            state.failures.resolve(&key);
            return Some(hit);
        }

        for query in &queries {
            if !self.config.refresh_misses && state.cache.is_known_miss(query) {
                log::debug!("Skipping known miss: {query}");
                continue;
            }

            if !self.config.rate_limit.is_zero() {
                tokio::time::sleep(self.config.rate_limit).await;
            }

            let candidates = match self
                .provider
                .search(query, self.config.result_limit, &self.config.bounds)
                .await
            {
                Ok(candidates) => candidates,
                Err(e) => {
                    log::warn!("{} lookup failed for '{query}': {e}", self.provider.provider());
                    continue;
                }
            };

            let Some((candidate, match_quality)) = self.pick(candidates) else {
                state.cache.insert_miss(query.clone());
                continue;
            };

            if match_quality == MatchQuality::OutsideRegion {
                log::warn!(
                    "Degraded geocode for '{query}': ({}, {}) is outside the region",
                    candidate.coordinates.latitude,
                    candidate.coordinates.longitude,
                );
            }

            state.cache.insert(query.clone(), candidate.coordinates);
            state.failures.resolve(&key);
            return Some(GeocodedAddress {
                coordinates: candidate.coordinates,
                query: query.clone(),
                matched_address: candidate.display_name,
                source: ResultSource::Provider(self.provider.provider()),
                match_quality,
            });
        }

        log::warn!(
            "Geocode not found for '{address}, {city}' after {} queries",
            queries.len()
        );
        state
            .failures
            .record(key, GeocodeFailure::not_found(address, city, queries));
        None
    }

    fn cached_in_region(&self, queries: &[String], state: &GeocodeState) -> Option<GeocodedAddress> {
        queries.iter().find_map(|query| {
            let coords = state.cache.hit(query)?;
            self.config.bounds.contains(coords).then(|| GeocodedAddress {
                coordinates: coords,
                query: query.clone(),
                matched_address: None,
                source: ResultSource::Cache,
                match_quality: MatchQuality::InRegion,
            })
        })
    }

    /// First candidate inside the box, else the top-ranked one.
    fn pick(&self, candidates: Vec<Candidate>) -> Option<(Candidate, MatchQuality)> {
        let in_region = candidates
            .iter()
            .position(|c| self.config.bounds.contains(c.coordinates));
        let mut candidates = candidates.into_iter();
        match in_region {
            Some(index) => candidates
                .nth(index)
                .map(|c| (c, MatchQuality::InRegion)),
            None => candidates.next().map(|c| (c, MatchQuality::OutsideRegion)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use burglary_map_incident_models::Coordinates;

    use super::*;
    use crate::cache::FailureReason;
    use crate::{GeocodeError, GeocodingProvider};

    const BOUNDS: BoundingBox = BoundingBox::new(55.8, 56.6, 9.5, 11.0);
    const AARHUS: Coordinates = Coordinates::new(56.15, 10.2);
    const COPENHAGEN: Coordinates = Coordinates::new(55.68, 12.57);

    #[derive(Default)]
    struct StubProvider {
        calls: Arc<AtomicUsize>,
        queries: Arc<Mutex<Vec<String>>>,
        responses: Mutex<VecDeque<Result<Vec<Candidate>, GeocodeError>>>,
    }

    #[async_trait]
    impl GeocodeProvider for StubProvider {
        fn provider(&self) -> GeocodingProvider {
            GeocodingProvider::Nominatim
        }

        async fn search(
            &self,
            query: &str,
            _limit: usize,
            _viewbox: &BoundingBox,
        ) -> Result<Vec<Candidate>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn candidate(coords: Coordinates) -> Candidate {
        Candidate {
            coordinates: coords,
            display_name: None,
        }
    }

    fn resolver(
        responses: Vec<Result<Vec<Candidate>, GeocodeError>>,
    ) -> (Resolver, Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>) {
        let stub = StubProvider {
            responses: Mutex::new(responses.into()),
            ..StubProvider::default()
        };
        let calls = Arc::clone(&stub.calls);
        let queries = Arc::clone(&stub.queries);
        let mut config = ResolverConfig::new(BOUNDS, "Denmark");
        config.metro = Some(MetroArea {
            name: "Aarhus".to_string(),
            suburbs: vec!["højbjerg".to_string()],
        });
        (Resolver::new(Box::new(stub), config), calls, queries)
    }

    #[tokio::test]
    async fn bounded_cache_hit_makes_no_calls() {
        let (resolver, calls, _) = resolver(vec![]);
        let mut state = GeocodeState::default();
        // Only the least specific variant is cached.
        state.cache.insert("Skovvej 3, Denmark", AARHUS);

        let result = resolver
            .resolve("Skovvej 3", "8270 Højbjerg", &mut state)
            .await
            .unwrap();

        assert_eq!(result.coordinates, AARHUS);
        assert_eq!(result.source, ResultSource::Cache);
        assert_eq!(result.query, "Skovvej 3, Denmark");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_city_makes_no_calls() {
        let (resolver, calls, _) = resolver(vec![Ok(vec![candidate(AARHUS)])]);
        let mut state = GeocodeState::default();

        assert!(resolver.resolve("Skovvej 3", "unknown", &mut state).await.is_none());

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let failure = state.failures.get("Skovvej 3, unknown").unwrap();
        assert_eq!(failure.reason, FailureReason::UnknownCity);
    }

    #[tokio::test]
    async fn out_of_region_cache_hit_does_not_short_circuit() {
        let (resolver, calls, _) = resolver(vec![Ok(vec![candidate(AARHUS)])]);
        let mut state = GeocodeState::default();
        state.cache.insert("Skovvej 3, Aarhus, Denmark", COPENHAGEN);

        let result = resolver.resolve("Skovvej 3", "Aarhus", &mut state).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.coordinates, AARHUS);
        assert_eq!(state.cache.hit("Skovvej 3, Aarhus, Denmark"), Some(AARHUS));
    }

    #[tokio::test]
    async fn prefers_first_in_region_candidate() {
        let (resolver, _, _) = resolver(vec![Ok(vec![
            candidate(COPENHAGEN),
            candidate(AARHUS),
        ])]);
        let mut state = GeocodeState::default();

        let result = resolver.resolve("Skovvej 3", "Aarhus", &mut state).await.unwrap();

        assert_eq!(result.coordinates, AARHUS);
        assert_eq!(result.match_quality, MatchQuality::InRegion);
        assert_eq!(
            result.source,
            ResultSource::Provider(GeocodingProvider::Nominatim)
        );
    }

    #[tokio::test]
    async fn falls_back_to_degraded_top_candidate() {
        let (resolver, _, _) = resolver(vec![Ok(vec![
            candidate(COPENHAGEN),
            candidate(Coordinates::new(57.0, 9.9)),
        ])]);
        let mut state = GeocodeState::default();

        let result = resolver.resolve("Skovvej 3", "Aarhus", &mut state).await.unwrap();

        assert_eq!(result.coordinates, COPENHAGEN);
        assert!(result.is_degraded());
        assert_eq!(state.cache.hit("Skovvej 3, Aarhus, Denmark"), Some(COPENHAGEN));
    }

    #[tokio::test]
    async fn provider_error_moves_to_next_variant() {
        let (resolver, calls, queries) = resolver(vec![
            Err(GeocodeError::RateLimited),
            Ok(vec![candidate(AARHUS)]),
        ]);
        let mut state = GeocodeState::default();

        let result = resolver
            .resolve("Skovvej 3", "8270 Højbjerg", &mut state)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.query, "Skovvej 3, Højbjerg, Denmark");
        assert_eq!(
            *queries.lock().unwrap(),
            vec![
                "Skovvej 3, 8270 Højbjerg, Denmark".to_string(),
                "Skovvej 3, Højbjerg, Denmark".to_string(),
            ]
        );
        // The failed query is not cached as a miss.
        assert!(!state.cache.is_known_miss("Skovvej 3, 8270 Højbjerg, Denmark"));
    }

    #[tokio::test]
    async fn records_not_found_with_every_query() {
        let (resolver, calls, _) = resolver(vec![]);
        let mut state = GeocodeState::default();

        assert!(resolver.resolve("Skovvej 3 8240", "Aarhus", &mut state).await.is_none());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let failure = state.failures.get("Skovvej 3, Aarhus").unwrap();
        assert_eq!(failure.reason, FailureReason::NotFound);
        assert_eq!(failure.address, "Skovvej 3");
        assert_eq!(
            failure.tried,
            vec!["Skovvej 3, Aarhus, Denmark", "Skovvej 3, Denmark"]
        );
        assert!(state.cache.is_known_miss("Skovvej 3, Denmark"));
    }

    #[tokio::test]
    async fn known_misses_skip_the_network_unless_refreshed() {
        let (plain, calls, _) = resolver(vec![]);
        let mut state = GeocodeState::default();
        state.cache.insert_miss("Skovvej 3, Aarhus, Denmark");
        state.cache.insert_miss("Skovvej 3, Denmark");

        assert!(plain.resolve("Skovvej 3", "Aarhus", &mut state).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let (mut refreshing, calls, _) = resolver(vec![]);
        refreshing.config.refresh_misses = true;
        assert!(refreshing.resolve("Skovvej 3", "Aarhus", &mut state).await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn success_clears_previous_failure() {
        let (resolver, _, _) = resolver(vec![Ok(vec![candidate(AARHUS)])]);
        let mut state = GeocodeState::default();
        state.failures.record(
            "Skovvej 3, Aarhus",
            GeocodeFailure::not_found("Skovvej 3", "Aarhus", vec![]),
        );

        assert!(resolver.resolve("Skovvej 3", "Aarhus", &mut state).await.is_some());
        assert!(state.failures.get("Skovvej 3, Aarhus").is_none());
    }

    #[test]
    fn queries_cross_address_and_city_variants() {
        let (resolver, _, _) = resolver(vec![]);
        assert_eq!(
            resolver.queries("Skt. Pauls Gade 1", "Aarhus C"),
            vec![
                "Skt. Pauls Gade 1, Aarhus C, Denmark",
                "Skt. Pauls Gade 1, Aarhus, Denmark",
                "Skt. Pauls Gade 1, Denmark",
                "Sankt Pauls Gade 1, Aarhus C, Denmark",
                "Sankt Pauls Gade 1, Aarhus, Denmark",
                "Sankt Pauls Gade 1, Denmark",
            ]
        );
    }
}
