//! politi.dk daily-report ("døgnrapport") client.
//!
//! Listing goes through the site's news JSON API, which returns pages of
//! ten items newest first, each with a relative `Link`. Reports are plain
//! HTML pages whose body sits in a `.rich-text` container.

use async_trait::async_trait;
use chrono::{NaiveDate, SecondsFormat, Utc};

use crate::{
    ListingQuery, ReportSource, SourceError, html_text,
    retry::{self, RetryPolicy},
};

/// Site root used to resolve relative report links.
pub const BASE_URL: &str = "https://politi.dk";

/// News listing endpoint.
pub const LISTING_API_URL: &str = "https://politi.dk/api/news/getNewsResults";

/// Sitecore item id of the news list component.
const NEWS_LIST_ITEM_ID: &str = "90DEB0B1-8DF0-4A2D-823B-CFD7A5ADD85F";

/// News category holding the daily reports.
const NEWS_TYPE: &str = "Døgnrapporter";

/// Items per listing page.
pub const PAGE_SIZE: usize = 10;

/// A [`ReportSource`] for one police district on politi.dk.
pub struct PolitiClient {
    client: reqwest::Client,
    district_query: String,
    retry: RetryPolicy,
}

impl PolitiClient {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(district_query: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; IndbrudScraper/1.0)")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            district_query: district_query.into(),
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl ReportSource for PolitiClient {
    fn id(&self) -> &str {
        &self.district_query
    }

    fn page_size(&self) -> usize {
        PAGE_SIZE
    }

    async fn list_reports(&self, query: &ListingQuery) -> Result<Vec<String>, SourceError> {
        let params = listing_params(&self.district_query, query, &now_iso());
        let label = format!("listing page {}", query.page);
        let body = retry::with_retries(self.retry, &label, || {
            retry::send_json(self.client.get(LISTING_API_URL).query(&params))
        })
        .await?;
        parse_listing(&body)
    }

    async fn fetch_report_text(&self, url: &str) -> Result<String, SourceError> {
        let html = retry::with_retries(self.retry, url, || {
            retry::send_text(self.client.get(url))
        })
        .await?;

        html_text::render_report(&html).ok_or_else(|| SourceError::Normalization {
            message: format!("no report body in {url}"),
        })
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Query parameters for one listing page. `now` is used when the query
/// has no end date.
fn listing_params(
    district_query: &str,
    query: &ListingQuery,
    now: &str,
) -> Vec<(&'static str, String)> {
    let to = query
        .to
        .map_or_else(|| now.to_string(), |to| format!("{}T23:59:59.000Z", iso_date(to)));

    vec![
        ("districtQuery", district_query.to_string()),
        ("fromDate", format!("{}T00:00:00.000Z", iso_date(query.from))),
        ("toDate", to),
        ("isNewsList", "true".to_string()),
        ("itemId", NEWS_LIST_ITEM_ID.to_string()),
        ("language", "da".to_string()),
        ("newsType", NEWS_TYPE.to_string()),
        ("page", query.page.to_string()),
        ("pageSize", PAGE_SIZE.to_string()),
    ]
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Extracts absolute report URLs from a listing response.
fn parse_listing(body: &serde_json::Value) -> Result<Vec<String>, SourceError> {
    let Some(items) = body.get("NewsList") else {
        return Err(SourceError::Normalization {
            message: "listing response has no NewsList".to_string(),
        });
    };

    // A null list is an empty page.
    let Some(items) = items.as_array() else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter_map(|item| item.get("Link").and_then(serde_json::Value::as_str))
        .filter(|link| !link.is_empty())
        .map(absolute_url)
        .collect())
}

/// Resolves a site-relative link against [`BASE_URL`].
#[must_use]
pub fn absolute_url(link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else if link.starts_with('/') {
        format!("{BASE_URL}{link}")
    } else {
        format!("{BASE_URL}/{link}")
    }
}
