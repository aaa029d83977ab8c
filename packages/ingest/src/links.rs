//! Report link discovery.
//!
//! The listing returns pages of links newest first. [`SyncMode::Recent`]
//! walks forward until it meets a link the ledger already knows and puts
//! everything newer in front. [`SyncMode::All`] walks every page and
//! appends unknown links, saving after each page so an interrupted walk
//! keeps its progress.

use std::path::Path;

use burglary_map_source::{ListingQuery, ReportSource};
use burglary_map_store::report_links::ReportLinks;
use chrono::NaiveDate;

use crate::IngestError;

/// How far to walk the listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// Stop at the first known link.
    #[default]
    Recent,
    /// Walk until a short page.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
    pub mode: SyncMode,
    /// Stop after this many pages.
    pub max_pages: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkSyncSummary {
    pub pages: u32,
    pub added: usize,
}

/// Fetches listing pages into `ledger` and saves it to `ledger_path`.
///
/// # Errors
///
/// Returns [`IngestError`] if a listing page cannot be fetched or the
/// ledger cannot be saved. In recent mode nothing is added on error, so
/// the next sync still finds the gap.
pub async fn sync_links(
    source: &dyn ReportSource,
    ledger: &mut ReportLinks,
    ledger_path: &Path,
    options: &SyncOptions,
) -> Result<LinkSyncSummary, IngestError> {
    let summary = match options.mode {
        SyncMode::Recent => sync_recent(source, ledger, ledger_path, options).await?,
        SyncMode::All => sync_all(source, ledger, ledger_path, options).await?,
    };
    log::info!(
        "Link sync: {} new links from {} pages ({} known)",
        summary.added,
        summary.pages,
        ledger.links.len()
    );
    Ok(summary)
}

async fn sync_recent(
    source: &dyn ReportSource,
    ledger: &mut ReportLinks,
    ledger_path: &Path,
    options: &SyncOptions,
) -> Result<LinkSyncSummary, IngestError> {
    let mut summary = LinkSyncSummary::default();
    let mut fresh: Vec<String> = Vec::new();

    for page in 1.. {
        if options.max_pages.is_some_and(|max| page > max) {
            break;
        }
        let links = source.list_reports(&query(options, page)).await?;
        summary.pages += 1;
        let full = links.len() >= source.page_size();

        let mut reached_known = false;
        for link in links {
            if ledger.contains(&link) {
                reached_known = true;
                break;
            }
            if !fresh.contains(&link) {
                fresh.push(link);
            }
        }
        log::debug!("Page {page}: {} new links so far", fresh.len());

        if reached_known || !full {
            break;
        }
    }

    summary.added = ledger.prepend(fresh);
    ledger.save(ledger_path)?;
    Ok(summary)
}

async fn sync_all(
    source: &dyn ReportSource,
    ledger: &mut ReportLinks,
    ledger_path: &Path,
    options: &SyncOptions,
) -> Result<LinkSyncSummary, IngestError> {
    let mut summary = LinkSyncSummary::default();

    for page in 1.. {
        if options.max_pages.is_some_and(|max| page > max) {
            break;
        }
        let links = source.list_reports(&query(options, page)).await?;
        summary.pages += 1;
        if links.is_empty() {
            break;
        }
        let full = links.len() >= source.page_size();

        let added = ledger.append(links);
        summary.added += added;
        ledger.save(ledger_path)?;
        log::info!("Page {page}: {added} new links");

        if !full {
            break;
        }
    }

    Ok(summary)
}

const fn query(options: &SyncOptions, page: u32) -> ListingQuery {
    ListingQuery {
        from: options.from,
        to: options.to,
        page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubSource, temp_paths};

    fn options(mode: SyncMode) -> SyncOptions {
        SyncOptions {
            from: NaiveDate::from_ymd_opt(2018, 12, 14).unwrap(),
            to: None,
            mode,
            max_pages: None,
        }
    }

    fn strings(urls: &[&str]) -> Vec<String> {
        urls.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn recent_stops_at_first_known_link() {
        let paths = temp_paths("links_recent_stops_at_known");
        let source = StubSource::default()
            .with_page_size(2)
            .with_page(1, &["/f", "/e"])
            .with_page(2, &["/d", "/c"])
            .with_page(3, &["/b", "/a"]);
        let mut ledger = ReportLinks::new("OEstjyllands-Politi");
        ledger.links = strings(&["/c", "/b", "/a"]);

        let summary = sync_links(&source, &mut ledger, &paths.report_links(), &options(SyncMode::Recent))
            .await
            .unwrap();

        assert_eq!(summary, LinkSyncSummary { pages: 2, added: 3 });
        assert_eq!(ledger.links, strings(&["/f", "/e", "/d", "/c", "/b", "/a"]));
        assert_eq!(*source.listed_pages.lock().unwrap(), vec![1, 2]);

        let saved = ReportLinks::load(&paths.report_links()).unwrap();
        assert_eq!(saved.links, ledger.links);
        assert!(saved.last_updated.is_some());

        let _ = std::fs::remove_dir_all(paths.root());
    }

    #[tokio::test]
    async fn recent_stops_on_short_page() {
        let paths = temp_paths("links_recent_short_page");
        let source = StubSource::default()
            .with_page_size(2)
            .with_page(1, &["/b", "/a"])
            .with_page(2, &["/z"]);
        let mut ledger = ReportLinks::default();

        let summary = sync_links(&source, &mut ledger, &paths.report_links(), &options(SyncMode::Recent))
            .await
            .unwrap();

        assert_eq!(summary, LinkSyncSummary { pages: 2, added: 3 });
        assert_eq!(ledger.links, strings(&["/b", "/a", "/z"]));

        let _ = std::fs::remove_dir_all(paths.root());
    }

    #[tokio::test]
    async fn recent_adds_nothing_when_a_page_fails() {
        let paths = temp_paths("links_recent_page_fails");
        let source = StubSource::default()
            .with_page_size(2)
            .with_page(1, &["/d", "/c"]);
        let mut ledger = ReportLinks::default();
        ledger.links = strings(&["/a"]);

        let result = sync_links(&source, &mut ledger, &paths.report_links(), &options(SyncMode::Recent)).await;

        assert!(matches!(result, Err(IngestError::Source(_))));
        assert_eq!(ledger.links, strings(&["/a"]));
        assert!(!paths.report_links().exists());
    }

    #[tokio::test]
    async fn all_walks_every_page_and_appends() {
        let paths = temp_paths("links_all_walks_every_page");
        let source = StubSource::default()
            .with_page_size(2)
            .with_page(1, &["/e", "/d"])
            .with_page(2, &["/c", "/b"])
            .with_page(3, &["/a"]);
        let mut ledger = ReportLinks::default();
        ledger.links = strings(&["/e", "/d"]);

        let summary = sync_links(&source, &mut ledger, &paths.report_links(), &options(SyncMode::All))
            .await
            .unwrap();

        assert_eq!(summary, LinkSyncSummary { pages: 3, added: 3 });
        assert_eq!(ledger.links, strings(&["/e", "/d", "/c", "/b", "/a"]));

        let _ = std::fs::remove_dir_all(paths.root());
    }

    #[tokio::test]
    async fn all_keeps_saved_pages_when_a_later_page_fails() {
        let paths = temp_paths("links_all_keeps_saved_pages");
        let source = StubSource::default()
            .with_page_size(2)
            .with_page(1, &["/d", "/c"]);
        let mut ledger = ReportLinks::default();

        let result = sync_links(&source, &mut ledger, &paths.report_links(), &options(SyncMode::All)).await;

        assert!(result.is_err());
        let saved = ReportLinks::load(&paths.report_links()).unwrap();
        assert_eq!(saved.links, strings(&["/d", "/c"]));

        let _ = std::fs::remove_dir_all(paths.root());
    }

    #[tokio::test]
    async fn max_pages_caps_the_walk() {
        let paths = temp_paths("links_max_pages");
        let source = StubSource::default()
            .with_page_size(1)
            .with_page(1, &["/c"])
            .with_page(2, &["/b"])
            .with_page(3, &["/a"]);
        let mut ledger = ReportLinks::default();
        let mut opts = options(SyncMode::All);
        opts.max_pages = Some(2);

        let summary = sync_links(&source, &mut ledger, &paths.report_links(), &opts)
            .await
            .unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(ledger.links, strings(&["/c", "/b"]));

        let _ = std::fs::remove_dir_all(paths.root());
    }
}
