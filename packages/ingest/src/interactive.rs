//! Interactive menu for the scraper.
//!
//! Provides a menu-driven interface using `dialoguer` for running the
//! pipeline without memorizing CLI flags.

use burglary_map_cli_utils::{IndicatifProgress, MultiProgress};
use burglary_map_geocoder::service_registry;
use burglary_map_source::region_def;
use burglary_map_store::paths::DataPaths;
use dialoguer::{Confirm, Input, Select};

use crate::{RetryOptions, RunOptions, links::SyncMode};

/// Top-level actions available in the interactive menu.
enum Action {
    Run,
    SyncLinks,
    RetryGeocodes,
    Export,
    ListRegions,
    ListServices,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Run,
        Self::SyncLinks,
        Self::RetryGeocodes,
        Self::Export,
        Self::ListRegions,
        Self::ListServices,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Run => "Fetch, extract and geocode new reports",
            Self::SyncLinks => "Sync report links",
            Self::RetryGeocodes => "Retry failed geocodes",
            Self::Export => "Write map export",
            Self::ListRegions => "List regions",
            Self::ListServices => "List geocoding services",
        }
    }
}

/// Runs the interactive menu, prompting the user to select and configure
/// one operation.
///
/// # Errors
///
/// Returns an error if a prompt or the selected operation fails.
pub async fn run(multi: &MultiProgress, paths: &DataPaths) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Run => {
            let options = RunOptions {
                region: select_region()?,
                provider: select_service()?,
                limit: prompt_optional("Report limit (empty for no limit)")?,
                max_pages: prompt_optional("Listing page limit (empty for no limit)")?,
                include_processed: Confirm::new()
                    .with_prompt("Reprocess already processed reports?")
                    .default(false)
                    .interact()?,
            };
            let progress = IndicatifProgress::reports_bar(multi, "Processing reports");
            let summary = crate::run_pipeline(paths, &options, progress).await?;
            println!("{summary}");
        }
        Action::SyncLinks => {
            let region = select_region()?;
            let all = Confirm::new()
                .with_prompt("Walk the whole listing?")
                .default(false)
                .interact()?;
            let mode = if all { SyncMode::All } else { SyncMode::Recent };
            let summary =
                crate::sync_region_links(paths, region.as_deref(), mode, None, None, None).await?;
            println!(
                "{} new links from {} listing pages",
                summary.added, summary.pages
            );
        }
        Action::RetryGeocodes => {
            let options = RetryOptions {
                region: select_region()?,
                provider: select_service()?,
                limit: prompt_optional("Failure limit (empty for no limit)")?,
                refresh_misses: Confirm::new()
                    .with_prompt("Query again for cached misses?")
                    .default(false)
                    .interact()?,
            };
            let progress = IndicatifProgress::geocode_bar(multi, "Retrying geocodes");
            let summary = crate::retry_geocodes(paths, &options, progress).await?;
            println!(
                "Fixed: {}, still failing: {}",
                summary.fixed, summary.still_failing
            );
        }
        Action::Export => {
            let export = crate::export_frontend(paths)?;
            println!(
                "Exported {} entries across {} dates",
                export.len(),
                export.date_count()
            );
        }
        Action::ListRegions => list_regions(),
        Action::ListServices => list_services(),
    }

    Ok(())
}

/// Prints a table of all configured regions.
pub fn list_regions() {
    println!("{:<16} {:<24} COUNTRY", "ID", "NAME");
    println!("{}", "-".repeat(50));
    for region in region_def::all_regions() {
        println!("{:<16} {:<24} {}", region.id, region.name, region.country);
    }
}

/// Prints a table of all geocoding services, enabled or not.
pub fn list_services() {
    println!("{:<12} {:<10} {:<9} NAME", "ID", "PRIORITY", "ENABLED");
    println!("{}", "-".repeat(50));
    for service in service_registry::all_services() {
        println!(
            "{:<12} {:<10} {:<9} {}",
            service.id, service.priority, service.enabled, service.name
        );
    }
}

/// Prompts for a region when more than one is configured.
fn select_region() -> Result<Option<String>, Box<dyn std::error::Error>> {
    let regions = region_def::all_regions();
    if regions.len() < 2 {
        return Ok(None);
    }

    let labels: Vec<String> = regions
        .iter()
        .map(|r| format!("{} ({})", r.id, r.name))
        .collect();
    let idx = Select::new()
        .with_prompt("Region")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(Some(regions[idx].id.clone()))
}

/// Prompts for a geocoding service. The first item keeps the default.
fn select_service() -> Result<Option<String>, Box<dyn std::error::Error>> {
    let services = service_registry::all_services();
    let mut labels = vec!["Default".to_string()];
    labels.extend(services.iter().map(|s| {
        let state = if s.enabled { "" } else { ", disabled" };
        format!("{} ({}{state})", s.id, s.name)
    }));

    let idx = Select::new()
        .with_prompt("Geocoding service")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(idx
        .checked_sub(1)
        .and_then(|i| services.get(i))
        .map(|s| s.id.clone()))
}

/// Prompts the user for an optional number. Returns `None` if the input is
/// empty.
fn prompt_optional<T>(prompt: &str) -> Result<Option<T>, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + 'static,
{
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    if input.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(input.trim().parse()?))
    }
}
