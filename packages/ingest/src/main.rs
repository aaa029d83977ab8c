#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the burglary map scraper.

use burglary_map_cli_utils::IndicatifProgress;
use burglary_map_ingest::{
    RetryOptions, RunOptions, export_frontend, links::SyncMode, retry_geocodes, run_pipeline,
    sync_region_links,
};
use burglary_map_store::paths::DataPaths;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "burglary_map_ingest",
    about = "Scrapes police daily reports into a geocoded burglary map"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new reports, extract and geocode break-ins, and write the map export
    Run {
        /// Region id (e.g., "oestjylland")
        #[arg(long)]
        region: Option<String>,
        /// Maximum number of reports to process, newest pending reports first
        #[arg(long)]
        limit: Option<usize>,
        /// Maximum number of listing pages to check for new reports
        #[arg(long)]
        pages: Option<u32>,
        /// Geocoding service id (e.g., "nominatim", "pelias")
        #[arg(long)]
        provider: Option<String>,
        /// Reprocess reports that were already processed
        #[arg(long)]
        all: bool,
    },
    /// Refresh the list of known report links
    SyncLinks {
        /// Region id
        #[arg(long)]
        region: Option<String>,
        /// Walk the whole listing instead of stopping at the first known link
        #[arg(long)]
        all: bool,
        /// Earliest publication date (YYYY-MM-DD); defaults to the region's listing start
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest publication date (YYYY-MM-DD); defaults to now
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Maximum number of listing pages to fetch
        #[arg(long)]
        pages: Option<u32>,
    },
    /// Re-resolve addresses in the geocode failure log
    RetryGeocodes {
        /// Region id
        #[arg(long)]
        region: Option<String>,
        /// Maximum number of failures to retry
        #[arg(long)]
        limit: Option<usize>,
        /// Geocoding service id
        #[arg(long)]
        provider: Option<String>,
        /// Query the provider again for queries cached as having no result
        #[arg(long)]
        refresh_misses: bool,
    },
    /// Write docs/data.json from the record store
    Export,
    /// List configured regions
    Regions,
    /// List geocoding services
    Services,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = burglary_map_cli_utils::init_logger();
    let cli = Cli::parse();
    let paths = DataPaths::from_env();

    let Some(command) = cli.command else {
        return burglary_map_ingest::interactive::run(&multi, &paths).await;
    };

    match command {
        Commands::Run {
            region,
            limit,
            pages,
            provider,
            all,
        } => {
            let options = RunOptions {
                region,
                provider,
                limit,
                max_pages: pages,
                include_processed: all,
            };
            let progress = IndicatifProgress::reports_bar(&multi, "Processing reports");
            let summary = run_pipeline(&paths, &options, progress).await?;
            println!("{summary}");
        }
        Commands::SyncLinks {
            region,
            all,
            from,
            to,
            pages,
        } => {
            let mode = if all { SyncMode::All } else { SyncMode::Recent };
            let summary =
                sync_region_links(&paths, region.as_deref(), mode, from, to, pages).await?;
            println!(
                "{} new links from {} listing pages",
                summary.added, summary.pages
            );
        }
        Commands::RetryGeocodes {
            region,
            limit,
            provider,
            refresh_misses,
        } => {
            let options = RetryOptions {
                region,
                provider,
                limit,
                refresh_misses,
            };
            let progress = IndicatifProgress::geocode_bar(&multi, "Retrying geocodes");
            let summary = retry_geocodes(&paths, &options, progress).await?;
            println!(
                "Fixed: {}, still failing: {}",
                summary.fixed, summary.still_failing
            );
        }
        Commands::Export => {
            let export = export_frontend(&paths)?;
            println!(
                "Exported {} entries across {} dates",
                export.len(),
                export.date_count()
            );
        }
        Commands::Regions => burglary_map_ingest::interactive::list_regions(),
        Commands::Services => burglary_map_ingest::interactive::list_services(),
    }

    Ok(())
}
