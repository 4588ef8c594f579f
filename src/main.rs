//! Lettings-Lens main entry point
//!
//! This is the command-line interface for the Lettings-Lens listing pipeline.

use anyhow::{bail, Context};
use clap::Parser;
use lettings_lens::config::{load_config_with_hash, Config, LocationEntry};
use lettings_lens::crawler::{crawl, Coordinator, PAGE_SIZE};
use lettings_lens::journey::{resolve_travel_times, TflJourneyClient, TravelTimeResolver};
use lettings_lens::output::{load_statistics, print_statistics};
use lettings_lens::scoring::score_listings;
use lettings_lens::stations::resolve_stations;
use lettings_lens::storage::{open_storage, ListingFilter, SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Lettings-Lens: rental listing scraper and scorer
///
/// Lettings-Lens scrapes rental search results per location, enriches each
/// listing with its nearest stations, resolves commute times to central hubs
/// and scores every listing on price, comfort and transport.
#[derive(Parser, Debug)]
#[command(name = "lettings-lens")]
#[command(version = "1.0.0")]
#[command(about = "Rental listing scraper and scorer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without scraping
    #[arg(long, group = "mode")]
    dry_run: bool,

    /// Scrape search results for each location (default)
    #[arg(long, group = "mode")]
    scrape: bool,

    /// Match stored station names to canonical stations
    #[arg(long, group = "mode")]
    resolve_stations: bool,

    /// Look up commute times for every matched station
    #[arg(long, group = "mode")]
    travel_times: bool,

    /// Score every stored listing
    #[arg(long, group = "mode")]
    score: bool,

    /// Show price statistics from the database and exit
    #[arg(long, group = "mode")]
    stats: bool,

    /// Delete stored listings matching --location and --property-type
    #[arg(long, group = "mode")]
    delete: bool,

    /// Restrict to one configured location
    #[arg(long, value_name = "LOCATION")]
    location: Option<String>,

    /// Restrict --stats and --delete to one property type ("apartment/flat" matches both)
    #[arg(long, value_name = "TYPE")]
    property_type: Option<String>,

    /// Pages to fetch per location (defaults to max-pages from the config)
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Clear stored listings and scores before scraping
    #[arg(long, conflicts_with_all = ["dry_run", "resolve_stations", "travel_times", "score", "stats", "delete"])]
    fresh: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let filter = ListingFilter::new(cli.location.clone(), cli.property_type.clone());

    if cli.dry_run {
        handle_dry_run(&config, &cli)?;
    } else if cli.resolve_stations {
        handle_resolve_stations(&config)?;
    } else if cli.travel_times {
        handle_travel_times(&config).await?;
    } else if cli.score {
        handle_score(&config)?;
    } else if cli.stats {
        handle_stats(&config, &filter)?;
    } else if cli.delete {
        handle_delete(&config, &filter)?;
    } else {
        handle_scrape(config, config_hash, &cli).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lettings_lens=info,warn"),
            1 => EnvFilter::new("lettings_lens=debug,info"),
            2 => EnvFilter::new("lettings_lens=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Locations to scrape: all configured ones, or the one named by --location
fn selected_locations(config: &Config, location: Option<&str>) -> anyhow::Result<Vec<LocationEntry>> {
    match location {
        None => Ok(config.locations.clone()),
        Some(name) => match config.locations.iter().find(|l| l.name.eq_ignore_ascii_case(name)) {
            Some(entry) => Ok(vec![entry.clone()]),
            None => bail!("Location '{}' is not configured", name),
        },
    }
}

fn open_database(config: &Config) -> anyhow::Result<SqliteStorage> {
    open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open database {}", config.output.database_path))
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    let locations = selected_locations(config, cli.location.as_deref())?;
    let pages = cli.pages.unwrap_or(config.scraper.max_pages);

    println!("=== Lettings-Lens Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Site origin: {}", config.scraper.site_origin);
    println!("  Page size: {}", PAGE_SIZE);
    println!("  Pages per location: {}", pages);
    println!(
        "  Minimum request interval: {}ms",
        config.scraper.minimum_request_interval_ms
    );

    println!("\nBrowser:");
    println!(
        "  Chrome: {} (headless: {})",
        config.browser.chrome_path.as_deref().unwrap_or("system default"),
        config.browser.headless
    );
    println!(
        "  Attempts per listing: {} ({}ms apart)",
        config.browser.max_attempts, config.browser.retry_delay_ms
    );

    println!("\nStations:");
    println!("  Reference: {}", config.stations.reference_path);
    println!("  Match threshold: {}", config.stations.match_threshold);

    println!("\nJourney Destinations ({}):", config.journey.destinations.len());
    for destination in &config.journey.destinations {
        println!(
            "  - {} ({}, {} min walk)",
            destination.name, destination.code, destination.walk_minutes
        );
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nLocations ({}):", locations.len());
    for location in &locations {
        println!("  - {} ({})", location.name, location.code);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would fetch up to {} result pages",
        locations.len() as u64 * u64::from(pages)
    );

    Ok(())
}

/// Handles the default --scrape mode
async fn handle_scrape(config: Config, config_hash: String, cli: &Cli) -> anyhow::Result<()> {
    let locations = selected_locations(&config, cli.location.as_deref())?;
    let pages = cli.pages.unwrap_or(config.scraper.max_pages);
    let mut storage = open_database(&config)?;

    if cli.fresh {
        let deleted = storage.delete_listings(&ListingFilter::default())?;
        tracing::info!("Starting fresh scrape ({} stored listings removed)", deleted);
    }

    tracing::info!(
        "Scraping {} locations, up to {} pages each",
        locations.len(),
        pages
    );

    let mut coordinator = Coordinator::new(config, config_hash, storage)?;
    let reports = crawl(&mut coordinator, &locations, pages)
        .await
        .context("Scrape failed")?;

    for report in &reports {
        println!("{}", report);
    }

    Ok(())
}

/// Handles the --resolve-stations mode
fn handle_resolve_stations(config: &Config) -> anyhow::Result<()> {
    let mut storage = open_database(config)?;
    let summary = resolve_stations(&mut storage, &config.stations)
        .context("Station resolution failed")?;

    println!(
        "✓ Matched {} of {} station names",
        summary.matched, summary.names
    );
    Ok(())
}

/// Handles the --travel-times mode
async fn handle_travel_times(config: &Config) -> anyhow::Result<()> {
    let mut storage = open_database(config)?;
    let client = TflJourneyClient::new(&config.journey).context("Failed to build journey client")?;
    let resolver = TravelTimeResolver::new(client, &config.journey);

    let summary = resolve_travel_times(&mut storage, &resolver)
        .await
        .context("Travel time resolution failed")?;

    println!(
        "✓ Resolved travel times for {} of {} stations ({} at penalty cost)",
        summary.resolved, summary.stations, summary.penalized
    );
    Ok(())
}

/// Handles the --score mode
fn handle_score(config: &Config) -> anyhow::Result<()> {
    let mut storage = open_database(config)?;
    let summary = score_listings(&mut storage, &config.scoring).context("Scoring failed")?;

    println!(
        "✓ Scored {} listings ({} without a combined score)",
        summary.listings, summary.unscored
    );
    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config, filter: &ListingFilter) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_database(config)?;
    let stats = load_statistics(&storage, filter)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --delete mode
fn handle_delete(config: &Config, filter: &ListingFilter) -> anyhow::Result<()> {
    if filter.is_empty() {
        bail!("--delete needs --location or --property-type; use --fresh to clear everything");
    }

    let mut storage = open_database(config)?;
    let deleted = storage.delete_listings(filter)?;

    println!("✓ Deleted {} listings", deleted);
    Ok(())
}
