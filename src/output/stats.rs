//! Statistics generation from the listings database
//!
//! This module provides functionality for extracting and displaying
//! price aggregates and pipeline progress from the storage layer.

use crate::storage::{GroupPriceStats, ListingFilter, PriceStats, RunRecord, Storage};
use crate::LensError;

/// Listing statistics summary
#[derive(Debug, Clone)]
pub struct ListingStatistics {
    /// Filter the aggregates were computed under
    pub filter: ListingFilter,

    /// Number of listings matching the filter
    pub total_listings: u64,

    /// Price aggregates per location
    pub by_location: Vec<PriceStats>,

    /// Price aggregates per {location, property type, bedrooms, bathrooms}
    pub by_group: Vec<GroupPriceStats>,

    /// Station names resolved so far, and how many found a code
    pub station_mappings: usize,
    pub matched_stations: usize,

    /// Stations with a stored travel time
    pub travel_times: usize,

    /// Stored score rows, and how many have a combined score
    pub scores: usize,
    pub combined_scores: usize,

    /// Most recent pagination run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `filter` - Location/property-type filter applied to the price aggregates
///
/// # Returns
///
/// * `Ok(ListingStatistics)` - Successfully loaded statistics
/// * `Err(LensError)` - Failed to query statistics
pub fn load_statistics<S: Storage + ?Sized>(
    storage: &S,
    filter: &ListingFilter,
) -> Result<ListingStatistics, LensError> {
    let total_listings = storage.count_listings(filter)?;
    let by_location = storage.price_stats_by_location(filter)?;
    let by_group = storage.price_stats_by_group(filter)?;

    let mappings = storage.load_station_mappings()?;
    let matched_stations = mappings.iter().filter(|m| m.station_code.is_some()).count();

    let travel_times = storage.load_travel_times()?.len();

    let scores = storage.load_scores()?;
    let combined_scores = scores.iter().filter(|s| s.combined_score.is_some()).count();

    Ok(ListingStatistics {
        filter: filter.clone(),
        total_listings,
        by_location,
        by_group,
        station_mappings: mappings.len(),
        matched_stations,
        travel_times,
        scores: scores.len(),
        combined_scores,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &ListingStatistics) {
    println!("=== Listing Statistics ===\n");

    if stats.filter.location.is_some() || stats.filter.property_type.is_some() {
        println!(
            "Filter: location={} property-type={}\n",
            stats.filter.location.as_deref().unwrap_or("*"),
            stats.filter.property_type.as_deref().unwrap_or("*")
        );
    }

    println!("Overview:");
    println!("  Listings: {}", stats.total_listings);
    println!(
        "  Station names resolved: {} ({} matched)",
        stats.station_mappings, stats.matched_stations
    );
    println!("  Stations with travel times: {}", stats.travel_times);
    println!(
        "  Scored listings: {} ({} with a combined score)",
        stats.scores, stats.combined_scores
    );
    println!();

    if !stats.by_location.is_empty() {
        println!("Price by Location:");
        for row in &stats.by_location {
            println!(
                "  {}: {} listings, min £{}, max £{}, mean £{:.0}",
                row.location, row.count, row.min_price, row.max_price, row.mean_price
            );
        }
        println!();
    }

    if !stats.by_group.is_empty() {
        println!("Price by Group (location / type / beds / baths):");
        for row in &stats.by_group {
            println!(
                "  {} / {} / {} / {}: {} listings, min £{}, max £{}, mean £{:.0}",
                row.location,
                row.property_type.as_deref().unwrap_or("-"),
                row.bedrooms,
                row.bathrooms,
                row.count,
                row.min_price,
                row.max_price,
                row.mean_price
            );
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  Id: {} ({})", run.id, run.location);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!(
                "  Pages: {}, found: {}, duplicates: {}, inserted: {}, failed: {}, rejected: {}",
                run.counts.pages_fetched,
                run.counts.found,
                run.counts.duplicates,
                run.counts.inserted,
                run.counts.failed,
                run.counts.rejected
            );
        }
        None => println!("No runs recorded yet"),
    }
}
