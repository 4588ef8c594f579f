//! Crawler module for search-results scraping
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching of search-results pages
//! - Request throttling shared with the browser
//! - Duplicate collapsing across pages
//! - Overall run coordination per location

mod coordinator;
mod dedup;
mod fetcher;
mod throttle;

pub use coordinator::{Coordinator, RunReport, INSERT_BATCH_SIZE, PAGE_SIZE};
pub use dedup::{deduplicate, Deduplicated};
pub use fetcher::{build_http_client, fetch_page, search_url};
pub use throttle::Throttle;

use crate::browser::{BrowserSession, ChromeSession};
use crate::config::LocationEntry;
use crate::model::RunContext;
use crate::LensError;

/// Runs the pagination driver for each location in turn
///
/// This is the main entry point for scraping. It will:
/// 1. Launch one browser session for all locations
/// 2. Run each location with its own run context
/// 3. Close the browser whether or not the runs succeeded
///
/// # Arguments
///
/// * `coordinator` - Coordinator holding the configuration and storage
/// * `locations` - Locations to scrape, in order
/// * `max_pages` - Maximum pages per location
///
/// # Returns
///
/// * `Ok(Vec<RunReport>)` - One report per location
/// * `Err(LensError)` - The first run that failed
pub async fn crawl(
    coordinator: &mut Coordinator,
    locations: &[LocationEntry],
    max_pages: u32,
) -> Result<Vec<RunReport>, LensError> {
    let mut browser = ChromeSession::connect(&coordinator.config().browser).await?;

    let result = crawl_with(coordinator, &mut browser, locations, max_pages).await;

    if let Err(e) = browser.close().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }

    result
}

/// Runs every location against an already open browser session
pub async fn crawl_with<B>(
    coordinator: &mut Coordinator,
    browser: &mut B,
    locations: &[LocationEntry],
    max_pages: u32,
) -> Result<Vec<RunReport>, LensError>
where
    B: BrowserSession + ?Sized,
{
    let mut reports = Vec::with_capacity(locations.len());

    for location in locations {
        let ctx = RunContext::now();
        let report = coordinator.run(browser, location, max_pages, &ctx).await?;
        reports.push(report);
    }

    Ok(reports)
}
