//! Pagination driver - one scrape run per location
//!
//! A run:
//! - Fetches page 0 and reads the advertised result count
//! - Walks result pages, extracting listings and their nearby stations
//! - Collapses duplicate listings
//! - Stores the survivors in batches and records the run

use crate::browser::{BrowserSession, TransportExtractor};
use crate::config::{Config, LocationEntry};
use crate::crawler::dedup::{deduplicate, Deduplicated};
use crate::crawler::{build_http_client, fetch_page, search_url, Throttle};
use crate::extract::{extract_listings, parse_result_count, PageRef};
use crate::model::{ListingRecord, RunContext};
use crate::storage::{RunCounts, SqliteStorage, Storage};
use crate::LensError;
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Listings per insert transaction
pub const INSERT_BATCH_SIZE: usize = 100;

/// Listings per search-results page; the site's `index` offset steps by this
pub const PAGE_SIZE: u64 = 24;

/// Outcome of one pagination run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: i64,
    pub location: String,
    /// Result count advertised on the first page
    pub result_count: u64,
    pub counts: RunCounts,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} listings found ({} duplicates, {} rejected) across {} pages; {} inserted, {} failed",
            self.location,
            self.counts.found,
            self.counts.duplicates,
            self.counts.rejected,
            self.counts.pages_fetched,
            self.counts.inserted,
            self.counts.failed
        )
    }
}

/// Listings gathered before deduplication
#[derive(Debug, Default)]
struct ScrapeOutcome {
    listings: Vec<ListingRecord>,
    result_count: u64,
    pages_fetched: usize,
    rejected: usize,
}

/// Main scrape coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    config_hash: String,
    storage: SqliteStorage,
    client: Client,
    throttle: Throttle,
    transport: TransportExtractor,
    site_origin: Url,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `config_hash` - Hash of the configuration file, stored on each run
    /// * `storage` - Where listings and runs are written
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(LensError)` - The site origin or HTTP client could not be set up
    pub fn new(
        config: Config,
        config_hash: impl Into<String>,
        storage: SqliteStorage,
    ) -> Result<Self, LensError> {
        let site_origin = Url::parse(&config.scraper.site_origin)?;
        let client = build_http_client(&config.scraper)?;
        let throttle = Throttle::new(Duration::from_millis(
            config.scraper.minimum_request_interval_ms,
        ));
        let transport = TransportExtractor::new(&config.browser, throttle.clone());

        Ok(Self {
            config: Arc::new(config),
            config_hash: config_hash.into(),
            storage,
            client,
            throttle,
            transport,
            site_origin,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn into_storage(self) -> SqliteStorage {
        self.storage
    }

    /// Runs one location from page 0
    ///
    /// The run row is marked failed if any step errors. A fetch failure, an
    /// unreadable result count or a lost browser session ends the run;
    /// everything else degrades to missing data and counters in the report.
    ///
    /// # Arguments
    ///
    /// * `browser` - Session used for every detail page of the run
    /// * `location` - Location to scrape
    /// * `max_pages` - Maximum pages for this run
    /// * `ctx` - Run timestamp used for ids and run dates
    pub async fn run<B>(
        &mut self,
        browser: &mut B,
        location: &LocationEntry,
        max_pages: u32,
        ctx: &RunContext,
    ) -> Result<RunReport, LensError>
    where
        B: BrowserSession + ?Sized,
    {
        let run_id = self.storage.create_run(&location.name, &self.config_hash)?;
        tracing::info!("Starting run {} for {}", run_id, location.name);

        let scraped = self.scrape(browser, location, max_pages, ctx).await;
        let result = scraped.and_then(|outcome| self.persist(run_id, location, outcome, ctx));

        if let Err(e) = &result {
            tracing::error!("Run {} for {} failed: {}", run_id, location.name, e);
            if let Err(mark) = self.storage.fail_run(run_id) {
                tracing::error!("Could not mark run {} as failed: {}", run_id, mark);
            }
        }

        result
    }

    async fn scrape<B>(
        &self,
        browser: &mut B,
        location: &LocationEntry,
        max_pages: u32,
        ctx: &RunContext,
    ) -> Result<ScrapeOutcome, LensError>
    where
        B: BrowserSession + ?Sized,
    {
        let first_url = self.page_url(location, 0);
        let mut html = self.fetch(&first_url).await?;
        let result_count =
            parse_result_count(&html).ok_or(LensError::ResultCount { url: first_url })?;
        tracing::info!("{} advertises {} results", location.name, result_count);

        let mut outcome = ScrapeOutcome {
            result_count,
            ..ScrapeOutcome::default()
        };
        let mut index: u64 = 0;

        for page_index in 0..max_pages {
            if page_index > 0 {
                html = self.fetch(&self.page_url(location, index)).await?;
            }

            let page = PageRef {
                location: &location.name,
                location_code: &location.code,
                page_index,
            };
            let extracted = extract_listings(&html, page, &self.site_origin, ctx);
            outcome.pages_fetched += 1;
            outcome.rejected += extracted.rejected.len();
            tracing::info!(
                "{} page {}: {} listings, {} rejected",
                location.name,
                page_index + 1,
                extracted.listings.len(),
                extracted.rejected.len()
            );

            for mut listing in extracted.listings {
                if let Some(link) = listing.link.clone() {
                    match self.transport.extract(browser, &link).await? {
                        Some(stations) => listing.set_stations(stations),
                        None => tracing::debug!("No transport data for {}", listing.id),
                    }
                }
                outcome.listings.push(listing);
            }

            index += PAGE_SIZE;
            if index >= result_count {
                break;
            }
        }

        Ok(outcome)
    }

    fn persist(
        &mut self,
        run_id: i64,
        location: &LocationEntry,
        outcome: ScrapeOutcome,
        ctx: &RunContext,
    ) -> Result<RunReport, LensError> {
        let scraped = outcome.listings.len();
        let Deduplicated {
            mut listings,
            duplicates,
        } = deduplicate(outcome.listings);
        tracing::info!("{} duplicates found for {}", duplicates, location.name);

        let run_date = ctx.run_date();
        for listing in &mut listings {
            listing.run_time = run_date;
        }

        let inserted = self.storage.insert_listings(&listings, INSERT_BATCH_SIZE)?;

        let counts = RunCounts {
            pages_fetched: outcome.pages_fetched,
            scraped,
            duplicates,
            found: listings.len(),
            inserted: inserted.inserted,
            failed: inserted.failed,
            rejected: outcome.rejected,
        };
        self.storage.complete_run(run_id, &counts)?;

        let report = RunReport {
            run_id,
            location: location.name.clone(),
            result_count: outcome.result_count,
            counts,
        };
        tracing::info!("{}", report);
        Ok(report)
    }

    fn page_url(&self, location: &LocationEntry, index: u64) -> String {
        search_url(
            &self.config.scraper.search_url_template,
            &location.name,
            &location.code,
            index,
        )
    }

    async fn fetch(&self, url: &str) -> Result<String, LensError> {
        self.throttle.wait().await;
        tracing::debug!("Fetching {}", url);
        fetch_page(&self.client, url).await
    }
}
