//! HTTP fetcher for search-results pages
//!
//! This module handles:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Expanding the search URL template for a location and page offset
//! - Fetching a page body, treating any failure as fatal for the run

use crate::config::ScraperConfig;
use crate::LensError;
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client for page fetches
///
/// # Example
///
/// ```no_run
/// use lettings_lens::config::parse_config;
/// use lettings_lens::crawler::build_http_client;
///
/// let config = parse_config(&std::fs::read_to_string("config.toml").unwrap()).unwrap();
/// let client = build_http_client(&config.scraper).unwrap();
/// ```
pub fn build_http_client(config: &ScraperConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Expands the search URL template for one page
///
/// `index` is the result offset of the page (page index times page size).
pub fn search_url(template: &str, location: &str, location_code: &str, index: u64) -> String {
    template
        .replace("{location_code}", location_code)
        .replace("{location}", location)
        .replace("{index}", &index.to_string())
}

/// Fetches a page body
///
/// Network failures and non-success statuses are returned as errors; the
/// pagination driver does not retry them.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, LensError> {
    let response = client.get(url).send().await.map_err(|source| LensError::Http {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(LensError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|source| LensError::Http {
        url: url.to_string(),
        source,
    })
}
