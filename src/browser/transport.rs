//! Nearest-station extraction from listing detail pages

use crate::browser::{BrowserError, BrowserSession};
use crate::config::BrowserConfig;
use crate::crawler::Throttle;
use crate::extract::{parse_station_panel, CONSENT_BUTTON, STATIONS_PANEL, STATIONS_TAB};
use crate::model::NearbyStation;
use std::time::Duration;

/// Drives a browser through a detail page to read its stations tab
///
/// # Flow per attempt
///
/// 1. Navigate to the detail page
/// 2. If the cookie-consent button exists, wait for it to be clickable and click it
/// 3. Click the "Stations" tab and wait for its panel
/// 4. Parse every (name, distance) pair in the panel
///
/// An attempt that times out or finds no stations is retried after a fixed
/// delay, up to `max_attempts`. Only a lost session is reported as an error.
#[derive(Debug, Clone)]
pub struct TransportExtractor {
    wait_timeout: Duration,
    max_attempts: u32,
    retry_delay: Duration,
    throttle: Throttle,
}

impl TransportExtractor {
    pub fn new(config: &BrowserConfig, throttle: Throttle) -> Self {
        Self {
            wait_timeout: Duration::from_millis(config.wait_timeout_ms),
            max_attempts: config.max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            throttle,
        }
    }

    /// Reads the stations listed on `url`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(stations))` - At least one station, in page order
    /// * `Ok(None)` - Every attempt failed or found nothing
    /// * `Err(BrowserError)` - The browser session is no longer usable
    pub async fn extract<B>(
        &self,
        browser: &mut B,
        url: &str,
    ) -> Result<Option<Vec<NearbyStation>>, BrowserError>
    where
        B: BrowserSession + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            tracing::debug!("Attempt {} for {}", attempt, url);

            match self.attempt(browser, url).await {
                Ok(stations) if !stations.is_empty() => return Ok(Some(stations)),
                Ok(_) => tracing::warn!("Attempt {} for {}: no stations found", attempt, url),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::warn!("Attempt {} for {} failed: {}", attempt, url, e),
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        tracing::warn!(
            "Giving up on transport info for {} after {} attempts",
            url,
            self.max_attempts
        );
        Ok(None)
    }

    async fn attempt<B>(&self, browser: &mut B, url: &str) -> Result<Vec<NearbyStation>, BrowserError>
    where
        B: BrowserSession + ?Sized,
    {
        self.throttle.wait().await;
        browser.navigate(url).await?;

        if browser.is_present(CONSENT_BUTTON).await? {
            browser.find_and_click(CONSENT_BUTTON, self.wait_timeout).await?;
            tracing::debug!("Accepted cookies on {}", url);
        }

        browser.find_and_click(STATIONS_TAB, self.wait_timeout).await?;
        browser.wait_for(STATIONS_PANEL, self.wait_timeout).await?;

        let html = browser.parse_current_document().await?;
        Ok(parse_station_panel(&html))
    }
}
