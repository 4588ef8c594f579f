use serde::Deserialize;

/// Main configuration structure for Lettings-Lens
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    pub stations: StationsConfig,
    #[serde(default)]
    pub journey: JourneyConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "location")]
    pub locations: Vec<LocationEntry>,
}

/// Search-results scraping configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Origin prefixed to relative detail-page links
    #[serde(rename = "site-origin")]
    pub site_origin: String,

    /// Search URL with `{location}`, `{location_code}` and `{index}` placeholders
    #[serde(rename = "search-url-template")]
    pub search_url_template: String,

    /// User agent sent with page requests
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum number of pages fetched per run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Timeout for a single page request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Minimum time between two upstream requests (milliseconds)
    #[serde(rename = "minimum-request-interval-ms", default)]
    pub minimum_request_interval_ms: u64,
}

/// Browser automation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Run Chrome without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Chrome executable; found on the system when unset
    #[serde(rename = "chrome-path", default)]
    pub chrome_path: Option<String>,

    /// Seconds Chrome may sit idle before the session is dropped
    #[serde(rename = "idle-timeout-secs", default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// How long to wait for an element to appear or become clickable (milliseconds)
    #[serde(rename = "wait-timeout-ms", default = "default_wait_timeout")]
    pub wait_timeout_ms: u64,

    /// Attempts per listing before transport data is given up on
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            chrome_path: None,
            idle_timeout_secs: default_idle_timeout(),
            wait_timeout_ms: default_wait_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

/// Station resolution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StationsConfig {
    /// CSV file holding canonical station names and codes
    #[serde(rename = "reference-path")]
    pub reference_path: String,

    /// Minimum similarity (0-100) for a fuzzy match to be accepted
    #[serde(rename = "match-threshold", default = "default_match_threshold")]
    pub match_threshold: f64,
}

/// Journey-time service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JourneyConfig {
    #[serde(rename = "base-url", default = "default_journey_base_url")]
    pub base_url: String,

    /// Travel date sent with every query (YYYYMMDD)
    #[serde(default = "default_journey_date")]
    pub date: String,

    /// Departure time sent with every query (HHMM)
    #[serde(default = "default_journey_time")]
    pub time: String,

    /// Total cost assigned to a destination whose query failed (minutes)
    #[serde(rename = "error-penalty-minutes", default = "default_error_penalty")]
    pub error_penalty_minutes: f64,

    #[serde(rename = "destination", default = "default_destinations")]
    pub destinations: Vec<DestinationEntry>,
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            base_url: default_journey_base_url(),
            date: default_journey_date(),
            time: default_journey_time(),
            error_penalty_minutes: default_error_penalty(),
            destinations: default_destinations(),
        }
    }
}

/// A hub destination with its fixed walking offset
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationEntry {
    pub name: String,
    pub code: String,
    #[serde(rename = "walk-minutes")]
    pub walk_minutes: f64,
}

/// Scoring configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Transport score used when a listing has no commute data
    #[serde(rename = "missing-transport-score", default = "default_missing_transport")]
    pub missing_transport_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            missing_transport_score: default_missing_transport(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// A search location to scrape
#[derive(Debug, Clone, Deserialize)]
pub struct LocationEntry {
    /// Location identifier used in the search URL and stored on each listing
    pub name: String,

    /// Short location code used in the search URL and listing ids
    pub code: String,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.114 Safari/537.36".to_string()
}

fn default_max_pages() -> u32 {
    42
}

fn default_request_timeout() -> u64 {
    30
}

fn default_headless() -> bool {
    true
}

fn default_idle_timeout() -> u64 {
    120
}

fn default_wait_timeout() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1_000
}

fn default_match_threshold() -> f64 {
    70.0
}

fn default_journey_base_url() -> String {
    "https://api.tfl.gov.uk".to_string()
}

fn default_journey_date() -> String {
    "20250710".to_string()
}

fn default_journey_time() -> String {
    "0900".to_string()
}

fn default_error_penalty() -> f64 {
    60.0
}

fn default_missing_transport() -> f64 {
    5.0
}

fn default_destinations() -> Vec<DestinationEntry> {
    [
        ("Bank", "940GZZLUBNK", 9.0),
        ("Aldgate", "940GZZLUALD", 5.0),
        ("Liverpool Street", "940GZZLULVT", 12.0),
        ("Tower Hill", "940GZZLUTWH", 10.0),
        ("Tower Gateway", "9400ZZDLTWG", 10.0),
    ]
    .into_iter()
    .map(|(name, code, walk_minutes)| DestinationEntry {
        name: name.to_string(),
        code: code.to_string(),
        walk_minutes,
    })
    .collect()
}
