//! Lettings-Lens: rental listing ingestion and scoring
//!
//! This crate scrapes paginated rental search results, enriches each listing
//! with nearby-station data from a browser session, resolves station names to
//! canonical codes, looks up commute times to central hubs, and scores every
//! listing on price, comfort and transport.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod journey;
pub mod model;
pub mod output;
pub mod scoring;
pub mod stations;
pub mod storage;

use thiserror::Error;

/// Main error type for Lettings-Lens operations
#[derive(Debug, Error)]
pub enum LensError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Could not read the result count from {url}")]
    ResultCount { url: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Browser error: {0}")]
    Browser(#[from] browser::BrowserError),

    #[error("Journey service error: {0}")]
    Journey(#[from] journey::JourneyError),

    #[error("Station reference error: {0}")]
    StationReference(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Lettings-Lens operations
pub type Result<T> = std::result::Result<T, LensError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{ListingRecord, RoomCount, RunContext, ScoreRecord, StationMapping, TravelTime};
