//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{ListingRecord, ScoreRecord, StationMapping, TravelTime};
use crate::storage::{
    GroupPriceStats, InsertReport, ListingFilter, PriceStats, RunCounts, RunRecord,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines every database operation the pipeline stages need.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run for a location
    ///
    /// # Arguments
    ///
    /// * `location` - The location being scraped
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, location: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as completed and records its counters
    fn complete_run(&mut self, run_id: i64, counts: &RunCounts) -> StorageResult<()>;

    /// Marks a run as failed
    fn fail_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Listings =====

    /// Inserts listings in batches, falling back to row-by-row inserts
    ///
    /// A batch that fails as a whole is rolled back and retried one row at a
    /// time so a single bad record only loses itself.
    ///
    /// # Arguments
    ///
    /// * `listings` - The listings to insert
    /// * `batch_size` - Rows per transaction
    fn insert_listings(
        &mut self,
        listings: &[ListingRecord],
        batch_size: usize,
    ) -> StorageResult<InsertReport>;

    /// Loads listings matching the filter, ordered by id
    fn load_listings(&self, filter: &ListingFilter) -> StorageResult<Vec<ListingRecord>>;

    /// Deletes listings (and their scores) matching the filter
    ///
    /// # Returns
    ///
    /// The number of listings deleted
    fn delete_listings(&mut self, filter: &ListingFilter) -> StorageResult<u64>;

    /// Counts listings matching the filter
    fn count_listings(&self, filter: &ListingFilter) -> StorageResult<u64>;

    /// Distinct station names across nearest and second-nearest columns
    fn distinct_station_names(&self) -> StorageResult<Vec<String>>;

    // ===== Station Mappings =====

    /// Replaces all station mappings
    fn save_station_mappings(&mut self, mappings: &[StationMapping]) -> StorageResult<()>;

    /// Loads all station mappings
    fn load_station_mappings(&self) -> StorageResult<Vec<StationMapping>>;

    /// Distinct canonical codes of successfully mapped stations
    fn mapped_station_codes(&self) -> StorageResult<Vec<String>>;

    // ===== Travel Times =====

    /// Inserts or overwrites the travel time for a station code
    fn upsert_travel_time(&mut self, travel_time: &TravelTime) -> StorageResult<()>;

    /// Loads all travel times
    fn load_travel_times(&self) -> StorageResult<Vec<TravelTime>>;

    // ===== Scores =====

    /// Replaces all scores
    fn save_scores(&mut self, scores: &[ScoreRecord]) -> StorageResult<()>;

    /// Loads all scores, ordered by listing id
    fn load_scores(&self) -> StorageResult<Vec<ScoreRecord>>;

    // ===== Statistics =====

    /// Count/min/max/mean of price per location
    fn price_stats_by_location(&self, filter: &ListingFilter) -> StorageResult<Vec<PriceStats>>;

    /// Count/min/max/mean of price per {location, property type, bedrooms, bathrooms}
    ///
    /// "Apartment" and "Flat" are merged into one property-type group.
    fn price_stats_by_group(&self, filter: &ListingFilter)
        -> StorageResult<Vec<GroupPriceStats>>;
}
