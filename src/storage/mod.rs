//! Storage module for persisting pipeline data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Batched listing inserts with row-level fallback
//! - Station mappings, travel times and scores
//! - Filtered queries, deletes and price aggregates
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::model::RoomCount;
use crate::LensError;

use std::path::Path;

/// Label listings of type "Apartment" or "Flat" are grouped under
pub const APARTMENT_OR_FLAT: &str = "Apartment/Flat";

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(LensError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, LensError> {
    SqliteStorage::new(path)
}

/// Represents a pagination run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub location: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub counts: RunCounts,
}

/// Counters recorded when a run finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub pages_fetched: usize,
    /// Listings extracted before deduplication
    pub scraped: usize,
    pub duplicates: usize,
    /// Listings left after deduplication
    pub found: usize,
    pub inserted: usize,
    pub failed: usize,
    /// Cards dropped because their price could not be read
    pub rejected: usize,
}

/// Status of a pagination run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Outcome of a batched listing insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub inserted: usize,
    pub failed: usize,
    /// Ids of the listings that could not be stored
    pub failed_ids: Vec<String>,
}

/// Location and property-type filter for listing queries and deletes
///
/// Property types compare case-insensitively, and the value
/// "apartment/flat" matches both "Apartment" and "Flat".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub location: Option<String>,
    pub property_type: Option<String>,
}

impl ListingFilter {
    pub fn new(location: Option<String>, property_type: Option<String>) -> Self {
        Self {
            location,
            property_type,
        }
    }

    /// Whether the filter matches every listing
    pub fn is_empty(&self) -> bool {
        self.location.as_deref().map_or(true, |l| l.trim().is_empty())
            && self.property_type_labels().is_empty()
    }

    /// Lowercased property-type labels the filter accepts
    pub fn property_type_labels(&self) -> Vec<String> {
        match self.property_type.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(value) if value.eq_ignore_ascii_case(APARTMENT_OR_FLAT) => {
                vec!["apartment".to_string(), "flat".to_string()]
            }
            Some(value) => vec![value.to_lowercase()],
        }
    }

    /// Builds a `WHERE` clause (possibly empty) and its parameters
    pub(crate) fn where_clause(&self) -> (String, Vec<String>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(location) = self.location.as_deref().filter(|l| !l.trim().is_empty()) {
            conditions.push("location = ?".to_string());
            params.push(location.trim().to_string());
        }

        let labels = self.property_type_labels();
        if !labels.is_empty() {
            let placeholders = vec!["?"; labels.len()].join(", ");
            conditions.push(format!("LOWER(property_type) IN ({})", placeholders));
            params.extend(labels);
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

/// Price aggregate for one location
#[derive(Debug, Clone, PartialEq)]
pub struct PriceStats {
    pub location: String,
    pub count: u64,
    pub min_price: i64,
    pub max_price: i64,
    pub mean_price: f64,
}

/// Price aggregate for one {location, property type, bedrooms, bathrooms} group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPriceStats {
    pub location: String,
    /// Property type with "Apartment" and "Flat" merged
    pub property_type: Option<String>,
    pub bedrooms: RoomCount,
    pub bathrooms: RoomCount,
    pub count: u64,
    pub min_price: i64,
    pub max_price: i64,
    pub mean_price: f64,
}
