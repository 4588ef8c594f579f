//! Database schema definitions
//!
//! Listing columns mirror the fields of `ListingRecord` one-to-one; the
//! nearest and second-nearest stations are flattened into name/distance pairs.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track pagination runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    location TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_fetched INTEGER NOT NULL DEFAULT 0,
    scraped INTEGER NOT NULL DEFAULT 0,
    duplicates INTEGER NOT NULL DEFAULT 0,
    found INTEGER NOT NULL DEFAULT 0,
    inserted INTEGER NOT NULL DEFAULT 0,
    failed INTEGER NOT NULL DEFAULT 0,
    rejected INTEGER NOT NULL DEFAULT 0
);

-- Scraped listings
CREATE TABLE IF NOT EXISTS listings (
    id TEXT PRIMARY KEY,
    location TEXT NOT NULL,
    property_type TEXT,
    address TEXT,
    rent TEXT NOT NULL,
    price INTEGER NOT NULL CHECK (price > 0),
    base TEXT NOT NULL,
    bedrooms INTEGER,
    bathrooms INTEGER,
    description TEXT,
    image_count INTEGER,
    link TEXT,
    nearest_station TEXT,
    nearest_station_distance TEXT,
    second_station TEXT,
    second_station_distance TEXT,
    run_time TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_listings_location ON listings(location);
CREATE INDEX IF NOT EXISTS idx_listings_property_type ON listings(property_type);

-- Free-text station names resolved to canonical stations
CREATE TABLE IF NOT EXISTS station_mappings (
    station_name TEXT PRIMARY KEY,
    matched_station TEXT,
    station_code TEXT
);

-- Best commute per canonical station
CREATE TABLE IF NOT EXISTS travel_times (
    station_code TEXT PRIMARY KEY,
    destination TEXT NOT NULL,
    duration_minutes REAL NOT NULL,
    walk_minutes REAL NOT NULL
);

-- Computed scores, joined to listings by id
CREATE TABLE IF NOT EXISTS scores (
    listing_id TEXT PRIMARY KEY REFERENCES listings(id) ON DELETE CASCADE,
    price_score REAL,
    comfort_score REAL,
    transport_score REAL,
    combined_score REAL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
