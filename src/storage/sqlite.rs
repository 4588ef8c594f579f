//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{ListingRecord, NearbyStation, RoomCount, ScoreRecord, StationMapping, TravelTime};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    GroupPriceStats, InsertReport, ListingFilter, PriceStats, RunCounts, RunRecord, RunStatus,
    APARTMENT_OR_FLAT,
};
use crate::LensError;
use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

const LISTING_COLUMNS: &str = "id, location, property_type, address, rent, price, base, \
    bedrooms, bathrooms, description, image_count, link, nearest_station, \
    nearest_station_distance, second_station, second_station_distance, run_time";

const RUN_COLUMNS: &str = "id, location, started_at, finished_at, config_hash, status, \
    pages_fetched, scraped, duplicates, found, inserted, failed, rejected";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(LensError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, LensError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, LensError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Inserts one batch inside a transaction; any row error rolls back the batch
    fn insert_batch(&mut self, batch: &[ListingRecord]) -> rusqlite::Result<()> {
        let tx = self.conn.transaction()?;
        for listing in batch {
            insert_listing(&tx, listing)?;
        }
        tx.commit()
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, location: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (location, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![location, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    fn complete_run(&mut self, run_id: i64, counts: &RunCounts) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_fetched = ?3, scraped = ?4,
                duplicates = ?5, found = ?6, inserted = ?7, failed = ?8, rejected = ?9
             WHERE id = ?10",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                counts.pages_fetched,
                counts.scraped,
                counts.duplicates,
                counts.found,
                counts.inserted,
                counts.failed,
                counts.rejected,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn fail_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Failed.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    // ===== Listings =====

    fn insert_listings(
        &mut self,
        listings: &[ListingRecord],
        batch_size: usize,
    ) -> StorageResult<InsertReport> {
        let mut report = InsertReport::default();

        for batch in listings.chunks(batch_size.max(1)) {
            match self.insert_batch(batch) {
                Ok(()) => report.inserted += batch.len(),
                Err(e) => {
                    tracing::warn!(
                        "Batch insert of {} listings failed ({}), retrying row by row",
                        batch.len(),
                        e
                    );
                    for listing in batch {
                        match insert_listing(&self.conn, listing) {
                            Ok(()) => report.inserted += 1,
                            Err(e) => {
                                tracing::error!("Failed to insert listing {}: {}", listing.id, e);
                                report.failed += 1;
                                report.failed_ids.push(listing.id.clone());
                            }
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    fn load_listings(&self, filter: &ListingFilter) -> StorageResult<Vec<ListingRecord>> {
        let (clause, values) = filter.where_clause();
        let sql = format!("SELECT {} FROM listings{} ORDER BY rowid", LISTING_COLUMNS, clause);

        let mut stmt = self.conn.prepare(&sql)?;
        let listings = stmt
            .query_map(params_from_iter(values.iter()), listing_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(listings)
    }

    fn delete_listings(&mut self, filter: &ListingFilter) -> StorageResult<u64> {
        let (clause, values) = filter.where_clause();
        let sql = format!("DELETE FROM listings{}", clause);
        let deleted = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(deleted as u64)
    }

    fn count_listings(&self, filter: &ListingFilter) -> StorageResult<u64> {
        let (clause, values) = filter.where_clause();
        let sql = format!("SELECT COUNT(*) FROM listings{}", clause);
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
        Ok(count as u64)
    }

    fn distinct_station_names(&self) -> StorageResult<Vec<String>> {
        let query = "
            SELECT nearest_station FROM listings WHERE nearest_station IS NOT NULL
            UNION
            SELECT second_station FROM listings WHERE second_station IS NOT NULL
            ORDER BY 1
        ";

        let mut stmt = self.conn.prepare(query)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(names)
    }

    // ===== Station Mappings =====

    fn save_station_mappings(&mut self, mappings: &[StationMapping]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM station_mappings", [])?;
        for mapping in mappings {
            tx.execute(
                "INSERT OR REPLACE INTO station_mappings (station_name, matched_station, station_code)
                 VALUES (?1, ?2, ?3)",
                params![
                    mapping.station_name,
                    mapping.matched_station,
                    mapping.station_code
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_station_mappings(&self) -> StorageResult<Vec<StationMapping>> {
        let mut stmt = self.conn.prepare(
            "SELECT station_name, matched_station, station_code FROM station_mappings ORDER BY station_name",
        )?;
        let mappings = stmt
            .query_map([], |row| {
                Ok(StationMapping {
                    station_name: row.get(0)?,
                    matched_station: row.get(1)?,
                    station_code: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(mappings)
    }

    fn mapped_station_codes(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT station_code FROM station_mappings
             WHERE station_code IS NOT NULL ORDER BY station_code",
        )?;
        let codes = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(codes)
    }

    // ===== Travel Times =====

    fn upsert_travel_time(&mut self, travel_time: &TravelTime) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO travel_times (station_code, destination, duration_minutes, walk_minutes)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(station_code) DO UPDATE SET
                destination = excluded.destination,
                duration_minutes = excluded.duration_minutes,
                walk_minutes = excluded.walk_minutes",
            params![
                travel_time.station_code,
                travel_time.destination,
                travel_time.duration_minutes,
                travel_time.walk_minutes
            ],
        )?;
        Ok(())
    }

    fn load_travel_times(&self) -> StorageResult<Vec<TravelTime>> {
        let mut stmt = self.conn.prepare(
            "SELECT station_code, destination, duration_minutes, walk_minutes
             FROM travel_times ORDER BY station_code",
        )?;
        let travel_times = stmt
            .query_map([], |row| {
                Ok(TravelTime {
                    station_code: row.get(0)?,
                    destination: row.get(1)?,
                    duration_minutes: row.get(2)?,
                    walk_minutes: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(travel_times)
    }

    // ===== Scores =====

    fn save_scores(&mut self, scores: &[ScoreRecord]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM scores", [])?;
        for score in scores {
            tx.execute(
                "INSERT INTO scores (listing_id, price_score, comfort_score, transport_score, combined_score)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    score.listing_id,
                    score.price_score,
                    score.comfort_score,
                    score.transport_score,
                    score.combined_score
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_scores(&self) -> StorageResult<Vec<ScoreRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT listing_id, price_score, comfort_score, transport_score, combined_score
             FROM scores ORDER BY listing_id",
        )?;
        let scores = stmt
            .query_map([], |row| {
                Ok(ScoreRecord {
                    listing_id: row.get(0)?,
                    price_score: row.get(1)?,
                    comfort_score: row.get(2)?,
                    transport_score: row.get(3)?,
                    combined_score: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(scores)
    }

    // ===== Statistics =====

    fn price_stats_by_location(&self, filter: &ListingFilter) -> StorageResult<Vec<PriceStats>> {
        let (clause, values) = filter.where_clause();
        let sql = format!(
            "SELECT location, COUNT(*), MIN(price), MAX(price), AVG(price)
             FROM listings{}
             GROUP BY location
             ORDER BY location",
            clause
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let stats = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(PriceStats {
                    location: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                    min_price: row.get(2)?,
                    max_price: row.get(3)?,
                    mean_price: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stats)
    }

    fn price_stats_by_group(
        &self,
        filter: &ListingFilter,
    ) -> StorageResult<Vec<GroupPriceStats>> {
        let (clause, values) = filter.where_clause();
        let sql = format!(
            "SELECT location,
                CASE WHEN LOWER(property_type) IN ('apartment', 'flat') THEN '{}'
                     ELSE property_type END AS grouped_type,
                bedrooms, bathrooms, COUNT(*), MIN(price), MAX(price), AVG(price)
             FROM listings{}
             GROUP BY location, grouped_type, bedrooms, bathrooms
             ORDER BY location, grouped_type, bedrooms, bathrooms",
            APARTMENT_OR_FLAT, clause
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let stats = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok(GroupPriceStats {
                    location: row.get(0)?,
                    property_type: row.get(1)?,
                    bedrooms: RoomCount::from_db(row.get(2)?),
                    bathrooms: RoomCount::from_db(row.get(3)?),
                    count: row.get::<_, i64>(4)? as u64,
                    min_price: row.get(5)?,
                    max_price: row.get(6)?,
                    mean_price: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stats)
    }
}

fn insert_listing(conn: &Connection, listing: &ListingRecord) -> rusqlite::Result<()> {
    let (nearest, nearest_distance) = station_columns(listing.nearest_station.as_ref());
    let (second, second_distance) = station_columns(listing.second_station.as_ref());

    conn.execute(
        &format!(
            "INSERT INTO listings ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            LISTING_COLUMNS
        ),
        params![
            listing.id,
            listing.location,
            listing.property_type,
            listing.address,
            listing.rent,
            listing.price,
            listing.base,
            listing.bedrooms.to_db(),
            listing.bathrooms.to_db(),
            listing.description,
            listing.image_count,
            listing.link,
            nearest,
            nearest_distance,
            second,
            second_distance,
            listing.run_time.format(DATE_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

fn station_columns(station: Option<&NearbyStation>) -> (Option<&str>, Option<&str>) {
    match station {
        Some(station) => (Some(station.name.as_str()), Some(station.distance.as_str())),
        None => (None, None),
    }
}

fn station_from_columns(name: Option<String>, distance: Option<String>) -> Option<NearbyStation> {
    name.map(|name| NearbyStation::new(name, distance.unwrap_or_default()))
}

fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<ListingRecord> {
    let run_time: String = row.get(16)?;
    let run_time = NaiveDate::parse_from_str(&run_time, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(16, Type::Text, Box::new(e)))?;

    Ok(ListingRecord {
        id: row.get(0)?,
        location: row.get(1)?,
        property_type: row.get(2)?,
        address: row.get(3)?,
        rent: row.get(4)?,
        price: row.get(5)?,
        base: row.get(6)?,
        bedrooms: RoomCount::from_db(row.get(7)?),
        bathrooms: RoomCount::from_db(row.get(8)?),
        description: row.get(9)?,
        image_count: row.get(10)?,
        link: row.get(11)?,
        nearest_station: station_from_columns(row.get(12)?, row.get(13)?),
        second_station: station_from_columns(row.get(14)?, row.get(15)?),
        run_time,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        location: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Running),
        counts: RunCounts {
            pages_fetched: row.get(6)?,
            scraped: row.get(7)?,
            duplicates: row.get(8)?,
            found: row.get(9)?,
            inserted: row.get(10)?,
            failed: row.get(11)?,
            rejected: row.get(12)?,
        },
    })
}
