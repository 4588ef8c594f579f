//! Domain records shared by the scraping, resolution and scoring stages
//!
//! - `ListingRecord`: one scraped advertisement (root entity)
//! - `StationMapping` / `TravelTime`: reference data keyed by station
//! - `ScoreRecord`: computed projection joined back to listings by id
//! - `RunContext`: the timestamp every stage of a run shares

mod listing;
mod run;

pub use listing::{ListingRecord, NaturalKey, NearbyStation, RoomCount};
pub use run::RunContext;

/// Resolution of one free-text station name to a canonical station
#[derive(Debug, Clone, PartialEq)]
pub struct StationMapping {
    /// Station name exactly as it appears on listings
    pub station_name: String,
    pub matched_station: Option<String>,
    pub station_code: Option<String>,
}

/// Best commute from one station to the hub destinations
#[derive(Debug, Clone, PartialEq)]
pub struct TravelTime {
    pub station_code: String,
    pub destination: String,
    /// Transit minutes, excluding the walk at the destination
    pub duration_minutes: f64,
    pub walk_minutes: f64,
}

impl TravelTime {
    pub fn total_minutes(&self) -> f64 {
        self.duration_minutes + self.walk_minutes
    }
}

/// Scores computed for one listing; `None` where inputs were unusable
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreRecord {
    pub listing_id: String,
    pub price_score: Option<f64>,
    pub comfort_score: Option<f64>,
    pub transport_score: Option<f64>,
    pub combined_score: Option<f64>,
}
