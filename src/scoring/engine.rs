//! Price, comfort, transport and combined scores
//!
//! Bedroom and bathroom counts missing from a card are filled with 1 before
//! scoring. A count that was present but unreadable is never filled, and every
//! score depending on it is `None`.

use crate::config::ScoringConfig;
use crate::model::{ListingRecord, RoomCount, ScoreRecord, StationMapping, TravelTime};
use crate::scoring::normalize::tanh_normalize;
use std::collections::HashMap;

/// Minutes charged per mile between a property and its nearest station
pub const MINUTES_PER_MILE: f64 = 20.0;

/// Bathrooms counted as shared amenities; beyond the first, one is taken as en-suite
fn shared_bathrooms(bathrooms: u32) -> u32 {
    if bathrooms == 1 {
        1
    } else {
        bathrooms.saturating_sub(1)
    }
}

/// Raw price score: `(bedrooms + shared_bathrooms / 3) / price`
pub fn raw_price_score(price: i64, bedrooms: RoomCount, bathrooms: RoomCount) -> Option<f64> {
    if price <= 0 {
        return None;
    }
    let bedrooms = bedrooms.filled()?;
    let bathrooms = bathrooms.filled()?;

    Some((f64::from(bedrooms) + f64::from(shared_bathrooms(bathrooms)) / 3.0) / price as f64)
}

/// Comfort score in [0, 10]: shared bathrooms per bedroom, times ten, capped
///
/// A listing with zero bedrooms is scored as a single-room studio.
pub fn comfort_score(bedrooms: RoomCount, bathrooms: RoomCount) -> Option<f64> {
    let bedrooms = bedrooms.filled()?.max(1);
    let bathrooms = bathrooms.filled()?;

    let ratio = f64::from(shared_bathrooms(bathrooms)) / f64::from(bedrooms);
    Some((ratio * 10.0).min(10.0))
}

/// Step score of total commute minutes; `missing` when there is no commute
pub fn transport_score(commute_minutes: Option<f64>, missing: f64) -> f64 {
    match commute_minutes {
        None => missing,
        Some(m) if m <= 20.0 => 10.0,
        Some(m) if m <= 30.0 => 8.0,
        Some(m) if m <= 45.0 => 6.0,
        Some(m) if m <= 60.0 => 3.5,
        Some(_) => 1.5,
    }
}

/// `price * comfort * transport / 100`, or `None` if any part is missing
pub fn combined_score(price: Option<f64>, comfort: Option<f64>, transport: Option<f64>) -> Option<f64> {
    Some(price? * comfort? * transport? / 100.0)
}

/// Joins listings to commute data through their nearest station
pub struct CommuteIndex<'a> {
    codes: HashMap<&'a str, &'a str>,
    travel_times: HashMap<&'a str, &'a TravelTime>,
}

impl<'a> CommuteIndex<'a> {
    pub fn new(mappings: &'a [StationMapping], travel_times: &'a [TravelTime]) -> Self {
        let codes = mappings
            .iter()
            .filter_map(|m| Some((m.station_name.as_str(), m.station_code.as_deref()?)))
            .collect();
        let travel_times = travel_times
            .iter()
            .map(|t| (t.station_code.as_str(), t))
            .collect();

        Self {
            codes,
            travel_times,
        }
    }

    /// Walk to the nearest station plus the best transit journey and final walk
    pub fn commute_minutes(&self, listing: &ListingRecord) -> Option<f64> {
        let station = listing.nearest_station.as_ref()?;
        let miles = station.distance_miles()?;
        let code = self.codes.get(station.name.as_str())?;
        let travel = self.travel_times.get(code)?;

        Some(miles * MINUTES_PER_MILE + travel.duration_minutes + travel.walk_minutes)
    }
}

/// Computes every score for a listing population
pub struct ScoringEngine {
    missing_transport_score: f64,
}

impl ScoringEngine {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            missing_transport_score: config.missing_transport_score,
        }
    }

    /// Scores all listings together
    ///
    /// Price scores are normalised against this population, so the result
    /// changes whenever the set of listings does.
    pub fn score(&self, listings: &[ListingRecord], commutes: &CommuteIndex<'_>) -> Vec<ScoreRecord> {
        let raw_prices: Vec<Option<f64>> = listings
            .iter()
            .map(|l| raw_price_score(l.price, l.bedrooms, l.bathrooms))
            .collect();
        let price_scores = tanh_normalize(&raw_prices);

        listings
            .iter()
            .zip(price_scores)
            .map(|(listing, price_score)| {
                let comfort_score = comfort_score(listing.bedrooms, listing.bathrooms);
                let transport_score = Some(transport_score(
                    commutes.commute_minutes(listing),
                    self.missing_transport_score,
                ));

                ScoreRecord {
                    listing_id: listing.id.clone(),
                    price_score,
                    comfort_score,
                    transport_score,
                    combined_score: combined_score(price_score, comfort_score, transport_score),
                }
            })
            .collect()
    }
}
