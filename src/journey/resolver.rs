use crate::config::{DestinationEntry, JourneyConfig};
use crate::journey::JourneyPlanner;
use crate::model::TravelTime;

/// Best commute found for one station
#[derive(Debug, Clone, PartialEq)]
pub struct StationCommute {
    pub travel_time: TravelTime,
    /// Destination queries that failed and were charged the penalty
    pub failed_queries: usize,
    pub queries: usize,
}

impl StationCommute {
    /// Whether at least one destination answered
    pub fn has_journey_data(&self) -> bool {
        self.failed_queries < self.queries
    }
}

/// Picks the best hub destination for each station
///
/// Every destination is queried; total cost is transit minutes plus the
/// destination's walking offset. A failed query costs the configured penalty
/// instead of failing the station.
pub struct TravelTimeResolver<P> {
    planner: P,
    destinations: Vec<DestinationEntry>,
    error_penalty_minutes: f64,
}

impl<P: JourneyPlanner> TravelTimeResolver<P> {
    pub fn new(planner: P, config: &JourneyConfig) -> Self {
        Self {
            planner,
            destinations: config.destinations.clone(),
            error_penalty_minutes: config.error_penalty_minutes,
        }
    }

    /// Best destination for one station
    ///
    /// When every query fails the first destination wins at the penalty
    /// cost, so the station still gets a travel time.
    ///
    /// # Returns
    ///
    /// * `Some(StationCommute)` - Lowest total cost, with the walk split out
    /// * `None` - No destinations are configured
    pub async fn best_for_station(&self, station_code: &str) -> Option<StationCommute> {
        let mut best: Option<(&DestinationEntry, f64)> = None;
        let mut failures = 0;

        for destination in &self.destinations {
            let total = match self
                .planner
                .journey_minutes(station_code, &destination.code)
                .await
            {
                Ok(minutes) => minutes + destination.walk_minutes,
                Err(e) => {
                    tracing::warn!(
                        "Journey {} -> {} failed, using penalty: {}",
                        station_code,
                        destination.name,
                        e
                    );
                    failures += 1;
                    self.error_penalty_minutes
                }
            };

            if best.map_or(true, |(_, best_total)| total < best_total) {
                best = Some((destination, total));
            }
        }

        if failures == self.destinations.len() && failures > 0 {
            tracing::warn!("No journey data for station {}, recording penalty", station_code);
        }

        best.map(|(destination, total)| StationCommute {
            travel_time: TravelTime {
                station_code: station_code.to_string(),
                destination: destination.name.clone(),
                duration_minutes: total - destination.walk_minutes,
                walk_minutes: destination.walk_minutes,
            },
            failed_queries: failures,
            queries: self.destinations.len(),
        })
    }
}
