//! Commute times from stations to central hub destinations

mod client;
mod resolver;

pub use client::{JourneyError, JourneyPlanner, TflJourneyClient};
pub use resolver::{StationCommute, TravelTimeResolver};

use crate::storage::Storage;
use crate::LensError;

/// Counts from one travel-time pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TravelTimeSummary {
    pub stations: usize,
    /// Stations with at least one answered journey query
    pub resolved: usize,
    /// Stations where every query failed and the penalty was stored
    pub penalized: usize,
}

/// Looks up the best commute for every mapped station code
///
/// Every station's travel time is overwritten on each pass, including
/// stations whose queries all failed; those store the penalty cost.
pub async fn resolve_travel_times<S, P>(
    storage: &mut S,
    resolver: &TravelTimeResolver<P>,
) -> Result<TravelTimeSummary, LensError>
where
    S: Storage,
    P: JourneyPlanner,
{
    let codes = storage.mapped_station_codes()?;
    let mut summary = TravelTimeSummary {
        stations: codes.len(),
        ..TravelTimeSummary::default()
    };

    for code in &codes {
        let Some(commute) = resolver.best_for_station(code).await else {
            continue;
        };
        let travel_time = &commute.travel_time;
        tracing::debug!(
            "{}: {} in {:.0} min (+{:.0} walk)",
            code,
            travel_time.destination,
            travel_time.duration_minutes,
            travel_time.walk_minutes
        );
        storage.upsert_travel_time(travel_time)?;

        if commute.has_journey_data() {
            summary.resolved += 1;
        } else {
            summary.penalized += 1;
        }
    }

    tracing::info!(
        "Resolved travel times for {} of {} stations ({} at penalty cost)",
        summary.resolved,
        summary.stations,
        summary.penalized
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JourneyConfig;
    use crate::model::{StationMapping, TravelTime};
    use crate::storage::SqliteStorage;
    use async_trait::async_trait;

    /// Planner whose every query fails
    struct UnavailablePlanner;

    #[async_trait]
    impl JourneyPlanner for UnavailablePlanner {
        async fn journey_minutes(&self, from: &str, to: &str) -> Result<f64, JourneyError> {
            Err(JourneyError::Status {
                url: format!("{}/to/{}", from, to),
                status: 503,
            })
        }
    }

    /// Planner answering 15 minutes to every destination
    struct FixedPlanner;

    #[async_trait]
    impl JourneyPlanner for FixedPlanner {
        async fn journey_minutes(&self, _from: &str, _to: &str) -> Result<f64, JourneyError> {
            Ok(15.0)
        }
    }

    fn storage_with_mapping(code: &str) -> SqliteStorage {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .save_station_mappings(&[StationMapping {
                station_name: "Bank Station".to_string(),
                matched_station: Some("Bank".to_string()),
                station_code: Some(code.to_string()),
            }])
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn test_failed_station_overwrites_previous_row() {
        let mut storage = storage_with_mapping("940GZZLUBNK");
        storage
            .upsert_travel_time(&TravelTime {
                station_code: "940GZZLUBNK".to_string(),
                destination: "Aldgate".to_string(),
                duration_minutes: 3.0,
                walk_minutes: 5.0,
            })
            .unwrap();

        let resolver = TravelTimeResolver::new(UnavailablePlanner, &JourneyConfig::default());
        let summary = resolve_travel_times(&mut storage, &resolver).await.unwrap();

        assert_eq!(
            summary,
            TravelTimeSummary {
                stations: 1,
                resolved: 0,
                penalized: 1,
            }
        );

        let rows = storage.load_travel_times().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].destination, "Bank");
        assert_eq!(rows[0].duration_minutes, 51.0);
        assert_eq!(rows[0].walk_minutes, 9.0);
    }

    #[tokio::test]
    async fn test_resolved_station_is_upserted_once() {
        let mut storage = storage_with_mapping("940GZZDLHEQ");
        let resolver = TravelTimeResolver::new(FixedPlanner, &JourneyConfig::default());

        resolve_travel_times(&mut storage, &resolver).await.unwrap();
        let summary = resolve_travel_times(&mut storage, &resolver).await.unwrap();
        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.penalized, 0);

        // Aldgate has the shortest walk (5 minutes)
        let rows = storage.load_travel_times().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].destination, "Aldgate");
        assert_eq!(rows[0].total_minutes(), 20.0);
    }
}
