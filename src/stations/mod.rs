//! Station resolution
//!
//! Listing pages name stations inconsistently ("Canary Wharf Station",
//! "Bank Underground Station"), so each distinct name is fuzzy-matched to a
//! canonical station before it can be joined to journey data.

mod reference;
mod resolver;

pub use reference::{strip_mode_suffix, CanonicalStation, StationReference};
pub use resolver::{token_sort_similarity, StationResolver};

use crate::config::StationsConfig;
use crate::storage::Storage;
use crate::LensError;
use std::path::Path;

/// Counts from one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub names: usize,
    pub matched: usize,
}

/// Resolves every station name seen on stored listings and replaces the mappings
///
/// # Arguments
///
/// * `storage` - Storage holding the listings; receives the new mappings
/// * `config` - Reference table location and match threshold
pub fn resolve_stations<S: Storage>(
    storage: &mut S,
    config: &StationsConfig,
) -> Result<ResolutionSummary, LensError> {
    let reference = StationReference::load(Path::new(&config.reference_path))?;
    resolve_with_reference(storage, &reference, config.match_threshold)
}

/// Same as [`resolve_stations`] with an already loaded reference
pub fn resolve_with_reference<S: Storage>(
    storage: &mut S,
    reference: &StationReference,
    threshold: f64,
) -> Result<ResolutionSummary, LensError> {
    let names = storage.distinct_station_names()?;
    let resolver = StationResolver::new(reference, threshold);
    let mappings = resolver.resolve(&names);

    let summary = ResolutionSummary {
        names: mappings.len(),
        matched: mappings.iter().filter(|m| m.station_code.is_some()).count(),
    };

    storage.save_station_mappings(&mappings)?;
    tracing::info!(
        "Resolved {} of {} station names",
        summary.matched,
        summary.names
    );

    Ok(summary)
}
