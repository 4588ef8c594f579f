//! Listing scores
//!
//! - Price: bedrooms and shared bathrooms per unit of rent, tanh-normalised
//!   against the scored population
//! - Comfort: shared bathrooms per bedroom, bounded to [0, 10]
//! - Transport: step function of total commute minutes
//! - Combined: product of the three, scaled down by 100

mod engine;
mod normalize;

pub use engine::{
    combined_score, comfort_score, raw_price_score, transport_score, CommuteIndex, ScoringEngine,
    MINUTES_PER_MILE,
};
pub use normalize::{tanh_normalize, Population, NEUTRAL_SCORE};

use crate::config::ScoringConfig;
use crate::storage::{ListingFilter, Storage};
use crate::LensError;

/// Counts from one scoring pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringSummary {
    pub listings: usize,
    /// Listings whose combined score could not be computed
    pub unscored: usize,
}

/// Recomputes scores for every stored listing and replaces the stored scores
pub fn score_listings<S: Storage>(
    storage: &mut S,
    config: &ScoringConfig,
) -> Result<ScoringSummary, LensError> {
    let listings = storage.load_listings(&ListingFilter::default())?;
    let mappings = storage.load_station_mappings()?;
    let travel_times = storage.load_travel_times()?;

    let commutes = CommuteIndex::new(&mappings, &travel_times);
    let scores = ScoringEngine::new(config).score(&listings, &commutes);

    let summary = ScoringSummary {
        listings: scores.len(),
        unscored: scores.iter().filter(|s| s.combined_score.is_none()).count(),
    };
    if summary.unscored > 0 {
        tracing::warn!("{} listings have no combined score", summary.unscored);
    }

    storage.save_scores(&scores)?;
    tracing::info!("Scored {} listings", summary.listings);

    Ok(summary)
}
