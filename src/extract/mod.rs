//! HTML extraction for search-results pages and detail panels
//!
//! This module contains:
//! - `FieldSelector`: the single-field primitive used by every extractor
//! - listing card extraction and result-count parsing for results pages
//! - station panel parsing for detail pages

mod detail;
mod field;
mod listing;

pub use detail::{parse_station_panel, CONSENT_BUTTON, STATIONS_PANEL, STATIONS_TAB};
pub use field::{first_number, FieldSelector};
pub use listing::{
    extract_listings, parse_price, parse_result_count, rent_base, ExtractedPage, PageRef,
    RejectedCard,
};

use thiserror::Error;

/// Reasons a listing card cannot produce a usable record
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("listing card has no rent text")]
    MissingRent,

    #[error("no price found in rent text '{0}'")]
    UnparsablePrice(String),

    #[error("price in rent text '{0}' is not positive")]
    NonPositivePrice(String),
}
