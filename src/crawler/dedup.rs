use crate::model::ListingRecord;
use std::collections::HashSet;

/// Listings left after collapsing natural-key duplicates
#[derive(Debug)]
pub struct Deduplicated {
    pub listings: Vec<ListingRecord>,
    pub duplicates: usize,
}

/// Keeps the first listing of every natural key, preserving order
pub fn deduplicate(listings: Vec<ListingRecord>) -> Deduplicated {
    let mut seen = HashSet::with_capacity(listings.len());
    let keep: Vec<bool> = listings
        .iter()
        .map(|listing| seen.insert(listing.natural_key()))
        .collect();
    drop(seen);

    let duplicates = keep.iter().filter(|kept| !**kept).count();
    let listings = listings
        .into_iter()
        .zip(keep)
        .filter_map(|(listing, kept)| kept.then_some(listing))
        .collect();

    Deduplicated {
        listings,
        duplicates,
    }
}
