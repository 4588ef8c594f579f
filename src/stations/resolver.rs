use crate::model::StationMapping;
use crate::stations::reference::{strip_mode_suffix, CanonicalStation, StationReference};
use rapidfuzz::fuzz;
use std::collections::HashSet;

/// Similarity (0-100) of two names with word order ignored
///
/// Both names are lowercased and their words sorted before comparing with
/// the indel ratio `2 * LCS / (len_a + len_b)`.
pub fn token_sort_similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (sorted_tokens(a), sorted_tokens(b));
    fuzz::ratio(a.chars(), b.chars()) * 100.0
}

fn sorted_tokens(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut tokens: Vec<&str> = lowered.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Fuzzy-matches free-text station names to canonical stations
pub struct StationResolver<'a> {
    reference: &'a StationReference,
    threshold: f64,
}

impl<'a> StationResolver<'a> {
    /// # Arguments
    ///
    /// * `reference` - Canonical stations to match against
    /// * `threshold` - Minimum similarity (0-100) a match needs to be accepted
    pub fn new(reference: &'a StationReference, threshold: f64) -> Self {
        Self {
            reference,
            threshold,
        }
    }

    /// Best-scoring canonical station for a name, regardless of threshold
    ///
    /// Ties keep the station listed first in the reference.
    pub fn best_match(&self, name: &str) -> Option<(&'a CanonicalStation, f64)> {
        let query = strip_mode_suffix(name);
        let mut best: Option<(&'a CanonicalStation, f64)> = None;

        for station in self.reference.stations() {
            let score = token_sort_similarity(query, &station.name);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((station, score));
            }
        }

        best
    }

    /// Resolves one name; below-threshold matches map to no station
    pub fn resolve_name(&self, name: &str) -> StationMapping {
        let accepted = self
            .best_match(name)
            .filter(|(_, score)| *score >= self.threshold);

        match accepted {
            Some((station, score)) => {
                tracing::debug!("Matched {} to {} ({:.1})", name, station.name, score);
                StationMapping {
                    station_name: name.to_string(),
                    matched_station: Some(station.name.clone()),
                    station_code: Some(station.code.clone()),
                }
            }
            None => {
                tracing::warn!("No canonical station for {}", name);
                StationMapping {
                    station_name: name.to_string(),
                    matched_station: None,
                    station_code: None,
                }
            }
        }
    }

    /// Resolves every distinct name, in first-seen order
    pub fn resolve<I, S>(&self, names: I) -> Vec<StationMapping>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        names
            .into_iter()
            .filter_map(|name| {
                let name: &str = name.as_ref();
                seen.insert(name.to_string())
                    .then(|| self.resolve_name(name))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> StationReference {
        StationReference::from_stations(vec![
            ("Bank Underground Station", "940GZZLUBNK"),
            ("Canary Wharf Underground Station", "940GZZLUCYF"),
            ("Canary Wharf DLR Station", "940GZZDLCAN"),
            ("Heron Quays DLR Station", "940GZZDLHEQ"),
            ("King's Cross St. Pancras Underground Station", "940GZZLUKSX"),
            ("Custom House DLR Station", "940GZZDLCUS"),
        ])
    }

    #[test]
    fn test_similarity_ignores_order_and_case() {
        assert_eq!(token_sort_similarity("Quays Heron", "heron quays"), 100.0);
        assert!(token_sort_similarity("Bank", "Barking") < 70.0);
    }

    #[test]
    fn test_similarity_is_indel_ratio() {
        // "custom excel for house" keeps all 12 characters of "custom house": 24 / 34
        let score = token_sort_similarity("Custom House for ExCeL", "Custom House");
        assert!((score - 2400.0 / 34.0).abs() < 1e-9, "{}", score);
        // LCS of "bank" and "barking" is 3: 6 / 11
        let score = token_sort_similarity("Bank", "Barking");
        assert!((score - 600.0 / 11.0).abs() < 1e-9, "{}", score);
    }

    #[test]
    fn test_borderline_name_resolves_at_threshold() {
        let reference = reference();
        let resolver = StationResolver::new(&reference, 70.0);

        let mapping = resolver.resolve_name("Custom House for ExCeL Station");
        assert_eq!(mapping.matched_station.as_deref(), Some("Custom House"));
        assert_eq!(mapping.station_code.as_deref(), Some("940GZZDLCUS"));

        let stricter = StationResolver::new(&reference, 71.0);
        assert_eq!(stricter.resolve_name("Custom House for ExCeL Station").station_code, None);
    }

    #[test]
    fn test_suffixed_name_resolves() {
        let reference = reference();
        let resolver = StationResolver::new(&reference, 70.0);

        let mapping = resolver.resolve_name("Bank Underground Station");
        assert_eq!(mapping.station_name, "Bank Underground Station");
        assert_eq!(mapping.matched_station.as_deref(), Some("Bank"));
        assert_eq!(mapping.station_code.as_deref(), Some("940GZZLUBNK"));
    }

    #[test]
    fn test_duplicate_canonical_name_keeps_first_code() {
        let reference = reference();
        let resolver = StationResolver::new(&reference, 70.0);

        let mapping = resolver.resolve_name("Canary Wharf Station");
        assert_eq!(mapping.station_code.as_deref(), Some("940GZZLUCYF"));
    }

    #[test]
    fn test_close_spelling_resolves() {
        let reference = reference();
        let resolver = StationResolver::new(&reference, 70.0);

        let mapping = resolver.resolve_name("Kings Cross St Pancras Station");
        assert_eq!(mapping.station_code.as_deref(), Some("940GZZLUKSX"));
    }

    #[test]
    fn test_no_plausible_match_is_null() {
        let reference = reference();
        let resolver = StationResolver::new(&reference, 70.0);

        let mapping = resolver.resolve_name("Zzyzx Road Halt");
        assert_eq!(mapping.matched_station, None);
        assert_eq!(mapping.station_code, None);
    }

    #[test]
    fn test_resolve_deduplicates_names() {
        let reference = reference();
        let resolver = StationResolver::new(&reference, 70.0);

        let mappings = resolver.resolve(["Bank Station", "Heron Quays Station", "Bank Station"]);
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[1].matched_station.as_deref(), Some("Heron Quays"));
    }

    #[test]
    fn test_empty_reference_matches_nothing() {
        let reference = StationReference::default();
        let resolver = StationResolver::new(&reference, 0.0);
        assert!(resolver.best_match("Bank").is_none());
        assert_eq!(resolver.resolve_name("Bank").station_code, None);
    }
}
