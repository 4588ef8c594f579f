//! Canonical station reference table
//!
//! Loaded from a CSV export of the NaPTAN station list. Column names vary
//! between exports, so both the camelCase and snake_case spellings are read.

use crate::LensError;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Mode-of-transport suffixes removed before names are compared, longest first
const MODE_SUFFIXES: [&str; 4] = [" Underground Station", " DLR Station", " Tram Stop", " Station"];

/// A canonical station name with its code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalStation {
    /// Name with the mode suffix removed
    pub name: String,
    pub code: String,
}

/// The set of canonical stations fuzzy matches are resolved against
#[derive(Debug, Clone, Default)]
pub struct StationReference {
    stations: Vec<CanonicalStation>,
}

#[derive(Debug, Deserialize)]
struct ReferenceRow {
    #[serde(alias = "commonName", alias = "name")]
    common_name: String,
    #[serde(
        alias = "stationNaptan",
        alias = "naptanID",
        alias = "naptan_id",
        alias = "station_code",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    code: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

impl StationReference {
    /// Builds a reference from (name, code) pairs
    ///
    /// Names are suffix-stripped; when two stations strip to the same name
    /// the first one wins.
    pub fn from_stations<I, N, C>(stations: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: AsRef<str>,
        C: Into<String>,
    {
        let mut seen = HashSet::new();
        let stations = stations
            .into_iter()
            .filter_map(|(name, code)| {
                let name = strip_mode_suffix(name.as_ref()).to_string();
                if name.is_empty() || !seen.insert(name.clone()) {
                    return None;
                }
                Some(CanonicalStation {
                    name,
                    code: code.into(),
                })
            })
            .collect();

        Self { stations }
    }

    /// Parses reference rows from CSV; rows without a code are skipped
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut pairs = Vec::new();
        for record in csv_reader.deserialize::<ReferenceRow>() {
            let row = record?;
            match row.code {
                Some(code) => pairs.push((row.common_name, code)),
                None => tracing::debug!("Skipping reference station {} without a code", row.common_name),
            }
        }

        Ok(Self::from_stations(pairs))
    }

    /// Loads the reference CSV from disk
    pub fn load(path: &Path) -> Result<Self, LensError> {
        let file = File::open(path).map_err(|e| {
            LensError::StationReference(format!("cannot open {}: {}", path.display(), e))
        })?;
        let reference = Self::from_reader(file)?;

        if reference.is_empty() {
            return Err(LensError::StationReference(format!(
                "{} contains no usable stations",
                path.display()
            )));
        }

        tracing::info!("Loaded {} canonical stations from {}", reference.len(), path.display());
        Ok(reference)
    }

    pub fn stations(&self) -> &[CanonicalStation] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// Removes one trailing mode-of-transport suffix, e.g. " Underground Station"
pub fn strip_mode_suffix(name: &str) -> &str {
    let name = name.trim();
    MODE_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .map(str::trim_end)
        .unwrap_or(name)
}
