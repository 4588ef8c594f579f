use chrono::NaiveDate;
use std::fmt;

/// A bedroom or bathroom count as read from a listing card
///
/// `Missing` means the card carried no count at all and is default-filled to
/// one room when scoring. `Unknown` means a count was present but could not be
/// read; it never gets a default and makes dependent scores null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoomCount {
    #[default]
    Missing,
    Known(u32),
    Unknown,
}

impl RoomCount {
    /// Database sentinel for an unreadable count
    pub const UNKNOWN_SENTINEL: i64 = -1;

    /// Reads a count from optional card text
    pub fn parse(text: Option<&str>) -> Self {
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            return Self::Missing;
        };

        let digits: String = text
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();

        digits.parse().map(Self::Known).unwrap_or(Self::Unknown)
    }

    /// Count after default-filling: missing counts become 1, unknown stays unknown
    pub fn filled(&self) -> Option<u32> {
        match self {
            Self::Missing => Some(1),
            Self::Known(n) => Some(*n),
            Self::Unknown => None,
        }
    }

    pub fn to_db(&self) -> Option<i64> {
        match self {
            Self::Missing => None,
            Self::Known(n) => Some(i64::from(*n)),
            Self::Unknown => Some(Self::UNKNOWN_SENTINEL),
        }
    }

    pub fn from_db(value: Option<i64>) -> Self {
        match value {
            None => Self::Missing,
            Some(n) => u32::try_from(n).map(Self::Known).unwrap_or(Self::Unknown),
        }
    }
}

impl fmt::Display for RoomCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "-"),
            Self::Known(n) => write!(f, "{}", n),
            Self::Unknown => write!(f, "?"),
        }
    }
}

/// A station listed on a property's detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearbyStation {
    pub name: String,
    /// Distance as displayed, e.g. "0.3 miles"
    pub distance: String,
}

impl NearbyStation {
    pub fn new(name: impl Into<String>, distance: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            distance: distance.into(),
        }
    }

    /// Leading numeric part of the displayed distance, in miles
    pub fn distance_miles(&self) -> Option<f64> {
        let number: String = self
            .distance
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        number.parse().ok()
    }
}

/// One rental listing scraped from a search-results page
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    /// `{location_code}{page}|{position}|{run timestamp}`
    pub id: String,
    pub location: String,
    pub property_type: Option<String>,
    pub address: Option<String>,
    /// Rent exactly as displayed, e.g. "£1,850 pcm"
    pub rent: String,
    /// First run of digits in `rent`, thousands separators removed; always positive
    pub price: i64,
    /// Rent period suffix (last three characters of `rent`)
    pub base: String,
    pub bedrooms: RoomCount,
    pub bathrooms: RoomCount,
    pub description: Option<String>,
    pub image_count: Option<u32>,
    pub link: Option<String>,
    pub nearest_station: Option<NearbyStation>,
    pub second_station: Option<NearbyStation>,
    pub run_time: NaiveDate,
}

/// Fields that identify the same advertisement across pages
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey<'a> {
    pub location: &'a str,
    pub property_type: Option<&'a str>,
    pub address: Option<&'a str>,
    pub rent: &'a str,
    pub price: i64,
    pub base: &'a str,
    pub bedrooms: RoomCount,
    pub bathrooms: RoomCount,
    pub description: Option<&'a str>,
    pub link: Option<&'a str>,
}

impl ListingRecord {
    pub fn natural_key(&self) -> NaturalKey<'_> {
        NaturalKey {
            location: &self.location,
            property_type: self.property_type.as_deref(),
            address: self.address.as_deref(),
            rent: &self.rent,
            price: self.price,
            base: &self.base,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            description: self.description.as_deref(),
            link: self.link.as_deref(),
        }
    }

    /// Fills the nearest and second-nearest slots from stations in page order
    pub fn set_stations(&mut self, stations: Vec<NearbyStation>) {
        let mut stations = stations.into_iter();
        self.nearest_station = stations.next();
        self.second_station = stations.next();
    }
}
