//! Detail-page station panel parsing

use crate::extract::field::FieldSelector;
use crate::model::NearbyStation;
use scraper::{Html, Selector};

/// CSS id selectors driven through the browser on a detail page
pub const CONSENT_BUTTON: &str = "#onetrust-accept-btn-handler";
pub const STATIONS_TAB: &str = "#Stations-button";
pub const STATIONS_PANEL: &str = "#Stations-panel";

const STATION_NAME: FieldSelector = FieldSelector::new("span", "cGDiWU3FlTjqSs-F1LwK4");
const STATION_DISTANCE: FieldSelector = FieldSelector::new("span", "_1ZY603T1ryTT3dMgGkM7Lg");

/// Parses every station entry of the rendered stations panel, in document order
///
/// Entries missing either a name or a distance are skipped. A page without
/// the panel yields an empty list.
pub fn parse_station_panel(html: &str) -> Vec<NearbyStation> {
    let document = Html::parse_document(html);
    let Ok(entries) = Selector::parse(&format!("div{} li", STATIONS_PANEL)) else {
        return Vec::new();
    };

    document
        .select(&entries)
        .filter_map(|entry| {
            let name = STATION_NAME.text(entry)?;
            let distance = STATION_DISTANCE.text(entry)?;
            Some(NearbyStation::new(name, distance))
        })
        .collect()
}
