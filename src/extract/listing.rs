//! Search-results page extraction
//!
//! Turns the HTML of one results page into listing records. Missing card
//! fields become `None`; a card whose price cannot be read is rejected and
//! reported alongside the usable listings.

use crate::extract::field::FieldSelector;
use crate::extract::ExtractError;
use crate::model::{ListingRecord, RoomCount, RunContext};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::OnceLock;
use url::Url;

const CARD: FieldSelector = FieldSelector::new(
    "div",
    "PropertyCard_propertyCardContainerWrapper__mcK1Z propertyCard-details",
);
const PROPERTY_TYPE: FieldSelector =
    FieldSelector::new("span", "PropertyInformation_propertyType__u8e76");
const RENT: FieldSelector = FieldSelector::new("div", "PropertyPrice_price__VL65t");
const ADDRESS: FieldSelector = FieldSelector::new("address", "PropertyAddress_address__LYRPq");
const BEDROOMS: FieldSelector =
    FieldSelector::new("span", "PropertyInformation_bedroomsCount___2b5R");
const BATHROOMS: FieldSelector =
    FieldSelector::new("div", "PropertyInformation_bathContainer__ut8VY").nested("span");
const DESCRIPTION: FieldSelector = FieldSelector::new("p", "PropertyCardSummary_summary__oIv57");
const IMAGE_COUNT: FieldSelector =
    FieldSelector::new("span", "PropertyDetailsLozenge_imageCount___OS_A").nested("img");
const LINK: FieldSelector = FieldSelector::new("a", "propertyCard-link");
const RESULTS_COUNT: FieldSelector =
    FieldSelector::new("div", "ResultsCount_resultsCount__Kqeah").nested("span");

/// Identifies the page being extracted
#[derive(Debug, Clone, Copy)]
pub struct PageRef<'a> {
    /// Location identifier stored on every listing
    pub location: &'a str,
    /// Short code used as the listing id prefix
    pub location_code: &'a str,
    /// 0-based page index
    pub page_index: u32,
}

/// A card that could not be turned into a usable listing
#[derive(Debug)]
pub struct RejectedCard {
    pub id: String,
    pub reason: ExtractError,
}

/// Listings extracted from one results page, in card order
#[derive(Debug, Default)]
pub struct ExtractedPage {
    pub listings: Vec<ListingRecord>,
    pub rejected: Vec<RejectedCard>,
}

impl ExtractedPage {
    /// Number of cards seen on the page
    pub fn card_count(&self) -> usize {
        self.listings.len() + self.rejected.len()
    }
}

/// Extracts every listing card from a search-results page
///
/// Cards are numbered from 1 in document order; rejected cards keep their
/// position so ids of the remaining listings do not shift.
///
/// # Example
///
/// ```no_run
/// use lettings_lens::extract::{extract_listings, PageRef};
/// use lettings_lens::model::RunContext;
/// use url::Url;
///
/// let html = std::fs::read_to_string("page.html").unwrap();
/// let origin = Url::parse("https://www.rightmove.co.uk").unwrap();
/// let page = PageRef { location: "E14", location_code: "5E749", page_index: 0 };
/// let extracted = extract_listings(&html, page, &origin, &RunContext::now());
/// println!("{} listings", extracted.listings.len());
/// ```
pub fn extract_listings(
    html: &str,
    page: PageRef<'_>,
    site_origin: &Url,
    ctx: &RunContext,
) -> ExtractedPage {
    let document = Html::parse_document(html);
    let mut extracted = ExtractedPage::default();

    let Some(card_selector) = CARD.selector() else {
        return extracted;
    };

    for (offset, card) in document.select(&card_selector).enumerate() {
        let id = ctx.listing_id(page.location_code, page.page_index, offset + 1);
        match extract_card(card, &id, page.location, site_origin, ctx) {
            Ok(listing) => extracted.listings.push(listing),
            Err(reason) => {
                tracing::warn!("Skipping listing {}: {}", id, reason);
                extracted.rejected.push(RejectedCard { id, reason });
            }
        }
    }

    extracted
}

fn extract_card(
    card: ElementRef<'_>,
    id: &str,
    location: &str,
    site_origin: &Url,
    ctx: &RunContext,
) -> Result<ListingRecord, ExtractError> {
    let rent = RENT.text(card).ok_or(ExtractError::MissingRent)?;
    let price = parse_price(&rent)?;

    Ok(ListingRecord {
        id: id.to_string(),
        location: location.to_string(),
        property_type: PROPERTY_TYPE.text(card),
        address: ADDRESS.text(card),
        base: rent_base(&rent),
        rent,
        price,
        bedrooms: RoomCount::parse(BEDROOMS.text(card).as_deref()),
        bathrooms: RoomCount::parse(BATHROOMS.text(card).as_deref()),
        description: DESCRIPTION.text(card),
        image_count: IMAGE_COUNT.label_count(card),
        link: LINK
            .href(card)
            .and_then(|href| resolve_link(site_origin, &href)),
        nearest_station: None,
        second_station: None,
        run_time: ctx.run_date(),
    })
}

fn price_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d[\d,]*").expect("static pattern is valid"))
}

/// Parses the first run of digits in the rent text, ignoring thousands separators
pub fn parse_price(rent: &str) -> Result<i64, ExtractError> {
    let digits = price_pattern()
        .find(rent)
        .map(|m| m.as_str().replace(',', ""))
        .ok_or_else(|| ExtractError::UnparsablePrice(rent.to_string()))?;

    let price: i64 = digits
        .parse()
        .map_err(|_| ExtractError::UnparsablePrice(rent.to_string()))?;

    if price <= 0 {
        return Err(ExtractError::NonPositivePrice(rent.to_string()));
    }

    Ok(price)
}

/// Rent period suffix: the last three characters of the rent text
pub fn rent_base(rent: &str) -> String {
    let chars: Vec<char> = rent.chars().collect();
    let start = chars.len().saturating_sub(3);
    chars[start..].iter().collect()
}

/// Makes a relative detail-page link absolute against the site origin
fn resolve_link(site_origin: &Url, href: &str) -> Option<String> {
    if href.is_empty() {
        return None;
    }
    site_origin.join(href).ok().map(|url| url.to_string())
}

/// Reads the total number of results from the results-count label
pub fn parse_result_count(html: &str) -> Option<u64> {
    let document = Html::parse_document(html);
    let text = RESULTS_COUNT.text(document.root_element())?;
    text.replace(',', "").trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> RunContext {
        RunContext::new(
            NaiveDate::from_ymd_opt(2025, 7, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        )
    }

    fn origin() -> Url {
        Url::parse("https://www.rightmove.co.uk").unwrap()
    }

    fn page() -> PageRef<'static> {
        PageRef {
            location: "E14",
            location_code: "5E749",
            page_index: 1,
        }
    }

    fn card(rent: &str, beds: Option<&str>, baths: Option<&str>) -> String {
        let beds = beds
            .map(|b| format!(r#"<span class="PropertyInformation_bedroomsCount___2b5R">{}</span>"#, b))
            .unwrap_or_default();
        let baths = baths
            .map(|b| {
                format!(
                    r#"<div class="PropertyInformation_bathContainer__ut8VY"><span>{}</span></div>"#,
                    b
                )
            })
            .unwrap_or_default();
        format!(
            r#"<div class="PropertyCard_propertyCardContainerWrapper__mcK1Z propertyCard-details">
                <a class="propertyCard-link" href="/properties/1001#/?channel=RES_LET">
                    <span class="PropertyInformation_propertyType__u8e76">Flat</span>
                    {beds}{baths}
                    <address class="PropertyAddress_address__LYRPq">Westferry Road, E14</address>
                    <p class="PropertyCardSummary_summary__oIv57">Bright flat near the river</p>
                </a>
                <span class="PropertyDetailsLozenge_imageCount___OS_A"><img aria-label="9 images"></span>
                <div class="PropertyPrice_price__VL65t">{rent}</div>
            </div>"#
        )
    }

    #[test]
    fn test_extract_full_card() {
        let html = format!("<html><body>{}</body></html>", card("£1,850 pcm", Some("2"), Some("1")));
        let extracted = extract_listings(&html, page(), &origin(), &ctx());

        assert_eq!(extracted.listings.len(), 1);
        let listing = &extracted.listings[0];
        assert_eq!(listing.id, "5E7492|1|2025-07-10|09:00:00.000000");
        assert_eq!(listing.location, "E14");
        assert_eq!(listing.property_type.as_deref(), Some("Flat"));
        assert_eq!(listing.address.as_deref(), Some("Westferry Road, E14"));
        assert_eq!(listing.price, 1850);
        assert_eq!(listing.base, "pcm");
        assert_eq!(listing.bedrooms, RoomCount::Known(2));
        assert_eq!(listing.bathrooms, RoomCount::Known(1));
        assert_eq!(listing.image_count, Some(9));
        assert_eq!(
            listing.link.as_deref(),
            Some("https://www.rightmove.co.uk/properties/1001#/?channel=RES_LET")
        );
        assert!(listing.nearest_station.is_none());
    }

    #[test]
    fn test_missing_fields_are_none() {
        let html = format!("<html><body>{}</body></html>", card("£950 pw", None, None));
        let extracted = extract_listings(&html, page(), &origin(), &ctx());
        let listing = &extracted.listings[0];

        assert_eq!(listing.bedrooms, RoomCount::Missing);
        assert_eq!(listing.bathrooms, RoomCount::Missing);
        assert_eq!(listing.base, " pw");
    }

    #[test]
    fn test_unparsable_price_rejects_card_but_keeps_positions() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            card("POA", Some("1"), Some("1")),
            card("£1,200 pcm", Some("1"), Some("1"))
        );
        let extracted = extract_listings(&html, page(), &origin(), &ctx());

        assert_eq!(extracted.card_count(), 2);
        assert_eq!(extracted.rejected.len(), 1);
        assert!(extracted.rejected[0].id.starts_with("5E7492|1|"));
        assert!(matches!(extracted.rejected[0].reason, ExtractError::UnparsablePrice(_)));
        assert!(extracted.listings[0].id.starts_with("5E7492|2|"));
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("£1,850 pcm").unwrap(), 1850);
        assert_eq!(parse_price("£12,000,000 pcm").unwrap(), 12_000_000);
        assert_eq!(parse_price("From £425 pw").unwrap(), 425);
        assert!(matches!(parse_price("£0 pcm"), Err(ExtractError::NonPositivePrice(_))));
        assert!(parse_price("Price on application").is_err());
    }

    #[test]
    fn test_rent_base_short_text() {
        assert_eq!(rent_base("£5"), "£5");
        assert_eq!(rent_base("£1,000 pcm"), "pcm");
    }

    #[test]
    fn test_parse_result_count() {
        let html = r#"<div class="ResultsCount_resultsCount__Kqeah"><p><span>1,034</span> results</p></div>"#;
        assert_eq!(parse_result_count(html), Some(1034));
        assert_eq!(parse_result_count("<div>no count</div>"), None);
    }

    #[test]
    fn test_page_without_cards() {
        let extracted = extract_listings("<html></html>", page(), &origin(), &ctx());
        assert_eq!(extracted.card_count(), 0);
    }
}
