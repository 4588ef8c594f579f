//! Integration tests for the listing pipeline
//!
//! These tests use wiremock to stand in for the search site and the journey
//! service, and a scripted browser for listing detail pages, to run scrape,
//! station resolution, travel times and scoring end-to-end.

use async_trait::async_trait;
use chrono::NaiveDate;
use lettings_lens::browser::{BrowserResult, BrowserSession};
use lettings_lens::config::{
    BrowserConfig, Config, DestinationEntry, JourneyConfig, LocationEntry, OutputConfig,
    ScoringConfig, ScraperConfig, StationsConfig,
};
use lettings_lens::crawler::{crawl_with, Coordinator};
use lettings_lens::journey::{resolve_travel_times, TflJourneyClient, TravelTimeResolver};
use lettings_lens::model::RunContext;
use lettings_lens::scoring::score_listings;
use lettings_lens::stations::resolve_stations;
use lettings_lens::storage::{ListingFilter, RunStatus, SqliteStorage, Storage};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATIONS_PANEL: &str = r#"<html><body><div id="Stations-panel"><ul>
    <li><span class="cGDiWU3FlTjqSs-F1LwK4">Heron Quays Station</span><span class="_1ZY603T1ryTT3dMgGkM7Lg">0.5 miles</span></li>
    <li><span class="cGDiWU3FlTjqSs-F1LwK4">Canary Wharf Station</span><span class="_1ZY603T1ryTT3dMgGkM7Lg">0.7 miles</span></li>
</ul></div></body></html>"#;

/// Browser that shows the same stations panel on every detail page
#[derive(Default)]
struct StationsBrowser {
    visited: Vec<String>,
}

#[async_trait]
impl BrowserSession for StationsBrowser {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.visited.push(url.to_string());
        Ok(())
    }

    async fn is_present(&mut self, _selector: &str) -> BrowserResult<bool> {
        Ok(false)
    }

    async fn find_and_click(&mut self, _selector: &str, _timeout: Duration) -> BrowserResult<()> {
        Ok(())
    }

    async fn wait_for(&mut self, _selector: &str, _timeout: Duration) -> BrowserResult<()> {
        Ok(())
    }

    async fn parse_current_document(&mut self) -> BrowserResult<String> {
        Ok(STATIONS_PANEL.to_string())
    }

    async fn close(&mut self) -> BrowserResult<()> {
        Ok(())
    }
}

/// Creates a test configuration pointing at the mock servers
fn create_test_config(site: &MockServer, journeys: &MockServer, reference_path: &str) -> Config {
    Config {
        scraper: ScraperConfig {
            site_origin: site.uri(),
            search_url_template: format!("{}/find?loc={{location_code}}&index={{index}}", site.uri()),
            user_agent: "TestBot/1.0".to_string(),
            max_pages: 42,
            request_timeout_secs: 5,
            minimum_request_interval_ms: 0,
        },
        browser: BrowserConfig {
            wait_timeout_ms: 10,
            max_attempts: 1,
            retry_delay_ms: 0,
            ..BrowserConfig::default()
        },
        stations: StationsConfig {
            reference_path: reference_path.to_string(),
            match_threshold: 70.0,
        },
        journey: JourneyConfig {
            base_url: journeys.uri(),
            destinations: vec![DestinationEntry {
                name: "Bank".to_string(),
                code: "940GZZLUBNK".to_string(),
                walk_minutes: 9.0,
            }],
            ..JourneyConfig::default()
        },
        scoring: ScoringConfig::default(),
        output: OutputConfig {
            database_path: ":memory:".to_string(),
        },
        locations: vec![LocationEntry {
            name: "E14".to_string(),
            code: "5E749".to_string(),
        }],
    }
}

/// One search-results card; `n` makes the address, link and price unique
fn card(n: u32, rent: &str) -> String {
    format!(
        r#"<div class="PropertyCard_propertyCardContainerWrapper__mcK1Z propertyCard-details">
            <a class="propertyCard-link" href="/properties/{n}#/?channel=RES_LET">
                <span class="PropertyInformation_propertyType__u8e76">Flat</span>
                <span class="PropertyInformation_bedroomsCount___2b5R">2</span>
                <div class="PropertyInformation_bathContainer__ut8VY"><span>1</span></div>
                <address class="PropertyAddress_address__LYRPq">{n} Westferry Road, E14</address>
            </a>
            <div class="PropertyPrice_price__VL65t">{rent}</div>
        </div>"#,
        n = n,
        rent = rent
    )
}

fn priced_card(n: u32) -> String {
    card(n, &format!("£{} pcm", 1500 + n * 25))
}

fn results_page(count: u64, cards: &[String]) -> String {
    format!(
        r#"<html><body>
            <div class="ResultsCount_resultsCount__Kqeah"><p><span>{}</span> results</p></div>
            {}
        </body></html>"#,
        count,
        cards.join("\n")
    )
}

fn run_context() -> RunContext {
    RunContext::new(
        NaiveDate::from_ymd_opt(2025, 7, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
    )
}

fn reference_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "commonName,stationNaptan\n\
         Heron Quays DLR Station,940GZZDLHEQ\n\
         Canary Wharf Underground Station,940GZZLUCYF\n\
         Bank Underground Station,940GZZLUBNK\n"
    )
    .unwrap();
    file.flush().unwrap();
    file
}

/// Mounts a 34-result search: 24 cards then 10, three of which repeat page one
async fn mount_two_page_search(site: &MockServer) {
    let first: Vec<String> = (1..=24).map(priced_card).collect();
    let mut second: Vec<String> = (25..=31).map(priced_card).collect();
    second.extend((1..=3).map(priced_card));

    Mock::given(method("GET"))
        .and(path("/find"))
        .and(query_param("index", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(34, &first)))
        .expect(1)
        .mount(site)
        .await;

    Mock::given(method("GET"))
        .and(path("/find"))
        .and(query_param("index", "24"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(34, &second)))
        .expect(1)
        .mount(site)
        .await;
}

#[tokio::test]
async fn test_two_page_scrape_collapses_duplicates() {
    let site = MockServer::start().await;
    let journeys = MockServer::start().await;
    mount_two_page_search(&site).await;

    let config = create_test_config(&site, &journeys, "unused.csv");
    let location = config.locations[0].clone();
    let storage = SqliteStorage::new_in_memory().unwrap();
    let mut coordinator = Coordinator::new(config, "test-hash", storage).unwrap();
    let mut browser = StationsBrowser::default();

    let report = coordinator
        .run(&mut browser, &location, 42, &run_context())
        .await
        .unwrap();

    assert_eq!(report.result_count, 34);
    assert_eq!(report.counts.pages_fetched, 2);
    assert_eq!(report.counts.scraped, 34);
    assert_eq!(report.counts.duplicates, 3);
    assert_eq!(report.counts.found, 31);
    assert_eq!(report.counts.inserted, 31);
    assert_eq!(report.counts.failed, 0);
    assert_eq!(report.counts.rejected, 0);

    // Every card with a link was opened in the browser, duplicates included
    assert_eq!(browser.visited.len(), 34);
    assert!(browser.visited[0].starts_with(&site.uri()));

    let storage = coordinator.into_storage();
    let listings = storage.load_listings(&ListingFilter::default()).unwrap();
    assert_eq!(listings.len(), 31);
    assert_eq!(listings[0].id, "5E7491|1|2025-07-10|09:00:00.000000");
    assert_eq!(listings[24].id, "5E7492|1|2025-07-10|09:00:00.000000");
    assert_eq!(
        listings[0].nearest_station.as_ref().map(|s| s.name.as_str()),
        Some("Heron Quays Station")
    );
    assert_eq!(
        listings[0].second_station.as_ref().map(|s| s.name.as_str()),
        Some("Canary Wharf Station")
    );

    let run = storage.get_run(report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.counts, report.counts);
}

#[tokio::test]
async fn test_page_limit_stops_fetching() {
    let site = MockServer::start().await;
    let journeys = MockServer::start().await;

    let first: Vec<String> = (1..=24).map(priced_card).collect();
    Mock::given(method("GET"))
        .and(path("/find"))
        .and(query_param("index", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(500, &first)))
        .expect(1)
        .mount(&site)
        .await;

    let config = create_test_config(&site, &journeys, "unused.csv");
    let location = config.locations[0].clone();
    let mut coordinator =
        Coordinator::new(config, "test-hash", SqliteStorage::new_in_memory().unwrap()).unwrap();

    let report = coordinator
        .run(&mut StationsBrowser::default(), &location, 1, &run_context())
        .await
        .unwrap();

    assert_eq!(report.result_count, 500);
    assert_eq!(report.counts.pages_fetched, 1);
    assert_eq!(report.counts.inserted, 24);
}

#[tokio::test]
async fn test_unpriced_cards_are_rejected() {
    let site = MockServer::start().await;
    let journeys = MockServer::start().await;

    let cards = vec![priced_card(1), card(2, "Price on application"), priced_card(3)];
    Mock::given(method("GET"))
        .and(path("/find"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(3, &cards)))
        .mount(&site)
        .await;

    let config = create_test_config(&site, &journeys, "unused.csv");
    let location = config.locations[0].clone();
    let mut coordinator =
        Coordinator::new(config, "test-hash", SqliteStorage::new_in_memory().unwrap()).unwrap();

    let report = coordinator
        .run(&mut StationsBrowser::default(), &location, 42, &run_context())
        .await
        .unwrap();

    assert_eq!(report.counts.rejected, 1);
    assert_eq!(report.counts.inserted, 2);

    let ids: Vec<String> = coordinator
        .storage()
        .load_listings(&ListingFilter::default())
        .unwrap()
        .into_iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(
        ids,
        vec![
            "5E7491|1|2025-07-10|09:00:00.000000",
            "5E7491|3|2025-07-10|09:00:00.000000"
        ]
    );
}

#[tokio::test]
async fn test_failed_page_fetch_fails_run() {
    let site = MockServer::start().await;
    let journeys = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/find"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&site)
        .await;

    let config = create_test_config(&site, &journeys, "unused.csv");
    let locations = config.locations.clone();
    let mut coordinator =
        Coordinator::new(config, "test-hash", SqliteStorage::new_in_memory().unwrap()).unwrap();

    let result = crawl_with(&mut coordinator, &mut StationsBrowser::default(), &locations, 42).await;
    assert!(result.is_err());

    let run = coordinator.storage().get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_full_pipeline_scores_listings() {
    let site = MockServer::start().await;
    let journeys = MockServer::start().await;
    mount_two_page_search(&site).await;

    Mock::given(method("GET"))
        .and(path("/Journey/JourneyResults/940GZZDLHEQ/to/940GZZLUBNK"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"journeys":[{"duration":20},{"duration":25}]}"#),
        )
        .mount(&journeys)
        .await;
    // Canary Wharf has no journey data: every destination query fails and costs the penalty

    let reference = reference_csv();
    let config = create_test_config(&site, &journeys, reference.path().to_str().unwrap());
    let stations_config = config.stations.clone();
    let journey_config = config.journey.clone();
    let scoring_config = config.scoring.clone();
    let locations = config.locations.clone();

    let mut coordinator =
        Coordinator::new(config, "test-hash", SqliteStorage::new_in_memory().unwrap()).unwrap();
    let reports = crawl_with(&mut coordinator, &mut StationsBrowser::default(), &locations, 42)
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
    let mut storage = coordinator.into_storage();

    // Station resolution
    let resolution = resolve_stations(&mut storage, &stations_config).unwrap();
    assert_eq!(resolution.names, 2);
    assert_eq!(resolution.matched, 2);
    let mappings = storage.load_station_mappings().unwrap();
    let heron = mappings
        .iter()
        .find(|m| m.station_name == "Heron Quays Station")
        .unwrap();
    assert_eq!(heron.matched_station.as_deref(), Some("Heron Quays"));
    assert_eq!(heron.station_code.as_deref(), Some("940GZZDLHEQ"));

    // Travel times
    let client = TflJourneyClient::new(&journey_config).unwrap();
    let resolver = TravelTimeResolver::new(client, &journey_config);
    let travel = resolve_travel_times(&mut storage, &resolver).await.unwrap();
    assert_eq!(travel.stations, 2);
    assert_eq!(travel.resolved, 1);
    assert_eq!(travel.penalized, 1);

    let times = storage.load_travel_times().unwrap();
    assert_eq!(times.len(), 2);
    assert_eq!(times[0].station_code, "940GZZDLHEQ");
    assert_eq!(times[0].destination, "Bank");
    assert_eq!(times[0].duration_minutes, 20.0);
    assert_eq!(times[0].walk_minutes, 9.0);
    // 60 minute penalty, less the walk
    assert_eq!(times[1].station_code, "940GZZLUCYF");
    assert_eq!(times[1].duration_minutes, 51.0);

    // Scoring: 0.5 miles * 20 + 20 transit + 9 walk = 39 minutes
    let summary = score_listings(&mut storage, &scoring_config).unwrap();
    assert_eq!(summary.listings, 31);
    assert_eq!(summary.unscored, 0);

    let scores = storage.load_scores().unwrap();
    assert_eq!(scores.len(), 31);
    for score in &scores {
        assert_eq!(score.transport_score, Some(6.0));
        assert_eq!(score.comfort_score, Some(5.0));
        let price = score.price_score.unwrap();
        assert!(price > 0.0 && price < 10.0);
        assert!(score.combined_score.is_some());
    }

    // Deleting listings takes their scores with them
    let deleted = storage.delete_listings(&ListingFilter::default()).unwrap();
    assert_eq!(deleted, 31);
    assert!(storage.load_scores().unwrap().is_empty());
}
