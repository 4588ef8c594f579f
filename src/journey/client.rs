//! Journey-time service client
//!
//! The service is treated as unreliable: non-success statuses, unreadable
//! bodies and empty results all come back as [`JourneyError`] values for the
//! caller to degrade on.

use crate::config::JourneyConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors from a single journey query
#[derive(Debug, Error)]
pub enum JourneyError {
    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Journey service returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed journey response from {url}: {message}")]
    Malformed { url: String, message: String },

    #[error("No journeys returned for {url}")]
    NoJourney { url: String },
}

/// Anything that can report the transit minutes between two station codes
#[async_trait]
pub trait JourneyPlanner: Send + Sync {
    async fn journey_minutes(&self, from: &str, to: &str) -> Result<f64, JourneyError>;
}

#[derive(Debug, Deserialize)]
struct JourneyResults {
    #[serde(default)]
    journeys: Vec<Journey>,
}

#[derive(Debug, Deserialize)]
struct Journey {
    duration: f64,
}

/// Client for a TfL-style `Journey/JourneyResults` endpoint
#[derive(Debug, Clone)]
pub struct TflJourneyClient {
    client: Client,
    base_url: String,
    date: String,
    time: String,
}

impl TflJourneyClient {
    pub fn new(config: &JourneyConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            date: config.date.clone(),
            time: config.time.clone(),
        })
    }

    /// Least-time journey query departing at the configured date and time
    pub fn journey_url(&self, from: &str, to: &str) -> String {
        format!(
            "{}/Journey/JourneyResults/{}/to/{}?date={}&time={}&timeIs=Departing\
             &journeyPreference=LeastTime&accessibilityPreference=NoRequirements\
             &walkingSpeed=Average&cyclePreference=None",
            self.base_url, from, to, self.date, self.time
        )
    }
}

#[async_trait]
impl JourneyPlanner for TflJourneyClient {
    async fn journey_minutes(&self, from: &str, to: &str) -> Result<f64, JourneyError> {
        let url = self.journey_url(from, to);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| JourneyError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(JourneyError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| JourneyError::Request {
            url: url.clone(),
            source,
        })?;
        let results: JourneyResults =
            serde_json::from_str(&body).map_err(|e| JourneyError::Malformed {
                url: url.clone(),
                message: e.to_string(),
            })?;

        results
            .journeys
            .first()
            .map(|journey| journey.duration)
            .ok_or(JourneyError::NoJourney { url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TflJourneyClient {
        let config = JourneyConfig {
            base_url: server.uri(),
            ..JourneyConfig::default()
        };
        TflJourneyClient::new(&config).unwrap()
    }

    #[test]
    fn test_journey_url() {
        let client = TflJourneyClient::new(&JourneyConfig::default()).unwrap();
        assert_eq!(
            client.journey_url("940GZZLUCYF", "940GZZLUBNK"),
            "https://api.tfl.gov.uk/Journey/JourneyResults/940GZZLUCYF/to/940GZZLUBNK\
             ?date=20250710&time=0900&timeIs=Departing&journeyPreference=LeastTime\
             &accessibilityPreference=NoRequirements&walkingSpeed=Average&cyclePreference=None"
        );
    }

    #[tokio::test]
    async fn test_reads_first_journey_duration() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Journey/JourneyResults/940GZZLUCYF/to/940GZZLUBNK"))
            .and(query_param("journeyPreference", "LeastTime"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "journeys": [{ "duration": 14 }, { "duration": 19 }]
            })))
            .mount(&server)
            .await;

        let minutes = client(&server)
            .journey_minutes("940GZZLUCYF", "940GZZLUBNK")
            .await
            .unwrap();
        assert_eq!(minutes, 14.0);
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = client(&server).journey_minutes("A", "B").await;
        assert!(matches!(result, Err(JourneyError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let result = client(&server).journey_minutes("A", "B").await;
        assert!(matches!(result, Err(JourneyError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_no_journeys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "journeys": [] })))
            .mount(&server)
            .await;

        let result = client(&server).journey_minutes("A", "B").await;
        assert!(matches!(result, Err(JourneyError::NoJourney { .. })));
    }
}
