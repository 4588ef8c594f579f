use crate::config::types::{
    BrowserConfig, Config, JourneyConfig, LocationEntry, OutputConfig, ScraperConfig,
    StationsConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_browser_config(&config.browser)?;
    validate_stations_config(&config.stations)?;
    validate_journey_config(&config.journey)?;
    validate_output_config(&config.output)?;
    validate_locations(&config.locations)?;
    Ok(())
}

fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_url("site-origin", &config.site_origin)?;

    if !config.search_url_template.contains("{index}") {
        return Err(ConfigError::Validation(format!(
            "search-url-template must contain an {{index}} placeholder, got '{}'",
            config.search_url_template
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.chrome_path.as_deref().is_some_and(|p| p.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "chrome-path cannot be empty when set".to_string(),
        ));
    }

    if config.idle_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "idle-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_stations_config(config: &StationsConfig) -> Result<(), ConfigError> {
    if config.reference_path.is_empty() {
        return Err(ConfigError::Validation(
            "reference-path cannot be empty".to_string(),
        ));
    }

    if !(0.0..=100.0).contains(&config.match_threshold) {
        return Err(ConfigError::Validation(format!(
            "match-threshold must be between 0 and 100, got {}",
            config.match_threshold
        )));
    }

    Ok(())
}

fn validate_journey_config(config: &JourneyConfig) -> Result<(), ConfigError> {
    validate_url("journey base-url", &config.base_url)?;

    if config.destinations.is_empty() {
        return Err(ConfigError::Validation(
            "at least one journey destination is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for destination in &config.destinations {
        if destination.code.is_empty() || destination.name.is_empty() {
            return Err(ConfigError::Validation(
                "journey destinations need a name and a code".to_string(),
            ));
        }
        if destination.walk_minutes < 0.0 {
            return Err(ConfigError::Validation(format!(
                "walk-minutes for '{}' cannot be negative",
                destination.name
            )));
        }
        if !seen.insert(destination.code.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate journey destination code '{}'",
                destination.code
            )));
        }
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_locations(locations: &[LocationEntry]) -> Result<(), ConfigError> {
    if locations.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[location]] entry is required".to_string(),
        ));
    }

    for entry in locations {
        if entry.name.trim().is_empty() || entry.code.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "location entries need a name and a code, got '{}' / '{}'",
                entry.name, entry.code
            )));
        }
        if entry.code.contains('|') {
            return Err(ConfigError::Validation(format!(
                "location code '{}' cannot contain '|'",
                entry.code
            )));
        }
    }

    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))
}
