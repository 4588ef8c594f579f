use chrono::{Local, NaiveDate, NaiveDateTime};

/// Point-in-time context shared by every stage of one scrape run
///
/// Holding the run timestamp here keeps listing ids deterministic for a given
/// context instead of depending on when each stage happens to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    started_at: NaiveDateTime,
}

impl RunContext {
    pub fn new(started_at: NaiveDateTime) -> Self {
        Self { started_at }
    }

    /// Context stamped with the current local time
    pub fn now() -> Self {
        Self::new(Local::now().naive_local())
    }

    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    /// Date recorded on every listing of the run
    pub fn run_date(&self) -> NaiveDate {
        self.started_at.date()
    }

    /// Run timestamp with no embedded spaces, as used inside listing ids
    pub fn timestamp_token(&self) -> String {
        self.started_at.format("%Y-%m-%d|%H:%M:%S%.6f").to_string()
    }

    /// Builds `{location_code}{page_index+1}|{position}|{timestamp}`
    ///
    /// `page_index` is 0-based, `position` is 1-based within the page.
    pub fn listing_id(&self, location_code: &str, page_index: u32, position: usize) -> String {
        format!(
            "{}{}|{}|{}",
            location_code,
            page_index + 1,
            position,
            self.timestamp_token()
        )
    }
}
