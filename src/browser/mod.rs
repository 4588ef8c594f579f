//! Browser automation for listing detail pages
//!
//! Station data is only rendered after interacting with a detail page, so it
//! is read through a live browser session. The session is abstracted behind
//! [`BrowserSession`] so the consent, tab and retry handling in
//! [`TransportExtractor`] can run against any implementation:
//! - `ChromeSession`: Chrome driven through `headless_chrome`
//! - test doubles scripted per selector

mod chrome;
mod transport;

pub use chrome::ChromeSession;
pub use transport::TransportExtractor;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a browser session
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Timed out after {waited_ms}ms waiting for '{selector}'")]
    Timeout { selector: String, waited_ms: u64 },

    #[error("Element not found: {0}")]
    NoSuchElement(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Browser command failed: {0}")]
    Protocol(String),

    #[error("Browser session lost: {0}")]
    SessionLost(String),

    #[error("Failed to launch browser: {0}")]
    Launch(String),
}

impl BrowserError {
    /// Whether the session itself is unusable; such errors end the run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionLost(_))
    }
}

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Capabilities the transport extractor needs from a browser
///
/// Selectors are CSS selectors. One session is never shared between
/// concurrent tasks; callers hold it mutably for the whole run.
#[async_trait]
pub trait BrowserSession: Send {
    /// Loads `url` in the current window
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// Checks, without waiting, whether an element matching `selector` exists
    async fn is_present(&mut self, selector: &str) -> BrowserResult<bool>;

    /// Waits until the element is interactive, then clicks it
    async fn find_and_click(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()>;

    /// Waits until an element matching `selector` exists
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()>;

    /// Returns the current DOM serialized as HTML
    async fn parse_current_document(&mut self) -> BrowserResult<String>;

    /// Ends the session; further calls fail
    async fn close(&mut self) -> BrowserResult<()>;
}
