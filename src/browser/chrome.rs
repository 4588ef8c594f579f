//! Headless Chrome implementation of [`BrowserSession`]
//!
//! `headless_chrome` drives Chrome over the DevTools protocol with blocking
//! calls, so every command runs on the blocking pool against a shared tab.

use crate::browser::{BrowserError, BrowserResult, BrowserSession};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Script click reaches tabs that overlays would intercept
const CLICK_FN: &str = "function() { this.click(); }";

/// Which command failed, used to pick the error variant
#[derive(Debug, Clone, Copy)]
enum Step<'a> {
    Navigate(&'a str),
    Find(&'a str),
    Wait { selector: &'a str, timeout: Duration },
    Script,
}

/// A live Chrome process with one tab
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl ChromeSession {
    /// Launches Chrome and opens the tab used for the whole run
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lettings_lens::browser::{BrowserSession, ChromeSession};
    /// use lettings_lens::config::BrowserConfig;
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut session = ChromeSession::connect(&BrowserConfig::default()).await?;
    /// session.navigate("https://www.example.com/").await?;
    /// session.close().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: &BrowserConfig) -> BrowserResult<Self> {
        let config = config.clone();
        let headless = config.headless;

        let (browser, tab) = tokio::task::spawn_blocking(move || {
            let browser = Browser::new(launch_options(&config))?;
            let tab = browser.new_tab()?;
            Ok::<_, anyhow::Error>((browser, tab))
        })
        .await
        .map_err(|e| BrowserError::Protocol(format!("browser task failed: {}", e)))?
        .map_err(|e| BrowserError::Launch(e.to_string()))?;

        tracing::info!("Launched Chrome (headless: {})", headless);

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
        })
    }

    /// Runs a blocking command against the tab
    async fn with_tab<T, F>(&self, command: F) -> BrowserResult<anyhow::Result<T>>
    where
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tab = self
            .tab
            .clone()
            .ok_or_else(|| BrowserError::SessionLost("session already closed".to_string()))?;

        tokio::task::spawn_blocking(move || command(&tab))
            .await
            .map_err(|e| BrowserError::Protocol(format!("browser task failed: {}", e)))
    }

    /// Whether Chrome still answers on the DevTools connection
    async fn is_alive(&self) -> bool {
        let Some(browser) = self.browser.clone() else {
            return false;
        };
        tokio::task::spawn_blocking(move || browser.get_version().is_ok())
            .await
            .unwrap_or(false)
    }

    async fn failure(&self, step: Step<'_>, error: anyhow::Error) -> BrowserError {
        let alive = self.is_alive().await;
        classify_failure(step, error.to_string(), alive)
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        let target = url.to_string();
        let outcome = self
            .with_tab(move |tab| {
                tab.navigate_to(&target)?;
                tab.wait_until_navigated()?;
                Ok(())
            })
            .await?;

        match outcome {
            Ok(()) => Ok(()),
            Err(e) => Err(self.failure(Step::Navigate(url), e).await),
        }
    }

    async fn is_present(&mut self, selector: &str) -> BrowserResult<bool> {
        let target = selector.to_string();
        let outcome = self
            .with_tab(move |tab| tab.find_element(&target).map(|_| ()))
            .await?;

        match outcome {
            Ok(()) => Ok(true),
            Err(e) => match self.failure(Step::Find(selector), e).await {
                BrowserError::NoSuchElement(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn find_and_click(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        let target = selector.to_string();
        // Outer error: the element never appeared. Inner error: the click failed.
        let outcome = self
            .with_tab(move |tab| {
                let element = tab.wait_for_element_with_custom_timeout(&target, timeout)?;
                Ok(element.call_js_fn(CLICK_FN, vec![], false).map(|_| ()))
            })
            .await?;

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(self.failure(Step::Script, e).await),
            Err(e) => Err(self.failure(Step::Wait { selector, timeout }, e).await),
        }
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        let target = selector.to_string();
        let outcome = self
            .with_tab(move |tab| {
                tab.wait_for_element_with_custom_timeout(&target, timeout)
                    .map(|_| ())
            })
            .await?;

        match outcome {
            Ok(()) => Ok(()),
            Err(e) => Err(self.failure(Step::Wait { selector, timeout }, e).await),
        }
    }

    async fn parse_current_document(&mut self) -> BrowserResult<String> {
        let outcome = self.with_tab(|tab| tab.get_content()).await?;
        match outcome {
            Ok(html) => Ok(html),
            Err(e) => Err(self.failure(Step::Script, e).await),
        }
    }

    async fn close(&mut self) -> BrowserResult<()> {
        let browser = self.browser.take();
        let Some(tab) = self.tab.take() else {
            return Ok(());
        };

        // Dropping the browser waits on the Chrome process
        tokio::task::spawn_blocking(move || {
            let closed = tab.close(false).map(|_| ());
            drop(tab);
            drop(browser);
            closed
        })
        .await
        .map_err(|e| BrowserError::Protocol(format!("browser task failed: {}", e)))?
        .map_err(|e| BrowserError::Protocol(e.to_string()))
    }
}

/// Chrome launch options for the configured session
fn launch_options(config: &BrowserConfig) -> LaunchOptions<'static> {
    LaunchOptions {
        headless: config.headless,
        path: config.chrome_path.as_ref().map(PathBuf::from),
        idle_browser_timeout: Duration::from_secs(config.idle_timeout_secs),
        ..LaunchOptions::default()
    }
}

/// Maps a failed command onto a [`BrowserError`]
///
/// A command that fails while Chrome no longer answers means the session
/// is gone, whatever the command was.
fn classify_failure(step: Step<'_>, message: String, session_alive: bool) -> BrowserError {
    if !session_alive {
        return BrowserError::SessionLost(message);
    }

    match step {
        Step::Navigate(url) => BrowserError::Navigation {
            url: url.to_string(),
            message,
        },
        Step::Find(selector) => BrowserError::NoSuchElement(selector.to_string()),
        Step::Wait { selector, timeout } => BrowserError::Timeout {
            selector: selector.to_string(),
            waited_ms: timeout.as_millis() as u64,
        },
        Step::Script => BrowserError::Protocol(message),
    }
}
