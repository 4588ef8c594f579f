//! Global request throttle
//!
//! Every request sent upstream, whether a search page fetch or a browser
//! navigation, first waits on the same [`Throttle`] so the site never sees
//! requests closer together than the configured minimum interval.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Shared minimum-interval gate for upstream requests
///
/// Clones share the same last-request timestamp.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// A throttle that never waits
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// How long a request at `now` must still wait after one made at `last`
    pub fn delay_for(&self, last: Option<Instant>, now: Instant) -> Duration {
        match last {
            Some(last) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Waits until a request is allowed and records it as sent
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        let delay = self.delay_for(*last, Instant::now());
        if !delay.is_zero() {
            tracing::trace!("Throttling request for {:?}", delay);
            tokio::time::sleep(delay).await;
        }
        *last = Some(Instant::now());
    }
}
