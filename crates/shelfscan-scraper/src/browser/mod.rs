//! Browser automation seam for the network-sniffing and DOM backends.
//!
//! Backends only talk to [`BrowserLauncher`] and [`BrowserSession`]. Two
//! implementations exist:
//!
//! - [`RecordedBrowser`] replays fixed markup snapshots and captured network
//!   responses. Used for offline replay and tests.
//! - `ChromiumLauncher` (cargo feature `browser`) drives a real Chromium
//!   over the DevTools protocol.
//!
//! Without the `browser` feature, [`default_launcher`] returns a launcher
//! whose every launch fails with [`ScraperError::BrowserLaunch`]; the
//! orchestrator contains that like any other backend failure.

#[cfg(feature = "browser")]
mod chromium;
mod recorded;

use std::time::Duration;

use async_trait::async_trait;
use shelfscan_core::AppConfig;

use crate::error::ScraperError;

#[cfg(feature = "browser")]
pub use chromium::{ChromiumLauncher, ChromiumSession};
pub use recorded::{RecordedBrowser, RecordedPage, RecordedSession, SessionLog};

/// A network response observed by the browser while a page loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    /// Protocol-level request identifier used to fetch the body.
    pub request_id: String,
    pub url: String,
}

impl CapturedResponse {
    /// Matches listing traffic: the URL mentions `products` and looks like
    /// JSON or an API route.
    #[must_use]
    pub fn looks_like_listing(&self) -> bool {
        self.url.contains("products") && (self.url.contains("json") || self.url.contains("api"))
    }
}

/// Launch and page-load settings for real browser sessions.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub user_agent: String,
    pub headless: bool,
    pub navigation_timeout: Duration,
    pub selector_timeout: Duration,
}

impl From<&AppConfig> for BrowserOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.scraper_user_agent.clone(),
            headless: config.browser_headless,
            navigation_timeout: Duration::from_secs(config.scraper_navigation_timeout_secs),
            selector_timeout: Duration::from_secs(config.scraper_selector_timeout_secs),
        }
    }
}

/// One open browser page, exclusively owned by a single backend invocation.
///
/// Callers must call [`BrowserSession::close`] on every exit path after a
/// successful launch.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigates and waits for the load to finish (bounded by the navigation
    /// timeout).
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError>;

    /// URL of the page currently loaded.
    fn current_url(&self) -> &str;

    /// Serialized DOM of the current page.
    async fn content(&mut self) -> Result<String, ScraperError>;

    async fn title(&mut self) -> Result<String, ScraperError>;

    async fn scroll_to_bottom(&mut self) -> Result<(), ScraperError>;

    /// Waits up to `timeout` for `selector` to match. Returns `false` on
    /// timeout rather than an error.
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, ScraperError>;

    /// Clicks the first element matching `selector` and waits for any
    /// resulting navigation.
    async fn click(&mut self, selector: &str) -> Result<(), ScraperError>;

    /// Every response observed since the session was opened, in arrival
    /// order.
    async fn captured_responses(&mut self) -> Result<Vec<CapturedResponse>, ScraperError>;

    async fn response_body(&self, response: &CapturedResponse) -> Result<String, ScraperError>;

    /// Tears the session down. Safe to call more than once.
    async fn close(&mut self) -> Result<(), ScraperError>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    /// # Errors
    ///
    /// Returns [`ScraperError::BrowserLaunch`] if no session can be started.
    async fn launch(&self) -> Result<Self::Session, ScraperError>;
}

/// Session type of [`UnavailableLauncher`]; it can never be constructed.
#[derive(Debug)]
pub enum NoSession {}

#[async_trait]
impl BrowserSession for NoSession {
    async fn goto(&mut self, _url: &str) -> Result<(), ScraperError> {
        match *self {}
    }

    fn current_url(&self) -> &str {
        match *self {}
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        match *self {}
    }

    async fn title(&mut self) -> Result<String, ScraperError> {
        match *self {}
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), ScraperError> {
        match *self {}
    }

    async fn wait_for_selector(
        &mut self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<bool, ScraperError> {
        match *self {}
    }

    async fn click(&mut self, _selector: &str) -> Result<(), ScraperError> {
        match *self {}
    }

    async fn captured_responses(&mut self) -> Result<Vec<CapturedResponse>, ScraperError> {
        match *self {}
    }

    async fn response_body(
        &self,
        _response: &CapturedResponse,
    ) -> Result<String, ScraperError> {
        match *self {}
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        match *self {}
    }
}

/// Launcher used when the crate is built without browser support.
#[derive(Debug, Clone, Default)]
pub struct UnavailableLauncher;

#[async_trait]
impl BrowserLauncher for UnavailableLauncher {
    type Session = NoSession;

    async fn launch(&self) -> Result<NoSession, ScraperError> {
        Err(ScraperError::BrowserLaunch(
            "built without the `browser` feature".to_owned(),
        ))
    }
}

#[cfg(feature = "browser")]
pub type DefaultLauncher = ChromiumLauncher;

#[cfg(not(feature = "browser"))]
pub type DefaultLauncher = UnavailableLauncher;

/// The launcher the binaries use: Chromium when compiled in, otherwise one
/// that always fails to launch.
#[cfg(feature = "browser")]
#[must_use]
pub fn default_launcher(options: BrowserOptions) -> DefaultLauncher {
    ChromiumLauncher::new(options)
}

#[cfg(not(feature = "browser"))]
#[must_use]
pub fn default_launcher(options: BrowserOptions) -> DefaultLauncher {
    tracing::debug!(
        headless = options.headless,
        "browser support not compiled in; browser backends will fail to launch"
    );
    UnavailableLauncher
}
