//! The four extraction strategies behind one capability.
//!
//! Every backend turns a source listing URL into zero or more
//! [`RawRecord`]s and reports failure as a [`ScraperError`] value. Which one
//! runs is selected by [`BackendKind`]; [`Backends::attempt`] dispatches with
//! a `match`.

mod api;
mod dom;
mod graphql;
mod network;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use shelfscan_core::{AppConfig, RawRecord};
use thiserror::Error;

use crate::browser::{BrowserLauncher, BrowserSession};
use crate::client::StorefrontClient;
use crate::error::ScraperError;

pub use api::endpoint_groups;
pub use graphql::collection_query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Api,
    Graphql,
    NetworkSniff,
    Dom,
}

impl BackendKind {
    /// Priority order used when no backend is pinned.
    pub const DEFAULT_ORDER: [BackendKind; 4] = [
        BackendKind::Api,
        BackendKind::Graphql,
        BackendKind::NetworkSniff,
        BackendKind::Dom,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Api => "api",
            BackendKind::Graphql => "graphql",
            BackendKind::NetworkSniff => "network",
            BackendKind::Dom => "dom",
        }
    }

    /// Whether this backend needs a browser session.
    #[must_use]
    pub fn uses_browser(self) -> bool {
        matches!(self, BackendKind::NetworkSniff | BackendKind::Dom)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown backend \"{0}\" (expected api, graphql, network or dom)")]
pub struct UnknownBackend(pub String);

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(BackendKind::Api),
            "graphql" => Ok(BackendKind::Graphql),
            "network" | "network-sniff" | "network_sniff" => Ok(BackendKind::NetworkSniff),
            "dom" => Ok(BackendKind::Dom),
            other => Err(UnknownBackend(other.to_owned())),
        }
    }
}

/// Pacing and bounds shared by the backends.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// A listing group with more records than this is accepted without
    /// probing further groups.
    pub accept_threshold: usize,
    /// Politeness delay between pages; also used as the settle time after a
    /// page load and between lazy-load scrolls.
    pub page_delay: Duration,
    /// How long to wait for the listing container to render.
    pub selector_timeout: Duration,
    /// Scroll-to-bottom rounds used to trigger lazy-loaded listing requests.
    pub scroll_rounds: u32,
}

impl From<&AppConfig> for BackendSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            accept_threshold: config.scraper_accept_threshold,
            page_delay: Duration::from_millis(config.scraper_page_delay_ms),
            selector_timeout: Duration::from_secs(config.scraper_selector_timeout_secs),
            scroll_rounds: 5,
        }
    }
}

/// The configured backends for one source storefront.
pub struct Backends<L> {
    client: StorefrontClient,
    launcher: L,
    settings: BackendSettings,
}

impl<L: BrowserLauncher> Backends<L> {
    #[must_use]
    pub fn new(client: StorefrontClient, launcher: L, settings: BackendSettings) -> Self {
        Self {
            client,
            launcher,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Runs one backend against `source_url`.
    ///
    /// Browser backends launch a fresh session and close it on every exit
    /// path, whether extraction succeeded or not.
    ///
    /// # Errors
    ///
    /// Any [`ScraperError`] the backend hit; the orchestrator decides whether
    /// it is fatal.
    pub async fn attempt(
        &self,
        kind: BackendKind,
        source_url: &str,
        page_budget: u32,
    ) -> Result<Vec<RawRecord>, ScraperError> {
        match kind {
            BackendKind::Api => api::extract(&self.client, source_url, &self.settings).await,
            BackendKind::Graphql => graphql::extract(&self.client, source_url).await,
            BackendKind::NetworkSniff => {
                let mut session = self.launcher.launch().await?;
                let result =
                    network::extract(&mut session, source_url, page_budget, &self.settings).await;
                release(kind, &mut session).await;
                result
            }
            BackendKind::Dom => {
                let mut session = self.launcher.launch().await?;
                let result =
                    dom::extract(&mut session, source_url, page_budget, &self.settings).await;
                release(kind, &mut session).await;
                result
            }
        }
    }
}

/// Closes a session, logging rather than propagating a close failure so it
/// cannot mask the extraction result.
async fn release<S: BrowserSession>(kind: BackendKind, session: &mut S) {
    if let Err(e) = session.close().await {
        tracing::warn!(backend = %kind, error = %e, "browser session did not close cleanly");
    }
}
