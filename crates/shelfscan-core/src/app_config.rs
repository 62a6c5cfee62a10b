use std::net::SocketAddr;

/// Desktop Chrome identity sent by every HTTP and browser backend unless
/// `SHELFSCAN_SCRAPER_USER_AGENT` overrides it.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.4896.127 Safari/537.36";

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub scraper_user_agent: String,
    pub scraper_accept: String,
    /// `None` means "use the source listing URL as the referer".
    pub scraper_referer: Option<String>,
    pub scraper_request_timeout_secs: u64,
    pub scraper_graphql_timeout_secs: u64,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
    /// Politeness pause between listing pages in the browser backends.
    pub scraper_page_delay_ms: u64,
    pub scraper_navigation_timeout_secs: u64,
    pub scraper_selector_timeout_secs: u64,
    /// A backend result is accepted only when it holds more records than this.
    pub scraper_accept_threshold: usize,
    pub browser_headless: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_accept", &self.scraper_accept)
            .field("scraper_referer", &self.scraper_referer)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field(
                "scraper_graphql_timeout_secs",
                &self.scraper_graphql_timeout_secs,
            )
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_secs",
                &self.scraper_retry_backoff_base_secs,
            )
            .field("scraper_page_delay_ms", &self.scraper_page_delay_ms)
            .field(
                "scraper_navigation_timeout_secs",
                &self.scraper_navigation_timeout_secs,
            )
            .field(
                "scraper_selector_timeout_secs",
                &self.scraper_selector_timeout_secs,
            )
            .field("scraper_accept_threshold", &self.scraper_accept_threshold)
            .field("browser_headless", &self.browser_headless)
            .finish()
    }
}
