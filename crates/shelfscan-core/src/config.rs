use crate::app_config::{AppConfig, DEFAULT_USER_AGENT};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got \"{other}\""))),
        }
    };

    let database_url = or_default("SHELFSCAN_DATABASE_URL", "sqlite://products.db");
    let bind_addr = parse_addr("SHELFSCAN_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SHELFSCAN_LOG_LEVEL", "info");

    let scraper_user_agent = or_default("SHELFSCAN_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let scraper_accept = or_default("SHELFSCAN_SCRAPER_ACCEPT", "application/json");
    let scraper_referer = lookup("SHELFSCAN_SCRAPER_REFERER")
        .ok()
        .filter(|s| !s.trim().is_empty());

    let scraper_request_timeout_secs = parse_u64("SHELFSCAN_SCRAPER_REQUEST_TIMEOUT_SECS", "10")?;
    let scraper_graphql_timeout_secs = parse_u64("SHELFSCAN_SCRAPER_GRAPHQL_TIMEOUT_SECS", "15")?;
    let scraper_max_retries = parse_u32("SHELFSCAN_SCRAPER_MAX_RETRIES", "1")?;
    let scraper_retry_backoff_base_secs =
        parse_u64("SHELFSCAN_SCRAPER_RETRY_BACKOFF_BASE_SECS", "1")?;
    let scraper_page_delay_ms = parse_u64("SHELFSCAN_SCRAPER_PAGE_DELAY_MS", "2000")?;
    let scraper_navigation_timeout_secs =
        parse_u64("SHELFSCAN_SCRAPER_NAVIGATION_TIMEOUT_SECS", "30")?;
    let scraper_selector_timeout_secs = parse_u64("SHELFSCAN_SCRAPER_SELECTOR_TIMEOUT_SECS", "10")?;
    let scraper_accept_threshold = parse_usize("SHELFSCAN_SCRAPER_ACCEPT_THRESHOLD", "3")?;
    let browser_headless = parse_bool("SHELFSCAN_BROWSER_HEADLESS", "true")?;

    if scraper_request_timeout_secs == 0 {
        return Err(invalid(
            "SHELFSCAN_SCRAPER_REQUEST_TIMEOUT_SECS",
            "must be greater than 0".to_string(),
        ));
    }
    if scraper_navigation_timeout_secs == 0 {
        return Err(invalid(
            "SHELFSCAN_SCRAPER_NAVIGATION_TIMEOUT_SECS",
            "must be greater than 0".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        bind_addr,
        log_level,
        scraper_user_agent,
        scraper_accept,
        scraper_referer,
        scraper_request_timeout_secs,
        scraper_graphql_timeout_secs,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
        scraper_page_delay_ms,
        scraper_navigation_timeout_secs,
        scraper_selector_timeout_secs,
        scraper_accept_threshold,
        browser_headless,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
