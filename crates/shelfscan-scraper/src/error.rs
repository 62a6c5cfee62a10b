use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} timed out after {}s", .timeout.as_secs_f64())]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response from {url} has no \"products\" collection")]
    MissingProducts { url: String },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid source URL \"{url}\": {reason}")]
    InvalidSourceUrl { url: String, reason: String },

    #[error("selector not found: {selector}")]
    SelectorNotFound { selector: String },

    #[error("browser could not be launched: {0}")]
    BrowserLaunch(String),

    #[error("browser automation failed: {0}")]
    Browser(String),

    #[error("no records from {context}: {reason}")]
    NoRecords { context: String, reason: String },
}

impl ScraperError {
    /// Returns `true` for transport-level failures: timeouts, connection
    /// errors, rate limiting and 5xx responses.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ScraperError::Http(_)
            | ScraperError::Timeout { .. }
            | ScraperError::RateLimited { .. } => true,
            ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = ScraperError::UnexpectedStatus {
            status: 503,
            url: "https://shop.example/products.json".to_owned(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        let err = ScraperError::UnexpectedStatus {
            status: 403,
            url: "https://shop.example/products.json".to_owned(),
        };
        assert!(!err.is_transient());
        assert!(!ScraperError::MissingProducts {
            url: "https://shop.example/products.json".to_owned()
        }
        .is_transient());
    }

    #[test]
    fn timeout_message_names_operation() {
        let err = ScraperError::Timeout {
            operation: "navigation to https://shop.example".to_owned(),
            timeout: Duration::from_secs(30),
        };
        assert_eq!(
            err.to_string(),
            "navigation to https://shop.example timed out after 30s"
        );
    }
}
