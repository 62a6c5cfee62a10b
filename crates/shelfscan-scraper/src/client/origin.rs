//! URL decomposition for storefront listing URLs.
//!
//! A listing URL such as `https://shop.example/en/collections/women-handbags`
//! carries three pieces the backends need: the origin
//! (`https://shop.example`), the locale prefix (`/en`), and the collection
//! handle (`women-handbags`).

use std::sync::LazyLock;

use regex::Regex;

static COLLECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"collections/([a-zA-Z0-9-]+)").expect("valid regex"));

/// Extracts the scheme+host origin from a source URL.
///
/// Given `"https://shop.example/en/collections/bags"`, returns
/// `"https://shop.example"`.
#[must_use]
pub fn extract_store_origin(source_url: &str) -> String {
    reqwest::Url::parse(source_url).map_or_else(
        |e| {
            tracing::warn!(
                source_url,
                error = %e,
                "could not parse source URL, falling back to string split for origin"
            );
            // fallback: take "https://host" by splitting on '/' and taking first 3 parts
            source_url
                .trim_end_matches('/')
                .splitn(4, '/')
                .take(3)
                .collect::<Vec<_>>()
                .join("/")
        },
        |u| u.origin().ascii_serialization(),
    )
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
pub(crate) fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

/// The collection handle in a listing URL, if any.
#[must_use]
pub fn collection_handle(source_url: &str) -> Option<String> {
    COLLECTION_RE
        .captures(source_url)
        .and_then(|cap| cap.get(1).map(|m| m.as_str().to_owned()))
}

/// The path segment(s) before `/collections/`, e.g. `"/en"`. Empty when the
/// URL has no locale prefix or no collection.
#[must_use]
pub fn locale_prefix(source_url: &str) -> String {
    let Ok(url) = reqwest::Url::parse(source_url) else {
        return String::new();
    };
    let path = url.path();
    path.find("/collections/")
        .map(|idx| path[..idx].trim_end_matches('/').to_owned())
        .unwrap_or_default()
}

/// Origin plus locale prefix: the base under which product pages live
/// (`https://shop.example/en`).
#[must_use]
pub fn site_root(source_url: &str) -> String {
    format!(
        "{}{}",
        extract_store_origin(source_url),
        locale_prefix(source_url)
    )
}
