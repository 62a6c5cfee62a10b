//! Field-priority mapping from backend-specific [`RawRecord`]s into
//! [`CanonicalProduct`].
//!
//! Each canonical field has a fixed, ordered list of lookups. The first lookup
//! that finds a present, non-null, non-blank value wins. The order decides
//! which backend's naming convention takes precedence when a record carries
//! more than one, so it must not be reshuffled casually.

use serde_json::Value;
use shelfscan_core::{CanonicalProduct, RawRecord};

use crate::attempt::first_match;

/// Names that mark a record as unidentifiable.
const UNKNOWN_NAMES: [&str; 2] = ["unknown", "unknown product"];

/// One way of reading a field out of a raw record.
#[derive(Debug, Clone, Copy)]
enum Lookup {
    /// A top-level string or number.
    Key(&'static str),
    /// A string or number on the first element of `variants`.
    FirstVariant(&'static str),
    /// A top-level string, or an object carrying `src`.
    Image(&'static str),
    /// The first element of `images`, as a string or an object carrying `src`.
    FirstImage,
}

const NAME: &[Lookup] = &[Lookup::Key("name"), Lookup::Key("title")];
const BRAND: &[Lookup] = &[Lookup::Key("brand"), Lookup::Key("vendor")];
const PRICE: &[Lookup] = &[
    Lookup::Key("price"),
    Lookup::Key("price_min"),
    Lookup::FirstVariant("price"),
];
const ORIGINAL_PRICE: &[Lookup] = &[
    Lookup::Key("original_price"),
    Lookup::Key("compare_at_price"),
    Lookup::FirstVariant("compare_at_price"),
];
const DISCOUNT: &[Lookup] = &[Lookup::Key("discount")];
const URL: &[Lookup] = &[Lookup::Key("url")];
const HANDLE: &[Lookup] = &[Lookup::Key("handle")];
const IMAGE_URL: &[Lookup] = &[
    Lookup::Key("image_url"),
    Lookup::Image("image"),
    Lookup::Image("featured_image"),
    Lookup::FirstImage,
];

impl Lookup {
    fn read(self, record: &RawRecord) -> Option<String> {
        match self {
            Lookup::Key(key) => record.get(key).and_then(scalar_text),
            Lookup::FirstVariant(key) => record
                .get("variants")
                .and_then(Value::as_array)
                .and_then(|variants| variants.first())
                .and_then(|variant| variant.get(key))
                .and_then(scalar_text),
            Lookup::Image(key) => record.get(key).and_then(image_text),
            Lookup::FirstImage => record
                .get("images")
                .and_then(Value::as_array)
                .and_then(|images| images.first())
                .and_then(image_text),
        }
    }
}

/// Renders a JSON scalar as display text. Numbers keep their JSON form
/// (`99.99` → `"99.99"`); blank strings, nulls and containers yield `None`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn image_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => obj.get("src").and_then(scalar_text),
        other => scalar_text(other),
    }
}

fn resolve(record: &RawRecord, lookups: &[Lookup]) -> Option<String> {
    first_match(lookups.iter().copied(), |lookup| lookup.read(record))
}

/// Maps raw records from any backend into the canonical product shape.
#[derive(Debug, Clone)]
pub struct Standardizer {
    site_root: String,
}

impl Standardizer {
    /// `site_root` is the storefront origin plus locale prefix (for example
    /// `https://shop.example/en`); product URLs derived from a `handle` are
    /// built beneath it.
    #[must_use]
    pub fn new(site_root: impl Into<String>) -> Self {
        let site_root = site_root.into().trim_end_matches('/').to_owned();
        Self { site_root }
    }

    /// Returns `None` when the record has no usable name.
    #[must_use]
    pub fn standardize(&self, record: &RawRecord) -> Option<CanonicalProduct> {
        let name = resolve(record, NAME)?;
        if UNKNOWN_NAMES
            .iter()
            .any(|sentinel| name.trim().eq_ignore_ascii_case(sentinel))
        {
            return None;
        }

        let price = resolve(record, PRICE);
        let original_price = resolve(record, ORIGINAL_PRICE).or_else(|| price.clone());
        let url = resolve(record, URL).or_else(|| {
            resolve(record, HANDLE).map(|handle| format!("{}/products/{handle}", self.site_root))
        });

        Some(CanonicalProduct {
            name,
            brand: resolve(record, BRAND),
            price,
            original_price,
            discount: resolve(record, DISCOUNT),
            url,
            image_url: resolve(record, IMAGE_URL),
        })
    }

    /// Standardizes every record, dropping the unnamed ones. Input order is
    /// preserved.
    #[must_use]
    pub fn standardize_all(&self, records: Vec<RawRecord>) -> Vec<CanonicalProduct> {
        let total = records.len();
        let products: Vec<CanonicalProduct> = records
            .iter()
            .filter_map(|record| self.standardize(record))
            .collect();

        let dropped = total - products.len();
        if dropped > 0 {
            tracing::debug!(total, dropped, "dropped raw records without a usable name");
        }
        products
    }
}

#[cfg(test)]
#[path = "standardize_test.rs"]
mod tests;
