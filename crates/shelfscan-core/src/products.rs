use serde::{Deserialize, Serialize};

/// An untyped listing item exactly as one extraction backend produced it.
///
/// The key set depends on the backend: storefront `products.json` objects
/// carry `title`/`vendor`/`variants`, GraphQL nodes are flattened into
/// `id`/`name`/`url`/`price`/`image`, and DOM cards yield
/// `name`/`brand`/`price`/`original_price`/`discount`/`url`/`image_url`.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Column order shared by every export writer and the `products` table.
pub const EXPORT_FIELDS: [&str; 7] = [
    "name",
    "brand",
    "price",
    "original_price",
    "discount",
    "url",
    "image_url",
];

/// A backend-agnostic listing after field-priority resolution.
///
/// Prices are still display strings here (e.g. `"152 dh"`); numeric parsing
/// happens when the record is cleaned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    /// Never empty; records without a usable name are dropped upstream.
    pub name: String,
    pub brand: Option<String>,
    pub price: Option<String>,
    /// Falls back to `price` when the source carries no compare-at value.
    pub original_price: Option<String>,
    /// Raw badge text such as `"-50%"`.
    pub discount: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

/// The terminal record handed to export writers and the query service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedProduct {
    pub name: String,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    /// Whole-number percentage. Not clamped to 0–100.
    pub discount: Option<u32>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

impl CleanedProduct {
    /// Returns `true` when the listing shows a lower price than its
    /// compare-at price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        matches!(
            (self.price, self.original_price),
            (Some(price), Some(original)) if price < original
        )
    }
}
