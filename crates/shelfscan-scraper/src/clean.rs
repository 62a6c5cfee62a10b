//! Field cleaning from [`CanonicalProduct`] display strings into typed
//! [`CleanedProduct`] values.
//!
//! Every function here is total: malformed input yields `None`, never an
//! error.

use std::sync::LazyLock;

use regex::Regex;
use shelfscan_core::{CanonicalProduct, CleanedProduct};

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

static DISCOUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Collapses whitespace runs to a single space and trims.
///
/// Blank input is treated the same as absent input.
#[must_use]
pub fn clean_name(raw: Option<&str>) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(raw?, " ");
    let trimmed = collapsed.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Parses the first numeric token (`152`, `152.99`) anywhere in the string.
///
/// Currency symbols and trailing units are ignored:
/// `"152 dh"` → `152.0`, `"MAD 1299.50"` → `1299.5`.
#[must_use]
pub fn clean_price(raw: Option<&str>) -> Option<f64> {
    PRICE_RE
        .find(raw?)
        .and_then(|token| token.as_str().parse::<f64>().ok())
}

/// Parses the first digit run of a discount badge as a whole percentage.
///
/// A leading minus and trailing percent sign are not part of the match, so
/// `"-50%"`, `"-50"` and `"50% off"` all yield `50`. Values are not clamped.
#[must_use]
pub fn clean_discount(raw: Option<&str>) -> Option<u32> {
    DISCOUNT_RE
        .find(raw?)
        .and_then(|token| token.as_str().parse::<u32>().ok())
}

/// Converts a standardized record into its terminal typed form.
///
/// `name` is guaranteed non-empty by the standardizer; should whitespace
/// collapsing ever empty it, the trimmed original is kept rather than
/// inventing a value.
#[must_use]
pub fn clean_product(product: CanonicalProduct) -> CleanedProduct {
    let name = clean_name(Some(&product.name)).unwrap_or_else(|| product.name.trim().to_owned());

    CleanedProduct {
        name,
        brand: product.brand,
        price: clean_price(product.price.as_deref()),
        original_price: clean_price(product.original_price.as_deref()),
        discount: clean_discount(product.discount.as_deref()),
        url: product.url,
        image_url: product.image_url,
    }
}

#[cfg(test)]
#[path = "clean_test.rs"]
mod tests;
