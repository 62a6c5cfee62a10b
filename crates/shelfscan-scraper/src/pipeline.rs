//! Raw records to cleaned products.

use shelfscan_core::{CleanedProduct, RawRecord};

use crate::clean::clean_product;
use crate::client::site_root;
use crate::standardize::Standardizer;

/// Standardizes then cleans `records` extracted from `source_url`.
///
/// Records without a usable name are dropped; order is preserved.
#[must_use]
pub fn process(records: Vec<RawRecord>, source_url: &str) -> Vec<CleanedProduct> {
    let standardizer = Standardizer::new(site_root(source_url));
    let products: Vec<CleanedProduct> = standardizer
        .standardize_all(records)
        .into_iter()
        .map(clean_product)
        .collect();
    tracing::info!(products = products.len(), "records standardized and cleaned");
    products
}
