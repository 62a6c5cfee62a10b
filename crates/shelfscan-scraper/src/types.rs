//! Wire types for the storefront's machine-readable channels.
//!
//! ## `products.json`-style listings
//! Every REST listing endpoint the storefront has exposed returns a top-level
//! object with a `products` array, but the element shape differs between
//! endpoints (full product objects, trimmed recommendation objects, inventory
//! rows). Elements are therefore kept as untyped [`RawRecord`]s; the
//! standardizer decides which keys matter.
//!
//! ## GraphQL collection query
//! `POST /api/graphql` with `{"query": ...}` answers with
//! `data.collection.products.edges[].node`. A missing collection comes back as
//! `"collection": null`, not as an error status, and is modelled as `Option`.

use serde::Deserialize;
use serde_json::Value;
use shelfscan_core::RawRecord;

use crate::error::ScraperError;

/// Parses a listing body and returns its `products` elements.
///
/// Non-object elements are skipped.
///
/// # Errors
///
/// - [`ScraperError::Deserialize`] if `body` is not JSON.
/// - [`ScraperError::MissingProducts`] if there is no `products` array.
pub(crate) fn products_from_body(body: &str, url: &str) -> Result<Vec<RawRecord>, ScraperError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ScraperError::Deserialize {
        context: format!("listing body from {url}"),
        source: e,
    })?;

    let Value::Object(mut top) = value else {
        return Err(ScraperError::MissingProducts {
            url: url.to_owned(),
        });
    };
    let Some(Value::Array(items)) = top.remove("products") else {
        return Err(ScraperError::MissingProducts {
            url: url.to_owned(),
        });
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(record),
            _ => None,
        })
        .collect())
}

/// Top-level GraphQL response.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse {
    pub data: Option<GraphqlData>,
    /// GraphQL-level errors; kept opaque and only counted for logging.
    #[serde(default)]
    pub errors: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlData {
    pub collection: Option<GraphqlCollection>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlCollection {
    pub products: Connection<ProductNode>,
}

/// Relay-style connection: `{ edges: [{ node: T }] }`.
#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    /// Opaque global ID, e.g. `"gid://shopify/Product/6789012345678"`.
    pub id: String,
    pub title: String,
    pub handle: String,
    pub price_range: PriceRange,
    pub images: Option<Connection<ImageNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    pub min_variant_price: Money,
}

/// `amount` is a decimal string (`"152.0"`), never a JSON number.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub original_src: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_from_body_keeps_object_elements() {
        let body = r#"{"products": [{"title": "A"}, 7, {"title": "B"}]}"#;
        let records = products_from_body(body, "https://shop.example/products.json").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("title").and_then(Value::as_str), Some("B"));
    }

    #[test]
    fn products_from_body_requires_products_array() {
        for body in [r#"{"items": []}"#, r#"{"products": "none"}"#, "[]"] {
            let err = products_from_body(body, "https://shop.example/products.json").unwrap_err();
            assert!(
                matches!(err, ScraperError::MissingProducts { .. }),
                "expected MissingProducts for {body}, got: {err:?}"
            );
        }
    }

    #[test]
    fn products_from_body_rejects_html() {
        let err = products_from_body("<!doctype html><html></html>", "https://shop.example/x")
            .unwrap_err();
        assert!(matches!(err, ScraperError::Deserialize { .. }));
    }

    #[test]
    fn graphql_response_deserializes_nodes() {
        let body = r#"{
          "data": {"collection": {"products": {"edges": [
            {"node": {
              "id": "gid://shopify/Product/1",
              "title": "Mini Bag",
              "handle": "mini-bag",
              "priceRange": {"minVariantPrice": {"amount": "45.0", "currencyCode": "MAD"}},
              "images": {"edges": [{"node": {"originalSrc": "https://cdn.example/mini.jpg"}}]}
            }}
          ]}}}
        }"#;
        let parsed: GraphqlResponse = serde_json::from_str(body).unwrap();
        let collection = parsed.data.unwrap().collection.unwrap();
        let node = &collection.products.edges[0].node;
        assert_eq!(node.handle, "mini-bag");
        assert_eq!(node.price_range.min_variant_price.currency_code, "MAD");
        assert_eq!(
            node.images.as_ref().unwrap().edges[0].node.original_src,
            "https://cdn.example/mini.jpg"
        );
    }

    #[test]
    fn graphql_null_collection_is_none() {
        let parsed: GraphqlResponse =
            serde_json::from_str(r#"{"data": {"collection": null}}"#).unwrap();
        assert!(parsed.data.unwrap().collection.is_none());
        assert!(parsed.errors.is_empty());
    }
}
