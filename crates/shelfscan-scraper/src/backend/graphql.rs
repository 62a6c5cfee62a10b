//! Storefront GraphQL collection query.

use serde_json::{Map, Value};
use shelfscan_core::RawRecord;

use crate::client::{collection_handle, extract_store_origin, site_root, StorefrontClient};
use crate::error::ScraperError;
use crate::types::ProductNode;

/// The collection query for `handle`: up to 250 products with id, title,
/// handle, minimum variant price and first image.
#[must_use]
pub fn collection_query(handle: &str) -> String {
    format!(
        r#"{{
  collection(handle: "{handle}") {{
    products(first: 250) {{
      edges {{
        node {{
          id
          title
          handle
          priceRange {{
            minVariantPrice {{
              amount
              currencyCode
            }}
          }}
          images(first: 1) {{
            edges {{
              node {{
                originalSrc
              }}
            }}
          }}
        }}
      }}
    }}
  }}
}}"#
    )
}

/// Flattens one product node into a record the standardizer understands.
fn node_to_record(node: ProductNode, root: &str) -> RawRecord {
    let mut record = Map::new();
    record.insert("id".to_owned(), Value::String(node.id));
    record.insert("name".to_owned(), Value::String(node.title));
    record.insert(
        "url".to_owned(),
        Value::String(format!("{root}/products/{}", node.handle)),
    );
    let money = node.price_range.min_variant_price;
    record.insert(
        "price".to_owned(),
        Value::String(format!("{} {}", money.amount, money.currency_code)),
    );
    if let Some(image) = node
        .images
        .and_then(|images| images.edges.into_iter().next())
    {
        record.insert("image".to_owned(), Value::String(image.node.original_src));
    }
    record
}

pub(super) async fn extract(
    client: &StorefrontClient,
    source_url: &str,
) -> Result<Vec<RawRecord>, ScraperError> {
    let handle = collection_handle(source_url).ok_or_else(|| ScraperError::InvalidSourceUrl {
        url: source_url.to_owned(),
        reason: "no collections/<handle> segment".to_owned(),
    })?;
    let endpoint = format!("{}/api/graphql", extract_store_origin(source_url));
    let response = client
        .post_graphql(&endpoint, &collection_query(&handle), source_url)
        .await?;

    if !response.errors.is_empty() {
        tracing::warn!(
            endpoint = %endpoint,
            errors = response.errors.len(),
            "GraphQL response carried errors"
        );
    }

    let Some(collection) = response.data.and_then(|data| data.collection) else {
        return Err(ScraperError::NoRecords {
            context: endpoint,
            reason: format!("collection \"{handle}\" not returned"),
        });
    };

    let root = site_root(source_url);
    let records: Vec<RawRecord> = collection
        .products
        .edges
        .into_iter()
        .map(|edge| node_to_record(edge.node, &root))
        .collect();
    tracing::debug!(endpoint = %endpoint, records = records.len(), "GraphQL collection parsed");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GraphqlResponse;

    fn first_node(json: &str) -> ProductNode {
        let response: GraphqlResponse = serde_json::from_str(json).unwrap();
        response
            .data
            .and_then(|d| d.collection)
            .unwrap()
            .products
            .edges
            .into_iter()
            .next()
            .unwrap()
            .node
    }

    #[test]
    fn query_names_the_collection_handle() {
        let query = collection_query("women-handbags");
        assert!(query.contains(r#"collection(handle: "women-handbags")"#));
        assert!(query.contains("products(first: 250)"));
        assert!(query.contains("originalSrc"));
    }

    #[test]
    fn node_becomes_record_with_site_root_url_and_price_text() {
        let node = first_node(
            r#"{"data":{"collection":{"products":{"edges":[{"node":{
                "id":"gid://shop/Product/1","title":"Tote","handle":"tote",
                "priceRange":{"minVariantPrice":{"amount":"152.0","currencyCode":"MAD"}},
                "images":{"edges":[{"node":{"originalSrc":"https://cdn.example/tote.jpg"}}]}
            }}]}}}}"#,
        );
        let record = node_to_record(node, "https://shop.example/en");
        assert_eq!(record["name"], "Tote");
        assert_eq!(record["url"], "https://shop.example/en/products/tote");
        assert_eq!(record["price"], "152.0 MAD");
        assert_eq!(record["image"], "https://cdn.example/tote.jpg");
    }

    #[test]
    fn image_key_absent_without_image_edge() {
        let node = first_node(
            r#"{"data":{"collection":{"products":{"edges":[{"node":{
                "id":"1","title":"Clutch","handle":"clutch",
                "priceRange":{"minVariantPrice":{"amount":"99","currencyCode":"MAD"}},
                "images":{"edges":[]}
            }}]}}}}"#,
        );
        let record = node_to_record(node, "https://shop.example");
        assert!(!record.contains_key("image"));
    }
}
