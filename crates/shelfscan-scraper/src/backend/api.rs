//! Direct JSON listing endpoints.

use shelfscan_core::RawRecord;

use super::BackendSettings;
use crate::attempt::{first_success, Rejection};
use crate::client::{collection_handle, extract_store_origin, locale_prefix, StorefrontClient};
use crate::error::ScraperError;

const PAGE_SIZE: u32 = 250;

/// Candidate listing endpoints for `source_url`, grouped and in probe order.
///
/// The first group addresses the collection directly; the second group is
/// site-wide inventory filtered by collection, probed only when the first
/// yields too few records.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidSourceUrl`] if the URL has no
/// `collections/<handle>` segment.
pub fn endpoint_groups(source_url: &str) -> Result<[Vec<String>; 2], ScraperError> {
    let handle = collection_handle(source_url).ok_or_else(|| ScraperError::InvalidSourceUrl {
        url: source_url.to_owned(),
        reason: "no collections/<handle> segment".to_owned(),
    })?;
    let origin = extract_store_origin(source_url);
    let locale = locale_prefix(source_url);

    let collection = vec![
        format!("{origin}/api/collections/{handle}/products.json?limit={PAGE_SIZE}"),
        format!("{origin}{locale}/collections/{handle}/products.json?limit={PAGE_SIZE}"),
        format!("{origin}/collections/{handle}/products.json?limit={PAGE_SIZE}"),
    ];
    let inventory = vec![
        format!("{origin}{locale}/products.json?limit={PAGE_SIZE}"),
        format!("{origin}/api/inventory/products?collection={handle}&limit={PAGE_SIZE}"),
        format!(
            "{origin}{locale}/recommendations/products.json?collection={handle}&limit={PAGE_SIZE}"
        ),
    ];
    Ok([collection, inventory])
}

pub(super) async fn extract(
    client: &StorefrontClient,
    source_url: &str,
    settings: &BackendSettings,
) -> Result<Vec<RawRecord>, ScraperError> {
    let groups = endpoint_groups(source_url)?;
    let mut fallback: Option<(String, Vec<RawRecord>)> = None;
    let mut failures: Vec<String> = Vec::new();

    for group in groups {
        let run = first_success(
            group,
            |endpoint| async move { client.fetch_listing(&endpoint, source_url).await },
            |_| true,
        )
        .await;

        for (endpoint, rejection) in &run.rejected {
            if let Rejection::Failed(e) = rejection {
                tracing::info!(endpoint = %endpoint, error = %e, "listing endpoint rejected");
                failures.push(format!("{endpoint}: {e}"));
            }
        }

        let Some((endpoint, records)) = run.winner else {
            continue;
        };
        if records.len() > settings.accept_threshold {
            tracing::info!(endpoint = %endpoint, records = records.len(), "listing endpoint accepted");
            return Ok(records);
        }
        tracing::info!(
            endpoint = %endpoint,
            records = records.len(),
            threshold = settings.accept_threshold,
            "listing endpoint below threshold"
        );
        if fallback.is_none() {
            fallback = Some((endpoint, records));
        }
    }

    match fallback {
        Some((endpoint, records)) => {
            tracing::debug!(endpoint = %endpoint, records = records.len(), "returning small listing");
            Ok(records)
        }
        None => Err(ScraperError::NoRecords {
            context: format!("listing endpoints for {source_url}"),
            reason: if failures.is_empty() {
                "no endpoint candidates".to_owned()
            } else {
                failures.join("; ")
            },
        }),
    }
}
