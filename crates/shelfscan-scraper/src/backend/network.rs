//! Listing data sniffed from the browser's own network traffic.
//!
//! The page is loaded and scrolled so lazy listing requests fire; the first
//! captured response that looks like listing traffic and parses as a
//! `products` listing wins. When none does, the visible DOM is walked using
//! `?page=N` pagination instead.

use shelfscan_core::RawRecord;

use super::dom::walk_listing;
use super::BackendSettings;
use crate::attempt::{first_success, Rejection};
use crate::browser::{BrowserSession, CapturedResponse};
use crate::error::ScraperError;
use crate::pagination::{PageMode, PaginationController};
use crate::types::products_from_body;

pub(super) async fn extract<S: BrowserSession>(
    session: &mut S,
    source_url: &str,
    page_budget: u32,
    settings: &BackendSettings,
) -> Result<Vec<RawRecord>, ScraperError> {
    session.goto(source_url).await?;
    tokio::time::sleep(settings.page_delay).await;
    for _ in 0..settings.scroll_rounds {
        session.scroll_to_bottom().await?;
        tokio::time::sleep(settings.page_delay).await;
    }

    let candidates: Vec<CapturedResponse> = session
        .captured_responses()
        .await?
        .into_iter()
        .filter(CapturedResponse::looks_like_listing)
        .collect();
    tracing::debug!(candidates = candidates.len(), "captured listing responses");

    let shared: &S = session;
    let run = first_success(
        candidates,
        |response| async move {
            let body = shared.response_body(&response).await?;
            products_from_body(&body, &response.url)
        },
        |_| true,
    )
    .await;

    for (response, rejection) in &run.rejected {
        if let Rejection::Failed(e) = rejection {
            tracing::debug!(url = %response.url, error = %e, "captured response is not a listing");
        }
    }

    if let Some((response, records)) = run.winner {
        tracing::info!(url = %response.url, records = records.len(), "listing sniffed from network");
        return Ok(records);
    }

    tracing::info!("no listing response captured, falling back to visible DOM");
    let controller =
        PaginationController::new(PageMode::QueryParam, page_budget, settings.page_delay);
    walk_listing(session, source_url, controller, settings.selector_timeout).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::browser::{BrowserLauncher, RecordedBrowser, RecordedPage};

    const SOURCE: &str = "https://shop.example/en/collections/bags";

    fn settings() -> BackendSettings {
        BackendSettings {
            accept_threshold: 3,
            page_delay: Duration::ZERO,
            selector_timeout: Duration::ZERO,
            scroll_rounds: 5,
        }
    }

    #[tokio::test]
    async fn first_parseable_listing_response_wins() {
        let browser = RecordedBrowser::new()
            .with_page(SOURCE, RecordedPage::new("Bags", "<html></html>"))
            .with_response("https://shop.example/cart.json", r#"{"items": []}"#)
            .with_response("https://shop.example/api/products/broken", "<html>oops</html>")
            .with_response(
                "https://shop.example/en/collections/bags/products.json",
                r#"{"products": [{"title": "Tote"}, {"title": "Clutch"}]}"#,
            );
        let mut session = browser.launch().await.unwrap();

        let records = extract(&mut session, SOURCE, 2, &settings()).await.unwrap();

        assert_eq!(records.len(), 2);
        let log = browser.log().await;
        assert_eq!(log.scrolls, 5);
        assert_eq!(log.content_reads, 0);
    }

    #[tokio::test]
    async fn falls_back_to_query_param_dom_walk() {
        let card = r#"<div class="product-card"><a href="/products/tote">x</a><h3 class="product-card-title">Tote</h3></div>"#;
        let browser = RecordedBrowser::new().with_page(
            SOURCE,
            RecordedPage::new("Bags", format!("<html><body>{card}</body></html>")),
        );
        let mut session = browser.launch().await.unwrap();

        let records = extract(&mut session, SOURCE, 3, &settings()).await.unwrap();

        assert_eq!(records.len(), 1);
        let log = browser.log().await;
        assert!(log
            .visited
            .iter()
            .any(|url| url == "https://shop.example/en/collections/bags?page=2"));
    }
}
