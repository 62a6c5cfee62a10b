//! Backend and orchestrator integration tests.
//!
//! HTTP backends run against `wiremock`; browser backends run against a
//! `RecordedBrowser` replaying fixed listing markup.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelfscan_scraper::browser::{RecordedBrowser, RecordedPage};
use shelfscan_scraper::pagination::NEXT_CONTROL;
use shelfscan_scraper::{
    process, BackendKind, BackendSettings, Backends, HttpSettings, Orchestrator, ScraperError,
    Selection, StorefrontClient, Verdict,
};

fn client() -> StorefrontClient {
    StorefrontClient::new(HttpSettings {
        user_agent: "shelfscan-test/0.1".to_owned(),
        accept: "application/json".to_owned(),
        referer: None,
        request_timeout: Duration::from_secs(5),
        graphql_timeout: Duration::from_secs(5),
        max_retries: 0,
        backoff_base_secs: 0,
    })
    .expect("failed to build test client")
}

fn settings() -> BackendSettings {
    BackendSettings {
        accept_threshold: 3,
        page_delay: Duration::ZERO,
        selector_timeout: Duration::ZERO,
        scroll_rounds: 2,
    }
}

fn backends(browser: RecordedBrowser) -> Backends<RecordedBrowser> {
    Backends::new(client(), browser, settings())
}

fn listing(n: usize) -> Value {
    let products: Vec<Value> = (0..n)
        .map(|i| json!({"title": format!("Bag {i}"), "handle": format!("bag-{i}")}))
        .collect();
    json!({ "products": products })
}

/// A listing page with `cards` product cards and, optionally, an enabled
/// next-page link.
fn listing_page(page: u32, cards: usize, with_next: bool) -> RecordedPage {
    let mut body = String::new();
    for i in 0..cards {
        body.push_str(&format!(
            r#"<div class="product-card"><a class="product-card-image-wrapper" href="/products/p{page}-{i}"></a><h3 class="product-card-title">Bag {page}-{i}</h3><div class="product-card-price"><span class="sale-price">120 dh</span></div></div>"#
        ));
    }
    if with_next {
        body.push_str(&format!(
            r#"<nav><a class="pagination__item--next" href="?page={}">Next</a></nav>"#,
            page + 1
        ));
    }
    RecordedPage::new(
        "Women Handbags",
        format!("<html><body>{body}</body></html>"),
    )
}

// ---------------------------------------------------------------------------
// Direct API backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn api_backend_uses_first_reachable_collection_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/en/collections/bags/products.json"))
        .and(query_param("limit", "250"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(5)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/bags/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(9)))
        .expect(0)
        .mount(&server)
        .await;

    let source = format!("{}/en/collections/bags", server.uri());
    let records = backends(RecordedBrowser::new())
        .attempt(BackendKind::Api, &source, 2)
        .await
        .expect("api backend succeeds");

    assert_eq!(records.len(), 5);
}

#[tokio::test]
async fn api_backend_probes_inventory_when_collection_is_small() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/collections/bags/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(2)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(8)))
        .expect(1)
        .mount(&server)
        .await;

    let source = format!("{}/en/collections/bags", server.uri());
    let records = backends(RecordedBrowser::new())
        .attempt(BackendKind::Api, &source, 2)
        .await
        .expect("inventory group wins");

    assert_eq!(records.len(), 8);
}

#[tokio::test]
async fn api_backend_returns_small_result_when_nothing_better_exists() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/collections/bags/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(2)))
        .mount(&server)
        .await;

    let source = format!("{}/collections/bags", server.uri());
    let records = backends(RecordedBrowser::new())
        .attempt(BackendKind::Api, &source, 2)
        .await
        .expect("small result is still a result");

    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn api_backend_with_no_reachable_endpoint_fails() {
    let server = MockServer::start().await;
    let source = format!("{}/collections/bags", server.uri());

    let err = backends(RecordedBrowser::new())
        .attempt(BackendKind::Api, &source, 2)
        .await
        .unwrap_err();

    assert!(matches!(err, ScraperError::NoRecords { .. }), "got: {err:?}");
}

// ---------------------------------------------------------------------------
// GraphQL backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn graphql_backend_flattens_collection_nodes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"collection": {"products": {"edges": [
                {"node": {
                    "id": "gid://shop/Product/1", "title": "Tote", "handle": "tote",
                    "priceRange": {"minVariantPrice": {"amount": "152.0", "currencyCode": "MAD"}},
                    "images": {"edges": [{"node": {"originalSrc": "https://cdn.example/tote.jpg"}}]}
                }},
                {"node": {
                    "id": "gid://shop/Product/2", "title": "Clutch", "handle": "clutch",
                    "priceRange": {"minVariantPrice": {"amount": "99.5", "currencyCode": "MAD"}},
                    "images": {"edges": []}
                }}
            ]}}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = format!("{}/en/collections/bags", server.uri());
    let records = backends(RecordedBrowser::new())
        .attempt(BackendKind::Graphql, &source, 2)
        .await
        .expect("graphql succeeds");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["url"], format!("{}/en/products/tote", server.uri()));
    assert_eq!(records[0]["price"], "152.0 MAD");
    assert!(records[1].get("image").is_none());

    let products = process(records, &source);
    assert_eq!(products[1].price, Some(99.5));
}

#[tokio::test]
async fn graphql_backend_null_collection_is_no_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"collection": null}})),
        )
        .mount(&server)
        .await;

    let source = format!("{}/collections/bags", server.uri());
    let err = backends(RecordedBrowser::new())
        .attempt(BackendKind::Graphql, &source, 2)
        .await
        .unwrap_err();

    assert!(matches!(err, ScraperError::NoRecords { .. }), "got: {err:?}");
}

// ---------------------------------------------------------------------------
// Browser backends
// ---------------------------------------------------------------------------

const SOURCE: &str = "https://shop.example/en/collections/women-handbags";

fn always_next_site(pages: u32) -> RecordedBrowser {
    let mut browser = RecordedBrowser::new().with_page(SOURCE, listing_page(1, 4, true));
    for page in 2..=pages {
        browser = browser.with_page(
            &format!("{SOURCE}?page={page}"),
            listing_page(page, 4, true),
        );
    }
    browser
}

#[tokio::test]
async fn dom_backend_extracts_exactly_budget_pages() {
    let browser = always_next_site(6);
    let records = backends(browser.clone())
        .attempt(BackendKind::Dom, SOURCE, 3)
        .await
        .expect("dom succeeds");

    assert_eq!(records.len(), 12);
    let log = browser.log().await;
    assert_eq!(log.content_reads, 3);
    assert_eq!(log.clicks, vec![NEXT_CONTROL.to_owned(); 2]);
}

#[tokio::test]
async fn dom_backend_stops_at_disabled_next_control() {
    let last = RecordedPage::new(
        "Women Handbags",
        r#"<html><body>
            <div class="product-card"><a href="/products/last"></a><h3 class="product-card-title">Last</h3></div>
            <a class="pagination__item--next" aria-disabled="true" href="?page=3">Next</a>
            <button class="load-more">Load more</button>
        </body></html>"#,
    );
    let browser = RecordedBrowser::new()
        .with_page(SOURCE, listing_page(1, 2, true))
        .with_page(&format!("{SOURCE}?page=2"), last);

    let records = backends(browser.clone())
        .attempt(BackendKind::Dom, SOURCE, 10)
        .await
        .expect("dom succeeds");

    assert_eq!(records.len(), 3);
    assert_eq!(browser.log().await.content_reads, 2);
}

#[tokio::test]
async fn browser_sessions_are_closed_on_success_and_failure() {
    let browser = RecordedBrowser::new()
        .with_page(SOURCE, RecordedPage::new("Women Handbags", "<html></html>"));
    let backends = backends(browser.clone());

    let err = backends
        .attempt(BackendKind::Dom, SOURCE, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::SelectorNotFound { .. }));

    let sniffed = backends
        .attempt(BackendKind::NetworkSniff, SOURCE, 2)
        .await;
    assert!(sniffed.is_err());

    let log = browser.log().await;
    assert_eq!(log.launches, 2);
    assert_eq!(log.closes, 2);
}

#[tokio::test]
async fn launch_failure_is_a_backend_error() {
    let browser = RecordedBrowser::new().failing_launch("no chromium");
    let err = backends(browser)
        .attempt(BackendKind::NetworkSniff, SOURCE, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::BrowserLaunch(_)));
}

// ---------------------------------------------------------------------------
// Orchestrator end to end
// ---------------------------------------------------------------------------

#[tokio::test]
async fn auto_mode_falls_back_from_http_to_browser() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/collections/women-handbags/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(1)))
        .mount(&server)
        .await;

    let source = format!("{}/en/collections/women-handbags", server.uri());
    let browser = RecordedBrowser::new().with_page(&source, listing_page(1, 5, false));
    let backends = backends(browser.clone());

    let report = Orchestrator::new(3)
        .run(&backends, &source, 2, Selection::Auto)
        .await
        .expect("auto mode never errors");

    assert_eq!(report.accepted, Some(BackendKind::NetworkSniff));
    assert_eq!(report.records.len(), 5);
    let verdicts: Vec<_> = report
        .trail
        .iter()
        .map(|d| (d.backend, d.verdict.clone()))
        .collect();
    assert_eq!(verdicts.len(), 3);
    assert_eq!(verdicts[0], (BackendKind::Api, Verdict::BelowThreshold));
    assert!(matches!(verdicts[1], (BackendKind::Graphql, Verdict::Failed(_))));
    assert_eq!(verdicts[2], (BackendKind::NetworkSniff, Verdict::Accepted));

    let log = browser.log().await;
    assert_eq!(log.launches, 1);
    assert_eq!(log.closes, 1);
}

#[tokio::test]
async fn auto_mode_exhaustion_is_an_empty_report() {
    let server = MockServer::start().await;
    let source = format!("{}/collections/bags", server.uri());
    let backends = backends(RecordedBrowser::new().failing_launch("no chromium"));

    let report = Orchestrator::new(3)
        .run(&backends, &source, 2, Selection::Auto)
        .await
        .expect("exhaustion is not an error");

    assert!(report.is_exhausted());
    assert!(report.records.is_empty());
    assert_eq!(report.trail.len(), 4);
    assert!(report
        .trail
        .iter()
        .all(|d| matches!(d.verdict, Verdict::Failed(_))));
}

#[tokio::test]
async fn forced_mode_surfaces_backend_failure() {
    let server = MockServer::start().await;
    let source = format!("{}/collections/bags", server.uri());
    let backends = backends(RecordedBrowser::new());

    let result = Orchestrator::new(3)
        .run(&backends, &source, 2, Selection::Forced(BackendKind::Graphql))
        .await;

    assert!(result.is_err());
}
