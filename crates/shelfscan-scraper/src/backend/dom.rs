//! Visible-DOM listing extraction across pages.

use std::collections::HashSet;
use std::time::Duration;

use shelfscan_core::RawRecord;

use super::BackendSettings;
use crate::browser::BrowserSession;
use crate::error::ScraperError;
use crate::listing::{extract_listing, LISTING_CONTAINER};
use crate::pagination::{
    detect_next_signal, is_invalid_page_title, page_url, NextSignal, PageMode, PageSnapshot, PaginationController, Step,
};

pub(super) async fn extract<S: BrowserSession>(
    session: &mut S,
    source_url: &str,
    page_budget: u32,
    settings: &BackendSettings,
) -> Result<Vec<RawRecord>, ScraperError> {
    let controller = PaginationController::new(PageMode::Controls, page_budget, settings.page_delay);
    walk_listing(session, source_url, controller, settings.selector_timeout).await
}

/// Dedupe key: product URL, or name when the card has no link.
fn record_key(record: &RawRecord) -> Option<String> {
    ["url", "name"]
        .into_iter()
        .find_map(|key| record.get(key).and_then(serde_json::Value::as_str))
        .map(str::to_owned)
}

/// Loads the page the controller is about to extract.
async fn load_page<S: BrowserSession>(
    session: &mut S,
    source_url: &str,
    controller: &PaginationController,
    previous: NextSignal,
) -> Result<(), ScraperError> {
    let page = controller.current_page() + 1;
    match controller.mode() {
        PageMode::QueryParam if page > 1 => session.goto(&page_url(source_url, page)).await,
        PageMode::Controls if page > 1 => match previous.selector() {
            Some(selector) => session.click(selector).await,
            None => Err(ScraperError::SelectorNotFound {
                selector: "next page control".to_owned(),
            }),
        },
        _ => session.goto(source_url).await,
    }
}

/// Extracts listing cards page by page until `controller` says stop.
///
/// Records already emitted on an earlier page are skipped. In page-number mode
/// a not-found title ends the walk before that page's cards are read. An error
/// on the first page propagates; an error after some records were collected
/// ends the walk and returns what was gathered.
pub(super) async fn walk_listing<S: BrowserSession>(
    session: &mut S,
    source_url: &str,
    mut controller: PaginationController,
    selector_timeout: Duration,
) -> Result<Vec<RawRecord>, ScraperError> {
    let mut records: Vec<RawRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut next = NextSignal::None;

    loop {
        let page = controller.current_page() + 1;
        let outcome = extract_page(session, source_url, &controller, next, selector_timeout).await;
        let (title, html) = match outcome {
            Ok(loaded) => loaded,
            Err(e) if records.is_empty() => return Err(e),
            Err(e) => {
                tracing::warn!(page, error = %e, "page extraction failed, keeping earlier pages");
                break;
            }
        };

        if controller.mode() == PageMode::QueryParam && is_invalid_page_title(&title) {
            tracing::debug!(page, title = %title, "not-found page, stopping before extraction");
            break;
        }

        let mut new_records = 0usize;
        for record in extract_listing(&html, session.current_url()) {
            let fresh = match record_key(&record) {
                Some(key) => seen.insert(key),
                None => true,
            };
            if fresh {
                records.push(record);
                new_records += 1;
            }
        }
        next = detect_next_signal(&html);
        tracing::info!(page, new_records, total = records.len(), "listing page extracted");

        let step = controller.record_page(&PageSnapshot {
            title: &title,
            new_records,
            next,
        });
        match step {
            Step::Stop(reason) => {
                tracing::debug!(page, reason = reason.as_str(), "pagination stopped");
                break;
            }
            Step::Advance => tokio::time::sleep(controller.page_delay()).await,
        }
    }

    Ok(records)
}

/// Loads one page and returns its title and markup.
async fn extract_page<S: BrowserSession>(
    session: &mut S,
    source_url: &str,
    controller: &PaginationController,
    previous: NextSignal,
    selector_timeout: Duration,
) -> Result<(String, String), ScraperError> {
    load_page(session, source_url, controller, previous).await?;

    let first_page = controller.current_page() == 0;
    let rendered = session
        .wait_for_selector(LISTING_CONTAINER, selector_timeout)
        .await?;
    if !rendered && first_page {
        return Err(ScraperError::SelectorNotFound {
            selector: LISTING_CONTAINER.to_owned(),
        });
    }

    let title = session.title().await?;
    let html = session.content().await?;
    Ok((title, html))
}
