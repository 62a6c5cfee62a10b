//! Listing-card extraction from rendered storefront markup.
//!
//! Each field is read through an ordered list of selector alternatives; the
//! first alternative whose element yields non-empty content wins. The
//! selectors target the storefront's current theme markup and are expected to
//! need updating when the theme changes. Update them here, together with the
//! fixtures in `listing_test.rs`.

use std::sync::LazyLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use shelfscan_core::RawRecord;

use crate::attempt::first_match;

/// Selector group matching any listing container, suitable for a
/// wait-for-selector call.
pub const LISTING_CONTAINER: &str = ".product-card, div.hdt-card-product";

/// Where a field's content is read from on the matched element.
#[derive(Debug, Clone, Copy)]
enum Source {
    Text,
    Attr(&'static str),
}

#[derive(Debug)]
struct Alternative {
    selector: Selector,
    source: Source,
}

impl Alternative {
    fn read(&self, card: ElementRef<'_>) -> Option<String> {
        card.select(&self.selector).find_map(|el| {
            let raw = match self.source {
                Source::Text => el.text().collect::<String>(),
                Source::Attr(name) => el.value().attr(name)?.to_owned(),
            };
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
    }
}

fn compile(alternatives: &[(&str, Source)]) -> Vec<Alternative> {
    alternatives
        .iter()
        .map(|&(css, source)| Alternative {
            selector: Selector::parse(css).expect("valid selector"),
            source,
        })
        .collect()
}

/// Container alternatives, tried in order; the first with any match is used
/// for the whole page.
static CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [".product-card", "div.hdt-card-product"]
        .iter()
        .map(|css| Selector::parse(css).expect("valid selector"))
        .collect()
});

static NAME: LazyLock<Vec<Alternative>> = LazyLock::new(|| {
    compile(&[
        (".product-card-title", Source::Text),
        ("a.hdt-card-product__title", Source::Text),
    ])
});

static BRAND: LazyLock<Vec<Alternative>> = LazyLock::new(|| {
    compile(&[
        (".product-card-vendor", Source::Text),
        (".hdt-card-product__vendor", Source::Text),
    ])
});

static PRICE: LazyLock<Vec<Alternative>> = LazyLock::new(|| {
    compile(&[
        (".product-card-price .sale-price", Source::Text),
        (".sale-price", Source::Text),
        (".product-card-price", Source::Text),
    ])
});

static ORIGINAL_PRICE: LazyLock<Vec<Alternative>> = LazyLock::new(|| {
    compile(&[
        (".product-card-price .compare-at-price", Source::Text),
        (".compare-at-price", Source::Text),
    ])
});

static DISCOUNT: LazyLock<Vec<Alternative>> =
    LazyLock::new(|| compile(&[(".product-card-badge.sale", Source::Text)]));

static URL: LazyLock<Vec<Alternative>> = LazyLock::new(|| {
    compile(&[
        ("a.product-card-image-wrapper", Source::Attr("href")),
        ("a.hdt-card-product__title", Source::Attr("href")),
        ("a.product-card-title", Source::Attr("href")),
        ("a", Source::Attr("href")),
    ])
});

static IMAGE: LazyLock<Vec<Alternative>> = LazyLock::new(|| {
    compile(&[
        ("img.product-card-image", Source::Attr("src")),
        ("img", Source::Attr("src")),
        ("img", Source::Attr("data-src")),
    ])
});

fn resolve(card: ElementRef<'_>, alternatives: &[Alternative]) -> Option<String> {
    first_match(alternatives, |alternative| alternative.read(card))
}

/// Rewrites protocol-relative URLs (`//cdn…`) to `https:`.
fn with_scheme(url: String) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url
    }
}

fn absolute_url(href: String, base: Option<&Url>) -> String {
    let href = with_scheme(href);
    match base.and_then(|base| base.join(&href).ok()) {
        Some(joined) => joined.to_string(),
        None => href,
    }
}

/// Returns the listing cards on the page using the first container
/// alternative that matches anything.
fn listing_cards(document: &Html) -> Vec<ElementRef<'_>> {
    first_match(CONTAINERS.iter(), |selector| {
        let cards: Vec<ElementRef<'_>> = document.select(selector).collect();
        (!cards.is_empty()).then_some(cards)
    })
    .unwrap_or_default()
}

fn card_record(card: ElementRef<'_>, base: Option<&Url>) -> Option<RawRecord> {
    let name = resolve(card, &NAME)?;
    let price = resolve(card, &PRICE);
    let original_price = resolve(card, &ORIGINAL_PRICE).or_else(|| price.clone());

    let fields = [
        ("name", Some(name)),
        ("brand", resolve(card, &BRAND)),
        ("price", price),
        ("original_price", original_price),
        ("discount", resolve(card, &DISCOUNT)),
        (
            "url",
            resolve(card, &URL).map(|href| absolute_url(href, base)),
        ),
        ("image_url", resolve(card, &IMAGE).map(with_scheme)),
    ];

    Some(
        fields
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_owned(), Value::String(v))))
            .collect(),
    )
}

/// Extracts one [`RawRecord`] per listing card in `html`.
///
/// Cards without a resolvable name are skipped. Relative product links are
/// resolved against `page_url`.
#[must_use]
pub fn extract_listing(html: &str, page_url: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let cards = listing_cards(&document);

    let records: Vec<RawRecord> = cards
        .iter()
        .filter_map(|card| card_record(*card, base.as_ref()))
        .collect();

    if records.len() < cards.len() {
        tracing::debug!(
            cards = cards.len(),
            records = records.len(),
            page_url,
            "skipped listing cards without a name"
        );
    }
    records
}

#[cfg(test)]
#[path = "listing_test.rs"]
mod tests;
