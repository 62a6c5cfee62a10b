//! Multi-page traversal decisions for the browser backends.
//!
//! Storefront listings page in one of two ways:
//!
//! - **Controls**: the rendered page carries a "next" link or, failing that, a
//!   "load more" button. A next link that is present but disabled means the
//!   last page has been reached, even if a load-more button also exists.
//! - **Query parameter**: pages are addressed as `?page=N`. There is no
//!   control to inspect, so a not-found title or an empty page is the only
//!   end-of-listing signal.
//!
//! [`PaginationController`] holds no browser state; the backend feeds it one
//! [`PageSnapshot`] per extracted page and acts on the returned [`Step`].

use std::time::Duration;

use scraper::{ElementRef, Html, Selector};

use crate::attempt::first_match;

/// Explicit next-page link.
pub const NEXT_CONTROL: &str = "a.pagination__item--next";

/// Infinite-scroll style button that appends the next page in place.
pub const LOAD_MORE: &str = "button.load-more";

/// How the page after the current one can be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextSignal {
    NextControl(&'static str),
    LoadMore(&'static str),
    None,
}

impl NextSignal {
    /// The selector to click, if any.
    #[must_use]
    pub fn selector(self) -> Option<&'static str> {
        match self {
            NextSignal::NextControl(selector) | NextSignal::LoadMore(selector) => Some(selector),
            NextSignal::None => None,
        }
    }
}

/// `aria-disabled="true"`, a `disabled` attribute, or a `disabled` /
/// `…--disabled` class.
fn is_disabled(el: ElementRef<'_>) -> bool {
    let value = el.value();
    value
        .attr("aria-disabled")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
        || value.attr("disabled").is_some()
        || value
            .classes()
            .any(|class| class == "disabled" || class.ends_with("--disabled"))
}

/// Inspects rendered markup for a way to reach the next page.
///
/// Controls are checked in priority order: the next link first, then the
/// load-more button. The first control found decides the outcome, so a
/// disabled next link yields [`NextSignal::None`] without consulting the
/// load-more button.
#[must_use]
pub fn detect_next_signal(html: &str) -> NextSignal {
    let document = Html::parse_document(html);
    let controls = [
        (NEXT_CONTROL, NextSignal::NextControl(NEXT_CONTROL)),
        (LOAD_MORE, NextSignal::LoadMore(LOAD_MORE)),
    ];

    first_match(controls, |(css, signal)| {
        let selector = Selector::parse(css).ok()?;
        let control = document.select(&selector).next()?;
        Some(if is_disabled(control) {
            NextSignal::None
        } else {
            signal
        })
    })
    .unwrap_or(NextSignal::None)
}

/// Returns `true` when a page title indicates the requested page does not
/// exist.
#[must_use]
pub fn is_invalid_page_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    lower.contains("page not found") || lower.contains("404")
}

/// Appends a `page` query parameter to `url`.
#[must_use]
pub fn page_url(url: &str, page: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}page={page}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    Controls,
    QueryParam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    BudgetReached,
    NoNextPage,
    ConsecutiveEmpty,
    InvalidPage,
}

impl StopReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::BudgetReached => "budget_reached",
            StopReason::NoNextPage => "no_next_page",
            StopReason::ConsecutiveEmpty => "consecutive_empty",
            StopReason::InvalidPage => "invalid_page",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Advance,
    Stop(StopReason),
}

/// What the backend observed on the page it just extracted.
#[derive(Debug, Clone, Copy)]
pub struct PageSnapshot<'a> {
    pub title: &'a str,
    /// Records on this page not already seen on an earlier page.
    pub new_records: usize,
    pub next: NextSignal,
}

/// Two empty pages in a row end traversal.
const MAX_CONSECUTIVE_EMPTY: u32 = 2;

#[derive(Debug, Clone)]
pub struct PaginationController {
    mode: PageMode,
    page_budget: u32,
    page_delay: Duration,
    current_page: u32,
    consecutive_empty: u32,
}

impl PaginationController {
    /// A zero budget is raised to one: the first page is always extracted.
    #[must_use]
    pub fn new(mode: PageMode, page_budget: u32, page_delay: Duration) -> Self {
        Self {
            mode,
            page_budget: page_budget.max(1),
            page_delay,
            current_page: 0,
            consecutive_empty: 0,
        }
    }

    /// Number of pages recorded so far.
    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    #[must_use]
    pub fn mode(&self) -> PageMode {
        self.mode
    }

    /// Politeness delay to apply before loading the next page.
    #[must_use]
    pub fn page_delay(&self) -> Duration {
        self.page_delay
    }

    /// Records one extracted page and decides whether to continue.
    ///
    /// Stop conditions are checked in this order: invalid page (query mode
    /// only), consecutive empty pages, page budget, missing next signal
    /// (controls mode only).
    pub fn record_page(&mut self, snapshot: &PageSnapshot<'_>) -> Step {
        self.current_page += 1;

        if self.mode == PageMode::QueryParam
            && (is_invalid_page_title(snapshot.title) || snapshot.new_records == 0)
        {
            return Step::Stop(StopReason::InvalidPage);
        }

        if snapshot.new_records == 0 {
            self.consecutive_empty += 1;
            if self.consecutive_empty >= MAX_CONSECUTIVE_EMPTY {
                return Step::Stop(StopReason::ConsecutiveEmpty);
            }
        } else {
            self.consecutive_empty = 0;
        }

        if self.current_page >= self.page_budget {
            return Step::Stop(StopReason::BudgetReached);
        }

        match (self.mode, snapshot.next) {
            (PageMode::Controls, NextSignal::None) => Step::Stop(StopReason::NoNextPage),
            _ => Step::Advance,
        }
    }
}
