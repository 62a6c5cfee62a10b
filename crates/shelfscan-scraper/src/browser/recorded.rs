//! Replay browser over fixed markup snapshots.
//!
//! Navigation to a URL with no recorded page lands on a synthetic
//! "404 Not Found" page, the way a storefront answers an out-of-range
//! `?page=N`. Clicking a control follows an explicitly recorded transition,
//! or the control's `href` when it is a link.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use scraper::{Html, Selector};
use tokio::sync::Mutex;

use super::{BrowserLauncher, BrowserSession, CapturedResponse};
use crate::error::ScraperError;

const NOT_FOUND_TITLE: &str = "404 Not Found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPage {
    pub title: String,
    pub html: String,
}

impl RecordedPage {
    #[must_use]
    pub fn new(title: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            html: html.into(),
        }
    }

    fn not_found() -> Self {
        Self::new(NOT_FOUND_TITLE, "<html><body><h1>Page not found</h1></body></html>")
    }
}

/// What happened during replay, shared between the launcher and every
/// session it opened.
#[derive(Debug, Default, Clone)]
pub struct SessionLog {
    pub launches: u32,
    pub closes: u32,
    /// Every URL loaded, by navigation or by click, in order.
    pub visited: Vec<String>,
    /// Number of `content()` calls, i.e. page extractions.
    pub content_reads: u32,
    pub scrolls: u32,
    pub clicks: Vec<String>,
}

#[derive(Debug, Default, Clone)]
struct Site {
    pages: HashMap<String, RecordedPage>,
    /// `(page url, selector)` → destination url.
    transitions: HashMap<(String, String), String>,
    responses: Vec<(CapturedResponse, String)>,
}

/// Launcher over a recorded site.
#[derive(Debug, Clone, Default)]
pub struct RecordedBrowser {
    site: Arc<Site>,
    log: Arc<Mutex<SessionLog>>,
    launch_error: Option<String>,
}

impl RecordedBrowser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn site_mut(&mut self) -> &mut Site {
        Arc::make_mut(&mut self.site)
    }

    /// Records the page served at `url`.
    #[must_use]
    pub fn with_page(mut self, url: &str, page: RecordedPage) -> Self {
        self.site_mut().pages.insert(url.to_owned(), page);
        self
    }

    /// Records that clicking `selector` on `from` loads `to`.
    #[must_use]
    pub fn with_transition(mut self, from: &str, selector: &str, to: &str) -> Self {
        self.site_mut()
            .transitions
            .insert((from.to_owned(), selector.to_owned()), to.to_owned());
        self
    }

    /// Records a network response observed while pages load.
    #[must_use]
    pub fn with_response(mut self, url: &str, body: &str) -> Self {
        let site = self.site_mut();
        let request_id = format!("req-{}", site.responses.len() + 1);
        site.responses.push((
            CapturedResponse {
                request_id,
                url: url.to_owned(),
            },
            body.to_owned(),
        ));
        self
    }

    /// Makes every launch fail with [`ScraperError::BrowserLaunch`].
    #[must_use]
    pub fn failing_launch(mut self, reason: &str) -> Self {
        self.launch_error = Some(reason.to_owned());
        self
    }

    /// Snapshot of everything the sessions did so far.
    pub async fn log(&self) -> SessionLog {
        self.log.lock().await.clone()
    }
}

#[async_trait]
impl BrowserLauncher for RecordedBrowser {
    type Session = RecordedSession;

    async fn launch(&self) -> Result<RecordedSession, ScraperError> {
        if let Some(reason) = &self.launch_error {
            return Err(ScraperError::BrowserLaunch(reason.clone()));
        }
        self.log.lock().await.launches += 1;
        Ok(RecordedSession {
            site: Arc::clone(&self.site),
            log: Arc::clone(&self.log),
            current_url: String::from("about:blank"),
            current: RecordedPage::new("", "<html></html>"),
            closed: false,
        })
    }
}

/// One replay session.
#[derive(Debug)]
pub struct RecordedSession {
    site: Arc<Site>,
    log: Arc<Mutex<SessionLog>>,
    current_url: String,
    current: RecordedPage,
    closed: bool,
}

impl RecordedSession {
    fn ensure_open(&self) -> Result<(), ScraperError> {
        if self.closed {
            Err(ScraperError::Browser("session already closed".to_owned()))
        } else {
            Ok(())
        }
    }

    async fn load(&mut self, url: &str) {
        self.current = self
            .site
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(RecordedPage::not_found);
        self.current_url = url.to_owned();
        self.log.lock().await.visited.push(url.to_owned());
    }

    fn matches(&self, selector: &str) -> Result<bool, ScraperError> {
        let parsed = Selector::parse(selector).map_err(|e| {
            ScraperError::Browser(format!("invalid selector \"{selector}\": {e}"))
        })?;
        Ok(Html::parse_document(&self.current.html)
            .select(&parsed)
            .next()
            .is_some())
    }

    fn href_of(&self, selector: &str) -> Option<String> {
        let parsed = Selector::parse(selector).ok()?;
        let document = Html::parse_document(&self.current.html);
        let href = document.select(&parsed).next()?.value().attr("href")?;
        Url::parse(&self.current_url)
            .ok()
            .and_then(|base| base.join(href).ok())
            .map(|url| url.to_string())
            .or_else(|| Some(href.to_owned()))
    }
}

#[async_trait]
impl BrowserSession for RecordedSession {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError> {
        self.ensure_open()?;
        self.load(url).await;
        Ok(())
    }

    fn current_url(&self) -> &str {
        &self.current_url
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        self.ensure_open()?;
        self.log.lock().await.content_reads += 1;
        Ok(self.current.html.clone())
    }

    async fn title(&mut self) -> Result<String, ScraperError> {
        self.ensure_open()?;
        Ok(self.current.title.clone())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), ScraperError> {
        self.ensure_open()?;
        self.log.lock().await.scrolls += 1;
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<bool, ScraperError> {
        self.ensure_open()?;
        self.matches(selector)
    }

    async fn click(&mut self, selector: &str) -> Result<(), ScraperError> {
        self.ensure_open()?;
        if !self.matches(selector)? {
            return Err(ScraperError::SelectorNotFound {
                selector: selector.to_owned(),
            });
        }
        self.log.lock().await.clicks.push(selector.to_owned());

        let key = (self.current_url.clone(), selector.to_owned());
        let destination = self
            .site
            .transitions
            .get(&key)
            .cloned()
            .or_else(|| self.href_of(selector));
        if let Some(url) = destination {
            self.load(&url).await;
        }
        Ok(())
    }

    async fn captured_responses(&mut self) -> Result<Vec<CapturedResponse>, ScraperError> {
        self.ensure_open()?;
        Ok(self
            .site
            .responses
            .iter()
            .map(|(response, _)| response.clone())
            .collect())
    }

    async fn response_body(
        &self,
        response: &CapturedResponse,
    ) -> Result<String, ScraperError> {
        self.ensure_open()?;
        self.site
            .responses
            .iter()
            .find(|(captured, _)| captured.request_id == response.request_id)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| {
                ScraperError::Browser(format!("no body recorded for {}", response.url))
            })
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        if !self.closed {
            self.closed = true;
            self.log.lock().await.closes += 1;
        }
        Ok(())
    }
}
