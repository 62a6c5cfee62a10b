//! Chromium over the DevTools protocol (`chromiumoxide`).
//!
//! Each session owns one browser process and one page. Two background tasks
//! run per session: the protocol handler loop, and a listener recording
//! `Network.responseReceived` events. Both are aborted on close and on drop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::{BrowserLauncher, BrowserOptions, BrowserSession, CapturedResponse};
use crate::error::ScraperError;

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight)";
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

fn automation_error(context: &str, err: impl std::fmt::Display) -> ScraperError {
    ScraperError::Browser(format!("{context}: {err}"))
}

#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    options: BrowserOptions,
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self) -> Result<ChromiumSession, ScraperError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.options.navigation_timeout)
            .window_size(1920, 1080)
            .arg("--disable-gpu")
            .arg("--disable-notifications")
            .arg("--disable-popup-blocking")
            .arg("--disable-infobars")
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", self.options.user_agent));
        if !self.options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ScraperError::BrowserLaunch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScraperError::BrowserLaunch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                let _ = browser.close().await;
                return Err(ScraperError::BrowserLaunch(format!("could not open page: {e}")));
            }
        };

        let captured = Arc::new(Mutex::new(Vec::new()));
        let capture_task = match start_capture(&page, Arc::clone(&captured)).await {
            Ok(task) => task,
            Err(e) => {
                handler_task.abort();
                let _ = browser.close().await;
                return Err(e);
            }
        };

        tracing::debug!(headless = self.options.headless, "chromium session launched");
        Ok(ChromiumSession {
            browser,
            page,
            options: self.options.clone(),
            current_url: String::from("about:blank"),
            captured,
            handler_task,
            capture_task,
            closed: false,
        })
    }
}

/// Enables the network domain and records every response URL with its
/// request id.
async fn start_capture(
    page: &Page,
    captured: Arc<Mutex<Vec<CapturedResponse>>>,
) -> Result<JoinHandle<()>, ScraperError> {
    page.execute(EnableParams::default())
        .await
        .map_err(|e| automation_error("enabling network capture", e))?;
    let mut events = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|e| automation_error("subscribing to network events", e))?;

    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            captured.lock().await.push(CapturedResponse {
                request_id: event.request_id.inner().clone(),
                url: event.response.url.clone(),
            });
        }
    }))
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    options: BrowserOptions,
    current_url: String,
    captured: Arc<Mutex<Vec<CapturedResponse>>>,
    handler_task: JoinHandle<()>,
    capture_task: JoinHandle<()>,
    closed: bool,
}

impl ChromiumSession {
    async fn bounded<T, F>(
        operation: String,
        timeout: Duration,
        fut: F,
    ) -> Result<T, ScraperError>
    where
        F: std::future::Future<Output = Result<T, chromiumoxide::error::CdpError>>,
    {
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result.map_err(|e| automation_error(&operation, e)),
            Err(_) => Err(ScraperError::Timeout { operation, timeout }),
        }
    }

    async fn refresh_url(&mut self) {
        if let Ok(Some(url)) = self.page.url().await {
            self.current_url = url;
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&mut self, url: &str) -> Result<(), ScraperError> {
        let page = self.page.clone();
        Self::bounded(
            format!("navigation to {url}"),
            self.options.navigation_timeout,
            async move {
                page.goto(url).await?;
                Ok(())
            },
        )
        .await?;
        self.current_url = url.to_owned();
        Ok(())
    }

    fn current_url(&self) -> &str {
        &self.current_url
    }

    async fn content(&mut self) -> Result<String, ScraperError> {
        self.page
            .content()
            .await
            .map_err(|e| automation_error("reading page content", e))
    }

    async fn title(&mut self) -> Result<String, ScraperError> {
        self.page
            .get_title()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| automation_error("reading page title", e))
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), ScraperError> {
        self.page
            .evaluate(SCROLL_TO_BOTTOM_JS)
            .await
            .map(|_| ())
            .map_err(|e| automation_error("scrolling", e))
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, ScraperError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, selector: &str) -> Result<(), ScraperError> {
        let element = self.page.find_element(selector).await.map_err(|_| {
            ScraperError::SelectorNotFound {
                selector: selector.to_owned(),
            }
        })?;
        element
            .click()
            .await
            .map_err(|e| automation_error(&format!("clicking {selector}"), e))?;

        // Load-more buttons do not navigate; a bounded wait covers both cases.
        let page = self.page.clone();
        let navigation = Self::bounded(
            format!("navigation after clicking {selector}"),
            self.options.selector_timeout,
            async move {
                page.wait_for_navigation().await?;
                Ok(())
            },
        )
        .await;
        if let Err(e) = navigation {
            tracing::debug!(selector, error = %e, "no navigation after click");
        }
        self.refresh_url().await;
        Ok(())
    }

    async fn captured_responses(&mut self) -> Result<Vec<CapturedResponse>, ScraperError> {
        Ok(self.captured.lock().await.clone())
    }

    async fn response_body(
        &self,
        response: &CapturedResponse,
    ) -> Result<String, ScraperError> {
        let params = GetResponseBodyParams::new(RequestId::new(response.request_id.clone()));
        let reply = self
            .page
            .execute(params)
            .await
            .map_err(|e| automation_error(&format!("reading body of {}", response.url), e))?;
        if reply.result.base64_encoded {
            return Err(ScraperError::Browser(format!(
                "body of {} is binary",
                response.url
            )));
        }
        Ok(reply.result.body.clone())
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.capture_task.abort();
        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| automation_error("closing browser", e));
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "waiting for browser process exit failed");
        }
        self.handler_task.abort();
        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.capture_task.abort();
        self.handler_task.abort();
        if !self.closed {
            // `Browser` kills its child process when dropped.
            tracing::warn!("chromium session dropped without close");
        }
    }
}
