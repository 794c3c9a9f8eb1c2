//! Single-page fetching through a live browser session.
//!
//! Each fetch opens a fresh page, installs resource blocking, navigates
//! with retries, waits for the DOM to settle, and returns the rendered
//! HTML with the main document's HTTP status.

pub mod stability;

use chromiumoxide::cdp::browser_protocol::fetch::{
    self, EventRequestPaused, FailRequestParams, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, EventResponseReceived, ResourceType,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser::BrowserSession;
use crate::config::CrawlConfig;
use crate::error::CrawlError;

use crate::frontier::canonicalize;

const MAX_NAV_ATTEMPTS: u32 = 3;

/// How long to wait for the main document's response event before assuming
/// a 200.
const STATUS_EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A rendered page as returned by a fetcher.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status_code: u16,
    pub html: String,
}

/// Fetches one URL into a [`FetchedPage`]. The coordinator is generic over
/// this so tests substitute a scripted fetcher for the browser.
#[allow(async_fn_in_trait)]
pub trait PageFetch {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, CrawlError>;
}

/// How far navigation waits before the page counts as loaded. Later retry
/// attempts fall back from network-idle to the bare load event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitStrategy {
    NetworkIdle,
    LoadEvent,
}

/// [`PageFetch`] backed by a [`BrowserSession`].
pub struct BrowserFetcher<'a> {
    session: &'a BrowserSession,
    config: CrawlConfig,
}

impl<'a> BrowserFetcher<'a> {
    #[must_use]
    pub fn new(session: &'a BrowserSession, config: CrawlConfig) -> Self {
        Self { session, config }
    }

    /// Tell Chrome to fail requests for the configured resource kinds
    /// before they hit the network.
    async fn block_resources(&self, page: &Page) -> anyhow::Result<Option<JoinHandle<()>>> {
        let patterns: Vec<RequestPattern> = self
            .config
            .blocked_resource_kinds()
            .iter()
            .filter_map(|kind| {
                let resource_type = match kind.as_str() {
                    "image" => ResourceType::Image,
                    "font" => ResourceType::Font,
                    "media" => ResourceType::Media,
                    "stylesheet" | "css" => ResourceType::Stylesheet,
                    "script" => ResourceType::Script,
                    "xhr" => ResourceType::Xhr,
                    "websocket" => ResourceType::WebSocket,
                    other => {
                        warn!(kind = other, "unknown blocked resource kind, ignoring");
                        return None;
                    }
                };
                Some(RequestPattern {
                    url_pattern: Some("*".to_string()),
                    resource_type: Some(resource_type),
                    request_stage: Some(RequestStage::Request),
                })
            })
            .collect();

        if patterns.is_empty() {
            return Ok(None);
        }

        page.execute(fetch::EnableParams {
            patterns: Some(patterns),
            handle_auth_requests: None,
        })
        .await?;

        let mut paused = page.event_listener::<EventRequestPaused>().await?;
        let blocker_page = page.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let fail = FailRequestParams::new(
                    event.request_id.clone(),
                    ErrorReason::BlockedByClient,
                );
                if blocker_page.execute(fail).await.is_err() {
                    break;
                }
            }
        });
        Ok(Some(task))
    }

    /// Navigate once under the given wait strategy, bounded by the page
    /// timeout.
    async fn navigate(
        &self,
        page: &Page,
        url: &str,
        strategy: WaitStrategy,
    ) -> anyhow::Result<()> {
        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            if strategy == WaitStrategy::NetworkIdle {
                // wait_for_navigation resolves on the response, not on the
                // document being ready.
                loop {
                    let state: String = page
                        .evaluate("document.readyState")
                        .await?
                        .into_value()
                        .unwrap_or_default();
                    if state == "complete" {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
            Ok::<(), anyhow::Error>(())
        };
        tokio::time::timeout(self.config.timeout(), navigation)
            .await
            .map_err(|_| anyhow::anyhow!("navigation timed out after {:?}", self.config.timeout()))?
    }
}

impl PageFetch for BrowserFetcher<'_> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, CrawlError> {
        let page = self.session.new_page().await?;
        let result = fetch_on_page(self, &page, url).await;
        if let Err(e) = page.close().await {
            debug!(url, "page close: {e}");
        }
        result
    }
}

async fn fetch_on_page(
    fetcher: &BrowserFetcher<'_>,
    page: &Page,
    url: &str,
) -> Result<FetchedPage, CrawlError> {
    let blocker = fetcher
        .block_resources(page)
        .await
        .map_err(|e| CrawlError::Navigation(format!("{url}: resource blocking: {e:#}")))?;

    // Watch for the main document's response so the real HTTP status comes
    // back with the HTML. Pages that never surface the event (cache hits,
    // in-page rewrites) default to 200.
    let status_code = Arc::new(AtomicU16::new(0));
    let status_task = {
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| CrawlError::Navigation(format!("{url}: response listener: {e}")))?;
        let status_code = Arc::clone(&status_code);
        let target = url.to_string();
        tokio::spawn(async move {
            while let Some(event) = responses.next().await {
                if is_main_document(&event.r#type, &event.response.url, &target) {
                    status_code.store(event.response.status as u16, Ordering::SeqCst);
                    break;
                }
            }
        })
    };

    let mut last_error = None;
    let mut navigated = false;
    for attempt in 0..MAX_NAV_ATTEMPTS {
        // The first retry drops back to the bare load event in case the
        // site never goes network-idle.
        let strategy = if attempt == 1 {
            WaitStrategy::LoadEvent
        } else {
            WaitStrategy::NetworkIdle
        };
        match fetcher.navigate(page, url, strategy).await {
            Ok(()) => {
                tokio::time::sleep(fetcher.config.politeness_delay()).await;
                navigated = true;
                break;
            }
            Err(e) => {
                warn!(url, attempt, error = %format!("{e:#}"), "navigation attempt failed");
                last_error = Some(e);
                tokio::time::sleep(fetcher.config.politeness_delay()).await;
                if attempt + 1 < MAX_NAV_ATTEMPTS {
                    tokio::time::sleep(retry_backoff(attempt)).await;
                }
            }
        }
    }

    if !navigated {
        status_task.abort();
        if let Some(task) = blocker {
            task.abort();
        }
        let detail = last_error
            .map(|e| format!("{e:#}"))
            .unwrap_or_else(|| "navigation failed".to_string());
        return Err(CrawlError::Navigation(format!("{url}: {detail}")));
    }

    // Give the response listener a bounded window to report, then read
    // whatever landed.
    let _ = tokio::time::timeout(STATUS_EVENT_TIMEOUT, status_task).await;
    let status = match status_code.load(Ordering::SeqCst) {
        0 => 200,
        s => s,
    };

    if status >= 400 {
        if let Some(task) = blocker {
            task.abort();
        }
        return Err(CrawlError::Navigation(format!(
            "{url}: HTTP status {status}"
        )));
    }

    stability::wait_for_stable_dom(page).await;

    let html = page
        .content()
        .await
        .map_err(|e| CrawlError::Navigation(format!("{url}: content read: {e}")))?;

    if let Some(task) = blocker {
        task.abort();
    }

    debug!(url, status, bytes = html.len(), "fetched page");
    Ok(FetchedPage {
        url: url.to_string(),
        status_code: status,
        html,
    })
}

/// Whether a response event belongs to the main document being navigated.
///
/// `Document`-type responses cover redirects and Chrome's URL normalization
/// (trailing slashes, percent-encoding); the canonicalized URL comparison is
/// a fallback for events typed otherwise.
fn is_main_document(kind: &ResourceType, event_url: &str, target: &str) -> bool {
    *kind == ResourceType::Document || canonicalize(event_url) == canonicalize(target)
}

/// Delay before retry `attempt + 1`, doubling from one second.
fn retry_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.pow(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_responses_match_regardless_of_url() {
        assert!(is_main_document(
            &ResourceType::Document,
            "https://example.com/final-destination",
            "https://example.com"
        ));
    }

    #[test]
    fn normalized_urls_match_without_document_type() {
        assert!(is_main_document(
            &ResourceType::Other,
            "https://example.com/",
            "https://example.com"
        ));
        assert!(is_main_document(
            &ResourceType::Other,
            "https://example.com/page",
            "https://example.com/page#section"
        ));
    }

    #[test]
    fn subresource_responses_do_not_match() {
        assert!(!is_main_document(
            &ResourceType::Image,
            "https://example.com/logo.png",
            "https://example.com"
        ));
    }

    #[test]
    fn backoff_doubles_from_one_second() {
        assert_eq!(retry_backoff(0), Duration::from_secs(1));
        assert_eq!(retry_backoff(1), Duration::from_secs(2));
    }
}
