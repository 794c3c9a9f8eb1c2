//! Browser session lifecycle.
//!
//! Wraps a single headless Chromium instance: launch with anti-detection
//! arguments, drive the CDP message loop on a background task, hand out
//! pages, and tear everything down once per session.

pub mod stealth;

use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, trace};

use crate::config::CrawlConfig;
use crate::error::CrawlError;

/// A running browser plus its CDP handler task. Created once per crawl and
/// shared by every page fetch in that crawl.
pub struct BrowserSession {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
}

impl BrowserSession {
    /// Launch a browser configured for crawling. Failure here is fatal for
    /// the whole crawl.
    pub async fn start(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let mut builder = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .window_size(1920, 1080)
            .arg(format!("--user-agent={}", config.user_agent()))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--disable-background-networking")
            .arg("--disable-background-timer-throttling")
            .arg("--disable-backgrounding-occluded-windows")
            .arg("--disable-breakpad")
            .arg("--disable-hang-monitor")
            .arg("--disable-ipc-flooding-protection")
            .arg("--disable-prompt-on-repost")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--metrics-recording-only")
            .arg("--password-store=basic")
            .arg("--use-mock-keychain")
            .arg("--hide-scrollbars")
            .arg("--mute-audio");

        if config.headless() {
            builder = builder.headless_mode(HeadlessMode::default());
        } else {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| CrawlError::Session(format!("browser config: {e}")))?;

        info!("launching browser session");
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CrawlError::Session(format!("browser launch: {e}")))?;

        let handler_task = task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let message = e.to_string();
                    // Chrome emits CDP events chromiumoxide can't deserialize;
                    // those are noise, not faults.
                    let benign = message
                        .contains("data did not match any variant of untagged enum Message")
                        || message.contains("Failed to deserialize WS response");
                    if benign {
                        trace!("suppressed CDP serialization error: {message}");
                    } else {
                        error!("browser handler error: {e:?}");
                    }
                }
            }
            debug!("browser handler task completed");
        });

        Ok(Self {
            browser: Some(browser),
            handler: Some(handler_task),
        })
    }

    /// Open a blank page with stealth overrides pre-installed.
    pub async fn new_page(&self) -> Result<Page, CrawlError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| CrawlError::Session("browser session already stopped".into()))?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlError::Session(format!("new page: {e}")))?;
        stealth::install(&page)
            .await
            .map_err(|e| CrawlError::Session(format!("stealth install: {e}")))?;
        Ok(page)
    }

    /// Close the browser and stop the handler task. Safe to call more than
    /// once.
    pub async fn stop(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                debug!("browser close: {e}");
            }
            let _ = browser.wait().await;
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        info!("browser session stopped");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}
