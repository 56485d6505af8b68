//! Headless Chrome session management via chromiumoxide.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::{ScrapeConfig, ScrapeError, Session, SessionFactory};

/// Realistic desktop user-agent; headless Chrome's default advertises
/// "HeadlessChrome" which trips basic bot-blocking.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// One isolated Chrome process plus the task draining its CDP events.
///
/// The handler task MUST be aborted once the browser is gone or it runs
/// forever; `close()` does this on the graceful path and `Drop` covers
/// cancelled futures.
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
    settle_delay: Duration,
    closed: bool,
}

impl ChromeSession {
    pub async fn open(config: &ScrapeConfig) -> Result<Self, ScrapeError> {
        let browser_config = BrowserConfig::builder()
            .request_timeout(config.navigation_timeout)
            .window_size(1920, 1080)
            .arg(format!("--user-agent={}", config.user_agent))
            // Container-safe flags: Chrome cannot use its OS-level sandbox
            // inside an unprivileged container, and /dev/shm is tiny there.
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .build()
            .map_err(ScrapeError::Launch)?;

        let (browser, mut cdp_events) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        // chromiumoxide stalls unless the event stream is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = cdp_events.next().await {
                if let Err(e) = event {
                    trace!("CDP handler event error: {e}");
                }
            }
        });

        debug!("Headless Chrome session launched");

        Ok(ChromeSession {
            browser,
            handler,
            navigation_timeout: config.navigation_timeout,
            settle_delay: config.settle_delay,
            closed: false,
        })
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn load(&mut self, url: &str) -> Result<String, ScrapeError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Launch(e.to_string()))?;

        let navigate = async {
            page.goto(url)
                .await
                .map_err(|e| ScrapeError::Navigation(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| ScrapeError::Navigation(e.to_string()))?;
            Ok::<(), ScrapeError>(())
        };

        tokio::time::timeout(self.navigation_timeout, navigate)
            .await
            .map_err(|_| ScrapeError::NavigationTimeout(self.navigation_timeout))??;

        // Settle window for lazy images and SPA hydration.
        tokio::time::sleep(self.settle_delay).await;

        page.content()
            .await
            .map_err(|e| ScrapeError::Content(e.to_string()))
    }

    async fn close(&mut self) {
        self.closed = true;
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {e}");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        debug!("Headless Chrome session closed");
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
        if !self.closed {
            // Cancelled mid-scrape. Browser's own Drop kills the Chrome process.
            warn!("ChromeSession dropped without close(); Chrome process reclaimed");
        }
    }
}

pub struct ChromeSessionFactory {
    config: ScrapeConfig,
}

impl ChromeSessionFactory {
    pub fn new(config: ScrapeConfig) -> Self {
        ChromeSessionFactory { config }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> Result<Box<dyn Session>, ScrapeError> {
        let session = ChromeSession::open(&self.config).await?;
        Ok(Box::new(session))
    }
}
