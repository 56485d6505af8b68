//! Product page scraping: one disposable headless Chrome session per request,
//! bounded concurrency, and a two-tier metadata extraction heuristic.

pub mod extract;
pub mod session;

pub use extract::extract_metadata;
pub use session::{ChromeSession, ChromeSessionFactory};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Semaphore;
use url::Url;

use crate::models::PageMetadata;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("failed to read page content: {0}")]
    Content(String),

    #[error("scrape exceeded the {0:?} wall-clock budget")]
    DeadlineExceeded(Duration),

    #[error("scraper is shut down")]
    Unavailable,
}

#[derive(Clone, Debug)]
pub struct ScrapeConfig {
    /// Hard cap on page navigation (goto + load event).
    pub navigation_timeout: Duration,
    /// Fixed wait after navigation so client-side rendering can populate the
    /// DOM. A heuristic, not a guarantee — extraction may still see a
    /// partially-rendered page.
    pub settle_delay: Duration,
    /// Wall-clock budget for the whole scrape: launch, navigation, settle,
    /// and content read together.
    pub budget: Duration,
    /// Maximum concurrent browser sessions.
    pub max_sessions: usize,
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig {
            navigation_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(1500),
            budget: Duration::from_secs(45),
            max_sessions: 4,
            user_agent: session::DESKTOP_USER_AGENT.to_string(),
        }
    }
}

/// A single disposable rendering context for one URL.
///
/// `load` returns the rendered HTML; `close` must be invoked on every exit
/// path. Implementations are expected to reclaim their OS resources in `Drop`
/// as well, so a cancelled scrape cannot leak a browser process.
#[async_trait]
pub trait Session: Send {
    async fn load(&mut self, url: &str) -> Result<String, ScrapeError>;
    async fn close(&mut self);
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Session>, ScrapeError>;
}

/// Load `url` through `session`, closing the session before the result is
/// propagated — success and failure alike.
pub async fn run_session(
    mut session: Box<dyn Session>,
    url: &str,
) -> Result<String, ScrapeError> {
    let result = session.load(url).await;
    session.close().await;
    result
}

pub struct Scraper {
    factory: Arc<dyn SessionFactory>,
    limiter: Semaphore,
    config: ScrapeConfig,
}

impl Scraper {
    pub fn new(config: ScrapeConfig) -> Self {
        let factory = Arc::new(ChromeSessionFactory::new(config.clone()));
        Self::with_factory(factory, config)
    }

    /// Construct with a custom session factory. Tests inject mocks here.
    pub fn with_factory(factory: Arc<dyn SessionFactory>, config: ScrapeConfig) -> Self {
        let limiter = Semaphore::new(config.max_sessions);
        Scraper {
            factory,
            limiter,
            config,
        }
    }

    /// Scrape `url` and extract best-effort metadata.
    ///
    /// Exactly one browser session per call. Concurrency is bounded by the
    /// session limiter, and the whole scrape runs under a wall-clock budget;
    /// on expiry the session future is dropped and its `Drop` impl reclaims
    /// the browser process.
    pub async fn scrape(&self, url: &str) -> Result<PageMetadata, ScrapeError> {
        // A URL that cannot even be parsed will never navigate; fail it
        // before paying for a browser launch.
        Url::parse(url).map_err(|e| ScrapeError::Navigation(format!("invalid URL: {e}")))?;

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ScrapeError::Unavailable)?;

        tokio::time::timeout(self.config.budget, self.scrape_inner(url))
            .await
            .map_err(|_| ScrapeError::DeadlineExceeded(self.config.budget))?
    }

    async fn scrape_inner(&self, url: &str) -> Result<PageMetadata, ScrapeError> {
        let session = self.factory.open().await?;
        let html = run_session(session, url).await?;
        Ok(extract_metadata(&html))
    }
}
