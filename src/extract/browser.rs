//! Headless browser page extractor
//!
//! Each call launches its own Chromium process with a private profile
//! directory, renders the page, reads the DOM, and shuts the browser down
//! again. Nothing survives between calls, so a crashed or hung page cannot
//! affect the next URL.

use crate::config::ExtractorConfig;
use crate::extract::{
    apply_strategy, ExtractedFields, ExtractionError, ExtractionStrategy, PageExtractor,
};
use async_trait::async_trait;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Private Chromium profile directory, removed on drop
#[derive(Debug)]
struct ProfileDir(PathBuf);

impl ProfileDir {
    fn unique() -> Self {
        Self(std::env::temp_dir().join(format!(
            "bulk-extract-{}-{}",
            std::process::id(),
            SESSION_COUNTER.fetch_add(1, Ordering::Relaxed)
        )))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ProfileDir {
    fn drop(&mut self) {
        remove_profile(&self.0);
    }
}

/// A running browser owned by exactly one extraction
///
/// `close` is the regular release path. If the owning future is dropped
/// before that (for example by a timeout), `Drop` kills the child process
/// and only removes the profile once it has exited.
struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    profile: Option<ProfileDir>,
}

impl BrowserSession {
    async fn launch(config: &ExtractorConfig) -> Result<Self, ExtractionError> {
        let profile = ProfileDir::unique();

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .request_timeout(Duration::from_secs(config.navigation_timeout_secs))
            .args(vec!["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"]);

        builder = if config.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };

        if let Some(executable) = &config.chrome_executable {
            builder = builder.chrome_executable(executable);
        }

        let browser_config = builder
            .build()
            .map_err(|e| ExtractionError::Session(format!("Invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ExtractionError::Session(format!("Failed to launch browser: {}", e)))?;

        // Drive the CDP event loop until the browser goes away
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser: Some(browser),
            handler,
            profile: Some(profile),
        })
    }

    /// Navigates a fresh tab to `url` and returns the rendered HTML
    async fn render(&self, url: &str, timeout: Duration) -> Result<String, ExtractionError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ExtractionError::Session("Browser already closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ExtractionError::Session(format!("Failed to open page: {}", e)))?;

        let navigation = async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            page.content().await
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(Ok(html)) => Ok(html),
            Ok(Err(e)) => Err(navigation_error(url, e)),
            Err(_) => Err(ExtractionError::Timeout { after: timeout }),
        }
    }

    /// Shuts the browser down and removes its profile
    async fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::warn!("Failed to close browser cleanly: {}", e);
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!("Failed to wait for browser exit: {}", e);
            }
        }
        self.handler.abort();
        drop(self.profile.take());
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            tracing::warn!("Browser session dropped before close, killing it");
            self.handler.abort();
            let profile = self.profile.take();

            // Chromium must have exited before its profile can be removed
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(async move {
                        if let Some(Err(e)) = browser.kill().await {
                            tracing::debug!("Failed to kill browser: {}", e);
                        }
                        let _ = browser.wait().await;
                        drop(profile);
                    });
                }
                Err(_) => {
                    drop(browser);
                    drop(profile);
                }
            }
        }
    }
}

fn remove_profile(dir: &Path) {
    if dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(dir) {
            tracing::debug!("Failed to remove browser profile {}: {}", dir.display(), e);
        }
    }
}

fn navigation_error(url: &str, error: CdpError) -> ExtractionError {
    ExtractionError::Navigation {
        url: url.to_string(),
        message: error.to_string(),
    }
}

/// Page extractor that renders every URL in its own headless browser
pub struct BrowserPageExtractor {
    config: ExtractorConfig,
    strategy: Arc<dyn ExtractionStrategy>,
}

impl BrowserPageExtractor {
    pub fn new(config: ExtractorConfig, strategy: Arc<dyn ExtractionStrategy>) -> Self {
        Self { config, strategy }
    }
}

#[async_trait]
impl PageExtractor for BrowserPageExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedFields, ExtractionError> {
        // Reject garbage before paying for a browser launch
        Url::parse(url).map_err(|e| ExtractionError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!("Launching browser for {}", url);
        let mut session = BrowserSession::launch(&self.config).await?;

        let rendered = session
            .render(url, Duration::from_secs(self.config.navigation_timeout_secs))
            .await;
        session.close().await;

        let html = rendered?;
        apply_strategy(self.strategy.as_ref(), &html)
    }

    fn field_names(&self) -> Vec<String> {
        self.strategy.field_names()
    }
}
