use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use super::RenderService;
use crate::config::{ScraperConfig, TimingConfig};
use crate::extract::{Extraction, Extractor};
use crate::{AppError, Result};

/// Render service backed by a local headless Chrome. Each context is a background tab.
pub struct ChromeRenderService {
    browser: Arc<Browser>,
    config: ScraperConfig,
    load_check_interval: Duration,
}

/// headless_chrome is synchronous; run its calls on the blocking pool.
async fn blocking<T, F>(operation: &str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("{} task failed: {}", operation, e)))?
}

impl ChromeRenderService {
    pub fn new(config: ScraperConfig, timings: &TimingConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false) // Often needed in containerized environments
            .window_size(Some((config.window_width, config.window_height)))
            .idle_browser_timeout(Duration::from_secs(config.idle_browser_timeout))
            .args(vec![
                std::ffi::OsStr::new("--no-sandbox"),
                std::ffi::OsStr::new("--disable-dev-shm-usage"),
                std::ffi::OsStr::new("--disable-gpu"),
                std::ffi::OsStr::new("--disable-extensions"),
                // Background tabs must keep rendering while we poll them
                std::ffi::OsStr::new("--disable-background-timer-throttling"),
                std::ffi::OsStr::new("--disable-backgrounding-occluded-windows"),
                std::ffi::OsStr::new("--disable-renderer-backgrounding"),
            ])
            .build()
            .map_err(|e| AppError::render("launch", e))?;

        // Set Chrome path if provided
        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options).map_err(|e| AppError::render("launch", e))?;

        Ok(Self {
            browser: Arc::new(browser),
            config,
            load_check_interval: timings.load_check_interval(),
        })
    }

    async fn ready_state(&self, tab: &Arc<Tab>) -> Option<String> {
        let tab = Arc::clone(tab);
        let state = blocking("readyState", move || {
            tab.evaluate("document.readyState", false)
                .map_err(|e| AppError::render("evaluate", e))
        })
        .await;

        match state {
            Ok(object) => object
                .value
                .and_then(|value| value.as_str().map(str::to_string)),
            // The document is swapped out mid-navigation; not complete yet
            Err(e) => {
                debug!("readyState check failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl RenderService for ChromeRenderService {
    type Context = Arc<Tab>;

    async fn open(&self, url: &str) -> Result<Self::Context> {
        let browser = Arc::clone(&self.browser);
        let user_agent = self.config.user_agent.clone();
        let url = url.to_string();

        blocking("open", move || {
            let tab = browser.new_tab().map_err(|e| AppError::render("open", e))?;

            let prepared = tab
                .set_user_agent(&user_agent, None, None)
                .map_err(|e| AppError::render("set user agent", e))
                .and_then(|_| {
                    tab.navigate_to(&url)
                        .map(|_| ())
                        .map_err(|e| AppError::render("navigate", e))
                });

            if let Err(e) = prepared {
                let _ = tab.close(true);
                return Err(e);
            }
            Ok(tab)
        })
        .await
    }

    async fn await_complete(&self, context: &Self::Context, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        // Let any in-flight navigation settle so a stale "complete" from the previous
        // document is not picked up
        let tab = Arc::clone(context);
        let settle = tokio::task::spawn_blocking(move || {
            tab.set_default_timeout(timeout);
            tab.wait_until_navigated().map(|_| ())
        });
        match tokio::time::timeout(timeout, settle).await {
            Err(_) => {
                return Err(AppError::LoadTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            Ok(Err(e)) => return Err(AppError::Internal(format!("load wait task failed: {}", e))),
            Ok(Ok(Err(e))) => debug!("wait_until_navigated failed, polling readyState: {}", e),
            Ok(Ok(Ok(()))) => {}
        }

        loop {
            if self.ready_state(context).await.as_deref() == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(AppError::LoadTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.load_check_interval).await;
        }
    }

    async fn run_extractor(
        &self,
        context: &Self::Context,
        extractor: &Extractor,
    ) -> Result<Extraction> {
        let tab = Arc::clone(context);
        let extractor = extractor.clone();

        blocking("extract", move || {
            let html = tab
                .get_content()
                .map_err(|e| AppError::render("get content", e))?;
            let location = Url::parse(&tab.get_url())?;
            Ok(extractor.run_on_html(&html, &location))
        })
        .await
    }

    async fn navigate(&self, context: &Self::Context, url: &str) -> Result<()> {
        let tab = Arc::clone(context);
        let url = url.to_string();

        blocking("navigate", move || {
            tab.navigate_to(&url)
                .map(|_| ())
                .map_err(|e| AppError::render("navigate", e))
        })
        .await
    }

    async fn current_url(&self, context: &Self::Context) -> Result<String> {
        let tab = Arc::clone(context);
        blocking("current url", move || Ok(tab.get_url())).await
    }

    async fn close(&self, context: Self::Context) {
        let result = blocking("close", move || {
            context
                .close(true)
                .map(|_| ())
                .map_err(|e| AppError::render("close", e))
        })
        .await;

        if let Err(e) = result {
            warn!("Failed to close render context: {}", e);
        }
    }
}
