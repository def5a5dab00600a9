// Integration tests for price-scout
// These run the extraction chain and the comparator against an in-memory render service

pub mod strategy_tests;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

use price_scout::catalog::{SITE_CATALOG, Target, build_targets};
use price_scout::config::TimingConfig;
use price_scout::extract::{Extraction, Extractor};
use price_scout::{AppError, RenderService};

pub const EMPTY_PAGE: &str = "<html><head><title></title></head><body></body></html>";

/// Timings shrunk so a full chain finishes in well under a second.
pub fn fast_timings() -> TimingConfig {
    TimingConfig {
        load_timeout_ms: 200,
        load_check_interval_ms: 5,
        poll_interval_ms: 5,
        direct_deadline_ms: 60,
        follow_deadline_ms: 40,
    }
}

/// Search URL the catalog builds for `site` and `query`.
pub fn search_url(site: &str, query: &str) -> String {
    SITE_CATALOG
        .iter()
        .find(|spec| spec.site == site)
        .map(|spec| spec.search_url_for(query))
        .expect("site should be in the catalog")
}

pub fn target(site: &str, query: &str) -> Target {
    build_targets(query, "")
        .into_iter()
        .find(|target| target.site == site)
        .expect("site should be in the catalog")
}

pub struct FakeContext {
    url: Mutex<String>,
    polls: AtomicUsize,
}

/// Render service that serves canned HTML by exact URL.
///
/// A URL can carry a sequence of snapshots; each extraction advances through them and the
/// last one sticks, which is how late-rendering prices are simulated. Unknown URLs render
/// an empty document.
#[derive(Default)]
pub struct FakeRenderService {
    pages: HashMap<String, Vec<String>>,
    failing_open: Vec<String>,
    failing_extract: Vec<String>,
    stalled: Vec<String>,
    panicking: Vec<String>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    navigations: Mutex<Vec<String>>,
}

impl FakeRenderService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.snapshots(url, vec![html.into()])
    }

    pub fn snapshots(mut self, url: impl Into<String>, html: Vec<String>) -> Self {
        self.pages.insert(url.into(), html);
        self
    }

    /// Opening any URL containing `fragment` fails.
    pub fn failing_open(mut self, fragment: &str) -> Self {
        self.failing_open.push(fragment.to_string());
        self
    }

    /// Extraction fails on any URL containing `fragment`.
    pub fn failing_extract(mut self, fragment: &str) -> Self {
        self.failing_extract.push(fragment.to_string());
        self
    }

    /// Loads of any URL containing `fragment` never complete.
    pub fn stalled(mut self, fragment: &str) -> Self {
        self.stalled.push(fragment.to_string());
        self
    }

    /// Extraction panics on any URL containing `fragment`.
    pub fn panicking(mut self, fragment: &str) -> Self {
        self.panicking.push(fragment.to_string());
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    fn matches(fragments: &[String], url: &str) -> bool {
        fragments.iter().any(|fragment| url.contains(fragment.as_str()))
    }

    fn snapshot(&self, context: &FakeContext, url: &str) -> String {
        let poll = context.polls.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(url) {
            Some(snapshots) if !snapshots.is_empty() => {
                snapshots[poll.min(snapshots.len() - 1)].clone()
            }
            _ => EMPTY_PAGE.to_string(),
        }
    }
}

#[async_trait]
impl RenderService for FakeRenderService {
    type Context = FakeContext;

    async fn open(&self, url: &str) -> price_scout::Result<FakeContext> {
        if Self::matches(&self.failing_open, url) {
            return Err(AppError::render("open", "connection refused"));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeContext {
            url: Mutex::new(url.to_string()),
            polls: AtomicUsize::new(0),
        })
    }

    async fn await_complete(&self, context: &FakeContext, timeout: Duration) -> price_scout::Result<()> {
        let url = context.url.lock().unwrap().clone();
        if Self::matches(&self.stalled, &url) {
            tokio::time::sleep(timeout).await;
            return Err(AppError::LoadTimeout {
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn run_extractor(
        &self,
        context: &FakeContext,
        extractor: &Extractor,
    ) -> price_scout::Result<Extraction> {
        let url = context.url.lock().unwrap().clone();
        if Self::matches(&self.panicking, &url) {
            panic!("renderer crashed on {}", url);
        }
        if Self::matches(&self.failing_extract, &url) {
            return Err(AppError::render("extract", "context was discarded"));
        }

        let html = self.snapshot(context, &url);
        let location = Url::parse(&url)?;
        Ok(extractor.run_on_html(&html, &location))
    }

    async fn navigate(&self, context: &FakeContext, url: &str) -> price_scout::Result<()> {
        self.navigations.lock().unwrap().push(url.to_string());
        *context.url.lock().unwrap() = url.to_string();
        context.polls.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn current_url(&self, context: &FakeContext) -> price_scout::Result<String> {
        Ok(context.url.lock().unwrap().clone())
    }

    async fn close(&self, _context: FakeContext) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
