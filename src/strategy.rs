//! Per-target extraction chain.
//!
//! Stages run in order, each one a fallback for the previous:
//! 1. poll the price cascade on the search results page,
//! 2. rank listing candidates against the query and follow the best one,
//! 3. follow the first product link,
//! 4. give up with "Price not found".
//!
//! Poll deadlines are soft and only move the chain to the next stage. Render service
//! failures and panics end the chain with an error outcome. The render context is closed
//! on every exit path.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::Result;
use crate::catalog::Target;
use crate::config::TimingConfig;
use crate::extract::{Extraction, Extractor};
use crate::matcher::pick_best_candidate;
use crate::models::ScrapeOutcome;
use crate::render::RenderService;

pub struct ExtractionChain<'a, S: RenderService> {
    service: &'a S,
    target: &'a Target,
    query: &'a str,
    timings: &'a TimingConfig,
}

impl<'a, S: RenderService> ExtractionChain<'a, S> {
    pub fn new(service: &'a S, target: &'a Target, query: &'a str, timings: &'a TimingConfig) -> Self {
        Self {
            service,
            target,
            query,
            timings,
        }
    }

    /// Runs every stage for the target and always yields an outcome.
    pub async fn run(&self) -> ScrapeOutcome {
        let start_time = std::time::Instant::now();
        let site = &self.target.site;

        let context = match self.service.open(&self.target.search_url).await {
            Ok(context) => context,
            Err(e) => {
                warn!("{}: failed to open {}: {}", site, self.target.search_url, e);
                return ScrapeOutcome::Error;
            }
        };

        let result = AssertUnwindSafe(self.run_stages(&context))
            .catch_unwind()
            .await;
        self.service.close(context).await;

        let outcome = match result {
            Ok(Ok(Some(price))) => ScrapeOutcome::Price(price),
            Ok(Ok(None)) => ScrapeOutcome::NotFound,
            Ok(Err(e)) => {
                warn!("{}: scrape failed: {}", site, e);
                ScrapeOutcome::Error
            }
            Err(_) => {
                warn!("{}: scrape panicked", site);
                ScrapeOutcome::Error
            }
        };

        info!(
            "{}: {} in {}ms",
            site,
            outcome,
            start_time.elapsed().as_millis()
        );
        outcome
    }

    async fn run_stages(&self, context: &S::Context) -> Result<Option<String>> {
        let site = &self.target.site;

        self.service
            .await_complete(context, self.timings.load_timeout())
            .await?;

        if let Some(price) = self
            .poll_price(context, self.timings.direct_deadline())
            .await?
        {
            debug!("{}: price found on search page", site);
            return Ok(Some(price));
        }

        if let Some(price) = self.candidate_fallback(context).await? {
            return Ok(Some(price));
        }

        if let Some(price) = self.link_fallback(context).await? {
            return Ok(Some(price));
        }

        debug!("{}: all stages exhausted", site);
        Ok(None)
    }

    /// Tries the whole price cascade on every poll until a price shows up or the
    /// deadline passes.
    async fn poll_price(&self, context: &S::Context, deadline: Duration) -> Result<Option<String>> {
        let extractor = Extractor::FirstPrice {
            selectors: self.target.price_selectors.clone(),
        };
        let deadline = Instant::now() + deadline;

        while Instant::now() < deadline {
            match self.service.run_extractor(context, &extractor).await? {
                Extraction::Price(Some(price)) => return Ok(Some(price)),
                Extraction::Price(None) => {}
                other => debug!(
                    "{}: ignoring unexpected extraction result {:?}",
                    self.target.site, other
                ),
            }
            tokio::time::sleep(self.timings.poll_interval()).await;
        }

        Ok(None)
    }

    /// Navigates the context to `url`, waits for it to load and polls for a price.
    async fn follow(&self, context: &S::Context, url: &str) -> Result<Option<String>> {
        debug!("{}: following {}", self.target.site, url);
        self.service.navigate(context, url).await?;
        self.service
            .await_complete(context, self.timings.load_timeout())
            .await?;
        self.poll_price(context, self.timings.follow_deadline()).await
    }

    async fn candidate_fallback(&self, context: &S::Context) -> Result<Option<String>> {
        if self.target.title_selectors.is_empty() {
            return Ok(None);
        }

        let extractor = Extractor::Candidates {
            title_selectors: self.target.title_selectors.clone(),
            price_selectors: self.target.price_selectors.clone(),
        };
        let candidates = match self.service.run_extractor(context, &extractor).await? {
            Extraction::Candidates(candidates) => candidates,
            other => {
                debug!(
                    "{}: ignoring unexpected extraction result {:?}",
                    self.target.site, other
                );
                return Ok(None);
            }
        };

        debug!("{}: {} candidates on search page", self.target.site, candidates.len());
        let Some(best) = pick_best_candidate(&candidates, self.query) else {
            return Ok(None);
        };

        if let Some(price) = &best.price {
            debug!("{}: using price listed next to '{}'", self.target.site, best.title);
            return Ok(Some(price.clone()));
        }

        match &best.href {
            Some(href) => self.follow(context, href).await,
            None => Ok(None),
        }
    }

    async fn link_fallback(&self, context: &S::Context) -> Result<Option<String>> {
        if self.target.link_selectors.is_empty() {
            return Ok(None);
        }

        let extractor = Extractor::FirstProductLink {
            link_selectors: self.target.link_selectors.clone(),
        };
        match self.service.run_extractor(context, &extractor).await? {
            Extraction::Link(Some(href)) => self.follow(context, &href).await,
            Extraction::Link(None) => Ok(None),
            other => {
                debug!(
                    "{}: ignoring unexpected extraction result {:?}",
                    self.target.site, other
                );
                Ok(None)
            }
        }
    }
}
