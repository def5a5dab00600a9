//! Fans a query out to every competitor and gathers one outcome per site.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::catalog::{Target, build_targets, primary_selector};
use crate::config::TimingConfig;
use crate::extract::{Extraction, Extractor};
use crate::models::{CompareRequest, CompareResponse, ScrapeOutcome};
use crate::render::RenderService;
use crate::strategy::ExtractionChain;
use crate::{AppError, Result};

pub const UNSUPPORTED_SITE: &str = "Unsupported site";
pub const PAGE_PRICE_NOT_FOUND: &str = "Price not found!";

/// What a product page says about itself, plus the comparison it triggered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageComparison {
    pub query: String,
    pub current_host: String,
    /// Price shown on the page itself, "Price not found!" or "Unsupported site".
    pub current_price: String,
    pub comparison: CompareResponse,
}

pub struct PriceComparator<S: RenderService> {
    service: Arc<S>,
    timings: TimingConfig,
}

impl<S: RenderService> Clone for PriceComparator<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            timings: self.timings.clone(),
        }
    }
}

impl<S: RenderService> PriceComparator<S> {
    pub fn new(service: Arc<S>, timings: TimingConfig) -> Self {
        Self { service, timings }
    }

    /// Targets that `compare` would dispatch for this request.
    pub fn targets(&self, request: &CompareRequest) -> Vec<Target> {
        build_targets(request.query.trim(), &request.current_host)
    }

    /// Scrapes every target concurrently and waits for all of them. Never fails: a target
    /// that errors or panics shows up as "Error" without affecting the others.
    pub async fn compare(&self, request: &CompareRequest) -> CompareResponse {
        let query = request.query.trim();
        if query.is_empty() {
            warn!("Refusing to compare an empty query");
            return CompareResponse::default();
        }

        let targets = build_targets(query, &request.current_host);
        info!(
            "Comparing '{}' across {} sites (current host: '{}')",
            query,
            targets.len(),
            request.current_host
        );

        let handles: Vec<_> = targets
            .into_iter()
            .map(|target| {
                let site = target.site.clone();
                let service = Arc::clone(&self.service);
                let timings = self.timings.clone();
                let query = query.to_string();

                let handle = tokio::spawn(async move {
                    ExtractionChain::new(service.as_ref(), &target, &query, &timings)
                        .run()
                        .await
                });
                (site, handle)
            })
            .collect();

        let outcomes = join_all(handles.into_iter().map(|(site, handle)| async move {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("{}: scrape task failed: {}", site, e);
                    ScrapeOutcome::Error
                }
            };
            (site, outcome)
        }))
        .await;

        CompareResponse::from_outcomes(outcomes)
    }

    /// Reads a product page, works out what it is selling and compares it against the
    /// other retailers. `selection` takes priority over anything found on the page.
    pub async fn compare_page(&self, url: &str, selection: Option<&str>) -> Result<PageComparison> {
        let context = self.service.open(url).await?;
        let inspected = self.inspect_page(&context, selection).await;
        self.service.close(context).await;

        let (query, current_host, current_price) = inspected?;
        let query = query.ok_or(AppError::NoQuery)?;

        let comparison = self
            .compare(&CompareRequest::new(query.clone(), current_host.clone()))
            .await;

        Ok(PageComparison {
            query,
            current_host,
            current_price,
            comparison,
        })
    }

    async fn inspect_page(
        &self,
        context: &S::Context,
        selection: Option<&str>,
    ) -> Result<(Option<String>, String, String)> {
        self.service
            .await_complete(context, self.timings.load_timeout())
            .await?;

        let location = Url::parse(&self.service.current_url(context).await?)?;
        let host = location.host_str().unwrap_or_default().to_string();

        let query = match selection.map(str::trim).filter(|s| !s.is_empty()) {
            Some(selected) => Some(selected.to_string()),
            None => match self
                .service
                .run_extractor(context, &Extractor::ProductQuery)
                .await?
            {
                Extraction::Text(text) => text,
                _ => None,
            },
        };

        let current_price = match primary_selector(&host) {
            None => UNSUPPORTED_SITE.to_string(),
            Some(selector) => {
                let extractor = Extractor::PagePrice {
                    selector: selector.to_string(),
                };
                match self.service.run_extractor(context, &extractor).await? {
                    Extraction::Text(Some(price)) => price,
                    _ => PAGE_PRICE_NOT_FOUND.to_string(),
                }
            }
        };

        Ok((query, host, current_price))
    }
}
