//! Boundary to the page-rendering service.
//!
//! The engine never fetches HTML itself. It asks a [`RenderService`] to load a URL in an
//! isolated context, wait for it to finish loading and run extraction functions against
//! the rendered document.

use async_trait::async_trait;
use std::time::Duration;

use crate::Result;
use crate::extract::{Extraction, Extractor};

pub mod chrome;

pub use chrome::ChromeRenderService;

#[async_trait]
pub trait RenderService: Send + Sync + 'static {
    /// Handle to one isolated, non-foreground rendering context.
    type Context: Send + Sync;

    /// Starts loading `url` in a new context.
    async fn open(&self, url: &str) -> Result<Self::Context>;

    /// Resolves once the context's document has finished loading. Fails with
    /// [`crate::AppError::LoadTimeout`] when `timeout` elapses first.
    async fn await_complete(&self, context: &Self::Context, timeout: Duration) -> Result<()>;

    /// Runs `extractor` against the top-level document currently loaded in the context.
    async fn run_extractor(
        &self,
        context: &Self::Context,
        extractor: &Extractor,
    ) -> Result<Extraction>;

    /// Points the context at a new URL. Any earlier completion state is stale afterwards.
    async fn navigate(&self, context: &Self::Context, url: &str) -> Result<()>;

    /// Location of the document currently loaded in the context.
    async fn current_url(&self, context: &Self::Context) -> Result<String>;

    /// Releases the context. Best effort: failures are logged and swallowed.
    async fn close(&self, context: Self::Context);
}
