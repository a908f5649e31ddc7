//! Seam for the page-rendering engine.
//!
//! The pipeline never talks to a browser driver directly; it asks a
//! `Renderer` for the final markup of a URL. The default implementation is a
//! plain HTTP fetch, which is enough for the listing and detail surfaces this
//! pipeline reads. A headless-browser implementation plugs in behind the same
//! trait without touching extraction code.
//!
//! Renderer instances are not shared across concurrent tasks: each pipeline
//! worker owns exactly one for the duration of its task stream.

use crate::fetcher::{self, FetchError, PageResponse};
use async_trait::async_trait;
use reqwest::Client;

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigate to `url` and return the rendered page.
    async fn render(&self, url: &str) -> Result<PageResponse, FetchError>;
}

/// HTTP-backed renderer with a dedicated client per instance.
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new() -> Self {
        Self {
            client: fetcher::client::build_client(),
        }
    }
}

impl Default for HttpRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<PageResponse, FetchError> {
        fetcher::fetch_page_with(&self.client, url).await
    }
}
