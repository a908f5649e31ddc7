//! Image asset storage and content rewriting.
//!
//! Body markup references images through the lazy-load `data-src` attribute;
//! each remote reference is downloaded, written under the configured asset
//! directory as `<15-char-id>.<ext>`, and the reference text is swapped for
//! the web-relative local path. Posters go through the same download path
//! but are bare URLs, not markup.

use crate::config::Config;
use crate::fetcher::{self, FetchError};
use crate::pipeline::backoff::calculate_backoff_delay;
use rand::{Rng, distributions::Alphanumeric};
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const ID_LENGTH: usize = 15;
/// `wx_fmt=1` is the platform's "unspecified" sentinel.
const FORMAT_SENTINEL: &str = "1";
const FALLBACK_EXTENSION: &str = "png";

static LAZY_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]+data-src="(http[^"]+)""#).unwrap());

static FORMAT_HINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"wx_fmt=(\w+)").unwrap());

#[derive(Error, Debug)]
pub enum AssetError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("could not write asset: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,
}

/// Counters for one rewrite pass, folded into the run report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub stored: usize,
    pub skipped: usize,
}

/// Downloads remote images and rewrites references to local paths.
#[derive(Clone)]
pub struct ImageStore {
    dir: PathBuf,
    url_prefix: String,
    pacing: Duration,
    retries: u32,
}

impl ImageStore {
    pub fn new(
        dir: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
        pacing: Duration,
        retries: u32,
    ) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
            pacing,
            retries: retries.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.image_dir(),
            config.image_url_prefix(),
            Duration::from_millis(config.image_pacing_ms()),
            config.fetch_retries(),
        )
    }

    /// Rewrite every remote lazy-image reference in `content` to a locally
    /// stored asset. Downloads fan out under `budget`, which is the image
    /// concurrency limit shared across the whole run (distinct from the
    /// page-fetch budget). A failed download skips that image and leaves the
    /// original reference in place, counted in the outcome.
    pub async fn rewrite_content(
        &self,
        content: String,
        budget: Arc<Semaphore>,
        cancel: CancellationToken,
    ) -> (String, RewriteOutcome) {
        let urls = extract_remote_image_urls(&content);
        if urls.is_empty() {
            return (content, RewriteOutcome::default());
        }

        let mut downloads = JoinSet::new();
        for url in urls.clone() {
            let store = self.clone();
            let budget = budget.clone();
            let cancel = cancel.clone();
            downloads.spawn(async move {
                let Ok(_permit) = budget.acquire().await else {
                    return (url, Err(AssetError::Cancelled));
                };
                let result = store.store_asset(&url, &cancel).await;
                (url, result)
            });
        }

        let mut results: HashMap<String, Result<String, AssetError>> = HashMap::new();
        while let Some(joined) = downloads.join_next().await {
            if let Ok((url, result)) = joined {
                results.insert(url, result);
            }
        }

        let mut content = content;
        let mut outcome = RewriteOutcome::default();
        for url in urls {
            match results.remove(&url) {
                Some(Ok(local_path)) => {
                    // Only the first two textual occurrences are replaced.
                    // Known quirk carried over from the legacy pipeline: a
                    // reference appearing a third time keeps its remote URL.
                    content = content.replacen(&url, &local_path, 2);
                    outcome.stored += 1;
                }
                Some(Err(e)) => {
                    warn!(url = %url, error = %e, "skipping image");
                    outcome.skipped += 1;
                }
                None => outcome.skipped += 1,
            }
        }
        (content, outcome)
    }

    /// Store a single poster URL and return its local web path. An empty
    /// input is a no-op, not an error.
    pub async fn store_poster(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, AssetError> {
        if url.is_empty() {
            return Ok(None);
        }
        self.store_asset(url, cancel).await.map(Some)
    }

    /// Download one remote image and write it under the asset directory,
    /// returning the web-relative path. Applies the pacing delay after a
    /// successful write. Removes the file again if the write is interrupted
    /// or the run is cancelled mid-store.
    async fn store_asset(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AssetError> {
        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(AssetError::Cancelled),
            fetched = self.fetch_with_retry(url, cancel) => fetched?,
        };

        let ext = classify_extension(url);
        let id = self.fresh_asset_id(&ext);
        let file_name = format!("{}.{}", id, ext);
        let path = self.dir.join(&file_name);

        tokio::fs::create_dir_all(&self.dir).await?;
        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }
        if cancel.is_cancelled() {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(AssetError::Cancelled);
        }

        debug!(url = %url, file = %file_name, "stored image asset");
        tokio::time::sleep(self.pacing).await;

        Ok(format!(
            "{}/{}",
            self.url_prefix.trim_end_matches('/'),
            file_name
        ))
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<bytes::Bytes, FetchError> {
        let mut attempt = 0;
        loop {
            match fetcher::fetch_bytes(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    attempt += 1;
                    if !e.should_retry() || attempt >= self.retries {
                        return Err(e);
                    }
                    let delay = calculate_backoff_delay(attempt, 500);
                    debug!(url = %url, attempt, delay_ms = delay.as_millis() as u64, "retrying image download");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(e),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// A fresh random identifier whose target file does not exist yet.
    /// Checked against the directory instead of trusting randomness alone.
    fn fresh_asset_id(&self, ext: &str) -> String {
        loop {
            let id: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(ID_LENGTH)
                .map(char::from)
                .collect();
            if !self.dir.join(format!("{}.{}", id, ext)).exists() {
                return id;
            }
        }
    }
}

/// Remote lazy-image URLs in first-occurrence order, deduplicated so one
/// repeated reference is downloaded once.
fn extract_remote_image_urls(content: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for captures in LAZY_IMAGE_RE.captures_iter(content) {
        let url = captures[1].to_string();
        if !seen.contains(&url) {
            seen.push(url);
        }
    }
    seen
}

/// Extension from the `wx_fmt` format hint; absent or sentinel values fall
/// back to a raster default.
fn classify_extension(url: &str) -> String {
    match FORMAT_HINT_RE.captures(url) {
        Some(captures) if &captures[1] != FORMAT_SENTINEL => captures[1].to_string(),
        _ => FALLBACK_EXTENSION.to_string(),
    }
}
