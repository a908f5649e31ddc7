use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use url::Url;

/// A fetched and decoded HTML page.
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// URL after redirects.
    pub url_final: Url,
    pub status: StatusCode,
    /// Body decoded to UTF-8 (source charset recorded in `charset`).
    pub body: String,
    /// Name of the encoding the body arrived in.
    pub charset: &'static str,
    pub fetched_at: DateTime<Utc>,
}
