use crate::fetcher::{decode::decode_body, errors::FetchError, types::PageResponse};
use bytes::Bytes;
use chrono::Utc;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::instrument;

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";

/// Shared client used for auxiliary downloads (images, posters). Page
/// navigation goes through per-worker clients built by `build_client`.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(build_client);

/// Build a fresh client with the pipeline's transport settings. Each worker
/// session owns one so connection state is never shared across tasks.
pub fn build_client() -> Client {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers({
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                    .parse()
                    .expect("static header value"),
            );
            headers
        })
        .build()
        .expect("failed to build HTTP client")
}

/// Fetch an HTML page with the shared client.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch(url: &str) -> Result<PageResponse, FetchError> {
    fetch_page_with(&HTTP_CLIENT, url).await
}

/// Fetch an HTML page with a caller-owned client.
pub async fn fetch_page_with(client: &Client, url: &str) -> Result<PageResponse, FetchError> {
    let parsed_url = url::Url::parse(url)?;

    let response = client
        .get(parsed_url)
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchError::BodyTooLarge(content_length));
    }

    let url_final = response.url().clone();
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::Status {
            status,
            retriable: status.is_server_error(),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
        return Err(FetchError::NotHtml(content_type));
    }

    let body_bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    // Content-Length may have been absent.
    if body_bytes.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
    }

    let (body, charset) = decode_body(&content_type, &body_bytes)?;

    Ok(PageResponse {
        url_final,
        status,
        body,
        charset,
        fetched_at: Utc::now(),
    })
}

/// Fetch a binary payload (image bytes). No content-type gating; the caller
/// has already decided the extension from the URL itself.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_bytes(url: &str) -> Result<Bytes, FetchError> {
    let parsed_url = url::Url::parse(url)?;

    let response = HTTP_CLIENT
        .get(parsed_url)
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status,
            retriable: status.is_server_error(),
        });
    }

    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchError::BodyTooLarge(content_length));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    if bytes.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchError::BodyTooLarge(bytes.len() as u64));
    }

    Ok(bytes)
}
