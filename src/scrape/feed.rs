//! Adapter for the JSON document embedded in an account's message page.
//!
//! This is the most format-fragile surface the pipeline touches: the document
//! is located by a structural pattern inside script text, and its field names
//! are the provider's, not ours. The mapping is confined to this module and
//! exercised against stored fixtures so drift shows up as a failing test.

use crate::scrape::errors::ScrapeError;
use crate::scrape::types::FeedMessage;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// The embedded object starts with `{"list":` and its recognizable tail is
/// the `}}]}` closing of the last entry's nested info blocks.
static FEED_DOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)\{"list":.+\}\}\]\}"#).unwrap());

#[derive(Debug, Deserialize)]
struct FeedDocument {
    list: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    app_msg_ext_info: ExtInfo,
    #[serde(default)]
    comm_msg_info: CommInfo,
}

#[derive(Debug, Default, Deserialize)]
struct ExtInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content_url: String,
    #[serde(default)]
    cover: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    digest: String,
}

#[derive(Debug, Default, Deserialize)]
struct CommInfo {
    #[serde(default)]
    datetime: i64,
}

/// Locate and parse the embedded feed document, mapping each entry into the
/// canonical message shape. `feed_host` is prepended to the feed-relative
/// content URL.
pub fn extract_feed(page: &str, feed_host: &str) -> Result<Vec<FeedMessage>, ScrapeError> {
    let raw = FEED_DOC_RE
        .find(page)
        .ok_or(ScrapeError::FeedNotFound)?
        .as_str();

    let document: FeedDocument = serde_json::from_str(raw)?;

    Ok(document
        .list
        .into_iter()
        .map(|entry| FeedMessage {
            title: entry.app_msg_ext_info.title,
            url: format!("{}{}", feed_host, entry.app_msg_ext_info.content_url),
            poster: entry.app_msg_ext_info.cover,
            author_name: entry.app_msg_ext_info.author,
            description: entry.app_msg_ext_info.digest,
            publish_time: entry.comm_msg_info.datetime,
        })
        .collect())
}
