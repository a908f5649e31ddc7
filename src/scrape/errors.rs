use thiserror::Error;

/// Malformed-source failures: the page rendered, but the structure we rely
/// on was not where we expected it. These are skip-and-report conditions at
/// the pipeline boundary, never aborts.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("no account search result for handle '{0}'")]
    AccountNotFound(String),

    #[error("embedded feed document not found in page")]
    FeedNotFound,

    #[error("feed document failed to parse: {0}")]
    FeedParse(#[from] serde_json::Error),
}
