use thiserror::Error;

/// Transport-level failures, classified so the pipeline can tell transient
/// conditions (retry with backoff) apart from permanent ones (skip).
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("too many redirects")]
    RedirectLoop,

    #[error("http status {status}")]
    Status {
        status: reqwest::StatusCode,
        retriable: bool,
    },

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("not an html page: {0}")]
    NotHtml(String),

    #[error("could not decode body: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Whether a fresh attempt against the same URL could plausibly succeed.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::InvalidUrl(_) | Self::BodyTooLarge(_) | Self::NotHtml(_) | Self::Decode(_) => {
                false
            }
            Self::Status { retriable, .. } => *retriable,
            Self::ConnectTimeout
            | Self::RequestTimeout
            | Self::RedirectLoop
            | Self::Transport(_) => true,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if err.is_redirect() {
            Self::RedirectLoop
        } else if let Some(status) = err.status() {
            Self::Status {
                status,
                retriable: status.is_server_error(),
            }
        } else {
            // DNS failures, refused connections, broken transfers.
            Self::Transport(err.to_string())
        }
    }
}
