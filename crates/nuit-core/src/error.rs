use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("unexpected page shape: {0}")]
    Parse(String),

    #[error("invalid selector {0}")]
    Selector(String),

    #[error("invalid URL {url}: {reason}")]
    Url { url: String, reason: String },

    #[error("{0} does not exist in the local timezone")]
    LocalTime(NaiveDateTime),

    #[error("timestamp {0} is out of range")]
    TimestampRange(i64),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
