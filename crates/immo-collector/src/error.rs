use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by the search API{}", fmt_retry_after(.retry_after_secs.as_ref()))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("search response for {city} at offset {offset} has no listing array")]
    MissingItems { city: String, offset: u32 },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

fn fmt_retry_after(secs: Option<&u64>) -> String {
    secs.map(|s| format!(" (retry after {s}s)")).unwrap_or_default()
}
