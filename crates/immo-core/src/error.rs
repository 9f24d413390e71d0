use thiserror::Error;

/// Fatal startup failure while building the catalog. No partial catalog is
/// ever produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("unsupported dataset layout: {0}")]
    Layout(String),

    /// A record could not be decoded into a listing, typically because a
    /// required field (`id`, `buyingPrice`, `rooms`, `address.city`) is missing.
    #[error("invalid listing record #{index}{}: {reason}", fmt_id(.id.as_deref()))]
    InvalidRecord {
        index: usize,
        id: Option<String>,
        reason: String,
    },

    #[error("duplicate listing id '{0}'")]
    DuplicateId(String),

    #[error("listing '{id}' has invalid rooms value {rooms}; must be a positive number")]
    InvalidRooms { id: String, rooms: f64 },
}

fn fmt_id(id: Option<&str>) -> String {
    id.map(|id| format!(" (id '{id}')")).unwrap_or_default()
}

/// Caller input rejected by the query engine. Each variant names the
/// constraint that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be an integer, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} must be non-negative, got {value}")]
    NegativePrice { field: &'static str, value: i64 },

    #[error("min_price ({min}) must not exceed max_price ({max})")]
    PriceRangeInverted { min: i64, max: i64 },

    #[error("limit must be between 1 and {max}, got {limit}")]
    LimitOutOfRange { limit: i64, max: u32 },

    #[error("offset must be non-negative, got {0}")]
    NegativeOffset(i64),

    #[error("rooms must be a comma-separated list of positive integers, got token '{0}'")]
    InvalidRoomToken(String),

    #[error("rooms filter must contain at least one value")]
    EmptyRooms,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("listing '{id}' not found")]
pub struct NotFoundError {
    pub id: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
