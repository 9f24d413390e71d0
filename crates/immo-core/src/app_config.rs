use std::net::SocketAddr;
use std::path::PathBuf;

use crate::query::PageLimits;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Scraped dataset the catalog is built from at startup.
    pub dataset_path: PathBuf,
    /// Directory served at `/` for the browser UI, if any.
    pub static_dir: Option<PathBuf>,
    pub page_limits: PageLimits,
}

/// The subset of [`AppConfig`] needed to load and query a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub dataset_path: PathBuf,
    pub page_limits: PageLimits,
}
