//! Listing catalog and query engine shared by the HTTP server and the CLI.

pub mod app_config;
pub mod catalog;
pub mod config;
pub mod error;
pub mod listing;
pub mod query;

pub use app_config::{AppConfig, Environment, QueryConfig};
pub use catalog::{CatalogStats, CatalogStore};
pub use config::{load_app_config, load_app_config_from_env, load_query_config};
pub use error::{ConfigError, LoadError, NotFoundError, ValidationError};
pub use listing::{Address, Image, Listing, ListingCard, Platform};
pub use query::{
    rooms_in_bucket, FilterParams, FilterRequest, PageLimits, QueryEngine, QueryResult,
    OPEN_ENDED_ROOM_BUCKET,
};
