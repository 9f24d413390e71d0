//! Paginated multi-city collection of listings from the thinkimmo.com search API,
//! producing the `by_city` dataset the catalog loads.

pub mod client;
pub mod collector;
pub mod error;
pub mod pagination;
pub mod query;
mod rate_limit;

pub use client::{ThinkImmoClient, DEFAULT_BASE_URL};
pub use collector::{CityCollection, Collector, Dataset};
pub use error::CollectorError;
pub use query::{CitySpec, SearchQuery};
