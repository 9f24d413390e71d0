//! Immutable in-memory listing catalog.
//!
//! The store is built once at startup from the scraped dataset and never
//! changes afterwards, so it can be shared across request handlers behind an
//! `Arc` without any locking.
//!
//! Two dataset layouts are accepted:
//!
//! ```text
//! { "by_city": { "Landshut": { "items": [ {...}, {...} ] }, ... } }
//! [ {...}, {...} ]
//! ```
//!
//! Group order and item order are preserved; that order is the canonical
//! order of every query result.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::{LoadError, NotFoundError};
use crate::listing::Listing;

/// Aggregates over the whole catalog, used to initialise filter controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub min_rooms: Option<f64>,
    pub max_rooms: Option<f64>,
    pub total_listings: usize,
    /// Distinct city names, sorted.
    pub cities: Vec<String>,
}

#[derive(Debug)]
pub struct CatalogStore {
    listings: Vec<Listing>,
    by_id: HashMap<String, usize>,
    stats: CatalogStats,
}

impl CatalogStore {
    /// Read and parse the dataset file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be read, is not valid JSON,
    /// or any record fails validation.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        tracing::info!(path = %path.display(), "loading listing dataset");
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let store = Self::from_json_str(&content)?;

        tracing::info!(
            listings = store.len(),
            cities = store.stats.cities.len(),
            min_price = ?store.stats.min_price,
            max_price = ?store.stats.max_price,
            min_rooms = ?store.stats.min_rooms,
            max_rooms = ?store.stats.max_rooms,
            "listing catalog loaded"
        );
        Ok(store)
    }

    /// Parse a dataset document in either supported layout.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] on malformed JSON, an unknown layout, or an
    /// invalid record.
    pub fn from_json_str(content: &str) -> Result<Self, LoadError> {
        let document: Value = serde_json::from_str(content).map_err(LoadError::Parse)?;
        let records = flatten_records(document)?;

        let mut listings = Vec::with_capacity(records.len());
        let mut mislabeled = 0usize;
        for (index, (group, raw)) in records.into_iter().enumerate() {
            let id = raw.get("id").and_then(Value::as_str).map(ToOwned::to_owned);
            let listing: Listing =
                serde_json::from_value(raw).map_err(|e| LoadError::InvalidRecord {
                    index,
                    id,
                    reason: e.to_string(),
                })?;
            if group.is_some_and(|g| g != listing.city()) {
                mislabeled += 1;
            }
            listings.push(listing);
        }

        if mislabeled > 0 {
            tracing::warn!(
                count = mislabeled,
                "listings grouped under a city that differs from address.city; address.city is used"
            );
        }

        Self::from_listings(listings)
    }

    /// Build a store from already-decoded listings, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::DuplicateId`] or [`LoadError::InvalidRooms`].
    pub fn from_listings(listings: Vec<Listing>) -> Result<Self, LoadError> {
        let mut by_id = HashMap::with_capacity(listings.len());
        for (position, listing) in listings.iter().enumerate() {
            if !(listing.rooms.is_finite() && listing.rooms > 0.0) {
                return Err(LoadError::InvalidRooms {
                    id: listing.id.clone(),
                    rooms: listing.rooms,
                });
            }
            if by_id.insert(listing.id.clone(), position).is_some() {
                return Err(LoadError::DuplicateId(listing.id.clone()));
            }
        }

        let stats = compute_stats(&listings);
        Ok(Self {
            listings,
            by_id,
            stats,
        })
    }

    /// Every listing in dataset order.
    #[must_use]
    pub fn all(&self) -> &[Listing] {
        &self.listings
    }

    /// # Errors
    ///
    /// Returns [`NotFoundError`] if no listing has this id.
    pub fn get_by_id(&self, id: &str) -> Result<&Listing, NotFoundError> {
        self.by_id
            .get(id)
            .map(|&position| &self.listings[position])
            .ok_or_else(|| NotFoundError { id: id.to_owned() })
    }

    #[must_use]
    pub fn stats(&self) -> &CatalogStats {
        &self.stats
    }

    #[must_use]
    pub fn cities(&self) -> &[String] {
        &self.stats.cities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Turns either layout into `(group name, raw record)` pairs in file order.
fn flatten_records(document: Value) -> Result<Vec<(Option<String>, Value)>, LoadError> {
    match document {
        Value::Array(items) => Ok(items.into_iter().map(|item| (None, item)).collect()),
        Value::Object(mut root) => {
            let Some(by_city) = root.remove("by_city") else {
                return Err(LoadError::Layout(
                    "expected a top-level `by_city` object or an array of listings".to_string(),
                ));
            };
            let Value::Object(groups) = by_city else {
                return Err(LoadError::Layout("`by_city` must be an object".to_string()));
            };

            let mut records = Vec::new();
            for (city, group) in groups {
                let Value::Object(mut group) = group else {
                    return Err(LoadError::Layout(format!("`by_city.{city}` must be an object")));
                };
                match group.remove("items") {
                    None => {}
                    Some(Value::Array(items)) => {
                        records.extend(items.into_iter().map(|item| (Some(city.clone()), item)));
                    }
                    Some(_) => {
                        return Err(LoadError::Layout(format!(
                            "`by_city.{city}.items` must be an array"
                        )));
                    }
                }
            }
            Ok(records)
        }
        _ => Err(LoadError::Layout(
            "expected a top-level `by_city` object or an array of listings".to_string(),
        )),
    }
}

fn compute_stats(listings: &[Listing]) -> CatalogStats {
    let min_price = listings.iter().map(|l| l.buying_price).min();
    let max_price = listings.iter().map(|l| l.buying_price).max();
    let min_rooms = listings.iter().map(|l| l.rooms).reduce(f64::min);
    let max_rooms = listings.iter().map(|l| l.rooms).reduce(f64::max);
    let cities: BTreeSet<&str> = listings.iter().map(Listing::city).collect();

    CatalogStats {
        min_price,
        max_price,
        min_rooms,
        max_rooms,
        total_listings: listings.len(),
        cities: cities.into_iter().map(ToOwned::to_owned).collect(),
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
