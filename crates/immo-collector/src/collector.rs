//! Multi-city collection loop and the dataset it produces.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::client::ThinkImmoClient;
use crate::error::CollectorError;
use crate::pagination::{extract_id, extract_items, has_next_page, DEFAULT_ITEMS_KEY};
use crate::query::{CitySpec, SearchQuery};

/// Listings gathered for one city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityCollection {
    pub city: String,
    pub region: String,
    /// Pages that returned at least one listing.
    pub pages: usize,
    pub items: Vec<Value>,
}

/// Collection output, serialized as `{"total_items": n, "by_city": {...}}`
/// with cities in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub total_items: usize,
    #[serde(serialize_with = "serialize_by_city")]
    pub by_city: Vec<CityCollection>,
}

fn serialize_by_city<S: Serializer>(
    cities: &[CityCollection],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(cities.iter().map(|c| (&c.city, c)))
}

/// Walks each city's result pages by offset and keeps every listing id once
/// across the whole run, so the output always loads as a catalog.
pub struct Collector {
    client: ThinkImmoClient,
    items_key: String,
    max_pages_per_city: usize,
    inter_request_delay_ms: u64,
}

impl Collector {
    #[must_use]
    pub fn new(client: ThinkImmoClient, max_pages_per_city: usize) -> Self {
        Self {
            client,
            items_key: DEFAULT_ITEMS_KEY.to_owned(),
            max_pages_per_city,
            inter_request_delay_ms: 0,
        }
    }

    /// Key holding the listing array in search responses.
    #[must_use]
    pub fn with_items_key(mut self, items_key: &str) -> Self {
        items_key.clone_into(&mut self.items_key);
        self
    }

    /// Pause between consecutive page requests.
    #[must_use]
    pub fn with_request_delay_ms(mut self, delay_ms: u64) -> Self {
        self.inter_request_delay_ms = delay_ms;
        self
    }

    /// Collects every city in order. A city named twice is collected once.
    ///
    /// All-or-nothing: a failing page aborts the run and no partial dataset is
    /// returned.
    ///
    /// # Errors
    ///
    /// Propagates any [`CollectorError`] from fetching or reading a page.
    pub async fn collect_many(
        &self,
        base: &SearchQuery,
        cities: &[CitySpec],
    ) -> Result<Dataset, CollectorError> {
        let mut seen = HashSet::new();
        let mut by_city = Vec::with_capacity(cities.len());

        for city in cities {
            if by_city.iter().any(|c: &CityCollection| c.city == city.name) {
                tracing::warn!(city = %city.name, "city requested twice; collecting it once");
                continue;
            }
            let collection = self.collect_city(base, city, &mut seen).await?;
            tracing::info!(
                city = %collection.city,
                pages = collection.pages,
                items = collection.items.len(),
                "collected city"
            );
            by_city.push(collection);
        }

        let total_items = by_city.iter().map(|c| c.items.len()).sum();
        Ok(Dataset {
            total_items,
            by_city,
        })
    }

    async fn collect_city(
        &self,
        base: &SearchQuery,
        city: &CitySpec,
        seen: &mut HashSet<String>,
    ) -> Result<CityCollection, CollectorError> {
        let mut items = Vec::new();
        let mut pages = 0usize;
        let mut offset = base.offset;
        let mut duplicates = 0usize;
        let mut without_id = 0usize;

        for page_index in 0..self.max_pages_per_city {
            if page_index > 0 && self.inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.inter_request_delay_ms)).await;
            }

            let query = base.for_city(city, offset);
            let page = self.client.fetch_page(&query).await?;
            let page_items =
                extract_items(page, &self.items_key).ok_or_else(|| CollectorError::MissingItems {
                    city: city.name.clone(),
                    offset,
                })?;
            let received = page_items.len();
            if received == 0 {
                break;
            }
            pages += 1;

            for item in page_items {
                match extract_id(&item) {
                    Some(id) if seen.insert(id.clone()) => items.push(item),
                    Some(_) => duplicates += 1,
                    None => without_id += 1,
                }
            }

            if !has_next_page(received, base.size) {
                break;
            }
            offset = offset.saturating_add(base.size);
        }

        if duplicates > 0 || without_id > 0 {
            tracing::warn!(
                city = %city.name,
                duplicates,
                without_id,
                "skipped listings that were already collected or had no id"
            );
        }

        Ok(CityCollection {
            city: city.name.clone(),
            region: city.region.clone(),
            pages,
            items,
        })
    }
}
