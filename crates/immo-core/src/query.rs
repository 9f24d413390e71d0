//! Filtering and pagination over the listing catalog.
//!
//! A query is a full scan of [`CatalogStore::all`] with a composite
//! predicate, so matches always come back in catalog order. Nothing is
//! cached between calls.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::catalog::CatalogStore;
use crate::error::ValidationError;
use crate::listing::Listing;

/// The top rooms bucket is open-ended: `5` selects every listing with five
/// or more rooms.
pub const OPEN_ENDED_ROOM_BUCKET: u32 = 5;

pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Page size used when the request does not name one.
    pub default_limit: u32,
    /// Largest page size accepted; anything above is rejected.
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

/// Query-string form of a filter request, before any parsing.
///
/// Blank values are treated as absent, since HTML forms submit empty inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterParams {
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    /// Comma-separated room buckets, e.g. `"2,3,5"`.
    pub rooms: Option<String>,
    pub city: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl FilterParams {
    /// Parse the raw strings into a typed [`FilterRequest`].
    ///
    /// Range checks happen in [`QueryEngine::execute`]; this step only
    /// rejects tokens that are not integers.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidNumber`] or
    /// [`ValidationError::InvalidRoomToken`].
    pub fn parse(&self) -> Result<FilterRequest, ValidationError> {
        Ok(FilterRequest {
            min_price: parse_integer("min_price", self.min_price.as_deref())?,
            max_price: parse_integer("max_price", self.max_price.as_deref())?,
            rooms: non_blank(self.rooms.as_deref())
                .map(parse_room_list)
                .transpose()?,
            city: non_blank(self.city.as_deref()).map(ToOwned::to_owned),
            limit: parse_integer("limit", self.limit.as_deref())?,
            offset: parse_integer("offset", self.offset.as_deref())?,
        })
    }
}

/// A single listings query. `None` means the dimension is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRequest {
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub rooms: Option<Vec<i64>>,
    pub city: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One page of matches, borrowed from the catalog.
///
/// Only [`QueryEngine::execute`] builds one, so `limit` is always at least 1.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<'a> {
    listings: Vec<&'a Listing>,
    total: usize,
    limit: u32,
    offset: usize,
}

impl<'a> QueryResult<'a> {
    #[must_use]
    pub fn listings(&self) -> &[&'a Listing] {
        &self.listings
    }

    /// Number of matches before pagination.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Zero-based page index implied by `offset` and `limit`.
    #[must_use]
    pub fn page(&self) -> usize {
        self.offset.checked_div(self.limit as usize).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEngine {
    limits: PageLimits,
}

impl QueryEngine {
    #[must_use]
    pub fn new(limits: PageLimits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub fn limits(&self) -> PageLimits {
        self.limits
    }

    /// Validate `request` and return the matching page of `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the first constraint the request
    /// violates. Invalid values are never clamped.
    pub fn execute<'a>(
        &self,
        catalog: &'a CatalogStore,
        request: &FilterRequest,
    ) -> Result<QueryResult<'a>, ValidationError> {
        let filter = ListingFilter::from_request(request)?;
        let limit = self.validate_limit(request.limit)?;
        let offset = validate_offset(request.offset)?;

        let page_len = limit as usize;
        let mut listings = Vec::with_capacity(page_len.min(catalog.len()));
        let mut total = 0usize;
        for listing in catalog.all().iter().filter(|l| filter.matches(l)) {
            if total >= offset && listings.len() < page_len {
                listings.push(listing);
            }
            total += 1;
        }

        tracing::debug!(total, offset, limit, returned = listings.len(), "listings query");

        Ok(QueryResult {
            listings,
            total,
            limit,
            offset,
        })
    }

    fn validate_limit(&self, limit: Option<i64>) -> Result<u32, ValidationError> {
        let Some(limit) = limit else {
            return Ok(self.limits.default_limit);
        };
        u32::try_from(limit)
            .ok()
            .filter(|l| (1..=self.limits.max_limit).contains(l))
            .ok_or(ValidationError::LimitOutOfRange {
                limit,
                max: self.limits.max_limit,
            })
    }
}

fn validate_offset(offset: Option<i64>) -> Result<usize, ValidationError> {
    match offset {
        None => Ok(0),
        Some(o) if o < 0 => Err(ValidationError::NegativeOffset(o)),
        // Offsets past usize::MAX can only ever yield an empty page.
        Some(o) => Ok(usize::try_from(o).unwrap_or(usize::MAX)),
    }
}

/// Conjunction of the price, rooms and city predicates.
#[derive(Debug)]
struct ListingFilter<'r> {
    min_price: Option<u64>,
    max_price: Option<u64>,
    /// Empty means every room count passes.
    rooms: BTreeSet<u32>,
    city: Option<&'r str>,
}

impl<'r> ListingFilter<'r> {
    fn from_request(request: &'r FilterRequest) -> Result<Self, ValidationError> {
        let min_price = validate_price("min_price", request.min_price)?;
        let max_price = validate_price("max_price", request.max_price)?;
        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(ValidationError::PriceRangeInverted {
                    min: request.min_price.unwrap_or_default(),
                    max: request.max_price.unwrap_or_default(),
                });
            }
        }

        let rooms = match &request.rooms {
            None => BTreeSet::new(),
            Some(buckets) if buckets.is_empty() => return Err(ValidationError::EmptyRooms),
            Some(buckets) => buckets
                .iter()
                .map(|&b| {
                    u32::try_from(b)
                        .ok()
                        .filter(|&b| b > 0)
                        .ok_or_else(|| ValidationError::InvalidRoomToken(b.to_string()))
                })
                .collect::<Result<_, _>>()?,
        };

        Ok(Self {
            min_price,
            max_price,
            rooms,
            city: request.city.as_deref(),
        })
    }

    fn matches(&self, listing: &Listing) -> bool {
        self.min_price.is_none_or(|min| listing.buying_price >= min)
            && self.max_price.is_none_or(|max| listing.buying_price <= max)
            && (self.rooms.is_empty()
                || self
                    .rooms
                    .iter()
                    .any(|&bucket| rooms_in_bucket(listing.rooms, bucket)))
            && self.city.is_none_or(|city| listing.city() == city)
    }
}

/// `floor(rooms) == bucket`, except the open-ended bucket which takes
/// everything from five rooms up.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn rooms_in_bucket(rooms: f64, bucket: u32) -> bool {
    if bucket == OPEN_ENDED_ROOM_BUCKET {
        rooms >= f64::from(OPEN_ENDED_ROOM_BUCKET)
    } else {
        rooms.floor() == f64::from(bucket)
    }
}

fn validate_price(field: &'static str, value: Option<i64>) -> Result<Option<u64>, ValidationError> {
    value
        .map(|v| u64::try_from(v).map_err(|_| ValidationError::NegativePrice { field, value: v }))
        .transpose()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_integer(field: &'static str, raw: Option<&str>) -> Result<Option<i64>, ValidationError> {
    non_blank(raw)
        .map(|v| {
            v.trim()
                .parse::<i64>()
                .map_err(|_| ValidationError::InvalidNumber {
                    field,
                    value: v.to_owned(),
                })
        })
        .transpose()
}

fn parse_room_list(raw: &str) -> Result<Vec<i64>, ValidationError> {
    raw.split(',')
        .map(str::trim)
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|_| ValidationError::InvalidRoomToken(token.to_owned()))
        })
        .collect()
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
