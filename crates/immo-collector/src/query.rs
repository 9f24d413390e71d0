//! Search parameters sent to the `/immo` endpoint.

use std::str::FromStr;

use serde_json::json;

pub const DEFAULT_LISTING_TYPE: &str = "APARTMENTBUY";
pub const DEFAULT_SORT: &str = "publishDate,desc";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
const AVERAGE_AGGREGATION: &str =
    "buyingPrice;pricePerSqm;squareMeter;constructionYear;rentPrice;rentPricePerSqm;runningTime";
const TERMS_AGGREGATION: &str = "platforms.name.keyword,60";

/// One city to collect, matched by the API's geo search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitySpec {
    pub name: String,
    /// `town`, `city` or `state`.
    pub search_type: String,
    /// Federal state the city lies in.
    pub region: String,
}

impl CitySpec {
    #[must_use]
    pub fn new(name: &str, search_type: &str, region: &str) -> Self {
        Self {
            name: name.to_owned(),
            search_type: search_type.to_owned(),
            region: region.to_owned(),
        }
    }
}

/// Parses `NAME[:TYPE[:REGION]]`, e.g. `München:city:Bayern`.
///
/// Type defaults to `town` and region to `Bayern`.
impl FromStr for CitySpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':').map(str::trim);
        let name = parts
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| format!("city spec \"{s}\" has no name"))?;
        let search_type = parts.next().filter(|t| !t.is_empty()).unwrap_or("town");
        let region = parts.next().filter(|r| !r.is_empty()).unwrap_or("Bayern");
        if parts.next().is_some() {
            return Err(format!("city spec \"{s}\" has more than three parts"));
        }
        Ok(Self::new(name, search_type, region))
    }
}

/// Page request for one city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub active: bool,
    pub listing_type: String,
    pub sort_by: String,
    pub offset: u32,
    pub size: u32,
    pub city: CitySpec,
}

impl SearchQuery {
    #[must_use]
    pub fn new(listing_type: &str, size: u32) -> Self {
        Self {
            active: true,
            listing_type: listing_type.to_owned(),
            sort_by: DEFAULT_SORT.to_owned(),
            offset: 0,
            size,
            city: CitySpec::new("Landshut", "town", "Bayern"),
        }
    }

    /// The same search pointed at `city`, starting at `offset`.
    #[must_use]
    pub fn for_city(&self, city: &CitySpec, offset: u32) -> Self {
        Self {
            city: city.clone(),
            offset,
            ..self.clone()
        }
    }

    /// Query-string pairs in the form the website sends them. The geo search
    /// is a JSON array embedded in a single parameter.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let geo_searches = json!([{
            "geoSearchQuery": self.city.name,
            "geoSearchType": self.city.search_type,
            "region": self.city.region,
        }])
        .to_string();
        vec![
            ("active", self.active.to_string()),
            ("type", self.listing_type.clone()),
            ("sortBy", self.sort_by.clone()),
            ("from", self.offset.to_string()),
            ("size", self.size.to_string()),
            ("grossReturnAnd", "false".to_owned()),
            ("allowUnknown", "false".to_owned()),
            ("favorite", "false".to_owned()),
            ("excludedFields", "true".to_owned()),
            ("geoSearches", geo_searches),
            ("averageAggregation", AVERAGE_AGGREGATION.to_owned()),
            ("termsAggregation", TERMS_AGGREGATION.to_owned()),
        ]
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::new(DEFAULT_LISTING_TYPE, DEFAULT_PAGE_SIZE)
    }
}
