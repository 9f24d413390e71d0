use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// One real-estate record as scraped from the listing aggregator.
///
/// Field names follow the source dataset (camelCase). Only `id`,
/// `buyingPrice`, `rooms` and `address.city` are required; everything the
/// filters do not interpret is kept in [`Listing::extra`] and written back
/// out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct Listing {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Asking price in whole currency units.
    #[serde(deserialize_with = "whole_units")]
    pub buying_price: u64,
    /// Room count; half rooms (`2.5`) are common in German listings.
    pub rooms: f64,
    pub address: Address,
    #[serde(default)]
    pub zip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub square_meter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_sqm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_price_per_sqm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_return: Option<f64>,
    #[serde(
        default,
        deserialize_with = "optional_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub construction_year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_efficiency_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub floor: Option<i64>,
    #[serde(
        default,
        deserialize_with = "optional_whole",
        skip_serializing_if = "Option::is_none"
    )]
    pub number_of_floors: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub lift: Option<bool>,
    #[serde(default)]
    pub balcony: bool,
    #[serde(default)]
    pub garden: bool,
    #[serde(default)]
    pub cellar: bool,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Listing {
    #[must_use]
    pub fn city(&self) -> &str {
        &self.address.city
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub original_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub floor_plan: bool,
}

/// A portal the listing is published on, e.g. `ImmoScout24`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Compact projection of a [`Listing`] used for result lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct ListingCard {
    pub id: String,
    pub title: String,
    pub buying_price: u64,
    pub rooms: f64,
    pub square_meter: Option<f64>,
    pub city: String,
    pub zip: String,
    pub image_url: Option<String>,
    pub platform_url: Option<String>,
    pub platform_name: Option<String>,
    pub lift: Option<bool>,
    pub cellar: bool,
    pub balcony: bool,
    pub garden: bool,
    pub construction_year: Option<i64>,
    pub price_per_sqm: Option<f64>,
}

impl From<&Listing> for ListingCard {
    fn from(listing: &Listing) -> Self {
        let platform = listing.platforms.first();
        Self {
            id: listing.id.clone(),
            title: listing.title.clone(),
            buying_price: listing.buying_price,
            rooms: listing.rooms,
            square_meter: listing.square_meter,
            city: listing.city().to_owned(),
            zip: listing.zip.clone(),
            image_url: listing.images.first().map(|i| i.original_url.clone()),
            platform_url: platform.map(|p| p.url.clone()),
            platform_name: platform.map(|p| p.name.clone()),
            lift: listing.lift,
            cellar: listing.cellar,
            balcony: listing.balcony,
            garden: listing.garden,
            construction_year: listing.construction_year,
            price_per_sqm: listing.price_per_sqm,
        }
    }
}

/// Accepts `250000` and `250000.0`; rejects negatives and fractions.
fn whole_units<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    whole_number(&number)
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| {
            D::Error::custom(format!(
                "expected a non-negative whole number, got {number}"
            ))
        })
}

fn optional_whole<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Number>::deserialize(deserializer)? {
        None => Ok(None),
        Some(number) => whole_number(&number).map(Some).ok_or_else(|| {
            D::Error::custom(format!("expected a whole number, got {number}"))
        }),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn whole_number(number: &Number) -> Option<i64> {
    if let Some(v) = number.as_i64() {
        return Some(v);
    }
    let v = number.as_f64()?;
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}
