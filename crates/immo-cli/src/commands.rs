use std::path::Path;

use anyhow::Context;
use immo_collector::{CitySpec, Collector, Dataset, SearchQuery, ThinkImmoClient};
use immo_core::{CatalogStore, FilterParams, ListingCard, QueryEngine};
use serde::Serialize;

use crate::CollectArgs;

const USER_AGENT: &str = concat!("immo-cli/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct CollectOutput<'a> {
    output: &'a Path,
    total_items: usize,
    by_city: Vec<CitySummary<'a>>,
}

#[derive(Debug, Serialize)]
struct CitySummary<'a> {
    city: &'a str,
    items: usize,
    pages: usize,
}

#[derive(Debug, Serialize)]
struct QueryOutput {
    total: usize,
    page: usize,
    limit: u32,
    offset: usize,
    listings: Vec<ListingCard>,
}

fn to_pretty<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}

pub(crate) fn stats(catalog: &CatalogStore) -> anyhow::Result<String> {
    to_pretty(catalog.stats())
}

pub(crate) fn cities(catalog: &CatalogStore) -> anyhow::Result<String> {
    to_pretty(&catalog.cities())
}

pub(crate) fn query(
    catalog: &CatalogStore,
    engine: QueryEngine,
    params: &FilterParams,
) -> anyhow::Result<String> {
    let request = params.parse()?;
    let result = engine.execute(catalog, &request)?;
    to_pretty(&QueryOutput {
        total: result.total(),
        page: result.page(),
        limit: result.limit(),
        offset: result.offset(),
        listings: result.listings().iter().map(|&l| ListingCard::from(l)).collect(),
    })
}

pub(crate) fn show(catalog: &CatalogStore, id: &str) -> anyhow::Result<String> {
    let listing = catalog.get_by_id(id)?;
    to_pretty(listing)
}

fn default_cities() -> Vec<CitySpec> {
    vec![
        CitySpec::new("München", "city", "Bayern"),
        CitySpec::new("Berlin", "city", "Berlin"),
        CitySpec::new("Hamburg", "city", "Hamburg"),
        CitySpec::new("Köln", "city", "Nordrhein-Westfalen"),
        CitySpec::new("Frankfurt am Main", "city", "Hessen"),
    ]
}

/// Collects every requested city and writes the dataset to `out`. The file is
/// only replaced once the whole collection succeeded.
pub(crate) async fn collect(args: &CollectArgs, out: &Path) -> anyhow::Result<String> {
    let cities = if args.cities.is_empty() {
        default_cities()
    } else {
        args.cities.clone()
    };

    let client = ThinkImmoClient::new(
        &args.base_url,
        args.timeout_secs,
        USER_AGENT,
        args.max_retries,
        args.backoff_ms,
    )?;
    let collector = Collector::new(client, args.max_pages)
        .with_items_key(&args.items_key)
        .with_request_delay_ms(args.delay_ms);
    let base = SearchQuery::new(&args.listing_type, args.page_size);

    let dataset = collector.collect_many(&base, &cities).await?;
    write_dataset(&dataset, out)?;

    to_pretty(&CollectOutput {
        output: out,
        total_items: dataset.total_items,
        by_city: dataset
            .by_city
            .iter()
            .map(|c| CitySummary {
                city: &c.city,
                items: c.items.len(),
                pages: c.pages,
            })
            .collect(),
    })
}

fn write_dataset(dataset: &Dataset, out: &Path) -> anyhow::Result<()> {
    let raw = serde_json::to_string_pretty(dataset).context("failed to serialize dataset")?;
    std::fs::write(out, raw)
        .with_context(|| format!("failed to write dataset to {}", out.display()))
}

#[cfg(test)]
mod tests {
    use immo_core::{Listing, PageLimits, ValidationError};
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn catalog() -> CatalogStore {
        let listings: Vec<Listing> = serde_json::from_value(json!([
            { "id": "x1", "buyingPrice": 120_000, "rooms": 1.5, "address": { "city": "Passau" } },
            { "id": "x2", "buyingPrice": 380_000, "rooms": 5, "address": { "city": "Ingolstadt" } }
        ]))
        .expect("listings");
        CatalogStore::from_listings(listings).expect("catalog")
    }

    #[test]
    fn query_prints_page_summary() {
        let params = FilterParams {
            rooms: Some("5".to_string()),
            ..FilterParams::default()
        };
        let out = query(&catalog(), QueryEngine::new(PageLimits::default()), &params)
            .expect("query output");
        let json: Value = serde_json::from_str(&out).expect("json");
        assert_eq!(json["total"], 1);
        assert_eq!(json["listings"][0]["id"], "x2");
    }

    #[test]
    fn query_surfaces_validation_errors() {
        let params = FilterParams {
            offset: Some("-1".to_string()),
            ..FilterParams::default()
        };
        let err = query(&catalog(), QueryEngine::default(), &params).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::NegativeOffset(-1))
        );
    }

    #[test]
    fn cities_lists_sorted_names() {
        let out = cities(&catalog()).expect("cities output");
        let json: Value = serde_json::from_str(&out).expect("json");
        assert_eq!(json, json!(["Ingolstadt", "Passau"]));
    }

    #[test]
    fn show_unknown_id_fails() {
        let err = show(&catalog(), "missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    fn collect_args(base_url: String, cities: Vec<CitySpec>) -> CollectArgs {
        CollectArgs {
            cities,
            listing_type: "APARTMENTBUY".to_string(),
            page_size: 20,
            max_pages: 2,
            items_key: "content".to_string(),
            base_url,
            timeout_secs: 5,
            max_retries: 0,
            backoff_ms: 0,
            delay_ms: 0,
        }
    }

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("immo-cli-{}-{name}.json", std::process::id()))
    }

    #[tokio::test]
    async fn collect_writes_loadable_dataset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/immo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{
                    "id": "p1",
                    "buyingPrice": 210_000,
                    "rooms": 2,
                    "address": { "city": "Passau" }
                }]
            })))
            .mount(&server)
            .await;

        let out = scratch_path("collect");
        let args = collect_args(server.uri(), vec![CitySpec::new("Passau", "town", "Bayern")]);
        let summary = collect(&args, &out).await.expect("collect output");
        let summary: Value = serde_json::from_str(&summary).expect("json");
        assert_eq!(summary["total_items"], 1);
        assert_eq!(summary["by_city"][0]["city"], "Passau");

        let catalog = CatalogStore::load(&out).expect("written dataset loads");
        std::fs::remove_file(&out).ok();
        assert_eq!(catalog.get_by_id("p1").expect("p1").city(), "Passau");
    }

    #[tokio::test]
    async fn failed_collect_leaves_existing_dataset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/immo"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let out = scratch_path("failed-collect");
        std::fs::write(&out, "[]").expect("seed file");
        let args = collect_args(server.uri(), vec![CitySpec::new("Passau", "town", "Bayern")]);
        let result = collect(&args, &out).await;
        let kept = std::fs::read_to_string(&out).expect("file still there");
        std::fs::remove_file(&out).ok();

        assert!(result.is_err());
        assert_eq!(kept, "[]");
    }

    #[test]
    fn default_cities_cover_five_regions() {
        let cities = default_cities();
        assert_eq!(cities.len(), 5);
        assert_eq!(cities[0], CitySpec::new("München", "city", "Bayern"));
    }
}
