mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use immo_collector::pagination::DEFAULT_ITEMS_KEY;
use immo_collector::query::{DEFAULT_LISTING_TYPE, DEFAULT_PAGE_SIZE};
use immo_collector::{CitySpec, DEFAULT_BASE_URL};
use immo_core::{CatalogStore, QueryEngine};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "immo-cli")]
#[command(about = "Collect listings and query the catalog without running the server")]
struct Cli {
    /// Dataset to read or write; defaults to `IMMO_DATASET_PATH` or `./thinkimmo_dataset.json`.
    #[arg(long, global = true, env = "IMMO_DATASET_PATH")]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Price and room bounds plus listing count.
    Stats,
    /// Distinct city names.
    Cities,
    /// Filter and page through listings.
    Query(QueryArgs),
    /// Print one full listing.
    Show { id: String },
    /// Fetch listings from the search API and write them as a `by_city` dataset.
    Collect(CollectArgs),
}

#[derive(Debug, Args)]
pub(crate) struct QueryArgs {
    #[arg(long)]
    min_price: Option<String>,
    #[arg(long)]
    max_price: Option<String>,
    /// Comma-separated room buckets; 5 means five or more.
    #[arg(long)]
    rooms: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    limit: Option<String>,
    #[arg(long)]
    offset: Option<String>,
}

impl From<QueryArgs> for immo_core::FilterParams {
    fn from(args: QueryArgs) -> Self {
        Self {
            min_price: args.min_price,
            max_price: args.max_price,
            rooms: args.rooms,
            city: args.city,
            limit: args.limit,
            offset: args.offset,
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct CollectArgs {
    /// `NAME[:TYPE[:REGION]]`, repeatable; defaults to five large German cities.
    #[arg(long = "city")]
    cities: Vec<CitySpec>,
    /// Search API listing type, e.g. `APARTMENTBUY` or `HOUSEBUY`.
    #[arg(long, default_value = DEFAULT_LISTING_TYPE)]
    listing_type: String,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    #[arg(value_parser = clap::value_parser!(u32).range(1..=100))]
    page_size: u32,
    #[arg(long, default_value_t = 10)]
    max_pages: usize,
    /// Key holding the listing array in search responses.
    #[arg(long, default_value = DEFAULT_ITEMS_KEY)]
    items_key: String,
    #[arg(long, env = "IMMO_COLLECT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    #[arg(long, default_value_t = 6)]
    max_retries: u32,
    #[arg(long, default_value_t = 750)]
    backoff_ms: u64,
    /// Pause between page requests.
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable JSON.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = immo_core::load_query_config()?;
    let dataset = cli.dataset.unwrap_or(config.dataset_path);

    let output = match cli.command {
        Commands::Stats => commands::stats(&CatalogStore::load(&dataset)?)?,
        Commands::Cities => commands::cities(&CatalogStore::load(&dataset)?)?,
        Commands::Query(args) => {
            let catalog = CatalogStore::load(&dataset)?;
            commands::query(&catalog, QueryEngine::new(config.page_limits), &args.into())?
        }
        Commands::Show { id } => commands::show(&CatalogStore::load(&dataset)?, &id)?,
        Commands::Collect(args) => commands::collect(&args, &dataset).await?,
    };
    println!("{output}");

    Ok(())
}
