mod commands;
mod services;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "locus")]
#[command(about = "Resolve device positions and search addresses")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve the current position through the tier chain
    Locate {
        /// Latitude of a device fix; without one the sensor is unavailable
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Accuracy of the supplied fix, in meters
        #[arg(long)]
        accuracy: Option<f64>,
        /// Ignore the cached current position
        #[arg(long)]
        force_refresh: bool,
    },
    /// Search addresses and places
    Search {
        query: String,
        #[arg(long)]
        city: Option<String>,
        /// ISO 3166-1 alpha-2 country code
        #[arg(long)]
        country: Option<String>,
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Defaults to LOCUS_SEARCH_MAX_RESULTS
        #[arg(long)]
        max: Option<usize>,
    },
    /// Address for a coordinate pair
    Reverse {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Inspect or wipe the result cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Debug, Subcommand)]
enum CacheCommands {
    Show,
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = locus_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let services = services::Services::from_config(&config)?;

    match cli.command {
        Commands::Locate {
            lat,
            lng,
            accuracy,
            force_refresh,
        } => {
            let fix = lat.zip(lng);
            commands::run_locate(&services, &config, fix, accuracy, force_refresh).await
        }
        Commands::Search {
            query,
            city,
            country,
            lat,
            lng,
            max,
        } => {
            let ctx = locus_search::SearchContext {
                city,
                country_code: country,
                user_lat: lat,
                user_lng: lng,
                max_results: max.unwrap_or(config.search_max_results),
            };
            commands::run_search(&services, &query, &ctx).await
        }
        Commands::Reverse { lat, lng } => commands::run_reverse(&services, lat, lng).await,
        Commands::Cache {
            command: CacheCommands::Show,
        } => commands::run_cache_show(&services),
        Commands::Cache {
            command: CacheCommands::Clear,
        } => commands::run_cache_clear(&services),
    }
}
