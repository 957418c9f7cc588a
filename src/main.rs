use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trendscope::config::Config;
use trendscope::engine::TrendEngine;
use trendscope::freshness::FreshnessCoordinator;
use trendscope::models::Computed;
use trendscope::storage::SqliteTrendStore;

#[derive(Parser)]
#[command(
    name = "trendscope",
    version,
    about = "Resale fashion trend analytics over a local observation store",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    /// SQLite database path (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the trend score for a keyword
    Score {
        /// Keyword to score
        keyword: String,

        /// Analysis period in days
        #[arg(short, long, default_value = "30")]
        period: u32,
    },

    /// Classify a keyword's lifecycle stage
    Stage {
        /// Keyword to classify
        keyword: String,

        /// Analysis period in days
        #[arg(short, long, default_value = "30")]
        period: u32,
    },

    /// Forecast a keyword's volume
    Forecast {
        /// Keyword to forecast
        keyword: String,

        /// Forecast horizon in days (7, 14 or 30)
        #[arg(long, default_value = "14")]
        horizon: u32,
    },

    /// Forecast rank movement across the tracked keyword set
    Rank {
        /// Show only rising keywords currently outside the top 10
        #[arg(long)]
        challengers: bool,
    },

    /// Correlate a keyword against the rest of the tracked set
    Correlate {
        /// Target keyword
        keyword: String,

        /// Analysis period in days
        #[arg(short, long, default_value = "90")]
        period: u32,
    },

    /// Monthly seasonal profile of a keyword
    Seasonal {
        /// Keyword to profile
        keyword: String,
    },

    /// Top keywords by stored composite score
    Top {
        /// Analysis period in days
        #[arg(short, long, default_value = "30")]
        period: u32,

        /// Number of keywords to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// List the keyword registry
    Keywords,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(db) = cli.db {
        config.database.sqlite_path = db;
    }
    config.validate()?;

    // The CLI reads the local store only; scraping belongs to the service
    // process, so no sources are registered here.
    let store = Arc::new(SqliteTrendStore::new(&config.database.sqlite_path)?);
    let coordinator = Arc::new(FreshnessCoordinator::new(store.clone(), vec![], &config));
    let engine = TrendEngine::new(store, coordinator, &config);

    match cli.command {
        Commands::Score { keyword, period } => {
            tracing::info!(keyword = %keyword, period = %period, "Starting score command");
            print_computed(engine.score(&keyword, period)?)?;
        }

        Commands::Stage { keyword, period } => {
            tracing::info!(keyword = %keyword, period = %period, "Starting stage command");
            print_computed(engine.lifecycle_stage(&keyword, period)?)?;
        }

        Commands::Forecast { keyword, horizon } => {
            tracing::info!(keyword = %keyword, horizon = %horizon, "Starting forecast command");
            print_computed(engine.forecast(&keyword, horizon)?)?;
        }

        Commands::Rank { challengers } => {
            tracing::info!(challengers = %challengers, "Starting rank command");
            let forecasts = engine.rank_forecast()?;
            if challengers {
                print_json(&trendscope::analytics::challengers(&forecasts))?;
            } else {
                print_json(&forecasts)?;
            }
        }

        Commands::Correlate { keyword, period } => {
            tracing::info!(keyword = %keyword, period = %period, "Starting correlate command");
            print_json(&engine.correlations(&keyword, period)?)?;
        }

        Commands::Seasonal { keyword } => {
            tracing::info!(keyword = %keyword, "Starting seasonal command");
            print_json(&engine.seasonal_profile(&keyword)?)?;
        }

        Commands::Top { period, limit } => {
            tracing::info!(period = %period, limit = %limit, "Starting top command");
            print_json(&engine.top_trends(period, limit)?)?;
        }

        Commands::Keywords => {
            tracing::info!("Starting keywords command");
            print_json(&engine.keywords()?)?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("trendscope=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("trendscope=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_computed<T: Serialize>(value: Computed<T>) -> Result<()> {
    match value {
        Computed::Ready(value) => print_json(&value),
        Computed::InsufficientData => {
            println!("insufficient data");
            Ok(())
        }
    }
}
