//! `pharmstock`: inventory forecasts and reorder advice over a JSON snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use pharmstock_cli::Snapshot;
use pharmstock_core::{Clock, FixedClock, ProductId, SystemClock};
use pharmstock_forecast::{
    BulkForecastOrchestrator, BulkForecastRequest, ForecastEngine, NoiseMode, ReorderRecommendations, Urgency,
};
use pharmstock_infra::ForecastSettings;
use pharmstock_inventory::ProductFilter;
use pharmstock_observability::LogFormat;

#[derive(Parser)]
#[command(name = "pharmstock")]
#[command(version, about = "Pharmacy inventory forecasting and reorder advice")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Inventory snapshot (JSON with `products` and `movements`)
    #[arg(short, long, global = true, env = "PHARMSTOCK_SNAPSHOT", default_value = "snapshot.json")]
    snapshot: PathBuf,

    /// Evaluate as of this instant (RFC 3339) instead of the system clock
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,

    /// Seed the consumption noise so output is reproducible
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Disable consumption noise entirely
    #[arg(long, global = true, conflicts_with = "seed")]
    no_noise: bool,

    /// Log format (logs go to stderr)
    #[arg(long, global = true, default_value = "json")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast stock and reorder needs for one product
    Forecast {
        product_id: ProductId,

        /// Days to project (defaults to PHARMSTOCK_FORECAST_DAYS or 30)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Forecast many products, most urgent first, with reorder recommendations
    Bulk {
        /// Only products at or below their reorder level
        #[arg(long)]
        low_stock_only: bool,

        /// Maximum number of products to forecast
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Days to project (defaults to PHARMSTOCK_FORECAST_DAYS or 30)
        #[arg(short, long)]
        days: Option<u32>,

        /// Lowest urgency included in the recommendations
        #[arg(long, value_enum, default_value = "low")]
        min_urgency: UrgencyArg,
    },

    /// Consumption statistics for one product over a single window
    Analyze {
        product_id: ProductId,

        /// Window length in days
        #[arg(short, long, default_value = "30")]
        window: u32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UrgencyArg {
    Low,
    Medium,
    High,
}

impl From<UrgencyArg> for Urgency {
    fn from(arg: UrgencyArg) -> Self {
        match arg {
            UrgencyArg::Low => Urgency::Low,
            UrgencyArg::Medium => Urgency::Medium,
            UrgencyArg::High => Urgency::High,
        }
    }
}

#[derive(Serialize)]
struct BulkOutput {
    report: pharmstock_forecast::BulkForecastReport,
    recommendations: ReorderRecommendations,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    pharmstock_observability::init_with(cli.log_format);

    let settings = ForecastSettings::from_env();
    let mut config = settings.forecast;
    if let Some(seed) = cli.seed {
        config = config.with_noise(NoiseMode::Seeded(seed));
    } else if cli.no_noise {
        config = config.with_noise(NoiseMode::Disabled);
    }
    let default_days = config.default_forecast_days;

    let clock: Arc<dyn Clock> = match cli.now {
        Some(at) => Arc::new(FixedClock::new(at)),
        None => Arc::new(SystemClock),
    };

    let snapshot = Snapshot::load(&cli.snapshot)?;
    info!(
        snapshot = %cli.snapshot.display(),
        products = snapshot.products.len(),
        movements = snapshot.movements.len(),
        "snapshot loaded"
    );
    let (products, movements) = snapshot.into_repositories()?;
    let engine = Arc::new(ForecastEngine::new(products, movements, clock, config));

    match cli.command {
        Commands::Forecast { product_id, days } => {
            let forecast = engine
                .forecast_product(product_id, days.unwrap_or(default_days))
                .await
                .with_context(|| format!("forecasting product {product_id}"))?;
            print_json(&forecast)
        }
        Commands::Bulk {
            low_stock_only,
            limit,
            days,
            min_urgency,
        } => {
            let request = BulkForecastRequest {
                filter: ProductFilter { low_stock_only },
                forecast_days: days.unwrap_or(default_days),
                limit,
            };
            let report = BulkForecastOrchestrator::new(engine)
                .forecast_many(request)
                .await
                .context("bulk forecast")?;
            let recommendations = ReorderRecommendations::from_forecasts(&report.forecasts, min_urgency.into());
            print_json(&BulkOutput {
                report,
                recommendations,
            })
        }
        Commands::Analyze { product_id, window } => {
            let analysis = engine
                .analyze_consumption(product_id, window)
                .await
                .with_context(|| format!("analyzing product {product_id}"))?;
            print_json(&analysis)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
