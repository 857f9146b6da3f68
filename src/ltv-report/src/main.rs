//! LTV Report — batch lifetime-value report over a bookings database.
//!
//! Single-shot pipeline: read the bookings database, assign cohorts,
//! aggregate per-cohort metrics, render, exit.

use chrono::Utc;
use clap::Parser;
use ltv_core::config::AppConfig;
use ltv_core::types::BookerId;
use ltv_reporting::{
    assign_cohorts, build_report, cutoff_timestamp, render_csv, render_html, render_json,
    NumberFormat,
};
use ltv_store::BookingStore;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ltv-report")]
#[command(about = "Cohort lifetime-value report over a bookings database")]
#[command(version)]
struct Cli {
    /// Bookings database URL (overrides config)
    #[arg(long, env = "LTV_REPORT__DATABASE__URL")]
    database_url: Option<String>,

    /// Cohort period in months (overrides config)
    #[arg(long, env = "LTV_REPORT__REPORT__PERIOD_MONTHS")]
    period: Option<u32>,

    /// Commission fraction for the LTV column (overrides config)
    #[arg(long, env = "LTV_REPORT__REPORT__COMMISSION")]
    commission: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Html,
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ltv_report=info,ltv_store=info,ltv_reporting=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    if let Some(period) = cli.period {
        config.report.period_months = period;
    }
    if let Some(commission) = cli.commission {
        config.report.commission = commission;
    }

    info!(
        database = %config.database.url,
        period_months = config.report.period_months,
        commission = config.report.commission,
        "Configuration loaded"
    );

    let store = BookingStore::connect(&config.database.url).await?;

    let tz = config.report.timezone();
    let now = Utc::now().with_timezone(&tz);
    let cutoff = cutoff_timestamp(now, config.report.period_months);

    let first_bookings = store.first_bookings_before(cutoff).await?;
    info!(
        bookers = first_bookings.len(),
        cutoff, "Qualifying bookers identified"
    );

    let assignments = assign_cohorts(&first_bookings, &tz);
    let booker_ids: Vec<BookerId> = first_bookings.iter().map(|f| f.booker_id).collect();
    let totals = store.booker_totals(&booker_ids).await?;

    let report = build_report(&assignments, &totals, &config.report);
    info!(cohorts = report.total_rows, "Report computed");

    let fmt = NumberFormat::from(&config.format);
    let document = match cli.format {
        OutputFormat::Html => render_html(&report, &fmt),
        OutputFormat::Csv => render_csv(&report),
        OutputFormat::Json => render_json(&report)?,
    };

    match cli.output {
        Some(path) => {
            std::fs::write(&path, &document)?;
            info!(path = %path.display(), bytes = document.len(), "Report written");
        }
        None => println!("{document}"),
    }

    Ok(())
}
