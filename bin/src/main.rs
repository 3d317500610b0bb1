//! Quintil CLI binary.
//!
//! Ranks index members by a fundamental metric and backtests the resulting
//! quintile portfolios. Log output goes to stderr and is filtered with
//! `RUST_LOG` (default `warn`).

mod cmd;
mod data;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "quintil")]
#[command(about = "Quintile backtests of equity ranking metrics", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the source CSV files (defaults to QUINTIL_DATA_DIR, then ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported metrics
    Metrics {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Show descriptions
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the bucket assignment of an index on a date
    Rank {
        /// Index name
        #[arg(short, long, default_value = "nasdaq100")]
        index: String,

        /// Metric to rank on
        #[arg(short, long)]
        metric: String,

        /// Ranking date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Run a rebalanced quintile backtest
    Backtest {
        /// Index name
        #[arg(short, long, default_value = "nasdaq100")]
        index: String,

        /// Metric to rank on
        #[arg(short, long, default_value = "CAPEI")]
        metric: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long, default_value = "2000-06-30")]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long, default_value = "2023-12-31")]
        end: String,

        /// Rebalancing frequency (monthly, quarterly, yearly)
        #[arg(short, long, default_value = "yearly")]
        frequency: String,

        /// Weight members by market cap (forces monthly rebalancing)
        #[arg(long)]
        cap_weighted: bool,

        /// Granularity of the cumulative return table (daily, quarterly, yearly)
        #[arg(short, long, default_value = "yearly")]
        granularity: String,

        /// Leave periods with an empty bucket unrepresented
        #[arg(long)]
        no_fill: bool,

        /// Compare against the index's benchmark (fetched over HTTP)
        #[arg(long)]
        benchmark: bool,

        /// Also report the equal-weighted return of the whole index
        #[arg(long)]
        universe: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Regress holding-period returns on a metric
    Regress {
        /// Index name
        #[arg(short, long, default_value = "nasdaq100")]
        index: String,

        /// Explanatory metric
        #[arg(short, long, default_value = "bm")]
        metric: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long, default_value = "2014-06-30")]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long, default_value = "2024-06-30")]
        end: String,

        /// IQR multiple beyond which points are outliers
        #[arg(short, long, default_value = "3.0")]
        threshold: f64,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let layout = data::layout(cli.data_dir);

    match cli.command {
        Commands::Metrics { category, verbose } => {
            cmd::metrics::list_metrics(category.as_deref(), verbose)?;
        }
        Commands::Rank {
            index,
            metric,
            date,
            format,
        } => {
            cmd::rank::show_ranking(&layout, &index, &metric, &date, &format)?;
        }
        Commands::Backtest {
            index,
            metric,
            start,
            end,
            frequency,
            cap_weighted,
            granularity,
            no_fill,
            benchmark,
            universe,
            format,
        } => {
            let args = cmd::backtest::BacktestArgs {
                index,
                metric,
                start,
                end,
                frequency,
                cap_weighted,
                granularity,
                fill_empty_periods: !no_fill,
                benchmark,
                universe,
                format,
            };
            cmd::backtest::run_backtest(&layout, &args).await?;
        }
        Commands::Regress {
            index,
            metric,
            start,
            end,
            threshold,
            format,
        } => {
            cmd::regress::run_regression(&layout, &index, &metric, &start, &end, threshold, &format)?;
        }
    }

    Ok(())
}
