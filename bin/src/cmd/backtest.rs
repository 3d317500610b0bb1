//! Backtest command implementation.

use crate::data::{self, Format, pct};
use anyhow::Result;
use chrono::Datelike;
use quintil::bench::{BenchmarkClient, TRADING_DAYS_PER_YEAR};
use quintil::data::{DataLayout, IndexPreset};
use quintil::eval::{
    CagrRow, Granularity, PerformanceSummary, PeriodRow, PortfolioStats, YearTable,
    benchmark_rows, cumulative_growth, resample,
};
use quintil::traits::month_start;
use quintil::{
    Bucket, Cadence, Date, Metric, PortfolioAnalysis, RebalanceConfig, RebalanceResult,
    Rebalancer, Weighting,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Arguments of the backtest command.
#[derive(Debug)]
pub(crate) struct BacktestArgs {
    pub(crate) index: String,
    pub(crate) metric: String,
    pub(crate) start: String,
    pub(crate) end: String,
    pub(crate) frequency: String,
    pub(crate) cap_weighted: bool,
    pub(crate) granularity: String,
    pub(crate) fill_empty_periods: bool,
    pub(crate) benchmark: bool,
    pub(crate) universe: bool,
    pub(crate) format: String,
}

/// Label of the equal-weighted whole-index portfolio.
const UNIVERSE_LABEL: &str = "Universe";

#[derive(Serialize)]
struct BucketSummary {
    portfolio: &'static str,
    #[serde(flatten)]
    summary: PerformanceSummary,
}

#[derive(Serialize)]
struct BacktestReport<'a> {
    config: &'a RebalanceConfig,
    cadence: Cadence,
    granularity: Granularity,
    periods: &'a [Date],
    stats: Vec<&'a PortfolioStats>,
    cagr: Vec<CagrRow>,
    year_table: YearTable,
    summary: Vec<BucketSummary>,
    cumulative: BTreeMap<&'static str, Vec<(Date, f64)>>,
}

/// Run a rebalanced quintile backtest and print its analysis.
pub(crate) async fn run_backtest(layout: &DataLayout, args: &BacktestArgs) -> Result<()> {
    let format = data::parse_format(&args.format)?;
    let granularity: Granularity = args.granularity.parse()?;
    let (preset, market) = data::load_market(layout, &args.index)?;

    let config = RebalanceConfig {
        index: preset.name().to_string(),
        metric: args.metric.parse::<Metric>()?,
        start_date: data::parse_date(&args.start)?,
        end_date: data::parse_date(&args.end)?,
        cadence: args.frequency.parse()?,
        weighting: if args.cap_weighted {
            Weighting::CapWeighted
        } else {
            Weighting::Equal
        },
        fill_empty_periods: args.fill_empty_periods,
    };

    let rebalancer = Rebalancer::new(&market, config);
    let result = rebalancer.run()?;

    let mut analysis = PortfolioAnalysis::new(&result);
    if args.benchmark
        && let Some(rows) = fetch_benchmark(preset, &result).await
    {
        analysis = analysis.with_benchmark(rows);
    }

    let per_year = periods_per_year(granularity, result.config.weighting);
    let mut summary = Vec::with_capacity(Bucket::ALL.len());
    let mut cumulative = BTreeMap::new();
    for bucket in Bucket::ALL {
        let resampled = resample(result.series(bucket).series(), granularity);
        summary.push(BucketSummary {
            portfolio: bucket.label(),
            summary: PerformanceSummary::from_series(&resampled, per_year),
        });
        cumulative.insert(bucket.label(), cumulative_growth(&resampled));
    }
    if args.universe {
        let resampled = resample(&rebalancer.universe_returns()?, granularity);
        summary.push(BucketSummary {
            portfolio: UNIVERSE_LABEL,
            summary: PerformanceSummary::from_series(&resampled, per_year),
        });
        cumulative.insert(UNIVERSE_LABEL, cumulative_growth(&resampled));
    }

    let report = BacktestReport {
        config: &result.config,
        cadence: result.cadence,
        granularity,
        periods: &result.periods,
        stats: Bucket::ALL
            .into_iter()
            .flat_map(|b| result.stats(b))
            .collect(),
        cagr: analysis.cagr(),
        year_table: analysis.year_table(),
        summary,
        cumulative,
    };

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print_report(&report),
    }

    Ok(())
}

/// Observations per year of a series resampled to `granularity`.
const fn periods_per_year(granularity: Granularity, weighting: Weighting) -> usize {
    match (granularity, weighting) {
        (Granularity::Daily, Weighting::Equal) => TRADING_DAYS_PER_YEAR,
        (Granularity::Daily, Weighting::CapWeighted) => 12,
        (Granularity::Quarterly, _) => 4,
        (Granularity::Yearly, _) => 1,
    }
}

/// Fetch range, month and first year of benchmark rows matching yearly periods.
fn benchmark_window(periods: &[Date]) -> Option<(Date, Date, u32, i32)> {
    let first = *periods.first()?;
    let last = *periods.last()?;
    let end = Date::from_ymd_opt(last.year() + 1, last.month(), 1)?;
    Some((month_start(first), end, first.month(), first.year() + 1))
}

/// Trailing one-year benchmark returns sampled at the rebalancing month.
///
/// Best effort: failures are reported and the comparison is skipped.
async fn fetch_benchmark(preset: IndexPreset, result: &RebalanceResult) -> Option<Vec<PeriodRow>> {
    if result.cadence != Cadence::Yearly {
        eprintln!("Warning: benchmark comparison needs yearly rebalancing; skipped");
        return None;
    }
    let (start, end, month, from_year) = benchmark_window(&result.periods)?;
    let symbol = preset.benchmark_symbol();

    let client = match BenchmarkClient::from_env() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "benchmark client unavailable");
            eprintln!("Warning: benchmark unavailable: {e}");
            return None;
        }
    };

    match client
        .rolling_returns(symbol, start, end, TRADING_DAYS_PER_YEAR)
        .await
    {
        Ok(rolling) => {
            let label = result.config.index.to_uppercase();
            Some(benchmark_rows(&rolling, &label, month, from_year))
        }
        Err(e) => {
            tracing::warn!(symbol, error = %e, "benchmark fetch failed");
            eprintln!("Warning: benchmark {symbol} unavailable: {e}");
            None
        }
    }
}

fn print_report(report: &BacktestReport<'_>) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Quintile Backtest                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let config = report.config;
    println!("Index:     {}", config.index);
    println!("Metric:    {} ({})", config.metric, config.metric.description());
    println!("Period:    {} to {}", config.start_date, config.end_date);
    println!("Cadence:   {}", report.cadence);
    println!("Weighting: {}", config.weighting);
    println!("Periods:   {}", report.periods.len());
    println!();

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("PORTFOLIO STATISTICS");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    println!(
        "  {:6} {:>10} {:>7} {:>12} {:>12} {:>12} {:>10}",
        "Bucket", "Start", "Stocks", "Min", "Max", "Mean", "Return"
    );
    for stats in &report.stats {
        println!(
            "  {:6} {:>10} {:>7} {:>12.4} {:>12.4} {:>12.4} {:>10}",
            stats.bucket.label(),
            stats.period_start,
            stats.tickers.len(),
            stats.min,
            stats.max,
            stats.mean,
            pct(stats.period_return)
        );
    }
    println!();

    println!("Compounded Annual Growth Rate:");
    for row in &report.cagr {
        println!("  {:12} {:>10}", row.portfolio, pct(row.cagr));
    }
    println!();

    println!("Returns by Year:");
    print!("  {:12}", "");
    for year in &report.year_table.years {
        print!(" {year:>9}");
    }
    println!();
    for (portfolio, values) in report.year_table.portfolios.iter().zip(&report.year_table.values) {
        print!("  {portfolio:12}");
        for value in values {
            print!(" {:>9}", value.map_or_else(|| "-".to_string(), pct));
        }
        println!();
    }
    println!();

    println!("Performance ({} returns):", report.granularity);
    println!(
        "  {:6} {:>12} {:>12} {:>8} {:>12}",
        "Bucket", "Total", "Ann. Vol", "Sharpe", "Max DD"
    );
    for row in &report.summary {
        println!(
            "  {:6} {:>12} {:>12} {:>8.2} {:>12}",
            row.portfolio,
            pct(row.summary.total_return),
            pct(row.summary.annualized_volatility),
            row.summary.sharpe_ratio,
            pct(row.summary.max_drawdown)
        );
    }
    println!();

    println!("Growth of 1 ({}):", report.granularity);
    print!("  {:10}", "Date");
    for bucket in Bucket::ALL {
        print!(" {:>8}", bucket.label());
    }
    println!();
    for (date, levels) in growth_table(&report.cumulative) {
        print!("  {date:10}");
        for level in levels {
            match level {
                Some(v) => print!(" {v:>8.3}"),
                None => print!(" {:>8}", "-"),
            }
        }
        println!();
    }
    println!();
}

/// Rows of cumulative growth on the union of bucket dates, in bucket order.
fn growth_table(
    cumulative: &BTreeMap<&'static str, Vec<(Date, f64)>>,
) -> BTreeMap<Date, Vec<Option<f64>>> {
    let mut table: BTreeMap<Date, Vec<Option<f64>>> = BTreeMap::new();
    for (col, bucket) in Bucket::ALL.iter().enumerate() {
        let Some(points) = cumulative.get(bucket.label()) else {
            continue;
        };
        for (date, level) in points {
            table.entry(*date).or_insert_with(|| vec![None; Bucket::ALL.len()])[col] = Some(*level);
        }
    }
    table
}
