//! Regression command implementation.

use crate::data::{self, Format, pct};
use anyhow::Result;
use quintil::data::DataLayout;
use quintil::{Metric, Regression, RegressionConfig};

/// Regress holding-period returns on a metric and print the fit.
pub(crate) fn run_regression(
    layout: &DataLayout,
    index: &str,
    metric: &str,
    start: &str,
    end: &str,
    threshold: f64,
    format: &str,
) -> Result<()> {
    let format = data::parse_format(format)?;
    let (preset, market) = data::load_market(layout, index)?;

    let config = RegressionConfig {
        index: preset.name().to_string(),
        metric: metric.parse::<Metric>()?,
        start_date: data::parse_date(start)?,
        end_date: data::parse_date(end)?,
        outlier_threshold: threshold,
    };
    let result = Regression::new(&market, config).run()?;

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let config = &result.config;
    let fit = &result.fit;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Metric vs. Return Regression                ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Index:    {}", config.index);
    println!("Metric:   {} ({})", config.metric, config.metric.description());
    println!("Period:   {} to {}", config.start_date, config.end_date);
    println!(
        "Points:   {} ({} removed beyond {} x IQR)",
        fit.n, result.removed, config.outlier_threshold
    );
    println!();

    println!("Fit:");
    println!("  Slope:        {:>12.6}", fit.slope);
    println!("  Intercept:    {:>12.6}", fit.intercept);
    println!("  R:            {:>12.4}", fit.r_value);
    println!("  R-squared:    {:>12.4}", fit.r_squared());
    println!("  P-value:      {:>12.4}", fit.p_value);
    println!("  Std. error:   {:>12.6}", fit.std_err);
    println!();

    println!("Observations:");
    println!("  {:10} {:>14} {:>12}", "Ticker", "Metric", "Return");
    for obs in &result.observations {
        println!(
            "  {:10} {:>14.4} {:>12}",
            obs.ticker,
            obs.metric_value,
            pct(obs.period_return)
        );
    }
    println!();

    Ok(())
}
