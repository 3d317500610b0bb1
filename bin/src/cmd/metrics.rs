//! Metric listing command implementation.

use anyhow::Result;
use quintil::rank::{MetricCategory, metrics_by_category};

/// List supported metrics, optionally filtered by category.
pub(crate) fn list_metrics(category: Option<&str>, verbose: bool) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Available Metrics                         ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let categories: Vec<MetricCategory> = match category {
        Some(filter) => vec![filter.parse()?],
        None => MetricCategory::ALL.to_vec(),
    };

    for cat in categories {
        let metrics = metrics_by_category(cat);
        if metrics.is_empty() {
            continue;
        }

        println!("{} ({}): {}", cat.name(), metrics.len(), cat.description());
        println!("{}", "-".repeat(60));
        for info in metrics {
            if verbose {
                println!("  {:20} - {}", info.name, info.description);
            } else {
                println!("  {}", info.name);
            }
        }
        println!();
    }

    if !verbose {
        println!("Use --verbose for metric descriptions.\n");
    }

    Ok(())
}
