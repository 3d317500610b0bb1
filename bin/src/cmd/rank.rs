//! Ranking command implementation.

use crate::data::{self, Format};
use anyhow::Result;
use quintil::{Bucket, Ranker};
use quintil::data::DataLayout;

/// Show how an index's members fall into buckets on a date.
pub(crate) fn show_ranking(
    layout: &DataLayout,
    index: &str,
    metric: &str,
    date: &str,
    format: &str,
) -> Result<()> {
    let format = data::parse_format(format)?;
    let date = data::parse_date(date)?;
    let (preset, market) = data::load_market(layout, index)?;

    let ranking = Ranker::new(&market).rank_by_name(date, preset.name(), metric)?;

    if format == Format::Json {
        println!("{}", serde_json::to_string_pretty(&ranking)?);
        return Ok(());
    }

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Quintile Ranking                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Index:    {}", ranking.index);
    println!("Metric:   {} ({})", ranking.metric, ranking.metric.description());
    println!("Date:     {}", ranking.date);
    println!("Ranked:   {}", ranking.len());
    println!("Excluded: {} (missing value)", ranking.excluded());
    println!();

    for bucket in Bucket::ALL {
        let members = ranking.bucket(bucket);
        println!("{} ({} members)", bucket.label(), members.len());
        println!("{}", "-".repeat(60));
        for member in members {
            println!("  {:10} {:>14.4}", member.ticker, member.value);
        }
        println!();
    }

    Ok(())
}
