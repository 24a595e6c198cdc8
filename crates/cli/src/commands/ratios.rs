//! Allocation ratios for a saved snapshot

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tabled::Tabled;
use view_lib::{compute_allocation_ratios, AllocationRatios, Metric};

use crate::output::{color_ratio, format_value, print_json, print_table, OutputFormat};
use crate::source::FileSource;

/// Row for the ratios table
#[derive(Tabled, serde::Serialize)]
struct RatioRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Allocated")]
    allocated: String,
    #[tabled(rename = "Capacity")]
    capacity: String,
    #[tabled(rename = "Ratio")]
    ratio: String,
}

/// Print an allocation ratio table
pub fn print_ratios(ratios: &AllocationRatios) {
    let rows: Vec<RatioRow> = Metric::ALL
        .iter()
        .map(|&metric| {
            let ratio = ratios.get(metric);
            RatioRow {
                resource: metric.to_string(),
                allocated: format_value(ratio.allocated),
                capacity: format_value(ratio.capacity),
                ratio: color_ratio(ratio),
            }
        })
        .collect();

    println!("{} {}", "Allocation".bold(), ratios.resource_kind.to_string().cyan());
    print_table(&rows, OutputFormat::Table);
}

/// Compute ratios for the root of a snapshot file
pub async fn show_ratios(path: &Path, format: OutputFormat) -> Result<()> {
    let root = FileSource::new(path)
        .read()
        .await?
        .with_context(|| format!("{} contains no snapshot", path.display()))?;

    let ratios = compute_allocation_ratios(&root);

    match format {
        OutputFormat::Json => print_json(&ratios),
        OutputFormat::Table => print_ratios(&ratios),
    }

    Ok(())
}
