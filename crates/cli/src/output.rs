//! Output formatting utilities

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use view_lib::view::ViewStatus;
use view_lib::AllocationRatio;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => print_json(&items),
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to serialize output: {}", e)),
    }
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format a metric value with two decimals
pub fn format_value(value: f64) -> String {
    format!("{:.2}", value)
}

/// Format a timestamp for display
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format currency
pub fn format_currency(amount: f64, currency: &str) -> String {
    match currency {
        "USD" => format!("${:.2}", amount),
        "EUR" => format!("€{:.2}", amount),
        "GBP" => format!("£{:.2}", amount),
        _ => format!("{:.2} {}", amount, currency),
    }
}

/// Format an allocation ratio as a whole percentage
pub fn format_ratio(ratio: &AllocationRatio) -> String {
    match ratio.percent() {
        Some(pct) => format!("{}%", pct),
        None => "n/a".to_string(),
    }
}

/// Color an allocation ratio by how close it is to capacity
pub fn color_ratio(ratio: &AllocationRatio) -> String {
    let formatted = format_ratio(ratio);
    match ratio.percent() {
        Some(pct) if pct >= 90 => formatted.red().to_string(),
        Some(pct) if pct >= 70 => formatted.yellow().to_string(),
        Some(_) => formatted.green().to_string(),
        None => formatted.dimmed().to_string(),
    }
}

/// Color a view status
pub fn color_status(status: ViewStatus) -> String {
    let label = status.to_string();
    match status {
        ViewStatus::Ready => label.green().to_string(),
        ViewStatus::Wait => label.yellow().to_string(),
        ViewStatus::NoData => label.red().to_string(),
    }
}
