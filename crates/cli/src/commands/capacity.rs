//! Capacity view commands

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;
use tracing::warn;
use view_lib::view::{
    ControllerConfig, SnapshotSource, ViewController, ViewMode, ViewState, ViewStatus, ViewTable,
};
use view_lib::{AllocationRatios, Metric, Row, COLUMN_NAMES};

use super::{load_view, ViewOptions};
use crate::commands::ratios::print_ratios;
use crate::output::{
    color_status, format_timestamp, format_value, print_json, print_table, print_warning,
    OutputFormat,
};

/// Row for the capacity table
#[derive(Tabled, Serialize)]
struct CapacityRowView {
    #[tabled(rename = "Child")]
    child: String,
    #[tabled(rename = "Parent")]
    parent: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&Row> for CapacityRowView {
    fn from(row: &Row) -> Self {
        Self {
            child: row.child.value.clone(),
            parent: row.parent.clone().unwrap_or_default(),
            kind: row.child.entity_type.clone().unwrap_or_else(|| "-".to_string()),
            value: format_value(row.value),
        }
    }
}

/// Chart payload for the capacity view
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CapacityPayload<'a> {
    status: ViewStatus,
    mode: ViewMode,
    metric: &'a str,
    columns: [&'static str; 3],
    rows: &'a [Row],
    filter_names: &'a [String],
    updated_at: Option<DateTime<Utc>>,
    ratios: Option<&'a AllocationRatios>,
}

/// Show metric-weighted rows and allocation ratios
pub async fn show_capacity<S: SnapshotSource>(
    source: S,
    metric: &str,
    options: ViewOptions,
    config: ControllerConfig,
    format: OutputFormat,
) -> Result<()> {
    if metric.parse::<Metric>().is_err() {
        warn!(metric, "unknown metric, values will read as 0");
    }

    let state = ViewState::capacity(metric).with_mode(options.mode);
    let mut controller = ViewController::new(source, state, config);
    let status = load_view(&mut controller, &options).await?;

    let state = controller.state();
    let ViewTable::Capacity(table) = state.table() else {
        return Ok(());
    };

    match format {
        OutputFormat::Json => print_json(&CapacityPayload {
            status,
            mode: state.mode(),
            metric: state.metric(),
            columns: COLUMN_NAMES,
            rows: &table.rows,
            filter_names: &table.filter_names,
            updated_at: state.updated_at(),
            ratios: state.ratios(),
        }),
        OutputFormat::Table => {
            if status != ViewStatus::Ready {
                print_warning(&format!("No capacity data ({})", color_status(status)));
                return Ok(());
            }

            println!("{} {}", "Capacity by".bold(), state.metric().cyan());
            let rows: Vec<CapacityRowView> = table.rows.iter().map(Into::into).collect();
            print_table(&rows, format);

            if let Some(ratios) = state.ratios() {
                println!();
                print_ratios(ratios);
            }

            if !table.filter_names.is_empty() {
                println!("{} {}", "Drill into:".dimmed(), table.filter_names.join(", "));
            }
            if let Some(updated) = state.updated_at() {
                println!("Last updated: {}", format_timestamp(&updated).dimmed());
            }
        }
    }

    Ok(())
}
