//! Topology view commands

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;
use view_lib::view::{
    ControllerConfig, SnapshotSource, ViewController, ViewMode, ViewState, ViewStatus, ViewTable,
};
use view_lib::{TopologyRow, TOPOLOGY_COLUMN_NAMES};

use super::{load_view, ViewOptions};
use crate::output::{
    color_status, format_timestamp, print_json, print_table, print_warning, OutputFormat,
};

/// Row for the topology table
#[derive(Tabled, Serialize)]
struct TopologyRowView {
    #[tabled(rename = "Child")]
    child: String,
    #[tabled(rename = "Parent")]
    parent: String,
    #[tabled(rename = "Type")]
    kind: String,
}

impl From<&TopologyRow> for TopologyRowView {
    fn from(row: &TopologyRow) -> Self {
        Self {
            child: row.child.display.clone(),
            parent: row.parent.clone().unwrap_or_default(),
            kind: row.value.clone(),
        }
    }
}

/// Chart payload for the topology view
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TopologyPayload<'a> {
    status: ViewStatus,
    mode: ViewMode,
    columns: [&'static str; 3],
    rows: &'a [TopologyRow],
    filter_names: &'a [String],
    updated_at: Option<DateTime<Utc>>,
}

/// Show the parent/child topology of the hierarchy
pub async fn show_topology<S: SnapshotSource>(
    source: S,
    options: ViewOptions,
    config: ControllerConfig,
    format: OutputFormat,
) -> Result<()> {
    let state = ViewState::topology().with_mode(options.mode);
    let mut controller = ViewController::new(source, state, config);
    let status = load_view(&mut controller, &options).await?;

    let state = controller.state();
    let ViewTable::Topology(table) = state.table() else {
        return Ok(());
    };

    match format {
        OutputFormat::Json => print_json(&TopologyPayload {
            status,
            mode: state.mode(),
            columns: TOPOLOGY_COLUMN_NAMES,
            rows: &table.rows,
            filter_names: &table.filter_names,
            updated_at: state.updated_at(),
        }),
        OutputFormat::Table => {
            if status != ViewStatus::Ready {
                print_warning(&format!("No topology data ({})", color_status(status)));
                return Ok(());
            }

            let rows: Vec<TopologyRowView> = table.rows.iter().map(Into::into).collect();
            println!("{}", "Topology".bold());
            print_table(&rows, format);

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
