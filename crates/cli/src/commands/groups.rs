//! Logical group commands

use anyhow::Result;
use tabled::Tabled;
use view_lib::{sort_groups, GroupSortKey, LogicalGroup, SortOrder};

use crate::client::ApiClient;
use crate::output::{format_currency, format_value, print_json, print_table, OutputFormat};

/// Row for the groups table
#[derive(Tabled, serde::Serialize)]
struct GroupRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Pods")]
    pods: u64,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Storage")]
    storage: String,
    #[tabled(rename = "MTD Cost")]
    cost: String,
}

impl GroupRow {
    fn new(group: &LogicalGroup, currency: &str) -> Self {
        Self {
            name: group.name.clone(),
            pods: group.pods_count,
            cpu: format_value(group.cpu),
            memory: format_value(group.memory),
            storage: format_value(group.storage),
            cost: format_currency(group.mtd_cost, currency),
        }
    }
}

/// List logical groups, optionally sorted
pub async fn list_groups(
    client: &ApiClient,
    sort: Option<&str>,
    descending: bool,
    currency: &str,
    format: OutputFormat,
) -> Result<()> {
    let mut groups = client.get_groups().await?;

    if let Some(key) = sort {
        let key: GroupSortKey = key.parse()?;
        let order = if descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };
        sort_groups(&mut groups, key, order);
    }

    match format {
        OutputFormat::Json => print_json(&groups),
        OutputFormat::Table => {
            let rows: Vec<GroupRow> = groups.iter().map(|g| GroupRow::new(g, currency)).collect();
            print_table(&rows, format);
        }
    }

    Ok(())
}
