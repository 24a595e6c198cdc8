//! Network graph commands

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;
use view_lib::{
    filter_by_service, service_list, GraphEdge, GraphNode, StructuredLogger, ALL_SERVICES,
};

use crate::client::ApiClient;
use crate::output::{print_json, print_table, OutputFormat};

/// Row for the nodes table
#[derive(Tabled, Serialize)]
struct NodeRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Services")]
    services: String,
}

impl From<&GraphNode> for NodeRow {
    fn from(node: &GraphNode) -> Self {
        Self {
            id: node.id.to_string(),
            label: node.label.clone().unwrap_or_default(),
            services: node.cid.join(", "),
        }
    }
}

/// Row for the edges table
#[derive(Tabled, Serialize)]
struct EdgeRow {
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
}

impl From<&GraphEdge> for EdgeRow {
    fn from(edge: &GraphEdge) -> Self {
        Self {
            from: edge.from.to_string(),
            to: edge.to.to_string(),
        }
    }
}

/// Row for the service list
#[derive(Tabled, Serialize)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    service: String,
}

#[derive(Serialize)]
struct GraphPayload<'a> {
    service: &'a str,
    services: Vec<String>,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

/// Show the network graph, filtered to one service and its neighbours
pub async fn show_graph(
    client: &ApiClient,
    service: Option<&str>,
    list_services: bool,
    format: OutputFormat,
) -> Result<()> {
    let service = service.unwrap_or(ALL_SERVICES);
    let (nodes, edges) = tokio::try_join!(
        client.get_nodes(Some(service)),
        client.get_edges(Some(service))
    )?;

    let services = service_list(&nodes);
    if list_services {
        let rows: Vec<ServiceRow> = services
            .into_iter()
            .map(|service| ServiceRow { service })
            .collect();
        print_table(&rows, format);
        return Ok(());
    }

    let graph = filter_by_service(&nodes, &edges, Some(service));
    StructuredLogger::new("graph").log_graph_filtered(
        service,
        graph.nodes.len(),
        graph.edges.len(),
    );

    match format {
        OutputFormat::Json => print_json(&GraphPayload {
            service,
            services,
            nodes: graph.nodes,
            edges: graph.edges,
        }),
        OutputFormat::Table => {
            let nodes: Vec<NodeRow> = graph.nodes.iter().map(NodeRow::from).collect();
            let edges: Vec<EdgeRow> = graph.edges.iter().map(EdgeRow::from).collect();
            print_table(&nodes, format);
            print_table(&edges, format);
        }
    }

    Ok(())
}
