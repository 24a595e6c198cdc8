//! API client for the hierarchy and metrics endpoints

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;
use view_lib::view::{FetchRequest, SnapshotSource};
use view_lib::{
    parse_edges, parse_groups, parse_nodes, Entity, GraphEdge, GraphNode, LogicalGroup,
    ALL_SERVICES,
};

/// API client for the inventory backend
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let mut base_url = Url::parse(base_url).context("Invalid API URL")?;
        // Relative joins replace the last segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    /// Build an endpoint URL from a relative path and query pairs
    pub fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.join(path).context("Invalid path")?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Make a GET request; an empty body reads as null
    pub async fn get_json(&self, url: Url) -> Result<Value> {
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        let body = response.text().await.context("Failed to read response")?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).context("Failed to parse response")
    }

    /// Fetch all logical groups
    pub async fn get_groups(&self) -> Result<Vec<LogicalGroup>> {
        let url = self.endpoint("groups", &[])?;
        let body = self.get_json(url).await?;
        Ok(parse_groups(&body)?)
    }

    /// Fetch network graph nodes, narrowed to a service when one is named
    pub async fn get_nodes(&self, service: Option<&str>) -> Result<Vec<GraphNode>> {
        let url = self.endpoint("nodes", &service_query(service))?;
        let body = self.get_json(url).await?;
        Ok(parse_nodes(&body)?)
    }

    /// Fetch network graph edges, narrowed to a service when one is named
    pub async fn get_edges(&self, service: Option<&str>) -> Result<Vec<GraphEdge>> {
        let url = self.endpoint("edges", &service_query(service))?;
        let body = self.get_json(url).await?;
        Ok(parse_edges(&body)?)
    }
}

/// `service` is only sent for a concrete service name
fn service_query(service: Option<&str>) -> Vec<(&'static str, String)> {
    match service {
        Some(name) if !name.is_empty() && name != ALL_SERVICES => {
            vec![("service", name.to_string())]
        }
        _ => Vec::new(),
    }
}

#[async_trait]
impl SnapshotSource for ApiClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<Option<Entity>> {
        let url = self.endpoint(&request.path(), &request.query())?;
        let body = self.get_json(url).await?;
        Ok(Entity::from_response(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use view_lib::view::{DrillTarget, SnapshotKind, ViewMode};

    fn client(url: &str) -> ApiClient {
        ApiClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = client("http://inventory.local:3030/api");
        let url = api
            .endpoint("metrics/node", &[("name", "worker 1".to_string())])
            .unwrap();
        assert_eq!(url.as_str(), "http://inventory.local:3030/api/metrics/node?name=worker+1");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_fetch_physical_root() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/metrics")
            .match_query(Matcher::UrlEncoded("view".into(), "physical".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": {"name": "cluster", "type": "cluster",
                    "node": [{"name": "worker-1", "type": "node"}]}}"#,
            )
            .create_async()
            .await;

        let api = client(&server.url());
        let snapshot = api
            .fetch(&FetchRequest::root(SnapshotKind::Metrics, ViewMode::Physical))
            .await
            .unwrap()
            .unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.name.as_deref(), Some("cluster"));
        assert!(snapshot.find_child("worker-1", Some("node")).is_some());
    }

    #[tokio::test]
    async fn test_fetch_drill_in() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/hierarchy/namespace")
            .match_query(Matcher::UrlEncoded("name".into(), "default".into()))
            .with_status(200)
            .with_body(r#"{"name":"default","type":"namespace","pod":[]}"#)
            .create_async()
            .await;

        let request = FetchRequest {
            kind: SnapshotKind::Hierarchy,
            mode: ViewMode::Physical,
            drill: Some(DrillTarget {
                kind: "namespace".into(),
                name: "default".into(),
            }),
        };
        let snapshot = client(&server.url()).fetch(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.and_then(|s| s.kind), Some("namespace".to_string()));
    }

    #[tokio::test]
    async fn test_empty_body_is_no_snapshot() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/hierarchy")
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let snapshot = client(&server.url())
            .fetch(&FetchRequest::root(SnapshotKind::Hierarchy, ViewMode::Logical))
            .await
            .unwrap();
        assert!(snapshot.is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/groups")
            .with_status(503)
            .with_body("dgraph unavailable")
            .create_async()
            .await;

        let err = client(&server.url()).get_groups().await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("dgraph unavailable"));
    }

    #[tokio::test]
    async fn test_get_groups() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/groups")
            .with_status(200)
            .with_body(r#"[{"name":"payments","podsCount":3,"cpu":1.5,"mtdCost":12.4}]"#)
            .create_async()
            .await;

        let groups = client(&server.url()).get_groups().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pods_count, 3);
    }

    #[test]
    fn test_service_query_skips_all() {
        assert!(service_query(None).is_empty());
        assert!(service_query(Some("ALL")).is_empty());
        assert_eq!(service_query(Some("checkout")), vec![("service", "checkout".to_string())]);
    }

    #[tokio::test]
    async fn test_get_nodes_for_service() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/nodes")
            .match_query(Matcher::UrlEncoded("service".into(), "checkout".into()))
            .with_status(200)
            .with_body(r#"[{"id":1,"label":"web","cid":["checkout"]},{"id":2}]"#)
            .create_async()
            .await;

        let nodes = client(&server.url()).get_nodes(Some("checkout")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].cid, vec!["checkout"]);
        assert!(nodes[1].cid.is_empty());
    }

    #[tokio::test]
    async fn test_get_edges_without_service() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/edges")
            .match_query(Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"data":[{"from":1,"to":2}]}"#)
            .create_async()
            .await;

        let edges = client(&server.url()).get_edges(Some("ALL")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(edges.len(), 1);
    }
}
