//! CLI integration tests

use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

/// Run the CLI with an isolated home directory and no color codes
fn hview(args: &[&str]) -> Output {
    let home = TempDir::new().expect("Failed to create temp home");
    Command::new("cargo")
        .args(["run", "-q", "-p", "hview-cli", "--"])
        .args(args)
        .env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("HVIEW_API_URL")
        .output()
        .expect("Failed to execute command")
}

fn snapshot_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create snapshot file");
    file.write_all(body.as_bytes())
        .expect("Failed to write snapshot file");
    file
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("Output should be JSON")
}

const CLUSTER_SNAPSHOT: &str = r#"{"data": {
    "name": "clusterA", "type": "cluster",
    "cpu": 10, "cpuCost": 5,
    "cpuAllocated": 4, "cpuCapacity": 8,
    "memoryAllocated": 6, "memoryCapacity": 9,
    "namespace": [
        {"name": "default", "type": "namespace", "cpu": 2, "cpuCost": 1,
         "pod": [{"name": "web-1", "type": "pod", "cpu": 1}]},
        {"name": "monitoring", "type": "namespace", "cpu": 3, "cpuCost": 1.5}
    ]
}}"#;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = hview(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Hierarchy View"), "Should show app name");
    assert!(stdout.contains("topology"), "Should show topology command");
    assert!(stdout.contains("capacity"), "Should show capacity command");
    assert!(stdout.contains("groups"), "Should show groups command");
    assert!(stdout.contains("ratios"), "Should show ratios command");
    assert!(stdout.contains("graph"), "Should show graph command");
    assert!(stdout.contains("HVIEW_API_URL"), "Should show env var");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = hview(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("hview"), "Should show binary name");
}

/// Test capacity subcommand help
#[test]
fn test_capacity_help() {
    let output = hview(&["capacity", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Capacity help should succeed");
    assert!(stdout.contains("--metric"), "Should show metric option");
    assert!(stdout.contains("--physical"), "Should show physical option");
    assert!(stdout.contains("--drill"), "Should show drill option");
    assert!(stdout.contains("--file"), "Should show file option");
}

/// Test capacity rows from a snapshot file
#[test]
fn test_capacity_from_file() {
    let file = snapshot_file(CLUSTER_SNAPSHOT);
    let path = file.path().to_str().unwrap();
    let output = hview(&["--format", "json", "capacity", "--metric", "cpu", "--file", path]);

    assert!(output.status.success(), "Capacity should succeed");
    let payload = stdout_json(&output);

    assert_eq!(payload["status"], "READY");
    assert_eq!(payload["columns"], serde_json::json!(["Child", "Parent", "Metric"]));
    assert_eq!(payload["rows"][0][0]["v"], "clusterA");
    assert_eq!(payload["rows"][0][1], Value::Null);
    assert_eq!(payload["rows"][1][0]["f"], "default, cpu: 2.00, cpu cost: 1.00");
    assert_eq!(payload["rows"][2][1], "clusterA");
    assert_eq!(payload["rows"][2][2], 3.0);
    assert_eq!(payload["filterNames"], serde_json::json!(["default", "monitoring"]));
    assert_eq!(payload["ratios"]["cpu"]["ratio"], 50.0);
    assert_eq!(payload["ratios"]["memory"]["ratio"], 67.0);
}

/// Test drilling into a child by name
#[test]
fn test_topology_drill_from_file() {
    let file = snapshot_file(CLUSTER_SNAPSHOT);
    let path = file.path().to_str().unwrap();
    let output = hview(&["--format", "json", "topology", "--drill", "default", "--file", path]);

    assert!(output.status.success(), "Topology drill should succeed");
    let payload = stdout_json(&output);

    assert_eq!(payload["status"], "READY");
    assert_eq!(payload["columns"], serde_json::json!(["Child", "Parent", "Type"]));
    assert_eq!(payload["rows"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["rows"][0][0]["v"], "web-1");
    assert_eq!(payload["rows"][0][1], "default");
    assert_eq!(payload["rows"][0][2], "pod");
}

/// Test that an empty snapshot reports no data
#[test]
fn test_empty_snapshot_is_no_data() {
    let file = snapshot_file(r#"{"data": null}"#);
    let path = file.path().to_str().unwrap();
    let output = hview(&["--format", "json", "topology", "--file", path]);

    assert!(output.status.success(), "Empty snapshot should not fail");
    let payload = stdout_json(&output);
    assert_eq!(payload["status"], "NO_DATA");
    assert_eq!(payload["rows"], serde_json::json!([]));
}

/// Test allocation ratios for a node snapshot
#[test]
fn test_ratios_for_node() {
    let file = snapshot_file(
        r#"{"name": "worker-1", "type": "node",
            "cpuCapacity": 8, "cpuAllocated": 4,
            "memoryCapacity": 16, "memoryAllocated": 8,
            "storageCapacity": 100, "storageAllocated": 50}"#,
    );
    let path = file.path().to_str().unwrap();
    let output = hview(&["--format", "json", "ratios", "--file", path]);

    assert!(output.status.success(), "Ratios should succeed");
    let payload = stdout_json(&output);
    assert_eq!(payload["resourceKind"], "Node");
    assert_eq!(payload["cpu"]["ratio"], 50.0);
    assert_eq!(payload["memory"]["ratio"], 50.0);
    assert_eq!(payload["storage"]["ratio"], 0.0);
}

/// Test groups sorted by cost against a mock API
#[test]
fn test_groups_sorted_by_cost() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/groups")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"data": [
                {"name": "payments", "podsCount": 3, "mtdCost": 12.5},
                {"name": "search", "podsCount": 7, "mtdCost": 40.0},
                {"name": "batch", "podsCount": 1, "mtdCost": 2.25}
            ]}"#,
        )
        .create();

    let url = server.url();
    let output = hview(&[
        "--api-url", url.as_str(), "--format", "json", "groups", "--sort", "cost", "--desc",
    ]);

    mock.assert();
    assert!(output.status.success(), "Groups should succeed");
    let payload = stdout_json(&output);
    let names: Vec<&str> = payload
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|g| g["name"].as_str())
        .collect();
    assert_eq!(names, vec!["search", "payments", "batch"]);
}

const GRAPH_NODES: &str = r#"[
    {"id": 1, "label": "web", "cid": ["checkout"]},
    {"id": 2, "label": "cart", "cid": ["checkout", "search"]},
    {"id": 3, "label": "index", "cid": ["search"]},
    {"id": 4, "label": "db"},
    {"id": 5, "label": "batch", "cid": ["reports"]}
]"#;

const GRAPH_EDGES: &str = r#"[
    {"from": 1, "to": 2},
    {"from": 3, "to": 4},
    {"from": 4, "to": 5}
]"#;

fn graph_server() -> mockito::ServerGuard {
    let mut server = mockito::Server::new();
    for (path, body) in [("/nodes", GRAPH_NODES), ("/edges", GRAPH_EDGES)] {
        server
            .mock("GET", path)
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create();
    }
    server
}

/// Test filtering the network graph down to one service
#[test]
fn test_graph_filtered_by_service() {
    let server = graph_server();
    let url = server.url();
    let output = hview(&[
        "--api-url", url.as_str(), "--format", "json", "graph", "--service", "search",
    ]);

    assert!(output.status.success(), "Graph should succeed");
    let payload = stdout_json(&output);
    let ids: Vec<i64> = payload["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["id"].as_i64())
        .collect();

    assert_eq!(payload["service"], "search");
    assert_eq!(payload["services"], serde_json::json!(["checkout", "search", "reports"]));
    // 1 and 4 have no search membership but share an edge with a search node
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(payload["edges"].as_array().map(Vec::len), Some(2));
}

/// Test that ALL shows the whole graph
#[test]
fn test_graph_all_services() {
    let server = graph_server();
    let url = server.url();
    let output = hview(&["--api-url", url.as_str(), "--format", "json", "graph"]);

    assert!(output.status.success(), "Graph should succeed");
    let payload = stdout_json(&output);
    assert_eq!(payload["service"], "ALL");
    assert_eq!(payload["nodes"].as_array().map(Vec::len), Some(5));
    assert_eq!(payload["edges"].as_array().map(Vec::len), Some(3));
}

/// Test unknown sort key error handling
#[test]
fn test_unknown_sort_key() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/groups")
        .with_status(200)
        .with_body("[]")
        .create();

    let url = server.url();
    let output = hview(&["--api-url", url.as_str(), "groups", "--sort", "color"]);

    assert!(!output.status.success(), "Unknown sort key should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("color"), "Should name the bad sort key");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let output = hview(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_argument() {
    let output = hview(&["ratios"]);

    assert!(!output.status.success(), "Missing argument should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing argument"
    );
}
