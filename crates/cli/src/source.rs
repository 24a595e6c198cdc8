//! Snapshot source backed by a saved JSON file
//!
//! The file holds a full tree. The root request returns the whole snapshot;
//! a drill-in request returns the matching direct child, which stands in for
//! the next level the API would have served.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use view_lib::view::{FetchRequest, SnapshotSource};
use view_lib::Entity;

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and parse the snapshot root
    pub async fn read(&self) -> Result<Option<Entity>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot file {}", self.path.display()))?;
        let body: Value =
            serde_json::from_str(&content).context("Snapshot file is not valid JSON")?;
        Ok(Entity::from_response(&body)?)
    }
}

#[async_trait]
impl SnapshotSource for FileSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<Option<Entity>> {
        let root = self.read().await?;
        Ok(match (&request.drill, root) {
            (None, root) => root,
            (Some(target), Some(root)) => root
                .find_child(&target.name, Some(&target.kind))
                .cloned(),
            (Some(_), None) => None,
        })
    }
}
