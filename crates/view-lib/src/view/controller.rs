//! Drives a [`ViewState`] against a snapshot source

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Result, ViewError};
use crate::models::Entity;
use crate::observability::ViewMetrics;
use crate::view::state::{FetchRequest, ViewMode, ViewState, ViewStatus};

/// Where snapshots come from
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch one snapshot; `Ok(None)` when the source has nothing to return
    async fn fetch(&self, request: &FetchRequest) -> anyhow::Result<Option<Entity>>;
}

/// Timeout and retry policy for snapshot fetches
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Upper bound for a single fetch attempt
    pub request_timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
        }
    }
}

/// Owns a view state and the source feeding it
pub struct ViewController<S> {
    source: S,
    state: ViewState,
    config: ControllerConfig,
    metrics: ViewMetrics,
}

impl<S: SnapshotSource> ViewController<S> {
    pub fn new(source: S, state: ViewState, config: ControllerConfig) -> Self {
        Self {
            source,
            state,
            config,
            metrics: ViewMetrics::new(),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_state(self) -> ViewState {
        self.state
    }

    /// Fetch the top of the hierarchy
    pub async fn load(&mut self) -> ViewStatus {
        let request = self.state.initial_request();
        self.run(request).await
    }

    /// Switch view mode and refetch the root
    pub async fn toggle_view(&mut self, mode: ViewMode) -> ViewStatus {
        let request = self.state.toggle_view(mode);
        self.run(request).await
    }

    /// Drill into the row at `index`; `None` when the row cannot be drilled into
    pub async fn drill_into_row(&mut self, index: usize) -> Option<ViewStatus> {
        let request = self.state.select_row(index)?;
        Some(self.run(request).await)
    }

    /// Drill into the row named by a filter selection
    pub async fn drill_into(&mut self, name: &str) -> Option<ViewStatus> {
        let request = self.state.select_filter(name)?;
        Some(self.run(request).await)
    }

    /// Issue one request and apply its outcome
    pub async fn run(&mut self, request: FetchRequest) -> ViewStatus {
        let token = self.state.begin_fetch(request.clone());
        let outcome = self.fetch_with_retry(&request).await;
        self.state.complete_fetch(token, outcome);
        self.state.status()
    }

    async fn fetch_with_retry(&self, request: &FetchRequest) -> Result<Option<Entity>> {
        let mut attempt = 0;
        let mut backoff = self.config.initial_backoff;

        loop {
            let error = match tokio::time::timeout(
                self.config.request_timeout,
                self.source.fetch(request),
            )
            .await
            {
                Ok(Ok(snapshot)) => return Ok(snapshot),
                Ok(Err(e)) => ViewError::Fetch(format!("{e:#}")),
                Err(_) => ViewError::Timeout(self.config.request_timeout),
            };

            if attempt >= self.config.max_retries {
                return Err(error);
            }
            attempt += 1;

            self.state.logger().log_fetch_retry(
                attempt,
                backoff.as_millis() as u64,
                &error.to_string(),
            );
            self.metrics.inc_fetch_retries();

            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(self.config.max_backoff);
        }
    }
}
