//! Per-view state holder
//!
//! Holds everything a rendered hierarchy view needs between user actions:
//! the retained original snapshot, the currently displayed (possibly
//! drilled-in) snapshot, the derived table and ratios, and the fetch status.
//! Each fetch is tagged with a [`RequestToken`]; a response whose token has
//! been superseded by a later request is discarded instead of overwriting
//! newer state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::capacity::{compute_allocation_ratios, AllocationRatios};
use crate::error::{Result, ViewError};
use crate::flatten::{
    apply_metric_change, flatten, flatten_topology, ChildCell, Flattened, TopologyTable,
};
use crate::models::{Entity, Metric};
use crate::observability::{StructuredLogger, ViewMetrics};

/// Lifecycle status of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewStatus {
    Wait,
    Ready,
    NoData,
}

impl fmt::Display for ViewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViewStatus::Wait => "WAIT",
            ViewStatus::Ready => "READY",
            ViewStatus::NoData => "NO_DATA",
        };
        f.write_str(label)
    }
}

/// Grouping of the resource hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Namespaces, deployments, pods
    #[default]
    Logical,
    /// Nodes and persistent volumes
    Physical,
}

/// Which endpoint family a view reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// Topology: names and types only
    Hierarchy,
    /// Capacity: usage, cost and allocation figures
    Metrics,
}

impl SnapshotKind {
    pub fn segment(&self) -> &'static str {
        match self {
            SnapshotKind::Hierarchy => "hierarchy",
            SnapshotKind::Metrics => "metrics",
        }
    }
}

/// Entity selected for drill-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillTarget {
    pub kind: String,
    pub name: String,
}

impl FromStr for DrillTarget {
    type Err = ViewError;

    /// Parse `TYPE/NAME`
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((kind, name)) if !kind.is_empty() && !name.is_empty() => Ok(Self {
                kind: kind.to_string(),
                name: name.to_string(),
            }),
            _ => Err(ViewError::InvalidDrillTarget(s.to_string())),
        }
    }
}

/// One snapshot request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub kind: SnapshotKind,
    pub mode: ViewMode,
    pub drill: Option<DrillTarget>,
}

impl FetchRequest {
    /// Request for the top of the hierarchy
    pub fn root(kind: SnapshotKind, mode: ViewMode) -> Self {
        Self {
            kind,
            mode,
            drill: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.drill.is_none()
    }

    /// Endpoint path relative to the API base, e.g. `metrics/node`
    pub fn path(&self) -> String {
        match &self.drill {
            Some(target) => format!("{}/{}", self.kind.segment(), target.kind),
            None => self.kind.segment().to_string(),
        }
    }

    /// Query parameters; the view mode is only sent for root requests
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match (&self.drill, self.mode) {
            (Some(target), _) => vec![("name", target.name.clone())],
            (None, ViewMode::Physical) => vec![("view", "physical".to_string())],
            (None, ViewMode::Logical) => Vec::new(),
        }
    }
}

/// Identifies one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// What happened to a completed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDisposition {
    /// The response was the latest and moved the view to the given status
    Applied(ViewStatus),
    /// A newer request superseded this one; state is unchanged
    Stale,
}

/// Table rendered by a view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewTable {
    Capacity(Flattened),
    Topology(TopologyTable),
}

impl ViewTable {
    fn empty(kind: SnapshotKind) -> Self {
        match kind {
            SnapshotKind::Metrics => ViewTable::Capacity(Flattened::default()),
            SnapshotKind::Hierarchy => ViewTable::Topology(TopologyTable::default()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ViewTable::Capacity(t) => t.len(),
            ViewTable::Topology(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cell(&self, index: usize) -> Option<&ChildCell> {
        match self {
            ViewTable::Capacity(t) => t.cell(index),
            ViewTable::Topology(t) => t.cell(index),
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        match self {
            ViewTable::Capacity(t) => t.find(name).map(|(i, _)| i),
            ViewTable::Topology(t) => t.find(name).map(|(i, _)| i),
        }
    }

    pub fn filter_names(&self) -> &[String] {
        match self {
            ViewTable::Capacity(t) => &t.filter_names,
            ViewTable::Topology(t) => &t.filter_names,
        }
    }
}

/// State of one hierarchy view
pub struct ViewState {
    kind: SnapshotKind,
    mode: ViewMode,
    metric: String,
    status: ViewStatus,
    original: Option<Entity>,
    current: Option<Entity>,
    table: ViewTable,
    ratios: Option<AllocationRatios>,
    generation: u64,
    pending: Option<(RequestToken, FetchRequest)>,
    selected_filter: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    logger: StructuredLogger,
    metrics: ViewMetrics,
}

impl ViewState {
    pub fn new(kind: SnapshotKind) -> Self {
        Self {
            kind,
            mode: ViewMode::default(),
            metric: Metric::Cpu.as_str().to_string(),
            status: ViewStatus::Wait,
            original: None,
            current: None,
            table: ViewTable::empty(kind),
            ratios: None,
            generation: 0,
            pending: None,
            selected_filter: None,
            updated_at: None,
            logger: StructuredLogger::new(kind.segment()),
            metrics: ViewMetrics::new(),
        }
    }

    /// Capacity view sized by the given metric
    pub fn capacity(metric: impl Into<String>) -> Self {
        let mut state = Self::new(SnapshotKind::Metrics);
        state.metric = metric.into();
        state
    }

    pub fn topology() -> Self {
        Self::new(SnapshotKind::Hierarchy)
    }

    pub fn with_mode(mut self, mode: ViewMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn kind(&self) -> SnapshotKind {
        self.kind
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    pub fn table(&self) -> &ViewTable {
        &self.table
    }

    pub fn ratios(&self) -> Option<&AllocationRatios> {
        self.ratios.as_ref()
    }

    pub fn original(&self) -> Option<&Entity> {
        self.original.as_ref()
    }

    pub fn current(&self) -> Option<&Entity> {
        self.current.as_ref()
    }

    pub fn selected_filter(&self) -> Option<&str> {
        self.selected_filter.as_deref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    /// Request for the top of the hierarchy in the current mode
    pub fn initial_request(&self) -> FetchRequest {
        FetchRequest::root(self.kind, self.mode)
    }

    /// Record a new outstanding fetch; any earlier one becomes stale
    pub fn begin_fetch(&mut self, request: FetchRequest) -> RequestToken {
        self.generation += 1;
        let token = RequestToken(self.generation);
        self.logger.log_fetch_started(token.0, &request.path());
        self.pending = Some((token, request));
        self.status = ViewStatus::Wait;
        token
    }

    /// Apply the outcome of a fetch started with `token`
    ///
    /// An empty snapshot or a failed fetch moves the view to `NoData`. Root
    /// snapshots replace the retained original; drill-in snapshots only
    /// replace what is displayed.
    pub fn complete_fetch(
        &mut self,
        token: RequestToken,
        outcome: Result<Option<Entity>>,
    ) -> FetchDisposition {
        let request = match self.pending.take() {
            Some((pending, request)) if pending == token => request,
            other => {
                self.pending = other;
                self.logger.log_stale_response(token.0, self.generation);
                self.metrics.inc_stale_responses();
                return FetchDisposition::Stale;
            }
        };

        match outcome {
            Ok(Some(snapshot)) if !snapshot.is_empty() => {
                if request.is_root() {
                    self.original = Some(snapshot.clone());
                }
                self.current = Some(snapshot);
                self.rebuild();
                self.status = ViewStatus::Ready;
                self.updated_at = Some(Utc::now());
                self.logger.log_snapshot_applied(
                    token.0,
                    self.table.len(),
                    self.table.filter_names().len(),
                );
            }
            Ok(_) => {
                self.status = ViewStatus::NoData;
                self.metrics.inc_fetch_errors();
                self.logger.log_no_data(token.0, "empty response");
            }
            Err(e) => {
                self.status = ViewStatus::NoData;
                self.metrics.inc_fetch_errors();
                self.logger.log_no_data(token.0, &e.to_string());
            }
        }

        FetchDisposition::Applied(self.status)
    }

    /// Switch the sizing metric and rebuild from the original snapshot
    ///
    /// Any outstanding fetch is superseded, since its result would replace
    /// the rows just rebuilt.
    pub fn change_metric(&mut self, metric: impl Into<String>) {
        self.metric = metric.into();
        if self.original.is_none() {
            return;
        }
        self.supersede_pending();
        self.current = self.original.clone();
        self.selected_filter = None;
        self.rebuild();
        self.status = ViewStatus::Ready;
        self.logger.log_metric_change(&self.metric, self.table.len());
    }

    /// Return to the original snapshot
    pub fn reset(&mut self) {
        self.selected_filter = None;
        if self.original.is_none() {
            return;
        }
        self.supersede_pending();
        self.current = self.original.clone();
        self.rebuild();
        self.status = ViewStatus::Ready;
    }

    /// Drill-in request for the row at `index`
    ///
    /// Rows without an entity type (the root row) cannot be drilled into.
    pub fn select_row(&self, index: usize) -> Option<FetchRequest> {
        let cell = self.table.cell(index)?;
        let kind = cell.entity_type.clone()?;
        Some(FetchRequest {
            kind: self.kind,
            mode: self.mode,
            drill: Some(DrillTarget {
                kind,
                name: cell.value.clone(),
            }),
        })
    }

    /// Drill-in request for the row named by a filter selection
    pub fn select_filter(&mut self, name: &str) -> Option<FetchRequest> {
        self.selected_filter = Some(name.to_string());
        let index = self.table.position(name)?;
        self.select_row(index)
    }

    /// Switch between logical and physical grouping
    pub fn toggle_view(&mut self, mode: ViewMode) -> FetchRequest {
        self.mode = mode;
        self.selected_filter = None;
        FetchRequest::root(self.kind, mode)
    }

    /// Rebuilt rows for the original snapshot under the current metric
    pub fn original_rows(&self) -> Flattened {
        apply_metric_change(self.original.as_ref(), &self.metric)
    }

    fn supersede_pending(&mut self) {
        if self.pending.take().is_some() {
            self.generation += 1;
        }
    }

    fn rebuild(&mut self) {
        let started = Instant::now();
        let current = self.current.as_ref();
        self.table = match self.kind {
            SnapshotKind::Metrics => ViewTable::Capacity(flatten(current, &self.metric)),
            SnapshotKind::Hierarchy => ViewTable::Topology(flatten_topology(current)),
        };
        self.ratios = match self.kind {
            SnapshotKind::Metrics => current.map(compute_allocation_ratios),
            SnapshotKind::Hierarchy => None,
        };
        self.metrics
            .observe_flatten_latency(started.elapsed().as_secs_f64());
        self.metrics.set_rows_emitted(self.table.len());
    }
}

impl fmt::Debug for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewState")
            .field("kind", &self.kind)
            .field("mode", &self.mode)
            .field("metric", &self.metric)
            .field("status", &self.status)
            .field("rows", &self.table.len())
            .field("generation", &self.generation)
            .finish()
    }
}
