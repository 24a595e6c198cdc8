//! Error types for snapshot parsing and view state transitions

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the view library
#[derive(Debug, Error)]
pub enum ViewError {
    /// The response body could not be interpreted as an entity tree
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Metric selector outside the known resource dimensions
    #[error("Unknown metric: {0} (expected cpu, memory or storage)")]
    UnknownMetric(String),

    /// Logical group sort key not recognized
    #[error("Unknown sort key: {0}")]
    UnknownSortKey(String),

    /// Drill-in target not in `TYPE/NAME` form
    #[error("Invalid drill target '{0}': expected TYPE/NAME")]
    InvalidDrillTarget(String),

    /// The data source did not answer in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The data source returned an error
    #[error("Fetch failed: {0}")]
    Fetch(String),
}

/// Result type alias for view operations
pub type Result<T> = std::result::Result<T, ViewError>;
