//! Hierarchy view state machine
//!
//! A view moves `WAIT -> READY` when a fetched snapshot is flattened,
//! `WAIT -> NO_DATA` when the fetch fails or returns nothing, and back to
//! `WAIT` on every new fetch (view toggle, drill-in). It has no terminal
//! state.

mod controller;
mod state;


pub use controller::{ControllerConfig, SnapshotSource, ViewController};
pub use state::{
    DrillTarget, FetchDisposition, FetchRequest, RequestToken, SnapshotKind, ViewMode, ViewState,
    ViewStatus, ViewTable,
};
