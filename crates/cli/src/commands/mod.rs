//! Subcommand implementations

pub mod capacity;
pub mod graph;
pub mod groups;
pub mod ratios;
pub mod topology;

use anyhow::Result;
use tracing::warn;
use view_lib::view::{
    DrillTarget, FetchRequest, SnapshotSource, ViewController, ViewMode, ViewStatus,
};

/// Options shared by the chart views
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub mode: ViewMode,
    /// `TYPE/NAME`, or a bare name looked up among the filter names
    pub drill: Option<String>,
}

/// Load the root and optionally drill one level down
pub async fn load_view<S: SnapshotSource>(
    controller: &mut ViewController<S>,
    options: &ViewOptions,
) -> Result<ViewStatus> {
    let status = controller.load().await;
    let Some(target) = options.drill.as_deref() else {
        return Ok(status);
    };
    if status != ViewStatus::Ready {
        return Ok(status);
    }

    if target.contains('/') {
        let drill: DrillTarget = target.parse()?;
        let state = controller.state();
        let request = FetchRequest {
            kind: state.kind(),
            mode: state.mode(),
            drill: Some(drill),
        };
        return Ok(controller.run(request).await);
    }

    match controller.drill_into(target).await {
        Some(status) => Ok(status),
        None => {
            warn!(child = target, "not a child of the current view, showing the root");
            Ok(status)
        }
    }
}
