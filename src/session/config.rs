//! Per-session configuration.

use std::time::Duration;

use crate::graph::DeletePolicy;
use crate::types::Size;

/// Tunables for one [`WorkflowSession`](super::WorkflowSession).
///
/// Defaults match the editor's shipped behavior; hosts override
/// individual knobs with the `with_*` builders.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// What operator deletion does to incident links.
    pub delete_policy: DeletePolicy,
    /// Quiescence window after which a drag gesture settles into one
    /// undoable command.
    pub drag_idle_gap: Duration,
    /// Padding between a group's bounding box and its member operators.
    pub group_margin: f64,
    /// Nominal operator cell size, used when computing group bounding
    /// boxes (positions address the cell's top-left corner).
    pub operator_size: Size,
    /// Fixed size of a collapsed group cell.
    pub collapsed_group_size: Size,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            delete_policy: DeletePolicy::CascadeLinks,
            drag_idle_gap: Duration::from_millis(100),
            group_margin: 20.0,
            operator_size: Size::new(60.0, 60.0),
            collapsed_group_size: Size::new(170.0, 30.0),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    #[must_use]
    pub fn with_drag_idle_gap(mut self, gap: Duration) -> Self {
        self.drag_idle_gap = gap;
        self
    }

    #[must_use]
    pub fn with_group_margin(mut self, margin: f64) -> Self {
        self.group_margin = margin;
        self
    }
}
