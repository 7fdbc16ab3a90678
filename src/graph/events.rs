//! Change events emitted by the logical graph store.
//!
//! Every payload carries enough data to reconstruct the pre-change state:
//! delete events carry the deleted entity, replace events carry both the
//! old and the new value. The command gateway and the action-trace
//! recorder rebuild undo information from these payloads, so thinning them
//! down to bare IDs would break both.

use serde_json::Value;

use crate::operator::{Breakpoint, OperatorLink, OperatorPredicate};

/// A structural or content change in the [`WorkflowGraph`](super::WorkflowGraph).
#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
    OperatorAdded(OperatorPredicate),
    /// Carries the full deleted operator so observers can restore it.
    OperatorDeleted { operator: OperatorPredicate },
    LinkAdded(OperatorLink),
    /// Carries the full deleted link so observers can restore it.
    LinkDeleted { link: OperatorLink },
    OperatorPropertyChanged {
        operator_id: String,
        old_properties: Value,
        new_properties: Value,
    },
    OperatorAdvancedStatusChanged {
        operator_id: String,
        show_advanced: bool,
    },
    /// `old`/`new` of `None` mean "no breakpoint on this link".
    BreakpointChanged {
        link_id: String,
        old: Option<Breakpoint>,
        new: Option<Breakpoint>,
    },
}
