//! Workflow snapshots: the unit of persistence and full-state transfer.
//!
//! [`WorkflowInfo`] is the complete serializable state of a workflow:
//! operators, their canvas positions, links, breakpoints, and groups. It
//! round-trips losslessly through JSON, which is the contract both the
//! persistence collaborator and collaborative full-state transfer rely
//! on. [`SavedWorkflow`] wraps it with identity and timestamps.
//!
//! Restoring goes through the session's normal command gateway (one batch
//! delete, one batch add, then group re-creation), so a restored
//! workflow is observationally identical to one built by hand. A snapshot
//! whose position map is missing an operator is corrupt and aborts the
//! restore before anything is touched.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::WorkflowGraph;
use crate::groups::{Group, GroupError, GroupManager};
use crate::layout::CanvasLayout;
use crate::operator::{Breakpoint, OperatorLink, OperatorPredicate};
use crate::session::{ActionError, OperatorAndPosition, WorkflowSession};
use crate::types::Point;

pub const DEFAULT_WORKFLOW_NAME: &str = "Untitled Workflow";

/// Errors raised while saving or restoring a workflow snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The snapshot violates its own shape, e.g. an operator with no
    /// entry in the position map. The restore aborts with the session
    /// untouched rather than restoring a partial graph.
    #[error("corrupt saved workflow: {reason}")]
    CorruptWorkflow { reason: String },

    #[error("saved workflow is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Group(#[from] GroupError),
}

/// The complete serializable state of one workflow.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInfo {
    pub operators: Vec<OperatorPredicate>,
    pub operator_positions: FxHashMap<String, Point>,
    pub links: Vec<OperatorLink>,
    pub breakpoints: FxHashMap<String, Breakpoint>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl WorkflowInfo {
    /// Captures the current state. Operators, links, and groups are
    /// sorted by ID so identical states produce identical snapshots.
    ///
    /// Members of a collapsed group are captured at their saved
    /// positions, the spot they will reappear at on expansion.
    #[must_use]
    pub fn capture(graph: &WorkflowGraph, layout: &CanvasLayout, groups: &GroupManager) -> Self {
        let mut operators: Vec<OperatorPredicate> =
            graph.get_all_operators().into_iter().cloned().collect();
        operators.sort_by(|a, b| a.operator_id.cmp(&b.operator_id));

        let mut operator_positions = FxHashMap::default();
        for operator in &operators {
            if let Ok(position) = groups.operator_position(layout, &operator.operator_id) {
                operator_positions.insert(operator.operator_id.clone(), position);
            }
        }

        let mut links: Vec<OperatorLink> = graph.get_all_links().into_iter().cloned().collect();
        links.sort_by(|a, b| a.link_id.cmp(&b.link_id));

        let mut saved_groups: Vec<Group> = groups.get_all_groups().into_iter().cloned().collect();
        saved_groups.sort_by(|a, b| a.group_id.cmp(&b.group_id));

        Self {
            operators,
            operator_positions,
            links,
            breakpoints: graph.get_all_link_breakpoints().clone(),
            groups: saved_groups,
        }
    }

    pub fn to_json_string(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_string(text: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Checks the snapshot's internal shape before a restore touches
    /// anything.
    pub fn validate(&self) -> Result<(), PersistenceError> {
        for operator in &self.operators {
            if !self.operator_positions.contains_key(&operator.operator_id) {
                return Err(PersistenceError::CorruptWorkflow {
                    reason: format!(
                        "operator {} has no entry in the position map",
                        operator.operator_id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A workflow snapshot with identity and timestamps, as stored by the
/// persistence collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedWorkflow {
    pub workflow_id: Option<String>,
    pub name: String,
    pub creation_time: DateTime<Utc>,
    pub last_modified_time: DateTime<Utc>,
    pub content: WorkflowInfo,
}

impl SavedWorkflow {
    #[must_use]
    pub fn new(content: WorkflowInfo) -> Self {
        let now = Utc::now();
        Self {
            workflow_id: None,
            name: DEFAULT_WORKFLOW_NAME.to_string(),
            creation_time: now,
            last_modified_time: now,
            content,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.trim().is_empty() {
            DEFAULT_WORKFLOW_NAME.to_string()
        } else {
            name
        };
        self
    }

    /// Updates the modification timestamp, e.g. on autosave.
    pub fn touch(&mut self) {
        self.last_modified_time = Utc::now();
    }
}

/// Replaces the session's workflow with the snapshot's.
///
/// The snapshot is validated first; a corrupt snapshot aborts with the
/// session untouched. The existing workflow is then removed with one
/// batch command and the snapshot replayed with another, followed by
/// group re-creation. Nothing is left highlighted and the viewport is
/// reset, matching a fresh load.
pub fn restore(session: &mut WorkflowSession, info: &WorkflowInfo) -> Result<(), PersistenceError> {
    info.validate()?;

    let existing: Vec<String> = session
        .graph()
        .get_all_operators()
        .into_iter()
        .map(|operator| operator.operator_id.clone())
        .collect();
    if !existing.is_empty() {
        session.delete_operators_and_links(&existing, &[])?;
    }

    let operators: Vec<OperatorAndPosition> = info
        .operators
        .iter()
        .map(|operator| OperatorAndPosition {
            operator: operator.clone(),
            position: info.operator_positions[&operator.operator_id],
        })
        .collect();
    session.add_operators_and_links(operators, info.links.clone(), info.breakpoints.clone())?;

    for group in &info.groups {
        session.restore_group(group.clone())?;
    }

    session.unhighlight_all();
    session.restore_default_zoom_and_offset();
    Ok(())
}
