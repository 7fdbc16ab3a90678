//! Action trace recording.
//!
//! When tracing is on, every graph change is appended to an in-memory
//! history as a typed [`ActionTrace`] plus a full [`WorkflowInfo`]
//! snapshot of the workflow *after* the change. Hosts use the history for
//! session replay and for studying how users build workflows.
//!
//! The recorder reconstructs its payloads from the graph's event stream,
//! which is why those events carry old values and full deleted entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::{GraphEvent, WorkflowGraph};
use crate::groups::GroupManager;
use crate::layout::CanvasLayout;
use crate::operator::{Breakpoint, OperatorLink, OperatorPredicate};
use crate::persistence::WorkflowInfo;
use crate::types::Point;

/// One traced action, with enough payload to study it in isolation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum ActionTrace {
    AddOperator {
        operator: OperatorPredicate,
        position: Point,
    },
    DeleteOperator {
        operator: OperatorPredicate,
    },
    AddLink {
        link: OperatorLink,
        source_operator: Option<OperatorPredicate>,
        target_operator: Option<OperatorPredicate>,
    },
    DeleteLink {
        link: OperatorLink,
        source_operator: Option<OperatorPredicate>,
        target_operator: Option<OperatorPredicate>,
    },
    ChangeOperatorProperty {
        operator_id: String,
        old_properties: Value,
        new_properties: Value,
    },
    AddBreakpoint {
        link_id: String,
        new_breakpoint: Breakpoint,
    },
    ChangeBreakpoint {
        link_id: String,
        old_breakpoint: Breakpoint,
        new_breakpoint: Breakpoint,
    },
    DeleteBreakpoint {
        link_id: String,
        deleted_breakpoint: Breakpoint,
    },
}

/// A traced action with its timestamp and post-change workflow state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTraceRecord {
    pub timestamp: DateTime<Utc>,
    pub trace: ActionTrace,
    pub current_state: WorkflowInfo,
}

/// Records graph changes while enabled. Constructed disabled.
#[derive(Debug)]
pub struct ActionTraceRecorder {
    enabled: bool,
    history: Vec<ActionTraceRecord>,
    events: flume::Receiver<GraphEvent>,
}

impl ActionTraceRecorder {
    pub fn attach(graph: &mut WorkflowGraph) -> Self {
        Self {
            enabled: false,
            history: Vec::new(),
            events: graph.subscribe(),
        }
    }

    pub fn start(&mut self) {
        self.enabled = true;
    }

    pub fn stop(&mut self) {
        self.enabled = false;
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.enabled
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    #[must_use]
    pub fn history(&self) -> &[ActionTraceRecord] {
        &self.history
    }

    /// Converts pending graph events into trace records.
    ///
    /// While tracing is off, pending events are drained and discarded so
    /// enabling the trace never replays stale history.
    pub fn pump(&mut self, graph: &WorkflowGraph, layout: &CanvasLayout, groups: &GroupManager) {
        for event in self.events.try_iter() {
            if !self.enabled {
                continue;
            }
            let Some(trace) = Self::trace_for(graph, layout, event) else {
                continue;
            };
            self.history.push(ActionTraceRecord {
                timestamp: Utc::now(),
                trace,
                current_state: WorkflowInfo::capture(graph, layout, groups),
            });
        }
    }

    fn trace_for(
        graph: &WorkflowGraph,
        layout: &CanvasLayout,
        event: GraphEvent,
    ) -> Option<ActionTrace> {
        match event {
            GraphEvent::OperatorAdded(operator) => {
                let position = layout
                    .get_element_position(&operator.operator_id)
                    .unwrap_or_default();
                Some(ActionTrace::AddOperator { operator, position })
            }
            GraphEvent::OperatorDeleted { operator } => {
                Some(ActionTrace::DeleteOperator { operator })
            }
            GraphEvent::LinkAdded(link) => {
                let source_operator = graph.get_operator(&link.source.operator_id).ok().cloned();
                let target_operator = graph.get_operator(&link.target.operator_id).ok().cloned();
                Some(ActionTrace::AddLink {
                    link,
                    source_operator,
                    target_operator,
                })
            }
            GraphEvent::LinkDeleted { link } => {
                let source_operator = graph.get_operator(&link.source.operator_id).ok().cloned();
                let target_operator = graph.get_operator(&link.target.operator_id).ok().cloned();
                Some(ActionTrace::DeleteLink {
                    link,
                    source_operator,
                    target_operator,
                })
            }
            GraphEvent::OperatorPropertyChanged {
                operator_id,
                old_properties,
                new_properties,
            } => Some(ActionTrace::ChangeOperatorProperty {
                operator_id,
                old_properties,
                new_properties,
            }),
            GraphEvent::BreakpointChanged { link_id, old, new } => match (old, new) {
                (None, Some(new_breakpoint)) => Some(ActionTrace::AddBreakpoint {
                    link_id,
                    new_breakpoint,
                }),
                (Some(old_breakpoint), Some(new_breakpoint)) => Some(ActionTrace::ChangeBreakpoint {
                    link_id,
                    old_breakpoint,
                    new_breakpoint,
                }),
                (Some(deleted_breakpoint), None) => Some(ActionTrace::DeleteBreakpoint {
                    link_id,
                    deleted_breakpoint,
                }),
                (None, None) => None,
            },
            GraphEvent::OperatorAdvancedStatusChanged { .. } => None,
        }
    }
}
