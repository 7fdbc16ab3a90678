//! The workflow session: one editing context, one mutation gateway.
//!
//! A [`WorkflowSession`] owns one logical graph, one layout mirror, one
//! undo/redo history, the synchronizer that keeps the two stores aligned,
//! the grouping subsystem, the action-trace recorder, and (optionally) a
//! collaboration channel. There are no process-wide singletons: as many
//! sessions as needed coexist, each fully isolated, which is what
//! multi-tab hosting and tests depend on.
//!
//! Every mutation flows through the session's public action methods (see
//! [`actions`](self)): each one captures the pre-state it needs to
//! invert, wraps the change in a [`Command`](crate::command::Command),
//! executes it with the re-entrancy gate suspended, records it in the
//! undo history, and broadcasts it to collaborators. The stores are never
//! mutated behind the gateway's back.

mod actions;
mod config;
mod drag;

pub use config::SessionConfig;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collab::{self, CollabChannel, CollabError, CommandMessage};
use crate::event_hub::EventHub;
use crate::graph::{GraphError, GraphEvent, WorkflowGraph};
use crate::groups::{Group, GroupError, GroupEvent, GroupGeometry, GroupManager};
use crate::layout::{CanvasLayout, LayoutError, LayoutEvent};
use crate::operator::OperatorPredicate;
use crate::persistence::{self, PersistenceError, WorkflowInfo};
use crate::schema::SchemaCatalog;
use crate::sync::LayoutSync;
use crate::trace::{ActionTraceRecord, ActionTraceRecorder};
use crate::types::Point;
use crate::undo_redo::UndoRedoManager;
use crate::validation::{self, Validation};

use drag::DragTracker;

/// Errors raised by the command gateway.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("operator type {0} is not registered in the schema catalog")]
    UnknownOperatorType(String),

    #[error("failed to encode collaboration parameters: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An operator paired with the position it should appear at, the unit of
/// batch adds and of workflow restore.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorAndPosition {
    pub operator: OperatorPredicate,
    pub position: Point,
}

/// One isolated workflow editing context.
pub struct WorkflowSession {
    config: SessionConfig,
    catalog: Arc<dyn SchemaCatalog>,
    graph: WorkflowGraph,
    layout: CanvasLayout,
    undo_redo: UndoRedoManager,
    sync: LayoutSync,
    groups: GroupManager,
    trace: ActionTraceRecorder,
    collab: Option<CollabChannel>,
    drag: DragTracker,
    changed_hub: EventHub<()>,
}

impl WorkflowSession {
    /// Creates a session with default configuration.
    #[must_use]
    pub fn new(catalog: Arc<dyn SchemaCatalog>) -> Self {
        Self::with_config(catalog, SessionConfig::default())
    }

    #[must_use]
    pub fn with_config(catalog: Arc<dyn SchemaCatalog>, config: SessionConfig) -> Self {
        let mut graph = WorkflowGraph::new(config.delete_policy);
        let mut layout = CanvasLayout::new();
        // Subscription order is construction order; all subscribers are
        // attached before the first mutation can happen.
        let sync = LayoutSync::attach(&mut graph);
        let trace = ActionTraceRecorder::attach(&mut graph);
        let groups = GroupManager::attach(
            &mut graph,
            &mut layout,
            GroupGeometry {
                margin: config.group_margin,
                operator_size: config.operator_size,
                collapsed_size: config.collapsed_group_size,
            },
        );
        let drag = DragTracker::new(config.drag_idle_gap);
        Self {
            config,
            catalog,
            graph,
            layout,
            undo_redo: UndoRedoManager::new(),
            sync,
            groups,
            trace,
            collab: None,
            drag,
            changed_hub: EventHub::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// The logical graph, read-only. All mutations go through the
    /// session's action methods.
    #[must_use]
    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// The layout mirror, read-only.
    #[must_use]
    pub fn layout(&self) -> &CanvasLayout {
        &self.layout
    }

    #[must_use]
    pub fn groups(&self) -> &GroupManager {
        &self.groups
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn layout_mut(&mut self) -> &mut CanvasLayout {
        &mut self.layout
    }

    // ------------------------------------------------------------------
    // Event subscriptions
    // ------------------------------------------------------------------

    pub fn subscribe_graph_events(&mut self) -> flume::Receiver<GraphEvent> {
        self.graph.subscribe()
    }

    pub fn subscribe_layout_events(&mut self) -> flume::Receiver<LayoutEvent> {
        self.layout.subscribe()
    }

    pub fn subscribe_group_events(&mut self) -> flume::Receiver<GroupEvent> {
        self.groups.subscribe()
    }

    /// Coarse change notification, one tick per applied command or
    /// undo/redo. Hosts debounce this to drive autosave.
    pub fn subscribe_workflow_changes(&mut self) -> flume::Receiver<()> {
        self.changed_hub.subscribe()
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo_redo.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.undo_redo.can_redo()
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo_redo.undo_len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.undo_redo.redo_len()
    }

    /// Reverts the most recent command. A no-op on an empty history.
    pub fn undo(&mut self) -> Result<(), ActionError> {
        self.settle_drag()?;
        let Some(command) = self.undo_redo.pop_undo() else {
            return Ok(());
        };
        let action = command.action_name();
        let gate = self.undo_redo.listen_gate().clone();
        let guard = gate.suspend();
        let result = command.undo(self);
        drop(guard);
        self.undo_redo.push_redo(command);
        self.broadcast(CommandMessage::undo(action));
        self.notify_changed();
        result
    }

    /// Re-applies the most recently undone command. A no-op when no undo
    /// came before.
    pub fn redo(&mut self) -> Result<(), ActionError> {
        self.settle_drag()?;
        let Some(command) = self.undo_redo.pop_redo() else {
            return Ok(());
        };
        let action = command.action_name();
        let gate = self.undo_redo.listen_gate().clone();
        let guard = gate.suspend();
        let result = command.redo(self);
        drop(guard);
        self.undo_redo.push_undo(command);
        self.broadcast(CommandMessage::redo(action));
        self.notify_changed();
        result
    }

    /// Blocks substantive commands, e.g. while an execution is running.
    pub fn disable_workflow_modification(&mut self) {
        self.undo_redo.disable_workflow_modification();
    }

    pub fn enable_workflow_modification(&mut self) {
        self.undo_redo.enable_workflow_modification();
    }

    #[must_use]
    pub fn workflow_modification_enabled(&self) -> bool {
        self.undo_redo.modification_enabled()
    }

    // ------------------------------------------------------------------
    // Collaboration
    // ------------------------------------------------------------------

    /// Attaches a collaboration channel. Commands applied from here on
    /// are broadcast; call [`poll_remote`](Self::poll_remote) to apply
    /// what peers send.
    pub fn connect_collaboration(&mut self, channel: CollabChannel) {
        self.collab = Some(channel);
    }

    pub fn disconnect_collaboration(&mut self) -> Option<CollabChannel> {
        self.collab.take()
    }

    #[must_use]
    pub fn collaboration_active(&self) -> bool {
        self.collab.is_some()
    }

    /// Applies every message queued on the inbound side of the channel,
    /// with outbound echo suppressed for the duration of each. Returns
    /// how many messages were applied.
    pub fn poll_remote(&mut self) -> Result<usize, CollabError> {
        let (frames, gate) = match &self.collab {
            Some(channel) => (channel.drain_inbound(), channel.send_gate().clone()),
            None => return Ok(0),
        };
        let mut applied = 0;
        for frame in frames {
            let message = frame?;
            let _guard = gate.suspend();
            collab::dispatch(self, message)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Sends one message to collaborators, unless none are connected or
    /// echo suppression is engaged. Transport failures are logged, not
    /// raised: the local edit already succeeded.
    pub(crate) fn broadcast(&self, message: CommandMessage) {
        let Some(channel) = &self.collab else {
            return;
        };
        if !channel.send_gate().is_open() {
            return;
        }
        if let Err(err) = channel.send(&message) {
            tracing::warn!(%err, "failed to transmit collaboration message");
        }
    }

    // ------------------------------------------------------------------
    // Grouping
    // ------------------------------------------------------------------

    /// Groups the given operators (silent no-op on invalid gestures).
    /// Returns the new group's ID when one was created.
    pub fn group_operators(&mut self, operator_ids: &[String]) -> Result<Option<String>, GroupError> {
        self.groups
            .group_operators(&self.graph, &mut self.layout, operator_ids)
    }

    pub fn ungroup_operators(&mut self, group_id: &str) -> Result<(), GroupError> {
        self.groups.ungroup_operators(&mut self.layout, group_id)
    }

    pub fn collapse_group(&mut self, group_id: &str) -> Result<(), GroupError> {
        self.groups.collapse_group(&mut self.layout, group_id)
    }

    pub fn expand_group(&mut self, group_id: &str) -> Result<(), GroupError> {
        self.groups.expand_group(&mut self.layout, group_id)
    }

    /// Re-creates a group from a snapshot, collapsing it afterwards if it
    /// was saved collapsed.
    pub(crate) fn restore_group(&mut self, group: Group) -> Result<(), GroupError> {
        self.groups.add_group(&self.graph, &mut self.layout, group)
    }

    // ------------------------------------------------------------------
    // Action trace
    // ------------------------------------------------------------------

    pub fn start_action_trace(&mut self) {
        // Flush first so pre-trace history is not attributed to the trace.
        self.pump_watchers();
        self.trace.start();
    }

    pub fn stop_action_trace(&mut self) {
        self.pump_watchers();
        self.trace.stop();
    }

    pub fn clear_action_trace(&mut self) {
        self.trace.clear();
    }

    #[must_use]
    pub fn action_trace(&self) -> &[ActionTraceRecord] {
        self.trace.history()
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Captures the current workflow state.
    #[must_use]
    pub fn snapshot(&self) -> WorkflowInfo {
        WorkflowInfo::capture(&self.graph, &self.layout, &self.groups)
    }

    /// Replaces the current workflow with a snapshot's content.
    pub fn restore(&mut self, info: &WorkflowInfo) -> Result<(), PersistenceError> {
        persistence::restore(self, info)
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    pub fn validate_operator(&self, operator_id: &str) -> Result<Validation, GraphError> {
        validation::validate_operator(&self.graph, self.catalog.as_ref(), operator_id)
    }

    #[must_use]
    pub fn validate_workflow(&self) -> rustc_hash::FxHashMap<String, Validation> {
        validation::validate_workflow(&self.graph, self.catalog.as_ref())
    }

    // ------------------------------------------------------------------
    // Cosmetic layout state
    // ------------------------------------------------------------------

    pub fn highlight_operator(&mut self, operator_id: &str) {
        self.layout.highlight_operator(operator_id);
        self.pump_watchers();
    }

    pub fn unhighlight_all(&mut self) {
        let current: Vec<String> = self.layout.current_highlighted_operator_ids().to_vec();
        self.layout
            .unhighlight_operators(current.iter().map(String::as_str));
        self.pump_watchers();
    }

    pub fn set_multi_select_mode(&mut self, enabled: bool) {
        self.layout.set_multi_select_mode(enabled);
    }

    pub fn set_zoom_ratio(&mut self, ratio: f64) {
        self.layout.set_zoom_ratio(ratio);
    }

    pub fn restore_default_zoom_and_offset(&mut self) {
        self.layout.restore_default_zoom_and_offset();
    }

    // ------------------------------------------------------------------
    // Internal plumbing shared with `Command`
    // ------------------------------------------------------------------

    /// Drains the synchronizer so the mirror knows about the latest
    /// structural changes.
    pub(crate) fn pump_sync(&mut self) {
        self.sync.pump(&mut self.layout);
    }

    /// Drains the derived subsystems (groups, trace). Runs after every
    /// mutation step; draining an empty queue is free.
    pub(crate) fn pump_watchers(&mut self) {
        self.groups.pump(&self.graph, &mut self.layout);
        self.trace.pump(&self.graph, &self.layout, &self.groups);
    }

    pub(crate) fn notify_changed(&mut self) {
        self.changed_hub.emit(());
    }
}
