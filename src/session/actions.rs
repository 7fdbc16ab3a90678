//! The public action methods: the only doorway through which a workflow
//! ever changes.
//!
//! Every method follows the same protocol: settle any pending drag,
//! capture the pre-state needed to invert the change, build a
//! [`Command`], run it with the re-entrancy gate suspended, push it onto
//! the undo history, and broadcast it to collaborators. A command whose
//! execution fails is neither recorded nor broadcast.
//!
//! Batch operations are atomic at the command level: one undo reverses
//! the whole batch. Ordering inside a batch matters and is fixed here:
//! operators before links on add, links before operators on delete,
//! because link validity depends on endpoint existence.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::command::{Command, SavedLink, SavedOperator};
use crate::collab::CommandMessage;
use crate::operator::{Breakpoint, OperatorLink, OperatorPredicate};
use crate::types::{OperatorPort, Point};

use super::drag::SettledDrag;
use super::{ActionError, OperatorAndPosition, WorkflowSession};

impl WorkflowSession {
    // ------------------------------------------------------------------
    // Public actions
    // ------------------------------------------------------------------

    /// Adds an operator at a canvas position and highlights it.
    pub fn add_operator(
        &mut self,
        operator: OperatorPredicate,
        position: Point,
    ) -> Result<(), ActionError> {
        self.settle_drag()?;
        let previously_highlighted = self.layout.current_highlighted_operator_ids().to_vec();
        let parameters = serde_json::to_value((&operator, &position))?;
        let command = Command::AddOperator {
            operator,
            position,
            previously_highlighted,
        };
        self.run_and_broadcast(command, parameters)
    }

    /// Deletes an operator together with its incident links; undo
    /// restores all of them at their original positions and layers.
    pub fn delete_operator(&mut self, operator_id: &str) -> Result<(), ActionError> {
        self.settle_drag()?;
        let operator = self.saved_operator(operator_id)?;
        let links = self.incident_saved_links(operator_id)?;
        let parameters = serde_json::to_value((operator_id,))?;
        let command = Command::DeleteOperator { operator, links };
        self.run_and_broadcast(command, parameters)
    }

    /// Adds several operators and links (and optionally breakpoints) as
    /// one atomic command, e.g. on paste or workflow restore.
    pub fn add_operators_and_links(
        &mut self,
        operators: Vec<OperatorAndPosition>,
        links: Vec<OperatorLink>,
        breakpoints: FxHashMap<String, Breakpoint>,
    ) -> Result<(), ActionError> {
        self.settle_drag()?;
        let previously_highlighted = self.layout.current_highlighted_operator_ids().to_vec();
        let parameters = serde_json::to_value((&operators, &links, &breakpoints))?;

        let mut breakpoints: Vec<(String, Breakpoint)> = breakpoints.into_iter().collect();
        breakpoints.sort_by(|a, b| a.0.cmp(&b.0));
        let command = Command::AddOperatorsAndLinks {
            operators: operators
                .into_iter()
                .map(|entry| (entry.operator, entry.position))
                .collect(),
            links,
            breakpoints,
            previously_highlighted,
        };
        self.run_and_broadcast(command, parameters)
    }

    /// Deletes the named links and operators (plus every link incident to
    /// a deleted operator) as one atomic command.
    pub fn delete_operators_and_links(
        &mut self,
        operator_ids: &[String],
        link_ids: &[String],
    ) -> Result<(), ActionError> {
        self.settle_drag()?;

        let mut operators = Vec::with_capacity(operator_ids.len());
        for operator_id in operator_ids {
            operators.push(self.saved_operator(operator_id)?);
        }

        // Explicitly named links plus links touching a deleted operator,
        // deduplicated by ID.
        let mut links: FxHashMap<String, SavedLink> = FxHashMap::default();
        for link_id in link_ids {
            links.insert(link_id.clone(), self.saved_link(link_id)?);
        }
        let incident: Vec<String> = self
            .graph
            .get_all_links()
            .into_iter()
            .filter(|link| {
                operator_ids.contains(&link.source.operator_id)
                    || operator_ids.contains(&link.target.operator_id)
            })
            .map(|link| link.link_id.clone())
            .collect();
        for link_id in incident {
            if !links.contains_key(&link_id) {
                let saved = self.saved_link(&link_id)?;
                links.insert(link_id, saved);
            }
        }
        let mut links: Vec<SavedLink> = links.into_values().collect();
        links.sort_by(|a, b| a.link.link_id.cmp(&b.link.link_id));

        let previously_highlighted = self.layout.current_highlighted_operator_ids().to_vec();
        let parameters = serde_json::to_value((operator_ids, link_ids))?;
        let command = Command::DeleteOperatorsAndLinks {
            operators,
            links,
            previously_highlighted,
        };
        self.run_and_broadcast(command, parameters)
    }

    /// Adds a link between two existing operators.
    pub fn add_link(&mut self, link: OperatorLink) -> Result<(), ActionError> {
        self.settle_drag()?;
        let parameters = serde_json::to_value((&link,))?;
        let command = Command::AddLink { link };
        self.run_and_broadcast(command, parameters)
    }

    /// Deletes a link by ID; undo restores it with its layer and
    /// breakpoint.
    pub fn delete_link_with_id(&mut self, link_id: &str) -> Result<(), ActionError> {
        self.settle_drag()?;
        let link = self.saved_link(link_id)?;
        let parameters = serde_json::to_value((link_id,))?;
        let command = Command::DeleteLink { link };
        self.run_and_broadcast(command, parameters)
    }

    /// Deletes the link connecting the given port pair.
    pub fn delete_link(
        &mut self,
        source: &OperatorPort,
        target: &OperatorPort,
    ) -> Result<(), ActionError> {
        let link_id = self.graph.get_link(source, target)?.link_id.clone();
        self.delete_link_with_id(&link_id)
    }

    /// Replaces an operator's property object wholesale.
    pub fn set_operator_property(
        &mut self,
        operator_id: &str,
        new_properties: Value,
    ) -> Result<(), ActionError> {
        self.settle_drag()?;
        let old_properties = self
            .graph
            .get_operator(operator_id)?
            .operator_properties
            .clone();
        let parameters = serde_json::to_value((operator_id, &new_properties))?;
        let command = Command::SetOperatorProperty {
            operator_id: operator_id.to_string(),
            old_properties,
            new_properties,
        };
        self.run_and_broadcast(command, parameters)
    }

    /// Toggles the advanced-options panel flag on an operator.
    pub fn set_operator_advanced_status(
        &mut self,
        operator_id: &str,
        show_advanced: bool,
    ) -> Result<(), ActionError> {
        self.settle_drag()?;
        self.graph.assert_operator_exists(operator_id)?;
        let parameters = serde_json::to_value((operator_id, show_advanced))?;
        let command = Command::SetOperatorAdvancedStatus {
            operator_id: operator_id.to_string(),
            show_advanced,
        };
        self.run_and_broadcast(command, parameters)
    }

    /// Sets or clears a link's breakpoint. `None` means "no breakpoint".
    pub fn set_link_breakpoint(
        &mut self,
        link_id: &str,
        breakpoint: Option<Breakpoint>,
    ) -> Result<(), ActionError> {
        self.settle_drag()?;
        self.graph.assert_link_with_id_exists(link_id)?;
        let old = self.graph.get_link_breakpoint(link_id).cloned();
        let parameters = serde_json::to_value((link_id, &breakpoint))?;
        let command = Command::SetLinkBreakpoint {
            link_id: link_id.to_string(),
            old,
            new: breakpoint,
        };
        self.run_and_broadcast(command, parameters)
    }

    /// Moves the given operators by a net offset, as one undoable
    /// command. This is also how remote drag gestures replay.
    pub fn move_operators(
        &mut self,
        operator_ids: &[String],
        offset: Point,
    ) -> Result<(), ActionError> {
        self.settle_drag()?;
        let parameters = serde_json::to_value((operator_ids, offset.x, offset.y))?;
        let command = Command::MoveOperators {
            operator_ids: operator_ids.to_vec(),
            offset,
            apply_on_execute: true,
        };
        self.run_and_broadcast(command, parameters)
    }

    // ------------------------------------------------------------------
    // Gesture ingestion
    // ------------------------------------------------------------------

    /// Feeds one raw drag frame from the rendering collaborator.
    ///
    /// The position is applied to the mirror immediately (the canvas
    /// already shows the cell there); the history and the network see a
    /// single net-offset command once the gesture settles. Frames arriving
    /// while a command replay is in flight are the replay's own side
    /// effects and are ignored.
    pub fn on_element_dragged(
        &mut self,
        element_id: &str,
        new_position: Point,
    ) -> Result<(), ActionError> {
        if !self.undo_redo.listen_gate().is_open() {
            return Ok(());
        }
        let old_position = self.layout.get_element_position(element_id)?;
        let settled = self.drag.observe(
            element_id,
            old_position,
            new_position,
            self.layout.current_highlighted_operator_ids(),
            std::time::Instant::now(),
        );
        if let Some(settled) = settled {
            self.store_settled_drag(settled)?;
        }
        self.layout.set_element_position(element_id, new_position)?;
        self.pump_watchers();
        Ok(())
    }

    /// Forces the pending drag gesture (if any) into the undo history.
    ///
    /// Called automatically before every command and undo/redo; hosts
    /// should also call it from their idle timer so a gesture settles
    /// after the configured quiescence gap even when nothing else
    /// happens.
    pub fn settle_drag(&mut self) -> Result<(), ActionError> {
        if let Some(settled) = self.drag.flush() {
            self.store_settled_drag(settled)?;
        }
        Ok(())
    }

    fn store_settled_drag(&mut self, settled: SettledDrag) -> Result<(), ActionError> {
        let parameters = serde_json::to_value((
            &settled.operator_ids,
            settled.offset.x,
            settled.offset.y,
        ))?;
        let command = Command::MoveOperators {
            operator_ids: settled.operator_ids,
            offset: settled.offset,
            // The gesture already placed the cells.
            apply_on_execute: false,
        };
        self.run_and_broadcast(command, parameters)
    }

    // ------------------------------------------------------------------
    // Command application
    // ------------------------------------------------------------------

    fn run_and_broadcast(
        &mut self,
        command: Command,
        parameters: Value,
    ) -> Result<(), ActionError> {
        let action = command.action_name();
        if self.execute_and_store(command)? {
            self.broadcast(CommandMessage::execute(action, parameters));
        }
        Ok(())
    }

    /// Runs a command under the suspended listen gate and records it.
    /// Returns `false` when the command was dropped by the modification
    /// gate (reported, not an error).
    pub(crate) fn execute_and_store(&mut self, command: Command) -> Result<bool, ActionError> {
        if command.modifies_workflow() && !self.undo_redo.modification_enabled() {
            tracing::warn!(
                action = ?command.action_name(),
                "workflow modification is disabled; command dropped"
            );
            return Ok(false);
        }
        let gate = self.undo_redo.listen_gate().clone();
        let guard = gate.suspend();
        let result = command.execute(self);
        drop(guard);
        result?;
        self.undo_redo.add_command(command);
        self.notify_changed();
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Low-level mutation steps shared by `Command` execute/undo/redo
    // ------------------------------------------------------------------

    pub(crate) fn add_operator_internal(
        &mut self,
        operator: OperatorPredicate,
        position: Point,
    ) -> Result<(), ActionError> {
        if !self.catalog.operator_type_exists(&operator.operator_type) {
            return Err(ActionError::UnknownOperatorType(
                operator.operator_type.clone(),
            ));
        }
        let operator_id = operator.operator_id.clone();
        self.graph.add_operator(operator)?;
        self.pump_sync();
        self.layout.set_element_position(&operator_id, position)?;
        self.pump_watchers();
        Ok(())
    }

    pub(crate) fn delete_operator_internal(&mut self, operator_id: &str) -> Result<(), ActionError> {
        self.graph.delete_operator(operator_id)?;
        self.pump_sync();
        self.pump_watchers();
        Ok(())
    }

    pub(crate) fn add_link_internal(&mut self, link: OperatorLink) -> Result<(), ActionError> {
        self.graph.add_link(link)?;
        self.pump_sync();
        self.pump_watchers();
        Ok(())
    }

    pub(crate) fn delete_link_internal(&mut self, link_id: &str) -> Result<(), ActionError> {
        self.graph.delete_link_with_id(link_id)?;
        self.pump_sync();
        self.pump_watchers();
        Ok(())
    }

    pub(crate) fn set_operator_property_internal(
        &mut self,
        operator_id: &str,
        properties: Value,
    ) -> Result<(), ActionError> {
        self.layout.highlight_operator(operator_id);
        self.graph.set_operator_property(operator_id, properties)?;
        self.pump_watchers();
        Ok(())
    }

    pub(crate) fn set_operator_advanced_status_internal(
        &mut self,
        operator_id: &str,
        show_advanced: bool,
    ) -> Result<(), ActionError> {
        self.layout.highlight_operator(operator_id);
        self.graph
            .set_operator_advanced_status(operator_id, show_advanced)?;
        self.pump_watchers();
        Ok(())
    }

    pub(crate) fn set_link_breakpoint_internal(
        &mut self,
        link_id: &str,
        breakpoint: Option<Breakpoint>,
    ) -> Result<(), ActionError> {
        self.graph.set_link_breakpoint(link_id, breakpoint)?;
        self.pump_watchers();
        Ok(())
    }

    /// Translates the given operators by `offset` and makes them the
    /// current selection, mirroring how a drag leaves the canvas.
    pub(crate) fn move_operators_internal(
        &mut self,
        operator_ids: &[String],
        offset: Point,
    ) -> Result<(), ActionError> {
        let current: Vec<String> = self.layout.current_highlighted_operator_ids().to_vec();
        self.layout
            .unhighlight_operators(current.iter().map(String::as_str));
        self.layout.set_multi_select_mode(operator_ids.len() > 1);
        for operator_id in operator_ids {
            self.layout.highlight_operator(operator_id);
            let position = self.layout.get_element_position(operator_id)?;
            self.layout
                .set_element_position(operator_id, position + offset)?;
        }
        self.pump_watchers();
        Ok(())
    }

    /// Puts an operator back with its saved position and layer.
    pub(crate) fn restore_operator_internal(
        &mut self,
        saved: &SavedOperator,
    ) -> Result<(), ActionError> {
        self.add_operator_internal(saved.operator.clone(), saved.position)?;
        self.layout
            .set_cell_layer(&saved.operator.operator_id, saved.layer)?;
        self.pump_watchers();
        Ok(())
    }

    /// Puts a link back with its saved layer and breakpoint.
    pub(crate) fn restore_link_internal(&mut self, saved: &SavedLink) -> Result<(), ActionError> {
        self.add_link_internal(saved.link.clone())?;
        self.layout.set_cell_layer(&saved.link.link_id, saved.layer)?;
        if let Some(breakpoint) = &saved.breakpoint {
            self.graph
                .set_link_breakpoint(&saved.link.link_id, Some(breakpoint.clone()))?;
        }
        self.pump_watchers();
        Ok(())
    }

    /// Restores a remembered highlight set, the common tail of most undo
    /// paths.
    pub(crate) fn restore_highlights(&mut self, previously_highlighted: &[String]) {
        let current: Vec<String> = self.layout.current_highlighted_operator_ids().to_vec();
        self.layout
            .unhighlight_operators(current.iter().map(String::as_str));
        self.layout
            .set_multi_select_mode(previously_highlighted.len() > 1);
        self.layout
            .highlight_operators(previously_highlighted.iter().map(String::as_str));
        self.pump_watchers();
    }

    // ------------------------------------------------------------------
    // Pre-state capture
    // ------------------------------------------------------------------

    fn saved_operator(&self, operator_id: &str) -> Result<SavedOperator, ActionError> {
        Ok(SavedOperator {
            operator: self.graph.get_operator(operator_id)?.clone(),
            position: self.layout.get_element_position(operator_id)?,
            layer: self.layout.get_cell_layer(operator_id)?,
        })
    }

    fn saved_link(&self, link_id: &str) -> Result<SavedLink, ActionError> {
        Ok(SavedLink {
            link: self.graph.get_link_with_id(link_id)?.clone(),
            layer: self.layout.get_cell_layer(link_id)?,
            breakpoint: self.graph.get_link_breakpoint(link_id).cloned(),
        })
    }

    /// Every link touching the operator, sorted by ID for deterministic
    /// undo ordering.
    fn incident_saved_links(&self, operator_id: &str) -> Result<Vec<SavedLink>, ActionError> {
        let mut link_ids: Vec<String> = self
            .graph
            .get_all_links()
            .into_iter()
            .filter(|link| link.touches_operator(operator_id))
            .map(|link| link.link_id.clone())
            .collect();
        link_ids.sort();
        link_ids
            .iter()
            .map(|link_id| self.saved_link(link_id))
            .collect()
    }
}
