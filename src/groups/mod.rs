//! The grouping subsystem: collapsible clusters of operators.
//!
//! A [`Group`] snapshots its member operators (with saved position and
//! layer) and partitions the links it touches into internal links (both
//! endpoints inside), in-links (target inside), and out-links (source
//! inside). The [`GroupManager`] owns the groups and keeps membership
//! consistent by subscribing to graph and layout events; the graph never
//! knows groups exist.
//!
//! Two entry points with deliberately different strictness:
//! [`GroupManager::group_operators`] is gesture-triggered and silently
//! ignores invalid requests (too few operators, members already grouped),
//! while [`GroupManager::add_group`] asserts validity and errors.
//!
//! Group operations adjust only the layout mirror (size, visibility,
//! layers); they are not recorded in the undo history.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event_hub::EventHub;
use crate::graph::{GraphError, GraphEvent, WorkflowGraph};
use crate::layout::{CanvasLayout, LayoutError, LayoutEvent};
use crate::operator::{OperatorLink, OperatorPredicate};
use crate::types::{OperatorPort, Point, Size};
use crate::utils::ids;

/// A member operator with the position and layer saved for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorInfo {
    pub operator: OperatorPredicate,
    pub position: Point,
    pub layer: i64,
}

/// An internal link with its saved layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInfo {
    pub link: OperatorLink,
    pub layer: i64,
}

/// A user-defined cluster of operators, displayable as one collapsed cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_id: String,
    pub operators: FxHashMap<String, OperatorInfo>,
    /// Links with both endpoints inside the group.
    pub links: FxHashMap<String, LinkInfo>,
    /// Boundary links entering the group, keyed by link ID with the
    /// inside target port.
    pub in_links: FxHashMap<String, OperatorPort>,
    /// Boundary links leaving the group, keyed by link ID with the
    /// inside source port.
    pub out_links: FxHashMap<String, OperatorPort>,
    pub collapsed: bool,
}

/// Tight rectangle around a group's member operator positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupBoundingBox {
    pub top_left: Point,
    pub bottom_right: Point,
}

/// Notifications emitted by the group manager.
#[derive(Clone, Debug, PartialEq)]
pub enum GroupEvent {
    Added(Group),
    Deleted(Group),
    Collapsed(Group),
    Expanded(Group),
    Resized {
        group_id: String,
        width: f64,
        height: f64,
    },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GroupError {
    #[error("group with ID {0} already exists")]
    DuplicateGroup(String),

    #[error("group with ID {0} does not exist")]
    GroupNotFound(String),

    #[error("invalid group {group_id}: {reason}")]
    InvalidGroup { group_id: String, reason: String },

    #[error("group with ID {0} is already collapsed")]
    AlreadyCollapsed(String),

    #[error("group with ID {0} is already expanded")]
    AlreadyExpanded(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Geometry constants the manager draws groups with.
#[derive(Clone, Copy, Debug)]
pub struct GroupGeometry {
    /// Padding between the bounding box and the group border.
    pub margin: f64,
    /// Nominal operator cell size; positions address the top-left corner,
    /// so the bounding box extends by one cell beyond the furthest
    /// position.
    pub operator_size: Size,
    /// Fixed size of a collapsed group cell.
    pub collapsed_size: Size,
}

impl Default for GroupGeometry {
    fn default() -> Self {
        Self {
            margin: 20.0,
            operator_size: Size::new(60.0, 60.0),
            collapsed_size: Size::new(170.0, 30.0),
        }
    }
}

/// Owner of all groups in one session.
#[derive(Debug)]
pub struct GroupManager {
    groups: FxHashMap<String, Group>,
    geometry: GroupGeometry,
    hub: EventHub<GroupEvent>,
    graph_events: flume::Receiver<GraphEvent>,
    layout_events: flume::Receiver<LayoutEvent>,
    /// Re-entrancy guard for the manager's own cell moves: each
    /// programmatic move is recorded here and its echo skipped when the
    /// matching position event comes back around, so repositioning never
    /// feeds on itself. Events are delivered in order, so matching the
    /// queue front suffices.
    self_moves: VecDeque<(String, Point)>,
}

impl GroupManager {
    /// Subscribes to both stores. Must be attached before the first
    /// mutation the manager is expected to track.
    pub fn attach(
        graph: &mut WorkflowGraph,
        layout: &mut CanvasLayout,
        geometry: GroupGeometry,
    ) -> Self {
        Self {
            groups: FxHashMap::default(),
            geometry,
            hub: EventHub::new(),
            graph_events: graph.subscribe(),
            layout_events: layout.subscribe(),
            self_moves: VecDeque::new(),
        }
    }

    /// Moves a cell on the manager's own behalf, marking the move so its
    /// position event is not re-handled as a user gesture.
    fn move_cell_programmatically(
        &mut self,
        layout: &mut CanvasLayout,
        cell_id: &str,
        position: Point,
    ) -> Result<(), LayoutError> {
        self.self_moves.push_back((cell_id.to_string(), position));
        let moved = layout.set_element_position(cell_id, position);
        if moved.is_err() {
            self.self_moves.pop_back();
        }
        moved
    }

    pub fn subscribe(&mut self) -> flume::Receiver<GroupEvent> {
        self.hub.subscribe()
    }

    // ------------------------------------------------------------------
    // Public operations
    // ------------------------------------------------------------------

    /// Groups the given operators, returning the new group's ID.
    ///
    /// Gesture entry point: fewer than two operators, or any operator
    /// already grouped, makes this a silent no-op returning `Ok(None)`.
    pub fn group_operators(
        &mut self,
        graph: &WorkflowGraph,
        layout: &mut CanvasLayout,
        operator_ids: &[String],
    ) -> Result<Option<String>, GroupError> {
        if operator_ids.len() < 2 {
            return Ok(None);
        }
        if operator_ids
            .iter()
            .any(|id| self.get_group_by_operator(id).is_some())
        {
            return Ok(None);
        }

        let group = self.new_group(graph, layout, operator_ids)?;
        let group_id = group.group_id.clone();
        self.add_group(graph, layout, group)?;
        Ok(Some(group_id))
    }

    /// Adds a fully built group. Strict entry point: validity violations
    /// are errors here, never silent.
    pub fn add_group(
        &mut self,
        graph: &WorkflowGraph,
        layout: &mut CanvasLayout,
        group: Group,
    ) -> Result<(), GroupError> {
        self.assert_group_not_exists(&group.group_id)?;
        self.assert_group_is_valid(&group)?;

        let group_id = group.group_id.clone();
        let collapse_after_add = group.collapsed;

        let bounding_box = Self::bounding_box_of(&group)?;
        let (position, size) = self.frame_for(bounding_box);
        layout.add_group_cell(&group_id, position, size)?;

        let front = layout.highest_layer() + 1;
        self.move_group_to_layer(layout, &group, front)?;

        let mut group = group;
        group.collapsed = false;
        self.groups.insert(group_id.clone(), group);

        if collapse_after_add {
            self.collapse_group(layout, &group_id)?;
        }

        if let Some(added) = self.groups.get(&group_id) {
            let snapshot = added.clone();
            self.hub.emit(GroupEvent::Added(snapshot));
        }
        self.pump(graph, layout);
        Ok(())
    }

    /// Dissolves a group, expanding it first if collapsed.
    pub fn ungroup_operators(
        &mut self,
        layout: &mut CanvasLayout,
        group_id: &str,
    ) -> Result<(), GroupError> {
        let collapsed = self.get_group(group_id)?.collapsed;
        if collapsed {
            self.expand_group(layout, group_id)?;
        }

        layout.remove_cell(group_id)?;
        let group = self
            .groups
            .remove(group_id)
            .ok_or_else(|| GroupError::GroupNotFound(group_id.to_string()))?;
        self.hub.emit(GroupEvent::Deleted(group));
        Ok(())
    }

    /// Collapses a group to its fixed collapsed size, hiding members.
    pub fn collapse_group(
        &mut self,
        layout: &mut CanvasLayout,
        group_id: &str,
    ) -> Result<(), GroupError> {
        let group = self
            .groups
            .get_mut(group_id)
            .ok_or_else(|| GroupError::GroupNotFound(group_id.to_string()))?;
        if group.collapsed {
            return Err(GroupError::AlreadyCollapsed(group_id.to_string()));
        }
        group.collapsed = true;
        let snapshot = group.clone();

        layout.set_element_size(group_id, self.geometry.collapsed_size)?;
        let members: Vec<&str> = snapshot
            .operators
            .keys()
            .chain(snapshot.links.keys())
            .map(String::as_str)
            .collect();
        layout.hide_cells(members);

        self.hub.emit(GroupEvent::Collapsed(snapshot));
        Ok(())
    }

    /// Expands a collapsed group, restoring member visibility and the
    /// computed bounding-box frame.
    pub fn expand_group(
        &mut self,
        layout: &mut CanvasLayout,
        group_id: &str,
    ) -> Result<(), GroupError> {
        let collapsed = self.get_group(group_id)?.collapsed;
        if !collapsed {
            return Err(GroupError::AlreadyExpanded(group_id.to_string()));
        }

        // Still flagged collapsed while repositioning, so the frame is
        // computed from the saved member positions.
        self.reposition_group(layout, group_id)?;

        let snapshot = match self.groups.get_mut(group_id) {
            Some(group) => {
                group.collapsed = false;
                group.clone()
            }
            None => return Err(GroupError::GroupNotFound(group_id.to_string())),
        };
        let members: Vec<&str> = snapshot
            .operators
            .keys()
            .chain(snapshot.links.keys())
            .map(String::as_str)
            .collect();
        layout.show_cells(members);
        self.hub.emit(GroupEvent::Expanded(snapshot));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn get_group(&self, group_id: &str) -> Result<&Group, GroupError> {
        self.groups
            .get(group_id)
            .ok_or_else(|| GroupError::GroupNotFound(group_id.to_string()))
    }

    #[must_use]
    pub fn get_group_by_operator(&self, operator_id: &str) -> Option<&Group> {
        self.groups
            .values()
            .find(|group| group.operators.contains_key(operator_id))
    }

    #[must_use]
    pub fn get_group_by_link(&self, link_id: &str) -> Option<&Group> {
        self.groups
            .values()
            .find(|group| group.links.contains_key(link_id))
    }

    #[must_use]
    pub fn get_all_groups(&self) -> Vec<&Group> {
        self.groups.values().collect()
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn assert_group_not_exists(&self, group_id: &str) -> Result<(), GroupError> {
        if self.groups.contains_key(group_id) {
            return Err(GroupError::DuplicateGroup(group_id.to_string()));
        }
        Ok(())
    }

    /// A group is valid when it has at least two operators and none of
    /// its operators or links belong to another group.
    pub fn assert_group_is_valid(&self, group: &Group) -> Result<(), GroupError> {
        if group.operators.len() < 2 {
            return Err(GroupError::InvalidGroup {
                group_id: group.group_id.clone(),
                reason: "group has less than two operators".into(),
            });
        }
        for operator_id in group.operators.keys() {
            if let Some(other) = self.get_group_by_operator(operator_id)
                && other.group_id != group.group_id
            {
                return Err(GroupError::InvalidGroup {
                    group_id: group.group_id.clone(),
                    reason: format!("operator {operator_id} exists in another group"),
                });
            }
        }
        for link_id in group.links.keys() {
            if let Some(other) = self.get_group_by_link(link_id)
                && other.group_id != group.group_id
            {
                return Err(GroupError::InvalidGroup {
                    group_id: group.group_id.clone(),
                    reason: format!("link {link_id} exists in another group"),
                });
            }
        }
        Ok(())
    }

    /// The member's saved position when its group is collapsed, or its
    /// live canvas position otherwise.
    pub fn operator_position(
        &self,
        layout: &CanvasLayout,
        operator_id: &str,
    ) -> Result<Point, GroupError> {
        if let Some(group) = self.get_group_by_operator(operator_id)
            && group.collapsed
            && let Some(info) = group.operators.get(operator_id)
        {
            return Ok(info.position);
        }
        Ok(layout.get_element_position(operator_id)?)
    }

    // ------------------------------------------------------------------
    // Construction helpers
    // ------------------------------------------------------------------

    /// Builds a group snapshot for the given operators, partitioning the
    /// graph's links by membership.
    pub fn new_group(
        &self,
        graph: &WorkflowGraph,
        layout: &CanvasLayout,
        operator_ids: &[String],
    ) -> Result<Group, GroupError> {
        let group_id = ids::fresh_group_id();

        let mut operators = FxHashMap::default();
        for operator_id in operator_ids {
            let operator = graph.get_operator(operator_id)?.clone();
            let position = layout.get_element_position(operator_id)?;
            let layer = layout.get_cell_layer(operator_id)?;
            operators.insert(
                operator_id.clone(),
                OperatorInfo {
                    operator,
                    position,
                    layer,
                },
            );
        }

        let mut links = FxHashMap::default();
        let mut in_links = FxHashMap::default();
        let mut out_links = FxHashMap::default();
        for link in graph.get_all_links() {
            let source_in = operators.contains_key(&link.source.operator_id);
            let target_in = operators.contains_key(&link.target.operator_id);
            if source_in && target_in {
                let layer = layout.get_cell_layer(&link.link_id)?;
                links.insert(
                    link.link_id.clone(),
                    LinkInfo {
                        link: link.clone(),
                        layer,
                    },
                );
            } else if target_in {
                in_links.insert(link.link_id.clone(), link.target.clone());
            } else if source_in {
                out_links.insert(link.link_id.clone(), link.source.clone());
            }
        }

        Ok(Group {
            group_id,
            operators,
            links,
            in_links,
            out_links,
            collapsed: false,
        })
    }

    fn bounding_box_of(group: &Group) -> Result<GroupBoundingBox, GroupError> {
        let mut positions = group.operators.values().map(|info| info.position);
        let first = positions.next().ok_or_else(|| GroupError::InvalidGroup {
            group_id: group.group_id.clone(),
            reason: "group has no operators".into(),
        })?;
        let mut top_left = first;
        let mut bottom_right = first;
        for position in positions {
            top_left.x = top_left.x.min(position.x);
            top_left.y = top_left.y.min(position.y);
            bottom_right.x = bottom_right.x.max(position.x);
            bottom_right.y = bottom_right.y.max(position.y);
        }
        Ok(GroupBoundingBox {
            top_left,
            bottom_right,
        })
    }

    /// Frame (position and size) of the expanded group cell around a
    /// bounding box.
    fn frame_for(&self, bounding_box: GroupBoundingBox) -> (Point, Size) {
        let GroupGeometry {
            margin,
            operator_size,
            ..
        } = self.geometry;
        let position = Point::new(
            bounding_box.top_left.x - margin,
            bounding_box.top_left.y - margin,
        );
        let size = Size::new(
            bounding_box.bottom_right.x - bounding_box.top_left.x
                + operator_size.width
                + 2.0 * margin,
            bounding_box.bottom_right.y - bounding_box.top_left.y
                + operator_size.height
                + 2.0 * margin,
        );
        (position, size)
    }

    /// Moves the group cell to `group_layer` and every related cell to its
    /// own saved layer plus `group_layer`, keeping relative z-order.
    fn move_group_to_layer(
        &self,
        layout: &mut CanvasLayout,
        group: &Group,
        group_layer: i64,
    ) -> Result<(), GroupError> {
        for (operator_id, info) in &group.operators {
            layout.set_cell_layer(operator_id, info.layer + group_layer)?;
        }
        for (link_id, info) in &group.links {
            layout.set_cell_layer(link_id, info.layer + group_layer)?;
        }
        for link_id in group.in_links.keys().chain(group.out_links.keys()) {
            let layer = layout.get_cell_layer(link_id)?;
            layout.set_cell_layer(link_id, layer + group_layer)?;
        }
        layout.set_cell_layer(&group.group_id, group_layer)?;
        Ok(())
    }

    /// Recomputes the group cell's frame from the saved member positions.
    fn reposition_group(
        &mut self,
        layout: &mut CanvasLayout,
        group_id: &str,
    ) -> Result<(), GroupError> {
        let group = self.get_group(group_id)?;
        let bounding_box = Self::bounding_box_of(group)?;
        let (position, size) = self.frame_for(bounding_box);

        self.move_cell_programmatically(layout, group_id, position)?;
        layout.set_element_size(group_id, size)?;
        self.hub.emit(GroupEvent::Resized {
            group_id: group_id.to_string(),
            width: size.width,
            height: size.height,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Event pumping
    // ------------------------------------------------------------------

    /// Applies all pending graph and layout events to group membership.
    /// Called by the session after every mutation.
    pub fn pump(&mut self, graph: &WorkflowGraph, layout: &mut CanvasLayout) {
        while let Ok(event) = self.graph_events.try_recv() {
            self.handle_graph_event(layout, event);
        }
        while let Ok(event) = self.layout_events.try_recv() {
            self.handle_layout_event(graph, layout, event);
        }
    }

    fn handle_graph_event(&mut self, layout: &mut CanvasLayout, event: GraphEvent) {
        match event {
            GraphEvent::OperatorDeleted { operator } => {
                let affected: Vec<String> = self
                    .groups
                    .values()
                    .filter(|group| group.operators.contains_key(&operator.operator_id))
                    .map(|group| group.group_id.clone())
                    .collect();
                for group_id in affected {
                    let too_small = match self.groups.get_mut(&group_id) {
                        Some(group) => {
                            group.operators.remove(&operator.operator_id);
                            group.operators.len() < 2
                        }
                        None => continue,
                    };
                    if too_small {
                        if let Err(err) = self.ungroup_operators(layout, &group_id) {
                            tracing::warn!(%err, group_id, "auto-ungroup failed");
                        }
                    } else if let Err(err) = self.reposition_group(layout, &group_id) {
                        tracing::warn!(%err, group_id, "group reposition failed");
                    }
                }
            }
            GraphEvent::LinkAdded(link) => {
                for group in self.groups.values_mut() {
                    let source_in = group.operators.contains_key(&link.source.operator_id);
                    let target_in = group.operators.contains_key(&link.target.operator_id);
                    if source_in && target_in {
                        let layer = layout.get_cell_layer(&link.link_id).unwrap_or_default();
                        group.links.insert(
                            link.link_id.clone(),
                            LinkInfo {
                                link: link.clone(),
                                layer,
                            },
                        );
                    } else if target_in {
                        group
                            .in_links
                            .insert(link.link_id.clone(), link.target.clone());
                    } else if source_in {
                        group
                            .out_links
                            .insert(link.link_id.clone(), link.source.clone());
                    }
                }
            }
            GraphEvent::LinkDeleted { link } => {
                for group in self.groups.values_mut() {
                    group.links.remove(&link.link_id);
                    group.in_links.remove(&link.link_id);
                    group.out_links.remove(&link.link_id);
                }
            }
            GraphEvent::OperatorAdded(_)
            | GraphEvent::OperatorPropertyChanged { .. }
            | GraphEvent::OperatorAdvancedStatusChanged { .. }
            | GraphEvent::BreakpointChanged { .. } => {}
        }
    }

    fn handle_layout_event(
        &mut self,
        graph: &WorkflowGraph,
        layout: &mut CanvasLayout,
        event: LayoutEvent,
    ) {
        match event {
            LayoutEvent::PositionChanged {
                element_id,
                old_position,
                new_position,
            } => {
                // Skip the echo of our own programmatic moves.
                if let Some((cell_id, position)) = self.self_moves.front()
                    && *cell_id == element_id
                    && *position == new_position
                {
                    self.self_moves.pop_front();
                    return;
                }
                if graph.has_operator(&element_id) {
                    let containing: Option<String> = self
                        .get_group_by_operator(&element_id)
                        .map(|group| group.group_id.clone());
                    if let Some(group_id) = containing {
                        if let Some(info) = self
                            .groups
                            .get_mut(&group_id)
                            .and_then(|group| group.operators.get_mut(&element_id))
                        {
                            info.position = new_position;
                        }
                        if let Err(err) = self.reposition_group(layout, &group_id) {
                            tracing::warn!(%err, group_id, "group reposition failed");
                        }
                    }
                } else if self.groups.contains_key(&element_id) {
                    // A collapsed group dragged across the canvas carries
                    // its hidden members along, so expansion restores the
                    // members at the right spot.
                    let offset = new_position - old_position;
                    let is_collapsed = self
                        .groups
                        .get(&element_id)
                        .map(|group| group.collapsed)
                        .unwrap_or(false);
                    if is_collapsed && !offset.is_zero() {
                        self.shift_collapsed_members(layout, &element_id, offset);
                    }
                }
            }
            LayoutEvent::LayerChanged {
                cell_id, new_layer, ..
            } => {
                for group in self.groups.values_mut() {
                    if let Some(info) = group.operators.get_mut(&cell_id) {
                        info.layer = new_layer;
                    }
                    if let Some(info) = group.links.get_mut(&cell_id) {
                        info.layer = new_layer;
                    }
                }
            }
            LayoutEvent::Highlighted { .. } | LayoutEvent::Unhighlighted { .. } => {}
        }
    }

    /// Moves a collapsed group's hidden member cells (and their saved
    /// positions) by `offset`, with re-handling of our own moves
    /// suppressed.
    fn shift_collapsed_members(
        &mut self,
        layout: &mut CanvasLayout,
        group_id: &str,
        offset: Point,
    ) {
        let moves: Vec<(String, Point)> = match self.groups.get_mut(group_id) {
            Some(group) => group
                .operators
                .values_mut()
                .map(|info| {
                    info.position = info.position + offset;
                    (info.operator.operator_id.clone(), info.position)
                })
                .collect(),
            None => return,
        };
        for (operator_id, position) in moves {
            if let Err(err) = self.move_cell_programmatically(layout, &operator_id, position) {
                tracing::warn!(%err, "failed to carry hidden member with its group");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DeletePolicy;

    fn fixture() -> (WorkflowGraph, CanvasLayout, GroupManager) {
        let mut graph = WorkflowGraph::new(DeletePolicy::CascadeLinks);
        let mut layout = CanvasLayout::new();
        let manager = GroupManager::attach(&mut graph, &mut layout, GroupGeometry::default());
        (graph, layout, manager)
    }

    fn add_operator(
        graph: &mut WorkflowGraph,
        layout: &mut CanvasLayout,
        id: &str,
        position: Point,
    ) {
        graph
            .add_operator(
                OperatorPredicate::new(id, "CsvScan")
                    .with_input_ports(["in0"])
                    .with_output_ports(["out0"]),
            )
            .unwrap();
        layout.add_operator_cell(id).unwrap();
        layout.set_element_position(id, position).unwrap();
    }

    #[test]
    fn group_operators_is_silent_below_two_members() {
        let (graph, mut layout, mut manager) = fixture();
        let result = manager
            .group_operators(&graph, &mut layout, &["only".to_string()])
            .unwrap();
        assert!(result.is_none());
        assert_eq!(manager.group_count(), 0);
    }

    #[test]
    fn grouping_and_bounding_box() {
        let (mut graph, mut layout, mut manager) = fixture();
        add_operator(&mut graph, &mut layout, "a", Point::new(100.0, 100.0));
        add_operator(&mut graph, &mut layout, "b", Point::new(300.0, 200.0));
        manager.pump(&graph, &mut layout);

        let group_id = manager
            .group_operators(&graph, &mut layout, &["a".into(), "b".into()])
            .unwrap()
            .unwrap();

        // margin 20, operator 60x60: frame is (80,80) with size 300x220.
        assert_eq!(
            layout.get_element_position(&group_id).unwrap(),
            Point::new(80.0, 80.0)
        );
        assert_eq!(
            layout.get_element_size(&group_id).unwrap(),
            Some(Size::new(300.0, 220.0))
        );
    }

    #[test]
    fn add_group_asserts_membership_exclusivity() {
        let (mut graph, mut layout, mut manager) = fixture();
        add_operator(&mut graph, &mut layout, "a", Point::new(0.0, 0.0));
        add_operator(&mut graph, &mut layout, "b", Point::new(10.0, 0.0));
        add_operator(&mut graph, &mut layout, "c", Point::new(20.0, 0.0));
        manager.pump(&graph, &mut layout);

        manager
            .group_operators(&graph, &mut layout, &["a".into(), "b".into()])
            .unwrap()
            .unwrap();

        // Silent path: overlapping gesture grouping is ignored.
        assert!(
            manager
                .group_operators(&graph, &mut layout, &["b".into(), "c".into()])
                .unwrap()
                .is_none()
        );

        // Strict path: the same violation is an error.
        let overlapping = manager
            .new_group(&graph, &layout, &["b".into(), "c".into()])
            .unwrap();
        let err = manager
            .add_group(&graph, &mut layout, overlapping)
            .unwrap_err();
        assert!(matches!(err, GroupError::InvalidGroup { .. }));
    }

    #[test]
    fn collapse_hides_members_and_expand_restores_them() {
        let (mut graph, mut layout, mut manager) = fixture();
        add_operator(&mut graph, &mut layout, "a", Point::new(100.0, 100.0));
        add_operator(&mut graph, &mut layout, "b", Point::new(300.0, 100.0));
        manager.pump(&graph, &mut layout);
        let group_id = manager
            .group_operators(&graph, &mut layout, &["a".into(), "b".into()])
            .unwrap()
            .unwrap();

        manager.collapse_group(&mut layout, &group_id).unwrap();
        assert!(!layout.is_cell_visible("a").unwrap());
        assert!(!layout.is_cell_visible("b").unwrap());
        assert_eq!(
            layout.get_element_size(&group_id).unwrap(),
            Some(Size::new(170.0, 30.0))
        );
        assert!(matches!(
            manager.collapse_group(&mut layout, &group_id),
            Err(GroupError::AlreadyCollapsed(_))
        ));

        manager.expand_group(&mut layout, &group_id).unwrap();
        assert!(layout.is_cell_visible("a").unwrap());
        assert!(layout.is_cell_visible("b").unwrap());
        assert_eq!(
            layout.get_element_position("a").unwrap(),
            Point::new(100.0, 100.0)
        );
        assert!(matches!(
            manager.expand_group(&mut layout, &group_id),
            Err(GroupError::AlreadyExpanded(_))
        ));
    }

    #[test]
    fn moving_collapsed_group_carries_members() {
        let (mut graph, mut layout, mut manager) = fixture();
        add_operator(&mut graph, &mut layout, "a", Point::new(100.0, 100.0));
        add_operator(&mut graph, &mut layout, "b", Point::new(200.0, 100.0));
        manager.pump(&graph, &mut layout);
        let group_id = manager
            .group_operators(&graph, &mut layout, &["a".into(), "b".into()])
            .unwrap()
            .unwrap();
        manager.collapse_group(&mut layout, &group_id).unwrap();

        let position = layout.get_element_position(&group_id).unwrap();
        layout
            .set_element_position(&group_id, position + Point::new(50.0, 10.0))
            .unwrap();
        manager.pump(&graph, &mut layout);

        manager.expand_group(&mut layout, &group_id).unwrap();
        assert_eq!(
            layout.get_element_position("a").unwrap(),
            Point::new(150.0, 110.0)
        );
        assert_eq!(
            layout.get_element_position("b").unwrap(),
            Point::new(250.0, 110.0)
        );
    }

    #[test]
    fn operator_delete_shrinks_group_and_auto_ungroups() {
        let (mut graph, mut layout, mut manager) = fixture();
        add_operator(&mut graph, &mut layout, "a", Point::new(0.0, 0.0));
        add_operator(&mut graph, &mut layout, "b", Point::new(100.0, 0.0));
        add_operator(&mut graph, &mut layout, "c", Point::new(200.0, 0.0));
        manager.pump(&graph, &mut layout);
        let group_id = manager
            .group_operators(
                &graph,
                &mut layout,
                &["a".into(), "b".into(), "c".into()],
            )
            .unwrap()
            .unwrap();

        graph.delete_operator("c").unwrap();
        layout.remove_cell("c").unwrap();
        manager.pump(&graph, &mut layout);
        assert_eq!(
            manager.get_group(&group_id).unwrap().operators.len(),
            2
        );

        graph.delete_operator("b").unwrap();
        layout.remove_cell("b").unwrap();
        manager.pump(&graph, &mut layout);
        assert!(manager.get_group(&group_id).is_err());
        assert!(!layout.has_cell(&group_id));
    }

    #[test]
    fn links_are_classified_and_reclassified() {
        let (mut graph, mut layout, mut manager) = fixture();
        add_operator(&mut graph, &mut layout, "a", Point::new(0.0, 0.0));
        add_operator(&mut graph, &mut layout, "b", Point::new(100.0, 0.0));
        add_operator(&mut graph, &mut layout, "out", Point::new(200.0, 0.0));
        manager.pump(&graph, &mut layout);
        let group_id = manager
            .group_operators(&graph, &mut layout, &["a".into(), "b".into()])
            .unwrap()
            .unwrap();

        let internal = OperatorLink::new(
            "internal",
            OperatorPort::new("a", "out0"),
            OperatorPort::new("b", "in0"),
        );
        let leaving = OperatorLink::new(
            "leaving",
            OperatorPort::new("b", "out0"),
            OperatorPort::new("out", "in0"),
        );
        graph.add_link(internal).unwrap();
        layout.add_link_cell("internal").unwrap();
        graph.add_link(leaving).unwrap();
        layout.add_link_cell("leaving").unwrap();
        manager.pump(&graph, &mut layout);

        let group = manager.get_group(&group_id).unwrap();
        assert!(group.links.contains_key("internal"));
        assert!(group.out_links.contains_key("leaving"));

        graph.delete_link_with_id("leaving").unwrap();
        layout.remove_cell("leaving").unwrap();
        manager.pump(&graph, &mut layout);
        let group = manager.get_group(&group_id).unwrap();
        assert!(!group.out_links.contains_key("leaving"));
    }
}
