//! The visual layout mirror: position, z-order, and UI state of the canvas.
//!
//! [`CanvasLayout`] tracks one cell per graph entity (operator, link, or
//! group) with its position, integer layer (front = highest), optional
//! explicit size, and visibility. It also owns the purely visual session
//! state: the highlighted-operator set, the multi-select flag, and the
//! zoom/pan viewport.
//!
//! The mirror holds no logical information. Cell *existence* for operators
//! and links is managed by [`crate::sync::LayoutSync`] reacting to graph
//! events; group cells are managed by [`crate::groups::GroupManager`].
//! Everything else (positions, layers, highlight) is driven by the command
//! gateway.

mod events;

pub use events::LayoutEvent;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::event_hub::EventHub;
use crate::types::{Point, Size};

/// Smallest zoom ratio the viewport may reach.
pub const ZOOM_MINIMUM: f64 = 0.7;
/// Largest zoom ratio the viewport may reach.
pub const ZOOM_MAXIMUM: f64 = 1.3;

/// Errors raised when a layout operation names a cell that is not there.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("canvas cell with ID {0} does not exist")]
    CellNotFound(String),

    #[error("canvas cell with ID {0} already exists")]
    DuplicateCell(String),
}

/// What kind of graph entity a canvas cell mirrors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Operator,
    Link,
    Group,
}

#[derive(Clone, Debug)]
struct Cell {
    kind: CellKind,
    position: Point,
    layer: i64,
    size: Option<Size>,
    visible: bool,
}

/// Visual state of every cell on the canvas plus viewport and selection.
#[derive(Debug)]
pub struct CanvasLayout {
    cells: FxHashMap<String, Cell>,
    highlighted: Vec<String>,
    multi_select: bool,
    next_layer: i64,
    zoom_ratio: f64,
    pan_offset: Point,
    hub: EventHub<LayoutEvent>,
}

impl Default for CanvasLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasLayout {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: FxHashMap::default(),
            highlighted: Vec::new(),
            multi_select: false,
            next_layer: 0,
            zoom_ratio: 1.0,
            pan_offset: Point::default(),
            hub: EventHub::new(),
        }
    }

    /// Subscribes to position/layer/highlight changes (future events only).
    pub fn subscribe(&mut self) -> flume::Receiver<LayoutEvent> {
        self.hub.subscribe()
    }

    // ------------------------------------------------------------------
    // Cell lifecycle
    // ------------------------------------------------------------------

    pub fn add_operator_cell(&mut self, id: impl Into<String>) -> Result<(), LayoutError> {
        self.add_cell(id.into(), CellKind::Operator, Point::default(), None)
    }

    pub fn add_link_cell(&mut self, id: impl Into<String>) -> Result<(), LayoutError> {
        self.add_cell(id.into(), CellKind::Link, Point::default(), None)
    }

    pub fn add_group_cell(
        &mut self,
        id: impl Into<String>,
        position: Point,
        size: Size,
    ) -> Result<(), LayoutError> {
        self.add_cell(id.into(), CellKind::Group, position, Some(size))
    }

    fn add_cell(
        &mut self,
        id: String,
        kind: CellKind,
        position: Point,
        size: Option<Size>,
    ) -> Result<(), LayoutError> {
        if self.cells.contains_key(&id) {
            return Err(LayoutError::DuplicateCell(id));
        }
        self.next_layer += 1;
        self.cells.insert(
            id,
            Cell {
                kind,
                position,
                layer: self.next_layer,
                size,
                visible: true,
            },
        );
        Ok(())
    }

    pub fn remove_cell(&mut self, id: &str) -> Result<(), LayoutError> {
        self.cells
            .remove(id)
            .ok_or_else(|| LayoutError::CellNotFound(id.to_string()))?;
        self.highlighted.retain(|h| h != id);
        Ok(())
    }

    #[must_use]
    pub fn has_cell(&self, id: &str) -> bool {
        self.cells.contains_key(id)
    }

    #[must_use]
    pub fn cell_kind(&self, id: &str) -> Option<CellKind> {
        self.cells.get(id).map(|cell| cell.kind)
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    pub fn set_element_position(&mut self, id: &str, position: Point) -> Result<(), LayoutError> {
        let cell = self
            .cells
            .get_mut(id)
            .ok_or_else(|| LayoutError::CellNotFound(id.to_string()))?;
        let old = cell.position;
        cell.position = position;
        self.hub.emit(LayoutEvent::PositionChanged {
            element_id: id.to_string(),
            old_position: old,
            new_position: position,
        });
        Ok(())
    }

    pub fn get_element_position(&self, id: &str) -> Result<Point, LayoutError> {
        self.cells
            .get(id)
            .map(|cell| cell.position)
            .ok_or_else(|| LayoutError::CellNotFound(id.to_string()))
    }

    pub fn set_element_size(&mut self, id: &str, size: Size) -> Result<(), LayoutError> {
        let cell = self
            .cells
            .get_mut(id)
            .ok_or_else(|| LayoutError::CellNotFound(id.to_string()))?;
        cell.size = Some(size);
        Ok(())
    }

    pub fn get_element_size(&self, id: &str) -> Result<Option<Size>, LayoutError> {
        self.cells
            .get(id)
            .map(|cell| cell.size)
            .ok_or_else(|| LayoutError::CellNotFound(id.to_string()))
    }

    // ------------------------------------------------------------------
    // Layers
    // ------------------------------------------------------------------

    pub fn set_cell_layer(&mut self, id: &str, layer: i64) -> Result<(), LayoutError> {
        let cell = self
            .cells
            .get_mut(id)
            .ok_or_else(|| LayoutError::CellNotFound(id.to_string()))?;
        let old = cell.layer;
        cell.layer = layer;
        self.next_layer = self.next_layer.max(layer);
        self.hub.emit(LayoutEvent::LayerChanged {
            cell_id: id.to_string(),
            old_layer: old,
            new_layer: layer,
        });
        Ok(())
    }

    pub fn get_cell_layer(&self, id: &str) -> Result<i64, LayoutError> {
        self.cells
            .get(id)
            .map(|cell| cell.layer)
            .ok_or_else(|| LayoutError::CellNotFound(id.to_string()))
    }

    /// Layer of the frontmost cell, or 0 on an empty canvas.
    #[must_use]
    pub fn highest_layer(&self) -> i64 {
        self.cells.values().map(|cell| cell.layer).max().unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    /// Hides the given cells without removing them (collapsed groups).
    /// IDs without a cell are ignored.
    pub fn hide_cells<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            if let Some(cell) = self.cells.get_mut(id) {
                cell.visible = false;
            }
        }
    }

    /// Makes the given cells visible again. IDs without a cell are ignored.
    pub fn show_cells<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            if let Some(cell) = self.cells.get_mut(id) {
                cell.visible = true;
            }
        }
    }

    pub fn is_cell_visible(&self, id: &str) -> Result<bool, LayoutError> {
        self.cells
            .get(id)
            .map(|cell| cell.visible)
            .ok_or_else(|| LayoutError::CellNotFound(id.to_string()))
    }

    // ------------------------------------------------------------------
    // Highlight / selection
    // ------------------------------------------------------------------

    /// Highlights one operator. Outside multi-select mode this replaces
    /// the current highlight set. Unknown or non-operator IDs are ignored,
    /// matching direct-manipulation semantics where stale gestures arrive
    /// after a delete.
    pub fn highlight_operator(&mut self, operator_id: &str) {
        match self.cells.get(operator_id) {
            Some(cell) if cell.kind == CellKind::Operator => {}
            _ => return,
        }
        if !self.multi_select {
            let previous: Vec<String> = self.highlighted.drain(..).collect();
            for id in previous {
                self.hub.emit(LayoutEvent::Unhighlighted {
                    operator_id: id,
                });
            }
        }
        if !self.highlighted.iter().any(|id| id == operator_id) {
            self.highlighted.push(operator_id.to_string());
            self.hub.emit(LayoutEvent::Highlighted {
                operator_id: operator_id.to_string(),
            });
        }
    }

    pub fn highlight_operators<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            self.highlight_operator(id);
        }
    }

    pub fn unhighlight_operators<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            if let Some(index) = self.highlighted.iter().position(|h| h == id) {
                let removed = self.highlighted.remove(index);
                self.hub.emit(LayoutEvent::Unhighlighted {
                    operator_id: removed,
                });
            }
        }
    }

    #[must_use]
    pub fn current_highlighted_operator_ids(&self) -> &[String] {
        &self.highlighted
    }

    pub fn set_multi_select_mode(&mut self, enabled: bool) {
        self.multi_select = enabled;
    }

    #[must_use]
    pub fn multi_select_mode(&self) -> bool {
        self.multi_select
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Sets the zoom ratio, clamped to [`ZOOM_MINIMUM`, `ZOOM_MAXIMUM`].
    pub fn set_zoom_ratio(&mut self, ratio: f64) {
        self.zoom_ratio = ratio.clamp(ZOOM_MINIMUM, ZOOM_MAXIMUM);
    }

    #[must_use]
    pub fn get_zoom_ratio(&self) -> f64 {
        self.zoom_ratio
    }

    pub fn set_pan_offset(&mut self, offset: Point) {
        self.pan_offset = offset;
    }

    #[must_use]
    pub fn get_pan_offset(&self) -> Point {
        self.pan_offset
    }

    pub fn restore_default_zoom_and_offset(&mut self) {
        self.zoom_ratio = 1.0;
        self.pan_offset = Point::default();
    }
}
