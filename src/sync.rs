//! One-directional synchronizer from the logical graph to the layout.
//!
//! [`LayoutSync`] subscribes to the graph store's event stream and keeps
//! the layout mirror's *entity set* aligned: an operator or link added to
//! the graph gets a canvas cell, a deleted one loses it. Positions are not
//! its concern; the command gateway places cells after the synchronizer
//! has created them.
//!
//! The propagation is strictly logical → visual. Visual-originated
//! structural gestures (a link drawn on the canvas, a delete button click)
//! must be turned into graph mutations by the session first; only then
//! does the synchronizer reflect them back into the mirror. This is what
//! keeps the two models from chasing each other in a feedback cycle.

use crate::graph::{GraphEvent, WorkflowGraph};
use crate::layout::CanvasLayout;

/// Drains graph events and mirrors entity existence into the layout.
#[derive(Debug)]
pub struct LayoutSync {
    events: flume::Receiver<GraphEvent>,
}

impl LayoutSync {
    /// Subscribes to the given graph. Only events emitted after this call
    /// are mirrored, so the synchronizer must be attached before the first
    /// mutation.
    pub fn attach(graph: &mut WorkflowGraph) -> Self {
        Self {
            events: graph.subscribe(),
        }
    }

    /// Applies all pending graph events to the layout.
    ///
    /// Called by the session after every store mutation, before any code
    /// that expects the mirror to know about the new entity set.
    pub fn pump(&mut self, layout: &mut CanvasLayout) {
        for event in self.events.try_iter() {
            match event {
                GraphEvent::OperatorAdded(operator) => {
                    if let Err(err) = layout.add_operator_cell(&operator.operator_id) {
                        tracing::warn!(%err, "layout sync: operator cell already mirrored");
                    }
                }
                GraphEvent::OperatorDeleted { operator } => {
                    if let Err(err) = layout.remove_cell(&operator.operator_id) {
                        tracing::warn!(%err, "layout sync: operator cell already gone");
                    }
                }
                GraphEvent::LinkAdded(link) => {
                    if let Err(err) = layout.add_link_cell(&link.link_id) {
                        tracing::warn!(%err, "layout sync: link cell already mirrored");
                    }
                }
                GraphEvent::LinkDeleted { link } => {
                    if let Err(err) = layout.remove_cell(&link.link_id) {
                        tracing::warn!(%err, "layout sync: link cell already gone");
                    }
                }
                // Content-only changes have no visual entity to manage.
                GraphEvent::OperatorPropertyChanged { .. }
                | GraphEvent::OperatorAdvancedStatusChanged { .. }
                | GraphEvent::BreakpointChanged { .. } => {}
            }
        }
    }
}
