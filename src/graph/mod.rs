//! The logical graph store: the canonical model of a workflow.
//!
//! [`WorkflowGraph`] owns every operator, link, and breakpoint in a
//! session. It validates invariants on mutation, emits a
//! [`GraphEvent`] for every change, and exposes read accessors for the
//! rest of the engine. It knows nothing about positions, layers, or any
//! other visual concern; those live in [`crate::layout`].
//!
//! All mutations arrive through the session's command gateway. The store
//! itself enforces only local invariants:
//!
//! - operator and link IDs are unique
//! - link endpoints exist at link-creation time
//! - at most one link per ordered (source port, target port) pair
//! - breakpoints attach only to existing links
//!
//! Operator deletion follows the configured [`DeletePolicy`]: by default
//! incident links are cascade-deleted, each emitting its own delete event
//! before the operator's.

mod errors;
mod events;

pub use errors::GraphError;
pub use events::GraphEvent;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::event_hub::EventHub;
use crate::operator::{Breakpoint, OperatorLink, OperatorPredicate};
use crate::types::OperatorPort;

/// What `delete_operator` does when links still reference the operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Delete incident links automatically, emitting a delete event for
    /// each, then delete the operator.
    #[default]
    CascadeLinks,
    /// Refuse with [`GraphError::OperatorHasLinks`] while any incident
    /// link exists; callers must remove links first.
    ForbidWithLinks,
}

/// The canonical logical workflow graph.
///
/// # Examples
///
/// ```
/// use flowboard::graph::WorkflowGraph;
/// use flowboard::operator::{OperatorLink, OperatorPredicate};
/// use flowboard::types::OperatorPort;
///
/// let mut graph = WorkflowGraph::new(Default::default());
/// graph.add_operator(OperatorPredicate::new("a", "Scan").with_output_ports(["out0"]))?;
/// graph.add_operator(OperatorPredicate::new("b", "Sink").with_input_ports(["in0"]))?;
/// graph.add_link(OperatorLink::new(
///     "l1",
///     OperatorPort::new("a", "out0"),
///     OperatorPort::new("b", "in0"),
/// ))?;
/// assert_eq!(graph.get_all_links().len(), 1);
///
/// // Cascade policy: deleting `a` also removes the link.
/// graph.delete_operator("a")?;
/// assert!(graph.get_all_links().is_empty());
/// # Ok::<(), flowboard::graph::GraphError>(())
/// ```
#[derive(Debug)]
pub struct WorkflowGraph {
    operators: FxHashMap<String, OperatorPredicate>,
    links: FxHashMap<String, OperatorLink>,
    breakpoints: FxHashMap<String, Breakpoint>,
    delete_policy: DeletePolicy,
    hub: EventHub<GraphEvent>,
}

impl WorkflowGraph {
    #[must_use]
    pub fn new(delete_policy: DeletePolicy) -> Self {
        Self {
            operators: FxHashMap::default(),
            links: FxHashMap::default(),
            breakpoints: FxHashMap::default(),
            delete_policy,
            hub: EventHub::new(),
        }
    }

    /// Subscribes to the store's change stream (future events only).
    pub fn subscribe(&mut self) -> flume::Receiver<GraphEvent> {
        self.hub.subscribe()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Adds an operator to the graph.
    pub fn add_operator(&mut self, operator: OperatorPredicate) -> Result<(), GraphError> {
        self.assert_operator_not_exists(&operator.operator_id)?;
        self.operators
            .insert(operator.operator_id.clone(), operator.clone());
        self.hub.emit(GraphEvent::OperatorAdded(operator));
        Ok(())
    }

    /// Deletes an operator, applying the configured [`DeletePolicy`] to
    /// any incident links. Returns the deleted operator.
    pub fn delete_operator(&mut self, operator_id: &str) -> Result<OperatorPredicate, GraphError> {
        self.assert_operator_exists(operator_id)?;
        let incident: Vec<String> = self
            .links
            .values()
            .filter(|link| link.touches_operator(operator_id))
            .map(|link| link.link_id.clone())
            .collect();

        match self.delete_policy {
            DeletePolicy::ForbidWithLinks if !incident.is_empty() => {
                return Err(GraphError::OperatorHasLinks {
                    operator_id: operator_id.to_string(),
                    link_count: incident.len(),
                });
            }
            DeletePolicy::ForbidWithLinks => {}
            DeletePolicy::CascadeLinks => {
                for link_id in incident {
                    // Already checked to exist; the cascade delete emits
                    // the same events a direct delete would.
                    self.delete_link_with_id(&link_id)?;
                }
            }
        }

        let operator = self
            .operators
            .remove(operator_id)
            .ok_or_else(|| GraphError::OperatorNotFound(operator_id.to_string()))?;
        self.hub.emit(GraphEvent::OperatorDeleted {
            operator: operator.clone(),
        });
        Ok(operator)
    }

    /// Adds a link between two existing operators.
    pub fn add_link(&mut self, link: OperatorLink) -> Result<(), GraphError> {
        self.assert_link_not_exists(&link)?;
        self.assert_link_is_valid(&link)?;
        self.links.insert(link.link_id.clone(), link.clone());
        self.hub.emit(GraphEvent::LinkAdded(link));
        Ok(())
    }

    /// Deletes a link by ID, removing its breakpoint with it. Returns the
    /// deleted link.
    pub fn delete_link_with_id(&mut self, link_id: &str) -> Result<OperatorLink, GraphError> {
        let link = self
            .links
            .remove(link_id)
            .ok_or_else(|| GraphError::LinkNotFound(link_id.to_string()))?;
        if let Some(old) = self.breakpoints.remove(link_id) {
            self.hub.emit(GraphEvent::BreakpointChanged {
                link_id: link_id.to_string(),
                old: Some(old),
                new: None,
            });
        }
        self.hub.emit(GraphEvent::LinkDeleted { link: link.clone() });
        Ok(link)
    }

    /// Replaces an operator's property object wholesale.
    pub fn set_operator_property(
        &mut self,
        operator_id: &str,
        new_properties: Value,
    ) -> Result<(), GraphError> {
        let operator = self
            .operators
            .get_mut(operator_id)
            .ok_or_else(|| GraphError::OperatorNotFound(operator_id.to_string()))?;
        let old_properties =
            std::mem::replace(&mut operator.operator_properties, new_properties.clone());
        self.hub.emit(GraphEvent::OperatorPropertyChanged {
            operator_id: operator_id.to_string(),
            old_properties,
            new_properties,
        });
        Ok(())
    }

    /// Flips the advanced-options flag on an operator.
    pub fn set_operator_advanced_status(
        &mut self,
        operator_id: &str,
        show_advanced: bool,
    ) -> Result<(), GraphError> {
        let operator = self
            .operators
            .get_mut(operator_id)
            .ok_or_else(|| GraphError::OperatorNotFound(operator_id.to_string()))?;
        operator.show_advanced = show_advanced;
        self.hub.emit(GraphEvent::OperatorAdvancedStatusChanged {
            operator_id: operator_id.to_string(),
            show_advanced,
        });
        Ok(())
    }

    /// Sets or clears the breakpoint attached to a link.
    pub fn set_link_breakpoint(
        &mut self,
        link_id: &str,
        breakpoint: Option<Breakpoint>,
    ) -> Result<(), GraphError> {
        self.assert_link_with_id_exists(link_id)?;
        let old = match &breakpoint {
            Some(bp) => self.breakpoints.insert(link_id.to_string(), bp.clone()),
            None => self.breakpoints.remove(link_id),
        };
        self.hub.emit(GraphEvent::BreakpointChanged {
            link_id: link_id.to_string(),
            old,
            new: breakpoint,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn get_operator(&self, operator_id: &str) -> Result<&OperatorPredicate, GraphError> {
        self.operators
            .get(operator_id)
            .ok_or_else(|| GraphError::OperatorNotFound(operator_id.to_string()))
    }

    #[must_use]
    pub fn has_operator(&self, operator_id: &str) -> bool {
        self.operators.contains_key(operator_id)
    }

    #[must_use]
    pub fn get_all_operators(&self) -> Vec<&OperatorPredicate> {
        self.operators.values().collect()
    }

    #[must_use]
    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    pub fn get_link_with_id(&self, link_id: &str) -> Result<&OperatorLink, GraphError> {
        self.links
            .get(link_id)
            .ok_or_else(|| GraphError::LinkNotFound(link_id.to_string()))
    }

    #[must_use]
    pub fn has_link_with_id(&self, link_id: &str) -> bool {
        self.links.contains_key(link_id)
    }

    pub fn get_link(
        &self,
        source: &OperatorPort,
        target: &OperatorPort,
    ) -> Result<&OperatorLink, GraphError> {
        self.links
            .values()
            .find(|link| &link.source == source && &link.target == target)
            .ok_or_else(|| GraphError::LinkEndpointsNotFound {
                from: source.clone(),
                to: target.clone(),
            })
    }

    #[must_use]
    pub fn has_link(&self, source: &OperatorPort, target: &OperatorPort) -> bool {
        self.get_link(source, target).is_ok()
    }

    #[must_use]
    pub fn get_all_links(&self) -> Vec<&OperatorLink> {
        self.links.values().collect()
    }

    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Links whose target is the given operator.
    #[must_use]
    pub fn get_input_links_by_operator_id(&self, operator_id: &str) -> Vec<&OperatorLink> {
        self.links
            .values()
            .filter(|link| link.target.operator_id == operator_id)
            .collect()
    }

    /// Links whose source is the given operator.
    #[must_use]
    pub fn get_output_links_by_operator_id(&self, operator_id: &str) -> Vec<&OperatorLink> {
        self.links
            .values()
            .filter(|link| link.source.operator_id == operator_id)
            .collect()
    }

    #[must_use]
    pub fn get_link_breakpoint(&self, link_id: &str) -> Option<&Breakpoint> {
        self.breakpoints.get(link_id)
    }

    #[must_use]
    pub fn get_all_link_breakpoints(&self) -> &FxHashMap<String, Breakpoint> {
        &self.breakpoints
    }

    // ------------------------------------------------------------------
    // Invariant assertions
    // ------------------------------------------------------------------

    pub fn assert_operator_exists(&self, operator_id: &str) -> Result<(), GraphError> {
        if !self.has_operator(operator_id) {
            return Err(GraphError::OperatorNotFound(operator_id.to_string()));
        }
        Ok(())
    }

    pub fn assert_operator_not_exists(&self, operator_id: &str) -> Result<(), GraphError> {
        if self.has_operator(operator_id) {
            return Err(GraphError::DuplicateOperator(operator_id.to_string()));
        }
        Ok(())
    }

    pub fn assert_link_with_id_exists(&self, link_id: &str) -> Result<(), GraphError> {
        if !self.has_link_with_id(link_id) {
            return Err(GraphError::LinkNotFound(link_id.to_string()));
        }
        Ok(())
    }

    pub fn assert_link_not_exists(&self, link: &OperatorLink) -> Result<(), GraphError> {
        if self.has_link_with_id(&link.link_id) {
            return Err(GraphError::DuplicateLink(link.link_id.clone()));
        }
        if self.has_link(&link.source, &link.target) {
            return Err(GraphError::DuplicateLinkEndpoints {
                from: link.source.clone(),
                to: link.target.clone(),
            });
        }
        Ok(())
    }

    /// A link is valid when both endpoint operators exist.
    pub fn assert_link_is_valid(&self, link: &OperatorLink) -> Result<(), GraphError> {
        for port in [&link.source, &link.target] {
            if !self.has_operator(&port.operator_id) {
                return Err(GraphError::InvalidLink {
                    link_id: link.link_id.clone(),
                    reason: format!("endpoint operator {} does not exist", port.operator_id),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
