//! Reversible mutation commands.
//!
//! Every change to the workflow travels as a [`Command`]: a closed enum of
//! mutations, each variant carrying the pre-state captured when the command
//! was built. `execute` applies the change, `undo` applies the exact
//! inverse, and `redo` re-applies it (identical to `execute` for all but
//! the drag-settled move, whose first execution is a no-op because the
//! gesture already placed the cells).
//!
//! The enum is also the dispatch whitelist for the collaboration channel:
//! each variant maps 1:1 onto an [`ActionName`](crate::collab::ActionName)
//! on the wire. Keeping dispatch as an exhaustive match rather than
//! name-based lookup means an unknown remote action cannot reach a handler.

use serde_json::Value;

use crate::collab::ActionName;
use crate::operator::{Breakpoint, OperatorLink, OperatorPredicate};
use crate::session::{ActionError, WorkflowSession};
use crate::types::Point;

/// An operator captured for restoration: the entity plus where it sat.
#[derive(Clone, Debug)]
pub struct SavedOperator {
    pub operator: OperatorPredicate,
    pub position: Point,
    pub layer: i64,
}

/// A link captured for restoration: the entity, its paint layer, and any
/// breakpoint that was attached to it.
#[derive(Clone, Debug)]
pub struct SavedLink {
    pub link: OperatorLink,
    pub layer: i64,
    pub breakpoint: Option<Breakpoint>,
}

/// One reversible unit of workflow mutation.
#[derive(Clone, Debug)]
pub enum Command {
    AddOperator {
        operator: OperatorPredicate,
        position: Point,
        /// Highlight set before the command, restored on undo.
        previously_highlighted: Vec<String>,
    },
    DeleteOperator {
        operator: SavedOperator,
        /// Incident links removed together with the operator.
        links: Vec<SavedLink>,
    },
    AddOperatorsAndLinks {
        operators: Vec<(OperatorPredicate, Point)>,
        links: Vec<OperatorLink>,
        breakpoints: Vec<(String, Breakpoint)>,
        previously_highlighted: Vec<String>,
    },
    DeleteOperatorsAndLinks {
        operators: Vec<SavedOperator>,
        links: Vec<SavedLink>,
        previously_highlighted: Vec<String>,
    },
    AddLink {
        link: OperatorLink,
    },
    DeleteLink {
        link: SavedLink,
    },
    SetOperatorProperty {
        operator_id: String,
        old_properties: Value,
        new_properties: Value,
    },
    SetOperatorAdvancedStatus {
        operator_id: String,
        show_advanced: bool,
    },
    SetLinkBreakpoint {
        link_id: String,
        old: Option<Breakpoint>,
        new: Option<Breakpoint>,
    },
    MoveOperators {
        operator_ids: Vec<String>,
        offset: Point,
        /// `false` for drag-settled moves: the gesture already placed the
        /// cells, so the first execution must not apply the offset again.
        /// Redo always applies it.
        apply_on_execute: bool,
    },
}

impl Command {
    /// Whether this command substantively edits the workflow.
    ///
    /// Cosmetic commands (position moves) stay undoable but are exempt
    /// from the global modification gate.
    #[must_use]
    pub fn modifies_workflow(&self) -> bool {
        !matches!(self, Command::MoveOperators { .. })
    }

    /// The wire name this command is broadcast under.
    #[must_use]
    pub fn action_name(&self) -> ActionName {
        match self {
            Command::AddOperator { .. } => ActionName::AddOperator,
            Command::DeleteOperator { .. } => ActionName::DeleteOperator,
            Command::AddOperatorsAndLinks { .. } => ActionName::AddOperatorsAndLinks,
            Command::DeleteOperatorsAndLinks { .. } => ActionName::DeleteOperatorsAndLinks,
            Command::AddLink { .. } => ActionName::AddLink,
            Command::DeleteLink { .. } => ActionName::DeleteLinkWithId,
            Command::SetOperatorProperty { .. } => ActionName::SetOperatorProperty,
            Command::SetOperatorAdvancedStatus { .. } => ActionName::SetOperatorAdvancedStatus,
            Command::SetLinkBreakpoint { .. } => ActionName::SetLinkBreakpoint,
            Command::MoveOperators { .. } => ActionName::MoveOperators,
        }
    }

    /// Applies the command to the session's stores.
    pub fn execute(&self, session: &mut WorkflowSession) -> Result<(), ActionError> {
        match self {
            Command::AddOperator {
                operator, position, ..
            } => {
                // A fresh single operator replaces the selection.
                session.layout_mut().set_multi_select_mode(false);
                session.add_operator_internal(operator.clone(), *position)?;
                session.layout_mut().highlight_operator(&operator.operator_id);
                session.pump_watchers();
                Ok(())
            }
            Command::DeleteOperator { operator, links } => {
                for saved in links {
                    session.delete_link_internal(&saved.link.link_id)?;
                }
                session.delete_operator_internal(&operator.operator.operator_id)?;
                Ok(())
            }
            Command::AddOperatorsAndLinks {
                operators,
                links,
                breakpoints,
                ..
            } => {
                let current: Vec<String> = session
                    .layout()
                    .current_highlighted_operator_ids()
                    .to_vec();
                session
                    .layout_mut()
                    .unhighlight_operators(current.iter().map(String::as_str));
                session
                    .layout_mut()
                    .set_multi_select_mode(operators.len() > 1);
                for (operator, position) in operators {
                    session.add_operator_internal(operator.clone(), *position)?;
                    session.layout_mut().highlight_operator(&operator.operator_id);
                }
                for link in links {
                    session.add_link_internal(link.clone())?;
                }
                for (link_id, breakpoint) in breakpoints {
                    session.set_link_breakpoint_internal(link_id, Some(breakpoint.clone()))?;
                }
                session.pump_watchers();
                Ok(())
            }
            Command::DeleteOperatorsAndLinks {
                operators, links, ..
            } => {
                for saved in links {
                    session.delete_link_internal(&saved.link.link_id)?;
                }
                for saved in operators {
                    session.delete_operator_internal(&saved.operator.operator_id)?;
                }
                Ok(())
            }
            Command::AddLink { link } => {
                session.add_link_internal(link.clone())?;
                session.pump_watchers();
                Ok(())
            }
            Command::DeleteLink { link } => {
                session.delete_link_internal(&link.link.link_id)?;
                Ok(())
            }
            Command::SetOperatorProperty {
                operator_id,
                new_properties,
                ..
            } => session.set_operator_property_internal(operator_id, new_properties.clone()),
            Command::SetOperatorAdvancedStatus {
                operator_id,
                show_advanced,
            } => session.set_operator_advanced_status_internal(operator_id, *show_advanced),
            Command::SetLinkBreakpoint { link_id, new, .. } => {
                session.set_link_breakpoint_internal(link_id, new.clone())?;
                session.pump_watchers();
                Ok(())
            }
            Command::MoveOperators {
                operator_ids,
                offset,
                apply_on_execute,
            } => {
                if *apply_on_execute {
                    session.move_operators_internal(operator_ids, *offset)?;
                }
                Ok(())
            }
        }
    }

    /// Applies the inverse of the command.
    pub fn undo(&self, session: &mut WorkflowSession) -> Result<(), ActionError> {
        match self {
            Command::AddOperator {
                operator,
                previously_highlighted,
                ..
            } => {
                session.delete_operator_internal(&operator.operator_id)?;
                session.restore_highlights(previously_highlighted);
                Ok(())
            }
            Command::DeleteOperator { operator, links } => {
                session.restore_operator_internal(operator)?;
                for saved in links {
                    session.restore_link_internal(saved)?;
                }
                session.layout_mut().set_multi_select_mode(false);
                session
                    .layout_mut()
                    .highlight_operator(&operator.operator.operator_id);
                session.pump_watchers();
                Ok(())
            }
            Command::AddOperatorsAndLinks {
                operators,
                links,
                previously_highlighted,
                ..
            } => {
                for link in links {
                    session.delete_link_internal(&link.link_id)?;
                }
                for (operator, _) in operators {
                    session.delete_operator_internal(&operator.operator_id)?;
                }
                session.restore_highlights(previously_highlighted);
                Ok(())
            }
            Command::DeleteOperatorsAndLinks {
                operators,
                links,
                previously_highlighted,
            } => {
                for saved in operators {
                    session.restore_operator_internal(saved)?;
                }
                for saved in links {
                    session.restore_link_internal(saved)?;
                }
                session.restore_highlights(previously_highlighted);
                session.pump_watchers();
                Ok(())
            }
            Command::AddLink { link } => {
                session.delete_link_internal(&link.link_id)?;
                Ok(())
            }
            Command::DeleteLink { link } => {
                session.restore_link_internal(link)?;
                session.pump_watchers();
                Ok(())
            }
            Command::SetOperatorProperty {
                operator_id,
                old_properties,
                ..
            } => session.set_operator_property_internal(operator_id, old_properties.clone()),
            Command::SetOperatorAdvancedStatus {
                operator_id,
                show_advanced,
            } => session.set_operator_advanced_status_internal(operator_id, !*show_advanced),
            Command::SetLinkBreakpoint { link_id, old, .. } => {
                session.set_link_breakpoint_internal(link_id, old.clone())?;
                session.pump_watchers();
                Ok(())
            }
            Command::MoveOperators {
                operator_ids,
                offset,
                ..
            } => session.move_operators_internal(operator_ids, -*offset),
        }
    }

    /// Re-applies the command after an undo. Identical to [`execute`]
    /// except for drag-settled moves, which always apply their offset.
    ///
    /// [`execute`]: Command::execute
    pub fn redo(&self, session: &mut WorkflowSession) -> Result<(), ActionError> {
        match self {
            Command::MoveOperators {
                operator_ids,
                offset,
                ..
            } => session.move_operators_internal(operator_ids, *offset),
            _ => self.execute(session),
        }
    }
}
