//! # Flowboard: workflow-canvas editing engine
//!
//! Flowboard is the model layer of a visual workflow editor: users
//! assemble a directed graph of operators and links on a canvas, and the
//! engine keeps the logical graph and its visual mirror in lockstep,
//! records every mutation as a reversible command, and replays commands
//! across collaborating clients.
//!
//! ## Core Concepts
//!
//! - **Operators and links**: the logical workflow graph, owned by
//!   [`graph::WorkflowGraph`]
//! - **Canvas cells**: positions, layers, visibility, highlight and
//!   viewport state, owned by [`layout::CanvasLayout`]
//! - **Commands**: every mutation is a [`command::Command`] with
//!   execute/undo/redo, recorded by [`undo_redo::UndoRedoManager`]
//! - **Session**: [`session::WorkflowSession`] ties one graph, one
//!   mirror, and one history together and is the sole mutation gateway
//! - **Collaboration**: commands serialize onto a [`collab`] channel and
//!   replay remotely with echo suppression
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use flowboard::operator::OperatorPredicate;
//! use flowboard::schema::{OperatorSchema, StaticCatalog};
//! use flowboard::session::WorkflowSession;
//! use flowboard::types::Point;
//!
//! let catalog = Arc::new(StaticCatalog::from_schemas([
//!     OperatorSchema::new("CsvScan", 0, 1),
//! ]));
//! let mut session = WorkflowSession::new(catalog);
//!
//! let operator = OperatorPredicate::new("op1", "CsvScan").with_output_ports(["out0"]);
//! session.add_operator(operator, Point::new(100.0, 100.0))?;
//! assert_eq!(session.graph().operator_count(), 1);
//!
//! session.undo()?;
//! assert_eq!(session.graph().operator_count(), 0);
//!
//! session.redo()?;
//! assert_eq!(session.graph().operator_count(), 1);
//! # Ok::<(), flowboard::session::ActionError>(())
//! ```
//!
//! ## Module Guide
//!
//! - [`types`] / [`operator`] - geometry and workflow entities
//! - [`graph`] - the logical graph store and its change events
//! - [`layout`] - the visual layout mirror
//! - [`sync`] - logical-to-visual entity synchronization
//! - [`command`] / [`undo_redo`] - reversible commands and history
//! - [`session`] - the mutation gateway tying a session together
//! - [`collab`] - the collaboration wire protocol and channel
//! - [`groups`] - collapsible operator groups
//! - [`schema`] / [`validation`] - the catalog collaborator and
//!   operator validation
//! - [`trace`] - action trace recording
//! - [`persistence`] - workflow snapshots and restore
//! - [`telemetry`] - tracing setup helpers

pub mod collab;
pub mod command;
pub mod event_hub;
pub mod graph;
pub mod groups;
pub mod layout;
pub mod operator;
pub mod persistence;
pub mod schema;
pub mod session;
pub mod sync;
pub mod telemetry;
pub mod trace;
pub mod types;
pub mod undo_redo;
pub mod utils;
pub mod validation;
