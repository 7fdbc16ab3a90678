//! Collaborative editing: wire protocol, channel, and remote dispatch.
//!
//! Every locally originated command is serialized into a
//! [`CommandMessage`] and pushed onto the channel; every inbound message
//! is replayed through the session's normal command gateway with outbound
//! echo suppressed, so applying a remote command never re-broadcasts it.
//!
//! The channel offers no ordering guarantee beyond in-order delivery of
//! the underlying transport and no merge strategy for concurrent edits to
//! the same entity from two clients; peers stay consistent because they
//! apply the same command stream from the same state. Reconnection and
//! replay after a dropped transport are likewise out of scope here and
//! must be handled by the host.

mod message;

pub use message::{ActionName, CommandMessage, MessageKind};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::operator::{Breakpoint, OperatorLink, OperatorPredicate};
use crate::session::{ActionError, OperatorAndPosition, WorkflowSession};
use crate::types::Point;
use crate::undo_redo::ReentrancyGate;

/// Errors surfaced by the collaboration layer.
#[derive(Debug, Error)]
pub enum CollabError {
    /// The transport's other end is gone. Terminal: the engine does not
    /// reconnect or replay.
    #[error("collaboration channel is closed")]
    ChannelClosed,

    #[error("malformed collaboration message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Action(#[from] ActionError),
}

/// A persistent bidirectional message channel to collaborating peers.
///
/// The engine is transport-agnostic: the host bridges `outbound` and
/// `inbound` to its websocket (or anything else that delivers text frames
/// in order). [`CollabChannel::duplex`] wires two channels directly to
/// each other, which is how the tests and local demos run two sessions in
/// one process.
#[derive(Debug)]
pub struct CollabChannel {
    outbound: flume::Sender<String>,
    inbound: flume::Receiver<String>,
    send_gate: ReentrancyGate,
}

impl CollabChannel {
    pub fn new(outbound: flume::Sender<String>, inbound: flume::Receiver<String>) -> Self {
        Self {
            outbound,
            inbound,
            send_gate: ReentrancyGate::new(),
        }
    }

    /// Two channels cross-wired in memory: what one sends, the other
    /// receives.
    #[must_use]
    pub fn duplex() -> (CollabChannel, CollabChannel) {
        let (a_tx, a_rx) = flume::unbounded();
        let (b_tx, b_rx) = flume::unbounded();
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }

    /// Serializes and transmits one message.
    pub fn send(&self, message: &CommandMessage) -> Result<(), CollabError> {
        let text = serde_json::to_string(message)?;
        self.outbound
            .send(text)
            .map_err(|_| CollabError::ChannelClosed)
    }

    /// Drains all frames currently queued on the inbound side.
    pub fn drain_inbound(&self) -> Vec<Result<CommandMessage, CollabError>> {
        self.inbound
            .try_iter()
            .map(|text| serde_json::from_str(&text).map_err(CollabError::from))
            .collect()
    }

    /// The echo-suppression gate: suspended while a remote message is
    /// being applied so the resulting commands are not sent back.
    #[must_use]
    pub fn send_gate(&self) -> &ReentrancyGate {
        &self.send_gate
    }
}

/// Replays one inbound message through the session's command gateway.
///
/// Dispatch is an exhaustive match over the [`ActionName`] whitelist with
/// per-action typed parameter tuples; there is no string-keyed method
/// lookup anywhere on this path.
pub(crate) fn dispatch(
    session: &mut WorkflowSession,
    message: CommandMessage,
) -> Result<(), CollabError> {
    match message.kind {
        MessageKind::Undo => {
            session.undo()?;
            return Ok(());
        }
        MessageKind::Redo => {
            session.redo()?;
            return Ok(());
        }
        MessageKind::Execute => {}
    }

    let parameters = message.parameters;
    match message.action {
        ActionName::AddOperator => {
            let (operator, position): (OperatorPredicate, Point) =
                serde_json::from_value(parameters)?;
            session.add_operator(operator, position)?;
        }
        ActionName::DeleteOperator => {
            let (operator_id,): (String,) = serde_json::from_value(parameters)?;
            session.delete_operator(&operator_id)?;
        }
        ActionName::AddOperatorsAndLinks => {
            let (operators, links, breakpoints): (
                Vec<OperatorAndPosition>,
                Vec<OperatorLink>,
                FxHashMap<String, Breakpoint>,
            ) = serde_json::from_value(parameters)?;
            session.add_operators_and_links(operators, links, breakpoints)?;
        }
        ActionName::DeleteOperatorsAndLinks => {
            let (operator_ids, link_ids): (Vec<String>, Vec<String>) =
                serde_json::from_value(parameters)?;
            session.delete_operators_and_links(&operator_ids, &link_ids)?;
        }
        ActionName::AddLink => {
            let (link,): (OperatorLink,) = serde_json::from_value(parameters)?;
            session.add_link(link)?;
        }
        ActionName::DeleteLinkWithId => {
            let (link_id,): (String,) = serde_json::from_value(parameters)?;
            session.delete_link_with_id(&link_id)?;
        }
        ActionName::SetOperatorProperty => {
            let (operator_id, new_properties): (String, serde_json::Value) =
                serde_json::from_value(parameters)?;
            session.set_operator_property(&operator_id, new_properties)?;
        }
        ActionName::SetOperatorAdvancedStatus => {
            let (operator_id, show_advanced): (String, bool) =
                serde_json::from_value(parameters)?;
            session.set_operator_advanced_status(&operator_id, show_advanced)?;
        }
        ActionName::SetLinkBreakpoint => {
            let (link_id, breakpoint): (String, Option<Breakpoint>) =
                serde_json::from_value(parameters)?;
            session.set_link_breakpoint(&link_id, breakpoint)?;
        }
        ActionName::MoveOperators => {
            let (operator_ids, offset_x, offset_y): (Vec<String>, f64, f64) =
                serde_json::from_value(parameters)?;
            session.move_operators(&operator_ids, Point::new(offset_x, offset_y))?;
        }
    }
    Ok(())
}
