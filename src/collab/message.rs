//! Wire message shape for collaborative editing.
//!
//! One message is sent per mutating command and per undo/redo invocation:
//!
//! ```json
//! {"action": "addOperator", "parameters": [ ... ], "type": "execute"}
//! ```
//!
//! `action` is drawn from the closed [`ActionName`] whitelist and
//! `parameters` is the exact positional-argument tuple of the session
//! method it names. For `undo`/`redo` messages the parameters are ignored
//! by the receiver; the action records which command the history
//! operation touched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed whitelist of remotely invokable mutations.
///
/// Deserialization of any name outside this enum fails, which is what
/// keeps a malicious or stale peer from reaching a non-whitelisted method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionName {
    #[serde(rename = "addOperator")]
    AddOperator,
    #[serde(rename = "deleteOperator")]
    DeleteOperator,
    #[serde(rename = "addOperatorsAndLinks")]
    AddOperatorsAndLinks,
    #[serde(rename = "deleteOperatorsAndLinks")]
    DeleteOperatorsAndLinks,
    #[serde(rename = "addLink")]
    AddLink,
    #[serde(rename = "deleteLinkWithId")]
    DeleteLinkWithId,
    #[serde(rename = "setOperatorProperty")]
    SetOperatorProperty,
    #[serde(rename = "setOperatorAdvancedStatus")]
    SetOperatorAdvancedStatus,
    #[serde(rename = "setLinkBreakpoint")]
    SetLinkBreakpoint,
    #[serde(rename = "moveOperators")]
    MoveOperators,
}

/// Whether the message replays a command or a history operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "execute")]
    Execute,
    #[serde(rename = "undo")]
    Undo,
    #[serde(rename = "redo")]
    Redo,
}

/// One collaboration message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub action: ActionName,
    /// Positional argument tuple of the named action, JSON-encoded.
    pub parameters: Value,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl CommandMessage {
    #[must_use]
    pub fn execute(action: ActionName, parameters: Value) -> Self {
        Self {
            action,
            parameters,
            kind: MessageKind::Execute,
        }
    }

    #[must_use]
    pub fn undo(action: ActionName) -> Self {
        Self {
            action,
            parameters: Value::Array(Vec::new()),
            kind: MessageKind::Undo,
        }
    }

    #[must_use]
    pub fn redo(action: ActionName) -> Self {
        Self {
            action,
            parameters: Value::Array(Vec::new()),
            kind: MessageKind::Redo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape_is_stable() {
        let message = CommandMessage::execute(ActionName::AddOperator, json!([{"x": 1}]));
        let encoded = serde_json::to_value(&message).unwrap();
        assert_eq!(
            encoded,
            json!({
                "action": "addOperator",
                "parameters": [{"x": 1}],
                "type": "execute",
            })
        );
    }

    #[test]
    fn unknown_action_is_rejected() {
        let raw = r#"{"action": "dropTables", "parameters": [], "type": "execute"}"#;
        assert!(serde_json::from_str::<CommandMessage>(raw).is_err());
    }

    #[test]
    fn round_trips_through_text() {
        let message = CommandMessage::undo(ActionName::DeleteOperator);
        let text = serde_json::to_string(&message).unwrap();
        let back: CommandMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(back, message);
    }
}
