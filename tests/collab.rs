//! Two sessions wired over an in-memory duplex channel.

mod common;

use common::*;
use flowboard::collab::{ActionName, CollabChannel, CommandMessage, MessageKind};
use flowboard::session::WorkflowSession;
use flowboard::types::Point;
use serde_json::json;

fn collaborating_pair() -> (WorkflowSession, WorkflowSession) {
    let (a, b) = CollabChannel::duplex();
    let mut left = session();
    let mut right = session();
    left.connect_collaboration(a);
    right.connect_collaboration(b);
    (left, right)
}

#[test]
fn local_commands_replay_on_the_peer() {
    let (mut left, mut right) = collaborating_pair();

    left.add_operator(scan("op1"), Point::new(10.0, 20.0)).unwrap();
    left.add_operator(view("op2"), Point::new(200.0, 20.0)).unwrap();
    left.add_link(link("l1", "op1", "op2")).unwrap();

    assert_eq!(right.poll_remote().unwrap(), 3);
    assert!(right.graph().has_operator("op1"));
    assert!(right.graph().has_link_with_id("l1"));
    assert_eq!(
        right.layout().get_element_position("op1").unwrap(),
        Point::new(10.0, 20.0)
    );
}

#[test]
fn applying_remote_commands_does_not_echo() {
    let (mut left, mut right) = collaborating_pair();

    left.add_operator(scan("op1"), Point::new(5.0, 5.0)).unwrap();
    assert_eq!(right.poll_remote().unwrap(), 1);
    assert!(right.graph().has_operator("op1"));

    // If the peer had re-broadcast, this would apply a duplicate add and
    // fail; instead there is nothing queued.
    assert_eq!(left.poll_remote().unwrap(), 0);
}

#[test]
fn remote_execute_message_applies_with_suppressed_echo() {
    let (outside_tx, inbound_rx) = flume::unbounded();
    let (outbound_tx, outside_rx) = flume::unbounded();
    let mut session = session();
    session.connect_collaboration(CollabChannel::new(outbound_tx, inbound_rx));

    let message = CommandMessage {
        action: ActionName::AddOperator,
        parameters: json!([
            {
                "operatorId": "opX",
                "operatorType": "CsvScan",
                "operatorProperties": {},
                "inputPorts": [],
                "outputPorts": ["out0"],
                "showAdvanced": false,
            },
            {"x": 5.0, "y": 5.0},
        ]),
        kind: MessageKind::Execute,
    };
    outside_tx
        .send(serde_json::to_string(&message).unwrap())
        .unwrap();

    assert_eq!(session.poll_remote().unwrap(), 1);
    assert!(session.graph().has_operator("opX"));
    assert_eq!(
        session.layout().get_element_position("opX").unwrap(),
        Point::new(5.0, 5.0)
    );
    // Echo suppression: applying the remote command produced no outbound
    // message.
    assert!(outside_rx.try_recv().is_err());
}

#[test]
fn undo_propagates_as_history_message() {
    let (mut left, mut right) = collaborating_pair();

    left.add_operator(scan("op1"), Point::default()).unwrap();
    right.poll_remote().unwrap();
    assert!(right.graph().has_operator("op1"));

    left.undo().unwrap();
    assert!(!left.graph().has_operator("op1"));

    right.poll_remote().unwrap();
    assert!(!right.graph().has_operator("op1"));

    left.redo().unwrap();
    right.poll_remote().unwrap();
    assert!(right.graph().has_operator("op1"));
}

#[test]
fn sessions_converge_over_a_mixed_exchange() {
    let (mut left, mut right) = collaborating_pair();

    left.add_operator(scan("a"), Point::new(0.0, 0.0)).unwrap();
    right.poll_remote().unwrap();

    right
        .add_operator(view("b"), Point::new(300.0, 0.0))
        .unwrap();
    left.poll_remote().unwrap();

    left.add_link(link("ab", "a", "b")).unwrap();
    right.poll_remote().unwrap();

    right
        .set_operator_property("a", json!({"filePath": "data.csv"}))
        .unwrap();
    left.poll_remote().unwrap();

    left.move_operators(&["a".to_string()], Point::new(25.0, 25.0))
        .unwrap();
    right.poll_remote().unwrap();

    assert_eq!(
        observable_state(&left).snapshot,
        observable_state(&right).snapshot
    );
}

#[test]
fn malformed_frames_surface_as_errors() {
    let (outside_tx, inbound_rx) = flume::unbounded();
    let (outbound_tx, _outside_rx) = flume::unbounded();
    let mut session = session();
    session.connect_collaboration(CollabChannel::new(outbound_tx, inbound_rx));

    outside_tx.send("not json".to_string()).unwrap();
    assert!(session.poll_remote().is_err());
}

#[test]
fn disconnected_session_neither_sends_nor_fails() {
    let mut session = session();
    session.add_operator(scan("solo"), Point::default()).unwrap();
    assert_eq!(session.poll_remote().unwrap(), 0);
    assert!(!session.collaboration_active());
}
