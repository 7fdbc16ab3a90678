use serde_json::json;

use super::*;
use crate::operator::{Breakpoint, OperatorLink, OperatorPredicate};
use crate::types::OperatorPort;

fn scan(id: &str) -> OperatorPredicate {
    OperatorPredicate::new(id, "CsvScan").with_output_ports(["out0"])
}

fn sink(id: &str) -> OperatorPredicate {
    OperatorPredicate::new(id, "ViewResults").with_input_ports(["in0"])
}

fn link(id: &str, source: &str, target: &str) -> OperatorLink {
    OperatorLink::new(
        id,
        OperatorPort::new(source, "out0"),
        OperatorPort::new(target, "in0"),
    )
}

fn two_connected_operators() -> WorkflowGraph {
    let mut graph = WorkflowGraph::new(DeletePolicy::CascadeLinks);
    graph.add_operator(scan("op1")).unwrap();
    graph.add_operator(sink("op2")).unwrap();
    graph.add_link(link("link1", "op1", "op2")).unwrap();
    graph
}

#[test]
fn add_operator_rejects_duplicate_id() {
    let mut graph = WorkflowGraph::new(DeletePolicy::default());
    graph.add_operator(scan("op1")).unwrap();
    assert_eq!(
        graph.add_operator(scan("op1")),
        Err(GraphError::DuplicateOperator("op1".into()))
    );
    assert_eq!(graph.operator_count(), 1);
}

#[test]
fn delete_operator_fails_when_absent() {
    let mut graph = WorkflowGraph::new(DeletePolicy::default());
    assert_eq!(
        graph.delete_operator("ghost").unwrap_err(),
        GraphError::OperatorNotFound("ghost".into())
    );
}

#[test]
fn add_link_requires_existing_endpoints() {
    let mut graph = WorkflowGraph::new(DeletePolicy::default());
    graph.add_operator(scan("op1")).unwrap();
    let err = graph.add_link(link("l", "op1", "nope")).unwrap_err();
    assert!(matches!(err, GraphError::InvalidLink { .. }));
}

#[test]
fn add_link_rejects_duplicate_port_pair() {
    let mut graph = two_connected_operators();
    let err = graph.add_link(link("link2", "op1", "op2")).unwrap_err();
    assert!(matches!(err, GraphError::DuplicateLinkEndpoints { .. }));
    assert_eq!(graph.link_count(), 1);
}

#[test]
fn cascade_delete_removes_incident_links_and_emits_events() {
    let mut graph = two_connected_operators();
    let rx = graph.subscribe();

    graph.delete_operator("op1").unwrap();

    assert!(!graph.has_operator("op1"));
    assert!(graph.has_operator("op2"));
    assert!(!graph.has_link_with_id("link1"));

    let events: Vec<GraphEvent> = rx.try_iter().collect();
    assert!(matches!(&events[0], GraphEvent::LinkDeleted { link } if link.link_id == "link1"));
    assert!(matches!(
        &events[1],
        GraphEvent::OperatorDeleted { operator } if operator.operator_id == "op1"
    ));
}

#[test]
fn forbid_policy_refuses_delete_while_links_exist() {
    let mut graph = WorkflowGraph::new(DeletePolicy::ForbidWithLinks);
    graph.add_operator(scan("op1")).unwrap();
    graph.add_operator(sink("op2")).unwrap();
    graph.add_link(link("link1", "op1", "op2")).unwrap();

    assert_eq!(
        graph.delete_operator("op1").unwrap_err(),
        GraphError::OperatorHasLinks {
            operator_id: "op1".into(),
            link_count: 1,
        }
    );

    graph.delete_link_with_id("link1").unwrap();
    graph.delete_operator("op1").unwrap();
    assert!(!graph.has_operator("op1"));
}

#[test]
fn property_change_event_carries_old_and_new() {
    let mut graph = WorkflowGraph::new(DeletePolicy::default());
    graph
        .add_operator(scan("op1").with_property("limit", 10))
        .unwrap();
    let rx = graph.subscribe();

    graph
        .set_operator_property("op1", json!({"limit": 20}))
        .unwrap();

    let event = rx.try_iter().next().unwrap();
    match event {
        GraphEvent::OperatorPropertyChanged {
            operator_id,
            old_properties,
            new_properties,
        } => {
            assert_eq!(operator_id, "op1");
            assert_eq!(old_properties, json!({"limit": 10}));
            assert_eq!(new_properties, json!({"limit": 20}));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn breakpoint_lifecycle() {
    let mut graph = two_connected_operators();
    let rx = graph.subscribe();

    let bp = Breakpoint::new(json!({"count": 5}));
    graph.set_link_breakpoint("link1", Some(bp.clone())).unwrap();
    assert_eq!(graph.get_link_breakpoint("link1"), Some(&bp));

    graph.set_link_breakpoint("link1", None).unwrap();
    assert_eq!(graph.get_link_breakpoint("link1"), None);

    let events: Vec<GraphEvent> = rx.try_iter().collect();
    assert!(matches!(
        &events[0],
        GraphEvent::BreakpointChanged { old: None, new: Some(_), .. }
    ));
    assert!(matches!(
        &events[1],
        GraphEvent::BreakpointChanged { old: Some(_), new: None, .. }
    ));
}

#[test]
fn deleting_link_drops_its_breakpoint() {
    let mut graph = two_connected_operators();
    graph
        .set_link_breakpoint("link1", Some(Breakpoint::new(json!({"count": 1}))))
        .unwrap();

    graph.delete_link_with_id("link1").unwrap();
    assert!(graph.get_all_link_breakpoints().is_empty());

    // Setting a breakpoint on a missing link is an error.
    assert_eq!(
        graph
            .set_link_breakpoint("link1", Some(Breakpoint::new(json!({}))))
            .unwrap_err(),
        GraphError::LinkNotFound("link1".into())
    );
}

#[test]
fn directional_link_accessors() {
    let mut graph = two_connected_operators();
    graph.add_operator(sink("op3")).unwrap();
    graph
        .add_link(OperatorLink::new(
            "link2",
            OperatorPort::new("op1", "out0"),
            OperatorPort::new("op3", "in0"),
        ))
        .unwrap();

    assert_eq!(graph.get_output_links_by_operator_id("op1").len(), 2);
    assert_eq!(graph.get_input_links_by_operator_id("op2").len(), 1);
    assert_eq!(graph.get_input_links_by_operator_id("op1").len(), 0);

    let found = graph
        .get_link(
            &OperatorPort::new("op1", "out0"),
            &OperatorPort::new("op3", "in0"),
        )
        .unwrap();
    assert_eq!(found.link_id, "link2");
}
