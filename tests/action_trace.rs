//! Action trace recording through the session.

mod common;

use common::*;
use flowboard::operator::Breakpoint;
use flowboard::trace::ActionTrace;
use flowboard::types::Point;
use serde_json::json;

#[test]
fn trace_is_off_by_default_and_skips_prior_history() {
    let mut session = session();
    session.add_operator(scan("early"), Point::default()).unwrap();
    assert!(session.action_trace().is_empty());

    session.start_action_trace();
    session
        .add_operator(view("late"), Point::new(10.0, 10.0))
        .unwrap();

    let history = session.action_trace();
    assert_eq!(history.len(), 1);
    assert!(matches!(
        &history[0].trace,
        ActionTrace::AddOperator { operator, position }
            if operator.operator_id == "late" && *position == Point::new(10.0, 10.0)
    ));
}

#[test]
fn each_record_snapshots_the_post_change_state() {
    let mut session = session();
    session.start_action_trace();

    session.add_operator(scan("a"), Point::default()).unwrap();
    session
        .add_operator(view("b"), Point::new(100.0, 0.0))
        .unwrap();
    session.add_link(link("l", "a", "b")).unwrap();

    let history = session.action_trace();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].current_state.operators.len(), 1);
    assert_eq!(history[1].current_state.operators.len(), 2);
    assert_eq!(history[2].current_state.links.len(), 1);

    match &history[2].trace {
        ActionTrace::AddLink {
            link,
            source_operator,
            target_operator,
        } => {
            assert_eq!(link.link_id, "l");
            assert_eq!(
                source_operator.as_ref().map(|op| op.operator_id.as_str()),
                Some("a")
            );
            assert_eq!(
                target_operator.as_ref().map(|op| op.operator_id.as_str()),
                Some("b")
            );
        }
        other => panic!("unexpected trace: {other:?}"),
    }
}

#[test]
fn cascade_delete_traces_links_before_the_operator() {
    let mut session = session();
    session.add_operator(scan("a"), Point::default()).unwrap();
    session
        .add_operator(view("b"), Point::new(100.0, 0.0))
        .unwrap();
    session.add_link(link("l", "a", "b")).unwrap();

    session.start_action_trace();
    session.delete_operator("a").unwrap();

    let history = session.action_trace();
    assert_eq!(history.len(), 2);
    match &history[0].trace {
        ActionTrace::DeleteLink {
            link,
            source_operator,
            ..
        } => {
            assert_eq!(link.link_id, "l");
            // The link's trace is recorded while both endpoints still
            // exist.
            assert!(source_operator.is_some());
        }
        other => panic!("unexpected trace: {other:?}"),
    }
    assert!(matches!(
        &history[1].trace,
        ActionTrace::DeleteOperator { operator } if operator.operator_id == "a"
    ));
}

#[test]
fn breakpoint_transitions_map_to_distinct_traces() {
    let mut session = session();
    session.add_operator(scan("a"), Point::default()).unwrap();
    session
        .add_operator(view("b"), Point::new(100.0, 0.0))
        .unwrap();
    session.add_link(link("l", "a", "b")).unwrap();
    session.start_action_trace();

    session
        .set_link_breakpoint("l", Some(Breakpoint::new(json!({"count": 1}))))
        .unwrap();
    session
        .set_link_breakpoint("l", Some(Breakpoint::new(json!({"count": 2}))))
        .unwrap();
    session.set_link_breakpoint("l", None).unwrap();

    let kinds: Vec<&ActionTrace> = session.action_trace().iter().map(|r| &r.trace).collect();
    assert!(matches!(kinds[0], ActionTrace::AddBreakpoint { .. }));
    assert!(matches!(kinds[1], ActionTrace::ChangeBreakpoint { .. }));
    assert!(matches!(kinds[2], ActionTrace::DeleteBreakpoint { .. }));
}

#[test]
fn stop_and_clear_control_recording() {
    let mut session = session();
    session.start_action_trace();
    session.add_operator(scan("a"), Point::default()).unwrap();
    assert_eq!(session.action_trace().len(), 1);

    session.stop_action_trace();
    session
        .add_operator(view("b"), Point::new(50.0, 0.0))
        .unwrap();
    assert_eq!(session.action_trace().len(), 1);

    session.clear_action_trace();
    assert!(session.action_trace().is_empty());
}

#[test]
fn property_changes_record_old_and_new() {
    let mut session = session();
    session
        .add_operator(search("s").with_property("keyword", "old"), Point::default())
        .unwrap();
    session.start_action_trace();

    session
        .set_operator_property("s", json!({"keyword": "new"}))
        .unwrap();
    session.undo().unwrap();

    let history = session.action_trace();
    assert_eq!(history.len(), 2);
    assert!(matches!(
        &history[0].trace,
        ActionTrace::ChangeOperatorProperty { old_properties, new_properties, .. }
            if old_properties == &json!({"keyword": "old"})
                && new_properties == &json!({"keyword": "new"})
    ));
    // The undo itself is a property change back to the old value.
    assert!(matches!(
        &history[1].trace,
        ActionTrace::ChangeOperatorProperty { new_properties, .. }
            if new_properties == &json!({"keyword": "old"})
    ));
}
