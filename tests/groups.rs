//! Grouping through the session: collapse/expand, membership upkeep.

mod common;

use common::*;
use flowboard::groups::GroupError;
use flowboard::types::{Point, Size};

fn session_with_pair() -> (flowboard::session::WorkflowSession, String) {
    let mut session = session();
    session
        .add_operator(scan("op1"), Point::new(100.0, 100.0))
        .unwrap();
    session
        .add_operator(view("op2"), Point::new(300.0, 100.0))
        .unwrap();
    session.add_link(link("l1", "op1", "op2")).unwrap();
    let group_id = session
        .group_operators(&["op1".to_string(), "op2".to_string()])
        .unwrap()
        .expect("two ungrouped operators must form a group");
    (session, group_id)
}

#[test]
fn group_collapse_expand_round_trip() {
    let (mut session, group_id) = session_with_pair();

    session.collapse_group(&group_id).unwrap();
    assert!(!session.layout().is_cell_visible("op1").unwrap());
    assert!(!session.layout().is_cell_visible("op2").unwrap());
    assert!(!session.layout().is_cell_visible("l1").unwrap());
    assert_eq!(
        session.layout().get_element_size(&group_id).unwrap(),
        Some(Size::new(170.0, 30.0))
    );

    session.expand_group(&group_id).unwrap();
    assert!(session.layout().is_cell_visible("op1").unwrap());
    assert!(session.layout().is_cell_visible("l1").unwrap());
    assert_eq!(
        session.layout().get_element_position("op1").unwrap(),
        Point::new(100.0, 100.0)
    );
    assert_eq!(
        session.layout().get_element_position("op2").unwrap(),
        Point::new(300.0, 100.0)
    );
}

#[test]
fn gesture_grouping_is_lenient_but_membership_is_exclusive() {
    let (mut session, _group_id) = session_with_pair();
    session
        .add_operator(scan("op3"), Point::new(500.0, 100.0))
        .unwrap();

    // op1 is grouped already: the gesture is silently ignored.
    let result = session
        .group_operators(&["op1".to_string(), "op3".to_string()])
        .unwrap();
    assert!(result.is_none());
    assert_eq!(session.groups().group_count(), 1);
}

#[test]
fn internal_link_is_tracked_and_boundary_links_classified() {
    let (mut session, group_id) = session_with_pair();
    session
        .add_operator(search("outside"), Point::new(600.0, 100.0))
        .unwrap();
    // A second out-edge of op1 leaves the group.
    session.add_link(link("boundary", "op1", "outside")).unwrap();

    let group = session.groups().get_group(&group_id).unwrap();
    assert!(group.links.contains_key("l1"));
    assert!(group.out_links.contains_key("boundary"));

    session.delete_link_with_id("boundary").unwrap();
    let group = session.groups().get_group(&group_id).unwrap();
    assert!(!group.out_links.contains_key("boundary"));
}

#[test]
fn deleting_members_auto_ungroups_below_two() {
    let (mut session, group_id) = session_with_pair();

    session.delete_operator("op2").unwrap();
    assert!(session.groups().get_group(&group_id).is_err());
    assert!(!session.layout().has_cell(&group_id));
    assert!(session.graph().has_operator("op1"));
}

#[test]
fn ungroup_expands_first() {
    let (mut session, group_id) = session_with_pair();
    session.collapse_group(&group_id).unwrap();

    session.ungroup_operators(&group_id).unwrap();
    assert!(session.layout().is_cell_visible("op1").unwrap());
    assert!(session.layout().is_cell_visible("op2").unwrap());
    assert!(!session.layout().has_cell(&group_id));
    assert_eq!(session.groups().group_count(), 0);
}

#[test]
fn collapse_errors_are_typed() {
    let (mut session, group_id) = session_with_pair();
    session.collapse_group(&group_id).unwrap();
    assert!(matches!(
        session.collapse_group(&group_id),
        Err(GroupError::AlreadyCollapsed(_))
    ));
    session.expand_group(&group_id).unwrap();
    assert!(matches!(
        session.expand_group(&group_id),
        Err(GroupError::AlreadyExpanded(_))
    ));
    assert!(matches!(
        session.collapse_group("nope"),
        Err(GroupError::GroupNotFound(_))
    ));
}

#[test]
fn member_move_tracks_group_frame() {
    let (mut session, group_id) = session_with_pair();
    let before = session.layout().get_element_size(&group_id).unwrap().unwrap();

    // Stretch the group by moving one member away.
    session
        .move_operators(&["op2".to_string()], Point::new(200.0, 0.0))
        .unwrap();
    let after = session.layout().get_element_size(&group_id).unwrap().unwrap();
    assert_eq!(after.width, before.width + 200.0);

    let stored = session
        .groups()
        .get_group(&group_id)
        .unwrap()
        .operators
        .get("op2")
        .unwrap()
        .position;
    assert_eq!(stored, Point::new(500.0, 100.0));
}

#[test]
fn dragging_collapsed_group_carries_hidden_members() {
    let (mut session, group_id) = session_with_pair();
    session.collapse_group(&group_id).unwrap();

    let from = session.layout().get_element_position(&group_id).unwrap();
    session
        .on_element_dragged(&group_id, from + Point::new(60.0, 40.0))
        .unwrap();
    session.settle_drag().unwrap();

    session.expand_group(&group_id).unwrap();
    assert_eq!(
        session.layout().get_element_position("op1").unwrap(),
        Point::new(160.0, 140.0)
    );
    assert_eq!(
        session.layout().get_element_position("op2").unwrap(),
        Point::new(360.0, 140.0)
    );
}
