//! Shared fixtures for the integration suite.

// Each test binary uses its own slice of these helpers.
#![allow(dead_code)]

use std::sync::Arc;

use flowboard::layout::CanvasLayout;
use flowboard::operator::{OperatorLink, OperatorPredicate};
use flowboard::persistence::WorkflowInfo;
use flowboard::schema::{OperatorSchema, StaticCatalog};
use flowboard::session::WorkflowSession;
use flowboard::types::OperatorPort;

/// The catalog every integration test runs against.
pub fn catalog() -> Arc<StaticCatalog> {
    Arc::new(StaticCatalog::from_schemas([
        OperatorSchema::new("CsvScan", 0, 1),
        OperatorSchema::new("KeywordSearch", 1, 1),
        OperatorSchema::new("ViewResults", 1, 0),
    ]))
}

pub fn session() -> WorkflowSession {
    flowboard::telemetry::init_with_filter("warn");
    WorkflowSession::new(catalog())
}

pub fn scan(id: &str) -> OperatorPredicate {
    OperatorPredicate::new(id, "CsvScan").with_output_ports(["out0"])
}

pub fn search(id: &str) -> OperatorPredicate {
    OperatorPredicate::new(id, "KeywordSearch")
        .with_input_ports(["in0"])
        .with_output_ports(["out0"])
}

pub fn view(id: &str) -> OperatorPredicate {
    OperatorPredicate::new(id, "ViewResults").with_input_ports(["in0"])
}

pub fn link(id: &str, source: &str, target: &str) -> OperatorLink {
    OperatorLink::new(
        id,
        OperatorPort::new(source, "out0"),
        OperatorPort::new(target, "in0"),
    )
}

/// Everything the undo/redo laws quantify over: logical state, positions,
/// breakpoints, groups (via the snapshot), the highlight set, and the
/// layers of all named cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservableState {
    pub snapshot: WorkflowInfo,
    pub highlighted: Vec<String>,
    pub layers: Vec<(String, i64)>,
}

/// Snapshot with group layer fields zeroed.
///
/// Re-adding a group during restore re-layers its cells to the front
/// (exactly as interactive grouping does), so restored snapshots match
/// their source except for the saved layer numbers inside groups.
pub fn normalize_group_layers(info: &WorkflowInfo) -> WorkflowInfo {
    let mut info = info.clone();
    for group in &mut info.groups {
        for member in group.operators.values_mut() {
            member.layer = 0;
        }
        for link in group.links.values_mut() {
            link.layer = 0;
        }
    }
    info
}

pub fn observable_state(session: &WorkflowSession) -> ObservableState {
    let snapshot = session.snapshot();
    let layout: &CanvasLayout = session.layout();
    let mut layers: Vec<(String, i64)> = snapshot
        .operators
        .iter()
        .map(|op| op.operator_id.clone())
        .chain(snapshot.links.iter().map(|l| l.link_id.clone()))
        .filter_map(|id| layout.get_cell_layer(&id).ok().map(|layer| (id, layer)))
        .collect();
    layers.sort();
    ObservableState {
        snapshot,
        highlighted: layout.current_highlighted_operator_ids().to_vec(),
        layers,
    }
}
