//! Logical workflow entities: operators, links, and breakpoints.
//!
//! An [`OperatorPredicate`] is one processing step in the logical plan; an
//! [`OperatorLink`] is a directed edge between an output port and an input
//! port; a [`Breakpoint`] is an opaque per-link debugging condition.
//!
//! All three are owned exclusively by the
//! [`WorkflowGraph`](crate::graph::WorkflowGraph). Other subsystems refer to
//! them by ID and must never hold their own mutable copies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::OperatorPort;

/// A node in the logical workflow graph representing one processing step.
///
/// The operator's behavior is determined by `operator_type`, a key into the
/// externally supplied [`SchemaCatalog`](crate::schema::SchemaCatalog), and
/// by `operator_properties`, an opaque JSON object validated against that
/// catalog outside this crate.
///
/// Operators are immutable once created, except through the
/// property-replace and advanced-status mutations on the graph store.
///
/// # Examples
///
/// ```
/// use flowboard::operator::OperatorPredicate;
///
/// let op = OperatorPredicate::new("op-1", "CsvScan")
///     .with_output_ports(["out0"])
///     .with_property("filePath", "data.csv");
/// assert_eq!(op.operator_type, "CsvScan");
/// assert_eq!(op.output_ports, vec!["out0".to_string()]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorPredicate {
    /// Unique identifier of this operator within one workflow.
    pub operator_id: String,
    /// Key into the schema catalog naming the operator's behavior.
    pub operator_type: String,
    /// Opaque property object, validated externally against the catalog.
    pub operator_properties: Value,
    /// Ordered list of named input ports.
    pub input_ports: Vec<String>,
    /// Ordered list of named output ports.
    pub output_ports: Vec<String>,
    /// Whether the advanced-options panel is expanded for this operator.
    #[serde(default)]
    pub show_advanced: bool,
}

impl OperatorPredicate {
    /// Creates an operator with no ports and an empty property object.
    pub fn new(operator_id: impl Into<String>, operator_type: impl Into<String>) -> Self {
        Self {
            operator_id: operator_id.into(),
            operator_type: operator_type.into(),
            operator_properties: Value::Object(serde_json::Map::new()),
            input_ports: Vec::new(),
            output_ports: Vec::new(),
            show_advanced: false,
        }
    }

    #[must_use]
    pub fn with_input_ports<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_ports = ports.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_output_ports<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_ports = ports.into_iter().map(Into::into).collect();
        self
    }

    /// Sets one property key, keeping the rest of the property object.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.operator_properties {
            map.insert(key.into(), value.into());
        }
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: Value) -> Self {
        self.operator_properties = properties;
        self
    }

    /// Port address helper for building links from this operator.
    #[must_use]
    pub fn output_port(&self, port_id: impl Into<String>) -> OperatorPort {
        OperatorPort::new(self.operator_id.clone(), port_id)
    }

    /// Port address helper for building links into this operator.
    #[must_use]
    pub fn input_port(&self, port_id: impl Into<String>) -> OperatorPort {
        OperatorPort::new(self.operator_id.clone(), port_id)
    }
}

/// A directed edge from an output port of one operator to an input port of
/// another.
///
/// Endpoints are immutable after creation. Moving an endpoint means
/// deleting the link and adding a new one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorLink {
    /// Unique identifier of this link within one workflow.
    pub link_id: String,
    pub source: OperatorPort,
    pub target: OperatorPort,
}

impl OperatorLink {
    pub fn new(link_id: impl Into<String>, source: OperatorPort, target: OperatorPort) -> Self {
        Self {
            link_id: link_id.into(),
            source,
            target,
        }
    }

    /// Returns `true` if either endpoint belongs to the given operator.
    #[must_use]
    pub fn touches_operator(&self, operator_id: &str) -> bool {
        self.source.operator_id == operator_id || self.target.operator_id == operator_id
    }
}

/// An opaque per-link debugging condition.
///
/// The engine never interprets the condition object; it only stores it,
/// round-trips it through serialization, and reports old/new values in
/// change events. Absence of a breakpoint is modeled as `Option::None`,
/// not as an empty condition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breakpoint(pub Value);

impl Breakpoint {
    pub fn new(condition: Value) -> Self {
        Self(condition)
    }
}

impl From<Value> for Breakpoint {
    fn from(condition: Value) -> Self {
        Self(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_accumulates_properties() {
        let op = OperatorPredicate::new("op-1", "KeywordSearch")
            .with_property("keyword", "rust")
            .with_property("caseSensitive", true);
        assert_eq!(
            op.operator_properties,
            json!({"keyword": "rust", "caseSensitive": true})
        );
    }

    #[test]
    fn link_touches_both_endpoints() {
        let link = OperatorLink::new(
            "link-1",
            OperatorPort::new("a", "out0"),
            OperatorPort::new("b", "in0"),
        );
        assert!(link.touches_operator("a"));
        assert!(link.touches_operator("b"));
        assert!(!link.touches_operator("c"));
    }

    #[test]
    fn operator_serializes_camel_case() {
        let op = OperatorPredicate::new("op-1", "CsvScan");
        let value = serde_json::to_value(&op).unwrap();
        assert!(value.get("operatorID").is_none());
        assert_eq!(value["operatorId"], "op-1");
        assert_eq!(value["operatorType"], "CsvScan");
        assert_eq!(value["showAdvanced"], false);
    }
}
