//! On-demand operator and workflow validation.
//!
//! An operator is valid when its property object passes the catalog's
//! validation and its ports are connected: every declared input port must
//! have exactly one incoming link, and the declared outputs must be
//! connected at least the declared number of times (an output may fan out
//! to several consumers).
//!
//! Validation never mutates anything; hosts call it after graph changes
//! and surface the per-operator message maps in the UI.

use rustc_hash::FxHashMap;

use crate::graph::{GraphError, WorkflowGraph};
use crate::schema::SchemaCatalog;

pub const VALIDATION_INPUT_MESSAGE: &str = "inputs";
pub const VALIDATION_OUTPUT_MESSAGE: &str = "outputs";
pub const VALIDATION_TYPE_MESSAGE: &str = "operatorType";

/// Outcome of validating one operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid {
        /// Keyword → human-readable message, one entry per failed check.
        messages: FxHashMap<String, String>,
    },
}

impl Validation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    #[must_use]
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        let mut messages = FxHashMap::default();
        messages.insert(key.into(), message.into());
        Validation::Invalid { messages }
    }

    /// Merges several verdicts; invalid wins and message maps are unioned.
    #[must_use]
    pub fn combine(verdicts: impl IntoIterator<Item = Validation>) -> Validation {
        let mut merged: FxHashMap<String, String> = FxHashMap::default();
        for verdict in verdicts {
            if let Validation::Invalid { messages } = verdict {
                merged.extend(messages);
            }
        }
        if merged.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid { messages: merged }
        }
    }
}

/// Validates a single operator's properties and connections.
pub fn validate_operator(
    graph: &WorkflowGraph,
    catalog: &dyn SchemaCatalog,
    operator_id: &str,
) -> Result<Validation, GraphError> {
    let operator = graph.get_operator(operator_id)?;

    let Some(schema) = catalog.schema(&operator.operator_type) else {
        return Ok(Validation::invalid(
            VALIDATION_TYPE_MESSAGE,
            format!("operator type {} is unknown", operator.operator_type),
        ));
    };

    let properties =
        catalog.validate_properties(&operator.operator_type, &operator.operator_properties);

    let actual_inputs = graph.get_input_links_by_operator_id(operator_id).len();
    let actual_outputs = graph.get_output_links_by_operator_id(operator_id).len();

    let mut connection_messages = FxHashMap::default();
    if actual_inputs != schema.input_ports {
        connection_messages.insert(
            VALIDATION_INPUT_MESSAGE.to_string(),
            format!(
                "requires {} inputs, has {} inputs",
                schema.input_ports, actual_inputs
            ),
        );
    }
    if actual_outputs < schema.output_ports {
        connection_messages.insert(
            VALIDATION_OUTPUT_MESSAGE.to_string(),
            format!(
                "requires {} outputs, has {} outputs",
                schema.output_ports, actual_outputs
            ),
        );
    }
    let connections = if connection_messages.is_empty() {
        Validation::Valid
    } else {
        Validation::Invalid {
            messages: connection_messages,
        }
    };

    Ok(Validation::combine([properties, connections]))
}

/// Validates every operator, returning only the failures.
#[must_use]
pub fn validate_workflow(
    graph: &WorkflowGraph,
    catalog: &dyn SchemaCatalog,
) -> FxHashMap<String, Validation> {
    let mut errors = FxHashMap::default();
    for operator in graph.get_all_operators() {
        // The operator is read straight off the graph, so lookup cannot fail.
        if let Ok(verdict) = validate_operator(graph, catalog, &operator.operator_id)
            && !verdict.is_valid()
        {
            errors.insert(operator.operator_id.clone(), verdict);
        }
    }
    errors
}
