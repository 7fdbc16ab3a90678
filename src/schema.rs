//! The schema catalog collaborator.
//!
//! The catalog is external to the engine: it supplies the set of valid
//! operator types and, per type, the declared port counts and an optional
//! property schema. The engine consults it in exactly two places: an
//! existence check before an operator is admitted into the graph, and
//! property validation, which is delegated to the catalog wholesale.
//!
//! [`StaticCatalog`] is the bundled in-memory implementation, sufficient
//! for tests and for hosts that load their catalog up front.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::Validation;

/// Declared shape of one operator type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorSchema {
    pub operator_type: String,
    pub user_friendly_name: String,
    /// Number of input ports an operator of this type must have connected.
    pub input_ports: usize,
    /// Number of output ports an operator of this type declares.
    pub output_ports: usize,
    /// JSON schema for `operator_properties`, if the catalog carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_schema: Option<Value>,
}

impl OperatorSchema {
    pub fn new(operator_type: impl Into<String>, input_ports: usize, output_ports: usize) -> Self {
        let operator_type = operator_type.into();
        Self {
            user_friendly_name: operator_type.clone(),
            operator_type,
            input_ports,
            output_ports,
            property_schema: None,
        }
    }

    #[must_use]
    pub fn with_property_schema(mut self, schema: Value) -> Self {
        self.property_schema = Some(schema);
        self
    }
}

/// Supplier of operator type metadata.
pub trait SchemaCatalog: Send + Sync {
    /// Whether `operator_type` names a known operator.
    fn operator_type_exists(&self, operator_type: &str) -> bool;

    /// The declared schema for `operator_type`, if known.
    fn schema(&self, operator_type: &str) -> Option<&OperatorSchema>;

    /// Validates a property object against the type's schema.
    ///
    /// Property validation is the catalog's responsibility, not the
    /// engine's; the default implementation accepts everything, which is
    /// correct for catalogs that validate elsewhere.
    fn validate_properties(&self, operator_type: &str, properties: &Value) -> Validation {
        let _ = (operator_type, properties);
        Validation::Valid
    }
}

/// In-memory catalog backed by a type → schema map.
///
/// # Examples
///
/// ```
/// use flowboard::schema::{OperatorSchema, SchemaCatalog, StaticCatalog};
///
/// let catalog = StaticCatalog::from_schemas([
///     OperatorSchema::new("CsvScan", 0, 1),
///     OperatorSchema::new("ViewResults", 1, 0),
/// ]);
/// assert!(catalog.operator_type_exists("CsvScan"));
/// assert!(!catalog.operator_type_exists("Nope"));
/// assert_eq!(catalog.schema("ViewResults").unwrap().input_ports, 1);
/// ```
#[derive(Debug, Default)]
pub struct StaticCatalog {
    schemas: FxHashMap<String, OperatorSchema>,
}

impl StaticCatalog {
    #[must_use]
    pub fn from_schemas(schemas: impl IntoIterator<Item = OperatorSchema>) -> Self {
        Self {
            schemas: schemas
                .into_iter()
                .map(|schema| (schema.operator_type.clone(), schema))
                .collect(),
        }
    }

    pub fn insert(&mut self, schema: OperatorSchema) {
        self.schemas.insert(schema.operator_type.clone(), schema);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl SchemaCatalog for StaticCatalog {
    fn operator_type_exists(&self, operator_type: &str) -> bool {
        self.schemas.contains_key(operator_type)
    }

    fn schema(&self, operator_type: &str) -> Option<&OperatorSchema> {
        self.schemas.get(operator_type)
    }
}
