//! Precondition violations reported by the logical graph store.

use thiserror::Error;

use crate::types::OperatorPort;

/// Errors raised when a graph mutation would break a store invariant.
///
/// These are caller errors: the store rejects the mutation and commits no
/// partial state. The command gateway never swallows them.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    #[error("operator with ID {0} already exists in the workflow graph")]
    DuplicateOperator(String),

    #[error("operator with ID {0} does not exist in the workflow graph")]
    OperatorNotFound(String),

    #[error("link with ID {0} already exists in the workflow graph")]
    DuplicateLink(String),

    #[error("a link from {from} to {to} already exists")]
    DuplicateLinkEndpoints {
        from: OperatorPort,
        to: OperatorPort,
    },

    #[error("link with ID {0} does not exist in the workflow graph")]
    LinkNotFound(String),

    #[error("no link connects {from} to {to}")]
    LinkEndpointsNotFound {
        from: OperatorPort,
        to: OperatorPort,
    },

    #[error("link {link_id} is invalid: {reason}")]
    InvalidLink { link_id: String, reason: String },

    #[error("operator {operator_id} still has {link_count} incident link(s)")]
    OperatorHasLinks {
        operator_id: String,
        link_count: usize,
    },
}
