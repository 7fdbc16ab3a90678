//! UUID-backed ID generation for workflow entities.
//!
//! IDs are plain strings with a kind prefix, so logs and wire messages
//! stay readable. Uniqueness comes from UUIDv4; the engine never parses
//! IDs back apart.

use uuid::Uuid;

/// A fresh operator ID: `operator-<uuid>`.
#[must_use]
pub fn fresh_operator_id() -> String {
    format!("operator-{}", Uuid::new_v4())
}

/// A fresh link ID: `link-<uuid>`.
#[must_use]
pub fn fresh_link_id() -> String {
    format!("link-{}", Uuid::new_v4())
}

/// A fresh group ID: `group-<uuid>`.
#[must_use]
pub fn fresh_group_id() -> String {
    format!("group-{}", Uuid::new_v4())
}
