//! Relationship error types

use crate::EntityRef;
use thiserror::Error;

/// Errors raised by relationship writes and endpoint resolution
///
/// These propagate to the immediate caller. Callers running an import
/// attach their own row/line context; the attribute name and value are
/// carried here so nothing needs re-deriving.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelationshipError {
    /// An edge between the same typed endpoints, in the same direction, already exists
    #[error("Relationship already exists: {from} -> {to}")]
    DuplicateEdge {
        /// Source endpoint
        from: EntityRef,
        /// Destination endpoint
        to: EntityRef,
    },

    /// No validator for either endpoint authorised the attribute
    #[error("Invalid attribute {name}: {value}")]
    InvalidAttribute {
        /// Attribute name
        name: String,
        /// Rejected value
        value: String,
    },

    /// The type tag has no registered accessor
    #[error("No accessor registered for type: {type_name}")]
    UnresolvedEndpoint {
        /// Type tag that failed to resolve
        type_name: String,
    },

    /// Source or destination has been cleared
    #[error("Relationship {0} is not set")]
    MissingEndpoint(&'static str),
}

impl RelationshipError {
    /// Build an `InvalidAttribute` error
    pub fn invalid_attribute(name: &str, value: &str) -> Self {
        Self::InvalidAttribute {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}
