//! Relationship attributes
//!
//! Attributes are white-listed metadata on a relationship, so that one
//! relationship table can stand in for join tables carrying extra
//! information. They are stored as rows owned by their relationship and
//! exposed on it as a name → value map.

use crate::RelationshipId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stored attribute row
///
/// Identified by its relationship and name; only ever created or removed
/// through the owning relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipAttr {
    /// Owning relationship (unset until the relationship is stored)
    pub relationship_id: Option<RelationshipId>,

    /// Attribute name, unique within the relationship
    pub attr_name: String,

    /// Attribute value
    pub attr_value: String,
}

impl RelationshipAttr {
    /// Create an attribute row
    pub fn new(
        relationship_id: Option<RelationshipId>,
        attr_name: impl Into<String>,
        attr_value: impl Into<String>,
    ) -> Self {
        Self {
            relationship_id,
            attr_name: attr_name.into(),
            attr_value: attr_value.into(),
        }
    }
}

/// Ordered attribute map of a relationship (sorted by name)
///
/// This type does no validation of its own; [`Relationship::set_attr`]
/// is the gate.
///
/// [`Relationship::set_attr`]: crate::Relationship::set_attr
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrMap(BTreeMap<String, String>);

impl AttrMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an attribute value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether the attribute is present
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Insert or replace, returning the previous value
    pub(crate) fn insert(&mut self, name: String, value: String) -> Option<String> {
        self.0.insert(name, value)
    }

    /// Remove an attribute, returning its value
    pub(crate) fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no attributes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, value)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Rebuild a map from stored rows
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = RelationshipAttr>,
    {
        Self(
            rows.into_iter()
                .map(|row| (row.attr_name, row.attr_value))
                .collect(),
        )
    }

    /// Rows for storage under `relationship_id`
    pub fn to_rows(&self, relationship_id: Option<RelationshipId>) -> Vec<RelationshipAttr> {
        self.iter()
            .map(|(name, value)| RelationshipAttr::new(relationship_id, name, value))
            .collect()
    }
}
