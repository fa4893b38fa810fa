//! Relationship module - the polymorphic edge between two typed entities
//!
//! A relationship stores each endpoint as a type tag plus id rather than a
//! typed reference, so a single edge set covers every pair of registered
//! types. The live objects are resolved on demand through the
//! [`EntitySchema`] accessors.

use crate::traits::RelationshipStore;
use crate::{
    AttrMap, AttrValidatorRegistry, Entity, EntityRef, EntitySchema, RelationshipAttr,
    RelationshipError, RelationshipType,
};
use crate::schema::{destination_accessor_name, source_accessor_name};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Store-assigned identifier of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(i64);

impl RelationshipId {
    /// Wrap a raw id (storage layer use)
    pub fn from_value(value: i64) -> Self {
        Self(value)
    }

    /// Raw id
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed edge between two typed entities
///
/// The `(source_type, source_id, destination_type, destination_id)` tuple is
/// unique across the store. `relationship_type_id` names a
/// [`RelationshipType`] by key but is not enforced against it.
///
/// # Examples
///
/// ```
/// use relata_domain::{EntityRef, Relationship};
///
/// let facility = EntityRef::new("Facility", 1);
/// let program = EntityRef::new("Program", 2);
///
/// let rel = Relationship::new(&facility, &program).with_relationship_type("relates_to");
/// assert_eq!(rel.source_type(), Some("Facility"));
/// assert_eq!(rel.destination_id(), Some(2));
/// assert_eq!(rel.to_string(), "Facility:1 <-> Program:2");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    id: Option<RelationshipId>,
    source: Option<EntityRef>,
    destination: Option<EntityRef>,

    /// Key of the descriptive relationship type, if any
    pub relationship_type_id: Option<String>,

    /// Relationship this one was automatically derived from
    pub automapping_id: Option<RelationshipId>,

    attrs: AttrMap,
}

impl Relationship {
    /// Create an unsaved relationship from `source` to `destination`
    pub fn new(source: &dyn Entity, destination: &dyn Entity) -> Self {
        Self {
            id: None,
            source: Some(source.entity_ref()),
            destination: Some(destination.entity_ref()),
            relationship_type_id: None,
            automapping_id: None,
            attrs: AttrMap::new(),
        }
    }

    /// Rebuild a stored relationship
    pub fn from_stored(
        id: RelationshipId,
        source: EntityRef,
        destination: EntityRef,
        relationship_type_id: Option<String>,
        automapping_id: Option<RelationshipId>,
        attrs: AttrMap,
    ) -> Self {
        Self {
            id: Some(id),
            source: Some(source),
            destination: Some(destination),
            relationship_type_id,
            automapping_id,
            attrs,
        }
    }

    /// Set the descriptive relationship type key
    pub fn with_relationship_type(mut self, relationship_type_id: impl Into<String>) -> Self {
        self.relationship_type_id = Some(relationship_type_id.into());
        self
    }

    /// Mark this relationship as derived from another
    pub fn with_automapping(mut self, automapping_id: RelationshipId) -> Self {
        self.automapping_id = Some(automapping_id);
        self
    }

    /// Attach the store-assigned id
    pub fn with_id(mut self, id: RelationshipId) -> Self {
        self.id = Some(id);
        self
    }

    /// Store-assigned id (`None` until stored)
    pub fn id(&self) -> Option<RelationshipId> {
        self.id
    }

    /// Source endpoint reference
    pub fn source_ref(&self) -> Option<&EntityRef> {
        self.source.as_ref()
    }

    /// Destination endpoint reference
    pub fn destination_ref(&self) -> Option<&EntityRef> {
        self.destination.as_ref()
    }

    /// Source type tag
    pub fn source_type(&self) -> Option<&str> {
        self.source.as_ref().map(|r| r.type_name.as_str())
    }

    /// Source id
    pub fn source_id(&self) -> Option<i64> {
        self.source.as_ref().map(|r| r.id)
    }

    /// Destination type tag
    pub fn destination_type(&self) -> Option<&str> {
        self.destination.as_ref().map(|r| r.type_name.as_str())
    }

    /// Destination id
    pub fn destination_id(&self) -> Option<i64> {
        self.destination.as_ref().map(|r| r.id)
    }

    /// Point the source at `entity`; `None` clears type and id together
    pub fn set_source(&mut self, entity: Option<&dyn Entity>) {
        self.source = entity.map(|e| e.entity_ref());
    }

    /// Point the destination at `entity`; `None` clears type and id together
    pub fn set_destination(&mut self, entity: Option<&dyn Entity>) {
        self.destination = entity.map(|e| e.entity_ref());
    }

    /// Conventional accessor name for the source (`<Type>_source`)
    pub fn source_attr(&self) -> Option<String> {
        self.source_type().map(source_accessor_name)
    }

    /// Conventional accessor name for the destination (`<Type>_destination`)
    pub fn destination_attr(&self) -> Option<String> {
        self.destination_type().map(destination_accessor_name)
    }

    /// Resolve the live source entity
    ///
    /// `None` when the source is cleared, its type registers no accessor, or
    /// the accessor has no such entity.
    pub fn source(&self, schema: &EntitySchema) -> Option<Arc<dyn Entity>> {
        let source = self.source.as_ref()?;
        schema.resolve_source(&source.type_name, source.id)
    }

    /// Resolve the live destination entity
    pub fn destination(&self, schema: &EntitySchema) -> Option<Arc<dyn Entity>> {
        let destination = self.destination.as_ref()?;
        schema.resolve_destination(&destination.type_name, destination.id)
    }

    /// Both endpoint references, failing if either is cleared
    pub fn endpoints(&self) -> Result<(&EntityRef, &EntityRef), RelationshipError> {
        let source = self
            .source
            .as_ref()
            .ok_or(RelationshipError::MissingEndpoint("source"))?;
        let destination = self
            .destination
            .as_ref()
            .ok_or(RelationshipError::MissingEndpoint("destination"))?;
        Ok((source, destination))
    }

    /// Attribute map
    pub fn attrs(&self) -> &AttrMap {
        &self.attrs
    }

    /// Single attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    /// Attribute rows as stored
    pub fn attr_rows(&self) -> Vec<RelationshipAttr> {
        self.attrs.to_rows(self.id)
    }

    /// Insert or replace an attribute, returning the previous value
    ///
    /// The attribute must be authorised by a validator of the current
    /// source's or destination's type. On rejection nothing is stored.
    pub fn set_attr(
        &mut self,
        registry: &AttrValidatorRegistry,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, RelationshipError> {
        let name = name.into();
        let value = value.into();

        self.authorise_attr(registry, &name, &value)?;
        Ok(self.attrs.insert(name, value))
    }

    /// Remove an attribute, returning its value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attrs.remove(name)
    }

    /// Re-check every attribute against the current endpoints
    pub fn validate_attrs(&self, registry: &AttrValidatorRegistry) -> Result<(), RelationshipError> {
        self.attrs
            .iter()
            .try_for_each(|(name, value)| self.authorise_attr(registry, name, value))
    }

    fn authorise_attr(
        &self,
        registry: &AttrValidatorRegistry,
        name: &str,
        value: &str,
    ) -> Result<(), RelationshipError> {
        let source = self.source(registry.schema());
        let destination = self.destination(registry.schema());
        registry.validate_attr(source.as_deref(), destination.as_deref(), name, value)
    }

    /// Look up the descriptive relationship type, if the key matches one
    pub fn relationship_type<S: RelationshipStore>(
        &self,
        store: &S,
    ) -> Result<Option<RelationshipType>, S::Error> {
        match &self.relationship_type_id {
            Some(key) => store.get_relationship_type(key),
            None => Ok(None),
        }
    }

    /// Load the relationship this one was derived from
    pub fn automapping<S: RelationshipStore>(
        &self,
        store: &S,
    ) -> Result<Option<Relationship>, S::Error> {
        match self.automapping_id {
            Some(id) => store.get_relationship(id),
            None => Ok(None),
        }
    }

    /// Publishable view of the relationship
    pub fn publish(&self) -> PublishedRelationship {
        PublishedRelationship {
            source: self.source.clone(),
            destination: self.destination.clone(),
            relationship_type_id: self.relationship_type_id.clone(),
            attrs: self.attrs.clone(),
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn side(f: &mut fmt::Formatter<'_>, endpoint: &Option<EntityRef>) -> fmt::Result {
            match endpoint {
                Some(r) => write!(f, "{}:{}", r.type_name, r.id),
                None => write!(f, "None:None"),
            }
        }

        side(f, &self.source)?;
        write!(f, " <-> ")?;
        side(f, &self.destination)
    }
}

/// The public fields of a relationship, for serialisation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedRelationship {
    /// Source endpoint
    pub source: Option<EntityRef>,
    /// Destination endpoint
    pub destination: Option<EntityRef>,
    /// Descriptive type key
    pub relationship_type_id: Option<String>,
    /// Attributes
    pub attrs: AttrMap,
}
