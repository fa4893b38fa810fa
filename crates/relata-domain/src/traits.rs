//! Trait definitions for external interactions
//!
//! The persistence engine lives in another crate (relata-store); these
//! traits are the boundary it implements.

use crate::{Entity, EntityRef, RelatedEdges, Relationship, RelationshipId, RelationshipType};
use std::collections::HashMap;

/// Transactional storage of relationships, their attributes and types
///
/// Every write runs in one transaction. A write that would duplicate an
/// edge, or store an attribute no validator authorises, fails and leaves
/// nothing behind.
pub trait RelationshipStore {
    /// Error type for store operations
    type Error;

    /// Store a new relationship with its attributes
    ///
    /// Fails with `DuplicateEdge` if the typed `(source, destination)` pair is
    /// taken, or `InvalidAttribute` if any attribute is not authorised.
    fn create_relationship(&mut self, relationship: &Relationship) -> Result<RelationshipId, Self::Error>;

    /// Get a relationship by id
    fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>, Self::Error>;

    /// First relationship linking `a` and `b` in either direction
    fn find_related(&self, a: &dyn Entity, b: &dyn Entity) -> Result<Option<Relationship>, Self::Error>;

    /// Query relationships matching criteria
    fn query_relationships(&self, query: &RelationshipQuery) -> Result<Vec<Relationship>, Self::Error>;

    /// Insert or replace an attribute on a stored relationship
    fn set_attr(
        &mut self,
        id: RelationshipId,
        name: &str,
        value: &str,
    ) -> Result<Option<String>, Self::Error>;

    /// Remove an attribute from a stored relationship
    fn remove_attr(&mut self, id: RelationshipId, name: &str) -> Result<Option<String>, Self::Error>;

    /// Delete a relationship and its attributes
    ///
    /// Relationships derived from it keep existing with their automapping
    /// link cleared. Returns whether anything was deleted.
    fn delete_relationship(&mut self, id: RelationshipId) -> Result<bool, Self::Error>;

    /// Relationships whose destination is `entity`
    fn related_sources(&self, entity: &dyn Entity) -> Result<Vec<Relationship>, Self::Error>;

    /// Relationships whose source is `entity`
    fn related_destinations(&self, entity: &dyn Entity) -> Result<Vec<Relationship>, Self::Error>;

    /// Delete every relationship touching `entity`, returning how many
    fn delete_entity(&mut self, entity: &dyn Entity) -> Result<usize, Self::Error>;

    /// Delete every relationship touching any of `entities` in one transaction
    ///
    /// Either all of them are removed or none are. Returns how many rows went.
    fn delete_entities(&mut self, entities: &[EntityRef]) -> Result<usize, Self::Error>;

    /// Incident edges for a batch of entities of one type, keyed by id
    ///
    /// Issues a fixed number of queries however large the batch is.
    fn eager_related(
        &self,
        type_name: &str,
        ids: &[i64],
    ) -> Result<HashMap<i64, RelatedEdges>, Self::Error>;

    /// Count stored relationships
    fn count_relationships(&self) -> Result<usize, Self::Error>;

    /// Insert or update a relationship type by key, returning its id
    fn save_relationship_type(&mut self, relationship_type: &RelationshipType) -> Result<i64, Self::Error>;

    /// Get a relationship type by key
    fn get_relationship_type(&self, key: &str) -> Result<Option<RelationshipType>, Self::Error>;

    /// All relationship types, ordered by key
    fn list_relationship_types(&self) -> Result<Vec<RelationshipType>, Self::Error>;

    /// Delete a relationship type by key
    ///
    /// Relationships naming the key are untouched.
    fn delete_relationship_type(&mut self, key: &str) -> Result<bool, Self::Error>;
}

/// Query criteria for listing relationships
#[derive(Debug, Clone, Default)]
pub struct RelationshipQuery {
    /// Filter by source type tag
    pub source_type: Option<String>,

    /// Filter by destination type tag
    pub destination_type: Option<String>,

    /// Filter by relationship type key
    pub relationship_type_id: Option<String>,

    /// Only relationships derived from another
    pub automapped_only: bool,

    /// Maximum results to return
    pub limit: Option<usize>,
}
