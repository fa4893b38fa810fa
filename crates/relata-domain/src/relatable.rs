//! Relatable capability - entities that own their incident relationships
//!
//! A relatable entity sees two views of the edge set:
//!
//! - `related_sources`: edges whose destination is the entity, i.e. the
//!   sources related to it
//! - `related_destinations`: edges whose source is the entity
//!
//! Removing the entity removes every edge in both views.

use crate::traits::RelationshipStore;
use crate::{Entity, EntityRef, PublishedRelationship, Relationship};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Both incident-edge views of one entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelatedEdges {
    /// Edges pointing at the entity
    pub related_sources: Vec<Relationship>,

    /// Edges leaving the entity
    pub related_destinations: Vec<Relationship>,
}

impl RelatedEdges {
    /// Total number of incident edges
    pub fn len(&self) -> usize {
        self.related_sources.len() + self.related_destinations.len()
    }

    /// Whether the entity has no edges
    pub fn is_empty(&self) -> bool {
        self.related_sources.is_empty() && self.related_destinations.is_empty()
    }

    /// Publishable view
    pub fn publish(&self) -> PublishedRelatedEdges {
        PublishedRelatedEdges {
            related_sources: self.related_sources.iter().map(Relationship::publish).collect(),
            related_destinations: self
                .related_destinations
                .iter()
                .map(Relationship::publish)
                .collect(),
        }
    }
}

/// The public fields of a relatable entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedRelatedEdges {
    /// Edges pointing at the entity
    pub related_sources: Vec<PublishedRelationship>,
    /// Edges leaving the entity
    pub related_destinations: Vec<PublishedRelationship>,
}

/// Capability of entity types that take part in relationships
///
/// Opt in with an empty impl; the type must also be registered as relatable
/// in the [`EntitySchema`](crate::EntitySchema) for relationships to resolve
/// back to it.
pub trait Relatable: Entity + Sized {
    /// Edges whose destination is this entity
    fn related_sources<S: RelationshipStore>(&self, store: &S) -> Result<Vec<Relationship>, S::Error> {
        store.related_sources(self)
    }

    /// Edges whose source is this entity
    fn related_destinations<S: RelationshipStore>(
        &self,
        store: &S,
    ) -> Result<Vec<Relationship>, S::Error> {
        store.related_destinations(self)
    }

    /// Both views at once
    fn related_edges<S: RelationshipStore>(&self, store: &S) -> Result<RelatedEdges, S::Error> {
        Ok(RelatedEdges {
            related_sources: self.related_sources(store)?,
            related_destinations: self.related_destinations(store)?,
        })
    }

    /// Remove every relationship this entity appears in
    ///
    /// Call when the entity itself is deleted.
    fn delete_relationships<S: RelationshipStore>(&self, store: &mut S) -> Result<usize, S::Error> {
        store.delete_entity(self)
    }

    /// Load incident edges for a whole batch, in batch order
    ///
    /// One store round-trip per distinct type in the batch rather than one
    /// per entity.
    fn eager_query<S: RelationshipStore>(store: &S, batch: &[Self]) -> Result<Vec<RelatedEdges>, S::Error> {
        let mut ids_by_type: HashMap<&str, Vec<i64>> = HashMap::new();
        for entity in batch {
            ids_by_type
                .entry(entity.type_name())
                .or_default()
                .push(entity.id());
        }

        let mut loaded: HashMap<&str, HashMap<i64, RelatedEdges>> = HashMap::new();
        for (type_name, ids) in ids_by_type {
            loaded.insert(type_name, store.eager_related(type_name, &ids)?);
        }

        Ok(batch
            .iter()
            .map(|entity| {
                loaded
                    .get(entity.type_name())
                    .and_then(|edges| edges.get(&entity.id()))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect())
    }
}

impl Relatable for EntityRef {}
