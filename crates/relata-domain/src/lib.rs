//! Relata Domain Layer
//!
//! Typed, attributed relationships between heterogeneous entities. This
//! crate holds the model and the rules; persistence lives behind the
//! [`RelationshipStore`](traits::RelationshipStore) trait.
//!
//! ## Key Concepts
//!
//! - **Entity**: anything with a type tag and an integer id
//! - **Relationship**: a directed edge between two entities, unique per
//!   typed `(source, destination)` pair, carrying string attributes
//! - **Attribute validators**: per-type rules deciding which relationship
//!   attributes are allowed, inherited along the type hierarchy
//! - **Relationship types**: descriptive vocabulary naming what an edge means
//! - **Relatable**: the capability of entities that own incident edges
//!
//! ## Architecture
//!
//! - The type hierarchy is declared once in an [`EntitySchema`]
//! - An [`AttrValidatorRegistry`] is built from the schema at start-up and
//!   shared; it caches gathered validators per type
//! - Storage implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attr;
pub mod compliance;
pub mod entity;
pub mod error;
pub mod relatable;
pub mod relationship;
pub mod relationship_type;
pub mod schema;
pub mod traits;
pub mod validator;

// Re-exports for convenience
pub use attr::{AttrMap, RelationshipAttr};
pub use entity::{Entity, EntityRef};
pub use error::RelationshipError;
pub use relatable::{PublishedRelatedEdges, Relatable, RelatedEdges};
pub use relationship::{PublishedRelationship, Relationship, RelationshipId};
pub use relationship_type::{Direction, PublishedRelationshipType, RelationshipType};
pub use schema::{EntityAccessor, EntitySchema, TypeDescriptor};
pub use validator::{
    AttrContext, AttrValidator, AttrValidatorRegistry, BoundValidator, HasRelationshipAttrValidator,
    ValidatorFn,
};
