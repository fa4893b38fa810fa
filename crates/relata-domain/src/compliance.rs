//! Built-in compliance vocabulary
//!
//! The object types of a compliance-tracking application, wired into an
//! [`EntitySchema`]. Objects that people are assigned to (facilities,
//! programs, policies, controls, requests) mix in [`Assignable`], which
//! authorises the `AssigneeType` relationship attribute with the roles the
//! concrete type accepts.

use crate::{
    AttrContext, AttrValidator, Entity, EntityRef, EntitySchema, HasRelationshipAttrValidator,
    Relatable, TypeDescriptor,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Attribute recording which role(s) a person holds on an object
pub const ASSIGNEE_TYPE: &str = "AssigneeType";

/// Concrete compliance object types
pub const COMPLIANCE_TYPES: [&str; 6] = ["Person", "Facility", "Program", "Policy", "Control", "Request"];

/// Assignee roles accepted by a concrete type
pub fn assignee_roles(type_name: &str) -> &'static [&'static str] {
    match type_name {
        "Request" => &["Assignee", "Requester", "Verifier"],
        "Facility" | "Program" | "Policy" | "Control" => &["Assignee", "Verifier"],
        _ => &[],
    }
}

/// Mixin for objects people can be assigned to
///
/// Authorises `AssigneeType` when every comma-separated role belongs to the
/// concrete type's [`assignee_roles`].
pub struct Assignable;

impl HasRelationshipAttrValidator for Assignable {
    fn validate_relationship_attr(target: &str, ctx: &AttrContext<'_>) -> bool {
        if ctx.name != ASSIGNEE_TYPE || ctx.value.trim().is_empty() {
            return false;
        }

        let roles = assignee_roles(target);
        ctx.value
            .split(',')
            .map(str::trim)
            .all(|role| roles.contains(&role))
    }
}

/// A compliance object as far as relationships are concerned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Concrete type tag
    #[serde(rename = "type")]
    pub type_name: String,

    /// Identity within the type
    pub id: i64,

    /// Display title
    #[serde(default)]
    pub title: String,
}

impl Record {
    /// Create a record
    pub fn new(type_name: impl Into<String>, id: i64, title: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id,
            title: title.into(),
        }
    }
}

impl Entity for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl Relatable for Record {}

/// In-memory entity resolution for compliance records
///
/// In closed mode only inserted records resolve. In open mode any id of a
/// registered type resolves to an untitled record, for callers whose
/// objects live in another system.
#[derive(Debug, Default)]
pub struct RecordCatalog {
    records: RwLock<HashMap<EntityRef, Arc<Record>>>,
    open: bool,
}

impl RecordCatalog {
    /// Catalog resolving only inserted records
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog resolving any id
    pub fn open_world() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            open: true,
        }
    }

    /// Add or replace a record
    pub fn insert(&self, record: Record) -> Arc<Record> {
        let record = Arc::new(record);
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.entity_ref(), Arc::clone(&record));
        record
    }

    /// Remove a record
    pub fn remove(&self, type_name: &str, id: i64) -> Option<Arc<Record>> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&EntityRef::new(type_name, id))
    }

    /// Look up a record
    pub fn get(&self, type_name: &str, id: i64) -> Option<Arc<Record>> {
        let found = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&EntityRef::new(type_name, id))
            .cloned();

        match found {
            Some(record) => Some(record),
            None if self.open => Some(Arc::new(Record::new(type_name, id, ""))),
            None => None,
        }
    }

    /// Number of inserted records
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no records were inserted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn relatable_type(name: &'static str, catalog: &Arc<RecordCatalog>) -> TypeDescriptor {
    let catalog = Arc::clone(catalog);
    TypeDescriptor::new(name)
        .extends("Relatable")
        .relatable(move |id| catalog.get(name, id).map(|r| r as Arc<dyn Entity>))
}

/// Schema of the compliance object types, resolving through `catalog`
pub fn compliance_schema(catalog: Arc<RecordCatalog>) -> EntitySchema {
    let mut schema = EntitySchema::new()
        .with_type(TypeDescriptor::new("Relatable"))
        .with_type(TypeDescriptor::new("Described"))
        .with_type(TypeDescriptor::new("Assignable").with_validator(AttrValidator::of::<Assignable>()))
        .with_type(relatable_type("Person", &catalog));

    for name in ["Facility", "Program", "Policy", "Control"] {
        schema.register(
            relatable_type(name, &catalog)
                .extends("Assignable")
                .extends("Described"),
        );
    }

    schema.with_type(relatable_type("Request", &catalog).extends("Assignable"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttrValidatorRegistry, Relationship, RelationshipError};

    fn setup() -> (Arc<RecordCatalog>, AttrValidatorRegistry) {
        let catalog = Arc::new(RecordCatalog::new());
        let registry = AttrValidatorRegistry::new(Arc::new(compliance_schema(Arc::clone(&catalog))));
        (catalog, registry)
    }

    #[test]
    fn test_every_compliance_type_is_relatable() {
        let (_, registry) = setup();
        for name in COMPLIANCE_TYPES {
            let descriptor = registry.schema().descriptor(name).unwrap();
            assert!(descriptor.is_relatable(), "{} should be relatable", name);
        }
    }

    #[test]
    fn test_facility_assignee_type() {
        let (catalog, registry) = setup();
        let facility = catalog.insert(Record::new("Facility", 1, "HQ"));
        let person = catalog.insert(Record::new("Person", 2, "Ann"));

        let mut rel = Relationship::new(&*facility, &*person);
        assert!(rel.set_attr(&registry, ASSIGNEE_TYPE, "Assignee").is_ok());
        assert!(rel.set_attr(&registry, ASSIGNEE_TYPE, "Assignee,Verifier").is_ok());
        assert_eq!(
            rel.set_attr(&registry, ASSIGNEE_TYPE, "Unknown"),
            Err(RelationshipError::invalid_attribute(ASSIGNEE_TYPE, "Unknown"))
        );
        assert_eq!(rel.attr(ASSIGNEE_TYPE), Some("Assignee,Verifier"));
    }

    #[test]
    fn test_request_accepts_requester() {
        let (catalog, registry) = setup();
        let request = catalog.insert(Record::new("Request", 1, "Evidence"));
        let person = catalog.insert(Record::new("Person", 2, "Ann"));

        let mut rel = Relationship::new(&*person, &*request);
        assert!(rel.set_attr(&registry, ASSIGNEE_TYPE, "Requester").is_ok());
    }

    #[test]
    fn test_other_attributes_are_rejected() {
        let (catalog, registry) = setup();
        let facility = catalog.insert(Record::new("Facility", 1, "HQ"));
        let program = catalog.insert(Record::new("Program", 2, "SOX"));

        let mut rel = Relationship::new(&*facility, &*program);
        assert!(rel.set_attr(&registry, "Color", "red").is_err());
        assert!(rel.set_attr(&registry, ASSIGNEE_TYPE, "").is_err());
    }

    #[test]
    fn test_closed_catalog_does_not_resolve_unknown_ids() {
        let (catalog, registry) = setup();
        let person = catalog.insert(Record::new("Person", 2, "Ann"));

        // Facility 99 was never inserted: no validators on that side
        let mut rel = Relationship::new(&EntityRef::new("Facility", 99), &*person);
        assert!(rel.source(registry.schema()).is_none());
        assert!(rel.set_attr(&registry, ASSIGNEE_TYPE, "Assignee").is_err());
    }

    #[test]
    fn test_open_world_catalog() {
        let catalog = RecordCatalog::open_world();
        let record = catalog.get("Program", 7).unwrap();
        assert_eq!(record.entity_ref(), EntityRef::new("Program", 7));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_removed_record_stops_resolving() {
        let (catalog, registry) = setup();
        catalog.insert(Record::new("Policy", 3, "Access"));
        assert!(registry.schema().resolve_source("Policy", 3).is_some());

        catalog.remove("Policy", 3);
        assert!(registry.schema().resolve_source("Policy", 3).is_none());
    }
}
