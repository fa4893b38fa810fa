//! Entity schema - the static registry of types that take part in relationships
//!
//! Every type that can be an endpoint is described once at start-up by a
//! [`TypeDescriptor`]: its explicit ancestry (parent types and mixins), the
//! attribute validator it declares, and, for relatable types, the accessor
//! used to resolve `(type, id)` back into a live entity.
//!
//! Accessors are registered under the conventional names
//! `<Type>_source` and `<Type>_destination`, which is how a relationship
//! finds the object at either end.

use crate::{AttrValidator, Entity, RelationshipError};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// Resolves an id of one concrete type to the live entity
pub type EntityAccessor = Arc<dyn Fn(i64) -> Option<Arc<dyn Entity>> + Send + Sync>;

/// Accessor name a relationship uses to resolve its source
pub fn source_accessor_name(type_name: &str) -> String {
    format!("{}_source", type_name)
}

/// Accessor name a relationship uses to resolve its destination
pub fn destination_accessor_name(type_name: &str) -> String {
    format!("{}_destination", type_name)
}

/// Static description of one type (concrete type or mixin)
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    parents: Vec<String>,
    validator: Option<AttrValidator>,
    accessor: Option<EntityAccessor>,
}

impl TypeDescriptor {
    /// Describe a type with no ancestry, validator or accessor
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            validator: None,
            accessor: None,
        }
    }

    /// Declare a direct parent type or mixin
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        let parent = parent.into();
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
        self
    }

    /// Declare the attribute validator defined on this type
    pub fn with_validator(mut self, validator: AttrValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Make the type relatable, resolving ids through `accessor`
    pub fn relatable<F>(mut self, accessor: F) -> Self
    where
        F: Fn(i64) -> Option<Arc<dyn Entity>> + Send + Sync + 'static,
    {
        self.accessor = Some(Arc::new(accessor));
        self
    }

    /// Type tag
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct parents, in declaration order
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// Validator declared directly on this type
    pub fn validator(&self) -> Option<&AttrValidator> {
        self.validator.as_ref()
    }

    /// Whether the type registers relationship accessors
    pub fn is_relatable(&self) -> bool {
        self.accessor.is_some()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("parents", &self.parents)
            .field("validator", &self.validator)
            .field("relatable", &self.is_relatable())
            .finish()
    }
}

/// Registry of every type taking part in relationships
///
/// Built once at start-up and shared behind an `Arc`; it is not mutated
/// afterwards.
///
/// # Examples
///
/// ```
/// use relata_domain::{Entity, EntityRef, EntitySchema, TypeDescriptor};
/// use std::sync::Arc;
///
/// let schema = EntitySchema::new()
///     .with_type(TypeDescriptor::new("Facility").relatable(|id| {
///         Some(Arc::new(EntityRef::new("Facility", id)) as Arc<dyn Entity>)
///     }));
///
/// assert!(schema.accessor("Facility_source").is_some());
/// assert!(schema.accessor("Program_source").is_none());
/// ```
#[derive(Default)]
pub struct EntitySchema {
    types: HashMap<String, TypeDescriptor>,
    accessors: HashMap<String, EntityAccessor>,
}

impl EntitySchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Register a type, replacing any previous descriptor of the same name
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        if let Some(accessor) = &descriptor.accessor {
            self.accessors
                .insert(source_accessor_name(&descriptor.name), Arc::clone(accessor));
            self.accessors.insert(
                destination_accessor_name(&descriptor.name),
                Arc::clone(accessor),
            );
        }
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Look up a type descriptor
    pub fn descriptor(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }

    /// Look up an accessor by its conventional name
    pub fn accessor(&self, accessor_name: &str) -> Option<&EntityAccessor> {
        self.accessors.get(accessor_name)
    }

    /// Names of all registered types, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve the object at the source end of an edge
    pub fn resolve_source(&self, type_name: &str, id: i64) -> Option<Arc<dyn Entity>> {
        self.accessor(&source_accessor_name(type_name))
            .and_then(|accessor| accessor(id))
    }

    /// Resolve the object at the destination end of an edge
    pub fn resolve_destination(&self, type_name: &str, id: i64) -> Option<Arc<dyn Entity>> {
        self.accessor(&destination_accessor_name(type_name))
            .and_then(|accessor| accessor(id))
    }

    /// Resolve an endpoint, failing when the type has no accessor
    ///
    /// `Ok(None)` means the type is relatable but the accessor found no
    /// entity with that id.
    pub fn resolve(
        &self,
        type_name: &str,
        id: i64,
    ) -> Result<Option<Arc<dyn Entity>>, RelationshipError> {
        let accessor = self.accessor(&source_accessor_name(type_name)).ok_or_else(|| {
            RelationshipError::UnresolvedEndpoint {
                type_name: type_name.to_string(),
            }
        })?;
        Ok(accessor(id))
    }

    /// Every type in `type_name`'s ancestry, breadth first, the type itself first
    ///
    /// Each ancestor appears once however many paths reach it. Parents that
    /// were never registered are skipped.
    pub fn ancestry(&self, type_name: &str) -> Vec<&TypeDescriptor> {
        let mut ordered = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();

        queue.push_back(type_name);
        seen.insert(type_name);

        while let Some(name) = queue.pop_front() {
            let Some(descriptor) = self.types.get(name) else {
                tracing::warn!("Type '{}' is not registered, skipping its ancestry", name);
                continue;
            };

            for parent in &descriptor.parents {
                if seen.insert(parent.as_str()) {
                    queue.push_back(parent.as_str());
                }
            }

            ordered.push(descriptor);
        }

        ordered
    }
}

impl fmt::Debug for EntitySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntitySchema")
            .field("types", &self.type_names())
            .field("accessors", &self.accessors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityRef;

    fn stub(type_name: &'static str) -> impl Fn(i64) -> Option<Arc<dyn Entity>> + Send + Sync {
        move |id| Some(Arc::new(EntityRef::new(type_name, id)) as Arc<dyn Entity>)
    }

    #[test]
    fn test_relatable_registers_both_accessors() {
        let schema = EntitySchema::new()
            .with_type(TypeDescriptor::new("Facility").relatable(stub("Facility")));

        assert!(schema.accessor("Facility_source").is_some());
        assert!(schema.accessor("Facility_destination").is_some());
    }

    #[test]
    fn test_plain_type_has_no_accessor() {
        let schema = EntitySchema::new().with_type(TypeDescriptor::new("Person"));

        assert!(schema.descriptor("Person").is_some());
        assert!(schema.resolve_source("Person", 1).is_none());
        assert!(matches!(
            schema.resolve("Person", 1),
            Err(RelationshipError::UnresolvedEndpoint { .. })
        ));
    }

    #[test]
    fn test_resolve_through_accessor() {
        let schema = EntitySchema::new()
            .with_type(TypeDescriptor::new("Program").relatable(stub("Program")));

        let program = schema.resolve_destination("Program", 9).unwrap();
        assert_eq!(program.type_name(), "Program");
        assert_eq!(program.id(), 9);
    }

    #[test]
    fn test_ancestry_is_breadth_first_and_deduplicated() {
        // Diamond: Facility -> (Assignable, Described) -> Base
        let schema = EntitySchema::new()
            .with_type(TypeDescriptor::new("Base"))
            .with_type(TypeDescriptor::new("Assignable").extends("Base"))
            .with_type(TypeDescriptor::new("Described").extends("Base"))
            .with_type(
                TypeDescriptor::new("Facility")
                    .extends("Assignable")
                    .extends("Described"),
            );

        let names: Vec<&str> = schema.ancestry("Facility").iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["Facility", "Assignable", "Described", "Base"]);
    }

    #[test]
    fn test_ancestry_tolerates_cycles_and_unknown_parents() {
        let schema = EntitySchema::new()
            .with_type(TypeDescriptor::new("A").extends("B").extends("Ghost"))
            .with_type(TypeDescriptor::new("B").extends("A"));

        let names: Vec<&str> = schema.ancestry("A").iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_unregistered_type_has_empty_ancestry() {
        let schema = EntitySchema::new();
        assert!(schema.ancestry("Nope").is_empty());
    }
}
