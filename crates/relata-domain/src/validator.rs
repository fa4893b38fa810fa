//! Relationship attribute validation
//!
//! Relationships may carry attributes, but only attributes some endpoint type
//! explicitly authorises. Types authorise attributes by implementing
//! [`HasRelationshipAttrValidator`] and declaring the resulting
//! [`AttrValidator`] on their [`TypeDescriptor`](crate::TypeDescriptor),
//! directly or through a mixin in their ancestry.
//!
//! [`AttrValidatorRegistry`] gathers, per concrete type, every validator
//! reachable through that type's ancestry, binds each one to the concrete
//! type, and caches the result for the life of the process.

use crate::{Entity, EntitySchema, RelationshipError};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// The attribute being checked, with both endpoints of its relationship
#[derive(Debug, Clone, Copy)]
pub struct AttrContext<'a> {
    /// Resolved source, if any
    pub source: Option<&'a dyn Entity>,
    /// Resolved destination, if any
    pub destination: Option<&'a dyn Entity>,
    /// Attribute name
    pub name: &'a str,
    /// Candidate value
    pub value: &'a str,
}

/// Validator signature: the concrete type it is bound to, then the attribute
pub type ValidatorFn = fn(target: &str, ctx: &AttrContext<'_>) -> bool;

/// Capability of a type (or mixin) that authorises relationship attributes
///
/// Return `true` to authorise; `false` defers to the other validators.
pub trait HasRelationshipAttrValidator {
    /// Decide on `ctx` for a relationship touching an entity of type `target`
    fn validate_relationship_attr(target: &str, ctx: &AttrContext<'_>) -> bool;
}

/// A validator function together with the type that declared it
///
/// The declaring type's path is the validator's identity: two descriptors
/// declaring `AttrValidator::of::<Assignable>()` declare the same validator.
#[derive(Clone, Copy)]
pub struct AttrValidator {
    origin: &'static str,
    check: ValidatorFn,
}

impl AttrValidator {
    /// The validator implemented by `T`
    pub fn of<T: HasRelationshipAttrValidator + ?Sized>() -> Self {
        Self {
            origin: std::any::type_name::<T>(),
            check: T::validate_relationship_attr,
        }
    }

    /// A validator from a bare function, identified by `origin`
    pub fn from_fn(origin: &'static str, check: ValidatorFn) -> Self {
        Self { origin, check }
    }

    /// Identity of the validator
    pub fn origin(&self) -> &'static str {
        self.origin
    }

    /// Bind the validator to a concrete type
    pub fn bind(&self, target: &str) -> BoundValidator {
        BoundValidator {
            target: Arc::from(target),
            validator: *self,
        }
    }
}

impl fmt::Debug for AttrValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AttrValidator").field(&self.origin).finish()
    }
}

/// A validator partially applied to the concrete type it was gathered for
#[derive(Debug, Clone)]
pub struct BoundValidator {
    target: Arc<str>,
    validator: AttrValidator,
}

impl BoundValidator {
    /// Concrete type the validator receives
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Identity of the underlying validator
    pub fn origin(&self) -> &'static str {
        self.validator.origin
    }

    /// Run the validator
    pub fn call(&self, ctx: &AttrContext<'_>) -> bool {
        (self.validator.check)(&self.target, ctx)
    }
}

/// Discovers and caches attribute validators per concrete type
///
/// The cache is filled on first lookup of each type and never invalidated;
/// validators added to the schema afterwards are not seen until restart.
/// Concurrent first lookups of the same type may both gather, which is
/// harmless: the first insert wins.
///
/// # Examples
///
/// ```
/// use relata_domain::{
///     AttrContext, AttrValidator, AttrValidatorRegistry, EntityRef, EntitySchema,
///     HasRelationshipAttrValidator, TypeDescriptor,
/// };
/// use std::sync::Arc;
///
/// struct Audited;
///
/// impl HasRelationshipAttrValidator for Audited {
///     fn validate_relationship_attr(_target: &str, ctx: &AttrContext<'_>) -> bool {
///         ctx.name == "AuditCycle"
///     }
/// }
///
/// let schema = EntitySchema::new()
///     .with_type(TypeDescriptor::new("Program").with_validator(AttrValidator::of::<Audited>()));
/// let registry = AttrValidatorRegistry::new(Arc::new(schema));
///
/// let program = EntityRef::new("Program", 1);
/// assert!(registry.validate_attr(Some(&program), None, "AuditCycle", "2024").is_ok());
/// assert!(registry.validate_attr(Some(&program), None, "Color", "red").is_err());
/// ```
pub struct AttrValidatorRegistry {
    schema: Arc<EntitySchema>,
    cache: RwLock<HashMap<String, Arc<[BoundValidator]>>>,
}

impl AttrValidatorRegistry {
    /// Create a registry over a schema
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        Self {
            schema,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Schema the registry reads from
    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    /// Authorise an attribute for a relationship between `source` and `destination`
    ///
    /// Validators from both endpoints' ancestries are tried in turn; the
    /// first to return `true` authorises the attribute. An absent endpoint
    /// contributes no validators.
    pub fn validate_attr(
        &self,
        source: Option<&dyn Entity>,
        destination: Option<&dyn Entity>,
        name: &str,
        value: &str,
    ) -> Result<(), RelationshipError> {
        let ctx = AttrContext {
            source,
            destination,
            name,
            value,
        };

        let source_validators = source.map(|e| self.validators_for(e.type_name()));
        let destination_validators = destination.map(|e| self.validators_for(e.type_name()));

        let authorised = source_validators
            .iter()
            .chain(destination_validators.iter())
            .flat_map(|validators| validators.iter())
            .any(|validator| validator.call(&ctx));

        if authorised {
            Ok(())
        } else {
            tracing::debug!("Rejected relationship attribute {}: {}", name, value);
            Err(RelationshipError::invalid_attribute(name, value))
        }
    }

    /// Validators bound to `type_name`, gathered on first use
    pub fn validators_for(&self, type_name: &str) -> Arc<[BoundValidator]> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(validators) = cache.get(type_name) {
                return Arc::clone(validators);
            }
        }

        let gathered: Arc<[BoundValidator]> = self.gather_validators(type_name).into();
        tracing::debug!(
            "Cached {} relationship attribute validator(s) for {}",
            gathered.len(),
            type_name
        );

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(type_name.to_string()).or_insert(gathered))
    }

    /// Walk `type_name`'s ancestry and bind each distinct validator to it
    pub fn gather_validators(&self, type_name: &str) -> Vec<BoundValidator> {
        let mut seen = HashSet::new();

        self.schema
            .ancestry(type_name)
            .into_iter()
            .filter_map(|descriptor| descriptor.validator())
            .filter(|validator| seen.insert(validator.origin()))
            .map(|validator| validator.bind(type_name))
            .collect()
    }

    /// Number of concrete types with cached validators
    pub fn cached_types(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for AttrValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrValidatorRegistry")
            .field("schema", &self.schema)
            .field("cached_types", &self.cached_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityRef, TypeDescriptor};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Assignable;

    impl HasRelationshipAttrValidator for Assignable {
        fn validate_relationship_attr(target: &str, ctx: &AttrContext<'_>) -> bool {
            let roles: &[&str] = match target {
                "Request" => &["Assignee", "Requester", "Verifier"],
                _ => &["Assignee", "Verifier"],
            };
            ctx.name == "AssigneeType" && ctx.value.split(',').all(|v| roles.contains(&v))
        }
    }

    static COUNTED_CALLS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl HasRelationshipAttrValidator for Counted {
        fn validate_relationship_attr(_target: &str, _ctx: &AttrContext<'_>) -> bool {
            COUNTED_CALLS.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    fn registry(schema: EntitySchema) -> AttrValidatorRegistry {
        AttrValidatorRegistry::new(Arc::new(schema))
    }

    fn compliance() -> AttrValidatorRegistry {
        registry(
            EntitySchema::new()
                .with_type(
                    TypeDescriptor::new("Assignable").with_validator(AttrValidator::of::<Assignable>()),
                )
                .with_type(TypeDescriptor::new("Facility").extends("Assignable"))
                .with_type(TypeDescriptor::new("Request").extends("Assignable"))
                .with_type(TypeDescriptor::new("Person")),
        )
    }

    #[test]
    fn test_facility_assignee_roles() {
        let registry = compliance();
        let facility = EntityRef::new("Facility", 1);
        let person = EntityRef::new("Person", 2);

        assert!(registry
            .validate_attr(Some(&facility), Some(&person), "AssigneeType", "Assignee")
            .is_ok());
        assert!(registry
            .validate_attr(Some(&facility), Some(&person), "AssigneeType", "Assignee,Verifier")
            .is_ok());

        let err = registry
            .validate_attr(Some(&facility), Some(&person), "AssigneeType", "Unknown")
            .unwrap_err();
        assert_eq!(err, RelationshipError::invalid_attribute("AssigneeType", "Unknown"));
    }

    #[test]
    fn test_validator_bound_to_concrete_type() {
        let registry = compliance();
        let facility = EntityRef::new("Facility", 1);
        let request = EntityRef::new("Request", 1);

        // "Requester" is only an assignee role of Request
        assert!(registry
            .validate_attr(Some(&request), None, "AssigneeType", "Requester")
            .is_ok());
        assert!(registry
            .validate_attr(Some(&facility), None, "AssigneeType", "Requester")
            .is_err());

        let bound = registry.validators_for("Request");
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].target(), "Request");
    }

    #[test]
    fn test_destination_validators_count() {
        let registry = compliance();
        let person = EntityRef::new("Person", 2);
        let facility = EntityRef::new("Facility", 1);

        assert!(registry
            .validate_attr(Some(&person), Some(&facility), "AssigneeType", "Verifier")
            .is_ok());
    }

    #[test]
    fn test_no_validators_rejects_everything() {
        let registry = compliance();
        let a = EntityRef::new("Person", 1);
        let b = EntityRef::new("Person", 2);

        assert!(matches!(
            registry.validate_attr(Some(&a), Some(&b), "AssigneeType", "Assignee"),
            Err(RelationshipError::InvalidAttribute { .. })
        ));
        assert!(registry.validate_attr(None, None, "anything", "").is_err());
    }

    #[test]
    fn test_validator_declared_twice_runs_once() {
        let registry = registry(
            EntitySchema::new()
                .with_type(TypeDescriptor::new("Parent").with_validator(AttrValidator::of::<Counted>()))
                .with_type(
                    TypeDescriptor::new("Child")
                        .extends("Parent")
                        .with_validator(AttrValidator::of::<Counted>()),
                ),
        );

        assert_eq!(registry.gather_validators("Child").len(), 1);

        let child = EntityRef::new("Child", 1);
        let before = COUNTED_CALLS.load(Ordering::SeqCst);
        let _ = registry.validate_attr(Some(&child), None, "x", "y");
        assert_eq!(COUNTED_CALLS.load(Ordering::SeqCst) - before, 1);
    }

    #[test]
    fn test_cache_is_populated_once_per_type() {
        let registry = compliance();
        assert_eq!(registry.cached_types(), 0);

        let first = registry.validators_for("Facility");
        let second = registry.validators_for("Facility");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.cached_types(), 1);

        registry.validators_for("Person");
        assert_eq!(registry.cached_types(), 2);
    }

    #[test]
    fn test_concurrent_lookups_agree() {
        let registry = compliance();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.validators_for("Facility").len()))
                .collect();

            for handle in handles {
                assert_eq!(handle.join().unwrap(), 1);
            }
        });

        assert_eq!(registry.cached_types(), 1);
    }
}
