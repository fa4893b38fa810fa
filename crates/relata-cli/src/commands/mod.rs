//! Command implementations.

pub mod attr;
pub mod find;
pub mod forget;
pub mod relate;
pub mod related;
pub mod types;

pub use self::attr::execute_attr;
pub use self::find::{execute_find, execute_list, execute_show};
pub use self::forget::execute_forget;
pub use self::relate::{execute_relate, execute_unrelate};
pub use self::related::execute_related;
pub use self::types::execute_types;

use crate::error::{CliError, Result};
use relata_domain::compliance::{compliance_schema, RecordCatalog};
use relata_domain::{AttrValidatorRegistry, EntityRef, EntitySchema};
use relata_store::{SqliteStore, StoreConfig};
use std::sync::Arc;

/// Validator registry over the built-in compliance types.
///
/// Objects live outside this tool, so any id of a known type resolves.
pub fn compliance_registry() -> Arc<AttrValidatorRegistry> {
    let catalog = Arc::new(RecordCatalog::open_world());
    Arc::new(AttrValidatorRegistry::new(Arc::new(compliance_schema(catalog))))
}

/// Open the configured store with the compliance registry.
pub fn open_store(config: &StoreConfig) -> Result<SqliteStore> {
    Ok(SqliteStore::open(config, compliance_registry())?)
}

/// Parse a `Type:id` argument naming a relatable type of `schema`.
pub(crate) fn parse_endpoint(schema: &EntitySchema, input: &str) -> Result<EntityRef> {
    let entity = EntityRef::parse(input).map_err(CliError::InvalidInput)?;

    let relatable = schema
        .descriptor(&entity.type_name)
        .is_some_and(|descriptor| descriptor.is_relatable());

    if !relatable {
        let known: Vec<&str> = schema
            .type_names()
            .into_iter()
            .filter(|name| schema.descriptor(name).is_some_and(|d| d.is_relatable()))
            .collect();
        return Err(CliError::InvalidInput(format!(
            "Unknown entity type '{}'. Expected one of: {}",
            entity.type_name,
            known.join(", ")
        )));
    }

    Ok(entity)
}

#[cfg(test)]
pub(crate) fn test_store() -> SqliteStore {
    SqliteStore::in_memory(compliance_registry()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        let registry = compliance_registry();
        let entity = parse_endpoint(registry.schema(), "Facility:3").unwrap();
        assert_eq!(entity, EntityRef::new("Facility", 3));
    }

    #[test]
    fn test_parse_endpoint_rejects_unknown_and_mixin_types() {
        let registry = compliance_registry();

        let err = parse_endpoint(registry.schema(), "Widget:1").unwrap_err();
        assert!(err.to_string().contains("Facility"));

        assert!(parse_endpoint(registry.schema(), "Assignable:1").is_err());
        assert!(parse_endpoint(registry.schema(), "Facility").is_err());
        assert!(parse_endpoint(registry.schema(), "Facility:x").is_err());
    }
}
