//! Relate and unrelate command implementations.

use super::parse_endpoint;
use crate::cli::{RelateArgs, UnrelateArgs};
use crate::error::Result;
use crate::output::Formatter;
use relata_domain::traits::RelationshipStore;
use relata_domain::{Relationship, RelationshipId};
use relata_store::SqliteStore;
use std::sync::Arc;

/// Execute the relate command.
pub fn execute_relate(args: RelateArgs, store: &mut SqliteStore, formatter: &Formatter) -> Result<()> {
    let relationship = build_relationship(&args, store)?;
    let id = store.create_relationship(&relationship)?;

    println!("{}", formatter.created(&relationship.with_id(id)));
    Ok(())
}

/// Build the relationship, checking each attribute as it is set.
fn build_relationship(args: &RelateArgs, store: &SqliteStore) -> Result<Relationship> {
    let registry = Arc::clone(store.registry());
    let source = parse_endpoint(registry.schema(), &args.source)?;
    let destination = parse_endpoint(registry.schema(), &args.destination)?;

    let mut relationship = Relationship::new(&source, &destination);
    if let Some(key) = &args.relationship_type {
        relationship = relationship.with_relationship_type(key.as_str());
    }
    if let Some(automapping) = args.automapping {
        relationship = relationship.with_automapping(RelationshipId::from_value(automapping));
    }

    for (name, value) in &args.attrs {
        relationship.set_attr(&registry, name.as_str(), value.as_str())?;
    }

    Ok(relationship)
}

/// Execute the unrelate command.
pub fn execute_unrelate(args: UnrelateArgs, store: &mut SqliteStore, formatter: &Formatter) -> Result<()> {
    let mut deleted = 0;
    for id in &args.ids {
        if store.delete_relationship(RelationshipId::from_value(*id))? {
            deleted += 1;
        } else {
            eprintln!("{}", formatter.warning(&format!("Relationship {} not found", id)));
        }
    }

    println!("{}", formatter.bulk_result("Deleted", deleted));
    Ok(())
}
