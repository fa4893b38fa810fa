//! Relationship type command implementation.

use crate::cli::{TypesAction, TypesArgs};
use crate::error::Result;
use crate::output::Formatter;
use relata_domain::traits::RelationshipStore;
use relata_domain::RelationshipType;
use relata_store::SqliteStore;

/// Execute the types command.
pub fn execute_types(args: TypesArgs, store: &mut SqliteStore, formatter: &Formatter) -> Result<()> {
    match args.action {
        TypesAction::Add {
            key,
            forward,
            backward,
            description,
            symmetric,
        } => {
            let relationship_type = RelationshipType {
                forward_phrase: forward,
                backward_phrase: backward,
                description,
                symmetric,
                ..RelationshipType::new(key)
            };
            let id = store.save_relationship_type(&relationship_type)?;
            println!(
                "{}",
                formatter.success(&format!(
                    "Saved relationship type {} (id {})",
                    relationship_type.relationship_type, id
                ))
            );
        }
        TypesAction::List => {
            let types = store.list_relationship_types()?;
            println!("{}", formatter.format_relationship_types(&types)?);
        }
        TypesAction::Remove { key } => {
            if store.delete_relationship_type(&key)? {
                println!("{}", formatter.success(&format!("Removed relationship type {}", key)));
            } else {
                eprintln!("{}", formatter.warning(&format!("No relationship type {}", key)));
            }
        }
    }

    Ok(())
}
