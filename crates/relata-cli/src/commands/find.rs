//! Find, show and list command implementations.

use super::parse_endpoint;
use crate::cli::{FindArgs, ListArgs, ShowArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use relata_domain::traits::{RelationshipQuery, RelationshipStore};
use relata_domain::RelationshipId;
use relata_store::SqliteStore;

/// Execute the find command.
pub fn execute_find(args: FindArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let schema = store.registry().schema();
    let a = parse_endpoint(schema, &args.a)?;
    let b = parse_endpoint(schema, &args.b)?;

    match store.find_related(&a, &b)? {
        Some(relationship) => println!("{}", formatter.format_relationship(&relationship)?),
        None => eprintln!("{}", formatter.info(&format!("No relationship between {} and {}", a, b))),
    }

    Ok(())
}

/// Execute the show command.
pub fn execute_show(args: ShowArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let relationship = store
        .get_relationship(RelationshipId::from_value(args.id))?
        .ok_or_else(|| CliError::NotFound(format!("relationship {}", args.id)))?;

    println!("{}", formatter.format_relationship(&relationship)?);
    Ok(())
}

/// Execute the list command.
pub fn execute_list(args: ListArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let relationships = store.query_relationships(&list_query(args))?;
    println!("{}", formatter.format_relationships(&relationships)?);
    Ok(())
}

fn list_query(args: ListArgs) -> RelationshipQuery {
    RelationshipQuery {
        source_type: args.source_type,
        destination_type: args.destination_type,
        relationship_type_id: args.relationship_type,
        automapped_only: args.automapped,
        limit: args.limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_store;
    use crate::config::OutputFormat;
    use relata_domain::{EntityRef, Relationship};

    #[test]
    fn test_show_missing_relationship() {
        let store = test_store();
        let formatter = Formatter::new(OutputFormat::Json, false);

        let err = execute_show(ShowArgs { id: 12 }, &store, &formatter).unwrap_err();
        assert_eq!(err.to_string(), "Not found: relationship 12");
    }

    #[test]
    fn test_find_in_either_direction() {
        let mut store = test_store();
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        store
            .create_relationship(&Relationship::new(
                &EntityRef::new("Policy", 1),
                &EntityRef::new("Control", 2),
            ))
            .unwrap();

        let args = FindArgs {
            a: "Control:2".to_string(),
            b: "Policy:1".to_string(),
        };
        assert!(execute_find(args, &store, &formatter).is_ok());

        let args = FindArgs {
            a: "Control:2".to_string(),
            b: "Gadget:1".to_string(),
        };
        assert!(matches!(
            execute_find(args, &store, &formatter),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_list_query_mapping() {
        let query = list_query(ListArgs {
            source_type: Some("Program".to_string()),
            destination_type: None,
            relationship_type: Some("contains".to_string()),
            automapped: true,
            limit: Some(3),
        });

        assert_eq!(query.source_type.as_deref(), Some("Program"));
        assert_eq!(query.relationship_type_id.as_deref(), Some("contains"));
        assert!(query.automapped_only);
        assert_eq!(query.limit, Some(3));
    }
}
