//! Forget command implementation.

use super::parse_endpoint;
use crate::cli::ForgetArgs;
use crate::error::Result;
use crate::output::Formatter;
use relata_domain::traits::RelationshipStore;
use relata_domain::EntityRef;
use relata_store::SqliteStore;
use std::io::{self, Write};

/// Execute the forget command.
///
/// Deletes every relationship the entities appear in, as when the
/// entities themselves are deleted. All entities go in one transaction.
pub fn execute_forget(args: ForgetArgs, store: &mut SqliteStore, formatter: &Formatter) -> Result<()> {
    let schema = store.registry().schema().clone();
    let entities = args
        .entities
        .iter()
        .map(|input| parse_endpoint(&schema, input))
        .collect::<Result<Vec<EntityRef>>>()?;

    // Confirm deletion unless --yes is specified
    if !args.yes && !confirm(&entities)? {
        println!("{}", formatter.info("Operation cancelled"));
        return Ok(());
    }

    let deleted = store.delete_entities(&entities)?;

    println!("{}", formatter.bulk_result("Deleted", deleted));
    Ok(())
}

fn confirm(entities: &[EntityRef]) -> Result<bool> {
    println!("About to delete every relationship of {} entit(ies):", entities.len());
    for entity in entities {
        println!("  - {}", entity);
    }
    print!("Continue? [y/N] ");
    io::stdout().flush()?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_store;
    use crate::config::OutputFormat;
    use relata_domain::{Relatable, Relationship};

    #[test]
    fn test_forget_cascades() {
        let mut store = test_store();
        let formatter = Formatter::new(OutputFormat::Table, false);
        let facility = EntityRef::new("Facility", 1);

        store
            .create_relationship(&Relationship::new(&facility, &EntityRef::new("Person", 2)))
            .unwrap();
        store
            .create_relationship(&Relationship::new(&EntityRef::new("Program", 3), &facility))
            .unwrap();
        store
            .create_relationship(&Relationship::new(
                &EntityRef::new("Program", 3),
                &EntityRef::new("Control", 4),
            ))
            .unwrap();

        let args = ForgetArgs {
            entities: vec!["Facility:1".to_string()],
            yes: true,
        };
        execute_forget(args, &mut store, &formatter).unwrap();

        assert_eq!(store.count_relationships().unwrap(), 1);
        assert!(facility.related_edges(&store).unwrap().is_empty());
    }

    #[test]
    fn test_forget_several_entities() {
        let mut store = test_store();
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let facility = EntityRef::new("Facility", 1);
        let person = EntityRef::new("Person", 2);

        store.create_relationship(&Relationship::new(&facility, &person)).unwrap();
        store
            .create_relationship(&Relationship::new(&person, &EntityRef::new("Request", 3)))
            .unwrap();
        store
            .create_relationship(&Relationship::new(
                &EntityRef::new("Policy", 4),
                &EntityRef::new("Control", 5),
            ))
            .unwrap();

        let args = ForgetArgs {
            entities: vec!["Facility:1".to_string(), "Person:2".to_string()],
            yes: true,
        };
        execute_forget(args, &mut store, &formatter).unwrap();

        assert_eq!(store.count_relationships().unwrap(), 1);
        assert!(person.related_edges(&store).unwrap().is_empty());
    }

    #[test]
    fn test_forget_validates_all_entities_first() {
        let mut store = test_store();
        let formatter = Formatter::new(OutputFormat::Table, false);
        store
            .create_relationship(&Relationship::new(
                &EntityRef::new("Facility", 1),
                &EntityRef::new("Person", 2),
            ))
            .unwrap();

        let args = ForgetArgs {
            entities: vec!["Facility:1".to_string(), "bogus".to_string()],
            yes: true,
        };
        assert!(execute_forget(args, &mut store, &formatter).is_err());
        assert_eq!(store.count_relationships().unwrap(), 1);
    }
}
