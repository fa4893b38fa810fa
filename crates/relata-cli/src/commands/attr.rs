//! Attribute command implementation.

use crate::cli::{AttrAction, AttrArgs};
use crate::error::Result;
use crate::output::Formatter;
use relata_domain::traits::RelationshipStore;
use relata_domain::RelationshipId;
use relata_store::SqliteStore;

/// Execute the attr command.
pub fn execute_attr(args: AttrArgs, store: &mut SqliteStore, formatter: &Formatter) -> Result<()> {
    match args.action {
        AttrAction::Set { id, name, value } => {
            let previous = store.set_attr(RelationshipId::from_value(id), &name, &value)?;
            let message = match previous {
                Some(previous) => format!("Set {}={} on relationship {} (was {})", name, value, id, previous),
                None => format!("Set {}={} on relationship {}", name, value, id),
            };
            println!("{}", formatter.success(&message));
        }
        AttrAction::Remove { id, name } => {
            match store.remove_attr(RelationshipId::from_value(id), &name)? {
                Some(_) => println!(
                    "{}",
                    formatter.success(&format!("Removed {} from relationship {}", name, id))
                ),
                None => eprintln!(
                    "{}",
                    formatter.warning(&format!("Relationship {} has no attribute {}", id, name))
                ),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_store;
    use crate::config::OutputFormat;
    use crate::error::CliError;
    use relata_domain::{EntityRef, Relationship};

    fn set(id: i64, name: &str, value: &str) -> AttrArgs {
        AttrArgs {
            action: AttrAction::Set {
                id,
                name: name.to_string(),
                value: value.to_string(),
            },
        }
    }

    #[test]
    fn test_set_and_remove() {
        let mut store = test_store();
        let formatter = Formatter::new(OutputFormat::Table, false);
        let id = store
            .create_relationship(&Relationship::new(
                &EntityRef::new("Request", 1),
                &EntityRef::new("Person", 2),
            ))
            .unwrap();

        execute_attr(set(id.value(), "AssigneeType", "Requester"), &mut store, &formatter).unwrap();
        assert_eq!(
            store.get_relationship(id).unwrap().unwrap().attr("AssigneeType"),
            Some("Requester")
        );

        let remove = AttrArgs {
            action: AttrAction::Remove {
                id: id.value(),
                name: "AssigneeType".to_string(),
            },
        };
        execute_attr(remove, &mut store, &formatter).unwrap();
        assert!(store.get_relationship(id).unwrap().unwrap().attrs().is_empty());
    }

    #[test]
    fn test_set_unauthorised_attr() {
        let mut store = test_store();
        let formatter = Formatter::new(OutputFormat::Table, false);
        let id = store
            .create_relationship(&Relationship::new(
                &EntityRef::new("Person", 1),
                &EntityRef::new("Person", 2),
            ))
            .unwrap();

        let err = execute_attr(set(id.value(), "AssigneeType", "Assignee"), &mut store, &formatter)
            .unwrap_err();
        assert!(matches!(err, CliError::Store(_)));
        assert_eq!(err.to_string(), "Invalid attribute AssigneeType: Assignee");
    }
}
