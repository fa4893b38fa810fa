//! Related command implementation.

use super::parse_endpoint;
use crate::cli::{DirectionArg, RelatedArgs};
use crate::error::Result;
use crate::output::{Formatter, RelatedRow};
use relata_domain::traits::RelationshipStore;
use relata_domain::{Direction, EntityRef, Relatable, Relationship, RelationshipType};
use relata_store::SqliteStore;
use std::collections::HashMap;

/// Execute the related command.
pub fn execute_related(args: RelatedArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let entity = parse_endpoint(store.registry().schema(), &args.entity)?;

    let types: HashMap<String, RelationshipType> = store
        .list_relationship_types()?
        .into_iter()
        .map(|t| (t.relationship_type.clone(), t))
        .collect();

    let rows = related_rows(&entity, store, args.direction, &types)?;
    println!("{}", formatter.format_related(&entity, &rows)?);
    Ok(())
}

/// Incident edges of `entity`, outgoing first.
fn related_rows(
    entity: &EntityRef,
    store: &SqliteStore,
    direction: DirectionArg,
    types: &HashMap<String, RelationshipType>,
) -> Result<Vec<RelatedRow>> {
    let mut rows = Vec::new();

    if direction.includes_destinations() {
        for relationship in entity.related_destinations(store)? {
            rows.push(row(Direction::Forward, relationship, types));
        }
    }

    if direction.includes_sources() {
        for relationship in entity.related_sources(store)? {
            rows.push(row(Direction::Backward, relationship, types));
        }
    }

    Ok(rows)
}

fn row(
    direction: Direction,
    relationship: Relationship,
    types: &HashMap<String, RelationshipType>,
) -> RelatedRow {
    let phrase = relationship
        .relationship_type_id
        .as_ref()
        .and_then(|key| types.get(key))
        .and_then(|t| t.phrase_for(direction))
        .map(str::to_string);

    RelatedRow {
        direction,
        relationship,
        phrase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_store;

    #[test]
    fn test_related_rows_read_from_the_entity() {
        let mut store = test_store();
        let policy = EntityRef::new("Policy", 1);
        let control = EntityRef::new("Control", 2);
        let program = EntityRef::new("Program", 3);

        store
            .save_relationship_type(&RelationshipType::new("covers").with_phrases("covers", "is covered by"))
            .unwrap();
        store
            .create_relationship(&Relationship::new(&policy, &control).with_relationship_type("covers"))
            .unwrap();
        store
            .create_relationship(&Relationship::new(&program, &policy).with_relationship_type("unknown"))
            .unwrap();

        let types: HashMap<String, RelationshipType> = store
            .list_relationship_types()
            .unwrap()
            .into_iter()
            .map(|t| (t.relationship_type.clone(), t))
            .collect();

        let rows = related_rows(&policy, &store, DirectionArg::Both, &types).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].direction, Direction::Forward);
        assert_eq!(rows[0].other(), Some(&control));
        assert_eq!(rows[0].phrase.as_deref(), Some("covers"));
        assert_eq!(rows[1].other(), Some(&program));
        assert_eq!(rows[1].phrase, None);

        let rows = related_rows(&control, &store, DirectionArg::Sources, &types).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].phrase.as_deref(), Some("is covered by"));

        let rows = related_rows(&control, &store, DirectionArg::Destinations, &types).unwrap();
        assert!(rows.is_empty());
    }
}
