//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use relata_domain::{AttrMap, Direction, EntityRef, Relationship, RelationshipId, RelationshipType};
use serde_json::{json, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// One incident edge of an entity, as the `related` command shows it.
#[derive(Debug, Clone)]
pub struct RelatedRow {
    /// `Forward` when the entity is the source
    pub direction: Direction,

    /// The edge
    pub relationship: Relationship,

    /// Phrase of the edge's relationship type for this reading, if known
    pub phrase: Option<String>,
}

impl RelatedRow {
    /// The endpoint that is not the entity
    pub fn other(&self) -> Option<&EntityRef> {
        match self.direction {
            Direction::Forward => self.relationship.destination_ref(),
            Direction::Backward => self.relationship.source_ref(),
        }
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Good,
    Note,
    Caution,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format relationships.
    pub fn format_relationships(&self, relationships: &[Relationship]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values = relationships
                    .iter()
                    .map(relationship_json)
                    .collect::<Result<Vec<_>>>()?;
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Table => Ok(self.relationships_table(relationships)),
            OutputFormat::Quiet => Ok(ids(relationships.iter())),
        }
    }

    /// Format a single relationship.
    pub fn format_relationship(&self, relationship: &Relationship) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&relationship_json(relationship)?)?),
            _ => self.format_relationships(std::slice::from_ref(relationship)),
        }
    }

    /// Format an entity's incident edges.
    pub fn format_related(&self, entity: &EntityRef, rows: &[RelatedRow]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let pick = |direction: Direction| -> Result<Vec<Value>> {
                    rows.iter()
                        .filter(|row| row.direction == direction)
                        .map(|row| relationship_json(&row.relationship))
                        .collect()
                };
                let value = json!({
                    "entity": entity,
                    "related_sources": pick(Direction::Backward)?,
                    "related_destinations": pick(Direction::Forward)?,
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => Ok(self.related_table(entity, rows)),
            OutputFormat::Quiet => Ok(ids(rows.iter().map(|row| &row.relationship))),
        }
    }

    /// Format relationship types.
    pub fn format_relationship_types(&self, types: &[RelationshipType]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(types)?),
            OutputFormat::Table => Ok(self.types_table(types)),
            OutputFormat::Quiet => Ok(types
                .iter()
                .map(|t| t.relationship_type.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn relationships_table(&self, relationships: &[Relationship]) -> String {
        if relationships.is_empty() {
            return self.colorize("No relationships found.", Tone::Caution);
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Source", "Destination", "Type", "Attributes"]);

        for relationship in relationships {
            builder.push_record([
                display_id(relationship.id()),
                display_ref(relationship.source_ref()),
                display_ref(relationship.destination_ref()),
                relationship.relationship_type_id.clone().unwrap_or_else(|| "-".to_string()),
                display_attrs(relationship.attrs()),
            ]);
        }

        render(builder)
    }

    fn related_table(&self, entity: &EntityRef, rows: &[RelatedRow]) -> String {
        if rows.is_empty() {
            return self.colorize(&format!("{} has no relationships.", entity), Tone::Caution);
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Direction", "Other", "Reads", "Attributes"]);

        for row in rows {
            let direction = match row.direction {
                Direction::Forward => "outgoing",
                Direction::Backward => "incoming",
            };
            builder.push_record([
                display_id(row.relationship.id()),
                direction.to_string(),
                display_ref(row.other()),
                row.phrase.clone().unwrap_or_else(|| "-".to_string()),
                display_attrs(row.relationship.attrs()),
            ]);
        }

        render(builder)
    }

    fn types_table(&self, types: &[RelationshipType]) -> String {
        if types.is_empty() {
            return self.colorize("No relationship types defined.", Tone::Caution);
        }

        let mut builder = Builder::default();
        builder.push_record(["Key", "Forward", "Backward", "Symmetric", "Description"]);

        for t in types {
            builder.push_record([
                t.relationship_type.clone(),
                t.forward_phrase.clone().unwrap_or_else(|| "-".to_string()),
                t.backward_phrase.clone().unwrap_or_else(|| "-".to_string()),
                if t.symmetric { "yes" } else { "no" }.to_string(),
                t.description.clone().unwrap_or_default(),
            ]);
        }

        render(builder)
    }

    /// Report a created relationship (just the id in quiet mode).
    pub fn created(&self, relationship: &Relationship) -> String {
        match (self.format, relationship.id()) {
            (OutputFormat::Quiet, Some(id)) => id.to_string(),
            _ => self.success(&format!(
                "Related {} (id {})",
                relationship,
                display_id(relationship.id())
            )),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), Tone::Good)
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), Tone::Note)
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), Tone::Caution)
    }

    /// Format bulk operation result.
    pub fn bulk_result(&self, operation: &str, count: usize) -> String {
        self.success(&format!("{} {} relationship(s)", operation, count))
    }

    fn colorize(&self, text: &str, tone: Tone) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match tone {
            Tone::Good => text.green().to_string(),
            Tone::Note => text.blue().to_string(),
            Tone::Caution => text.yellow().to_string(),
        }
    }
}

/// Published fields plus the store-side ids.
fn relationship_json(relationship: &Relationship) -> Result<Value> {
    let mut value = serde_json::to_value(relationship.publish())?;
    if let Some(object) = value.as_object_mut() {
        object.insert("id".to_string(), json!(relationship.id().map(|id| id.value())));
        object.insert(
            "automapping_id".to_string(),
            json!(relationship.automapping_id.map(|id| id.value())),
        );
    }
    Ok(value)
}

fn ids<'a>(relationships: impl Iterator<Item = &'a Relationship>) -> String {
    relationships
        .filter_map(|r| r.id())
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn display_id(id: Option<RelationshipId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

fn display_ref(endpoint: Option<&EntityRef>) -> String {
    endpoint.map(ToString::to_string).unwrap_or_else(|| "None:None".to_string())
}

fn display_attrs(attrs: &AttrMap) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: i64, source: (&str, i64), destination: (&str, i64)) -> Relationship {
        Relationship::from_stored(
            RelationshipId::from_value(id),
            EntityRef::new(source.0, source.1),
            EntityRef::new(destination.0, destination.1),
            Some("assigned".to_string()),
            None,
            AttrMap::default(),
        )
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter
            .format_relationships(&[stored(1, ("Facility", 1), ("Person", 2))])
            .unwrap();

        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["source"]["type"], "Facility");
        assert_eq!(value[0]["relationship_type_id"], "assigned");
        assert!(value[0]["automapping_id"].is_null());
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter
            .format_relationships(&[
                stored(1, ("Facility", 1), ("Person", 2)),
                stored(5, ("Program", 1), ("Control", 2)),
            ])
            .unwrap();
        assert_eq!(output, "1\n5");
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_relationships(&[stored(1, ("Facility", 1), ("Person", 2))])
            .unwrap();
        assert!(output.contains("Destination"));
        assert!(output.contains("Facility:1"));
        assert!(output.contains("assigned"));
    }

    #[test]
    fn test_empty_relationships() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_relationships(&[]).unwrap();
        assert!(output.contains("No relationships found"));
    }

    #[test]
    fn test_related_json_splits_views() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let entity = EntityRef::new("Facility", 1);
        let rows = vec![
            RelatedRow {
                direction: Direction::Forward,
                relationship: stored(1, ("Facility", 1), ("Person", 2)),
                phrase: None,
            },
            RelatedRow {
                direction: Direction::Backward,
                relationship: stored(2, ("Program", 3), ("Facility", 1)),
                phrase: Some("is scoped by".to_string()),
            },
        ];

        let value: Value = serde_json::from_str(&formatter.format_related(&entity, &rows).unwrap()).unwrap();
        assert_eq!(value["related_destinations"][0]["id"], 1);
        assert_eq!(value["related_sources"][0]["id"], 2);
        assert_eq!(rows[1].other(), Some(&EntityRef::new("Program", 3)));
    }

    #[test]
    fn test_created_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        assert_eq!(formatter.created(&stored(9, ("Facility", 1), ("Person", 2))), "9");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
    }
}
