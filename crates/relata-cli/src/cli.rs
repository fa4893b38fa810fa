//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Relata CLI - Record and query typed relationships between compliance objects.
///
/// Entities are written as `Type:id`, e.g. `Facility:3`.
#[derive(Debug, Parser)]
#[command(name = "relata")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RELATA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured one
    #[arg(long, global = true, env = "RELATA_DB")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a relationship from one entity to another
    Relate(RelateArgs),

    /// Find the relationship between two entities, in either direction
    Find(FindArgs),

    /// Show a relationship by id
    Show(ShowArgs),

    /// List relationships
    List(ListArgs),

    /// Set or remove relationship attributes
    Attr(AttrArgs),

    /// Delete relationships by id
    Unrelate(UnrelateArgs),

    /// Show an entity's incident relationships
    Related(RelatedArgs),

    /// Delete every relationship of the given entities
    Forget(ForgetArgs),

    /// Manage relationship types
    Types(TypesArgs),
}

/// Arguments for the relate command.
#[derive(Debug, Parser)]
pub struct RelateArgs {
    /// Source entity (format: Type:id)
    pub source: String,

    /// Destination entity (format: Type:id)
    pub destination: String,

    /// Relationship type key
    #[arg(short = 't', long = "type")]
    pub relationship_type: Option<String>,

    /// Attribute to set (format: name=value, repeatable)
    #[arg(short, long = "attr", value_parser = parse_attr)]
    pub attrs: Vec<(String, String)>,

    /// Id of the relationship this one was derived from
    #[arg(long)]
    pub automapping: Option<i64>,
}

/// Arguments for the find command.
#[derive(Debug, Parser)]
pub struct FindArgs {
    /// First entity (format: Type:id)
    pub a: String,

    /// Second entity (format: Type:id)
    pub b: String,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Relationship id
    pub id: i64,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Filter by source type
    #[arg(long)]
    pub source_type: Option<String>,

    /// Filter by destination type
    #[arg(long)]
    pub destination_type: Option<String>,

    /// Filter by relationship type key
    #[arg(short = 't', long = "type")]
    pub relationship_type: Option<String>,

    /// Only relationships derived from another
    #[arg(long)]
    pub automapped: bool,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for attribute management.
#[derive(Debug, Parser)]
pub struct AttrArgs {
    #[command(subcommand)]
    pub action: AttrAction,
}

/// Attribute actions.
#[derive(Debug, Subcommand)]
pub enum AttrAction {
    /// Insert or replace an attribute
    Set {
        /// Relationship id
        id: i64,
        /// Attribute name
        name: String,
        /// Attribute value
        value: String,
    },

    /// Remove an attribute
    Remove {
        /// Relationship id
        id: i64,
        /// Attribute name
        name: String,
    },
}

/// Arguments for the unrelate command.
#[derive(Debug, Parser)]
pub struct UnrelateArgs {
    /// Relationship ids to delete
    #[arg(required = true)]
    pub ids: Vec<i64>,
}

/// Arguments for the related command.
#[derive(Debug, Parser)]
pub struct RelatedArgs {
    /// Entity (format: Type:id)
    pub entity: String,

    /// Which incident edges to show
    #[arg(short, long, value_enum, default_value = "both")]
    pub direction: DirectionArg,
}

/// Arguments for the forget command.
#[derive(Debug, Parser)]
pub struct ForgetArgs {
    /// Entities whose relationships are deleted (format: Type:id)
    #[arg(required = true)]
    pub entities: Vec<String>,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for relationship type management.
#[derive(Debug, Parser)]
pub struct TypesArgs {
    #[command(subcommand)]
    pub action: TypesAction,
}

/// Relationship type actions.
#[derive(Debug, Subcommand)]
pub enum TypesAction {
    /// Create or update a relationship type
    Add {
        /// Type key
        key: String,
        /// Phrase read source to destination
        #[arg(long)]
        forward: Option<String>,
        /// Phrase read destination to source
        #[arg(long)]
        backward: Option<String>,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// Direction is irrelevant
        #[arg(long)]
        symmetric: bool,
    },

    /// List relationship types
    List,

    /// Delete a relationship type
    Remove {
        /// Type key
        key: String,
    },
}

/// Incident edge selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DirectionArg {
    /// Edges pointing at the entity
    Sources,
    /// Edges leaving the entity
    Destinations,
    /// Both
    Both,
}

impl DirectionArg {
    /// Whether edges pointing at the entity are included
    pub fn includes_sources(self) -> bool {
        matches!(self, DirectionArg::Sources | DirectionArg::Both)
    }

    /// Whether edges leaving the entity are included
    pub fn includes_destinations(self) -> bool {
        matches!(self, DirectionArg::Destinations | DirectionArg::Both)
    }
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

/// Parse a `name=value` attribute argument.
fn parse_attr(input: &str) -> std::result::Result<(String, String), String> {
    match input.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("Invalid attribute '{}'. Expected 'name=value'", input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relate_command() {
        let cli = Cli::parse_from([
            "relata",
            "relate",
            "Facility:1",
            "Person:2",
            "--type",
            "assigned",
            "--attr",
            "AssigneeType=Assignee,Verifier",
        ]);
        match cli.command {
            Command::Relate(args) => {
                assert_eq!(args.source, "Facility:1");
                assert_eq!(args.relationship_type.as_deref(), Some("assigned"));
                assert_eq!(
                    args.attrs,
                    vec![("AssigneeType".to_string(), "Assignee,Verifier".to_string())]
                );
            }
            _ => panic!("Expected Relate command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["relata", "show", "4", "--format", "json", "--no-color"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(cli.no_color);
        assert!(matches!(cli.command, Command::Show(ShowArgs { id: 4 })));
    }

    #[test]
    fn test_attr_subcommands() {
        let cli = Cli::parse_from(["relata", "attr", "set", "3", "AssigneeType", "Verifier"]);
        match cli.command {
            Command::Attr(AttrArgs {
                action: AttrAction::Set { id, name, value },
            }) => {
                assert_eq!(id, 3);
                assert_eq!(name, "AssigneeType");
                assert_eq!(value, "Verifier");
            }
            _ => panic!("Expected attr set"),
        }
    }

    #[test]
    fn test_unrelate_requires_ids() {
        assert!(Cli::try_parse_from(["relata", "unrelate"]).is_err());
    }

    #[test]
    fn test_parse_attr() {
        assert_eq!(parse_attr("k=v=w").unwrap(), ("k".to_string(), "v=w".to_string()));
        assert_eq!(parse_attr("k=").unwrap(), ("k".to_string(), String::new()));
        assert!(parse_attr("novalue").is_err());
        assert!(parse_attr("=v").is_err());
    }

    #[test]
    fn test_direction_arg() {
        assert!(DirectionArg::Both.includes_sources());
        assert!(DirectionArg::Both.includes_destinations());
        assert!(!DirectionArg::Sources.includes_destinations());
        assert!(!DirectionArg::Destinations.includes_sources());
    }
}
