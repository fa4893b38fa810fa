//! Entity module - anything that can sit at either end of a relationship

use serde::{Deserialize, Serialize};
use std::fmt;

/// An object that can be an endpoint of a relationship.
///
/// Endpoints are identified by a type tag (the concrete type's name) and an
/// integer id. Relationships never hold typed references; they hold this pair
/// and resolve it back through the [`EntitySchema`](crate::EntitySchema).
pub trait Entity: fmt::Debug + Send + Sync {
    /// Type tag of the concrete type (e.g. `"Facility"`)
    fn type_name(&self) -> &str;

    /// Identity within the type
    fn id(&self) -> i64;

    /// Owned `(type, id)` reference to this entity
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.type_name(), self.id())
    }
}

/// Owned reference to a typed endpoint
///
/// # Examples
///
/// ```
/// use relata_domain::EntityRef;
///
/// let facility = EntityRef::parse("Facility:7").unwrap();
/// assert_eq!(facility.type_name, "Facility");
/// assert_eq!(facility.id, 7);
/// assert_eq!(facility.to_string(), "Facility:7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Type tag
    #[serde(rename = "type")]
    pub type_name: String,

    /// Identity within the type
    pub id: i64,
}

impl EntityRef {
    /// Create a reference from a type tag and id
    pub fn new(type_name: impl Into<String>, id: i64) -> Self {
        Self {
            type_name: type_name.into(),
            id,
        }
    }

    /// Parse a `Type:id` string
    pub fn parse(s: &str) -> Result<Self, String> {
        let (type_name, id) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("Expected Type:id, got '{}'", s))?;

        if type_name.is_empty() {
            return Err(format!("Missing type in '{}'", s));
        }

        let id = id
            .parse::<i64>()
            .map_err(|e| format!("Invalid id in '{}': {}", s, e))?;

        Ok(Self::new(type_name, id))
    }
}

impl Entity for EntityRef {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn entity_ref(&self) -> EntityRef {
        self.clone()
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.id)
    }
}
