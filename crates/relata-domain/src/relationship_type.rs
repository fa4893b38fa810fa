//! Relationship types - descriptive vocabulary for what an edge means
//!
//! A relationship names its type by key only. Nothing checks that the key
//! exists, so a lookup may come back empty.

use serde::{Deserialize, Serialize};

/// Direction in which an edge is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Source to destination
    Forward,
    /// Destination to source
    Backward,
}

/// A named kind of relationship with a phrase for each reading direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipType {
    /// Store-assigned id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Key matched against `Relationship::relationship_type_id`
    pub relationship_type: String,

    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,

    /// Phrase read source to destination (e.g. "is documented by")
    pub forward_phrase: Option<String>,

    /// Phrase read destination to source (e.g. "documents")
    pub backward_phrase: Option<String>,

    /// Whether direction is irrelevant
    pub symmetric: bool,
}

impl RelationshipType {
    /// Create a directional type with no phrases
    pub fn new(relationship_type: impl Into<String>) -> Self {
        Self {
            id: None,
            relationship_type: relationship_type.into(),
            description: None,
            forward_phrase: None,
            backward_phrase: None,
            symmetric: false,
        }
    }

    /// Set both phrases
    pub fn with_phrases(mut self, forward: impl Into<String>, backward: impl Into<String>) -> Self {
        self.forward_phrase = Some(forward.into());
        self.backward_phrase = Some(backward.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the type as symmetric
    pub fn symmetric(mut self) -> Self {
        self.symmetric = true;
        self
    }

    /// Phrase for reading in `direction`
    ///
    /// Symmetric types read the same both ways, so the forward phrase is
    /// used for either direction when present.
    pub fn phrase_for(&self, direction: Direction) -> Option<&str> {
        let forward = self.forward_phrase.as_deref();
        let backward = self.backward_phrase.as_deref();

        match direction {
            Direction::Forward => forward.or(if self.symmetric { backward } else { None }),
            Direction::Backward if self.symmetric => forward.or(backward),
            Direction::Backward => backward,
        }
    }

    /// Publishable view
    pub fn publish(&self) -> PublishedRelationshipType {
        PublishedRelationshipType {
            forward_phrase: self.forward_phrase.clone(),
            backward_phrase: self.backward_phrase.clone(),
            symmetric: self.symmetric,
        }
    }
}

/// The public fields of a relationship type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRelationshipType {
    /// Forward phrase
    pub forward_phrase: Option<String>,
    /// Backward phrase
    pub backward_phrase: Option<String>,
    /// Symmetric flag
    pub symmetric: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directional_phrases() {
        let t = RelationshipType::new("documents").with_phrases("documents", "is documented by");

        assert_eq!(t.phrase_for(Direction::Forward), Some("documents"));
        assert_eq!(t.phrase_for(Direction::Backward), Some("is documented by"));
    }

    #[test]
    fn test_symmetric_reads_the_same_both_ways() {
        let t = RelationshipType::new("related")
            .with_phrases("is related to", "is related to (reverse)")
            .symmetric();

        assert_eq!(t.phrase_for(Direction::Forward), Some("is related to"));
        assert_eq!(t.phrase_for(Direction::Backward), Some("is related to"));
    }

    #[test]
    fn test_missing_phrases() {
        let t = RelationshipType::new("bare");
        assert_eq!(t.phrase_for(Direction::Forward), None);
        assert_eq!(t.phrase_for(Direction::Backward), None);
    }

    #[test]
    fn test_publish_fields() {
        let t = RelationshipType::new("documents")
            .with_description("internal")
            .with_phrases("documents", "is documented by");

        let json = serde_json::to_value(t.publish()).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 3);
        assert_eq!(json["symmetric"], false);
        assert_eq!(json["backward_phrase"], "is documented by");
    }
}
