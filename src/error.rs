//! Errors produced by schema edit operations.

use crate::types::{LinkId, NodeId};
use thiserror::Error;

/// Result type for schema edit operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while editing a [`Schema`](crate::types::Schema).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A referenced node is not part of the schema.
    #[error("Node {0} does not exist")]
    NodeNotFound(NodeId),

    /// A card with this id is already part of the schema.
    #[error("Node {0} already exists")]
    DuplicateNode(NodeId),

    /// Two links share the same id.
    #[error("Link {0} appears more than once")]
    DuplicateLinkId(LinkId),

    /// A referenced link is not part of the schema.
    #[error("Link {0} does not exist")]
    LinkNotFound(LinkId),

    /// Both ends of a link point at the same card.
    #[error("A card cannot be linked to itself ({0})")]
    SelfLink(NodeId),

    /// The two cards are already joined by a link.
    #[error("Cards {0} and {1} are already linked")]
    DuplicateLink(NodeId, NodeId),

    /// Both cards declare a measurement unit and the units differ.
    #[error("These cards use different units ({source_unit} vs {target_unit}) and can't be linked yet")]
    UnitMismatch {
        /// Unit declared by the source card
        source_unit: String,
        /// Unit declared by the target card
        target_unit: String,
    },

    /// The text is not a valid schema document.
    #[error("Invalid schema JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn error_display() {
        let err = SchemaError::UnitMismatch {
            source_unit: "PPM".into(),
            target_unit: "pH".into(),
        };
        let text = err.to_string();
        assert!(text.contains("PPM"));
        assert!(text.contains("pH"));

        let id = Uuid::new_v4();
        assert!(SchemaError::NodeNotFound(id).to_string().contains(&id.to_string()));
        assert!(SchemaError::DuplicateNode(id).to_string().contains("already exists"));
    }

    #[test]
    fn json_errors_convert() {
        let err: SchemaError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, SchemaError::Json(_)));
        assert!(err.to_string().starts_with("Invalid schema JSON"));
    }
}
