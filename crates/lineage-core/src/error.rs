//! Error types for the lineage engine.

use crate::edge::EdgeId;
use crate::id::Xref;

/// Result type alias for lineage operations.
pub type Result<T> = std::result::Result<T, LineageError>;

/// Main error type for the lineage engine.
#[derive(Debug, thiserror::Error)]
pub enum LineageError {
    /// A node identifier does not exist in the graph
    #[error("Node not found: {0}")]
    NodeNotFound(Xref),

    /// A node identifier is already taken
    #[error("Duplicate node: {0}")]
    DuplicateNode(Xref),

    /// An edge names an endpoint that does not exist
    #[error("Dangling edge reference: {edge} points at missing node {missing}")]
    DanglingEdgeReference { edge: EdgeId, missing: Xref },

    /// The edge to remove does not exist
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// The edge to add already exists
    #[error("Duplicate edge: {0}")]
    DuplicateEdge(EdgeId),

    /// The edge is structurally impossible (wrong endpoint kinds, occupied slot)
    #[error("Invalid edge {edge}: {reason}")]
    InvalidEdge { edge: EdgeId, reason: String },

    /// A query parameter is out of range or meaningless
    #[error("Invalid query parameter: {0}")]
    InvalidQueryParameter(String),

    /// The persistence backend could not service a request
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The record source failed while being read
    #[error("Record source error: {0}")]
    RecordSource(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binary encoding errors
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped anyhow errors for compatibility
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LineageError {
    /// Create a new node-not-found error
    pub fn node_not_found(xref: impl Into<Xref>) -> Self {
        Self::NodeNotFound(xref.into())
    }

    /// Create a new duplicate-node error
    pub fn duplicate_node(xref: impl Into<Xref>) -> Self {
        Self::DuplicateNode(xref.into())
    }

    /// Create a new dangling-reference error
    pub fn dangling(edge: EdgeId, missing: impl Into<Xref>) -> Self {
        Self::DanglingEdgeReference {
            edge,
            missing: missing.into(),
        }
    }

    /// Create a new invalid-edge error
    pub fn invalid_edge(edge: EdgeId, reason: impl Into<String>) -> Self {
        Self::InvalidEdge {
            edge,
            reason: reason.into(),
        }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidQueryParameter(msg.into())
    }

    /// Create a new backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Create a new record source error
    pub fn record_source(msg: impl Into<String>) -> Self {
        Self::RecordSource(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Check if this is a node-not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NodeNotFound(_) | Self::EdgeNotFound(_))
    }

    /// Check if this is a duplicate node or edge
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateNode(_) | Self::DuplicateEdge(_))
    }

    /// Check if this is an invalid parameter error
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidQueryParameter(_))
    }

    /// Check if this is a backend error
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeKind;

    #[test]
    fn test_error_display() {
        let err = LineageError::node_not_found("I1");
        assert_eq!(err.to_string(), "Node not found: I1");

        let edge = EdgeId::new(EdgeKind::Child, "F1", "I9");
        let err = LineageError::dangling(edge, "I9");
        assert_eq!(
            err.to_string(),
            "Dangling edge reference: F1-CHIL->I9 points at missing node I9"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(LineageError::node_not_found("I1").is_not_found());
        assert!(LineageError::duplicate_node("I1").is_duplicate());
        assert!(LineageError::invalid_parameter("negative").is_invalid_parameter());
        assert!(LineageError::backend("down").is_backend());
        assert!(!LineageError::config("bad").is_backend());
    }
}
