//! Core types and contracts for the lineage relationship query engine.
//!
//! This crate provides the node/edge vocabulary, the record source and
//! persistence backend contracts, error handling and configuration shared by
//! the storage and query crates.

pub mod config;
pub mod edge;
pub mod error;
pub mod id;
pub mod metadata;
pub mod node;
pub mod record;
pub mod telemetry;
pub mod traits;

pub use config::GraphConfig;
pub use edge::{Edge, EdgeId, EdgeKind};
pub use error::{LineageError, Result};
pub use id::Xref;
pub use metadata::{ComponentId, FilterAttributes, NodeMetadata, SkeletonRow};
pub use node::{FamilyLinks, Node, NodeKind};
pub use record::{
    FamilyRecord, IndividualRecord, NoteRecord, Record, RecordSet, Reference, RepositoryRecord,
    Sex, SourceRecord,
};
pub use traits::{GraphBackend, RecordSource};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::GraphConfig;
    pub use crate::edge::{Edge, EdgeId, EdgeKind};
    pub use crate::error::{LineageError, Result};
    pub use crate::id::Xref;
    pub use crate::metadata::{ComponentId, FilterAttributes, NodeMetadata, SkeletonRow};
    pub use crate::node::{FamilyLinks, Node, NodeKind};
    pub use crate::record::{FamilyRecord, IndividualRecord, Record, RecordSet, Sex};
    pub use crate::traits::{GraphBackend, RecordSource};
}
