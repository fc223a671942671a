//! Contracts with the record layer and with persistence backends.

use crate::edge::{Edge, EdgeId};
use crate::error::Result;
use crate::id::Xref;
use crate::metadata::SkeletonRow;
use crate::node::{Node, NodeKind};
use crate::record::Record;
use std::sync::Arc;

/// Parsed records the graph is built from.
pub trait RecordSource: Send + Sync {
    /// All records of one kind
    fn records(&self, kind: NodeKind) -> Result<Vec<(Xref, Arc<Record>)>>;

    /// A single record by identifier
    fn record(&self, xref: &Xref) -> Result<Option<Arc<Record>>>;
}

/// Storage the graph reads nodes and edges through.
///
/// Implementations use interior mutability; the graph serializes writers
/// itself, so a backend only has to be safe for concurrent readers and one
/// writer at a time.
pub trait GraphBackend: Send + Sync {
    /// Backend name for logs and metrics
    fn name(&self) -> &str;

    /// True when every node is already held in memory, so callers gain
    /// nothing by memoizing fetched nodes.
    fn is_resident(&self) -> bool {
        false
    }

    fn get_node(&self, xref: &Xref) -> Result<Option<Arc<Node>>>;

    fn get_edge(&self, id: &EdgeId) -> Result<Option<Edge>>;

    /// Edges with `xref` at either end
    fn get_edges_of(&self, xref: &Xref) -> Result<Vec<Edge>>;

    fn put_node(&self, node: Arc<Node>) -> Result<()>;

    fn put_edge(&self, edge: Edge) -> Result<()>;

    fn delete_node(&self, xref: &Xref) -> Result<()>;

    fn delete_edge(&self, id: &EdgeId) -> Result<()>;

    fn put_skeleton(&self, row: SkeletonRow) -> Result<()>;

    fn delete_skeleton(&self, xref: &Xref) -> Result<()>;

    /// Every persisted skeleton row
    fn skeleton(&self) -> Result<Vec<SkeletonRow>>;

    fn node_count(&self) -> Result<usize>;

    fn edge_count(&self) -> Result<usize>;

    /// Make buffered writes durable
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
