//! Node access shared by every algorithm, whatever backend is active.

use crate::metrics::GraphMetrics;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use lineage_core::{
    Edge, EdgeId, GraphBackend, LineageError, Node, NodeKind, Result, SkeletonRow, Xref,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Read access to nodes by identifier.
///
/// Traversal, path finding, relationship calculation and analytics are
/// written against this trait only.
pub trait NodeLookup {
    /// The node, or `None` if no such identifier exists
    fn node(&self, xref: &Xref) -> Result<Option<Arc<Node>>>;

    /// The node, or `NodeNotFound`
    fn require(&self, xref: &Xref) -> Result<Arc<Node>> {
        self.node(xref)?
            .ok_or_else(|| LineageError::NodeNotFound(xref.clone()))
    }

    /// The node if it is an individual; other kinds are a parameter error
    fn require_individual(&self, xref: &Xref) -> Result<Arc<Node>> {
        let node = self.require(xref)?;
        match node.kind() {
            NodeKind::Individual => Ok(node),
            other => Err(LineageError::invalid_parameter(format!(
                "{} is a {}, not an individual",
                xref, other
            ))),
        }
    }
}

impl NodeLookup for HashMap<Xref, Arc<Node>> {
    fn node(&self, xref: &Xref) -> Result<Option<Arc<Node>>> {
        Ok(self.get(xref).cloned())
    }
}

/// Backend plus a memo of nodes already fetched from it.
///
/// Resident backends are read directly. Other backends are fetched once
/// per identifier and the node is kept until a mutation replaces it.
pub(crate) struct NodeStore {
    backend: Arc<dyn GraphBackend>,
    memo: DashMap<Xref, Arc<Node>>,
    memoize: bool,
    metrics: Arc<GraphMetrics>,
}

impl NodeStore {
    pub(crate) fn new(backend: Arc<dyn GraphBackend>, metrics: Arc<GraphMetrics>) -> Self {
        let memoize = !backend.is_resident();
        Self {
            backend,
            memo: DashMap::new(),
            memoize,
            metrics,
        }
    }

    pub(crate) fn backend(&self) -> &Arc<dyn GraphBackend> {
        &self.backend
    }

    pub(crate) fn is_resident(&self) -> bool {
        !self.memoize
    }

    /// Fetch-or-load-then-memoize.
    ///
    /// A failed fetch leaves the memo untouched.
    pub(crate) fn get(&self, xref: &Xref) -> Result<Option<Arc<Node>>> {
        if !self.memoize {
            self.metrics.record_backend_read();
            return self.backend.get_node(xref).inspect_err(|e| self.fetch_failed(xref, e));
        }

        if let Some(node) = self.memo.get(xref) {
            return Ok(Some(Arc::clone(node.value())));
        }

        // The shard stays locked while fetching, so one identifier is
        // fetched at most once even under concurrent readers.
        match self.memo.entry(xref.clone()) {
            Entry::Occupied(entry) => Ok(Some(Arc::clone(entry.get()))),
            Entry::Vacant(slot) => {
                self.metrics.record_backend_read();
                let fetched = self
                    .backend
                    .get_node(xref)
                    .inspect_err(|e| self.fetch_failed(xref, e))?;
                Ok(fetched.map(|node| {
                    self.metrics.record_node_load();
                    debug!("Materialized node {} from {}", xref, self.backend.name());
                    slot.insert(Arc::clone(&node));
                    node
                }))
            }
        }
    }

    fn fetch_failed(&self, xref: &Xref, err: &LineageError) {
        self.metrics.record_backend_error();
        warn!("Fetching node {} from {} failed: {}", xref, self.backend.name(), err);
    }

    pub(crate) fn is_materialized(&self, xref: &Xref) -> bool {
        !self.memoize || self.memo.contains_key(xref)
    }

    pub(crate) fn materialized_count(&self) -> usize {
        if self.memoize {
            self.memo.len()
        } else {
            self.backend.node_count().unwrap_or_default()
        }
    }

    pub(crate) fn put_node(&self, node: Arc<Node>) -> Result<()> {
        self.metrics.record_backend_write();
        self.backend.put_node(Arc::clone(&node))?;
        if self.memoize {
            self.memo.insert(node.xref.clone(), node);
        }
        Ok(())
    }

    pub(crate) fn delete_node(&self, xref: &Xref) -> Result<()> {
        self.metrics.record_backend_write();
        self.backend.delete_node(xref)?;
        self.memo.remove(xref);
        Ok(())
    }

    pub(crate) fn put_edge(&self, edge: Edge) -> Result<()> {
        self.metrics.record_backend_write();
        self.backend.put_edge(edge)
    }

    pub(crate) fn delete_edge(&self, id: &EdgeId) -> Result<()> {
        self.metrics.record_backend_write();
        self.backend.delete_edge(id)
    }

    pub(crate) fn put_skeleton(&self, row: SkeletonRow) -> Result<()> {
        self.metrics.record_backend_write();
        self.backend.put_skeleton(row)
    }

    pub(crate) fn delete_skeleton(&self, xref: &Xref) -> Result<()> {
        self.metrics.record_backend_write();
        self.backend.delete_skeleton(xref)
    }
}
