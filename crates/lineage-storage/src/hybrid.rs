//! Indexed metadata plus blob storage, for graphs too large to keep resident.
//!
//! The index half (skeleton rows, the edge table, the set of stored node
//! ids) stays in memory and is small per node. Node payloads are encoded
//! with bincode into a [`BlobStore`] and decoded on demand through an LRU
//! cache. [`HybridBackend::flush`] writes the index half into the blob
//! store so [`HybridBackend::open`] can restore it later.

use crate::blob::BlobStore;
use crate::codec;
use crate::edges::EdgeTable;
use lineage_core::{Edge, EdgeId, GraphBackend, LineageError, Node, Result, SkeletonRow, Xref};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Blob key holding the persisted index
pub const INDEX_KEY: &str = "index";

/// Default capacity of the decoded-node LRU
pub const DEFAULT_NODE_CACHE_SIZE: usize = 50_000;

fn node_key(xref: &Xref) -> String {
    format!("node/{}", xref)
}

#[derive(Debug, Default)]
struct HybridIndex {
    skeleton: BTreeMap<Xref, SkeletonRow>,
    edges: EdgeTable,
    nodes: BTreeSet<Xref>,
}

/// On-disk form of [`HybridIndex`]
#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    skeleton: Vec<SkeletonRow>,
    edges: Vec<Edge>,
    nodes: Vec<Xref>,
}

/// Counters describing blob traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HybridStatistics {
    pub blob_reads: u64,
    pub blob_writes: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[derive(Default)]
struct Counters {
    blob_reads: AtomicU64,
    blob_writes: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

pub struct HybridBackend<S: BlobStore> {
    store: S,
    index: RwLock<HybridIndex>,
    node_cache: Mutex<LruCache<Xref, Arc<Node>>>,
    counters: Counters,
}

impl<S: BlobStore> HybridBackend<S> {
    /// Empty backend over `store`
    pub fn new(store: S, node_cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(node_cache_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            index: RwLock::new(HybridIndex::default()),
            node_cache: Mutex::new(LruCache::new(capacity)),
            counters: Counters::default(),
        }
    }

    /// Restore a backend whose index was previously flushed into `store`.
    ///
    /// A store without an index opens empty.
    pub fn open(store: S, node_cache_size: usize) -> Result<Self> {
        let backend = Self::new(store, node_cache_size);
        if let Some(bytes) = backend.store.get(INDEX_KEY)? {
            let persisted: PersistedIndex = codec::decode(&bytes)
                .map_err(|e| LineageError::backend(format!("corrupt index: {}", e)))?;
            let mut index = backend.index.write();
            index.skeleton = persisted
                .skeleton
                .into_iter()
                .map(|row| (row.metadata.xref.clone(), row))
                .collect();
            index.edges = EdgeTable::from_edges(persisted.edges);
            index.nodes = persisted.nodes.into_iter().collect();
            info!(
                "Opened hybrid store ({} nodes, {} edges, {} skeleton rows)",
                index.nodes.len(),
                index.edges.len(),
                index.skeleton.len()
            );
        }
        Ok(backend)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn statistics(&self) -> HybridStatistics {
        HybridStatistics {
            blob_reads: self.counters.blob_reads.load(Ordering::Relaxed),
            blob_writes: self.counters.blob_writes.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
        }
    }

    /// Drop decoded nodes; the next read of each goes to the blob store
    pub fn clear_node_cache(&self) {
        self.node_cache.lock().clear();
    }
}

impl<S: BlobStore> GraphBackend for HybridBackend<S> {
    fn name(&self) -> &str {
        "hybrid"
    }

    fn get_node(&self, xref: &Xref) -> Result<Option<Arc<Node>>> {
        if let Some(node) = self.node_cache.lock().get(xref) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(Arc::clone(node)));
        }
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);

        if !self.index.read().nodes.contains(xref) {
            return Ok(None);
        }

        self.counters.blob_reads.fetch_add(1, Ordering::Relaxed);
        let bytes = self.store.get(&node_key(xref))?.ok_or_else(|| {
            LineageError::backend(format!("blob for node {} is missing", xref))
        })?;
        let node: Node = codec::decode(&bytes)
            .map_err(|e| LineageError::backend(format!("corrupt node {}: {}", xref, e)))?;
        let node = Arc::new(node);
        self.node_cache.lock().put(xref.clone(), Arc::clone(&node));
        debug!("Decoded node {} from blob store", xref);
        Ok(Some(node))
    }

    fn get_edge(&self, id: &EdgeId) -> Result<Option<Edge>> {
        Ok(self.index.read().edges.get(id).cloned())
    }

    fn get_edges_of(&self, xref: &Xref) -> Result<Vec<Edge>> {
        Ok(self.index.read().edges.edges_of(xref))
    }

    fn put_node(&self, node: Arc<Node>) -> Result<()> {
        let bytes = codec::encode(node.as_ref())?;
        self.store.put(&node_key(&node.xref), bytes)?;
        self.counters.blob_writes.fetch_add(1, Ordering::Relaxed);
        self.index.write().nodes.insert(node.xref.clone());
        self.node_cache.lock().put(node.xref.clone(), node);
        Ok(())
    }

    fn put_edge(&self, edge: Edge) -> Result<()> {
        self.index.write().edges.insert(edge);
        Ok(())
    }

    fn delete_node(&self, xref: &Xref) -> Result<()> {
        self.store.delete(&node_key(xref))?;
        self.index.write().nodes.remove(xref);
        self.node_cache.lock().pop(xref);
        Ok(())
    }

    fn delete_edge(&self, id: &EdgeId) -> Result<()> {
        self.index.write().edges.remove(id);
        Ok(())
    }

    fn put_skeleton(&self, row: SkeletonRow) -> Result<()> {
        self.index
            .write()
            .skeleton
            .insert(row.metadata.xref.clone(), row);
        Ok(())
    }

    fn delete_skeleton(&self, xref: &Xref) -> Result<()> {
        self.index.write().skeleton.remove(xref);
        Ok(())
    }

    fn skeleton(&self) -> Result<Vec<SkeletonRow>> {
        Ok(self.index.read().skeleton.values().cloned().collect())
    }

    fn node_count(&self) -> Result<usize> {
        Ok(self.index.read().nodes.len())
    }

    fn edge_count(&self) -> Result<usize> {
        Ok(self.index.read().edges.len())
    }

    fn flush(&self) -> Result<()> {
        let persisted = {
            let index = self.index.read();
            PersistedIndex {
                skeleton: index.skeleton.values().cloned().collect(),
                edges: index.edges.values().cloned().collect(),
                nodes: index.nodes.iter().cloned().collect(),
            }
        };
        let bytes = codec::encode(&persisted)?;
        self.store.put(INDEX_KEY, bytes)?;
        self.counters.blob_writes.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Flushed hybrid index ({} skeleton rows, {} edges)",
            persisted.skeleton.len(),
            persisted.edges.len()
        );
        Ok(())
    }
}
