//! The graph instance and its read-side query API.
//!
//! A [`Graph`] owns its skeleton, indexes, cache and node store; nothing is
//! shared between instances. Readers hold a shared lock for the duration of
//! one query, so every query sees one consistent state and the cache epoch
//! cannot move underneath it. Mutations (see `incremental`) take the lock
//! exclusively.

use crate::cache::{CacheStatistics, QueryCache, QueryKey};
use crate::filter::{Filter, Predicate};
use crate::index::IndexManager;
use crate::lazy::Components;
use crate::metrics::{GraphMetrics, MetricsSnapshot};
use crate::path::{self, Path, PathOptions};
use crate::relationship::{self, CommonAncestor, Relationship};
use crate::store::{NodeLookup, NodeStore};
use crate::traversal::{self, Generations, Subtree, SubtreeOptions};
use lineage_core::{
    Edge, FilterAttributes, GraphBackend, GraphConfig, LineageError, Node, NodeKind,
    NodeMetadata, Result, Xref,
};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

/// Everything a graph keeps resident regardless of backend.
#[derive(Debug, Default)]
pub(crate) struct GraphState {
    pub(crate) skeleton: HashMap<Xref, NodeMetadata>,
    pub(crate) components: Components,
    pub(crate) indexes: IndexManager,
    pub(crate) edge_count: usize,
}

/// Node access pinned to one locked state.
pub(crate) struct Snapshot<'a> {
    pub(crate) state: &'a GraphState,
    pub(crate) store: &'a NodeStore,
}

impl NodeLookup for Snapshot<'_> {
    fn node(&self, xref: &Xref) -> Result<Option<Arc<Node>>> {
        if !self.state.skeleton.contains_key(xref) {
            return Ok(None);
        }
        self.store.get(xref)
    }
}

/// A genealogical graph with indexed, cached relationship queries.
///
/// Build one with [`crate::GraphBuilder`] or reopen a persisted one with
/// [`Graph::open_lazy`]. All methods take `&self`; share it behind an `Arc`.
pub struct Graph {
    pub(crate) state: RwLock<GraphState>,
    pub(crate) store: NodeStore,
    pub(crate) cache: QueryCache,
    pub(crate) metrics: Arc<GraphMetrics>,
    pub(crate) config: GraphConfig,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Graph")
            .field("backend", &self.store.backend().name())
            .field("nodes", &state.skeleton.len())
            .field("edges", &state.edge_count)
            .field("components", &state.components.count())
            .finish()
    }
}

fn key(xref: &Xref) -> String {
    xref.to_string()
}

impl Graph {
    pub(crate) fn from_parts(
        state: GraphState,
        backend: Arc<dyn GraphBackend>,
        config: GraphConfig,
        metrics: Arc<GraphMetrics>,
    ) -> Self {
        Self {
            state: RwLock::new(state),
            store: NodeStore::new(backend, Arc::clone(&metrics)),
            cache: QueryCache::new(config.cache.query_cache_size, config.cache.enabled),
            metrics,
            config,
        }
    }

    /// Run `compute` against a consistent snapshot, through the cache
    pub(crate) fn query<T, F>(&self, op: &'static str, params: Vec<String>, compute: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&Snapshot<'_>) -> Result<T>,
    {
        let started = Instant::now();
        let state = self.state.read();
        let snapshot = Snapshot {
            state: &state,
            store: &self.store,
        };
        let key = QueryKey::new(op, params);
        trace!("Query {}", key);
        let result = self.cache.get_or_compute(key, || compute(&snapshot));
        self.metrics.record_query(started.elapsed(), result.is_ok());
        result
    }

    /// Run `f` against a consistent snapshot without caching
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Snapshot<'_>) -> Result<T>) -> Result<T> {
        let state = self.state.read();
        f(&Snapshot {
            state: &state,
            store: &self.store,
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn backend_name(&self) -> String {
        self.store.backend().name().to_string()
    }

    pub fn node(&self, xref: &Xref) -> Result<Option<Arc<Node>>> {
        self.read(|s| s.node(xref))
    }

    pub fn contains(&self, xref: &Xref) -> bool {
        self.state.read().skeleton.contains_key(xref)
    }

    pub fn metadata(&self, xref: &Xref) -> Option<NodeMetadata> {
        self.state.read().skeleton.get(xref).cloned()
    }

    /// Indexed attributes of an individual
    pub fn attributes(&self, xref: &Xref) -> Option<FilterAttributes> {
        self.state.read().indexes.attributes(xref).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().skeleton.len()
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().edge_count
    }

    /// Identifiers of every node of `kind`, in order
    pub fn ids_of_kind(&self, kind: NodeKind) -> BTreeSet<Xref> {
        self.state
            .read()
            .skeleton
            .values()
            .filter(|m| m.kind == kind)
            .map(|m| m.xref.clone())
            .collect()
    }

    pub fn individuals(&self) -> BTreeSet<Xref> {
        self.ids_of_kind(NodeKind::Individual)
    }

    /// Edges touching `xref`, read through the backend
    pub fn edges_of(&self, xref: &Xref) -> Result<Vec<Edge>> {
        let state = self.state.read();
        if !state.skeleton.contains_key(xref) {
            return Err(LineageError::node_not_found(xref.clone()));
        }
        self.metrics.record_backend_read();
        let mut edges = self.store.backend().get_edges_of(xref)?;
        edges.sort_by_key(Edge::id);
        Ok(edges)
    }

    /// Copy of the current indexes
    pub fn index_snapshot(&self) -> IndexManager {
        self.state.read().indexes.clone()
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn parents(&self, xref: &Xref) -> Result<BTreeSet<Xref>> {
        self.query("parents", vec![key(xref)], |s| traversal::parents(s, xref))
    }

    pub fn children(&self, xref: &Xref) -> Result<BTreeSet<Xref>> {
        self.query("children", vec![key(xref)], |s| traversal::children(s, xref))
    }

    pub fn spouses(&self, xref: &Xref) -> Result<BTreeSet<Xref>> {
        self.query("spouses", vec![key(xref)], |s| traversal::spouses(s, xref))
    }

    pub fn siblings(&self, xref: &Xref) -> Result<BTreeSet<Xref>> {
        self.query("siblings", vec![key(xref)], |s| traversal::siblings(s, xref))
    }

    /// Ancestors with their generation distance; 0 generations is unbounded
    pub fn ancestors(&self, xref: &Xref, max_generations: i32) -> Result<Generations> {
        self.query(
            "ancestors",
            vec![key(xref), max_generations.to_string()],
            |s| traversal::ancestors(s, xref, max_generations),
        )
    }

    /// Descendants with their generation distance; 0 generations is unbounded
    pub fn descendants(&self, xref: &Xref, max_generations: i32) -> Result<Generations> {
        self.query(
            "descendants",
            vec![key(xref), max_generations.to_string()],
            |s| traversal::descendants(s, xref, max_generations),
        )
    }

    pub fn grandparents(&self, xref: &Xref) -> Result<BTreeSet<Xref>> {
        self.query("grandparents", vec![key(xref)], |s| {
            traversal::grandparents(s, xref)
        })
    }

    pub fn grandchildren(&self, xref: &Xref) -> Result<BTreeSet<Xref>> {
        self.query("grandchildren", vec![key(xref)], |s| {
            traversal::grandchildren(s, xref)
        })
    }

    pub fn aunts_and_uncles(&self, xref: &Xref) -> Result<BTreeSet<Xref>> {
        self.query("aunts_and_uncles", vec![key(xref)], |s| {
            traversal::aunts_and_uncles(s, xref)
        })
    }

    pub fn nieces_and_nephews(&self, xref: &Xref) -> Result<BTreeSet<Xref>> {
        self.query("nieces_and_nephews", vec![key(xref)], |s| {
            traversal::nieces_and_nephews(s, xref)
        })
    }

    /// Cousins of exactly `degree` (1 for first cousins), not removed
    pub fn cousins(&self, xref: &Xref, degree: u32) -> Result<BTreeSet<Xref>> {
        self.query("cousins", vec![key(xref), degree.to_string()], |s| {
            relationship::cousins(s, xref, degree)
        })
    }

    pub fn subtree(&self, xref: &Xref, options: &SubtreeOptions) -> Result<Subtree> {
        self.query(
            "subtree",
            vec![key(xref), format!("{:?}", options)],
            |s| traversal::subtree(s, xref, options),
        )
    }

    /// Shortest family-relative path, or `None` when the two are not connected
    pub fn shortest_path(&self, from: &Xref, to: &Xref) -> Result<Option<Path>> {
        self.query("shortest_path", vec![key(from), key(to)], |s| {
            path::shortest_path(s, from, to)
        })
    }

    /// Simple paths of at most `max_length` edges, shortest first
    pub fn all_paths(&self, from: &Xref, to: &Xref, max_length: usize) -> Result<Vec<Path>> {
        let options = PathOptions {
            max_length,
            limit: self.config.traversal.max_paths,
            ..PathOptions::default()
        };
        self.all_paths_with(from, to, &options)
    }

    pub fn all_paths_with(
        &self,
        from: &Xref,
        to: &Xref,
        options: &PathOptions,
    ) -> Result<Vec<Path>> {
        let cap = self.config.traversal.max_path_length;
        if options.max_length > cap {
            return Err(LineageError::invalid_parameter(format!(
                "path length cap {} exceeds the configured maximum {}",
                options.max_length, cap
            )));
        }
        self.query(
            "all_paths",
            vec![key(from), key(to), format!("{:?}", options)],
            |s| path::all_paths(s, from, to, options),
        )
    }

    /// What `to` is to `from`
    pub fn relationship_between(&self, from: &Xref, to: &Xref) -> Result<Relationship> {
        self.query("relationship", vec![key(from), key(to)], |s| {
            relationship::relationship_between(s, from, to)
        })
    }

    pub fn common_ancestors(&self, a: &Xref, b: &Xref) -> Result<Vec<CommonAncestor>> {
        self.query("common_ancestors", vec![key(a), key(b)], |s| {
            relationship::common_ancestors(s, a, b)
        })
    }

    pub fn lowest_common_ancestors(&self, a: &Xref, b: &Xref) -> Result<BTreeSet<Xref>> {
        self.query("lowest_common_ancestors", vec![key(a), key(b)], |s| {
            relationship::lowest_common_ancestors(s, a, b)
        })
    }

    /// Individuals matching every condition of `filter`
    pub fn filter(&self, filter: &Filter) -> Result<BTreeSet<Xref>> {
        self.query("filter", vec![filter.canonical()], |s| {
            Ok(filter.evaluate(&s.state.indexes))
        })
    }

    pub fn filter_predicate(&self, predicate: &Predicate) -> Result<BTreeSet<Xref>> {
        self.query("filter", vec![predicate.to_string()], |s| {
            Ok(predicate.evaluate(&s.state.indexes))
        })
    }
}
