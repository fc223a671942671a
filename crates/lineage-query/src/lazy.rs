//! Connected components and lazy materialization.
//!
//! A lazily opened graph holds only skeleton rows; nodes are fetched from
//! the backend on first access and memoized. Components bound that work:
//! loading one component materializes a single family cluster.

use crate::graph::{Graph, GraphState};
use crate::index::IndexManager;
use crate::metrics::GraphMetrics;
use lineage_core::{
    ComponentId, Edge, GraphBackend, GraphConfig, LineageError, NodeMetadata, Result, Xref,
};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Component membership.
///
/// Components only ever merge. Removing an edge never splits one, so a
/// component may be a superset of the nodes actually connected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Components {
    members: BTreeMap<ComponentId, BTreeSet<Xref>>,
    next: u32,
}

impl Components {
    pub(crate) fn from_metadata<'a>(rows: impl IntoIterator<Item = &'a NodeMetadata>) -> Self {
        let mut components = Self::default();
        for row in rows {
            components.insert(row.component, row.xref.clone());
            components.next = components.next.max(row.component.0 + 1);
        }
        components
    }

    /// A fresh, unused component id
    pub(crate) fn allocate(&mut self) -> ComponentId {
        let id = ComponentId(self.next);
        self.next += 1;
        id
    }

    pub(crate) fn insert(&mut self, id: ComponentId, xref: Xref) {
        self.members.entry(id).or_default().insert(xref);
    }

    pub(crate) fn remove(&mut self, id: ComponentId, xref: &Xref) {
        if let Some(set) = self.members.get_mut(&id) {
            set.remove(xref);
            if set.is_empty() {
                self.members.remove(&id);
            }
        }
    }

    pub(crate) fn members(&self, id: ComponentId) -> Option<&BTreeSet<Xref>> {
        self.members.get(&id)
    }

    pub(crate) fn count(&self) -> usize {
        self.members.len()
    }

    /// Which of two components survives a merge, and which is absorbed.
    ///
    /// The larger survives; on equal sizes the lower id does. `None` when
    /// both ids are the same component.
    pub(crate) fn plan_merge(
        &self,
        a: ComponentId,
        b: ComponentId,
    ) -> Option<(ComponentId, ComponentId)> {
        if a == b {
            return None;
        }
        let size = |id| self.members.get(&id).map_or(0, BTreeSet::len);
        Some(match size(a).cmp(&size(b)) {
            std::cmp::Ordering::Less => (b, a),
            std::cmp::Ordering::Greater => (a, b),
            std::cmp::Ordering::Equal => (a.min(b), a.max(b)),
        })
    }

    /// Fold the smaller of two components into the larger.
    ///
    /// Returns the surviving id and the nodes that were relabeled, or
    /// `None` when both ids are the same component.
    pub(crate) fn merge(
        &mut self,
        a: ComponentId,
        b: ComponentId,
    ) -> Option<(ComponentId, BTreeSet<Xref>)> {
        let (keep, absorb) = self.plan_merge(a, b)?;
        let moved = self.members.remove(&absorb).unwrap_or_default();
        self.members
            .entry(keep)
            .or_default()
            .extend(moved.iter().cloned());
        Some((keep, moved))
    }
}

/// Union-find over family links, fed one edge at a time.
///
/// Reference edges (notes, sources) are ignored, so supporting records form
/// singleton components. Labels are assigned in identifier order.
pub(crate) struct ComponentLabeler<'a> {
    ids: &'a [Xref],
    position: HashMap<&'a Xref, usize>,
    sets: UnionFind<usize>,
}

impl<'a> ComponentLabeler<'a> {
    pub(crate) fn new(ids: &'a [Xref]) -> Self {
        Self {
            ids,
            position: ids.iter().enumerate().map(|(i, x)| (x, i)).collect(),
            sets: UnionFind::new(ids.len()),
        }
    }

    pub(crate) fn link(&mut self, edge: &Edge) {
        if !edge.kind.is_family_relative() {
            return;
        }
        if let (Some(&a), Some(&b)) = (self.position.get(&edge.from), self.position.get(&edge.to)) {
            self.sets.union(a, b);
        }
    }

    pub(crate) fn labels(self) -> HashMap<Xref, ComponentId> {
        let mut roots: HashMap<usize, ComponentId> = HashMap::new();
        self.ids
            .iter()
            .enumerate()
            .map(|(i, xref)| {
                let root = self.sets.find(i);
                let next = ComponentId(roots.len() as u32);
                let id = *roots.entry(root).or_insert(next);
                (xref.clone(), id)
            })
            .collect()
    }
}

/// Label every node with its component
pub(crate) fn label_components(ids: &[Xref], edges: &[Edge]) -> HashMap<Xref, ComponentId> {
    let mut labeler = ComponentLabeler::new(ids);
    for edge in edges {
        labeler.link(edge);
    }
    labeler.labels()
}

impl Graph {
    /// Reopen a graph from a backend's persisted skeleton.
    ///
    /// Skeleton, components and indexes are rebuilt from the skeleton rows;
    /// no node is read until a query needs it.
    pub fn open_lazy(backend: Arc<dyn GraphBackend>, config: GraphConfig) -> Result<Graph> {
        config.validate()?;
        let started = Instant::now();
        let rows = backend.skeleton()?;

        let mut state = GraphState {
            edge_count: backend.edge_count()?,
            ..GraphState::default()
        };
        let mut indexes = IndexManager::new();
        for row in rows {
            if let Some(attrs) = row.attributes {
                indexes.insert(&row.metadata.xref, attrs);
            }
            state
                .skeleton
                .insert(row.metadata.xref.clone(), row.metadata);
        }
        state.components = Components::from_metadata(state.skeleton.values());
        state.indexes = indexes;

        let metrics = Arc::new(GraphMetrics::new());
        metrics.record_build(started.elapsed());
        info!(
            "Opened lazy graph on {}: {} nodes, {} edges, {} components in {:?}",
            backend.name(),
            state.skeleton.len(),
            state.edge_count,
            state.components.count(),
            started.elapsed()
        );
        Ok(Graph::from_parts(state, backend, config, metrics))
    }

    /// True unless every node lives in the backend's memory anyway
    pub fn is_lazy(&self) -> bool {
        !self.store.is_resident()
    }

    pub fn component_of(&self, xref: &Xref) -> Option<ComponentId> {
        self.state.read().skeleton.get(xref).map(|m| m.component)
    }

    pub fn component_count(&self) -> usize {
        self.state.read().components.count()
    }

    pub fn component_size(&self, id: ComponentId) -> usize {
        self.state
            .read()
            .components
            .members(id)
            .map_or(0, BTreeSet::len)
    }

    pub fn component_members(&self, id: ComponentId) -> BTreeSet<Xref> {
        self.state
            .read()
            .components
            .members(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Materialize every node of one component.
    ///
    /// Returns how many nodes were fetched by this call. A backend failure
    /// stops the load; nodes fetched before it stay materialized.
    pub fn load_component(&self, id: ComponentId) -> Result<usize> {
        let state = self.state.read();
        let members = state.components.members(id).ok_or_else(|| {
            LineageError::invalid_parameter(format!("unknown component {}", id))
        })?;
        let mut loaded = 0;
        for xref in members {
            if self.store.is_materialized(xref) {
                continue;
            }
            if self.store.get(xref)?.is_some() {
                loaded += 1;
            }
        }
        debug!("Loaded {} nodes of component {}", loaded, id);
        Ok(loaded)
    }

    /// Materialize the component containing `xref`
    pub fn load_component_of(&self, xref: &Xref) -> Result<usize> {
        let id = self
            .component_of(xref)
            .ok_or_else(|| LineageError::node_not_found(xref.clone()))?;
        self.load_component(id)
    }

    pub fn is_materialized(&self, xref: &Xref) -> bool {
        self.contains(xref) && self.store.is_materialized(xref)
    }

    /// Nodes currently held in memory
    pub fn materialized_count(&self) -> usize {
        self.store.materialized_count()
    }

    /// Make the backend's buffered writes durable
    pub fn flush(&self) -> Result<()> {
        let _state = self.state.read();
        self.store.backend().flush()
    }
}
