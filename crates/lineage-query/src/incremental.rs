//! Incremental mutations.
//!
//! Each mutation takes the state lock exclusively and runs in three steps:
//! validate, write the backend through a [`Journal`], then update skeleton,
//! components and indexes in memory and advance the cache epoch. A mutation
//! rejected by validation leaves the graph untouched. A failed backend write
//! rolls back the writes already made, so neither the store nor the resident
//! state reflect the change.

use crate::graph::{Graph, GraphState, Snapshot};
use crate::index::derive_attributes;
use crate::store::{NodeLookup, NodeStore};
use lineage_core::{
    ComponentId, Edge, EdgeId, EdgeKind, FilterAttributes, LineageError, Node, NodeKind,
    NodeMetadata, Record, Result, Sex, SkeletonRow, Xref,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// How to put one backend entry back the way it was.
enum Undo {
    Node(Xref, Option<Arc<Node>>),
    Edge(EdgeId, Option<Edge>),
    Skeleton(Xref, Option<SkeletonRow>),
}

/// Backend writes of one mutation, with what undoes each of them.
///
/// The undo entry is recorded before the write is attempted: restoring the
/// previous value is harmless when the write never landed.
struct Journal<'a> {
    store: &'a NodeStore,
    undo: Vec<Undo>,
}

impl<'a> Journal<'a> {
    fn new(store: &'a NodeStore) -> Self {
        Self {
            store,
            undo: Vec::new(),
        }
    }

    fn put_node(&mut self, node: Node, previous: Option<Arc<Node>>) -> Result<()> {
        self.undo.push(Undo::Node(node.xref.clone(), previous));
        self.store.put_node(Arc::new(node))
    }

    fn delete_node(&mut self, previous: Arc<Node>) -> Result<()> {
        let xref = previous.xref.clone();
        self.undo.push(Undo::Node(xref.clone(), Some(previous)));
        self.store.delete_node(&xref)
    }

    fn put_edge(&mut self, edge: Edge) -> Result<()> {
        self.undo.push(Undo::Edge(edge.id(), None));
        self.store.put_edge(edge)
    }

    fn delete_edge(&mut self, id: &EdgeId) -> Result<()> {
        self.undo
            .push(Undo::Edge(id.clone(), Some(Edge::from(id.clone()))));
        self.store.delete_edge(id)
    }

    fn put_skeleton(&mut self, row: SkeletonRow, previous: Option<SkeletonRow>) -> Result<()> {
        self.undo
            .push(Undo::Skeleton(row.metadata.xref.clone(), previous));
        self.store.put_skeleton(row)
    }

    fn delete_skeleton(&mut self, previous: SkeletonRow) -> Result<()> {
        let xref = previous.metadata.xref.clone();
        self.undo.push(Undo::Skeleton(xref.clone(), Some(previous)));
        self.store.delete_skeleton(&xref)
    }

    /// Undo every recorded write, newest first. Returns whether anything
    /// had been attempted.
    fn rollback(self) -> bool {
        let attempted = !self.undo.is_empty();
        for undo in self.undo.into_iter().rev() {
            let result = match undo {
                Undo::Node(_, Some(node)) => self.store.put_node(node),
                Undo::Node(xref, None) => self.store.delete_node(&xref),
                Undo::Edge(_, Some(edge)) => self.store.put_edge(edge),
                Undo::Edge(id, None) => self.store.delete_edge(&id),
                Undo::Skeleton(_, Some(row)) => self.store.put_skeleton(row),
                Undo::Skeleton(xref, None) => self.store.delete_skeleton(&xref),
            };
            if let Err(e) = result {
                warn!("Rollback write on {} failed: {}", self.store.backend().name(), e);
            }
        }
        attempted
    }
}

/// Skeleton row of `xref` as the resident state holds it
fn current_row(state: &GraphState, xref: &Xref) -> Option<SkeletonRow> {
    state.skeleton.get(xref).map(|metadata| SkeletonRow {
        metadata: metadata.clone(),
        attributes: state.indexes.attributes(xref).cloned(),
    })
}

/// Rows that change when `moved` joins component `kept` and `updates` are
/// applied, each paired with the row it replaces.
fn changed_rows(
    state: &GraphState,
    relabel: Option<(ComponentId, &BTreeSet<Xref>)>,
    updates: &[(Xref, FilterAttributes)],
) -> Vec<(SkeletonRow, SkeletonRow)> {
    let mut rows: BTreeMap<Xref, (SkeletonRow, SkeletonRow)> = BTreeMap::new();
    if let Some((kept, moved)) = relabel {
        for xref in moved {
            if let Some(previous) = current_row(state, xref) {
                let mut next = previous.clone();
                next.metadata.component = kept;
                rows.insert(xref.clone(), (next, previous));
            }
        }
    }
    for (xref, attrs) in updates {
        if let Some(previous) = current_row(state, xref) {
            let entry = rows
                .entry(xref.clone())
                .or_insert_with(|| (previous.clone(), previous));
            entry.0.attributes = Some(attrs.clone());
        }
    }
    rows.into_values().collect()
}

impl Graph {
    fn load(&self, xref: &Xref) -> Result<Arc<Node>> {
        self.store
            .get(xref)?
            .ok_or_else(|| LineageError::node_not_found(xref.clone()))
    }

    /// Attributes of `xrefs` that differ from the indexed ones, derived from
    /// the nodes as the backend now holds them
    fn changed_attributes(
        &self,
        state: &GraphState,
        xrefs: &BTreeSet<Xref>,
    ) -> Result<Vec<(Xref, FilterAttributes)>> {
        let snapshot = Snapshot {
            state,
            store: &self.store,
        };
        let mut updates = Vec::new();
        for xref in xrefs {
            let Some(node) = snapshot.node(xref)? else {
                continue;
            };
            if let Some(attrs) = derive_attributes(&node, &snapshot)? {
                if state.indexes.attributes(xref) != Some(&attrs) {
                    updates.push((xref.clone(), attrs));
                }
            }
        }
        Ok(updates)
    }

    /// Run the backend writes of one mutation, rolling them back on failure.
    ///
    /// A rolled-back attempt still advances the cache epoch: memoized nodes
    /// were rewritten twice, and no cached answer may outlive that.
    fn write_through<T>(
        &self,
        what: fmt::Arguments<'_>,
        writes: impl FnOnce(&mut Journal<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut journal = Journal::new(&self.store);
        match writes(&mut journal) {
            Ok(value) => Ok(value),
            Err(err) => {
                if journal.rollback() {
                    self.cache.advance_epoch();
                }
                warn!("{} failed and was rolled back: {}", what, err);
                Err(err)
            }
        }
    }

    fn finish_mutation(&self, what: fmt::Arguments<'_>) {
        let epoch = self.cache.advance_epoch();
        self.metrics.record_mutation();
        debug!("{} (epoch {})", what, epoch);
    }

    /// Add an unlinked node for `record`.
    ///
    /// References inside the record are not turned into edges; link the
    /// node with [`Graph::add_edge`].
    pub fn add_node(&self, xref: impl Into<Xref>, record: Record) -> Result<()> {
        let xref = xref.into();
        let mut state = self.state.write();
        if state.skeleton.contains_key(&xref) {
            return Err(LineageError::duplicate_node(xref));
        }

        let node = Node::new(xref.clone(), Arc::new(record));
        let attributes = derive_attributes(
            &node,
            &Snapshot {
                state: &state,
                store: &self.store,
            },
        )?;
        let component = state.components.allocate();
        let metadata = NodeMetadata {
            xref: xref.clone(),
            kind: node.kind(),
            component,
        };
        let row = SkeletonRow {
            metadata: metadata.clone(),
            attributes: attributes.clone(),
        };

        self.write_through(format_args!("Adding node {}", xref), |journal| {
            journal.put_node(node, None)?;
            journal.put_skeleton(row, None)
        })?;

        state.skeleton.insert(xref.clone(), metadata);
        state.components.insert(component, xref.clone());
        if let Some(attrs) = attributes {
            state.indexes.insert(&xref, attrs);
        }
        self.finish_mutation(format_args!("Added node {}", xref));
        Ok(())
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&self, xref: &Xref) -> Result<()> {
        let mut state = self.state.write();
        let Some(previous_row) = current_row(&state, xref) else {
            return Err(LineageError::node_not_found(xref.clone()));
        };
        let node = self.load(xref)?;

        let mut affected = BTreeSet::new();
        match node.kind() {
            NodeKind::Family => {
                affected.extend(node.links.partners().cloned());
                affected.extend(node.links.children.iter().cloned());
            }
            NodeKind::Individual => {
                for family in node.links.spouse_of.iter().chain(&node.links.child_of) {
                    if let Some(family) = self.store.get(family)? {
                        affected.extend(family.links.partners().cloned());
                    }
                }
            }
            _ => {}
        }
        affected.remove(xref);

        let edges: Vec<EdgeId> = node.edges().cloned().collect();
        let mut neighbours: Vec<Xref> = edges
            .iter()
            .filter_map(|id| id.other_end(xref).cloned())
            .collect();
        neighbours.sort();
        neighbours.dedup();
        let mut detached = Vec::with_capacity(neighbours.len());
        for other in &neighbours {
            let previous = self.load(other)?;
            let mut updated = (*previous).clone();
            for id in edges.iter().filter(|id| id.touches(other)) {
                updated.detach(id);
            }
            detached.push((updated, previous));
        }

        let updates = self.write_through(format_args!("Removing node {}", xref), |journal| {
            for id in &edges {
                journal.delete_edge(id)?;
            }
            for (updated, previous) in detached {
                journal.put_node(updated, Some(previous))?;
            }
            journal.delete_node(Arc::clone(&node))?;
            journal.delete_skeleton(previous_row.clone())?;
            let updates = self.changed_attributes(&state, &affected)?;
            for (row, previous) in changed_rows(&state, None, &updates) {
                journal.put_skeleton(row, Some(previous))?;
            }
            Ok(updates)
        })?;

        state.skeleton.remove(xref);
        state
            .components
            .remove(previous_row.metadata.component, xref);
        state.indexes.remove(xref);
        state.edge_count = state.edge_count.saturating_sub(edges.len());
        for (xref, attrs) in updates {
            state.indexes.insert(&xref, attrs);
        }

        self.finish_mutation(format_args!(
            "Removed node {} with {} edges",
            xref,
            edges.len()
        ));
        Ok(())
    }

    /// Add an edge and, for family links, its counterpart.
    ///
    /// A `SpouseOf` edge takes the family's husband or wife slot: the one
    /// matching the individual's sex, or the first free slot when the sex is
    /// unknown.
    pub fn add_edge(&self, edge: Edge) -> Result<()> {
        let mut state = self.state.write();
        let id = edge.id();

        let kind_of = |xref: &Xref| {
            state
                .skeleton
                .get(xref)
                .map(|m| m.kind)
                .ok_or_else(|| LineageError::dangling(id.clone(), xref.clone()))
        };
        let from_kind = kind_of(&edge.from)?;
        let to_kind = kind_of(&edge.to)?;
        if !edge.kind.accepts(from_kind, to_kind) {
            return Err(LineageError::invalid_edge(
                id,
                format!("{} cannot join a {} to a {}", edge.kind, from_kind, to_kind),
            ));
        }

        let from_previous = self.load(&edge.from)?;
        let to_previous = self.load(&edge.to)?;
        if from_previous.has_edge(&id) {
            return Err(LineageError::DuplicateEdge(id));
        }

        let halves = if edge.kind.is_family_relative() {
            let (family, person) = if edge.kind.is_family_side() {
                (&from_previous, &to_previous)
            } else {
                (&to_previous, &from_previous)
            };
            let family_side = family_side_kind(&edge, family, person)?;
            let forward = Edge::new(family_side, family.xref.clone(), person.xref.clone());
            let reverse = match family_side {
                EdgeKind::Child => EdgeKind::ChildOf,
                _ => EdgeKind::SpouseOf,
            };
            let back = forward.reversed(reverse);
            vec![forward, back]
        } else {
            vec![edge.clone()]
        };

        let mut from_node = (*from_previous).clone();
        let mut to_node = (*to_previous).clone();
        for half in &halves {
            from_node.attach(half);
            to_node.attach(half);
        }

        let mut affected: BTreeSet<Xref> = [&from_node, &to_node]
            .into_iter()
            .filter(|n| n.is_family())
            .flat_map(|n| n.links.partners().cloned())
            .collect();
        let mut merge = None;
        if edge.kind.is_family_relative() {
            if let Some(person) = edge.individual() {
                affected.insert(person.clone());
            }
            let component = |xref: &Xref| state.skeleton.get(xref).map(|m| m.component);
            if let (Some(a), Some(b)) = (component(&edge.from), component(&edge.to)) {
                merge = state.components.plan_merge(a, b);
            }
        } else {
            affected.clear();
        }
        let moved = merge
            .and_then(|(_, absorbed)| state.components.members(absorbed).cloned())
            .unwrap_or_default();

        let updates = self.write_through(format_args!("Adding edge {}", id), |journal| {
            for half in &halves {
                journal.put_edge(half.clone())?;
            }
            journal.put_node(from_node, Some(Arc::clone(&from_previous)))?;
            journal.put_node(to_node, Some(Arc::clone(&to_previous)))?;
            let updates = self.changed_attributes(&state, &affected)?;
            let relabel = merge.map(|(kept, _)| (kept, &moved));
            for (row, previous) in changed_rows(&state, relabel, &updates) {
                journal.put_skeleton(row, Some(previous))?;
            }
            Ok(updates)
        })?;

        state.edge_count += halves.len();
        if let Some((kept, absorbed)) = merge {
            state.components.merge(kept, absorbed);
            for xref in &moved {
                if let Some(metadata) = state.skeleton.get_mut(xref) {
                    metadata.component = kept;
                }
            }
            debug!("Merged {} nodes into component {}", moved.len(), kept);
        }
        for (xref, attrs) in updates {
            state.indexes.insert(&xref, attrs);
        }

        self.finish_mutation(format_args!("Added edge {}", id));
        Ok(())
    }

    /// Remove an edge together with its counterpart
    pub fn remove_edge(&self, id: &EdgeId) -> Result<()> {
        let mut state = self.state.write();
        for end in [&id.from, &id.to] {
            if !state.skeleton.contains_key(end) {
                return Err(LineageError::node_not_found(end.clone()));
            }
        }

        let from_previous = self.load(&id.from)?;
        let to_previous = self.load(&id.to)?;
        if !from_previous.has_edge(id) {
            return Err(LineageError::EdgeNotFound(id.clone()));
        }

        let mut removed = vec![id.clone()];
        let counterpart = match id.kind {
            EdgeKind::SpouseOf => [EdgeKind::Husband, EdgeKind::Wife]
                .into_iter()
                .map(|k| id.reversed(k))
                .find(|c| to_previous.has_edge(c)),
            other => other
                .counterpart()
                .map(|k| id.reversed(k))
                .filter(|c| to_previous.has_edge(c)),
        };
        removed.extend(counterpart);

        let mut affected: BTreeSet<Xref> = [&from_previous, &to_previous]
            .into_iter()
            .filter(|n| n.is_family())
            .flat_map(|n| n.links.partners().cloned())
            .collect();
        if let Some(person) = Edge::from(id.clone()).individual() {
            affected.insert(person.clone());
        }

        let mut from_node = (*from_previous).clone();
        let mut to_node = (*to_previous).clone();
        for half in &removed {
            from_node.detach(half);
            to_node.detach(half);
        }

        let updates = self.write_through(format_args!("Removing edge {}", id), |journal| {
            for half in &removed {
                journal.delete_edge(half)?;
            }
            journal.put_node(from_node, Some(Arc::clone(&from_previous)))?;
            journal.put_node(to_node, Some(Arc::clone(&to_previous)))?;
            let updates = self.changed_attributes(&state, &affected)?;
            for (row, previous) in changed_rows(&state, None, &updates) {
                journal.put_skeleton(row, Some(previous))?;
            }
            Ok(updates)
        })?;

        state.edge_count = state.edge_count.saturating_sub(removed.len());
        for (xref, attrs) in updates {
            state.indexes.insert(&xref, attrs);
        }
        self.finish_mutation(format_args!("Removed edge {}", id));
        Ok(())
    }
}

/// The family-side kind a new family link takes, after checking that the
/// individual can hold that role.
fn family_side_kind(edge: &Edge, family: &Node, person: &Node) -> Result<EdgeKind> {
    let id = edge.id();
    let links = &family.links;
    let xref = &person.xref;
    if links.partners().any(|p| p == xref) || links.children.contains(xref) {
        return Err(LineageError::invalid_edge(
            id,
            format!("{} already belongs to {}", xref, family.xref),
        ));
    }

    let occupied = |slot: &Option<Xref>, role: &str| {
        if slot.is_some() {
            Err(LineageError::invalid_edge(
                edge.id(),
                format!("{} already has a {}", family.xref, role),
            ))
        } else {
            Ok(())
        }
    };

    match edge.kind {
        EdgeKind::Child | EdgeKind::ChildOf => Ok(EdgeKind::Child),
        EdgeKind::Husband => occupied(&links.husband, "husband").map(|_| EdgeKind::Husband),
        EdgeKind::Wife => occupied(&links.wife, "wife").map(|_| EdgeKind::Wife),
        EdgeKind::SpouseOf => {
            let sex = person.individual().map(|p| p.sex).unwrap_or_default();
            match sex {
                Sex::Male => occupied(&links.husband, "husband").map(|_| EdgeKind::Husband),
                Sex::Female => occupied(&links.wife, "wife").map(|_| EdgeKind::Wife),
                Sex::Unknown if links.husband.is_none() => Ok(EdgeKind::Husband),
                Sex::Unknown if links.wife.is_none() => Ok(EdgeKind::Wife),
                Sex::Unknown => Err(LineageError::invalid_edge(
                    id,
                    format!("{} has no free partner slot", family.xref),
                )),
            }
        }
        other => Err(LineageError::invalid_edge(
            id,
            format!("{} is not a family link", other),
        )),
    }
}
