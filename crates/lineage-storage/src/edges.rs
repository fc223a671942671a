//! Edge table with per-node adjacency, shared by the backends.

use lineage_core::{Edge, EdgeId, Xref};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub(crate) struct EdgeTable {
    edges: HashMap<EdgeId, Edge>,
    adjacency: HashMap<Xref, BTreeSet<EdgeId>>,
}

impl EdgeTable {
    pub(crate) fn from_edges(edges: impl IntoIterator<Item = Edge>) -> Self {
        let mut table = Self::default();
        for edge in edges {
            table.insert(edge);
        }
        table
    }

    pub(crate) fn insert(&mut self, edge: Edge) {
        let id = edge.id();
        for end in [&edge.from, &edge.to] {
            self.adjacency
                .entry(end.clone())
                .or_default()
                .insert(id.clone());
        }
        self.edges.insert(id, edge);
    }

    pub(crate) fn remove(&mut self, id: &EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        for end in [&edge.from, &edge.to] {
            if let Some(set) = self.adjacency.get_mut(end) {
                set.remove(id);
                if set.is_empty() {
                    self.adjacency.remove(end);
                }
            }
        }
        Some(edge)
    }

    pub(crate) fn get(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Edges touching `xref`, in edge id order
    pub(crate) fn edges_of(&self, xref: &Xref) -> Vec<Edge> {
        self.adjacency
            .get(xref)
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::EdgeKind;

    #[test]
    fn test_adjacency_tracks_both_ends() {
        let mut table = EdgeTable::default();
        let chil = Edge::new(EdgeKind::Child, "F1", "I3");
        let famc = chil.reversed(EdgeKind::ChildOf);
        table.insert(chil.clone());
        table.insert(famc.clone());

        assert_eq!(table.len(), 2);
        assert_eq!(table.edges_of(&Xref::from("I3")).len(), 2);
        assert_eq!(table.edges_of(&Xref::from("F1")).len(), 2);

        assert_eq!(table.remove(&chil.id()), Some(chil));
        assert_eq!(table.edges_of(&Xref::from("I3")), vec![famc.clone()]);
        table.remove(&famc.id());
        assert!(table.edges_of(&Xref::from("F1")).is_empty());
        assert!(table.adjacency.is_empty());
    }
}
