//! Resident in-memory backend, the default for graphs that fit in RAM.

use crate::edges::EdgeTable;
use lineage_core::{Edge, EdgeId, GraphBackend, Node, Result, SkeletonRow, Xref};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    nodes: RwLock<HashMap<Xref, Arc<Node>>>,
    edges: RwLock<EdgeTable>,
    skeleton: RwLock<BTreeMap<Xref, SkeletonRow>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored edge, unordered
    pub fn all_edges(&self) -> Vec<Edge> {
        self.edges.read().values().cloned().collect()
    }
}

impl GraphBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_resident(&self) -> bool {
        true
    }

    fn get_node(&self, xref: &Xref) -> Result<Option<Arc<Node>>> {
        Ok(self.nodes.read().get(xref).cloned())
    }

    fn get_edge(&self, id: &EdgeId) -> Result<Option<Edge>> {
        Ok(self.edges.read().get(id).cloned())
    }

    fn get_edges_of(&self, xref: &Xref) -> Result<Vec<Edge>> {
        Ok(self.edges.read().edges_of(xref))
    }

    fn put_node(&self, node: Arc<Node>) -> Result<()> {
        self.nodes.write().insert(node.xref.clone(), node);
        Ok(())
    }

    fn put_edge(&self, edge: Edge) -> Result<()> {
        self.edges.write().insert(edge);
        Ok(())
    }

    fn delete_node(&self, xref: &Xref) -> Result<()> {
        self.nodes.write().remove(xref);
        Ok(())
    }

    fn delete_edge(&self, id: &EdgeId) -> Result<()> {
        self.edges.write().remove(id);
        Ok(())
    }

    fn put_skeleton(&self, row: SkeletonRow) -> Result<()> {
        self.skeleton.write().insert(row.metadata.xref.clone(), row);
        Ok(())
    }

    fn delete_skeleton(&self, xref: &Xref) -> Result<()> {
        self.skeleton.write().remove(xref);
        Ok(())
    }

    fn skeleton(&self) -> Result<Vec<SkeletonRow>> {
        Ok(self.skeleton.read().values().cloned().collect())
    }

    fn node_count(&self) -> Result<usize> {
        Ok(self.nodes.read().len())
    }

    fn edge_count(&self) -> Result<usize> {
        Ok(self.edges.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::{ComponentId, EdgeKind, FamilyRecord, NodeKind, NodeMetadata, Record};

    #[test]
    fn test_node_and_edge_storage() {
        let backend = MemoryBackend::new();
        let node = Arc::new(Node::new(
            "F1",
            Arc::new(Record::Family(FamilyRecord::default())),
        ));
        backend.put_node(Arc::clone(&node)).unwrap();
        backend
            .put_edge(Edge::new(EdgeKind::Child, "F1", "I1"))
            .unwrap();

        assert!(backend.is_resident());
        assert_eq!(backend.node_count().unwrap(), 1);
        assert!(Arc::ptr_eq(
            &backend.get_node(&Xref::from("F1")).unwrap().unwrap(),
            &node
        ));
        assert_eq!(backend.get_edges_of(&Xref::from("I1")).unwrap().len(), 1);

        let id = EdgeId::new(EdgeKind::Child, "F1", "I1");
        backend.delete_edge(&id).unwrap();
        assert_eq!(backend.get_edge(&id).unwrap(), None);
        backend.delete_node(&Xref::from("F1")).unwrap();
        assert_eq!(backend.node_count().unwrap(), 0);
    }

    #[test]
    fn test_skeleton_rows_are_ordered() {
        let backend = MemoryBackend::new();
        for xref in ["I2", "F1", "I1"] {
            backend
                .put_skeleton(SkeletonRow {
                    metadata: NodeMetadata {
                        xref: xref.into(),
                        kind: NodeKind::Individual,
                        component: ComponentId(0),
                    },
                    attributes: None,
                })
                .unwrap();
        }
        let order: Vec<String> = backend
            .skeleton()
            .unwrap()
            .into_iter()
            .map(|r| r.metadata.xref.to_string())
            .collect();
        assert_eq!(order, vec!["F1", "I1", "I2"]);
    }
}
