//! Graph nodes and their cached relationship lists.

use crate::edge::{Edge, EdgeId, EdgeKind};
use crate::id::Xref;
use crate::record::{FamilyRecord, IndividualRecord, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Kind tag of a node, mirroring the record it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Individual,
    Family,
    Note,
    Source,
    Repository,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Individual,
        NodeKind::Family,
        NodeKind::Note,
        NodeKind::Source,
        NodeKind::Repository,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Individual => "individual",
            NodeKind::Family => "family",
            NodeKind::Note => "note",
            NodeKind::Source => "source",
            NodeKind::Repository => "repository",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship lists derived from a node's outbound family-relative edges.
///
/// Individuals fill `child_of` and `spouse_of`; families fill `husband`,
/// `wife` and `children`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyLinks {
    pub child_of: Vec<Xref>,
    pub spouse_of: Vec<Xref>,
    pub husband: Option<Xref>,
    pub wife: Option<Xref>,
    pub children: Vec<Xref>,
}

impl FamilyLinks {
    /// Husband and wife, in that order
    pub fn partners(&self) -> impl Iterator<Item = &Xref> {
        self.husband.iter().chain(self.wife.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.child_of.is_empty()
            && self.spouse_of.is_empty()
            && self.husband.is_none()
            && self.wife.is_none()
            && self.children.is_empty()
    }
}

/// A vertex of the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub xref: Xref,
    pub record: Arc<Record>,
    pub links: FamilyLinks,
    pub out_edges: Vec<EdgeId>,
    pub in_edges: Vec<EdgeId>,
}

impl Node {
    pub fn new(xref: impl Into<Xref>, record: Arc<Record>) -> Self {
        Self {
            xref: xref.into(),
            record,
            links: FamilyLinks::default(),
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.record.kind()
    }

    pub fn is_individual(&self) -> bool {
        self.kind() == NodeKind::Individual
    }

    pub fn is_family(&self) -> bool {
        self.kind() == NodeKind::Family
    }

    pub fn individual(&self) -> Option<&IndividualRecord> {
        self.record.as_individual()
    }

    pub fn family(&self) -> Option<&FamilyRecord> {
        self.record.as_family()
    }

    /// Every edge touching this node, outbound first
    pub fn edges(&self) -> impl Iterator<Item = &EdgeId> {
        self.out_edges.iter().chain(self.in_edges.iter())
    }

    pub fn degree(&self) -> usize {
        self.out_edges.len() + self.in_edges.len()
    }

    pub fn has_edge(&self, id: &EdgeId) -> bool {
        self.edges().any(|e| e == id)
    }

    /// Record `edge` on this node and refresh the relationship lists.
    ///
    /// Only the source endpoint's lists change: a `Child` edge updates the
    /// family's children, its `ChildOf` counterpart updates the child.
    pub fn attach(&mut self, edge: &Edge) {
        let id = edge.id();
        if edge.from == self.xref {
            if !self.out_edges.contains(&id) {
                self.out_edges.push(id);
            }
            let target = edge.to.clone();
            match edge.kind {
                EdgeKind::Husband => self.links.husband = Some(target),
                EdgeKind::Wife => self.links.wife = Some(target),
                EdgeKind::Child => push_unique(&mut self.links.children, target),
                EdgeKind::ChildOf => push_unique(&mut self.links.child_of, target),
                EdgeKind::SpouseOf => push_unique(&mut self.links.spouse_of, target),
                _ => {}
            }
        } else if edge.to == self.xref && !self.in_edges.contains(&id) {
            self.in_edges.push(id);
        }
    }

    /// Inverse of [`Node::attach`]
    pub fn detach(&mut self, id: &EdgeId) {
        if id.from == self.xref {
            self.out_edges.retain(|e| e != id);
            match id.kind {
                EdgeKind::Husband if self.links.husband.as_ref() == Some(&id.to) => {
                    self.links.husband = None;
                }
                EdgeKind::Wife if self.links.wife.as_ref() == Some(&id.to) => {
                    self.links.wife = None;
                }
                EdgeKind::Child => self.links.children.retain(|c| c != &id.to),
                EdgeKind::ChildOf => self.links.child_of.retain(|f| f != &id.to),
                EdgeKind::SpouseOf => self.links.spouse_of.retain(|f| f != &id.to),
                _ => {}
            }
        } else if id.to == self.xref {
            self.in_edges.retain(|e| e != id);
        }
    }
}

fn push_unique(list: &mut Vec<Xref>, xref: Xref) {
    if !list.contains(&xref) {
        list.push(xref);
    }
}
