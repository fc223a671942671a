//! Typed, directed relationship edges.

use crate::id::Xref;
use crate::node::NodeKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relationship carried by an edge.
///
/// `Husband`, `Wife` and `Child` point from a family to an individual;
/// `ChildOf` and `SpouseOf` point from an individual to a family. Together
/// these are the family-relative kinds, and each one has a counterpart
/// pointing the other way. The remaining kinds attach supporting records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Husband,
    Wife,
    Child,
    ChildOf,
    SpouseOf,
    Note,
    Source,
    Repository,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 8] = [
        EdgeKind::Husband,
        EdgeKind::Wife,
        EdgeKind::Child,
        EdgeKind::ChildOf,
        EdgeKind::SpouseOf,
        EdgeKind::Note,
        EdgeKind::Source,
        EdgeKind::Repository,
    ];

    /// Short tag used in edge ids and logs
    pub fn tag(self) -> &'static str {
        match self {
            EdgeKind::Husband => "HUSB",
            EdgeKind::Wife => "WIFE",
            EdgeKind::Child => "CHIL",
            EdgeKind::ChildOf => "FAMC",
            EdgeKind::SpouseOf => "FAMS",
            EdgeKind::Note => "NOTE",
            EdgeKind::Source => "SOUR",
            EdgeKind::Repository => "REPO",
        }
    }

    /// Parse a tag produced by [`EdgeKind::tag`]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag().eq_ignore_ascii_case(tag))
    }

    /// Edges that link individuals through a family
    pub fn is_family_relative(self) -> bool {
        matches!(
            self,
            EdgeKind::Husband
                | EdgeKind::Wife
                | EdgeKind::Child
                | EdgeKind::ChildOf
                | EdgeKind::SpouseOf
        )
    }

    /// Family-relative edges whose source is the family
    pub fn is_family_side(self) -> bool {
        matches!(self, EdgeKind::Husband | EdgeKind::Wife | EdgeKind::Child)
    }

    /// Parent/child edges
    pub fn is_blood(self) -> bool {
        matches!(self, EdgeKind::Child | EdgeKind::ChildOf)
    }

    /// Partner edges
    pub fn is_marital(self) -> bool {
        matches!(self, EdgeKind::Husband | EdgeKind::Wife | EdgeKind::SpouseOf)
    }

    /// Kind of the paired edge pointing the other way.
    ///
    /// `SpouseOf` has no fixed counterpart: whether it pairs with `Husband`
    /// or `Wife` depends on the slot the individual holds in the family.
    pub fn counterpart(self) -> Option<EdgeKind> {
        match self {
            EdgeKind::Husband | EdgeKind::Wife => Some(EdgeKind::SpouseOf),
            EdgeKind::Child => Some(EdgeKind::ChildOf),
            EdgeKind::ChildOf => Some(EdgeKind::Child),
            _ => None,
        }
    }

    /// Whether an edge of this kind may join nodes of the given kinds
    pub fn accepts(self, from: NodeKind, to: NodeKind) -> bool {
        use NodeKind::*;
        match self {
            EdgeKind::Husband | EdgeKind::Wife | EdgeKind::Child => {
                from == Family && to == Individual
            }
            EdgeKind::ChildOf | EdgeKind::SpouseOf => from == Individual && to == Family,
            EdgeKind::Note => from != Note && to == Note,
            EdgeKind::Source => matches!(from, Individual | Family) && to == Source,
            EdgeKind::Repository => from == Source && to == Repository,
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Identity of an edge: its kind and both endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId {
    pub kind: EdgeKind,
    pub from: Xref,
    pub to: Xref,
}

impl EdgeId {
    pub fn new(kind: EdgeKind, from: impl Into<Xref>, to: impl Into<Xref>) -> Self {
        Self {
            kind,
            from: from.into(),
            to: to.into(),
        }
    }

    /// Same endpoints swapped, under another kind
    pub fn reversed(&self, kind: EdgeKind) -> Self {
        Self {
            kind,
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }

    /// The endpoint that is not `xref`
    pub fn other_end(&self, xref: &Xref) -> Option<&Xref> {
        if &self.from == xref {
            Some(&self.to)
        } else if &self.to == xref {
            Some(&self.from)
        } else {
            None
        }
    }

    pub fn touches(&self, xref: &Xref) -> bool {
        &self.from == xref || &self.to == xref
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}->{}", self.from, self.kind.tag(), self.to)
    }
}

/// A typed, directed edge between two node identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub from: Xref,
    pub to: Xref,
    /// Owning family for family-relative edges
    pub family: Option<Xref>,
}

impl Edge {
    pub fn new(kind: EdgeKind, from: impl Into<Xref>, to: impl Into<Xref>) -> Self {
        let from = from.into();
        let to = to.into();
        let family = if kind.is_family_side() {
            Some(from.clone())
        } else if kind.is_family_relative() {
            Some(to.clone())
        } else {
            None
        };
        Self {
            kind,
            from,
            to,
            family,
        }
    }

    pub fn id(&self) -> EdgeId {
        EdgeId {
            kind: self.kind,
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }

    /// The same link seen from the other endpoint
    pub fn reversed(&self, kind: EdgeKind) -> Edge {
        Edge::new(kind, self.to.clone(), self.from.clone())
    }

    /// Individual endpoint of a family-relative edge
    pub fn individual(&self) -> Option<&Xref> {
        if self.kind.is_family_side() {
            Some(&self.to)
        } else if self.kind.is_family_relative() {
            Some(&self.from)
        } else {
            None
        }
    }

    pub fn touches(&self, xref: &Xref) -> bool {
        &self.from == xref || &self.to == xref
    }
}

impl From<&Edge> for EdgeId {
    fn from(edge: &Edge) -> Self {
        edge.id()
    }
}

impl From<EdgeId> for Edge {
    fn from(id: EdgeId) -> Self {
        Edge::new(id.kind, id.from, id.to)
    }
}
