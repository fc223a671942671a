//! Non-fatal structural problems found while building or validating.

use lineage_core::{EdgeId, EdgeKind, NodeKind, Xref};
use std::fmt;

/// A structural inconsistency in the source data.
///
/// Genealogical data is routinely imperfect, so construction records these
/// and carries on; only live mutations turn them into errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BuildWarning {
    /// A referenced identifier has no record
    DanglingReference {
        from: Xref,
        kind: EdgeKind,
        target: Xref,
    },
    /// A reference points at a node of the wrong kind
    WrongTargetKind {
        from: Xref,
        kind: EdgeKind,
        target: Xref,
        found: NodeKind,
    },
    /// Two records share an identifier; the first one read is kept
    DuplicateNode {
        xref: Xref,
        kept: NodeKind,
        dropped: NodeKind,
    },
    /// The same reference is listed twice, such as a repeated child
    DuplicateReference {
        from: Xref,
        kind: EdgeKind,
        target: Xref,
    },
    /// One individual holds two roles in the same family
    ConflictingRole {
        family: Xref,
        individual: Xref,
        kept: EdgeKind,
        dropped: EdgeKind,
    },
    /// An individual claims a family link the family does not list
    UnconfirmedLink {
        individual: Xref,
        kind: EdgeKind,
        family: Xref,
    },
    /// A family-relative edge without its reverse half
    MissingCounterpart { edge: EdgeId },
    /// An edge whose endpoint no longer exists
    DanglingEdge { edge: EdgeId, missing: Xref },
    /// Cached relationship lists disagree with the node's edges
    LinkMismatch { xref: Xref, detail: String },
    /// The individual is among their own ancestors
    AncestryCycle { xref: Xref },
}

impl BuildWarning {
    /// The node the warning is about
    pub fn subject(&self) -> &Xref {
        match self {
            BuildWarning::DanglingReference { from, .. }
            | BuildWarning::WrongTargetKind { from, .. }
            | BuildWarning::DuplicateReference { from, .. } => from,
            BuildWarning::DuplicateNode { xref, .. }
            | BuildWarning::LinkMismatch { xref, .. }
            | BuildWarning::AncestryCycle { xref } => xref,
            BuildWarning::ConflictingRole { family, .. } => family,
            BuildWarning::UnconfirmedLink { individual, .. } => individual,
            BuildWarning::MissingCounterpart { edge } | BuildWarning::DanglingEdge { edge, .. } => {
                &edge.from
            }
        }
    }
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::DanglingReference { from, kind, target } => {
                write!(f, "{} references missing {} ({})", from, target, kind)
            }
            BuildWarning::WrongTargetKind {
                from,
                kind,
                target,
                found,
            } => write!(
                f,
                "{} references {} as {}, but it is a {}",
                from, target, kind, found
            ),
            BuildWarning::DuplicateNode {
                xref,
                kept,
                dropped,
            } => write!(
                f,
                "duplicate identifier {}: kept the {}, dropped the {}",
                xref, kept, dropped
            ),
            BuildWarning::DuplicateReference { from, kind, target } => {
                write!(f, "{} lists {} more than once ({})", from, target, kind)
            }
            BuildWarning::ConflictingRole {
                family,
                individual,
                kept,
                dropped,
            } => write!(
                f,
                "{} appears in {} as both {} and {}; ignored {}",
                individual, family, kept, dropped, dropped
            ),
            BuildWarning::UnconfirmedLink {
                individual,
                kind,
                family,
            } => write!(
                f,
                "{} claims {} link to {}, which does not list them",
                individual, kind, family
            ),
            BuildWarning::MissingCounterpart { edge } => {
                write!(f, "edge {} has no counterpart", edge)
            }
            BuildWarning::DanglingEdge { edge, missing } => {
                write!(f, "edge {} points at missing {}", edge, missing)
            }
            BuildWarning::LinkMismatch { xref, detail } => {
                write!(f, "links of {} disagree with its edges: {}", xref, detail)
            }
            BuildWarning::AncestryCycle { xref } => {
                write!(f, "{} is their own ancestor", xref)
            }
        }
    }
}
