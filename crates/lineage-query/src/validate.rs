//! Structural re-check of a built graph.

use crate::graph::{Graph, Snapshot};
use crate::store::NodeLookup;
use crate::warning::BuildWarning;
use lineage_core::{EdgeKind, Node, NodeKind, Result, Xref};
use std::collections::HashMap;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl Graph {
    /// Re-check edge pairing, link lists and ancestry.
    ///
    /// Reads every node, so on a lazy graph this materializes all of them.
    pub fn validate(&self) -> Result<Vec<BuildWarning>> {
        self.read(|s| {
            let mut ids: Vec<&Xref> = s.state.skeleton.keys().collect();
            ids.sort();

            let mut warnings = Vec::new();
            let mut nodes = HashMap::with_capacity(ids.len());
            for xref in ids {
                if let Some(node) = s.node(xref)? {
                    nodes.insert(xref.clone(), node);
                }
            }

            let mut ordered: Vec<&Xref> = nodes.keys().collect();
            ordered.sort();
            for xref in &ordered {
                let node = &nodes[*xref];
                check_edges(s, node, &mut warnings)?;
                check_links(node, &mut warnings);
            }
            find_cycles(&nodes, &ordered, &mut warnings);
            Ok(warnings)
        })
    }
}

fn check_edges(s: &Snapshot<'_>, node: &Node, warnings: &mut Vec<BuildWarning>) -> Result<()> {
    for id in &node.out_edges {
        let Some(other) = s.node(&id.to)? else {
            warnings.push(BuildWarning::DanglingEdge {
                edge: id.clone(),
                missing: id.to.clone(),
            });
            continue;
        };
        if !id.kind.is_family_relative() {
            continue;
        }
        let paired = match id.kind {
            EdgeKind::SpouseOf => [EdgeKind::Husband, EdgeKind::Wife]
                .into_iter()
                .any(|k| other.out_edges.contains(&id.reversed(k))),
            kind => kind
                .counterpart()
                .is_some_and(|k| other.out_edges.contains(&id.reversed(k))),
        };
        if !paired {
            warnings.push(BuildWarning::MissingCounterpart { edge: id.clone() });
        }
    }
    Ok(())
}

fn targets(node: &Node, kind: EdgeKind) -> Vec<Xref> {
    node.out_edges
        .iter()
        .filter(|e| e.kind == kind)
        .map(|e| e.to.clone())
        .collect()
}

fn check_links(node: &Node, warnings: &mut Vec<BuildWarning>) {
    let mut mismatch = |what: &str| {
        warnings.push(BuildWarning::LinkMismatch {
            xref: node.xref.clone(),
            detail: what.to_string(),
        })
    };
    let same = |list: &[Xref], kind: EdgeKind| {
        let mut a = list.to_vec();
        let mut b = targets(node, kind);
        a.sort();
        b.sort();
        a == b
    };

    match node.kind() {
        NodeKind::Individual => {
            if !same(&node.links.child_of, EdgeKind::ChildOf) {
                mismatch("child-of families");
            }
            if !same(&node.links.spouse_of, EdgeKind::SpouseOf) {
                mismatch("spouse-of families");
            }
        }
        NodeKind::Family => {
            if !same(node.links.husband.as_slice(), EdgeKind::Husband) {
                mismatch("husband");
            }
            if !same(node.links.wife.as_slice(), EdgeKind::Wife) {
                mismatch("wife");
            }
            if !same(&node.links.children, EdgeKind::Child) {
                mismatch("children");
            }
        }
        _ => {}
    }
}

/// Three-colour depth-first search along child-to-parent links
fn find_cycles(
    nodes: &HashMap<Xref, std::sync::Arc<Node>>,
    order: &[&Xref],
    warnings: &mut Vec<BuildWarning>,
) {
    let parents_of = |xref: &Xref| -> Vec<Xref> {
        let Some(node) = nodes.get(xref) else {
            return Vec::new();
        };
        let mut out: Vec<Xref> = node
            .links
            .child_of
            .iter()
            .filter_map(|f| nodes.get(f))
            .flat_map(|f| f.links.partners().cloned().collect::<Vec<_>>())
            .collect();
        out.sort();
        out.dedup();
        out
    };

    let mut marks: HashMap<Xref, Mark> = HashMap::new();
    let mut reported: Vec<Xref> = Vec::new();
    for start in order.iter().filter(|x| nodes[**x].is_individual()) {
        if marks.contains_key(*start) {
            continue;
        }
        // explicit stack of (node, remaining parents)
        let mut stack: Vec<(Xref, Vec<Xref>)> = vec![((*start).clone(), parents_of(*start))];
        marks.insert((*start).clone(), Mark::Visiting);
        while let Some((current, pending)) = stack.last_mut() {
            match pending.pop() {
                Some(parent) => match marks.get(&parent) {
                    Some(Mark::Visiting) => {
                        if !reported.contains(&parent) {
                            reported.push(parent.clone());
                        }
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(parent.clone(), Mark::Visiting);
                        let next = parents_of(&parent);
                        stack.push((parent, next));
                    }
                },
                None => {
                    marks.insert(current.clone(), Mark::Done);
                    stack.pop();
                }
            }
        }
    }
    reported.sort();
    warnings.extend(
        reported
            .into_iter()
            .map(|xref| BuildWarning::AncestryCycle { xref }),
    );
}

#[cfg(test)]
mod tests {
    use crate::Graph;
    use crate::warning::BuildWarning;
    use lineage_core::{Edge, EdgeKind, FamilyRecord, IndividualRecord, RecordSet};

    fn set() -> RecordSet {
        RecordSet::new()
            .individual("I1", IndividualRecord::new("A", "V"))
            .individual("I2", IndividualRecord::new("B", "V"))
            .family("F1", FamilyRecord::new(Some("I1"), None, &["I2"]))
    }

    #[test]
    fn test_clean_graph_has_no_warnings() {
        let (g, _) = Graph::from_records(&set()).unwrap();
        assert!(g.validate().unwrap().is_empty());
    }

    #[test]
    fn test_detects_ancestry_cycle() {
        let (g, _) = Graph::from_records(&set()).unwrap();
        // I2 becomes the father of I1's birth family, and I1 its child
        g.add_node("F2", lineage_core::Record::Family(FamilyRecord::default()))
            .unwrap();
        g.add_edge(Edge::new(EdgeKind::Husband, "F2", "I2")).unwrap();
        g.add_edge(Edge::new(EdgeKind::Child, "F2", "I1")).unwrap();

        let warnings = g.validate().unwrap();
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, BuildWarning::AncestryCycle { .. }))
        );
        assert!(
            !warnings
                .iter()
                .any(|w| matches!(w, BuildWarning::MissingCounterpart { .. }))
        );
    }
}
