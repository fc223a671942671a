//! Path finding over family-relative edges.
//!
//! Paths alternate between individuals and the families linking them;
//! reference edges (notes, sources) never connect two people. Neighbours
//! are always visited in identifier order, which makes every result
//! deterministic for an unchanged graph.

use crate::store::NodeLookup;
use lineage_core::{EdgeKind, LineageError, Node, Result, Xref};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// What a path passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// Only parent/child and sibling steps
    Blood,
    /// Only partner steps
    Marital,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// Node sequence, endpoints included
    pub nodes: Vec<Xref>,
    /// `edges[i]` is the kind of the edge from `nodes[i]` to `nodes[i + 1]`
    pub edges: Vec<EdgeKind>,
    pub kind: PathKind,
}

impl Path {
    fn new(nodes: Vec<Xref>, edges: Vec<EdgeKind>) -> Self {
        let kind = classify(&edges);
        Self { nodes, edges, kind }
    }

    /// Number of edges
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn start(&self) -> Option<&Xref> {
        self.nodes.first()
    }

    pub fn end(&self) -> Option<&Xref> {
        self.nodes.last()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, " -{}-> ", self.edges[i - 1])?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

/// Classify by the person-to-person steps a path takes.
///
/// A step enters a family from an individual and leaves it to another
/// individual; it is marital only when both edges are partner edges.
fn classify(edges: &[EdgeKind]) -> PathKind {
    let mut blood = false;
    let mut marital = false;
    let mut i = 0;
    while i < edges.len() {
        let entering = matches!(edges[i], EdgeKind::ChildOf | EdgeKind::SpouseOf);
        if entering && i + 1 < edges.len() {
            if edges[i] == EdgeKind::SpouseOf && edges[i + 1].is_marital() {
                marital = true;
            } else {
                blood = true;
            }
            i += 2;
        } else {
            if edges[i].is_marital() {
                marital = true;
            } else {
                blood = true;
            }
            i += 1;
        }
    }
    match (blood, marital) {
        (true, true) => PathKind::Mixed,
        (false, true) => PathKind::Marital,
        _ => PathKind::Blood,
    }
}

/// Limits and filters for [`all_paths`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOptions {
    /// Longest path, in edges
    pub max_length: usize,
    /// Stop after this many paths
    pub limit: usize,
    /// Keep only paths made of blood steps
    pub blood_only: bool,
    /// Keep only paths made of partner steps
    pub marital_only: bool,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            max_length: 10,
            limit: 1000,
            blood_only: false,
            marital_only: false,
        }
    }
}

impl PathOptions {
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length,
            ..Self::default()
        }
    }

    fn accepts(&self, kind: PathKind) -> bool {
        match kind {
            PathKind::Blood => !self.marital_only,
            PathKind::Marital => !self.blood_only,
            PathKind::Mixed => !self.blood_only && !self.marital_only,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(LineageError::invalid_parameter(
                "path length cap must be at least 1",
            ));
        }
        if self.blood_only && self.marital_only {
            return Err(LineageError::invalid_parameter(
                "blood_only and marital_only are mutually exclusive",
            ));
        }
        if self.limit == 0 {
            return Err(LineageError::invalid_parameter(
                "path limit must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Family-relative neighbours of `node`, ordered by identifier.
///
/// When two edges join the same pair (an edge and its counterpart), the
/// outbound one names the step.
pub(crate) fn neighbours(node: &Node) -> BTreeMap<Xref, EdgeKind> {
    let mut out = BTreeMap::new();
    for id in node.out_edges.iter().filter(|e| e.kind.is_family_relative()) {
        out.entry(id.to.clone()).or_insert(id.kind);
    }
    for id in node.in_edges.iter().filter(|e| e.kind.is_family_relative()) {
        let kind = match id.kind {
            EdgeKind::SpouseOf => spouse_slot(node, &id.from).unwrap_or(EdgeKind::Husband),
            other => other.counterpart().unwrap_or(other),
        };
        out.entry(id.from.clone()).or_insert(kind);
    }
    out
}

fn spouse_slot(family: &Node, partner: &Xref) -> Option<EdgeKind> {
    if family.links.husband.as_ref() == Some(partner) {
        Some(EdgeKind::Husband)
    } else if family.links.wife.as_ref() == Some(partner) {
        Some(EdgeKind::Wife)
    } else {
        None
    }
}

fn check_endpoints<L: NodeLookup + ?Sized>(lookup: &L, from: &Xref, to: &Xref) -> Result<()> {
    lookup.require(from)?;
    lookup.require(to)?;
    if from == to {
        return Err(LineageError::invalid_parameter(format!(
            "path from {} to itself is undefined",
            from
        )));
    }
    Ok(())
}

fn edge_kinds<L: NodeLookup + ?Sized>(lookup: &L, nodes: &[Xref]) -> Result<Vec<EdgeKind>> {
    let mut kinds = Vec::with_capacity(nodes.len().saturating_sub(1));
    for pair in nodes.windows(2) {
        let node = lookup.require(&pair[0])?;
        let kind = neighbours(&node).get(&pair[1]).copied().ok_or_else(|| {
            LineageError::backend(format!("edge {} -> {} vanished", pair[0], pair[1]))
        })?;
        kinds.push(kind);
    }
    Ok(kinds)
}

/// Walk predecessor links from `end` back to the search root
fn chain(parents: &HashMap<Xref, Option<Xref>>, end: &Xref) -> Vec<Xref> {
    let mut out = vec![end.clone()];
    let mut cursor = end;
    while let Some(Some(prev)) = parents.get(cursor) {
        out.push(prev.clone());
        cursor = prev;
    }
    out
}

/// Shortest path by bidirectional breadth-first search.
///
/// Each round expands the smaller frontier by one full level, in identifier
/// order, and every node keeps the first predecessor it was reached from.
/// All meetings found in that round are compared: the shortest joined path
/// wins, then the smallest node sequence. The choice is deterministic, but
/// among several shortest paths it is not always the smallest sequence.
pub fn shortest_path<L: NodeLookup + ?Sized>(
    lookup: &L,
    from: &Xref,
    to: &Xref,
) -> Result<Option<Path>> {
    check_endpoints(lookup, from, to)?;

    let mut forward: HashMap<Xref, Option<Xref>> = HashMap::from([(from.clone(), None)]);
    let mut backward: HashMap<Xref, Option<Xref>> = HashMap::from([(to.clone(), None)]);
    let mut forward_frontier = vec![from.clone()];
    let mut backward_frontier = vec![to.clone()];

    while !forward_frontier.is_empty() && !backward_frontier.is_empty() {
        let expand_forward = forward_frontier.len() <= backward_frontier.len();
        let (frontier, seen, other) = if expand_forward {
            (&mut forward_frontier, &mut forward, &backward)
        } else {
            (&mut backward_frontier, &mut backward, &forward)
        };

        let mut next = Vec::new();
        let mut meetings = Vec::new();
        for xref in frontier.iter() {
            let Some(node) = lookup.node(xref)? else {
                continue;
            };
            for neighbour in neighbours(&node).into_keys() {
                if seen.contains_key(&neighbour) {
                    continue;
                }
                seen.insert(neighbour.clone(), Some(xref.clone()));
                if other.contains_key(&neighbour) {
                    meetings.push(neighbour.clone());
                }
                next.push(neighbour);
            }
        }

        if !meetings.is_empty() {
            let best = meetings
                .into_iter()
                .map(|meet| {
                    let mut nodes = chain(&forward, &meet);
                    nodes.reverse();
                    nodes.extend(chain(&backward, &meet).into_iter().skip(1));
                    nodes
                })
                .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
            return match best {
                Some(nodes) => {
                    let edges = edge_kinds(lookup, &nodes)?;
                    Ok(Some(Path::new(nodes, edges)))
                }
                None => Ok(None),
            };
        }

        next.sort();
        *frontier = next;
    }

    Ok(None)
}

/// Every simple path of at most `options.max_length` edges, shortest first.
///
/// Enumeration stops once `options.limit` accepted paths are found.
pub fn all_paths<L: NodeLookup + ?Sized>(
    lookup: &L,
    from: &Xref,
    to: &Xref,
    options: &PathOptions,
) -> Result<Vec<Path>> {
    options.validate()?;
    check_endpoints(lookup, from, to)?;

    struct Search<'a, L: ?Sized> {
        lookup: &'a L,
        target: &'a Xref,
        options: &'a PathOptions,
        on_path: HashSet<Xref>,
        nodes: Vec<Xref>,
        edges: Vec<EdgeKind>,
        found: Vec<Path>,
    }

    impl<L: NodeLookup + ?Sized> Search<'_, L> {
        fn visit(&mut self, xref: &Xref) -> Result<()> {
            if self.found.len() >= self.options.limit || self.edges.len() >= self.options.max_length
            {
                return Ok(());
            }
            let Some(node) = self.lookup.node(xref)? else {
                return Ok(());
            };
            for (next, kind) in neighbours(&node) {
                if self.found.len() >= self.options.limit {
                    break;
                }
                if self.on_path.contains(&next) {
                    continue;
                }
                self.nodes.push(next.clone());
                self.edges.push(kind);
                if &next == self.target {
                    let path = Path::new(self.nodes.clone(), self.edges.clone());
                    if self.options.accepts(path.kind) {
                        self.found.push(path);
                    }
                } else {
                    self.on_path.insert(next.clone());
                    self.visit(&next)?;
                    self.on_path.remove(&next);
                }
                self.nodes.pop();
                self.edges.pop();
            }
            Ok(())
        }
    }

    let mut search = Search {
        lookup,
        target: to,
        options,
        on_path: HashSet::from([from.clone()]),
        nodes: vec![from.clone()],
        edges: Vec::new(),
        found: Vec::new(),
    };
    search.visit(from)?;

    let mut found = search.found;
    found.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.nodes.cmp(&b.nodes)));
    Ok(found)
}
