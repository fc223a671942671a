//! Bulk construction from a record source.
//!
//! Into a resident backend construction runs in passes: one node per
//! record, edges resolved from each record's references, cached links
//! attached, index attributes derived, components labelled, then everything
//! written to the backend.
//!
//! Into any other backend it streams: each node is rebuilt from its own
//! record and the records referencing it, written out with its edges and
//! dropped. Only skeleton metadata, index attributes and the union-find
//! labels stay in memory.
//!
//! The node, resolution and attribute work runs on rayon once the record
//! count reaches the configured threshold.

use crate::graph::{Graph, GraphState};
use crate::index::{IndexManager, derive_attributes};
use crate::lazy::{ComponentLabeler, Components, label_components};
use crate::metrics::GraphMetrics;
use crate::store::NodeLookup;
use crate::warning::BuildWarning;
use lineage_core::config::BuildConfig;
use lineage_core::{
    ComponentId, Edge, EdgeKind, FilterAttributes, GraphBackend, GraphConfig, Node, NodeKind, NodeMetadata,
    Record, RecordSource, Result, SkeletonRow, Xref,
};
use lineage_storage::MemoryBackend;
use rayon::prelude::*;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of a build besides the graph itself.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub warnings: Vec<BuildWarning>,
    pub node_count: usize,
    pub edge_count: usize,
    pub component_count: usize,
    pub duration: Duration,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Nodes with their links attached, before indexing and persistence.
pub(crate) struct Assembly {
    pub(crate) nodes: HashMap<Xref, Arc<Node>>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) warnings: Vec<BuildWarning>,
    /// Whether the record count reached the parallel threshold
    pub(crate) parallel: bool,
}

type Records = BTreeMap<Xref, Arc<Record>>;

/// Read every record, first identifier wins
fn collect_records<S: RecordSource + ?Sized>(
    source: &S,
    warnings: &mut Vec<BuildWarning>,
) -> Result<Records> {
    let mut records = Records::new();
    for kind in NodeKind::ALL {
        for (xref, record) in source.records(kind)? {
            match records.entry(xref) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(slot) => warnings.push(BuildWarning::DuplicateNode {
                    xref: slot.key().clone(),
                    kept: slot.get().kind(),
                    dropped: record.kind(),
                }),
            }
        }
    }
    Ok(records)
}

/// Whether `family` lists `individual` in the role an individual-side
/// reference of `kind` claims
fn confirms(family: &Record, kind: EdgeKind, individual: &Xref) -> bool {
    let Some(family) = family.as_family() else {
        return false;
    };
    match kind {
        EdgeKind::ChildOf => family.children.contains(individual),
        EdgeKind::SpouseOf => {
            family.husband.as_ref() == Some(individual) || family.wife.as_ref() == Some(individual)
        }
        _ => false,
    }
}

/// Edges implied by one record's references.
///
/// Family records create both halves of every family link. Individual-side
/// links are only checked against the family, which is authoritative.
fn resolve(xref: &Xref, record: &Record, records: &Records) -> (Vec<Edge>, Vec<BuildWarning>) {
    let mut edges = Vec::new();
    let mut warnings = Vec::new();
    let mut roles: HashMap<Xref, EdgeKind> = HashMap::new();
    let mut seen: HashSet<(EdgeKind, Xref)> = HashSet::new();

    for reference in record.references() {
        let Some(target) = records.get(&reference.target) else {
            warnings.push(BuildWarning::DanglingReference {
                from: xref.clone(),
                kind: reference.kind,
                target: reference.target,
            });
            continue;
        };
        if !reference.kind.accepts(record.kind(), target.kind()) {
            warnings.push(BuildWarning::WrongTargetKind {
                from: xref.clone(),
                kind: reference.kind,
                target: reference.target,
                found: target.kind(),
            });
            continue;
        }

        match reference.kind {
            EdgeKind::ChildOf | EdgeKind::SpouseOf => {
                if !confirms(target, reference.kind, xref) {
                    warnings.push(BuildWarning::UnconfirmedLink {
                        individual: xref.clone(),
                        kind: reference.kind,
                        family: reference.target,
                    });
                }
            }
            EdgeKind::Husband | EdgeKind::Wife | EdgeKind::Child => {
                if let Some(&kept) = roles.get(&reference.target) {
                    warnings.push(if kept == reference.kind {
                        BuildWarning::DuplicateReference {
                            from: xref.clone(),
                            kind: reference.kind,
                            target: reference.target,
                        }
                    } else {
                        BuildWarning::ConflictingRole {
                            family: xref.clone(),
                            individual: reference.target,
                            kept,
                            dropped: reference.kind,
                        }
                    });
                    continue;
                }
                roles.insert(reference.target.clone(), reference.kind);
                let edge = Edge::new(reference.kind, xref.clone(), reference.target);
                let reverse = match reference.kind {
                    EdgeKind::Child => EdgeKind::ChildOf,
                    _ => EdgeKind::SpouseOf,
                };
                let counterpart = edge.reversed(reverse);
                edges.push(edge);
                edges.push(counterpart);
            }
            _ => {
                if !seen.insert((reference.kind, reference.target.clone())) {
                    warnings.push(BuildWarning::DuplicateReference {
                        from: xref.clone(),
                        kind: reference.kind,
                        target: reference.target,
                    });
                    continue;
                }
                edges.push(Edge::new(reference.kind, xref.clone(), reference.target));
            }
        }
    }
    (edges, warnings)
}

/// Builds single nodes straight from the records.
///
/// A node's links come from its own record and from the records that
/// reference it, so one node can be built without the rest of the graph.
struct Resolver<'a> {
    records: &'a Records,
    referrers: HashMap<Xref, Vec<Xref>>,
}

impl<'a> Resolver<'a> {
    fn new(records: &'a Records) -> Self {
        let mut referrers: HashMap<Xref, Vec<Xref>> = HashMap::new();
        for (xref, record) in records {
            for reference in record.references() {
                let sources = referrers.entry(reference.target).or_default();
                if sources.last() != Some(xref) {
                    sources.push(xref.clone());
                }
            }
        }
        Self { records, referrers }
    }

    /// The node for `record`, links attached in the same order a full
    /// assembly attaches them
    fn build(&self, xref: &Xref, record: &Arc<Record>) -> Node {
        let mut node = Node::new(xref.clone(), Arc::clone(record));
        let mut sources: Vec<&Xref> = self
            .referrers
            .get(xref)
            .map(|r| r.iter().collect())
            .unwrap_or_default();
        sources.push(xref);
        sources.sort();
        sources.dedup();
        for source in sources {
            let Some(source_record) = self.records.get(source) else {
                continue;
            };
            let (edges, _) = resolve(source, source_record, self.records);
            for edge in edges.iter().filter(|e| e.touches(xref)) {
                node.attach(edge);
            }
        }
        node
    }
}

impl NodeLookup for Resolver<'_> {
    fn node(&self, xref: &Xref) -> Result<Option<Arc<Node>>> {
        Ok(self
            .records
            .get(xref)
            .map(|record| Arc::new(self.build(xref, record))))
    }
}

/// One node of a streamed build, ready to write
struct Streamed {
    node: Node,
    edges: Vec<Edge>,
    warnings: Vec<BuildWarning>,
    attributes: Option<FilterAttributes>,
}

/// Nodes built per batch when streaming into a backend
const STREAM_BATCH: usize = 1024;

/// What a build keeps in memory per node until components are labelled
struct Pending {
    kind: NodeKind,
    attributes: Option<FilterAttributes>,
}

/// Index attributes and write skeleton rows once components are labelled
fn finish_skeleton(
    ids: &[Xref],
    pending: Vec<Pending>,
    labels: &HashMap<Xref, ComponentId>,
    edge_count: usize,
    backend: &dyn GraphBackend,
) -> Result<GraphState> {
    let mut state = GraphState {
        edge_count,
        indexes: IndexManager::new(),
        ..GraphState::default()
    };
    for (xref, Pending { kind, attributes }) in ids.iter().zip(pending) {
        let metadata = NodeMetadata {
            xref: xref.clone(),
            kind,
            component: labels.get(xref).copied().unwrap_or(ComponentId(0)),
        };
        if let Some(attrs) = &attributes {
            state.indexes.insert(xref, attrs.clone());
        }
        backend.put_skeleton(SkeletonRow {
            metadata: metadata.clone(),
            attributes,
        })?;
        state.skeleton.insert(xref.clone(), metadata);
    }
    state.components = Components::from_metadata(state.skeleton.values());
    Ok(state)
}

/// Create nodes and attach edges, without touching any backend
pub(crate) fn assemble<S: RecordSource + ?Sized>(
    source: &S,
    config: &BuildConfig,
) -> Result<Assembly> {
    let mut warnings = Vec::new();
    let records = collect_records(source, &mut warnings)?;
    let parallel = config.parallel && records.len() >= config.parallel_threshold;
    debug!(
        "Assembling {} records (parallel: {})",
        records.len(),
        parallel
    );
    let entries: Vec<(&Xref, &Arc<Record>)> = records.iter().collect();

    let make_node = |(xref, record): &(&Xref, &Arc<Record>)| {
        ((*xref).clone(), Node::new((*xref).clone(), Arc::clone(record)))
    };
    let mut nodes: HashMap<Xref, Node> = if parallel {
        entries.par_iter().map(make_node).collect()
    } else {
        entries.iter().map(make_node).collect()
    };

    let resolve_entry = |(xref, record): &(&Xref, &Arc<Record>)| resolve(xref, record, &records);
    let resolved: Vec<(Vec<Edge>, Vec<BuildWarning>)> = if parallel {
        entries.par_iter().map(resolve_entry).collect()
    } else {
        entries.iter().map(resolve_entry).collect()
    };

    let mut edges = Vec::new();
    for (record_edges, record_warnings) in resolved {
        edges.extend(record_edges);
        warnings.extend(record_warnings);
    }

    for edge in &edges {
        if let Some(node) = nodes.get_mut(&edge.from) {
            node.attach(edge);
        }
        if let Some(node) = nodes.get_mut(&edge.to) {
            node.attach(edge);
        }
    }

    Ok(Assembly {
        nodes: nodes
            .into_iter()
            .map(|(xref, node)| (xref, Arc::new(node)))
            .collect(),
        edges,
        warnings,
        parallel,
    })
}

/// Builds a [`Graph`] from a [`RecordSource`].
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    config: GraphConfig,
}

impl GraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Build a fully resident graph on a [`MemoryBackend`]
    pub fn build<S: RecordSource + ?Sized>(&self, source: &S) -> Result<(Graph, BuildReport)> {
        self.build_into(source, Arc::new(MemoryBackend::new()))
    }

    /// Build into `backend`.
    ///
    /// With a non-resident backend the build streams nodes out as they are
    /// made; only the skeleton, components and indexes stay in memory, and
    /// nodes are fetched back lazily.
    pub fn build_into<S: RecordSource + ?Sized>(
        &self,
        source: &S,
        backend: Arc<dyn GraphBackend>,
    ) -> Result<(Graph, BuildReport)> {
        self.config.validate()?;
        let started = Instant::now();

        let (state, warnings) = if backend.is_resident() {
            self.assemble_into(source, backend.as_ref())?
        } else {
            self.stream_into(source, backend.as_ref())?
        };
        backend.flush()?;

        for warning in &warnings {
            warn!("Build warning: {}", warning);
        }

        let duration = started.elapsed();
        let report = BuildReport {
            node_count: state.skeleton.len(),
            edge_count: state.edge_count,
            component_count: state.components.count(),
            warnings,
            duration,
        };
        info!(
            "Built graph on {}: {} nodes, {} edges, {} components, {} warnings in {:?}",
            backend.name(),
            report.node_count,
            report.edge_count,
            report.component_count,
            report.warnings.len(),
            duration
        );

        let metrics = Arc::new(GraphMetrics::new());
        metrics.record_build(duration);
        let graph = Graph::from_parts(state, backend, self.config.clone(), metrics);
        Ok((graph, report))
    }

    /// Assemble the whole graph in memory, then write it out
    fn assemble_into<S: RecordSource + ?Sized>(
        &self,
        source: &S,
        backend: &dyn GraphBackend,
    ) -> Result<(GraphState, Vec<BuildWarning>)> {
        let Assembly {
            nodes,
            edges,
            warnings,
            parallel,
        } = assemble(source, &self.config.build)?;

        let derive = |node: &Arc<Node>| derive_attributes(node, &nodes);
        let mut ids: Vec<Xref> = nodes.keys().cloned().collect();
        ids.sort();
        let ordered: Vec<&Arc<Node>> = ids.iter().filter_map(|x| nodes.get(x)).collect();
        let attributes: Vec<Option<FilterAttributes>> = if parallel {
            ordered.par_iter().map(|n| derive(n)).collect::<Result<_>>()?
        } else {
            ordered.iter().map(|n| derive(n)).collect::<Result<_>>()?
        };
        let labels = label_components(&ids, &edges);

        let mut pending = Vec::with_capacity(ordered.len());
        for (node, attributes) in ordered.into_iter().zip(attributes) {
            backend.put_node(Arc::clone(node))?;
            pending.push(Pending {
                kind: node.kind(),
                attributes,
            });
        }
        let edge_count = edges.len();
        for edge in edges {
            backend.put_edge(edge)?;
        }
        let state = finish_skeleton(&ids, pending, &labels, edge_count, backend)?;
        Ok((state, warnings))
    }

    /// Build, write and drop one node at a time
    fn stream_into<S: RecordSource + ?Sized>(
        &self,
        source: &S,
        backend: &dyn GraphBackend,
    ) -> Result<(GraphState, Vec<BuildWarning>)> {
        let config = &self.config.build;
        let mut warnings = Vec::new();
        let records = collect_records(source, &mut warnings)?;
        let parallel = config.parallel && records.len() >= config.parallel_threshold;
        debug!(
            "Streaming {} records into {} (parallel: {})",
            records.len(),
            backend.name(),
            parallel
        );

        let resolver = Resolver::new(&records);
        let entries: Vec<(&Xref, &Arc<Record>)> = records.iter().collect();
        let ids: Vec<Xref> = records.keys().cloned().collect();
        let mut labeler = ComponentLabeler::new(&ids);
        let mut pending = Vec::with_capacity(ids.len());
        let mut edge_count = 0;

        let make = |(xref, record): &(&Xref, &Arc<Record>)| -> Result<Streamed> {
            let node = resolver.build(xref, record);
            let (edges, warnings) = resolve(xref, record, &records);
            let attributes = derive_attributes(&node, &resolver)?;
            Ok(Streamed {
                node,
                edges,
                warnings,
                attributes,
            })
        };

        for batch in entries.chunks(STREAM_BATCH) {
            let streamed: Vec<Streamed> = if parallel {
                batch.par_iter().map(make).collect::<Result<_>>()?
            } else {
                batch.iter().map(make).collect::<Result<_>>()?
            };
            for item in streamed {
                pending.push(Pending {
                    kind: item.node.kind(),
                    attributes: item.attributes,
                });
                backend.put_node(Arc::new(item.node))?;
                edge_count += item.edges.len();
                for edge in item.edges {
                    labeler.link(&edge);
                    backend.put_edge(edge)?;
                }
                warnings.extend(item.warnings);
            }
        }

        let labels = labeler.labels();
        let state = finish_skeleton(&ids, pending, &labels, edge_count, backend)?;
        Ok((state, warnings))
    }
}

impl Graph {
    /// Build a resident graph with default configuration
    pub fn from_records<S: RecordSource + ?Sized>(source: &S) -> Result<(Graph, BuildReport)> {
        GraphBuilder::default().build(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::{EdgeId, FamilyRecord, IndividualRecord, RecordSet, SourceRecord};
    use lineage_storage::{HybridBackend, MemoryBlobStore};
    use parking_lot::Mutex;

    fn person(given: &str) -> IndividualRecord {
        IndividualRecord::new(given, "Build")
    }

    #[test]
    fn test_family_creates_both_halves() {
        let set = RecordSet::new()
            .individual("I1", person("A"))
            .individual("I2", person("B"))
            .individual("I3", person("C"))
            .family("F1", FamilyRecord::new(Some("I1"), Some("I2"), &["I3"]));
        let (graph, report) = Graph::from_records(&set).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.node_count, 4);
        assert_eq!(report.edge_count, 6);
        assert_eq!(report.component_count, 1);
        assert_eq!(graph.edge_count(), 6);

        let child = graph.node(&"I3".into()).unwrap().unwrap();
        assert_eq!(child.links.child_of, vec![Xref::from("F1")]);
        let family = graph.node(&"F1".into()).unwrap().unwrap();
        assert_eq!(family.links.husband, Some(Xref::from("I1")));
        assert_eq!(family.links.children, vec![Xref::from("I3")]);
    }

    #[test]
    fn test_dangling_and_duplicates_are_warnings() {
        let mut set = RecordSet::new()
            .individual("I1", person("A"))
            .family("F1", FamilyRecord::new(Some("I1"), None, &["I9", "I1"]))
            .note("N1", "text");
        let mut claimant = person("B");
        claimant.child_of.push("F1".into());
        claimant.notes.push("N1".into());
        claimant.notes.push("N1".into());
        set = set.individual("I2", claimant);

        let (graph, report) = Graph::from_records(&set).unwrap();
        let has = |pred: &dyn Fn(&BuildWarning) -> bool| report.warnings.iter().any(pred);
        assert!(has(&|w| matches!(w, BuildWarning::DanglingReference { target, .. } if target.as_str() == "I9")));
        assert!(has(&|w| matches!(w, BuildWarning::ConflictingRole { dropped: EdgeKind::Child, .. })));
        assert!(has(&|w| matches!(w, BuildWarning::UnconfirmedLink { .. })));
        assert!(has(&|w| matches!(w, BuildWarning::DuplicateReference { kind: EdgeKind::Note, .. })));

        // husband pair plus one note edge
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.children(&"I1".into()).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_target_kind() {
        let set = RecordSet::new()
            .note("N1", "not a person")
            .family("F1", FamilyRecord::new(Some("N1"), None, &[]));
        let (_, report) = Graph::from_records(&set).unwrap();
        assert!(matches!(
            report.warnings.as_slice(),
            [BuildWarning::WrongTargetKind { found: NodeKind::Note, .. }]
        ));
    }

    #[test]
    fn test_references_do_not_join_components() {
        let mut set = RecordSet::new();
        set.insert(
            "S1",
            Record::Source(SourceRecord {
                title: Some("Parish register".into()),
                ..SourceRecord::default()
            }),
        );
        let mut a = person("A");
        a.sources.push("S1".into());
        let mut b = person("B");
        b.sources.push("S1".into());
        let set = set.individual("I1", a).individual("I2", b);

        let (graph, report) = Graph::from_records(&set).unwrap();
        assert_eq!(report.component_count, 3);
        assert_ne!(graph.component_of(&"I1".into()), graph.component_of(&"I2".into()));
        assert!(graph.shortest_path(&"I1".into(), &"I2".into()).unwrap().is_none());
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let mut set = RecordSet::new();
        for i in 0..40 {
            set = set.individual(&format!("I{}", i), person("P"));
        }
        for f in 0..10 {
            let kids: Vec<String> = (0..3).map(|k| format!("I{}", 10 + f * 3 + k)).collect();
            let kids: Vec<&str> = kids.iter().map(String::as_str).collect();
            let head = format!("I{}", f);
            set = set.family(
                &format!("F{}", f),
                FamilyRecord::new(Some(head.as_str()), None, &kids),
            );
        }
        let mut config = GraphConfig::default();
        config.build.parallel_threshold = 1;
        let (parallel, _) = GraphBuilder::new(config.clone()).build(&set).unwrap();
        config.build.parallel = false;
        let (sequential, _) = GraphBuilder::new(config).build(&set).unwrap();

        assert_eq!(parallel.edge_count(), sequential.edge_count());
        assert_eq!(parallel.index_snapshot(), sequential.index_snapshot());
        for f in 0..10 {
            let x = Xref::from(format!("F{}", f));
            assert_eq!(parallel.node(&x).unwrap(), sequential.node(&x).unwrap());
        }
    }

    fn mixed_records() -> RecordSet {
        let mut stray = person("D");
        stray.child_of.push("F1".into());
        stray.notes.push("N1".into());
        RecordSet::new()
            .individual("I1", person("A"))
            .individual("I2", person("B"))
            .individual("I3", person("C"))
            .individual("I4", stray)
            .individual("I5", person("E"))
            .family("F1", FamilyRecord::new(Some("I1"), Some("I2"), &["I3", "I9"]))
            .family("F2", FamilyRecord::new(Some("I3"), None, &["I5"]))
            .note("N1", "text")
    }

    #[test]
    fn test_streamed_build_matches_assembled() {
        let set = mixed_records();
        let (resident, resident_report) = Graph::from_records(&set).unwrap();
        let backend = Arc::new(HybridBackend::new(MemoryBlobStore::new(), 4));
        let (streamed, streamed_report) = GraphBuilder::default()
            .build_into(&set, backend)
            .unwrap();

        assert_eq!(streamed_report.warnings, resident_report.warnings);
        assert_eq!(streamed_report.edge_count, resident_report.edge_count);
        assert_eq!(streamed_report.component_count, resident_report.component_count);
        assert_eq!(streamed.index_snapshot(), resident.index_snapshot());
        assert_eq!(streamed.materialized_count(), 0);
        for xref in ["F1", "F2", "I1", "I2", "I3", "I4", "I5", "N1"].map(Xref::from) {
            let xref = &xref;
            assert_eq!(streamed.node(xref).unwrap(), resident.node(xref).unwrap());
            assert_eq!(streamed.metadata(xref), resident.metadata(xref));
        }
        assert!(streamed.attributes(&"I3".into()).unwrap().has_children);
    }

    /// Non-resident backend logging the order of node and edge writes
    #[derive(Default)]
    struct Recording {
        inner: MemoryBackend,
        writes: Mutex<Vec<String>>,
        reads: Mutex<usize>,
    }

    impl GraphBackend for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn get_node(&self, xref: &Xref) -> Result<Option<Arc<Node>>> {
            *self.reads.lock() += 1;
            self.inner.get_node(xref)
        }

        fn get_edge(&self, id: &EdgeId) -> Result<Option<Edge>> {
            self.inner.get_edge(id)
        }

        fn get_edges_of(&self, xref: &Xref) -> Result<Vec<Edge>> {
            self.inner.get_edges_of(xref)
        }

        fn put_node(&self, node: Arc<Node>) -> Result<()> {
            self.writes.lock().push(format!("node {}", node.xref));
            self.inner.put_node(node)
        }

        fn put_edge(&self, edge: Edge) -> Result<()> {
            self.writes.lock().push(format!("edge {}", edge.id()));
            self.inner.put_edge(edge)
        }

        fn delete_node(&self, xref: &Xref) -> Result<()> {
            self.inner.delete_node(xref)
        }

        fn delete_edge(&self, id: &EdgeId) -> Result<()> {
            self.inner.delete_edge(id)
        }

        fn put_skeleton(&self, row: SkeletonRow) -> Result<()> {
            self.inner.put_skeleton(row)
        }

        fn delete_skeleton(&self, xref: &Xref) -> Result<()> {
            self.inner.delete_skeleton(xref)
        }

        fn skeleton(&self) -> Result<Vec<SkeletonRow>> {
            self.inner.skeleton()
        }

        fn node_count(&self) -> Result<usize> {
            self.inner.node_count()
        }

        fn edge_count(&self) -> Result<usize> {
            self.inner.edge_count()
        }
    }

    #[test]
    fn test_streamed_build_writes_each_node_with_its_edges() {
        let backend = Arc::new(Recording::default());
        let (graph, _) = GraphBuilder::default()
            .build_into(&mixed_records(), backend.clone())
            .unwrap();

        let writes = backend.writes.lock().clone();
        let position = |entry: &str| writes.iter().position(|w| w == entry).unwrap();
        // F1's family links go out right after F1, before later records
        let f1_child = EdgeId::new(EdgeKind::Child, "F1", "I3").to_string();
        assert!(position("node F1") < position(&format!("edge {}", f1_child)));
        assert!(position(&format!("edge {}", f1_child)) < position("node I1"));
        assert_eq!(*backend.reads.lock(), 0);
        assert_eq!(backend.edge_count().unwrap(), graph.edge_count());
        assert_eq!(backend.node_count().unwrap(), graph.node_count());
    }
}
