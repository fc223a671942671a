//! Whole-graph analytics over family links.
//!
//! Individuals and families form a bipartite graph: two people are one
//! "person hop" apart when they share a family, which is two edges. All
//! distances reported here are in person hops.

use crate::graph::{Graph, Snapshot};
use crate::path::neighbours;
use crate::store::NodeLookup;
use crate::traversal;
use lineage_core::{NodeKind, Result, Xref};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Index-based adjacency of individuals and families.
struct Topology {
    ids: Vec<Xref>,
    individual: Vec<bool>,
    adjacency: Vec<Vec<usize>>,
}

impl Topology {
    fn collect(snapshot: &Snapshot<'_>) -> Result<Self> {
        let mut ids: Vec<Xref> = snapshot
            .state
            .skeleton
            .values()
            .filter(|m| matches!(m.kind, NodeKind::Individual | NodeKind::Family))
            .map(|m| m.xref.clone())
            .collect();
        ids.sort();
        let position: HashMap<&Xref, usize> =
            ids.iter().enumerate().map(|(i, x)| (x, i)).collect();

        let mut individual = Vec::with_capacity(ids.len());
        let mut adjacency = Vec::with_capacity(ids.len());
        for xref in &ids {
            let node = snapshot.require(xref)?;
            individual.push(node.is_individual());
            adjacency.push(
                neighbours(&node)
                    .into_keys()
                    .filter_map(|n| position.get(&n).copied())
                    .collect(),
            );
        }
        Ok(Self {
            ids,
            individual,
            adjacency,
        })
    }

    fn people(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.ids.len()).filter(|&i| self.individual[i])
    }

    /// Edge distances from `source`; unreachable nodes are `None`
    fn distances(&self, source: usize) -> Vec<Option<u32>> {
        let mut dist = vec![None; self.ids.len()];
        dist[source] = Some(0);
        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            let next = dist[v].map_or(0, |d| d + 1);
            for &w in &self.adjacency[v] {
                if dist[w].is_none() {
                    dist[w] = Some(next);
                    queue.push_back(w);
                }
            }
        }
        dist
    }

    /// Brandes dependency accumulation from one source, counting only
    /// individuals as path endpoints
    fn dependencies(&self, source: usize) -> Vec<f64> {
        let n = self.ids.len();
        let mut stack = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist: Vec<i64> = vec![-1; n];
        sigma[source] = 1.0;
        dist[source] = 0;

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &self.adjacency[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            let endpoint = if self.individual[w] { 1.0 } else { 0.0 };
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (endpoint + delta[w]);
            }
        }
        delta[source] = 0.0;
        delta
    }
}

impl Graph {
    /// Number of distinct parents, children, spouses and siblings
    pub fn degree_centrality(&self) -> Result<BTreeMap<Xref, usize>> {
        self.query("degree_centrality", Vec::new(), |s| {
            let mut out = BTreeMap::new();
            for xref in individuals(s) {
                let mut relatives = traversal::parents(s, &xref)?;
                relatives.extend(traversal::children(s, &xref)?);
                relatives.extend(traversal::spouses(s, &xref)?);
                relatives.extend(traversal::siblings(s, &xref)?);
                out.insert(xref, relatives.len());
            }
            Ok(out)
        })
    }

    /// Betweenness of each individual on shortest paths between individuals
    pub fn betweenness_centrality(&self) -> Result<BTreeMap<Xref, f64>> {
        self.query("betweenness_centrality", Vec::new(), |s| {
            let topo = Topology::collect(s)?;
            let sources: Vec<usize> = topo.people().collect();
            let totals = sources
                .par_iter()
                .map(|&s| topo.dependencies(s))
                .reduce(
                    || vec![0.0; topo.ids.len()],
                    |mut acc, part| {
                        for (a, p) in acc.iter_mut().zip(part) {
                            *a += p;
                        }
                        acc
                    },
                );
            // every unordered pair was counted from both ends
            Ok(topo
                .people()
                .map(|i| (topo.ids[i].clone(), totals[i] / 2.0))
                .collect())
        })
    }

    /// Reachable individuals divided by their total person-hop distance
    pub fn closeness_centrality(&self) -> Result<BTreeMap<Xref, f64>> {
        self.query("closeness_centrality", Vec::new(), |s| {
            let topo = Topology::collect(s)?;
            let sources: Vec<usize> = topo.people().collect();
            let scores: Vec<(Xref, f64)> = sources
                .par_iter()
                .map(|&s| {
                    let dist = topo.distances(s);
                    let (reached, total) = topo
                        .people()
                        .filter(|&t| t != s)
                        .filter_map(|t| dist[t])
                        .fold((0u32, 0u32), |(r, sum), d| (r + 1, sum + d / 2));
                    let score = if total == 0 {
                        0.0
                    } else {
                        f64::from(reached) / f64::from(total)
                    };
                    (topo.ids[s].clone(), score)
                })
                .collect();
            Ok(scores.into_iter().collect())
        })
    }

    /// Sets of individuals connected through families, largest first
    pub fn individual_components(&self) -> Result<Vec<BTreeSet<Xref>>> {
        self.query("individual_components", Vec::new(), |s| {
            let topo = Topology::collect(s)?;
            let mut seen = vec![false; topo.ids.len()];
            let mut components = Vec::new();
            for start in topo.people() {
                if seen[start] {
                    continue;
                }
                let dist = topo.distances(start);
                let mut members = BTreeSet::new();
                for (i, d) in dist.iter().enumerate() {
                    if d.is_some() {
                        seen[i] = true;
                        if topo.individual[i] {
                            members.insert(topo.ids[i].clone());
                        }
                    }
                }
                components.push(members);
            }
            components
                .sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.first().cmp(&b.first())));
            Ok(components)
        })
    }

    /// True when every individual can reach every other
    pub fn is_connected(&self) -> Result<bool> {
        Ok(self.individual_components()?.len() <= 1)
    }

    /// Longest shortest person-hop distance between connected individuals
    pub fn diameter(&self) -> Result<Option<u32>> {
        self.query("diameter", Vec::new(), |s| {
            let topo = Topology::collect(s)?;
            let sources: Vec<usize> = topo.people().collect();
            if sources.is_empty() {
                return Ok(None);
            }
            let longest = sources
                .par_iter()
                .map(|&s| {
                    let dist = topo.distances(s);
                    topo.people().filter_map(|t| dist[t]).max().unwrap_or(0) / 2
                })
                .max()
                .unwrap_or(0);
            Ok(Some(longest))
        })
    }

    /// Most common surnames, at most `limit` of them
    pub fn surname_frequencies(&self, limit: usize) -> Result<Vec<(String, usize)>> {
        self.query("surname_frequencies", vec![limit.to_string()], |s| {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for xref in individuals(s) {
                let node = s.require(&xref)?;
                let surname = node
                    .individual()
                    .and_then(|p| p.surname.as_deref())
                    .map(|n| n.replace('/', "").trim().to_string())
                    .filter(|n| !n.is_empty());
                if let Some(surname) = surname {
                    *counts.entry(surname).or_default() += 1;
                }
            }
            let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(limit);
            Ok(ranked)
        })
    }
}

fn individuals(snapshot: &Snapshot<'_>) -> Vec<Xref> {
    let mut ids: Vec<Xref> = snapshot
        .state
        .skeleton
        .values()
        .filter(|m| m.kind == NodeKind::Individual)
        .map(|m| m.xref.clone())
        .collect();
    ids.sort();
    ids
}

#[cfg(test)]
mod tests {
    use lineage_core::{FamilyRecord, IndividualRecord, RecordSet, Xref};

    use crate::Graph;

    /// A+B -> F1 -> {C, D}; C+E -> F2 -> {G}; Z alone
    fn graph() -> Graph {
        let set = RecordSet::new()
            .individual("A", IndividualRecord::new("Ann", "Roe"))
            .individual("B", IndividualRecord::new("Bob", "Roe"))
            .individual("C", IndividualRecord::new("Cy", "Roe"))
            .individual("D", IndividualRecord::new("Di", "Roe"))
            .individual("E", IndividualRecord::new("Eve", "Poe"))
            .individual("G", IndividualRecord::new("Gus", "Roe"))
            .individual("Z", IndividualRecord::new("Zed", "Poe"))
            .family("F1", FamilyRecord::new(Some("A"), Some("B"), &["C", "D"]))
            .family("F2", FamilyRecord::new(Some("C"), Some("E"), &["G"]));
        Graph::from_records(&set).unwrap().0
    }

    #[test]
    fn test_degree_centrality() {
        let degrees = graph().degree_centrality().unwrap();
        // C: parents A, B; sibling D; spouse E; child G
        assert_eq!(degrees[&Xref::from("C")], 5);
        assert_eq!(degrees[&Xref::from("Z")], 0);
    }

    #[test]
    fn test_betweenness_peaks_at_bridge() {
        let scores = graph().betweenness_centrality().unwrap();
        let top = scores
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(x, _)| x.clone())
            .unwrap();
        assert_eq!(top, Xref::from("C"));
        assert_eq!(scores[&Xref::from("Z")], 0.0);
    }

    #[test]
    fn test_components_diameter_and_connectivity() {
        let g = graph();
        let components = g.individual_components().unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].len(), 6);
        assert!(!g.is_connected().unwrap());
        // A to G: A-F1-C-F2-G
        assert_eq!(g.diameter().unwrap(), Some(2));
        assert!(g.closeness_centrality().unwrap()[&Xref::from("C")] > 0.5);
    }

    #[test]
    fn test_surnames() {
        let top = graph().surname_frequencies(1).unwrap();
        assert_eq!(top, vec![("Roe".to_string(), 5)]);
    }

    #[test]
    fn test_repeated_analytics_come_from_cache() {
        let g = graph();
        let first = g.betweenness_centrality().unwrap();
        let hits = g.cache_statistics().hits;
        assert_eq!(g.betweenness_centrality().unwrap(), first);
        assert_eq!(g.diameter().unwrap(), g.diameter().unwrap());
        assert_eq!(g.cache_statistics().hits, hits + 2);

        // A new link invalidates the cached answers
        g.add_edge(lineage_core::Edge::new(
            lineage_core::EdgeKind::Child,
            "F2",
            "Z",
        ))
        .unwrap();
        assert!(g.is_connected().unwrap());
        assert_eq!(g.diameter().unwrap(), Some(2));
        assert_ne!(g.betweenness_centrality().unwrap(), first);
    }
}
