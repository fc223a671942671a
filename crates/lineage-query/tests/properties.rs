//! Property tests over randomly grown family trees.

mod common;

use common::*;
use lineage_core::{Edge, EdgeKind, FamilyRecord, Record, RecordSet, Xref};
use lineage_query::Graph;
use proptest::prelude::*;

/// A tree grown one family at a time: each step pairs two existing people
/// and gives them a new child, so ancestry stays acyclic.
fn family_tree() -> impl Strategy<Value = RecordSet> {
    prop::collection::vec((any::<usize>(), any::<usize>(), any::<bool>()), 1..10).prop_map(
        |steps| {
            let mut people = vec!["I0".to_string(), "I1".to_string()];
            let mut records = RecordSet::new()
                .individual("I0", man("Adam", "Root", 1800))
                .individual("I1", woman("Eve", "Root", 1802));

            for (step, (a, b, with_wife)) in steps.into_iter().enumerate() {
                let husband = people[a % people.len()].clone();
                let wife = people[b % people.len()].clone();
                let wife = (with_wife && wife != husband).then_some(wife);

                let child = format!("I{}", people.len());
                let born = 1830 + 20 * step as i32;
                records = records.individual(&child, man("Kid", &format!("Gen{}", step), born));
                records = records.family(
                    &format!("F{}", step),
                    FamilyRecord::new(Some(husband.as_str()), wife.as_deref(), &[child.as_str()]),
                );
                people.push(child);
            }
            records
        },
    )
}

fn pick(graph: &Graph, index: usize) -> Xref {
    let people: Vec<Xref> = graph.individuals().into_iter().collect();
    people[index % people.len()].clone()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_add_then_remove_node_restores_graph(records in family_tree(), family in any::<usize>()) {
        let graph = build(&records);
        let nodes = graph.node_count();
        let edges = graph.edge_count();
        let index = graph.index_snapshot();

        let families: Vec<Xref> = graph
            .ids_of_kind(lineage_core::NodeKind::Family)
            .into_iter()
            .collect();
        let target = families[family % families.len()].clone();

        graph.add_node("NEW", Record::Individual(woman("Nell", "Probe", 1999))).unwrap();
        graph.add_edge(Edge::new(EdgeKind::ChildOf, "NEW", target.clone())).unwrap();
        prop_assert!(!graph.parents(&x("NEW")).unwrap().is_empty());
        graph.remove_node(&x("NEW")).unwrap();

        prop_assert_eq!(graph.node_count(), nodes);
        prop_assert_eq!(graph.edge_count(), edges);
        prop_assert_eq!(graph.index_snapshot(), index);
        prop_assert!(graph.validate().unwrap().is_empty());
    }

    #[test]
    fn prop_relationship_is_symmetric(records in family_tree(), a in any::<usize>(), b in any::<usize>()) {
        let graph = build(&records);
        let (a, b) = (pick(&graph, a), pick(&graph, b));
        prop_assume!(a != b);

        let forward = graph.relationship_between(&a, &b).unwrap();
        let backward = graph.relationship_between(&b, &a).unwrap();

        prop_assert_eq!(forward.degree, backward.degree);
        prop_assert_eq!(forward.removal, backward.removal);
        prop_assert_eq!(forward.kind, backward.kind.inverse());
        prop_assert_eq!(&forward.common_ancestors, &backward.common_ancestors);
    }

    #[test]
    fn prop_shortest_path_is_no_longer_than_any_path(records in family_tree(), a in any::<usize>(), b in any::<usize>()) {
        let graph = build(&records);
        let (a, b) = (pick(&graph, a), pick(&graph, b));
        prop_assume!(a != b);

        let shortest = graph.shortest_path(&a, &b).unwrap();
        let paths = graph.all_paths(&a, &b, 8).unwrap();

        if let Some(best) = paths.iter().map(|p| p.len()).min() {
            let shortest = shortest.as_ref().expect("a path exists");
            prop_assert!(shortest.len() <= best);
        }
        for path in &paths {
            prop_assert_eq!(path.start(), Some(&a));
            prop_assert_eq!(path.end(), Some(&b));
            prop_assert!(path.len() <= 8);
        }

        graph.clear_cache();
        prop_assert_eq!(graph.shortest_path(&a, &b).unwrap(), shortest);
    }
}
