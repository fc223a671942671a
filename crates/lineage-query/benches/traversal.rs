//! Traversal and relationship benchmarks over a synthetic pedigree.
//!
//! Each couple has two children and every child marries someone from
//! outside the tree, so the population doubles per generation.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lineage_core::{FamilyRecord, IndividualRecord, RecordSet, Sex, Xref};
use lineage_query::{Filter, Graph, GraphBuilder};
use std::hint::black_box;

struct Pedigree {
    records: RecordSet,
    root: Xref,
    /// Two individuals in the youngest generation from different branches
    far_pair: (Xref, Xref),
}

fn pedigree(generations: usize) -> Pedigree {
    let mut records = RecordSet::new();
    let mut next_person = 0usize;
    let mut next_family = 0usize;
    let mut person = |records: &mut RecordSet, sex: Sex, year: i32| {
        let xref = format!("I{}", next_person);
        next_person += 1;
        let record = IndividualRecord::new(format!("Given{}", next_person % 97), "Line")
            .with_sex(sex)
            .born(year, Some("Springfield"));
        *records = std::mem::take(records).individual(&xref, record);
        xref
    };

    let root = person(&mut records, Sex::Male, 1500);
    let mut couples = vec![(root.clone(), person(&mut records, Sex::Female, 1502))];
    let mut youngest = Vec::new();

    for generation in 1..=generations {
        let year = 1500 + 25 * generation as i32;
        let mut next = Vec::new();
        youngest.clear();
        for (husband, wife) in &couples {
            let first = person(&mut records, Sex::Male, year);
            let second = person(&mut records, Sex::Female, year + 2);
            let family = format!("F{}", next_family);
            next_family += 1;
            records = records.family(
                &family,
                FamilyRecord::new(
                    Some(husband.as_str()),
                    Some(wife.as_str()),
                    &[first.as_str(), second.as_str()],
                ),
            );
            if generation < generations {
                next.push((first.clone(), person(&mut records, Sex::Female, year + 1)));
                next.push((person(&mut records, Sex::Male, year), second.clone()));
            }
            youngest.push(first);
            youngest.push(second);
        }
        if generation < generations {
            couples = next;
        }
    }

    let far_pair = (
        youngest.first().cloned().unwrap_or_else(|| root.clone()),
        youngest.last().cloned().unwrap_or_else(|| root.clone()),
    );
    Pedigree {
        records,
        root,
        far_pair,
    }
}

fn uncached(pedigree: &Pedigree) -> Graph {
    let mut config = lineage_core::GraphConfig::default();
    config.cache.enabled = false;
    let (graph, _) = GraphBuilder::new(config).build(&pedigree.records).unwrap();
    graph
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for generations in [6, 8, 10] {
        let pedigree = pedigree(generations);
        group.throughput(Throughput::Elements(pedigree.records.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(generations),
            &pedigree,
            |b, pedigree| {
                b.iter(|| GraphBuilder::default().build(black_box(&pedigree.records)).unwrap())
            },
        );
    }
    group.finish();
}

fn bench_traversal(c: &mut Criterion) {
    let pedigree = pedigree(10);
    let graph = uncached(&pedigree);
    let (young, other) = pedigree.far_pair.clone();

    let mut group = c.benchmark_group("traversal");
    group.bench_function("descendants_unbounded", |b| {
        b.iter(|| graph.descendants(black_box(&pedigree.root), 0).unwrap())
    });
    group.bench_function("ancestors_unbounded", |b| {
        b.iter(|| graph.ancestors(black_box(&young), 0).unwrap())
    });
    group.bench_function("cousins_third_degree", |b| {
        b.iter(|| graph.cousins(black_box(&young), 3).unwrap())
    });
    group.bench_function("shortest_path_far_pair", |b| {
        b.iter(|| graph.shortest_path(black_box(&young), black_box(&other)).unwrap())
    });
    group.bench_function("relationship_far_pair", |b| {
        b.iter(|| {
            graph
                .relationship_between(black_box(&young), black_box(&other))
                .unwrap()
        })
    });
    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let pedigree = pedigree(10);
    let (graph, _) = Graph::from_records(&pedigree.records).unwrap();
    let (young, other) = pedigree.far_pair.clone();
    let filter = Filter::new().name_starts_with("given1").born_between(1600, 1700);

    let mut group = c.benchmark_group("cached");
    group.bench_function("relationship_far_pair", |b| {
        b.iter(|| graph.relationship_between(&young, &other).unwrap())
    });
    group.bench_function("filter_name_and_years", |b| {
        b.iter(|| graph.filter(black_box(&filter)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_traversal, bench_cache);
criterion_main!(benches);
