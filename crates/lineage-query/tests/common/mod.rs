//! Shared fixtures for lineage-query integration tests.

#![allow(dead_code)]

use lineage_core::{FamilyRecord, IndividualRecord, RecordSet, Sex, Xref};
use lineage_query::Graph;
use std::collections::BTreeSet;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn x(id: &str) -> Xref {
    Xref::from(id)
}

pub fn ids(list: &[&str]) -> BTreeSet<Xref> {
    list.iter().map(|id| Xref::from(*id)).collect()
}

pub fn man(given: &str, surname: &str, born: i32) -> IndividualRecord {
    IndividualRecord::new(given, surname)
        .with_sex(Sex::Male)
        .born(born, None)
}

pub fn woman(given: &str, surname: &str, born: i32) -> IndividualRecord {
    IndividualRecord::new(given, surname)
        .with_sex(Sex::Female)
        .born(born, None)
}

/// Two grandparents, two parents, one grandchild, two families.
///
/// ```text
/// GF + GM -> F1 -> {FA}
/// FA + MO -> F2 -> {KID}
/// ```
pub fn three_generations() -> RecordSet {
    RecordSet::new()
        .individual("GF", man("George", "Hale", 1900).died(Some(1970)))
        .individual("GM", woman("Grace", "Hale", 1902).died(Some(1980)))
        .individual("FA", man("Frank", "Hale", 1930))
        .individual("MO", woman("Mary", "Stone", 1932))
        .individual("KID", woman("Kate", "Hale", 1960))
        .family("F1", FamilyRecord::new(Some("GF"), Some("GM"), &["FA"]))
        .family("F2", FamilyRecord::new(Some("FA"), Some("MO"), &["KID"]))
}

/// [`three_generations`] plus a second child of F1 with their own family,
/// and a couple with no link to anyone else.
///
/// ```text
/// GF + GM -> F1 -> {FA, UNC}
/// FA + MO -> F2 -> {KID}
/// UNC + AUN -> F3 -> {COU}
/// LON + LEY -> F9 -> {}
/// ```
pub fn extended() -> RecordSet {
    three_generations()
        .individual("UNC", man("Ulric", "Hale", 1934))
        .individual("AUN", woman("Alma", "Brook", 1936))
        .individual("COU", man("Colin", "Hale", 1962))
        .individual("LON", man("Leon", "Frey", 1950))
        .individual("LEY", woman("Lena", "Frey", 1951))
        .family("F1", FamilyRecord::new(Some("GF"), Some("GM"), &["FA", "UNC"]))
        .family("F3", FamilyRecord::new(Some("UNC"), Some("AUN"), &["COU"]))
        .family("F9", FamilyRecord::new(Some("LON"), Some("LEY"), &[]))
}

/// Pedigree collapse: first cousins marry, and one of them also has a child
/// with an uncle.
///
/// ```text
/// AA + AB -> P0 -> {S1, S2}
/// S1 + W1 -> P1 -> {C1}
/// H2 + S2 -> P2 -> {C2}
/// C1 + C2 -> P3 -> {PC}
/// S1 + C2 -> P4 -> {Q}
/// ```
pub fn pedigree_collapse() -> RecordSet {
    RecordSet::new()
        .individual("AA", man("Amos", "Vale", 1850))
        .individual("AB", woman("Ada", "Vale", 1852))
        .individual("S1", man("Silas", "Vale", 1875))
        .individual("S2", woman("Sara", "Vale", 1877))
        .individual("W1", woman("Wren", "Marsh", 1878))
        .individual("H2", man("Hugh", "Reed", 1874))
        .individual("C1", man("Cyril", "Vale", 1900))
        .individual("C2", woman("Clara", "Reed", 1902))
        .individual("PC", man("Percy", "Vale", 1925))
        .individual("Q", woman("Quinn", "Vale", 1928))
        .family("P0", FamilyRecord::new(Some("AA"), Some("AB"), &["S1", "S2"]))
        .family("P1", FamilyRecord::new(Some("S1"), Some("W1"), &["C1"]))
        .family("P2", FamilyRecord::new(Some("H2"), Some("S2"), &["C2"]))
        .family("P3", FamilyRecord::new(Some("C1"), Some("C2"), &["PC"]))
        .family("P4", FamilyRecord::new(Some("S1"), Some("C2"), &["Q"]))
}

pub fn build(records: &RecordSet) -> Graph {
    let (graph, report) = Graph::from_records(records).expect("graph builds");
    assert!(report.is_clean(), "unexpected warnings: {:?}", report.warnings);
    graph
}
