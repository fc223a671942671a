//! Records consumed from the parsing layer.
//!
//! The engine makes no assumption about how records were parsed; it only
//! needs the handful of attributes it indexes and the identifiers each
//! record references.

use crate::edge::EdgeKind;
use crate::error::Result;
use crate::id::Xref;
use crate::node::NodeKind;
use crate::traits::RecordSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Recorded sex of an individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    /// Parse a one-letter code (`M`, `F`, anything else is unknown)
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "M" | "MALE" => Sex::Male,
            "F" | "FEMALE" => Sex::Female,
            _ => Sex::Unknown,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Unknown => "U",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualRecord {
    pub given_names: Option<String>,
    pub surname: Option<String>,
    pub sex: Sex,
    pub birth_year: Option<i32>,
    pub birth_place: Option<String>,
    pub death_year: Option<i32>,
    /// Death is known even when no year is recorded
    pub deceased: bool,
    /// Families this individual is a child of
    pub child_of: Vec<Xref>,
    /// Families this individual is a partner in
    pub spouse_of: Vec<Xref>,
    pub notes: Vec<Xref>,
    pub sources: Vec<Xref>,
}

impl IndividualRecord {
    pub fn new(given_names: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            given_names: Some(given_names.into()),
            surname: Some(surname.into()),
            ..Self::default()
        }
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn born(mut self, year: i32, place: Option<&str>) -> Self {
        self.birth_year = Some(year);
        self.birth_place = place.map(str::to_string);
        self
    }

    pub fn died(mut self, year: Option<i32>) -> Self {
        self.death_year = year;
        self.deceased = true;
        self
    }

    /// Given names and surname joined, if either is present
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.given_names.as_deref(), self.surname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// No death has been recorded
    pub fn is_living(&self) -> bool {
        !self.deceased && self.death_year.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRecord {
    pub husband: Option<Xref>,
    pub wife: Option<Xref>,
    pub children: Vec<Xref>,
    pub notes: Vec<Xref>,
    pub sources: Vec<Xref>,
}

impl FamilyRecord {
    pub fn new(husband: Option<&str>, wife: Option<&str>, children: &[&str]) -> Self {
        Self {
            husband: husband.map(Xref::from),
            wife: wife.map(Xref::from),
            children: children.iter().map(|c| Xref::from(*c)).collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub title: Option<String>,
    pub repositories: Vec<Xref>,
    pub notes: Vec<Xref>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub name: Option<String>,
}

/// One parsed record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Individual(IndividualRecord),
    Family(FamilyRecord),
    Note(NoteRecord),
    Source(SourceRecord),
    Repository(RepositoryRecord),
}

/// An identifier referenced by a record, with the edge kind it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: EdgeKind,
    pub target: Xref,
}

impl Record {
    pub fn kind(&self) -> NodeKind {
        match self {
            Record::Individual(_) => NodeKind::Individual,
            Record::Family(_) => NodeKind::Family,
            Record::Note(_) => NodeKind::Note,
            Record::Source(_) => NodeKind::Source,
            Record::Repository(_) => NodeKind::Repository,
        }
    }

    pub fn as_individual(&self) -> Option<&IndividualRecord> {
        match self {
            Record::Individual(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_family(&self) -> Option<&FamilyRecord> {
        match self {
            Record::Family(r) => Some(r),
            _ => None,
        }
    }

    /// Every identifier this record references, in record order
    pub fn references(&self) -> Vec<Reference> {
        fn push(out: &mut Vec<Reference>, kind: EdgeKind, targets: &[Xref]) {
            out.extend(targets.iter().map(|t| Reference {
                kind,
                target: t.clone(),
            }));
        }

        let mut out = Vec::new();
        match self {
            Record::Individual(r) => {
                push(&mut out, EdgeKind::ChildOf, &r.child_of);
                push(&mut out, EdgeKind::SpouseOf, &r.spouse_of);
                push(&mut out, EdgeKind::Note, &r.notes);
                push(&mut out, EdgeKind::Source, &r.sources);
            }
            Record::Family(r) => {
                push(&mut out, EdgeKind::Husband, r.husband.as_slice());
                push(&mut out, EdgeKind::Wife, r.wife.as_slice());
                push(&mut out, EdgeKind::Child, &r.children);
                push(&mut out, EdgeKind::Note, &r.notes);
                push(&mut out, EdgeKind::Source, &r.sources);
            }
            Record::Source(r) => {
                push(&mut out, EdgeKind::Repository, &r.repositories);
                push(&mut out, EdgeKind::Note, &r.notes);
            }
            Record::Note(_) | Record::Repository(_) => {}
        }
        out
    }
}

/// In-memory [`RecordSource`], keyed and iterated in identifier order.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: BTreeMap<Xref, Arc<Record>>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced
    pub fn insert(&mut self, xref: impl Into<Xref>, record: Record) -> Option<Arc<Record>> {
        self.records.insert(xref.into(), Arc::new(record))
    }

    pub fn individual(mut self, xref: &str, record: IndividualRecord) -> Self {
        self.insert(xref, Record::Individual(record));
        self
    }

    pub fn family(mut self, xref: &str, record: FamilyRecord) -> Self {
        self.insert(xref, Record::Family(record));
        self
    }

    pub fn note(mut self, xref: &str, text: &str) -> Self {
        self.insert(
            xref,
            Record::Note(NoteRecord {
                text: text.to_string(),
            }),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSource for RecordSet {
    fn records(&self, kind: NodeKind) -> Result<Vec<(Xref, Arc<Record>)>> {
        Ok(self
            .records
            .iter()
            .filter(|(_, r)| r.kind() == kind)
            .map(|(x, r)| (x.clone(), Arc::clone(r)))
            .collect())
    }

    fn record(&self, xref: &Xref) -> Result<Option<Arc<Record>>> {
        Ok(self.records.get(xref).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_and_living() {
        let r = IndividualRecord::new("John", "Smith");
        assert_eq!(r.full_name().as_deref(), Some("John Smith"));
        assert!(r.is_living());
        assert!(!r.clone().died(None).is_living());
        assert!(!r.died(Some(1901)).is_living());

        let anonymous = IndividualRecord::default();
        assert_eq!(anonymous.full_name(), None);
    }

    #[test]
    fn test_family_references_in_order() {
        let fam = Record::Family(FamilyRecord::new(Some("I1"), Some("I2"), &["I3", "I4"]));
        let refs: Vec<(EdgeKind, String)> = fam
            .references()
            .into_iter()
            .map(|r| (r.kind, r.target.to_string()))
            .collect();
        assert_eq!(
            refs,
            vec![
                (EdgeKind::Husband, "I1".to_string()),
                (EdgeKind::Wife, "I2".to_string()),
                (EdgeKind::Child, "I3".to_string()),
                (EdgeKind::Child, "I4".to_string()),
            ]
        );
    }

    #[test]
    fn test_record_set_lookup_by_kind() {
        let set = RecordSet::new()
            .individual("I1", IndividualRecord::new("Ann", "Lee"))
            .family("F1", FamilyRecord::new(None, Some("I1"), &[]))
            .note("N1", "a note");

        assert_eq!(set.len(), 3);
        let individuals = set.records(NodeKind::Individual).unwrap();
        assert_eq!(individuals.len(), 1);
        assert_eq!(individuals[0].0, Xref::from("I1"));
        assert!(set.record(&Xref::from("F1")).unwrap().is_some());
        assert!(set.record(&Xref::from("F9")).unwrap().is_none());
    }

    #[test]
    fn test_sex_codes() {
        assert_eq!(Sex::from_code("m"), Sex::Male);
        assert_eq!(Sex::from_code("F"), Sex::Female);
        assert_eq!(Sex::from_code("X"), Sex::Unknown);
        assert_eq!(Sex::Female.code(), "F");
    }
}
