//! Filter predicates evaluated against the attribute indexes.

use crate::index::IndexManager;
use lineage_core::{Sex, Xref};
use std::collections::BTreeSet;
use std::fmt;

/// A test over indexed individual attributes.
///
/// The `Display` rendering is canonical and serves as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    NameContains(String),
    NameExact(String),
    NameStartsWith(String),
    /// Every word must occur in the name
    NameWord(String),
    BirthYear(i32),
    /// Inclusive range
    BirthYearRange(i32, i32),
    BornBefore(i32),
    BornAfter(i32),
    /// Every word must occur in the birth place
    BirthPlace(String),
    Sex(Sex),
    HasChildren(bool),
    HasSpouse(bool),
    Living(bool),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        match self {
            Predicate::And(mut all) => {
                all.push(other);
                Predicate::And(all)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Predicate {
        match self {
            Predicate::Or(mut any) => {
                any.push(other);
                Predicate::Or(any)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Matching individuals, computed from the indexes alone
    pub fn evaluate(&self, index: &IndexManager) -> BTreeSet<Xref> {
        match self {
            Predicate::NameContains(s) => index.by_name_contains(s),
            Predicate::NameExact(s) => index.by_name_exact(s),
            Predicate::NameStartsWith(s) => index.by_name_prefix(s),
            Predicate::NameWord(s) => index.by_name_word(s),
            Predicate::BirthYear(y) => index.by_birth_year(*y),
            Predicate::BirthYearRange(from, to) => index.by_birth_year_range(*from, *to),
            Predicate::BornBefore(y) => index.born_before(*y),
            Predicate::BornAfter(y) => index.born_after(*y),
            Predicate::BirthPlace(s) => index.by_place(s),
            Predicate::Sex(sex) => index.by_sex(*sex),
            Predicate::HasChildren(b) => index.with_children(*b),
            Predicate::HasSpouse(b) => index.with_spouse(*b),
            Predicate::Living(b) => index.living(*b),
            Predicate::And(all) => {
                let mut parts = all.iter();
                let Some(first) = parts.next() else {
                    return index.all().clone();
                };
                let mut acc = first.evaluate(index);
                for part in parts {
                    if acc.is_empty() {
                        break;
                    }
                    let next = part.evaluate(index);
                    acc.retain(|x| next.contains(x));
                }
                acc
            }
            Predicate::Or(any) => any.iter().flat_map(|p| p.evaluate(index)).collect(),
            Predicate::Not(inner) => index.except(&inner.evaluate(index)),
        }
    }
}

fn list(f: &mut fmt::Formatter<'_>, name: &str, parts: &[Predicate]) -> fmt::Result {
    write!(f, "{}(", name)?;
    for (i, p) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", p)?;
    }
    f.write_str(")")
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::NameContains(s) => write!(f, "name_contains({:?})", s),
            Predicate::NameExact(s) => write!(f, "name({:?})", s),
            Predicate::NameStartsWith(s) => write!(f, "name_starts_with({:?})", s),
            Predicate::NameWord(s) => write!(f, "name_word({:?})", s),
            Predicate::BirthYear(y) => write!(f, "birth_year({})", y),
            Predicate::BirthYearRange(a, b) => write!(f, "birth_year_range({}, {})", a, b),
            Predicate::BornBefore(y) => write!(f, "born_before({})", y),
            Predicate::BornAfter(y) => write!(f, "born_after({})", y),
            Predicate::BirthPlace(s) => write!(f, "birth_place({:?})", s),
            Predicate::Sex(sex) => write!(f, "sex({})", sex.code()),
            Predicate::HasChildren(b) => write!(f, "has_children({})", b),
            Predicate::HasSpouse(b) => write!(f, "has_spouse({})", b),
            Predicate::Living(b) => write!(f, "living({})", b),
            Predicate::And(all) => list(f, "and", all),
            Predicate::Or(any) => list(f, "or", any),
            Predicate::Not(inner) => write!(f, "not({})", inner),
        }
    }
}

/// Chaining builder; every added condition must hold.
///
/// ```ignore
/// let filter = Filter::new().name_contains("smith").born_between(1800, 1850);
/// let matches = graph.filter(&filter)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matching(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn name_contains(self, needle: impl Into<String>) -> Self {
        self.matching(Predicate::NameContains(needle.into()))
    }

    pub fn name(self, name: impl Into<String>) -> Self {
        self.matching(Predicate::NameExact(name.into()))
    }

    pub fn name_starts_with(self, prefix: impl Into<String>) -> Self {
        self.matching(Predicate::NameStartsWith(prefix.into()))
    }

    pub fn name_word(self, words: impl Into<String>) -> Self {
        self.matching(Predicate::NameWord(words.into()))
    }

    pub fn birth_year(self, year: i32) -> Self {
        self.matching(Predicate::BirthYear(year))
    }

    pub fn born_between(self, from: i32, to: i32) -> Self {
        self.matching(Predicate::BirthYearRange(from, to))
    }

    pub fn born_before(self, year: i32) -> Self {
        self.matching(Predicate::BornBefore(year))
    }

    pub fn born_after(self, year: i32) -> Self {
        self.matching(Predicate::BornAfter(year))
    }

    pub fn birth_place(self, place: impl Into<String>) -> Self {
        self.matching(Predicate::BirthPlace(place.into()))
    }

    pub fn sex(self, sex: Sex) -> Self {
        self.matching(Predicate::Sex(sex))
    }

    pub fn has_children(self, has: bool) -> Self {
        self.matching(Predicate::HasChildren(has))
    }

    pub fn has_spouse(self, has: bool) -> Self {
        self.matching(Predicate::HasSpouse(has))
    }

    pub fn living(self, living: bool) -> Self {
        self.matching(Predicate::Living(living))
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// The combined predicate; `None` when the filter matches everyone
    pub fn predicate(&self) -> Option<Predicate> {
        match self.predicates.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(Predicate::And(many.to_vec())),
        }
    }

    pub fn evaluate(&self, index: &IndexManager) -> BTreeSet<Xref> {
        match self.predicate() {
            Some(p) => p.evaluate(index),
            None => index.all().clone(),
        }
    }

    /// Cache key for this filter
    pub fn canonical(&self) -> String {
        self.predicate()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "*".to_string())
    }
}

impl From<Predicate> for Filter {
    fn from(predicate: Predicate) -> Self {
        Filter::new().matching(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::FilterAttributes;
    use lineage_core::metadata::normalize_text;

    fn index() -> IndexManager {
        let mut idx = IndexManager::new();
        for (id, name, year, sex, living) in [
            ("I1", "Ada Lovelace", 1815, Sex::Female, false),
            ("I2", "Charles Babbage", 1791, Sex::Male, false),
            ("I3", "Ada Byron", 1990, Sex::Female, true),
        ] {
            idx.insert(
                &id.into(),
                FilterAttributes {
                    name: Some(normalize_text(name)),
                    birth_year: Some(year),
                    sex,
                    living,
                    ..FilterAttributes::default()
                },
            );
        }
        idx
    }

    fn set(ids: &[&str]) -> BTreeSet<Xref> {
        ids.iter().map(|x| Xref::from(*x)).collect()
    }

    #[test]
    fn test_builder_intersects() {
        let idx = index();
        let f = Filter::new().name_starts_with("ada").living(false);
        assert_eq!(f.evaluate(&idx), set(&["I1"]));
        assert_eq!(Filter::new().evaluate(&idx), set(&["I1", "I2", "I3"]));
    }

    #[test]
    fn test_or_and_not() {
        let idx = index();
        let p = Predicate::BornBefore(1800).or(Predicate::BornAfter(1900));
        assert_eq!(p.evaluate(&idx), set(&["I2", "I3"]));
        let p = Predicate::Sex(Sex::Female).negate();
        assert_eq!(p.evaluate(&idx), set(&["I2"]));
        assert_eq!(Predicate::And(vec![]).evaluate(&idx).len(), 3);
    }

    #[test]
    fn test_canonical_rendering() {
        let f = Filter::new().name_contains("Ada").born_between(1800, 1850);
        assert_eq!(
            f.canonical(),
            r#"and(name_contains("Ada"), birth_year_range(1800, 1850))"#
        );
        assert_eq!(Filter::new().canonical(), "*");
        assert_eq!(
            Filter::from(Predicate::Sex(Sex::Male).negate()).canonical(),
            "not(sex(M))"
        );
    }
}
