//! Relationship calculation from nearest common ancestors.
//!
//! Degree and removal follow the standard genealogical convention: with
//! `da` and `db` the generation distances from each person to their
//! nearest common ancestor, degree is `min(da, db) - 1` and removal is
//! `|da - db|`. First cousins are degree 1, siblings degree 0.

use crate::path::shortest_path;
use crate::store::NodeLookup;
use crate::traversal::{Generations, ancestors, spouses};
use lineage_core::{LineageError, Result, Xref};
use std::collections::BTreeSet;
use std::fmt;

/// What the second person is to the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    Parent,
    Child,
    Sibling,
    Spouse,
    Ancestor,
    Descendant,
    AuntOrUncle,
    NieceOrNephew,
    Cousin,
    /// Connected, but only through a marriage
    ByMarriage,
    Unrelated,
}

impl RelationshipKind {
    /// The kind seen from the other side
    pub fn inverse(self) -> Self {
        use RelationshipKind::*;
        match self {
            Parent => Child,
            Child => Parent,
            Ancestor => Descendant,
            Descendant => Ancestor,
            AuntOrUncle => NieceOrNephew,
            NieceOrNephew => AuntOrUncle,
            other => other,
        }
    }

    pub fn is_blood(self) -> bool {
        !matches!(
            self,
            RelationshipKind::Spouse | RelationshipKind::ByMarriage | RelationshipKind::Unrelated
        )
    }
}

/// A shared ancestor and its distance from each person
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonAncestor {
    pub xref: Xref,
    pub from_first: u32,
    pub from_second: u32,
}

impl CommonAncestor {
    pub fn combined(&self) -> u32 {
        self.from_first + self.from_second
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub from: Xref,
    pub to: Xref,
    pub kind: RelationshipKind,
    /// Nearest common ancestors, by identifier
    pub common_ancestors: Vec<Xref>,
    /// Cousin degree; `None` for lineal and non-blood relationships
    pub degree: Option<u32>,
    pub removal: u32,
    /// Generation distance from `from` and from `to` to the chosen ancestor
    pub generations: Option<(u32, u32)>,
    pub description: String,
}

impl Relationship {
    fn new(from: &Xref, to: &Xref, kind: RelationshipKind) -> Self {
        let mut rel = Self {
            from: from.clone(),
            to: to.clone(),
            kind,
            common_ancestors: Vec::new(),
            degree: None,
            removal: 0,
            generations: None,
            description: String::new(),
        };
        rel.description = describe(&rel);
        rel
    }

    pub fn is_related(&self) -> bool {
        self.kind != RelationshipKind::Unrelated
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is the {} of {}", self.to, self.description, self.from)
    }
}

/// `1st`, `2nd`, `3rd`, `11th`, `22nd`, ...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

fn removed(removal: u32) -> String {
    match removal {
        0 => String::new(),
        1 => " once removed".to_string(),
        2 => " twice removed".to_string(),
        n => format!(" {} times removed", n),
    }
}

/// `grand`/`great-grand` prefixes for a lineal distance of `generations`
fn lineal(generations: u32, base: &str) -> String {
    match generations {
        0 | 1 => base.to_string(),
        2 => format!("grand{}", base),
        3 => format!("great-grand{}", base),
        n => format!("{}x great-grand{}", n - 2, base),
    }
}

/// `great-` prefixes for aunts, uncles, nieces and nephews
fn collateral(extra: u32, base: &str) -> String {
    match extra {
        0 => base.to_string(),
        1 => format!("great-{}", base),
        n => format!("{}x great-{}", n, base),
    }
}

fn describe(rel: &Relationship) -> String {
    use RelationshipKind::*;
    match rel.kind {
        Parent => "parent".to_string(),
        Child => "child".to_string(),
        Sibling => "sibling".to_string(),
        Spouse => "spouse".to_string(),
        Ancestor => lineal(rel.removal, "parent"),
        Descendant => lineal(rel.removal, "child"),
        AuntOrUncle => collateral(rel.removal.saturating_sub(1), "aunt/uncle"),
        NieceOrNephew => collateral(rel.removal.saturating_sub(1), "niece/nephew"),
        Cousin => format!(
            "{} cousin{}",
            ordinal(rel.degree.unwrap_or(1)),
            removed(rel.removal)
        ),
        ByMarriage => "related by marriage".to_string(),
        Unrelated => "unrelated".to_string(),
    }
}

/// Every ancestor, plus the person at distance 0
fn lineage<L: NodeLookup + ?Sized>(lookup: &L, xref: &Xref) -> Result<Generations> {
    let mut map = ancestors(lookup, xref, 0)?;
    map.insert(xref.clone(), 0);
    Ok(map)
}

fn check_pair<L: NodeLookup + ?Sized>(lookup: &L, a: &Xref, b: &Xref) -> Result<()> {
    lookup.require_individual(a)?;
    lookup.require_individual(b)?;
    if a == b {
        return Err(LineageError::invalid_parameter(format!(
            "relationship of {} to itself is undefined",
            a
        )));
    }
    Ok(())
}

/// Shared ancestors, nearest first.
///
/// Either person counts as an ancestor of the other, at distance 0 from
/// themselves. Ties in combined distance order by the smaller gap between
/// the two sides, then by identifier.
pub fn common_ancestors<L: NodeLookup + ?Sized>(
    lookup: &L,
    a: &Xref,
    b: &Xref,
) -> Result<Vec<CommonAncestor>> {
    check_pair(lookup, a, b)?;
    let first = lineage(lookup, a)?;
    let second = lineage(lookup, b)?;

    let mut shared: Vec<CommonAncestor> = first
        .iter()
        .filter_map(|(xref, &da)| {
            second.get(xref).map(|&db| CommonAncestor {
                xref: xref.clone(),
                from_first: da,
                from_second: db,
            })
        })
        .collect();
    shared.sort_by(|x, y| {
        x.combined()
            .cmp(&y.combined())
            .then_with(|| x.from_first.abs_diff(x.from_second).cmp(&y.from_first.abs_diff(y.from_second)))
            .then_with(|| x.xref.cmp(&y.xref))
    });
    Ok(shared)
}

/// Shared ancestors at the minimal combined distance
pub fn lowest_common_ancestors<L: NodeLookup + ?Sized>(
    lookup: &L,
    a: &Xref,
    b: &Xref,
) -> Result<BTreeSet<Xref>> {
    let shared = common_ancestors(lookup, a, b)?;
    let Some(best) = shared.first().map(CommonAncestor::combined) else {
        return Ok(BTreeSet::new());
    };
    Ok(shared
        .into_iter()
        .take_while(|c| c.combined() == best)
        .map(|c| c.xref)
        .collect())
}

fn blood_kind(da: u32, db: u32) -> RelationshipKind {
    use RelationshipKind::*;
    match (da, db) {
        (0, 1) => Child,
        (0, _) => Descendant,
        (1, 0) => Parent,
        (_, 0) => Ancestor,
        (1, 1) => Sibling,
        (1, _) => NieceOrNephew,
        (_, 1) => AuntOrUncle,
        _ => Cousin,
    }
}

/// What `b` is to `a`.
///
/// Partners are reported as spouses before any blood relationship is
/// considered. Without a common ancestor, any family-relative path makes
/// the pair related by marriage.
pub fn relationship_between<L: NodeLookup + ?Sized>(
    lookup: &L,
    a: &Xref,
    b: &Xref,
) -> Result<Relationship> {
    check_pair(lookup, a, b)?;

    if spouses(lookup, a)?.contains(b) {
        return Ok(Relationship::new(a, b, RelationshipKind::Spouse));
    }

    let shared = common_ancestors(lookup, a, b)?;
    let Some(nearest) = shared.first() else {
        let kind = if shortest_path(lookup, a, b)?.is_some() {
            RelationshipKind::ByMarriage
        } else {
            RelationshipKind::Unrelated
        };
        return Ok(Relationship::new(a, b, kind));
    };

    let (da, db) = (nearest.from_first, nearest.from_second);
    let kind = blood_kind(da, db);
    let mut rel = Relationship::new(a, b, kind);
    rel.common_ancestors = shared
        .iter()
        .take_while(|c| c.combined() == nearest.combined())
        .map(|c| c.xref.clone())
        .collect();
    rel.common_ancestors.sort();
    rel.generations = Some((da, db));
    rel.removal = da.abs_diff(db);
    rel.degree = match kind {
        RelationshipKind::Parent
        | RelationshipKind::Child
        | RelationshipKind::Ancestor
        | RelationshipKind::Descendant => None,
        _ => Some(da.min(db) - 1),
    };
    rel.description = describe(&rel);
    Ok(rel)
}

/// Cousins of exactly `degree` with no removal (1 for first cousins)
pub fn cousins<L: NodeLookup + ?Sized>(
    lookup: &L,
    xref: &Xref,
    degree: u32,
) -> Result<BTreeSet<Xref>> {
    if degree == 0 {
        return Err(LineageError::invalid_parameter(
            "cousin degree starts at 1",
        ));
    }
    let (depth, bound) = degree
        .checked_add(1)
        .and_then(|depth| Some((depth, i32::try_from(depth).ok()?)))
        .ok_or_else(|| {
            LineageError::invalid_parameter(format!("cousin degree {} is too large", degree))
        })?;
    lookup.require_individual(xref)?;

    let mut candidates = BTreeSet::new();
    for (ancestor, generation) in ancestors(lookup, xref, bound)? {
        if generation != depth {
            continue;
        }
        let below = crate::traversal::descendants(lookup, &ancestor, bound)?;
        candidates.extend(
            below
                .into_iter()
                .filter(|(_, g)| *g == depth)
                .map(|(x, _)| x),
        );
    }
    candidates.remove(xref);

    let mut out = BTreeSet::new();
    for candidate in candidates {
        let rel = relationship_between(lookup, xref, &candidate)?;
        if rel.kind == RelationshipKind::Cousin && rel.degree == Some(degree) && rel.removal == 0
        {
            out.insert(candidate);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::lookup_from;
    use lineage_core::{FamilyRecord, IndividualRecord, RecordSet};

    fn person(given: &str) -> IndividualRecord {
        IndividualRecord::new(given, "Kin")
    }

    /// G1+G2 -> F1 -> {P1, P3}
    /// P1+P2 -> F2 -> {C1, C2}
    /// P3+P4 -> F3 -> {C3}
    /// C3+S1 -> F4 -> {D1}
    /// X1 unrelated; S1's parent SP in F5
    fn records() -> RecordSet {
        let mut set = RecordSet::new();
        for id in [
            "G1", "G2", "P1", "P2", "P3", "P4", "C1", "C2", "C3", "S1", "D1", "X1", "SP",
        ] {
            set = set.individual(id, person(id));
        }
        set.family("F1", FamilyRecord::new(Some("G1"), Some("G2"), &["P1", "P3"]))
            .family("F2", FamilyRecord::new(Some("P1"), Some("P2"), &["C1", "C2"]))
            .family("F3", FamilyRecord::new(Some("P3"), Some("P4"), &["C3"]))
            .family("F4", FamilyRecord::new(Some("C3"), Some("S1"), &["D1"]))
            .family("F5", FamilyRecord::new(Some("SP"), None, &["S1"]))
    }

    fn rel(a: &str, b: &str) -> Relationship {
        let l = lookup_from(&records());
        relationship_between(&l, &a.into(), &b.into()).unwrap()
    }

    #[test]
    fn test_ordinals() {
        let got: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 101, 111]
            .into_iter()
            .map(ordinal)
            .collect();
        assert_eq!(
            got,
            ["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "101st", "111th"]
        );
    }

    #[test]
    fn test_lineal() {
        let r = rel("C1", "P1");
        assert_eq!(r.kind, RelationshipKind::Parent);
        assert_eq!(r.degree, None);

        let r = rel("C1", "G1");
        assert_eq!(r.kind, RelationshipKind::Ancestor);
        assert_eq!(r.removal, 2);
        assert_eq!(r.description, "grandparent");

        let r = rel("G2", "D1");
        assert_eq!(r.kind, RelationshipKind::Descendant);
        assert_eq!(r.description, "great-grandchild");
    }

    #[test]
    fn test_siblings_list_both_parents() {
        let r = rel("C1", "C2");
        assert_eq!(r.kind, RelationshipKind::Sibling);
        assert_eq!(r.degree, Some(0));
        assert_eq!(r.common_ancestors, vec![Xref::from("P1"), Xref::from("P2")]);
    }

    #[test]
    fn test_cousins_and_removal() {
        let r = rel("C1", "C3");
        assert_eq!(r.kind, RelationshipKind::Cousin);
        assert_eq!(r.degree, Some(1));
        assert_eq!(r.removal, 0);
        assert_eq!(r.description, "1st cousin");

        let r = rel("C1", "D1");
        assert_eq!(r.kind, RelationshipKind::Cousin);
        assert_eq!(r.removal, 1);
        assert_eq!(r.description, "1st cousin once removed");
    }

    #[test]
    fn test_aunts_and_nieces() {
        let r = rel("C1", "P3");
        assert_eq!(r.kind, RelationshipKind::AuntOrUncle);
        assert_eq!(r.description, "aunt/uncle");
        let r = rel("P3", "C1");
        assert_eq!(r.kind, RelationshipKind::NieceOrNephew);
        assert_eq!(rel("P1", "D1").description, "great-niece/nephew");
    }

    #[test]
    fn test_symmetric_degree() {
        for (a, b) in [("C1", "C3"), ("C1", "D1"), ("P1", "C3"), ("C2", "G1")] {
            let ab = rel(a, b);
            let ba = rel(b, a);
            assert_eq!(ab.degree, ba.degree);
            assert_eq!(ab.removal, ba.removal);
            assert_eq!(ab.kind.inverse(), ba.kind);
        }
    }

    #[test]
    fn test_spouse_marriage_unrelated() {
        assert_eq!(rel("P1", "P2").kind, RelationshipKind::Spouse);
        assert_eq!(rel("C3", "SP").kind, RelationshipKind::ByMarriage);
        let r = rel("C1", "X1");
        assert_eq!(r.kind, RelationshipKind::Unrelated);
        assert!(!r.is_related());
    }

    #[test]
    fn test_invalid_pairs() {
        let l = lookup_from(&records());
        assert!(
            relationship_between(&l, &"C1".into(), &"C1".into())
                .unwrap_err()
                .is_invalid_parameter()
        );
        assert!(
            relationship_between(&l, &"C1".into(), &"F1".into())
                .unwrap_err()
                .is_invalid_parameter()
        );
    }

    #[test]
    fn test_cousin_degree_out_of_range() {
        let l = lookup_from(&records());
        for degree in [u32::MAX, i32::MAX as u32] {
            let err = cousins(&l, &"C1".into(), degree).unwrap_err();
            assert!(err.is_invalid_parameter());
        }
        assert!(cousins(&l, &"C1".into(), 7).unwrap().is_empty());
    }

    #[test]
    fn test_lowest_common_ancestors_and_cousins() {
        let l = lookup_from(&records());
        let lca = lowest_common_ancestors(&l, &"C1".into(), &"C3".into()).unwrap();
        assert_eq!(lca, BTreeSet::from([Xref::from("G1"), Xref::from("G2")]));

        let first = cousins(&l, &"C1".into(), 1).unwrap();
        assert_eq!(first, BTreeSet::from([Xref::from("C3")]));
        assert!(cousins(&l, &"C1".into(), 0).is_err());
    }
}
