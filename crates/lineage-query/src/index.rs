//! Attribute indexes backing filter queries.
//!
//! Each individual's indexed attributes are snapshotted on insert, so
//! removing one node touches only the keys that node contributed.

use crate::store::NodeLookup;
use lineage_core::metadata::{index_tokens, normalize_text};
use lineage_core::{FilterAttributes, Node, Result, Sex, Xref};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

type Posting = BTreeSet<Xref>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexManager {
    attributes: HashMap<Xref, FilterAttributes>,
    names: BTreeMap<String, Posting>,
    name_tokens: BTreeMap<String, Posting>,
    birth_years: BTreeMap<i32, Posting>,
    places: BTreeMap<String, Posting>,
    sex: BTreeMap<Sex, Posting>,
    has_children: Posting,
    has_spouse: Posting,
    living: Posting,
    all: Posting,
}

fn add<K: Ord>(map: &mut BTreeMap<K, Posting>, key: K, xref: &Xref) {
    map.entry(key).or_default().insert(xref.clone());
}

fn drop_key<K: Ord>(map: &mut BTreeMap<K, Posting>, key: &K, xref: &Xref) {
    if let Some(posting) = map.get_mut(key) {
        posting.remove(xref);
        if posting.is_empty() {
            map.remove(key);
        }
    }
}

fn flag(set: &mut Posting, on: bool, xref: &Xref) {
    if on {
        set.insert(xref.clone());
    }
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `attrs` for `xref`, replacing any previous entry
    pub fn insert(&mut self, xref: &Xref, attrs: FilterAttributes) {
        self.remove(xref);

        if let Some(name) = &attrs.name {
            add(&mut self.names, name.clone(), xref);
        }
        for token in attrs.name_tokens() {
            add(&mut self.name_tokens, token, xref);
        }
        if let Some(year) = attrs.birth_year {
            add(&mut self.birth_years, year, xref);
        }
        for token in attrs.place_tokens() {
            add(&mut self.places, token, xref);
        }
        add(&mut self.sex, attrs.sex, xref);
        flag(&mut self.has_children, attrs.has_children, xref);
        flag(&mut self.has_spouse, attrs.has_spouse, xref);
        flag(&mut self.living, attrs.living, xref);
        self.all.insert(xref.clone());
        self.attributes.insert(xref.clone(), attrs);
    }

    /// Drop every entry for `xref`, returning its attributes
    pub fn remove(&mut self, xref: &Xref) -> Option<FilterAttributes> {
        let attrs = self.attributes.remove(xref)?;
        if let Some(name) = &attrs.name {
            drop_key(&mut self.names, name, xref);
        }
        for token in attrs.name_tokens() {
            drop_key(&mut self.name_tokens, &token, xref);
        }
        if let Some(year) = attrs.birth_year {
            drop_key(&mut self.birth_years, &year, xref);
        }
        for token in attrs.place_tokens() {
            drop_key(&mut self.places, &token, xref);
        }
        drop_key(&mut self.sex, &attrs.sex, xref);
        self.has_children.remove(xref);
        self.has_spouse.remove(xref);
        self.living.remove(xref);
        self.all.remove(xref);
        Some(attrs)
    }

    pub fn attributes(&self, xref: &Xref) -> Option<&FilterAttributes> {
        self.attributes.get(xref)
    }

    pub fn contains(&self, xref: &Xref) -> bool {
        self.attributes.contains_key(xref)
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Every indexed individual
    pub fn all(&self) -> &BTreeSet<Xref> {
        &self.all
    }

    fn complement(&self, set: &Posting) -> Posting {
        self.all.difference(set).cloned().collect()
    }

    pub fn by_name_exact(&self, name: &str) -> Posting {
        self.names
            .get(&normalize_text(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Names that start with `prefix`, or have a word that does
    pub fn by_name_prefix(&self, prefix: &str) -> Posting {
        let prefix = normalize_text(prefix);
        if prefix.is_empty() {
            return self.all.clone();
        }
        let mut out = Posting::new();
        for map in [&self.names, &self.name_tokens] {
            for (_, posting) in map
                .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
                .take_while(|(key, _)| key.starts_with(&prefix))
            {
                out.extend(posting.iter().cloned());
            }
        }
        out
    }

    /// Names containing `needle` anywhere; scans distinct names
    pub fn by_name_contains(&self, needle: &str) -> Posting {
        let needle = normalize_text(needle);
        self.names
            .iter()
            .filter(|(name, _)| name.contains(&needle))
            .flat_map(|(_, posting)| posting.iter().cloned())
            .collect()
    }

    /// Names containing every indexable word of `words`
    pub fn by_name_word(&self, words: &str) -> Posting {
        intersect_tokens(&self.name_tokens, &index_tokens(words))
    }

    pub fn by_birth_year(&self, year: i32) -> Posting {
        self.birth_years.get(&year).cloned().unwrap_or_default()
    }

    /// Born within `from..=to`
    pub fn by_birth_year_range(&self, from: i32, to: i32) -> Posting {
        if from > to {
            return Posting::new();
        }
        self.collect_years(self.birth_years.range(from..=to))
    }

    /// Born strictly before `year`
    pub fn born_before(&self, year: i32) -> Posting {
        self.collect_years(self.birth_years.range(..year))
    }

    /// Born strictly after `year`
    pub fn born_after(&self, year: i32) -> Posting {
        self.collect_years(self.birth_years.range((Bound::Excluded(year), Bound::Unbounded)))
    }

    fn collect_years<'a>(&self, range: impl Iterator<Item = (&'a i32, &'a Posting)>) -> Posting {
        range.flat_map(|(_, p)| p.iter().cloned()).collect()
    }

    /// Birth places containing every indexable word of `place`
    pub fn by_place(&self, place: &str) -> Posting {
        intersect_tokens(&self.places, &index_tokens(place))
    }

    pub fn by_sex(&self, sex: Sex) -> Posting {
        self.sex.get(&sex).cloned().unwrap_or_default()
    }

    pub fn with_children(&self, has: bool) -> Posting {
        if has {
            self.has_children.clone()
        } else {
            self.complement(&self.has_children)
        }
    }

    pub fn with_spouse(&self, has: bool) -> Posting {
        if has {
            self.has_spouse.clone()
        } else {
            self.complement(&self.has_spouse)
        }
    }

    pub fn living(&self, living: bool) -> Posting {
        if living {
            self.living.clone()
        } else {
            self.complement(&self.living)
        }
    }

    /// Every individual not in `set`
    pub fn except(&self, set: &Posting) -> Posting {
        self.complement(set)
    }
}

fn intersect_tokens(map: &BTreeMap<String, Posting>, tokens: &[String]) -> Posting {
    let mut postings = Vec::with_capacity(tokens.len());
    for token in tokens {
        match map.get(token) {
            Some(posting) => postings.push(posting),
            None => return Posting::new(),
        }
    }
    postings.sort_by_key(|p| p.len());
    let Some((first, rest)) = postings.split_first() else {
        return Posting::new();
    };
    first
        .iter()
        .filter(|x| rest.iter().all(|p| p.contains(*x)))
        .cloned()
        .collect()
}

/// Indexable attributes of an individual; `None` for other kinds.
///
/// The derived flags look through the individual's partner families: a
/// family with children sets `has_children`, a family with another partner
/// sets `has_spouse`.
pub fn derive_attributes<L: NodeLookup + ?Sized>(
    node: &Node,
    lookup: &L,
) -> Result<Option<FilterAttributes>> {
    let Some(person) = node.individual() else {
        return Ok(None);
    };

    let mut has_children = false;
    let mut has_spouse = false;
    for family in &node.links.spouse_of {
        let Some(family) = lookup.node(family)? else {
            continue;
        };
        has_children |= !family.links.children.is_empty();
        has_spouse |= family.links.partners().any(|p| p != &node.xref);
    }

    Ok(Some(FilterAttributes {
        name: person
            .full_name()
            .map(|n| normalize_text(&n))
            .filter(|n| !n.is_empty()),
        birth_year: person.birth_year,
        birth_place: person
            .birth_place
            .as_deref()
            .map(normalize_text)
            .filter(|p| !p.is_empty()),
        sex: person.sex,
        has_children,
        has_spouse,
        living: person.is_living(),
    }))
}
