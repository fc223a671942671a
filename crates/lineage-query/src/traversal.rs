//! Kinship walks over family links.
//!
//! Every walk keeps an explicit visited set, so cyclic data and diamond
//! ancestry (one ancestor reachable along several lines) terminate and
//! yield each individual once, at its smallest generation distance.

use crate::store::NodeLookup;
use lineage_core::{LineageError, Node, Result, Xref};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Individuals keyed by generation distance from the starting person.
pub type Generations = BTreeMap<Xref, u32>;

/// Interpret a caller-supplied generation bound: 0 is unbounded.
pub fn generation_limit(max_generations: i32) -> Result<Option<u32>> {
    match max_generations {
        n if n < 0 => Err(LineageError::invalid_parameter(format!(
            "generation bound must not be negative, got {}",
            n
        ))),
        0 => Ok(None),
        n => Ok(Some(n as u32)),
    }
}

fn partners_of_families<L: NodeLookup + ?Sized>(
    lookup: &L,
    families: &[Xref],
) -> Result<BTreeSet<Xref>> {
    let mut out = BTreeSet::new();
    for family in families {
        if let Some(family) = lookup.node(family)? {
            out.extend(family.links.partners().cloned());
        }
    }
    Ok(out)
}

fn children_of_families<L: NodeLookup + ?Sized>(
    lookup: &L,
    families: &[Xref],
) -> Result<BTreeSet<Xref>> {
    let mut out = BTreeSet::new();
    for family in families {
        if let Some(family) = lookup.node(family)? {
            out.extend(family.links.children.iter().cloned());
        }
    }
    Ok(out)
}

fn parents_of<L: NodeLookup + ?Sized>(lookup: &L, person: &Node) -> Result<BTreeSet<Xref>> {
    let mut out = partners_of_families(lookup, &person.links.child_of)?;
    out.remove(&person.xref);
    Ok(out)
}

fn children_of<L: NodeLookup + ?Sized>(lookup: &L, person: &Node) -> Result<BTreeSet<Xref>> {
    let mut out = children_of_families(lookup, &person.links.spouse_of)?;
    out.remove(&person.xref);
    Ok(out)
}

pub fn parents<L: NodeLookup + ?Sized>(lookup: &L, xref: &Xref) -> Result<BTreeSet<Xref>> {
    parents_of(lookup, &*lookup.require_individual(xref)?)
}

pub fn children<L: NodeLookup + ?Sized>(lookup: &L, xref: &Xref) -> Result<BTreeSet<Xref>> {
    children_of(lookup, &*lookup.require_individual(xref)?)
}

pub fn spouses<L: NodeLookup + ?Sized>(lookup: &L, xref: &Xref) -> Result<BTreeSet<Xref>> {
    let person = lookup.require_individual(xref)?;
    let mut out = partners_of_families(lookup, &person.links.spouse_of)?;
    out.remove(xref);
    Ok(out)
}

/// Other children of any family the person is a child of
pub fn siblings<L: NodeLookup + ?Sized>(lookup: &L, xref: &Xref) -> Result<BTreeSet<Xref>> {
    let person = lookup.require_individual(xref)?;
    let mut out = children_of_families(lookup, &person.links.child_of)?;
    out.remove(xref);
    Ok(out)
}

/// Breadth-first walk from `start` using `step` to find the next generation.
fn walk<L, F>(lookup: &L, start: &Xref, max_generations: i32, step: F) -> Result<Generations>
where
    L: NodeLookup + ?Sized,
    F: Fn(&L, &Node) -> Result<BTreeSet<Xref>>,
{
    let limit = generation_limit(max_generations)?;
    let root = lookup.require_individual(start)?;

    let mut found = Generations::new();
    let mut visited: HashSet<Xref> = HashSet::from([start.clone()]);
    let mut frontier = vec![root];
    let mut generation = 0u32;

    while !frontier.is_empty() && limit.is_none_or(|max| generation < max) {
        generation += 1;
        let mut next = Vec::new();
        for node in &frontier {
            for xref in step(lookup, node)? {
                if !visited.insert(xref.clone()) {
                    continue;
                }
                if let Some(relative) = lookup.node(&xref)? {
                    found.insert(xref, generation);
                    next.push(relative);
                }
            }
        }
        frontier = next;
    }

    Ok(found)
}

/// Ancestors within `max_generations` (0 for unbounded)
pub fn ancestors<L: NodeLookup + ?Sized>(
    lookup: &L,
    xref: &Xref,
    max_generations: i32,
) -> Result<Generations> {
    walk(lookup, xref, max_generations, |l, n| parents_of(l, n))
}

/// Descendants within `max_generations` (0 for unbounded)
pub fn descendants<L: NodeLookup + ?Sized>(
    lookup: &L,
    xref: &Xref,
    max_generations: i32,
) -> Result<Generations> {
    walk(lookup, xref, max_generations, |l, n| children_of(l, n))
}

fn at_generation(generations: Generations, generation: u32) -> BTreeSet<Xref> {
    generations
        .into_iter()
        .filter(|(_, g)| *g == generation)
        .map(|(x, _)| x)
        .collect()
}

pub fn grandparents<L: NodeLookup + ?Sized>(lookup: &L, xref: &Xref) -> Result<BTreeSet<Xref>> {
    Ok(at_generation(ancestors(lookup, xref, 2)?, 2))
}

pub fn grandchildren<L: NodeLookup + ?Sized>(lookup: &L, xref: &Xref) -> Result<BTreeSet<Xref>> {
    Ok(at_generation(descendants(lookup, xref, 2)?, 2))
}

/// Siblings of the person's parents
pub fn aunts_and_uncles<L: NodeLookup + ?Sized>(
    lookup: &L,
    xref: &Xref,
) -> Result<BTreeSet<Xref>> {
    let parents = parents(lookup, xref)?;
    let mut out = BTreeSet::new();
    for parent in &parents {
        out.extend(siblings(lookup, parent)?);
    }
    // Half-sibling structures can make a parent the sibling of the other parent.
    for parent in &parents {
        out.remove(parent);
    }
    Ok(out)
}

/// Children of the person's siblings
pub fn nieces_and_nephews<L: NodeLookup + ?Sized>(
    lookup: &L,
    xref: &Xref,
) -> Result<BTreeSet<Xref>> {
    let mut out = BTreeSet::new();
    for sibling in siblings(lookup, xref)? {
        out.extend(children(lookup, &sibling)?);
    }
    out.remove(xref);
    Ok(out)
}

/// What to collect around a person in [`subtree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtreeOptions {
    /// Generations up (0 for unbounded)
    pub ancestor_generations: i32,
    /// Generations down (0 for unbounded)
    pub descendant_generations: i32,
    pub include_siblings: bool,
    pub include_spouses: bool,
}

impl Default for SubtreeOptions {
    fn default() -> Self {
        Self {
            ancestor_generations: 2,
            descendant_generations: 2,
            include_siblings: false,
            include_spouses: false,
        }
    }
}

/// People around one individual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtree {
    pub root: Xref,
    pub ancestors: Generations,
    pub descendants: Generations,
    pub siblings: BTreeSet<Xref>,
    pub spouses: BTreeSet<Xref>,
}

impl Subtree {
    /// Everyone in the subtree, root included
    pub fn members(&self) -> BTreeSet<Xref> {
        let mut out = BTreeSet::from([self.root.clone()]);
        out.extend(self.ancestors.keys().cloned());
        out.extend(self.descendants.keys().cloned());
        out.extend(self.siblings.iter().cloned());
        out.extend(self.spouses.iter().cloned());
        out
    }
}

pub fn subtree<L: NodeLookup + ?Sized>(
    lookup: &L,
    xref: &Xref,
    options: &SubtreeOptions,
) -> Result<Subtree> {
    let ancestors = ancestors(lookup, xref, options.ancestor_generations)?;
    let descendants = descendants(lookup, xref, options.descendant_generations)?;
    let siblings = if options.include_siblings {
        siblings(lookup, xref)?
    } else {
        BTreeSet::new()
    };
    let spouses = if options.include_spouses {
        spouses(lookup, xref)?
    } else {
        BTreeSet::new()
    };
    Ok(Subtree {
        root: xref.clone(),
        ancestors,
        descendants,
        siblings,
        spouses,
    })
}
