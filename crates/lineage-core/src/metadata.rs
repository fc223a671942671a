//! Skeleton metadata and filterable attributes.
//!
//! A skeleton row is what a graph needs to answer filter queries and plan
//! lazy loading without materializing the node itself.

use crate::id::Xref;
use crate::node::NodeKind;
use crate::record::Sex;
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_segmentation::UnicodeSegmentation;

/// Shortest word kept as an index token.
pub const MIN_TOKEN_CHARS: usize = 3;

/// Label of a connected component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub u32);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Identifier, kind and component of a node, without its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub xref: Xref,
    pub kind: NodeKind,
    pub component: ComponentId,
}

/// Index-facing attributes of one individual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterAttributes {
    /// Normalized full name
    pub name: Option<String>,
    pub birth_year: Option<i32>,
    /// Normalized birth place
    pub birth_place: Option<String>,
    pub sex: Sex,
    pub has_children: bool,
    pub has_spouse: bool,
    pub living: bool,
}

impl FilterAttributes {
    pub fn name_tokens(&self) -> Vec<String> {
        self.name.as_deref().map(index_tokens).unwrap_or_default()
    }

    pub fn place_tokens(&self) -> Vec<String> {
        self.birth_place.as_deref().map(index_tokens).unwrap_or_default()
    }
}

/// One persisted skeleton row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonRow {
    pub metadata: NodeMetadata,
    /// Present for individuals only
    pub attributes: Option<FilterAttributes>,
}

/// Lowercase, drop surname slashes and collapse whitespace.
pub fn normalize_text(raw: &str) -> String {
    raw.replace('/', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Distinct words of `raw` long enough to index, in first-seen order.
pub fn index_tokens(raw: &str) -> Vec<String> {
    let normalized = normalize_text(raw);
    let mut tokens: Vec<String> = Vec::new();
    for word in normalized.unicode_words() {
        if word.chars().count() >= MIN_TOKEN_CHARS && !tokens.iter().any(|t| t == word) {
            tokens.push(word.to_string());
        }
    }
    tokens
}
