//! Cross-reference identifiers.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable key naming one record (and its node) within a dataset.
///
/// Identifiers compare lexicographically, which is the ordering every
/// ordered result set and every deterministic tie-break in the engine uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Xref(String);

impl Xref {
    /// Create an identifier, stripping the `@` delimiters some sources keep
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim().trim_matches('@');
        if trimmed.len() == raw.len() {
            Self(raw)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Borrow the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for an empty identifier
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Xref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Xref {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Xref {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Xref> for Xref {
    fn from(x: &Xref) -> Self {
        x.clone()
    }
}

impl From<Xref> for String {
    fn from(x: Xref) -> Self {
        x.0
    }
}

impl AsRef<str> for Xref {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Xref {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Xref {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xref_strips_delimiters() {
        assert_eq!(Xref::new("@I1@").as_str(), "I1");
        assert_eq!(Xref::new(" F2 ").as_str(), "F2");
        assert_eq!(Xref::new("I3").as_str(), "I3");
    }

    #[test]
    fn test_xref_ordering() {
        let mut ids: Vec<Xref> = vec!["I3".into(), "I1".into(), "F1".into()];
        ids.sort();
        assert_eq!(ids, vec![Xref::from("F1"), Xref::from("I1"), Xref::from("I3")]);
    }

    #[test]
    fn test_xref_serde_transparent() {
        let json = serde_json::to_string(&Xref::from("I7")).unwrap();
        assert_eq!(json, "\"I7\"");
        let back: Xref = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Xref::from("I7"));
    }
}
