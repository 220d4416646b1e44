use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Names of favorited items.
///
/// Membership is exact string equality. Serializes as a JSON array of
/// strings; entries are written in sorted order and duplicates in stored
/// input collapse on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoritesSet(BTreeSet<String>);

impl FavoritesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// `self` without `name` if present, otherwise `self` plus `name`.
    pub fn toggled(&self, name: &str) -> Self {
        let mut next = self.0.clone();
        if !next.remove(name) {
            next.insert(name.to_string());
        }
        Self(next)
    }

    /// `self` without `name`. A missing name is not an error.
    pub fn without(&self, name: &str) -> Self {
        let mut next = self.0.clone();
        next.remove(name);
        Self(next)
    }

    /// Encode as the stored JSON array.
    pub fn to_json(&self) -> String {
        // A set of strings always serializes
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Decode the stored JSON array.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl<S: Into<String>> FromIterator<S> for FavoritesSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
