//! Copy-on-write path parameters.

use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Parameters captured along the matched branch of the router tree.
///
/// Cloning is cheap; a node that captures parameters builds a new map from
/// its parent's, so sibling branches never observe each other's captures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Arc<HashMap<String, String>>);

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of parameter `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns true if `name` was captured.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no parameter was captured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true if both sets share the same storage.
    pub fn shares_storage_with(&self, other: &Params) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// New set holding these parameters overlaid with `captured`.
    pub(crate) fn extended(&self, captured: HashMap<String, String>) -> Self {
        let mut map = HashMap::with_capacity(self.0.len() + captured.len());
        map.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        map.extend(captured);
        Self(Arc::new(map))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(Arc::new(
            iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
