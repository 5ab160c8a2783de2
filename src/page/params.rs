//! Typed request parameters for view retrieval

use crate::ParamError;
use std::collections::BTreeMap;

/// Query key carrying the continuation token between fragment pages
pub const PAGINATION_KEY: &str = "root";

/// Key added to index fingerprints for element ids found in a page
pub const ID_KEY: &str = "id";

/// Prefix of user-supplied `<pb-param>` values
pub const USER_PREFIX: &str = "user.";

/// An unordered set of request parameters with unique keys
///
/// Backed by a `BTreeMap`, so iteration is always in key order. That makes
/// the fingerprint of a set independent of how it was assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSet {
    values: BTreeMap<String, String>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterates over `(key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns a copy with `key` set to `value`
    pub fn with(&self, key: &str, value: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.values.insert(key.to_string(), value.into());
        copy
    }

    /// Returns a copy with `key` removed
    pub fn without(&self, key: &str) -> Self {
        let mut copy = self.clone();
        copy.values.remove(key);
        copy
    }

    /// Renders the set as reqwest query pairs
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Builder for the parameters of one view
///
/// Only the keys a view may carry are accepted: `odd`, `view`, `xpath` and
/// `user.<name>`. Later calls for the same key replace earlier ones, which is
/// how metadata defaults get overridden by element attributes.
#[derive(Debug, Default)]
pub struct ParamsBuilder {
    params: ParamSet,
}

impl ParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter after validating its key
    ///
    /// # Errors
    ///
    /// * `ParamError::UnknownKey` - The key is not a view parameter
    /// * `ParamError::EmptyUserName` - The key is `user.` with no name
    pub fn set(mut self, key: &str, value: impl Into<String>) -> Result<Self, ParamError> {
        validate_key(key)?;
        self.params.values.insert(key.to_string(), value.into());
        Ok(self)
    }

    /// Sets `odd` verbatim (metadata values already carry the suffix)
    pub fn odd(mut self, odd: impl Into<String>) -> Self {
        self.params.values.insert("odd".to_string(), odd.into());
        self
    }

    /// Sets `odd` from an element attribute, which names the ODD without
    /// its `.odd` suffix
    pub fn odd_attribute(self, name: &str) -> Self {
        self.odd(format!("{}.odd", name))
    }

    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.params.values.insert("view".to_string(), view.into());
        self
    }

    pub fn xpath(mut self, xpath: impl Into<String>) -> Self {
        self.params.values.insert("xpath".to_string(), xpath.into());
        self
    }

    /// Adds a user parameter, stored as `user.<name>`
    pub fn user(self, name: &str, value: impl Into<String>) -> Result<Self, ParamError> {
        if name.is_empty() {
            return Err(ParamError::EmptyUserName);
        }
        self.set(&format!("{}{}", USER_PREFIX, name), value)
    }

    pub fn build(self) -> ParamSet {
        self.params
    }
}

fn validate_key(key: &str) -> Result<(), ParamError> {
    match key {
        "odd" | "view" | "xpath" => Ok(()),
        _ => match key.strip_prefix(USER_PREFIX) {
            Some("") => Err(ParamError::EmptyUserName),
            Some(_) => Ok(()),
            None => Err(ParamError::UnknownKey(key.to_string())),
        },
    }
}
