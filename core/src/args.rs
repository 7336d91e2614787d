//! Request arguments and their signature.
//!
//! Every call to the API carries an `api_sig`: the lowercase hex MD5 of the
//! shared secret followed by each `key` + raw `value` pair, keys in byte-wise
//! ascending order. The argument set itself is unordered; `canonical()` is the
//! one place an order is imposed.

use std::collections::HashMap;

use md5::{Digest, Md5};

/// Named string arguments for a single API call. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentSet {
    inner: HashMap<String, String>,
}

impl ArgumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an argument, returning the previous value for `key` if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.inner.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All pairs sorted by key, compared byte-wise.
    pub fn canonical(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self.iter().collect();
        pairs.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        pairs
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ArgumentSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for ArgumentSet {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Compute the `api_sig` for `args` under `secret`.
///
/// Values are hashed raw; URL-encoding happens only when the query string is
/// built.
pub fn sign(secret: &str, args: &ArgumentSet) -> String {
    let mut hasher = Md5::new();
    hasher.update(secret.as_bytes());
    for (key, value) in args.canonical() {
        hasher.update(key.as_bytes());
        hasher.update(value.as_bytes());
    }
    hex::encode(hasher.finalize())
}
