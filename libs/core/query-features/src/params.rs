use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys consumed by the pipeline itself and never treated as filters.
pub const RESERVED_KEYS: [&str; 5] = ["page", "sort", "limit", "fields", "keyword"];

/// Flat string-keyed request parameters, shaped like an HTTP query string.
///
/// Keys are kept ordered so translation is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string such as `page=2&price[gte]=10&keyword=red%20shoe`.
    ///
    /// A leading `?` is ignored, `+` decodes to a space and keys without a
    /// value map to the empty string. Segments that fail percent-decoding are
    /// kept verbatim. Repeated keys keep the last value.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        query
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.split_once('=') {
                Some((key, value)) => (decode(key), decode(value)),
                None => (decode(segment), String::new()),
            })
            .collect()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parameters left after removing `excluded` keys
    pub fn without<'a>(
        &'a self,
        excluded: &'a [&'a str],
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.iter().filter(move |(k, _)| !excluded.contains(k))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for RequestParams {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl From<std::collections::HashMap<String, String>> for RequestParams {
    fn from(map: std::collections::HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_string_decodes_brackets_and_spaces() {
        let params =
            RequestParams::from_query_string("?price%5Bgte%5D=10&keyword=red+shoe&page=2");
        assert_eq!(params.get("price[gte]"), Some("10"));
        assert_eq!(params.get("keyword"), Some("red shoe"));
        assert_eq!(params.get("page"), Some("2"));
    }

    #[test]
    fn test_from_query_string_key_without_value() {
        let params = RequestParams::from_query_string("flag&&name=x");
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_without_skips_reserved_keys() {
        let params = RequestParams::new()
            .with("page", "1")
            .with("sort", "-price")
            .with("brand", "acme");
        let left: Vec<_> = params.without(&RESERVED_KEYS).collect();
        assert_eq!(left, vec![("brand", "acme")]);
    }
}
