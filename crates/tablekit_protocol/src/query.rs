//! Flat query-string state shared by list views and the filter form.
//!
//! Filters are carried as plain `key=value` pairs keyed by field slug. The
//! reserved keys below belong to the listing shell (pagination, trash toggle,
//! display style) and are never interpreted as field filters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::form_urlencoded;

pub const PARAM_PAGE: &str = "page";
pub const PARAM_PER_PAGE: &str = "perPage";
pub const PARAM_TRASHED: &str = "trashed";
pub const PARAM_STYLE: &str = "style";

pub const RESERVED_PARAMS: [&str; 4] = [PARAM_PAGE, PARAM_PER_PAGE, PARAM_TRASHED, PARAM_STYLE];

pub fn is_reserved_param(key: &str) -> bool {
    RESERVED_PARAMS.contains(&key)
}

/// The decoded query string of a table view.
///
/// Keys are stored sorted so two states with the same parameters encode to
/// the same string - the cache keys on that encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryState {
    params: BTreeMap<String, String>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode from an encoded query string (`a=1&b=2`).
    pub fn decode(raw: &str) -> Self {
        let mut params = BTreeMap::new();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            params.insert(key.into_owned(), value.into_owned());
        }
        Self { params }
    }

    /// Encode into a canonical query string, keys sorted.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Insert a parameter. An empty value removes the key instead - the
    /// query string never carries blank filters.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if value.is_empty() {
            self.params.remove(&key);
        } else {
            self.params.insert(key, value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.params.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All parameters that are candidate field filters (reserved keys skipped).
    pub fn filter_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| !is_reserved_param(k))
    }

    pub fn page(&self) -> u32 {
        self.get(PARAM_PAGE)
            .and_then(|v| v.parse().ok())
            .filter(|&p| p >= 1)
            .unwrap_or(1)
    }

    pub fn set_page(&mut self, page: u32) {
        self.set(PARAM_PAGE, page.to_string());
    }

    pub fn per_page(&self, default: u32) -> u32 {
        self.get(PARAM_PER_PAGE)
            .and_then(|v| v.parse().ok())
            .filter(|&p| p >= 1)
            .unwrap_or(default)
    }

    pub fn trashed(&self) -> bool {
        self.get(PARAM_TRASHED) == Some("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_canonical() {
        let mut a = QueryState::new();
        a.set("b", "2");
        a.set("a", "1");
        let mut b = QueryState::new();
        b.set("a", "1");
        b.set("b", "2");
        assert_eq!(a.encode(), b.encode());
        assert_eq!(a.encode(), "a=1&b=2");
    }

    #[test]
    fn decode_drops_blank_values() {
        let state = QueryState::decode("name=x&status=&page=3");
        assert_eq!(state.get("name"), Some("x"));
        assert!(!state.contains("status"));
        assert_eq!(state.page(), 3);
    }

    #[test]
    fn setting_empty_removes() {
        let mut state = QueryState::new();
        state.set("name", "x");
        state.set("name", "");
        assert!(state.is_empty());
    }

    #[test]
    fn reserved_params_are_not_filters() {
        let state = QueryState::decode("page=2&perPage=50&trashed=true&style=gallery&name=x");
        let filters: Vec<_> = state.filter_params().collect();
        assert_eq!(filters, vec![("name", "x")]);
        assert!(state.trashed());
        assert_eq!(state.per_page(25), 50);
    }

    #[test]
    fn bad_page_falls_back_to_one() {
        let state = QueryState::decode("page=zero");
        assert_eq!(state.page(), 1);
        assert_eq!(QueryState::new().page(), 1);
    }

    #[test]
    fn encoding_escapes_values() {
        let mut state = QueryState::new();
        state.set("name", "a b&c");
        let encoded = state.encode();
        assert_eq!(QueryState::decode(&encoded), state);
    }
}
