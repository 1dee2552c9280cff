use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Ordered header list with case-insensitive lookup.
///
/// Names keep the casing they were inserted with. Inserting a name that is
/// already present (in any casing) replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self { Self::default() }

    /// Look up a header value, ignoring name casing.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool { self.get(name).is_some() }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(&name)) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Add a value, joining it to an existing one with `", "`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(&name)) {
            Some(slot) => {
                slot.1.push_str(", ");
                slot.1.push_str(&value);
            }
            None => self.entries.push((name, value)),
        }
    }

    /// Insert only when no header of that name exists yet.
    pub fn insert_default(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.contains(&name) {
            self.entries.push((name, value.into()));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.entries.iter().position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(index).1)
    }

    /// Overlay `other` on top of `self`; values from `other` win.
    #[must_use]
    pub fn merged(mut self, other: &HeaderMap) -> Self {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
        self
    }

    /// Check that every name is an HTTP token and no value can break the
    /// header block.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.iter() {
            if name.is_empty() || !name.bytes().all(is_token_byte) {
                return Err(Error::InvalidHeader(format!("bad header name '{name}'")));
            }
            if value.bytes().any(|b| matches!(b, b'\r' | b'\n' | b'\0')) {
                return Err(Error::InvalidHeader(format!("bad value for header '{name}'")));
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl From<BTreeMap<String, String>> for HeaderMap {
    fn from(map: BTreeMap<String, String>) -> Self { map.into_iter().collect() }
}

impl From<Vec<(String, String)>> for HeaderMap {
    fn from(entries: Vec<(String, String)>) -> Self { entries.into_iter().collect() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert!(headers.get("accept").is_none());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", "*/*");
        headers.insert("X-Trace", "1");
        headers.insert("accept", "application/json");

        assert_eq!(headers.len(), 2);
        let names: Vec<_> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["Accept", "X-Trace"]);
        assert_eq!(headers.get("Accept"), Some("application/json"));
    }

    #[test]
    fn test_insert_default_keeps_existing() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", "custom/2.0");
        headers.insert_default("User-Agent", "tinyhttp/0.1.0");
        assert_eq!(headers.get("User-Agent"), Some("custom/2.0"));
    }

    #[test]
    fn test_merged_prefers_overlay() {
        let base: HeaderMap = [("Authorization", "Bearer a"), ("Accept", "*/*")].into_iter().collect();
        let overlay: HeaderMap = [("authorization", "Bearer b")].into_iter().collect();

        let merged = base.merged(&overlay);
        assert_eq!(merged.get("Authorization"), Some("Bearer b"));
        assert_eq!(merged.get("Accept"), Some("*/*"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_append_joins_repeated_names() {
        let mut headers = HeaderMap::new();
        headers.append("Vary", "Accept");
        headers.append("vary", "Origin");
        assert_eq!(headers.get("Vary"), Some("Accept, Origin"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_validate() {
        let good: HeaderMap = [("X-Request-Id", "abc 123"), ("Accept", "*/*")].into_iter().collect();
        assert!(good.validate().is_ok());

        let bad_name: HeaderMap = [("Bad Name", "v")].into_iter().collect();
        assert!(matches!(bad_name.validate(), Err(Error::InvalidHeader(_))));

        let bad_value: HeaderMap = [("X-Inject", "a\r\nHost: evil")].into_iter().collect();
        assert!(matches!(bad_value.validate(), Err(Error::InvalidHeader(_))));

        let empty: HeaderMap = [("", "v")].into_iter().collect();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_remove() {
        let mut headers: HeaderMap = [("Location", "/next")].into_iter().collect();
        assert_eq!(headers.remove("location"), Some("/next".to_string()));
        assert!(headers.is_empty());
    }
}
