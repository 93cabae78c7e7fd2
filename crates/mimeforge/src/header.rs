//! Ordered header storage.

use std::fmt;

/// Ordered collection of message headers.
///
/// Names compare case-insensitively; the spelling used when a header was
/// added is the one written out. Headers serialize in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a header, keeping any existing headers with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Removes every header with the given name.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Sets a header value, replacing any existing values.
    ///
    /// The header moves to the end of the collection.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.add(name, value);
    }

    /// Gets all values for a header, trimmed, in insertion order.
    #[must_use]
    pub fn get(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
            .collect()
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
    }

    /// Returns true if at least one header with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Returns the number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over all headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Writes every header as `Name: value` followed by CRLF, then the blank
/// line that separates headers from the body.
impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            write!(f, "{name}: {value}\r\n")?;
        }
        f.write_str("\r\n")
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.add(name, value);
        }
        headers
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
        assert_eq!(headers.len(), 0);
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), vec!["text/plain"]);
        assert_eq!(headers.get("content-type"), vec!["text/plain"]); // Case insensitive
    }

    #[test]
    fn test_headers_add_keeps_duplicates() {
        let mut headers = Headers::new();
        headers.add("Received", "from a");
        headers.add("received", "from b");
        assert_eq!(headers.get("RECEIVED"), vec!["from a", "from b"]);
        assert_eq!(headers.first("Received"), Some("from a"));
    }

    #[test]
    fn test_headers_get_trims() {
        let mut headers = Headers::new();
        headers.add("Subject", "  padded  ");
        assert_eq!(headers.get("Subject"), vec!["padded"]);
    }

    #[test]
    fn test_headers_get_unknown() {
        let headers = Headers::new();
        assert!(headers.get("X-Missing").is_empty());
        assert_eq!(headers.first("X-Missing"), None);
    }

    #[test]
    fn test_headers_set() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com");
        headers.add("TO", "bob@example.com");
        assert_eq!(headers.get("To").len(), 2);

        headers.set("To", "charlie@example.com");
        assert_eq!(headers.get("to"), vec!["charlie@example.com"]);
    }

    #[test]
    fn test_headers_set_moves_to_end() {
        let mut headers = Headers::new();
        headers.add("From", "a@example.com");
        headers.add("Subject", "hi");
        headers.set("from", "b@example.com");

        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Subject", "from"]);
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        headers.add("X-Other", "kept");
        headers.add("subject", "Again");
        assert!(headers.contains("Subject"));

        headers.remove("SUBJECT");
        assert!(!headers.contains("Subject"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_headers_remove_unknown_is_noop() {
        let mut headers = Headers::new();
        headers.add("From", "a@example.com");
        headers.remove("X-Missing");
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_headers_remove_does_not_match_prefix() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        headers.add("Content-Type-Options", "x");
        headers.remove("Content-Type");
        assert_eq!(headers.get("Content-Type-Options"), vec!["x"]);
    }

    #[test]
    fn test_headers_display() {
        let mut headers = Headers::new();
        headers.add("From", "sender@example.com");
        headers.add("To", "recipient@example.com");

        assert_eq!(
            headers.to_string(),
            "From: sender@example.com\r\nTo: recipient@example.com\r\n\r\n"
        );
    }

    #[test]
    fn test_headers_display_empty() {
        assert_eq!(Headers::new().to_string(), "\r\n");
    }

    #[test]
    fn test_headers_from_iter() {
        let headers: Headers = [("A", "1"), ("B", "2")].into_iter().collect();
        let pairs: Vec<_> = headers.iter().collect();
        assert_eq!(pairs, vec![("A", "1"), ("B", "2")]);
    }

    proptest! {
        #[test]
        fn prop_set_leaves_single_value(
            name in "[A-Za-z][A-Za-z-]{0,15}",
            values in proptest::collection::vec("[a-z0-9@.]{1,20}", 1..8),
        ) {
            let mut headers = Headers::new();
            for value in &values {
                headers.set(name.clone(), value.clone());
            }
            let last = values.last().unwrap().as_str();
            prop_assert_eq!(headers.get(&name.to_uppercase()), vec![last]);
            prop_assert_eq!(headers.len(), 1);
        }

        #[test]
        fn prop_remove_clears_all(
            name in "[A-Za-z][A-Za-z-]{0,15}",
            count in 1usize..6,
        ) {
            let mut headers = Headers::new();
            for i in 0..count {
                headers.add(name.clone(), i.to_string());
            }
            headers.remove(&name.to_lowercase());
            prop_assert!(headers.get(&name).is_empty());
            prop_assert!(headers.is_empty());
        }
    }
}
