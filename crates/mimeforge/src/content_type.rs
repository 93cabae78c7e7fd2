//! MIME content type handling.

use crate::error::{Error, Result};
use std::fmt;

/// Charset used for generated text parts.
pub const DEFAULT_CHARSET: &str = "ISO-8859-1";

/// Parameters that are always written quoted.
const ALWAYS_QUOTED: &[&str] = &["boundary", "name", "filename"];

/// MIME content type with parameters.
///
/// Parameters keep their insertion order so serialized headers are stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=ISO-8859-1, boundary=xxx).
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates the `text/plain` type used for the plain-text alternative.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain")
            .with_parameter("charset", DEFAULT_CHARSET)
            .with_parameter("format", "flowed")
    }

    /// Creates the `text/html` type used for the HTML alternative.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", DEFAULT_CHARSET)
    }

    /// Creates a multipart/mixed content type with boundary.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_parameter("boundary", boundary)
    }

    /// Creates a multipart/alternative content type with boundary.
    #[must_use]
    pub fn multipart_alternative(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "alternative").with_parameter("boundary", boundary)
    }

    /// Adds a parameter, replacing an existing one with the same key.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self
            .parameters
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some(index) => self.parameters[index].1 = value,
            None => self.parameters.push((key, value)),
        }
        self
    }

    /// Returns a parameter value by key.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Returns the `type/subtype` essence without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="value2"`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        let type_str = parts.next().unwrap_or_default().trim();
        let (main_type, sub_type) = type_str
            .split_once('/')
            .map(|(main, sub)| (main.trim(), sub.trim()))
            .filter(|(main, sub)| !main.is_empty() && !sub.is_empty())
            .ok_or_else(|| Error::InvalidContentType(s.to_string()))?;

        let mut content_type = Self::new(main_type.to_lowercase(), sub_type.to_lowercase());

        for param in parts {
            if let Some((key, value)) = param.trim().split_once('=') {
                content_type = content_type
                    .with_parameter(key.trim().to_lowercase(), value.trim().trim_matches('"'));
            }
        }

        Ok(content_type)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;

        for (key, value) in &self.parameters {
            let special =
                value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c));
            if special || ALWAYS_QUOTED.contains(&key.as_str()) {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_new() {
        let ct = ContentType::new("text", "plain");
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert!(ct.parameters.is_empty());
    }

    #[test]
    fn test_text_plain() {
        let ct = ContentType::text_plain();
        assert_eq!(ct.charset(), Some("ISO-8859-1"));
        assert_eq!(
            ct.to_string(),
            "text/plain; charset=ISO-8859-1; format=flowed"
        );
    }

    #[test]
    fn test_text_html() {
        assert_eq!(
            ContentType::text_html().to_string(),
            "text/html; charset=ISO-8859-1"
        );
    }

    #[test]
    fn test_multipart_mixed() {
        let ct = ContentType::multipart_mixed("boundary123");
        assert_eq!(ct.main_type, "multipart");
        assert_eq!(ct.sub_type, "mixed");
        assert_eq!(ct.boundary(), Some("boundary123"));
        assert!(ct.is_multipart());
    }

    #[test]
    fn test_boundary_always_quoted() {
        let ct = ContentType::multipart_alternative("plain");
        assert_eq!(ct.to_string(), "multipart/alternative; boundary=\"plain\"");
    }

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("text/plain; charset=utf-8").unwrap();
        assert_eq!(ct.essence(), "text/plain");
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn test_content_type_parse_quoted() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_NextPart_123\"").unwrap();
        assert_eq!(ct.essence(), "multipart/mixed");
        assert_eq!(ct.boundary(), Some("----=_NextPart_123"));
    }

    #[test]
    fn test_content_type_parse_no_space() {
        let ct = ContentType::parse("Multipart/Alternative;boundary=\"b\"").unwrap();
        assert_eq!(ct.essence(), "multipart/alternative");
        assert_eq!(ct.boundary(), Some("b"));
    }

    #[test]
    fn test_content_type_parse_invalid() {
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("text/").is_err());
    }

    #[test]
    fn test_with_parameter_replaces() {
        let ct = ContentType::new("text", "plain")
            .with_parameter("charset", "utf-8")
            .with_parameter("CHARSET", "iso-8859-1");
        assert_eq!(ct.parameters.len(), 1);
        assert_eq!(ct.charset(), Some("iso-8859-1"));
    }
}
