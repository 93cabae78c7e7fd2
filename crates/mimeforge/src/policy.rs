//! Rendering policy.

use crate::encoding::BASE64_LINE_LENGTH;

/// Controls the defaults a builder injects when a message is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderPolicy {
    /// When false, an HTML body alone makes the message multipart.
    /// When true, both a text and an HTML body are required.
    /// Attachments always make the message multipart.
    pub strict_multipart: bool,
    /// Replace `Message-ID` with a freshly generated value on every render.
    pub auto_message_id: bool,
    /// Line width for base64 attachment payloads; `None` keeps one line.
    pub base64_line_length: Option<usize>,
}

impl RenderPolicy {
    /// HTML alone triggers multipart and every render gets a new Message-ID.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strict_multipart: false,
            auto_message_id: true,
            base64_line_length: Some(BASE64_LINE_LENGTH),
        }
    }

    /// Multipart only for text plus HTML (or attachments), no Message-ID.
    #[must_use]
    pub const fn conservative() -> Self {
        Self {
            strict_multipart: true,
            auto_message_id: false,
            base64_line_length: Some(BASE64_LINE_LENGTH),
        }
    }

    /// Sets the multipart trigger.
    #[must_use]
    pub const fn with_strict_multipart(mut self, strict: bool) -> Self {
        self.strict_multipart = strict;
        self
    }

    /// Enables or disables Message-ID generation.
    #[must_use]
    pub const fn with_auto_message_id(mut self, enabled: bool) -> Self {
        self.auto_message_id = enabled;
        self
    }

    /// Sets the base64 line width.
    #[must_use]
    pub const fn with_base64_line_length(mut self, width: Option<usize>) -> Self {
        self.base64_line_length = width;
        self
    }

    /// Decides whether a message with this content is multipart.
    #[must_use]
    pub const fn is_multipart(&self, has_text: bool, has_html: bool, has_attachments: bool) -> bool {
        if has_attachments {
            return true;
        }
        if self.strict_multipart {
            has_text && has_html
        } else {
            has_html
        }
    }
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RenderPolicy::default();
        assert!(!policy.strict_multipart);
        assert!(policy.auto_message_id);
        assert_eq!(policy.base64_line_length, Some(76));
    }

    #[test]
    fn test_html_only_trigger() {
        let policy = RenderPolicy::new();
        assert!(policy.is_multipart(false, true, false));
        assert!(policy.is_multipart(true, true, false));
        assert!(!policy.is_multipart(true, false, false));
        assert!(policy.is_multipart(false, false, true));
    }

    #[test]
    fn test_strict_trigger() {
        let policy = RenderPolicy::conservative();
        assert!(!policy.is_multipart(false, true, false));
        assert!(policy.is_multipart(true, true, false));
        assert!(!policy.is_multipart(true, false, false));
        assert!(policy.is_multipart(false, false, true));
    }

    #[test]
    fn test_setters() {
        let policy = RenderPolicy::new()
            .with_strict_multipart(true)
            .with_auto_message_id(false)
            .with_base64_line_length(None);
        assert!(policy.strict_multipart);
        assert!(!policy.auto_message_id);
        assert_eq!(policy.base64_line_length, None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial() {
        let policy: RenderPolicy = serde_json::from_str(r#"{"strict_multipart": true}"#).unwrap();
        assert!(policy.strict_multipart);
        assert!(policy.auto_message_id);
        assert_eq!(policy.base64_line_length, Some(76));
    }
}
