//! Finalized MIME message structure and serialization.

use crate::attachment::Attachment;
use crate::content_type::ContentType;
use crate::encoding::{decode_base64, wrap_lines};
use crate::error::Result;
use crate::header::Headers;
use std::fmt;

/// Text written before the first boundary of a multipart body.
pub const MULTIPART_PREAMBLE: &str = "This is a multi-part message in MIME format.";

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// Base64 encoding.
    Base64,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("base64") {
            Self::Base64
        } else {
            Self::SevenBit
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

/// Body of a part: either content or a nested multipart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    /// Encoded content.
    Content(String),
    /// Nested multipart section.
    Multipart(Multipart),
}

/// MIME message part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body.
    pub body: PartBody,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: PartBody) -> Self {
        Self { headers, body }
    }

    /// Creates the plain-text alternative.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::seven_bit(&ContentType::text_plain(), text)
    }

    /// Creates the HTML alternative.
    #[must_use]
    pub fn html(html: &str) -> Self {
        Self::seven_bit(&ContentType::text_html(), html)
    }

    /// Creates an attachment part, wrapping the payload at `line_length`.
    #[must_use]
    pub fn attachment(attachment: &Attachment, line_length: Option<usize>) -> Self {
        let name = attachment.name();
        let mut headers = Headers::new();
        headers.add(
            "Content-Type",
            format!("{}; name=\"{name}\"", attachment.content_type()),
        );
        headers.add("Content-Transfer-Encoding", TransferEncoding::Base64.to_string());
        headers.add("Content-Disposition", format!("inline; filename=\"{name}\""));

        let payload = wrap_lines(attachment.payload(), line_length.unwrap_or(0));
        Self::new(headers, PartBody::Content(payload))
    }

    /// Wraps a multipart section as a part of an enclosing multipart.
    #[must_use]
    pub fn nested(multipart: Multipart, content_type: &ContentType) -> Self {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());
        Self::new(headers, PartBody::Multipart(multipart))
    }

    fn seven_bit(content_type: &ContentType, content: &str) -> Self {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());
        headers.add("Content-Transfer-Encoding", TransferEncoding::SevenBit.to_string());
        Self::new(headers, PartBody::Content(content.to_string()))
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .first("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .first("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns the `filename` from `Content-Disposition`, if any.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        let disposition = self.headers.first("content-disposition")?;
        let (_, rest) = disposition.split_once("filename=")?;
        Some(rest.split(';').next().unwrap_or_default().trim().trim_matches('"'))
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// Nested multipart bodies decode to their serialized form.
    ///
    /// # Errors
    ///
    /// Returns an error if base64 decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match (&self.body, self.transfer_encoding()) {
            (PartBody::Content(content), TransferEncoding::Base64) => decode_base64(content),
            (PartBody::Content(content), TransferEncoding::SevenBit) => {
                Ok(content.clone().into_bytes())
            }
            (PartBody::Multipart(multipart), _) => Ok(multipart.to_string().into_bytes()),
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headers)?;
        match &self.body {
            PartBody::Content(content) => f.write_str(content),
            PartBody::Multipart(multipart) => write!(f, "{multipart}"),
        }
    }
}

/// Boundary-delimited sequence of parts.
///
/// Serializes as `--boundary` sections separated by blank lines and closed
/// by `--boundary--`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    boundary: String,
    parts: Vec<Part>,
}

impl Multipart {
    /// Creates a multipart section.
    #[must_use]
    pub fn new(boundary: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            boundary: boundary.into(),
            parts,
        }
    }

    /// Boundary delimiting the parts.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Parts in order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }
}

impl fmt::Display for Multipart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let boundary = &self.boundary;
        for part in &self.parts {
            write!(f, "--{boundary}\r\n{part}\r\n\r\n")?;
        }
        write!(f, "--{boundary}--")
    }
}

/// Top-level message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Plain text written verbatim.
    Single(String),
    /// Multipart body, written after the preamble.
    Multipart(Multipart),
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(text) => f.write_str(text),
            Self::Multipart(multipart) => write!(f, "{MULTIPART_PREAMBLE}\r\n\r\n{multipart}"),
        }
    }
}

/// Finalized MIME message.
///
/// Produced by [`MessageBuilder::build`](crate::MessageBuilder::build); its
/// `Display` output is the wire form handed to a mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    headers: Headers,
    body: Body,
}

impl Message {
    /// Creates a message from finalized headers and body.
    #[must_use]
    pub const fn new(headers: Headers, body: Body) -> Self {
        Self { headers, body }
    }

    /// Message headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Message body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Gets the content type, `text/plain` when the header is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .first("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Checks if this message has a multipart body.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.body, Body::Multipart(_))
    }

    /// Top-level multipart section, if any.
    #[must_use]
    pub const fn multipart(&self) -> Option<&Multipart> {
        match &self.body {
            Body::Multipart(multipart) => Some(multipart),
            Body::Single(_) => None,
        }
    }

    /// Attachment parts in order.
    pub fn attachments(&self) -> impl Iterator<Item = &Part> {
        self.multipart()
            .into_iter()
            .flat_map(|multipart| multipart.parts())
            .filter(|part| part.filename().is_some())
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.first("from")
    }

    /// Gets the To header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers.first("to")
    }

    /// Gets the Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.first("subject")
    }

    /// Gets the Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.headers.first("date")
    }

    /// Gets the Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.headers.first("message-id")
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.headers, self.body)
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

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse(" BASE64 "), TransferEncoding::Base64);
    }

    #[test]
    fn test_text_part_display() {
        let part = Part::text("hello");
        assert_eq!(
            part.to_string(),
            "Content-Type: text/plain; charset=ISO-8859-1; format=flowed\r\n\
             Content-Transfer-Encoding: 7bit\r\n\r\nhello"
        );
        assert_eq!(part.decode_body().unwrap(), b"hello");
    }

    #[test]
    fn test_attachment_part_headers() {
        let attachment = Attachment::new("a.txt", "text/plain", b"hi");
        let part = Part::attachment(&attachment, Some(76));
        assert_eq!(
            part.headers.get("Content-Type"),
            vec!["text/plain; name=\"a.txt\""]
        );
        assert_eq!(part.transfer_encoding(), TransferEncoding::Base64);
        assert_eq!(part.filename(), Some("a.txt"));
        assert_eq!(part.decode_body().unwrap(), b"hi");
    }

    #[test]
    fn test_attachment_part_wraps_payload() {
        let attachment = Attachment::new("big.bin", "application/octet-stream", &[7u8; 200]);
        let part = Part::attachment(&attachment, Some(76));
        let PartBody::Content(payload) = &part.body else {
            panic!("expected content body");
        };
        assert!(payload.split("\r\n").all(|line| line.len() <= 76));
        assert_eq!(part.decode_body().unwrap(), vec![7u8; 200]);

        let unwrapped = Part::attachment(&attachment, None);
        let PartBody::Content(payload) = &unwrapped.body else {
            panic!("expected content body");
        };
        assert!(!payload.contains("\r\n"));
    }

    #[test]
    fn test_multipart_display() {
        let multipart = Multipart::new("B", vec![Part::text("t"), Part::html("h")]);
        let rendered = multipart.to_string();
        assert!(rendered.starts_with("--B\r\nContent-Type: text/plain"));
        assert!(rendered.contains("\r\n\r\nt\r\n\r\n--B\r\nContent-Type: text/html"));
        assert!(rendered.ends_with("\r\n\r\nh\r\n\r\n--B--"));
    }

    #[test]
    fn test_nested_part_display() {
        let inner = Multipart::new("IN", vec![Part::text("t")]);
        let part = Part::nested(inner, &ContentType::multipart_alternative("IN"));
        assert_eq!(
            part.to_string(),
            "Content-Type: multipart/alternative; boundary=\"IN\"\r\n\r\n\
             --IN\r\nContent-Type: text/plain; charset=ISO-8859-1; format=flowed\r\n\
             Content-Transfer-Encoding: 7bit\r\n\r\nt\r\n\r\n--IN--"
        );
    }

    #[test]
    fn test_message_single_part() {
        let headers: Headers = [
            ("From", "sender@example.com"),
            ("To", "recipient@example.com"),
            ("Subject", "Test"),
        ]
        .into_iter()
        .collect();
        let message = Message::new(headers, Body::Single("Hello, World!".to_string()));

        assert_eq!(message.from(), Some("sender@example.com"));
        assert_eq!(message.to(), Some("recipient@example.com"));
        assert_eq!(message.subject(), Some("Test"));
        assert!(!message.is_multipart());
        assert_eq!(message.attachments().count(), 0);
        assert!(message.to_string().ends_with("Subject: Test\r\n\r\nHello, World!"));
    }

    #[test]
    fn test_message_multipart() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "multipart/mixed; boundary=\"abc123\"");
        let attachment = Attachment::new("x.bin", "application/octet-stream", b"x");
        let body = Body::Multipart(Multipart::new(
            "abc123",
            vec![Part::text("Part 1"), Part::attachment(&attachment, None)],
        ));
        let message = Message::new(headers, body);

        assert!(message.is_multipart());
        assert_eq!(message.content_type().unwrap().boundary(), Some("abc123"));
        assert_eq!(message.multipart().unwrap().parts().len(), 2);
        assert_eq!(message.attachments().count(), 1);
        assert!(message.to_string().contains(MULTIPART_PREAMBLE));
    }
}
