//! Message builder.
//!
//! The builder owns the mutable state of a message being composed: headers,
//! text and HTML bodies, attachments, and the two boundaries chosen when it
//! was created. [`MessageBuilder::build`] finalizes the required headers in
//! place and returns an immutable [`Message`].

use crate::attachment::{AttachmentSet, TypeResolver};
use crate::boundary::generate_boundary;
use crate::clock::{Clock, SystemClock, format_date, format_message_id};
use crate::content_type::{ContentType, DEFAULT_CHARSET};
use crate::error::Result;
use crate::header::Headers;
use crate::message::{Body, Message, Multipart, Part};
use crate::policy::RenderPolicy;
use rand::Rng;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Wraps an HTML fragment in a complete document.
#[must_use]
pub fn wrap_html(fragment: &str) -> String {
    format!(
        "<html>\n<head>\n<meta content=\"text/html;charset={DEFAULT_CHARSET}\" \
         http-equiv=\"Content-Type\">\n</head>\n\
         <body bgcolor=\"#ffffff\" text=\"#000000\">\n{fragment}\n</body>\n</html>"
    )
}

/// Builder for MIME messages.
///
/// Not synchronized: share across threads only behind a lock.
#[derive(Clone)]
pub struct MessageBuilder {
    headers: Headers,
    text: Option<String>,
    html: Option<String>,
    attachments: AttachmentSet,
    outer_boundary: String,
    inner_boundary: String,
    policy: RenderPolicy,
    clock: Arc<dyn Clock>,
    id_nonce: u64,
    renders: u32,
}

impl MessageBuilder {
    /// Creates a builder with boundaries drawn from the thread RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(&mut rand::thread_rng())
    }

    /// Creates a builder drawing its boundaries and Message-ID nonce from
    /// `rng`.
    #[must_use]
    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let outer_boundary = generate_boundary(rng);
        let inner_boundary = generate_boundary(rng);
        Self {
            headers: Headers::new(),
            text: None,
            html: None,
            attachments: AttachmentSet::new(),
            outer_boundary,
            inner_boundary,
            policy: RenderPolicy::default(),
            clock: Arc::new(SystemClock),
            id_nonce: rng.r#gen(),
            renders: 0,
        }
    }

    /// Sets the rendering policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RenderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the time source for `Date` and `Message-ID`.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Sets the content type resolver used by later attachments.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl TypeResolver + 'static) -> Self {
        self.attachments.set_resolver(resolver);
        self
    }

    /// Replaces the generated boundaries.
    #[must_use]
    pub fn with_boundaries(mut self, outer: impl Into<String>, inner: impl Into<String>) -> Self {
        self.outer_boundary = outer.into();
        self.inner_boundary = inner.into();
        self
    }

    /// Current rendering policy.
    #[must_use]
    pub const fn policy(&self) -> &RenderPolicy {
        &self.policy
    }

    /// Boundary of the multipart/mixed layer.
    #[must_use]
    pub fn outer_boundary(&self) -> &str {
        &self.outer_boundary
    }

    /// Boundary of the multipart/alternative layer.
    #[must_use]
    pub fn inner_boundary(&self) -> &str {
        &self.inner_boundary
    }

    /// Headers as currently stored.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the headers.
    pub const fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Appends a header.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.add(name, value);
        self
    }

    /// Sets a header, removing other values with the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.set(name, value);
        self
    }

    /// Removes every header with the given name.
    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.headers.remove(name);
        self
    }

    /// Gets all values of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Vec<&str> {
        self.headers.get(name)
    }

    /// Sets the `To` header.
    pub fn set_to(&mut self, to: impl Into<String>) -> &mut Self {
        self.set_header("To", to)
    }

    /// Gets the `To` header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers.first("To")
    }

    /// Sets the `From` header.
    pub fn set_from(&mut self, from: impl Into<String>) -> &mut Self {
        self.set_header("From", from)
    }

    /// Gets the `From` header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.first("From")
    }

    /// Sets the `Subject` header.
    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.set_header("Subject", subject)
    }

    /// Gets the `Subject` header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.first("Subject")
    }

    /// Sets the `CC` header.
    pub fn set_cc(&mut self, cc: impl Into<String>) -> &mut Self {
        self.set_header("CC", cc)
    }

    /// Gets the `CC` header.
    #[must_use]
    pub fn cc(&self) -> Option<&str> {
        self.headers.first("CC")
    }

    /// Sets the `Reply-To` header.
    pub fn set_reply_to(&mut self, reply_to: impl Into<String>) -> &mut Self {
        self.set_header("Reply-To", reply_to)
    }

    /// Gets the `Reply-To` header.
    #[must_use]
    pub fn reply_to(&self) -> Option<&str> {
        self.headers.first("Reply-To")
    }

    /// Sets the plain-text body.
    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(text.into());
        self
    }

    /// Plain-text body, if set.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Sets the HTML body from a fragment, wrapped in a full document.
    pub fn set_html(&mut self, fragment: &str) -> &mut Self {
        self.html = Some(wrap_html(fragment));
        self
    }

    /// Sets the HTML body verbatim.
    pub fn set_raw_html(&mut self, html: impl Into<String>) -> &mut Self {
        self.html = Some(html.into());
        self
    }

    /// HTML body, if set.
    #[must_use]
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }

    /// Attaches a file under its base name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read; the builder is unchanged.
    pub fn attach(&mut self, path: impl AsRef<Path>, content_type: Option<&str>) -> Result<&mut Self> {
        self.attachments.attach(path, content_type)?;
        Ok(self)
    }

    /// Attaches a file under the given display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read; the builder is unchanged.
    pub fn attach_as(
        &mut self,
        path: impl AsRef<Path>,
        name: impl Into<String>,
        content_type: Option<&str>,
    ) -> Result<&mut Self> {
        self.attachments.attach_as(path, name, content_type)?;
        Ok(self)
    }

    /// Attaches the contents of an open stream under the given display name.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails; the builder is unchanged.
    pub fn attach_reader<R: Read>(
        &mut self,
        reader: R,
        name: impl Into<String>,
        content_type: Option<&str>,
    ) -> Result<&mut Self> {
        self.attachments.attach_reader(reader, name, content_type)?;
        Ok(self)
    }

    /// Attachments added so far.
    #[must_use]
    pub const fn attachments(&self) -> &AttachmentSet {
        &self.attachments
    }

    /// Returns true if the current content renders as multipart.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.policy.is_multipart(
            self.text.is_some(),
            self.html.is_some(),
            !self.attachments.is_empty(),
        )
    }

    /// Finalizes the headers and returns the message.
    ///
    /// Adds `Date` if absent, regenerates `Message-ID` when the policy asks
    /// for it, and for multipart content adds `MIME-Version` and
    /// `Content-Type` if absent. These headers stay on the builder, so a
    /// later build keeps the same `Date`.
    pub fn build(&mut self) -> Message {
        let multipart = self.is_multipart();
        tracing::trace!(
            multipart,
            attachments = self.attachments.len(),
            "Building message"
        );

        self.finalize_headers(multipart);

        let body = if multipart {
            Body::Multipart(self.multipart_body())
        } else {
            Body::Single(self.text.clone().unwrap_or_default())
        };

        Message::new(self.headers.clone(), body)
    }

    /// Finalizes the headers and returns the wire form of the message.
    pub fn render(&mut self) -> String {
        self.build().to_string()
    }

    fn finalize_headers(&mut self, multipart: bool) {
        let now = self.clock.now();

        if !self.headers.contains("Date") {
            self.headers.add("Date", format_date(&now));
        }

        if self.policy.auto_message_id {
            self.renders = self.renders.wrapping_add(1);
            let token = format!("{:016x}{}", self.id_nonce, self.renders);
            let id = format_message_id(&now, std::process::id(), &token);
            tracing::debug!(message_id = %id, "Assigned Message-ID");
            self.headers.set("Message-ID", id);
        }

        if multipart {
            if !self.headers.contains("MIME-Version") {
                self.headers.add("MIME-Version", "1.0");
            }
            if !self.headers.contains("Content-Type") {
                let content_type = if self.attachments.is_empty() {
                    ContentType::multipart_alternative(&self.inner_boundary)
                } else {
                    ContentType::multipart_mixed(&self.outer_boundary)
                };
                self.headers.add("Content-Type", content_type.to_string());
            }
        }
    }

    fn multipart_body(&self) -> Multipart {
        let alternative = Multipart::new(
            self.inner_boundary.clone(),
            vec![
                Part::text(self.text.as_deref().unwrap_or_default()),
                Part::html(self.html.as_deref().unwrap_or_default()),
            ],
        );

        if self.attachments.is_empty() {
            return alternative;
        }

        let line_length = self.policy.base64_line_length;
        let mut parts = Vec::with_capacity(self.attachments.len() + 1);
        parts.push(Part::nested(
            alternative,
            &ContentType::multipart_alternative(&self.inner_boundary),
        ));
        parts.extend(
            self.attachments
                .iter()
                .map(|attachment| Part::attachment(attachment, line_length)),
        );
        Multipart::new(self.outer_boundary.clone(), parts)
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBuilder")
            .field("headers", &self.headers)
            .field("text", &self.text)
            .field("html", &self.html)
            .field("attachments", &self.attachments)
            .field("outer_boundary", &self.outer_boundary)
            .field("inner_boundary", &self.inner_boundary)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
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
    use crate::clock::FixedClock;
    use chrono::DateTime;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn builder() -> MessageBuilder {
        let instant = DateTime::parse_from_rfc3339("2024-03-15T10:30:00+00:00").unwrap();
        MessageBuilder::from_rng(&mut StdRng::seed_from_u64(9))
            .with_clock(FixedClock::new(instant))
            .with_boundaries("OUTER", "INNER")
    }

    #[test]
    fn test_boundaries_fixed_at_construction() {
        let mut rng = StdRng::seed_from_u64(3);
        let builder = MessageBuilder::from_rng(&mut rng);
        assert!(crate::boundary::is_valid_boundary(builder.outer_boundary()));
        assert!(crate::boundary::is_valid_boundary(builder.inner_boundary()));
        assert_ne!(builder.outer_boundary(), builder.inner_boundary());
    }

    #[test]
    fn test_convenience_accessors() {
        let mut b = builder();
        b.set_to("a@example.com")
            .set_from("b@example.com")
            .set_subject("Hi")
            .set_cc("c@example.com")
            .set_reply_to("d@example.com");

        assert_eq!(b.to(), Some("a@example.com"));
        assert_eq!(b.from(), Some("b@example.com"));
        assert_eq!(b.subject(), Some("Hi"));
        assert_eq!(b.cc(), Some("c@example.com"));
        assert_eq!(b.reply_to(), Some("d@example.com"));
    }

    #[test]
    fn test_set_to_twice_keeps_one() {
        let mut b = builder();
        b.set_to("test@test.com");
        b.set_to("test@test2.com");
        assert_eq!(b.header("to"), vec!["test@test2.com"]);

        let rendered = b.render();
        let count = rendered.lines().filter(|l| l.starts_with("To:")).count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unset_accessors_are_none() {
        let b = builder();
        assert_eq!(b.to(), None);
        assert_eq!(b.reply_to(), None);
        assert!(b.header("X-Anything").is_empty());
    }

    #[test]
    fn test_wrap_html() {
        let html = wrap_html("<b>hi</b>");
        assert!(html.starts_with("<html>\n<head>\n<meta content=\"text/html;charset=ISO-8859-1\""));
        assert!(html.contains("<body bgcolor=\"#ffffff\" text=\"#000000\">\n<b>hi</b>\n</body>"));
        assert!(html.ends_with("</html>"));
    }

    #[test]
    fn test_raw_html_is_verbatim() {
        let mut b = builder();
        b.set_raw_html("<p>raw</p>");
        assert_eq!(b.html(), Some("<p>raw</p>"));
    }

    #[test]
    fn test_date_added_once() {
        let mut b = builder();
        b.set_text("x");
        let first = b.build();
        let second = b.build();
        assert_eq!(first.date(), Some("Fri, 15 Mar 2024 10:30:00 +0000"));
        assert_eq!(b.header("Date").len(), 1);
        assert_eq!(first.date(), second.date());
    }

    #[test]
    fn test_existing_date_kept() {
        let mut b = builder();
        b.add_header("Date", "Tue, 15 Nov 1994 08:12:31 GMT");
        let message = b.build();
        assert_eq!(message.date(), Some("Tue, 15 Nov 1994 08:12:31 GMT"));
    }

    #[test]
    fn test_message_id_regenerated_each_build() {
        let mut b = builder();
        let first = b.build().message_id().unwrap().to_string();
        let second = b.build().message_id().unwrap().to_string();
        assert_ne!(first, second);
        assert_eq!(b.header("Message-ID").len(), 1);
        assert!(first.starts_with("<1710498600.000000."));
        assert!(first.ends_with('>'));
    }

    #[test]
    fn test_no_message_id_when_disabled() {
        let mut b = builder().with_policy(RenderPolicy::conservative());
        let message = b.build();
        assert_eq!(message.message_id(), None);
    }

    #[test]
    fn test_plain_message_has_no_mime_headers() {
        let mut b = builder();
        b.set_text("X");
        let message = b.build();
        assert!(!message.is_multipart());
        assert!(message.headers().get("MIME-Version").is_empty());
        assert!(message.headers().get("Content-Type").is_empty());
        assert!(message.to_string().ends_with("\r\n\r\nX"));
    }

    #[test]
    fn test_html_only_is_alternative() {
        let mut b = builder();
        b.set_html("<b>hi</b>");
        let message = b.build();
        assert!(message.is_multipart());
        assert_eq!(message.headers().get("MIME-Version"), vec!["1.0"]);
        assert_eq!(
            message.headers().get("Content-Type"),
            vec!["multipart/alternative; boundary=\"INNER\""]
        );
        assert_eq!(message.multipart().unwrap().boundary(), "INNER");
    }

    #[test]
    fn test_strict_policy_html_only_is_plain() {
        let mut b = builder().with_policy(RenderPolicy::conservative());
        b.set_html("<b>hi</b>");
        assert!(!b.is_multipart());
        b.set_text("hi");
        assert!(b.is_multipart());
    }

    #[test]
    fn test_attachment_makes_mixed() {
        let mut b = builder();
        b.set_text("body");
        b.attach_reader(&b"data"[..], "data.bin", Some("application/octet-stream"))
            .unwrap();
        let message = b.build();
        assert_eq!(
            message.headers().get("Content-Type"),
            vec!["multipart/mixed; boundary=\"OUTER\""]
        );
        let parts = message.multipart().unwrap().parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].content_type().unwrap().boundary(), Some("INNER"));
        assert_eq!(message.attachments().count(), 1);
    }

    #[test]
    fn test_existing_content_type_kept() {
        let mut b = builder();
        b.set_header("Content-Type", "multipart/related; boundary=\"custom\"");
        b.set_html("x");
        let message = b.build();
        assert_eq!(
            message.headers().get("content-type"),
            vec!["multipart/related; boundary=\"custom\""]
        );
    }

    #[test]
    fn test_existing_mime_version_kept() {
        let mut b = builder();
        b.set_header("mime-version", "1.0 (custom)");
        b.set_html("x");
        let rendered = b.render();
        let lines: Vec<&str> = rendered
            .split("\r\n")
            .filter(|l| l.to_ascii_lowercase().starts_with("mime-version:"))
            .collect();
        assert_eq!(lines, vec!["mime-version: 1.0 (custom)"]);
        assert_eq!(b.header("MIME-Version"), vec!["1.0 (custom)"]);
    }

    #[test]
    fn test_headers_mut_edits_are_rendered() {
        let mut b = builder();
        b.set_text("x");
        b.headers_mut().add("X-Mailer", "mimeforge");
        b.headers_mut().add("X-Mailer", "second");
        assert_eq!(b.header("x-mailer"), vec!["mimeforge", "second"]);

        b.headers_mut().remove("X-MAILER");
        assert!(!b.render().contains("X-Mailer"));
    }

    #[test]
    fn test_failed_attach_leaves_builder_unchanged() {
        let mut b = builder();
        assert!(b.attach("/no/such/file.txt", None).is_err());
        assert!(b.attachments().is_empty());
        assert!(!b.is_multipart());
    }

    #[test]
    fn test_with_resolver_applies_to_attachments() {
        let mut b = builder().with_resolver(|_: &str| "text/csv".to_string());
        b.attach_reader(&b"a,b"[..], "t.csv", None).unwrap();
        assert_eq!(
            b.attachments().iter().next().unwrap().content_type(),
            "text/csv"
        );
    }
}
