//! Rendering tests for complete messages.
//!
//! These build messages through the public API with a fixed clock and fixed
//! boundaries, then inspect the wire form.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;

use chrono::DateTime;
use mimeforge::encoding::decode_base64;
use mimeforge::{ContentType, FixedClock, MessageBuilder, RenderPolicy};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mimeforge=trace".into()),
        )
        .try_init();
}

fn fixed_builder() -> MessageBuilder {
    let instant = DateTime::parse_from_rfc3339("2024-03-15T10:30:00+00:00").unwrap();
    MessageBuilder::from_rng(&mut StdRng::seed_from_u64(1))
        .with_clock(FixedClock::new(instant))
        .with_boundaries("OUTER", "INNER")
        .with_policy(RenderPolicy::new().with_auto_message_id(false))
}

/// Extracts the payload following the disposition line for `filename`.
fn payload_for<'a>(rendered: &'a str, filename: &str) -> &'a str {
    let marker = format!("Content-Disposition: inline; filename=\"{filename}\"\r\n\r\n");
    let start = rendered.find(&marker).expect("attachment section") + marker.len();
    let rest = &rendered[start..];
    let end = rest.find("\r\n\r\n").expect("section end");
    &rest[..end]
}

#[test]
fn test_plain_text_message() {
    init_tracing();
    let mut builder = fixed_builder();
    builder
        .set_to("recipient@example.com")
        .set_from("sender@example.com")
        .set_subject("This is a test")
        .set_text("X");

    assert_eq!(
        builder.render(),
        concat!(
            "To: recipient@example.com\r\n",
            "From: sender@example.com\r\n",
            "Subject: This is a test\r\n",
            "Date: Fri, 15 Mar 2024 10:30:00 +0000\r\n",
            "\r\n",
            "X"
        )
    );
}

#[test]
fn test_plain_message_without_text_has_empty_body() {
    let mut builder = fixed_builder();
    builder.set_subject("Empty");
    assert!(builder.render().ends_with("+0000\r\n\r\n"));
}

#[test]
fn test_html_only_message_is_alternative() {
    init_tracing();
    let mut builder = fixed_builder();
    builder.set_raw_html("<p>Hi</p>");

    assert_eq!(
        builder.render(),
        concat!(
            "Date: Fri, 15 Mar 2024 10:30:00 +0000\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/alternative; boundary=\"INNER\"\r\n",
            "\r\n",
            "This is a multi-part message in MIME format.\r\n\r\n",
            "--INNER\r\n",
            "Content-Type: text/plain; charset=ISO-8859-1; format=flowed\r\n",
            "Content-Transfer-Encoding: 7bit\r\n",
            "\r\n",
            "\r\n\r\n",
            "--INNER\r\n",
            "Content-Type: text/html; charset=ISO-8859-1\r\n",
            "Content-Transfer-Encoding: 7bit\r\n",
            "\r\n",
            "<p>Hi</p>\r\n\r\n",
            "--INNER--"
        )
    );
}

#[test]
fn test_alternative_with_generated_boundary() {
    let instant = DateTime::parse_from_rfc3339("2024-03-15T10:30:00+00:00").unwrap();
    let mut builder =
        MessageBuilder::from_rng(&mut StdRng::seed_from_u64(5)).with_clock(FixedClock::new(instant));
    builder.set_text("plain").set_html("<b>rich</b>");
    let boundary = builder.inner_boundary().to_string();
    let rendered = builder.render();

    let header = format!("Content-Type: multipart/alternative; boundary=\"{boundary}\"\r\n");
    assert_eq!(rendered.matches(&header).count(), 1);
    assert_eq!(rendered.matches(&format!("--{boundary}\r\n")).count(), 2);
    assert!(rendered.ends_with(&format!("--{boundary}--")));
    assert!(!rendered.contains(builder.outer_boundary()));
}

#[test]
fn test_mixed_message_exact_output() {
    init_tracing();
    let mut builder = fixed_builder();
    builder
        .set_to("r@example.com")
        .set_from("s@example.com")
        .set_subject("Files")
        .set_text("Hello")
        .set_raw_html("<p>Hello</p>");
    builder
        .attach_reader(&b"hi"[..], "a.txt", Some("text/plain"))
        .unwrap();

    assert_eq!(
        builder.render(),
        concat!(
            "To: r@example.com\r\n",
            "From: s@example.com\r\n",
            "Subject: Files\r\n",
            "Date: Fri, 15 Mar 2024 10:30:00 +0000\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"OUTER\"\r\n",
            "\r\n",
            "This is a multi-part message in MIME format.\r\n\r\n",
            "--OUTER\r\n",
            "Content-Type: multipart/alternative; boundary=\"INNER\"\r\n",
            "\r\n",
            "--INNER\r\n",
            "Content-Type: text/plain; charset=ISO-8859-1; format=flowed\r\n",
            "Content-Transfer-Encoding: 7bit\r\n",
            "\r\n",
            "Hello\r\n\r\n",
            "--INNER\r\n",
            "Content-Type: text/html; charset=ISO-8859-1\r\n",
            "Content-Transfer-Encoding: 7bit\r\n",
            "\r\n",
            "<p>Hello</p>\r\n\r\n",
            "--INNER--\r\n\r\n",
            "--OUTER\r\n",
            "Content-Type: text/plain; name=\"a.txt\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "Content-Disposition: inline; filename=\"a.txt\"\r\n",
            "\r\n",
            "aGk=\r\n\r\n",
            "--OUTER--"
        )
    );
}

#[test]
fn test_file_attachment_uses_basename_and_round_trips() {
    init_tracing();
    let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    let mut file = tempfile::Builder::new()
        .prefix("report")
        .suffix(".bin")
        .tempfile()
        .unwrap();
    file.write_all(&data).unwrap();
    let basename = file
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    let mut builder = fixed_builder();
    builder.set_text("see attached");
    builder.attach(file.path(), None).unwrap();
    let rendered = builder.render();

    let disposition = format!("Content-Disposition: inline; filename=\"{basename}\"");
    assert_eq!(rendered.matches(&disposition).count(), 1);
    assert!(rendered.contains("Content-Type: multipart/mixed; boundary=\"OUTER\""));

    let payload = payload_for(&rendered, &basename);
    assert!(payload.split("\r\n").all(|line| line.len() <= 76));
    assert_eq!(decode_base64(payload).unwrap(), data);
    assert_eq!(rendered.matches(payload).count(), 1);
}

#[test]
fn test_unwrapped_payload_appears_verbatim() {
    let mut builder =
        fixed_builder().with_policy(RenderPolicy::new().with_base64_line_length(None));
    builder
        .attach_reader(&[42u8; 300][..], "stars.bin", Some("application/octet-stream"))
        .unwrap();
    let expected = builder.attachments().iter().next().unwrap().payload().to_string();

    let rendered = builder.render();
    assert_eq!(rendered.matches(&expected).count(), 1);
    assert_eq!(payload_for(&rendered, "stars.bin"), expected);
}

#[test]
fn test_attachments_render_in_order() {
    let mut builder = fixed_builder();
    for name in ["first.txt", "second.txt", "third.txt"] {
        builder
            .attach_reader(name.as_bytes(), name, Some("text/plain"))
            .unwrap();
    }
    let rendered = builder.render();

    let positions: Vec<usize> = ["first.txt", "second.txt", "third.txt"]
        .iter()
        .map(|name| rendered.find(&format!("filename=\"{name}\"")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(rendered.matches("--OUTER\r\n").count(), 4);
}

#[test]
fn test_attach_as_display_name() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"payload").unwrap();

    let mut builder = fixed_builder();
    builder
        .attach_as(file.path(), "invoice.pdf", Some("application/pdf"))
        .unwrap();
    let rendered = builder.render();
    assert!(rendered.contains("Content-Type: application/pdf; name=\"invoice.pdf\"\r\n"));
    assert!(rendered.contains("Content-Disposition: inline; filename=\"invoice.pdf\"\r\n"));
}

#[test]
fn test_unresolved_type_is_empty() {
    let mut builder = fixed_builder();
    builder.attach_reader(&b"?"[..], "mystery", None).unwrap();
    assert!(builder.render().contains("Content-Type: ; name=\"mystery\"\r\n"));
}

#[test]
fn test_set_then_remove_header() {
    let mut builder = fixed_builder();
    builder.set_header("X-Mailer", "mimeforge");
    builder.remove_header("x-mailer");
    assert!(builder.header("X-Mailer").is_empty());
    assert!(!builder.render().contains("X-Mailer"));
}

#[test]
fn test_arbitrary_header_round_trip() {
    let mut builder = fixed_builder();
    builder.set_header("arbitrary", "some value");
    assert_eq!(builder.header("ARBITRARY"), vec!["some value"]);
    assert!(builder.render().contains("arbitrary: some value\r\n"));
}

#[test]
fn test_message_id_changes_between_renders() {
    let instant = DateTime::parse_from_rfc3339("2024-03-15T10:30:00+00:00").unwrap();
    let mut builder = MessageBuilder::from_rng(&mut StdRng::seed_from_u64(2))
        .with_clock(FixedClock::new(instant));
    builder.set_text("x");

    let first = builder.render();
    let second = builder.render();
    assert_ne!(first, second);
    assert_eq!(second.matches("Message-ID: ").count(), 1);
    assert_eq!(second.matches("Date: ").count(), 1);
}

#[test]
fn test_conservative_policy_html_without_text() {
    let mut builder = fixed_builder().with_policy(RenderPolicy::conservative());
    builder.set_html("only html");
    let rendered = builder.render();
    assert!(!rendered.contains("MIME-Version"));
    assert!(!rendered.contains("Message-ID"));
    assert!(rendered.ends_with("\r\n\r\n"));
}

#[test]
fn test_built_message_content_type_parses() {
    let mut builder = fixed_builder();
    builder.set_text("t").set_html("h");
    builder
        .attach_reader(&b"z"[..], "z.txt", Some("text/plain"))
        .unwrap();
    let message = builder.build();

    let content_type: ContentType = message.content_type().unwrap();
    assert_eq!(content_type.essence(), "multipart/mixed");
    assert_eq!(content_type.boundary(), Some("OUTER"));

    let attachment = message.attachments().next().unwrap();
    assert_eq!(attachment.filename(), Some("z.txt"));
    assert_eq!(attachment.decode_body().unwrap(), b"z");
}

proptest! {
    #[test]
    fn prop_convenience_setters_keep_last(values in proptest::collection::vec("[a-z]{1,8}@[a-z]{1,8}\\.com", 1..6)) {
        let mut builder = fixed_builder();
        for value in &values {
            builder.set_to(value.clone());
            builder.set_cc(value.clone());
        }
        let last = values.last().unwrap();
        prop_assert_eq!(builder.to(), Some(last.as_str()));
        prop_assert_eq!(builder.header("cc"), vec![last.as_str()]);

        let rendered = builder.render();
        prop_assert_eq!(rendered.lines().filter(|l| l.starts_with("To:")).count(), 1);
        prop_assert_eq!(rendered.lines().filter(|l| l.starts_with("CC:")).count(), 1);
    }

    #[test]
    fn prop_attachment_payload_round_trips(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let mut builder = fixed_builder();
        builder.attach_reader(&data[..], "blob.bin", Some("application/octet-stream")).unwrap();
        let rendered = builder.render();
        prop_assert_eq!(decode_base64(payload_for(&rendered, "blob.bin")).unwrap(), data);
    }
}
