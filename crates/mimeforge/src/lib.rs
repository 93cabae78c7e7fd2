//! # mimeforge
//!
//! MIME message assembly for email: headers, plain-text and HTML bodies, and
//! file attachments rendered to a single string ready for an SMTP `DATA`
//! command.
//!
//! ## Features
//!
//! - **Ordered headers**: case-insensitive lookup, `add`/`set`/`remove`
//! - **Multipart structure**: `multipart/alternative` for text plus HTML,
//!   `multipart/mixed` once attachments are present
//! - **Attachments**: files or open streams, base64-encoded, with a pluggable
//!   content type resolver
//! - **Deterministic rendering**: inject the RNG and clock for exact output
//!
//! ## Quick Start
//!
//! ```ignore
//! use mimeforge::MessageBuilder;
//!
//! let mut message = MessageBuilder::new();
//! message
//!     .set_to("recipient@example.com")
//!     .set_from("sender@example.com")
//!     .set_subject("Here are some files for you!")
//!     .set_text("This is what people with plain text mail readers will see")
//!     .set_html("A little something <b>special</b> for people with HTML readers");
//! message.attach("/etc/fstab", Some("text/plain"))?;
//!
//! let wire = message.render();
//! ```
//!
//! ### Choosing a Policy
//!
//! ```ignore
//! use mimeforge::{MessageBuilder, RenderPolicy};
//!
//! // Multipart only when both text and HTML are set; no Message-ID.
//! let builder = MessageBuilder::new().with_policy(RenderPolicy::conservative());
//! ```
//!
//! ### Deterministic Output
//!
//! ```ignore
//! use mimeforge::{FixedClock, MessageBuilder};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let builder = MessageBuilder::from_rng(&mut StdRng::seed_from_u64(1))
//!     .with_clock(FixedClock::new(instant));
//! ```
//!
//! Boundaries are never checked against message content.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod attachment;
mod builder;
mod clock;
mod content_type;
mod error;
mod header;
mod message;
mod policy;

pub mod boundary;
pub mod encoding;

#[cfg(feature = "mime-guess")]
pub use attachment::GuessResolver;
pub use attachment::{Attachment, AttachmentSet, NoopResolver, TypeResolver};
pub use boundary::BoundaryGenerator;
pub use builder::{MessageBuilder, wrap_html};
pub use clock::{Clock, FixedClock, SystemClock};
pub use content_type::{ContentType, DEFAULT_CHARSET};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{
    Body, MULTIPART_PREAMBLE, Message, Multipart, Part, PartBody, TransferEncoding,
};
pub use policy::RenderPolicy;
