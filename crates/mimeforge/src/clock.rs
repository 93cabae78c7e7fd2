//! Time source for `Date` and `Message-ID` headers.

use chrono::{DateTime, FixedOffset, Local};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current time with its UTC offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Creates a clock frozen at `instant`.
    #[must_use]
    pub const fn new(instant: DateTime<FixedOffset>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Formats a `Date` header value (RFC 2822).
#[must_use]
pub fn format_date(instant: &DateTime<FixedOffset>) -> String {
    instant.to_rfc2822()
}

/// Formats a `Message-ID` value as `<secs.micros.pid.token>`.
#[must_use]
pub fn format_message_id(instant: &DateTime<FixedOffset>, pid: u32, token: &str) -> String {
    format!(
        "<{}.{:06}.{pid}.{token}>",
        instant.timestamp(),
        instant.timestamp_subsec_micros()
    )
}
