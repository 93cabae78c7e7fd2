//! Transfer encoding utilities.
//!
//! Base64 for attachment payloads, plus CRLF line wrapping of encoded text.

use crate::error::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Line length limit for base64 bodies (RFC 2045).
pub const BASE64_LINE_LENGTH: usize = 76;

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// Whitespace (including CRLF line breaks) is ignored.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Splits text into CRLF-separated lines of at most `width` characters.
///
/// Lines break on character boundaries, so multi-byte characters are never
/// split. A `width` of zero returns the text unchanged.
#[must_use]
pub fn wrap_lines(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    let mut wrapped = String::with_capacity(text.len() + 2 * (text.len() / width));
    for (i, c) in text.chars().enumerate() {
        if i > 0 && i.is_multiple_of(width) {
            wrapped.push_str("\r\n");
        }
        wrapped.push(c);
    }
    wrapped
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64_decode_ignores_line_breaks() {
        let decoded = decode_base64("SGVsbG8s\r\nIFdvcmxk\r\nIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_base64_decode_invalid() {
        assert!(decode_base64("not*base64").is_err());
    }

    #[test]
    fn test_wrap_lines_short_text() {
        assert_eq!(wrap_lines("abc", 76), "abc");
        assert_eq!(wrap_lines("", 76), "");
    }

    #[test]
    fn test_wrap_lines_exact_multiple() {
        assert_eq!(wrap_lines("abcdef", 3), "abc\r\ndef");
    }

    #[test]
    fn test_wrap_lines_remainder() {
        assert_eq!(wrap_lines("abcdefg", 3), "abc\r\ndef\r\ng");
    }

    #[test]
    fn test_wrap_lines_zero_width() {
        assert_eq!(wrap_lines("abcdefg", 0), "abcdefg");
    }

    #[test]
    fn test_wrap_lines_keeps_multibyte_chars() {
        assert_eq!(wrap_lines("héllo wörld", 4), "héll\r\no wö\r\nrld");
        assert_eq!(wrap_lines("日本語テキスト", 3), "日本語\r\nテキス\r\nト");
        assert!(!wrap_lines("ééééé", 2).contains('\u{FFFD}'));
    }

    proptest! {
        #[test]
        fn prop_wrapped_base64_decodes(data in proptest::collection::vec(any::<u8>(), 0..600)) {
            let wrapped = wrap_lines(&encode_base64(&data), BASE64_LINE_LENGTH);
            prop_assert!(wrapped.split("\r\n").all(|line| line.len() <= BASE64_LINE_LENGTH));
            prop_assert_eq!(decode_base64(&wrapped).unwrap(), data);
        }
    }
}
