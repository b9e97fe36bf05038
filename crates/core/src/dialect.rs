//! Detects and rejects the legacy binary control dialect.
//!
//! The protocol used to support a binary-framed dialect alongside the
//! current text dialect; this implementation only speaks text and must
//! recognise the legacy framing early enough to reject it cleanly instead of
//! mis-parsing its bytes as garbled text commands.

use crate::error::FramingError;

/// Classifies the first bytes of a freshly accepted connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dialect {
    /// Plain CRLF-line text dialect; the only one this implementation speaks.
    Text,
    /// The deprecated binary framing, recognised only so it can be rejected.
    LegacyBinary,
}

/// Length of the legacy binary dialect's fixed preamble, high bit set on the
/// first length byte.
const LEGACY_LENGTH_HIGH_BIT: u8 = 0x80;

/// Classifies a connection's first bytes without consuming them.
///
/// The binary dialect begins every command with a two-byte big-endian
/// length field; its high bit was reserved and is always set by real
/// implementations of that dialect, while every text-dialect command begins
/// with an ASCII command word. A leading byte with the high bit set is
/// therefore unambiguous.
#[must_use]
pub fn classify(first_bytes: &[u8]) -> Dialect {
    match first_bytes.first() {
        Some(&b) if b & LEGACY_LENGTH_HIGH_BIT != 0 => Dialect::LegacyBinary,
        _ => Dialect::Text,
    }
}

/// Returns the error to report and close the connection with, if `dialect`
/// is not supported.
#[must_use]
pub fn reject_if_unsupported(dialect: Dialect) -> Option<FramingError> {
    match dialect {
        Dialect::Text => None,
        Dialect::LegacyBinary => Some(FramingError::LegacyDialectRejected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_text_command_as_text() {
        assert_eq!(classify(b"AUTHENTICATE \"\"\r\n"), Dialect::Text);
    }

    #[test]
    fn classifies_high_bit_as_legacy_binary() {
        assert_eq!(classify(&[0x80, 0x01]), Dialect::LegacyBinary);
    }

    #[test]
    fn empty_input_classifies_as_text() {
        assert_eq!(classify(&[]), Dialect::Text);
    }

    #[test]
    fn rejects_only_legacy_binary() {
        assert!(reject_if_unsupported(Dialect::Text).is_none());
        assert_eq!(
            reject_if_unsupported(Dialect::LegacyBinary),
            Some(FramingError::LegacyDialectRejected)
        );
    }
}
