//! Dot-stuffing for multi-line command and reply bodies.
//!
//! Bodies are sent as a sequence of CRLF-terminated lines, a line consisting
//! of exactly `.` ends the body, and any line that would otherwise start
//! with `.` gets an extra leading `.` inserted (and stripped back out on the
//! way in). This is the same convention SMTP uses for its `DATA` command.

/// Joins already line-split, terminator-stripped input lines into one body,
/// removing one leading `.` from any line that has it.
///
/// `lines` must not include the final `.` terminator line; callers collect
/// lines up to (but not including) it, typically via
/// [`super::MultilineCollector`].
#[must_use]
pub fn decode_lines(lines: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        if line.first() == Some(&b'.') {
            out.extend_from_slice(&line[1..]);
        } else {
            out.extend_from_slice(line);
        }
    }
    out
}

/// Encodes `body` (LF-separated lines) as a dot-stuffed, CRLF-terminated,
/// `.`-terminated wire payload.
#[must_use]
pub fn encode(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 8);
    for line in body.split(|&b| b == b'\n') {
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_plain_body_with_terminator() {
        assert_eq!(encode(b"one\ntwo"), b"one\r\ntwo\r\n.\r\n");
    }

    #[test]
    fn encode_stuffs_leading_dot() {
        assert_eq!(encode(b".hidden"), b"..hidden\r\n.\r\n");
    }

    #[test]
    fn decode_unstuffs_leading_dot() {
        let lines = vec![b"..hidden".to_vec()];
        assert_eq!(decode_lines(&lines), b".hidden");
    }

    #[test]
    fn decode_joins_multiple_lines_with_lf() {
        let lines = vec![b"one".to_vec(), b"two".to_vec()];
        assert_eq!(decode_lines(&lines), b"one\ntwo");
    }

    #[test]
    fn empty_body_round_trips() {
        let encoded = encode(b"");
        assert_eq!(encoded, b"\r\n.\r\n");
    }

    proptest::proptest! {
        #[test]
        fn round_trips_through_encode_and_decode(
            body in proptest::collection::vec(
                proptest::collection::vec(proptest::prelude::any::<u8>().prop_filter(
                    "no embedded CR or LF", |b| *b != b'\r' && *b != b'\n'
                ), 0..12),
                0..6,
            )
        ) {
            let joined: Vec<u8> = body.join(&b'\n');
            let wire = encode(&joined);
            let mut lines = Vec::new();
            for raw in wire.split(|&b| b == b'\n') {
                let line = raw.strip_suffix(b"\r").unwrap_or(raw);
                if line == b"." {
                    break;
                }
                lines.push(line.to_vec());
            }
            proptest::prop_assert_eq!(decode_lines(&lines), joined);
        }
    }
}
