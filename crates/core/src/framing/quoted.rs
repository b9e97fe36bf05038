//! Quoted-string parsing and escaping for bracketed command arguments.

use crate::error::FramingError;

/// Parses a leading quoted string from `input`.
///
/// `input[0]` must be `"`. A backslash escapes the byte that follows it,
/// which is copied into the decoded output verbatim (no interpretation of
/// `\n`/`\t`-style escapes — this wire format only needs to get `"` and `\`
/// themselves, and raw bytes, past the quoting layer). Returns the decoded
/// bytes and the remainder of `input` following the closing quote.
///
/// # Errors
///
/// Returns [`FramingError::UnterminatedQuote`] if `input` ends before a
/// closing, unescaped `"` is found.
pub fn parse_quoted(input: &[u8]) -> Result<(Vec<u8>, &[u8]), FramingError> {
    debug_assert_eq!(input.first(), Some(&b'"'));
    let mut out = Vec::with_capacity(input.len());
    let mut i = 1;
    while i < input.len() {
        match input[i] {
            b'"' => return Ok((out, &input[i + 1..])),
            b'\\' => {
                let escaped = input.get(i + 1).ok_or(FramingError::UnterminatedQuote)?;
                out.push(*escaped);
                i += 2;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Err(FramingError::UnterminatedQuote)
}

/// Wraps `input` in double quotes, backslash-escaping embedded `"` and `\`.
#[must_use]
pub fn quote(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + 2);
    out.push(b'"');
    for &b in input {
        if b == b'"' || b == b'\\' {
            out.push(b'\\');
        }
        out.push(b);
    }
    out.push(b'"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_quoted_string() {
        let (value, rest) = parse_quoted(br#""hello""#).unwrap();
        assert_eq!(value, b"hello");
        assert_eq!(rest, b"");
    }

    #[test]
    fn parses_escaped_quote_and_backslash() {
        let (value, rest) = parse_quoted(br#""a\"b\\c" tail"#).unwrap();
        assert_eq!(value, br#"a"b\c"#);
        assert_eq!(rest, b" tail");
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert_eq!(parse_quoted(br#""abc"#), Err(FramingError::UnterminatedQuote));
        assert_eq!(parse_quoted(br#""abc\"#), Err(FramingError::UnterminatedQuote));
    }

    #[test]
    fn quote_escapes_special_bytes() {
        assert_eq!(quote(br#"a"b\c"#), br#""a\"b\\c""#);
    }

    #[test]
    fn round_trips_through_quote_and_parse() {
        let original = br#"contains "quotes" and \backslash\"#;
        let quoted = quote(original);
        let (decoded, rest) = parse_quoted(&quoted).unwrap();
        assert_eq!(decoded, original);
        assert!(rest.is_empty());
    }
}
