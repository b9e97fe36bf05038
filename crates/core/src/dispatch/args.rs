//! Argument tokenization shared by every command handler.

use crate::error::ControlError;
use crate::framing;

/// Splits a command line into its command word (uppercased) and the raw
/// remainder of the line (everything after the first space, or empty).
#[must_use]
pub fn split_command(line: &[u8]) -> (String, &[u8]) {
    match line.iter().position(|&b| b == b' ') {
        Some(pos) => (
            String::from_utf8_lossy(&line[..pos]).to_ascii_uppercase(),
            &line[pos + 1..],
        ),
        None => (String::from_utf8_lossy(line).to_ascii_uppercase(), &[][..]),
    }
}

/// Splits `input` into whitespace-separated tokens, treating a quoted
/// string (with backslash escapes) as a single token including its quotes'
/// contents but not the quotes themselves.
///
/// # Errors
///
/// Returns [`ControlError::Syntax`] if a quoted token is unterminated.
pub fn tokenize(input: &[u8]) -> Result<Vec<Vec<u8>>, ControlError> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < input.len() {
        while i < input.len() && input[i] == b' ' {
            i += 1;
        }
        if i >= input.len() {
            break;
        }
        if input[i] == b'"' {
            let (decoded, rest) =
                framing::parse_quoted(&input[i..]).map_err(|e| ControlError::Syntax(e.to_string()))?;
            tokens.push(decoded);
            i += input[i..].len() - rest.len();
        } else {
            let start = i;
            while i < input.len() && input[i] != b' ' {
                i += 1;
            }
            tokens.push(input[start..i].to_vec());
        }
    }
    Ok(tokens)
}

/// Splits a `key`, `key=value`, or `key="quoted value"` token into its parts.
/// `value` is `None` for a bare key.
#[must_use]
pub fn split_key_value(token: &[u8]) -> (String, Option<Vec<u8>>) {
    let Some(pos) = token.iter().position(|&b| b == b'=') else {
        return (String::from_utf8_lossy(token).into_owned(), None);
    };
    let key = String::from_utf8_lossy(&token[..pos]).into_owned();
    let raw_value = &token[pos + 1..];
    let value = if raw_value.first() == Some(&b'"') {
        framing::parse_quoted(raw_value)
            .map(|(decoded, _)| decoded)
            .unwrap_or_else(|_| raw_value.to_vec())
    } else {
        raw_value.to_vec()
    };
    (key, Some(value))
}

/// Parses a token as a non-negative base-10 integer.
pub fn parse_u32(token: &[u8]) -> Result<u32, ControlError> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ControlError::Syntax(format!("expected a non-negative integer, got {:?}", String::from_utf8_lossy(token))))
}
