//! Renders replies and events into the CRLF-terminated wire format.

use crate::error::ReplyCode;
use crate::events::{EventFormat, EventKind};
use crate::framing;

/// One line of a (possibly multi-line) reply, with its continuation marker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Continuation {
    /// More lines follow (`-`).
    More,
    /// This is the last line (` `).
    Last,
    /// This line introduces a dot-stuffed multi-line body (`+`).
    Multiline,
}

impl Continuation {
    const fn marker(self) -> u8 {
        match self {
            Self::More => b'-',
            Self::Last => b' ',
            Self::Multiline => b'+',
        }
    }
}

/// Appends one reply line (`CODE<marker>text\r\n`) to `out`.
fn push_line(out: &mut Vec<u8>, code: ReplyCode, continuation: Continuation, text: &[u8]) {
    out.extend_from_slice(code.to_string().as_bytes());
    out.push(continuation.marker());
    out.extend_from_slice(text);
    out.extend_from_slice(b"\r\n");
}

/// Appends one `-`-continued line (more lines follow) for a reply being
/// built up key by key, such as a multi-key `GETINFO` reply.
pub fn push_continuation(out: &mut Vec<u8>, code: ReplyCode, text: &str) {
    push_line(out, code, Continuation::More, text.as_bytes());
}

/// Appends one multi-line data-block header (`+`) plus its dot-stuffed body.
pub fn push_data_block(out: &mut Vec<u8>, code: ReplyCode, header: &str, body: &[u8]) {
    push_line(out, code, Continuation::Multiline, header.as_bytes());
    out.extend_from_slice(&framing::encode(body));
}

/// Appends the final (` `-marked) line of a reply being built up in place.
pub fn push_terminal(out: &mut Vec<u8>, code: ReplyCode, text: &str) {
    push_line(out, code, Continuation::Last, text.as_bytes());
}

/// Renders a single-line reply.
#[must_use]
pub fn single(code: ReplyCode, text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 8);
    push_line(&mut out, code, Continuation::Last, text.as_bytes());
    out
}

/// Renders a multi-line reply: every line but the last uses the `-`
/// continuation marker; the final line uses the terminal ` ` marker.
///
/// # Panics
///
/// Panics if `lines` is empty; every reply has at least one line.
#[must_use]
pub fn multi(code: ReplyCode, lines: &[&str]) -> Vec<u8> {
    assert!(!lines.is_empty(), "a reply must have at least one line");
    let mut out = Vec::new();
    let (last, rest) = lines.split_last().expect("checked non-empty above");
    for line in rest {
        push_line(&mut out, code, Continuation::More, line.as_bytes());
    }
    push_line(&mut out, code, Continuation::Last, last.as_bytes());
    out
}

/// Renders a reply whose final line introduces a dot-stuffed body (used by
/// `GETINFO config-text` and similar bulk-data replies).
#[must_use]
pub fn with_data_block(code: ReplyCode, header: &str, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(header.len() + body.len() + 16);
    push_line(&mut out, code, Continuation::Multiline, header.as_bytes());
    out.extend_from_slice(&framing::encode(body));
    out
}

/// Renders a `650` asynchronous event line.
///
/// `extra` is appended verbatim after the keyword when `format.extended` is
/// set, preceded by the `@` extension marker; callers are responsible for
/// formatting whatever extended fields the event kind defines.
#[must_use]
pub fn event_line(kind: EventKind, format: EventFormat, body: &str, extra: Option<&str>) -> Vec<u8> {
    let mut text = String::with_capacity(body.len() + 16);
    text.push_str(format.keyword(kind));
    if !body.is_empty() {
        text.push(' ');
        text.push_str(body);
    }
    if format.extended {
        if let Some(extra) = extra {
            text.push_str(" @");
            text.push_str(extra);
        }
    }
    single(ReplyCode::AsyncEvent, &text)
}
