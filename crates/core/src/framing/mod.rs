//! Line extraction, quoted-string escaping, and dot-stuffed multi-line bodies.
//!
//! # Design
//!
//! This module is the lowest layer of the protocol engine and has no
//! knowledge of commands, authentication, or events — it only turns a byte
//! stream into logical lines and back.

mod dotstuff;
mod line;
mod multiline;
mod quoted;

pub use dotstuff::{decode_lines, encode};
pub use line::LineReader;
pub use multiline::MultilineCollector;
pub use quoted::{parse_quoted, quote};
