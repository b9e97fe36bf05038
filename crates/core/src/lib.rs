#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Overview
//!
//! `core` is the protocol engine behind a node's controller interface: a
//! line-oriented, authenticated, bidirectional command/event channel exposing
//! configuration, introspection, and asynchronous notification to a local
//! supervising process. This crate is sans-I/O — it is handed bytes read from
//! a transport and produces bytes (and side effects on typed collaborator
//! traits) to write back; it never touches a socket itself.
//!
//! # Design
//!
//! The crate is organised around the component breakdown of the subsystem it
//! implements:
//!
//! - [`framing`] — line extraction, dot-stuffed multi-line payloads, and
//!   quoted-string escaping (C1).
//! - [`dialect`] — the one-shot legacy-binary-dialect rejection stub (C2).
//! - [`connection`] — per-connection state machine (C3).
//! - [`auth`] — the AUTHENTICATE credential parser and acceptance rule (C4).
//! - [`dispatch`] — the command table and per-command handlers (C5).
//! - [`events`] — the event subscription registry and fan-out (C6).
//! - [`logbridge`] — log interception with reentrancy suppression (C7).
//! - [`writer`] — the CRLF-terminated, bounded reply writer (C8).
//! - [`getinfo`] — the GETINFO key registry (C9).
//! - [`collaborators`] — narrow traits for the external subsystems this
//!   interface calls into but does not implement (C10).
//!
//! # Invariants
//!
//! - Every byte sequence this crate writes for a controller ends in `\r\n`.
//! - No handler performs blocking I/O or yields mid-command; a command either
//!   completes synchronously or is deferred entirely because its input is
//!   incomplete.
//! - All connection-table and event-mask mutation is expected to happen from
//!   a single logical thread of control (see [`events::Registry`]); this
//!   crate assumes, but does not itself enforce, that discipline.
//!
//! # Errors
//!
//! Protocol-level failures are reported through [`error::ControlError`],
//! which carries the reply-code mapping used by [`writer`].
//!
//! # See also
//!
//! - The `daemon` crate drives this engine from real sockets.
//! - The `logging` crate bridges `tracing` events into [`logbridge`].

/// Authentication: cookie and hashed-password acceptance (C4).
pub mod auth;
/// Narrow traits for the external subsystems this interface calls into (C10).
pub mod collaborators;
/// Per-connection state machine (C3).
pub mod connection;
/// One-shot legacy binary dialect rejection (C2).
pub mod dialect;
/// Command dispatch table and handlers (C5).
pub mod dispatch;
/// Error types and the reply-code mapping.
pub mod error;
/// Event subscription registry and fan-out (C6).
pub mod events;
/// Line extraction, dot-stuffing, and quoted-string escaping (C1).
pub mod framing;
/// GETINFO key registry (C9).
pub mod getinfo;
/// Log interception with reentrancy suppression (C7).
pub mod logbridge;
/// CRLF-terminated, bounded reply writer (C8).
pub mod writer;

pub use error::{ControlError, ReplyCode};
