//! Command dispatch: case-insensitive command lookup, the pre-auth gate,
//! and per-command handlers.

mod args;
mod handlers;

use crate::auth::AuthConfig;
use crate::collaborators::{
    Accounting, AddressMap, CircuitManager, ConfigStore, DescriptorStore, DnsResolver, RouterStore,
    SignalSink, StreamManager,
};
use crate::connection::{ConnState, Connection};
use crate::error::ControlError;
use crate::events::EventKind;
use crate::writer;

/// Borrowed handles to every external subsystem a command might call into.
pub struct Collaborators<'a> {
    /// Configuration store (GETCONF/SETCONF/RESETCONF/SAVECONF).
    pub config: &'a mut dyn ConfigStore,
    /// Circuit build/teardown engine.
    pub circuits: &'a mut dyn CircuitManager,
    /// Stream handshake/attachment engine.
    pub streams: &'a mut dyn StreamManager,
    /// Router descriptor and network-status store.
    pub routers: &'a dyn RouterStore,
    /// Router descriptor ingestion path.
    pub descriptors: &'a mut dyn DescriptorStore,
    /// Address-mapping state.
    pub addresses: &'a mut dyn AddressMap,
    /// Bandwidth accounting state.
    pub accounting: &'a dyn Accounting,
    /// DNS resolution path.
    pub dns: &'a mut dyn DnsResolver,
    /// Process-control actions.
    pub signals: &'a mut dyn SignalSink,
}

/// A command-triggered event to fan out through the caller's event
/// registry, alongside the command's own reply.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmittedEvent {
    /// Which event kind this is.
    pub kind: EventKind,
    /// The pre-`@` body; the caller formats per-subscriber via
    /// [`writer::event_line`].
    pub body: String,
    /// The `@key=value` extended tail, rendered only for subscribers using
    /// an extended [`crate::events::EventFormat`].
    pub extra: Option<String>,
}

/// Result of dispatching one command line.
pub enum Outcome {
    /// A reply was produced; `close` indicates the connection must be torn
    /// down after it is flushed.
    Reply {
        /// Wire-formatted reply bytes, always CRLF-terminated.
        bytes: Vec<u8>,
        /// Whether the caller must close the connection after flushing.
        close: bool,
        /// Events this command triggered, to be fanned out by the caller.
        events: Vec<EmittedEvent>,
    },
    /// A `+`-prefixed command whose multi-line body hasn't arrived yet; the
    /// caller must accumulate lines (e.g. via
    /// [`crate::framing::MultilineCollector`]) and call
    /// [`dispatch_multiline`] once the body is complete.
    AwaitMultiline {
        /// The command word, preserved for the eventual multiline call.
        command: String,
        /// The header line's arguments (everything after the command word).
        header: Vec<u8>,
    },
}

impl Outcome {
    fn reply(bytes: Vec<u8>) -> Self {
        Self::Reply {
            bytes,
            close: false,
            events: Vec::new(),
        }
    }

    fn reply_and_close(bytes: Vec<u8>) -> Self {
        Self::Reply {
            bytes,
            close: true,
            events: Vec::new(),
        }
    }

    fn error(err: &ControlError) -> Self {
        let bytes = writer::single(err.code(), &err.to_string());
        if err.closes_connection() {
            Self::reply_and_close(bytes)
        } else {
            Self::reply(bytes)
        }
    }
}

const PRE_AUTH_COMMANDS: [&str; 3] = ["AUTHENTICATE", "QUIT", "PROTOCOLINFO"];

/// Dispatches a single, already-unquoted-at-the-framing-layer command line.
///
/// `line` excludes its terminator and is exactly one logical command;
/// `+`-prefixed multi-line commands are recognised here but their body is
/// collected by the caller before [`dispatch_multiline`] runs the handler.
pub fn dispatch_line(
    conn: &mut Connection,
    auth: &AuthConfig,
    collaborators: &mut Collaborators<'_>,
    line: &[u8],
) -> Outcome {
    let (raw_word, rest) = args::split_command(line);
    let is_multiline_command = raw_word.starts_with('+');
    let word = raw_word.trim_start_matches('+').to_string();

    if conn.state() == ConnState::NeedAuth && !PRE_AUTH_COMMANDS.contains(&word.as_str()) {
        return Outcome::error(&ControlError::AuthRequired);
    }

    if is_multiline_command {
        if word != "POSTDESCRIPTOR" {
            return Outcome::error(&ControlError::UnrecognisedCommand(word));
        }
        return Outcome::AwaitMultiline {
            command: word,
            header: rest.to_vec(),
        };
    }

    match word.as_str() {
        "AUTHENTICATE" => handlers::authenticate(conn, auth, rest),
        "QUIT" => Outcome::reply_and_close(writer::single(
            crate::error::ReplyCode::Ok,
            "closing connection",
        )),
        "PROTOCOLINFO" => handlers::protocolinfo(conn, auth, rest),
        "SETCONF" => handlers::setconf(collaborators, rest, false),
        "RESETCONF" => handlers::setconf(collaborators, rest, true),
        "GETCONF" => handlers::getconf(collaborators, rest),
        "SETEVENTS" => handlers::setevents(conn, collaborators, rest),
        "SAVECONF" => handlers::saveconf(collaborators),
        "SIGNAL" => handlers::signal(collaborators, rest),
        "MAPADDRESS" => handlers::mapaddress(collaborators, rest),
        "GETINFO" => handlers::getinfo(collaborators, rest),
        "EXTENDCIRCUIT" => handlers::extendcircuit(collaborators, rest),
        "SETCIRCUITPURPOSE" => handlers::setcircuitpurpose(collaborators, rest),
        "ATTACHSTREAM" => handlers::attachstream(collaborators, rest),
        "REDIRECTSTREAM" => handlers::redirectstream(collaborators, rest),
        "CLOSESTREAM" => handlers::closestream(collaborators, rest),
        "CLOSECIRCUIT" => handlers::closecircuit(collaborators, rest),
        "RESOLVE" => handlers::resolve(conn, collaborators, rest),
        "USEFEATURE" => handlers::usefeature(conn, rest),
        "SETROUTERPURPOSE" => Outcome::error(&ControlError::ObsoleteCommand(word)),
        _ => Outcome::error(&ControlError::UnrecognisedCommand(word)),
    }
}

/// Runs the handler for a multi-line command whose body has now fully
/// arrived (currently only `+POSTDESCRIPTOR`).
pub fn dispatch_multiline(
    collaborators: &mut Collaborators<'_>,
    command: &str,
    header: &[u8],
    body: &[u8],
) -> Outcome {
    match command {
        "POSTDESCRIPTOR" => handlers::postdescriptor(collaborators, header, body),
        other => Outcome::error(&ControlError::UnrecognisedCommand(other.to_string())),
    }
}
