//! Reply codes and the error type command handlers return.
//!
//! # Upstream reference
//!
//! The numeric codes below follow the three-digit, SMTP-like convention laid
//! out for this protocol: a leading digit class (2xx success, 5xx failure),
//! with the specific codes fixed by the wire contract rather than chosen
//! freely per handler.

use std::fmt;

/// Three-digit reply code prefixed to every line sent to a controller.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u16)]
pub enum ReplyCode {
    /// Generic success; `250 OK` is the canonical terminator.
    Ok = 250,
    /// Action accepted but not carried out (e.g. descriptor not added).
    ActionNotCarriedOut = 251,
    /// Asynchronous event line (`650 ...`).
    AsyncEvent = 650,
    /// Unrecognised command.
    UnrecognisedCommand = 510,
    /// Obsolete command.
    ObsoleteCommand = 511,
    /// Syntax error in arguments.
    SyntaxError = 512,
    /// Unacceptable option value.
    UnacceptableValue = 513,
    /// Authentication required.
    AuthRequired = 514,
    /// Authentication failed.
    AuthFailed = 515,
    /// Internal error.
    Internal = 551,
    /// Unrecognised key or entity.
    UnrecognisedKey = 552,
    /// Transition not allowed, or unable to set option.
    TransitionNotAllowed = 553,
    /// Descriptor parse failure.
    DescriptorParseFailure = 554,
    /// Not managed by this controller.
    NotManaged = 555,
}

impl ReplyCode {
    /// All reply codes in ascending numeric order.
    pub const ALL: [Self; 14] = [
        Self::Ok,
        Self::ActionNotCarriedOut,
        Self::UnrecognisedCommand,
        Self::ObsoleteCommand,
        Self::SyntaxError,
        Self::UnacceptableValue,
        Self::AuthRequired,
        Self::AuthFailed,
        Self::Internal,
        Self::UnrecognisedKey,
        Self::TransitionNotAllowed,
        Self::DescriptorParseFailure,
        Self::NotManaged,
        Self::AsyncEvent,
    ];

    /// Returns the numeric code as sent on the wire.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.as_u16())
    }
}

/// Errors produced while handling controller input.
///
/// Each variant carries exactly the information a handler needs to render
/// one reply line; [`ControlError::code`] gives the wire reply code.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ControlError {
    /// Command word not found in the dispatch table.
    #[error("Unrecognized command \"{0}\"")]
    UnrecognisedCommand(String),
    /// An obsolete command was issued.
    #[error("Command \"{0}\" is obsolete")]
    ObsoleteCommand(String),
    /// Arity or argument-grammar violation.
    #[error("{0}")]
    Syntax(String),
    /// A value was syntactically valid but semantically unacceptable.
    #[error("{0}")]
    UnacceptableValue(String),
    /// A command was issued before authentication completed.
    #[error("Authentication required")]
    AuthRequired,
    /// AUTHENTICATE did not match any configured credential.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
    /// A key, circuit, stream, or router referenced by the command is unknown.
    #[error("{0}")]
    UnrecognisedKey(String),
    /// The requested state transition is not allowed right now.
    #[error("{0}")]
    TransitionNotAllowed(String),
    /// A descriptor failed to parse.
    #[error("{0}")]
    DescriptorParseFailure(String),
    /// The referenced entity is not managed by this controller.
    #[error("{0}")]
    NotManaged(String),
    /// A failure internal to this node, not attributable to the controller.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ControlError {
    /// Maps this error to the reply code it must be rendered with.
    #[must_use]
    pub const fn code(&self) -> ReplyCode {
        match self {
            Self::UnrecognisedCommand(_) => ReplyCode::UnrecognisedCommand,
            Self::ObsoleteCommand(_) => ReplyCode::ObsoleteCommand,
            Self::Syntax(_) => ReplyCode::SyntaxError,
            Self::UnacceptableValue(_) => ReplyCode::UnacceptableValue,
            Self::AuthRequired => ReplyCode::AuthRequired,
            Self::AuthFailed(_) => ReplyCode::AuthFailed,
            Self::UnrecognisedKey(_) => ReplyCode::UnrecognisedKey,
            Self::TransitionNotAllowed(_) => ReplyCode::TransitionNotAllowed,
            Self::DescriptorParseFailure(_) => ReplyCode::DescriptorParseFailure,
            Self::NotManaged(_) => ReplyCode::NotManaged,
            Self::Internal(_) => ReplyCode::Internal,
        }
    }

    /// Whether this error requires the connection to be closed after the
    /// reply is flushed (authentication failures and authorisation gate
    /// violations defeat online guessing by closing; everything else stays
    /// open per the recovery policy).
    #[must_use]
    pub const fn closes_connection(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::AuthFailed(_))
    }
}

/// Fatal framing-level failures that terminate the connection outright.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum FramingError {
    /// A logical line or multi-line payload exceeded the implementation cap.
    #[error("command line exceeded the maximum permitted length")]
    LineTooLong,
    /// A quoted string was not terminated before end of input.
    #[error("unterminated quoted string")]
    UnterminatedQuote,
    /// The connection spoke (or appeared to speak) the deprecated binary
    /// dialect.
    #[error("legacy binary control protocol is no longer supported; upgrade your controller")]
    LegacyDialectRejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_code_renders_three_digits() {
        assert_eq!(ReplyCode::Ok.to_string(), "250");
        assert_eq!(ReplyCode::AsyncEvent.to_string(), "650");
    }

    #[test]
    fn auth_errors_close_the_connection() {
        assert!(ControlError::AuthRequired.closes_connection());
        assert!(ControlError::AuthFailed("bad cookie".into()).closes_connection());
        assert!(!ControlError::Syntax("missing argument".into()).closes_connection());
    }

    #[test]
    fn error_code_mapping_matches_wire_contract() {
        assert_eq!(
            ControlError::UnrecognisedCommand("FROB".into()).code(),
            ReplyCode::UnrecognisedCommand
        );
        assert_eq!(
            ControlError::DescriptorParseFailure("bad sig".into()).code(),
            ReplyCode::DescriptorParseFailure
        );
    }
}
