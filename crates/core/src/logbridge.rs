//! Log message interception with reentrancy suppression.
//!
//! Forwarding a log message to subscribed controllers can itself produce log
//! output (a write failure, a formatting bug); without a guard against
//! reentrancy, that second message would be forwarded too, recursing until
//! the stack or the controller's patience runs out. [`SuppressionGuard`]
//! makes "are we already inside a forwarding call" an RAII-scoped fact
//! instead of a hand-managed flag.

use std::cell::Cell;

use crate::events::EventKind;

thread_local! {
    static SUPPRESSION_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Severity of a log message, ordered from least to most severe.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail.
    Debug,
    /// Informational.
    Info,
    /// Notable but not a problem.
    Notice,
    /// A problem worth operator attention.
    Warn,
    /// A serious failure.
    Err,
}

impl Severity {
    /// The [`EventKind`] a message at this severity is forwarded as.
    #[must_use]
    pub const fn event_kind(self) -> EventKind {
        match self {
            Self::Debug => EventKind::LogDebug,
            Self::Info => EventKind::LogInfo,
            Self::Notice => EventKind::LogNotice,
            Self::Warn => EventKind::LogWarn,
            Self::Err => EventKind::LogErr,
        }
    }
}

/// Held for the duration of forwarding a log message to controllers.
///
/// While any guard is alive (on the current thread), [`is_suppressed`]
/// returns `true`, and callers must skip forwarding to avoid recursing back
/// into the same call. Guards nest correctly: an outer forwarding call that
/// itself triggers a nested log is still suppressed until the outermost
/// guard drops.
#[must_use]
pub struct SuppressionGuard {
    _private: (),
}

impl SuppressionGuard {
    /// Enters a suppressed region, incrementing the thread-local depth.
    pub fn enter() -> Self {
        SUPPRESSION_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self { _private: () }
    }
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        SUPPRESSION_DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Whether log forwarding is currently suppressed on this thread.
#[must_use]
pub fn is_suppressed() -> bool {
    SUPPRESSION_DEPTH.with(|depth| depth.get() > 0)
}

/// A log message queued for delivery to subscribed controllers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogMessage {
    /// Severity, mapped to the `DEBUG`/`INFO`/`NOTICE`/`WARN`/`ERR` events.
    pub severity: Severity,
    /// Human-readable single-line text (embedded CR/LF are the caller's
    /// responsibility to have already stripped).
    pub text: String,
}

/// Decides whether `message` should be forwarded right now: forwarding is
/// skipped entirely while [`is_suppressed`], so the emitting call itself
/// never recurses into delivering its own side effects.
///
/// Returns the message back if forwarding should proceed, under a freshly
/// entered [`SuppressionGuard`] the caller must hold for the duration of the
/// actual forwarding (rendering the event line and writing it to every
/// subscribed connection).
pub fn begin_forward(message: LogMessage) -> Option<(LogMessage, SuppressionGuard)> {
    if is_suppressed() {
        return None;
    }
    Some((message, SuppressionGuard::enter()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_suppressed_outside_any_guard() {
        assert!(!is_suppressed());
    }

    #[test]
    fn suppressed_while_guard_is_alive() {
        let guard = SuppressionGuard::enter();
        assert!(is_suppressed());
        drop(guard);
        assert!(!is_suppressed());
    }

    #[test]
    fn nested_guards_stay_suppressed_until_outermost_drops() {
        let outer = SuppressionGuard::enter();
        let inner = SuppressionGuard::enter();
        assert!(is_suppressed());
        drop(inner);
        assert!(is_suppressed());
        drop(outer);
        assert!(!is_suppressed());
    }

    #[test]
    fn begin_forward_returns_none_while_suppressed() {
        let _guard = SuppressionGuard::enter();
        let message = LogMessage {
            severity: Severity::Warn,
            text: "disk nearly full".into(),
        };
        assert!(begin_forward(message).is_none());
    }

    #[test]
    fn begin_forward_yields_a_guard_when_not_suppressed() {
        let message = LogMessage {
            severity: Severity::Err,
            text: "connection reset".into(),
        };
        let (returned, _guard) = begin_forward(message.clone()).unwrap();
        assert_eq!(returned, message);
        assert!(is_suppressed());
    }

    #[test]
    fn severity_maps_to_expected_event_kind() {
        assert_eq!(Severity::Debug.event_kind(), EventKind::LogDebug);
        assert_eq!(Severity::Err.event_kind(), EventKind::LogErr);
    }
}
