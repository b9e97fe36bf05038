//! Per-connection state machine.

use crate::events::{EventFormat, EventMask};
use crate::framing::LineReader;

/// Authentication state of one connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnState {
    /// Connected but not yet authenticated; only `AUTHENTICATE`,
    /// `PROTOCOLINFO`, and `QUIT` are accepted.
    NeedAuth,
    /// Authenticated; the full command set is available.
    Open,
}

/// Mutable state tracked for one accepted connection.
///
/// Owns its own [`LineReader`] so partial reads across several transport
/// chunks accumulate correctly; everything else here is state the command
/// dispatcher and event fan-out consult or update.
#[derive(Debug)]
pub struct Connection {
    state: ConnState,
    reader: LineReader,
    event_mask: EventMask,
    event_format: EventFormat,
    sent_protocolinfo: bool,
    features: Vec<String>,
}

impl Connection {
    /// Creates a freshly accepted, unauthenticated connection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ConnState::NeedAuth,
            reader: LineReader::new(),
            event_mask: EventMask::EMPTY,
            event_format: EventFormat::SHORT_PLAIN,
            sent_protocolinfo: false,
            features: Vec::new(),
        }
    }

    /// Current authentication state.
    #[must_use]
    pub const fn state(&self) -> ConnState {
        self.state
    }

    /// Transitions to the authenticated state. Idempotent.
    pub fn mark_authenticated(&mut self) {
        self.state = ConnState::Open;
    }

    /// Mutable access to this connection's line reader.
    pub fn reader_mut(&mut self) -> &mut LineReader {
        &mut self.reader
    }

    /// This connection's current subscribed event mask.
    #[must_use]
    pub const fn event_mask(&self) -> EventMask {
        self.event_mask
    }

    /// This connection's current negotiated event line format.
    #[must_use]
    pub const fn event_format(&self) -> EventFormat {
        self.event_format
    }

    /// Replaces the subscribed mask (`SETEVENTS`).
    pub fn set_event_mask(&mut self, mask: EventMask) {
        self.event_mask = mask;
    }

    /// Switches to the extended event format (`USEFEATURE EXTENDED_EVENTS`).
    pub fn enable_extended_events(&mut self) {
        self.event_format.extended = true;
    }

    /// Switches to long event keyword names (`USEFEATURE VERBOSE_NAMES`).
    pub fn enable_verbose_event_names(&mut self) {
        self.event_format.long_names = true;
    }

    /// Whether `PROTOCOLINFO` has already been answered on this connection
    /// (repeat calls are allowed, but only the first is treated specially
    /// by dispatch's pre-auth gate bookkeeping).
    #[must_use]
    pub const fn has_sent_protocolinfo(&self) -> bool {
        self.sent_protocolinfo
    }

    /// Records that `PROTOCOLINFO` has been answered.
    pub fn mark_protocolinfo_sent(&mut self) {
        self.sent_protocolinfo = true;
    }

    /// Negotiated feature names (`USEFEATURE`), in request order.
    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Records a negotiated feature name.
    pub fn add_feature(&mut self, name: String) {
        if !self.features.iter().any(|f| f == &name) {
            self.features.push(name);
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn starts_in_need_auth_with_default_format() {
        let conn = Connection::new();
        assert_eq!(conn.state(), ConnState::NeedAuth);
        assert_eq!(conn.event_format(), EventFormat::SHORT_PLAIN);
        assert!(conn.event_mask().is_empty());
    }

    #[test]
    fn mark_authenticated_transitions_to_open() {
        let mut conn = Connection::new();
        conn.mark_authenticated();
        assert_eq!(conn.state(), ConnState::Open);
    }

    #[test]
    fn set_event_mask_replaces_prior_mask() {
        let mut conn = Connection::new();
        conn.set_event_mask(EventMask::from_kinds([EventKind::Bandwidth]));
        assert!(conn.event_mask().contains(EventKind::Bandwidth));
        conn.set_event_mask(EventMask::EMPTY);
        assert!(conn.event_mask().is_empty());
    }

    #[test]
    fn feature_negotiation_toggles_independently() {
        let mut conn = Connection::new();
        conn.enable_extended_events();
        assert_eq!(conn.event_format(), EventFormat::SHORT_EXTENDED);
        conn.enable_verbose_event_names();
        assert_eq!(conn.event_format(), EventFormat::LONG_EXTENDED);
    }

    #[test]
    fn add_feature_is_idempotent() {
        let mut conn = Connection::new();
        conn.add_feature("EXTENDED_EVENTS".into());
        conn.add_feature("EXTENDED_EVENTS".into());
        assert_eq!(conn.features(), &["EXTENDED_EVENTS".to_string()]);
    }

    #[test]
    fn protocolinfo_sent_flag_tracks_first_reply() {
        let mut conn = Connection::new();
        assert!(!conn.has_sent_protocolinfo());
        conn.mark_protocolinfo_sent();
        assert!(conn.has_sent_protocolinfo());
    }
}
