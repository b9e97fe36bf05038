//! Event subscription, per-connection masks, and fan-out.

use std::fmt;

/// One asynchronous event kind a controller can subscribe to.
///
/// Discriminants are stable across the wire bit layout used by
/// [`EventMask`]; `ALL` lists them in the order the registry iterates them
/// for `SETEVENTS`/`GETINFO events/names`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum EventKind {
    /// Circuit status changed.
    CircuitStatus = 0,
    /// Stream status changed.
    StreamStatus = 1,
    /// OR connection status changed.
    OrConnStatus = 2,
    /// Bandwidth used in the last second.
    Bandwidth = 3,
    /// Log message at debug severity.
    LogDebug = 4,
    /// Log message at info severity.
    LogInfo = 5,
    /// Log message at notice severity.
    LogNotice = 6,
    /// Log message at warn severity.
    LogWarn = 7,
    /// Log message at err severity.
    LogErr = 8,
    /// New descriptors arrived.
    NewDesc = 9,
    /// Address mapping changed.
    AddrMap = 10,
    /// Descriptors changed (deprecated alias family).
    DescChanged = 11,
    /// General status event.
    StatusGeneral = 12,
    /// Client status event.
    StatusClient = 13,
    /// Server status event.
    StatusServer = 14,
    /// Guard node status changed.
    GuardStatus = 15,
    /// Network status consensus changed.
    NetworkStatus = 16,
    /// Stream bandwidth used.
    StreamBandwidth = 17,
    /// A directory authority accepted new descriptors.
    AuthDirNewDescs = 18,
}

impl EventKind {
    /// Every event kind, in registry order.
    pub const ALL: [Self; 19] = [
        Self::CircuitStatus,
        Self::StreamStatus,
        Self::OrConnStatus,
        Self::Bandwidth,
        Self::LogDebug,
        Self::LogInfo,
        Self::LogNotice,
        Self::LogWarn,
        Self::LogErr,
        Self::NewDesc,
        Self::AddrMap,
        Self::DescChanged,
        Self::StatusGeneral,
        Self::StatusClient,
        Self::StatusServer,
        Self::GuardStatus,
        Self::NetworkStatus,
        Self::StreamBandwidth,
        Self::AuthDirNewDescs,
    ];

    /// The short wire name (`SETEVENTS` argument, unextended `650` keyword).
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::CircuitStatus => "CIRC",
            Self::StreamStatus => "STREAM",
            Self::OrConnStatus => "ORCONN",
            Self::Bandwidth => "BW",
            Self::LogDebug => "DEBUG",
            Self::LogInfo => "INFO",
            Self::LogNotice => "NOTICE",
            Self::LogWarn => "WARN",
            Self::LogErr => "ERR",
            Self::NewDesc => "NEWDESC",
            Self::AddrMap => "ADDRMAP",
            Self::DescChanged => "DESCCHANGED",
            Self::StatusGeneral => "STATUS_GENERAL",
            Self::StatusClient => "STATUS_CLIENT",
            Self::StatusServer => "STATUS_SERVER",
            Self::GuardStatus => "GUARD",
            Self::NetworkStatus => "NS",
            Self::StreamBandwidth => "STREAM_BW",
            Self::AuthDirNewDescs => "AUTHDIR_NEWDESC",
        }
    }

    /// The long wire name used in `@`-extended format negotiation.
    #[must_use]
    pub const fn long_name(self) -> &'static str {
        match self {
            Self::CircuitStatus => "CIRCUIT_STATUS",
            Self::StreamStatus => "STREAM_STATUS",
            Self::OrConnStatus => "OR_CONN_STATUS",
            Self::Bandwidth => "BANDWIDTH",
            Self::LogDebug => "DEBUG",
            Self::LogInfo => "INFO",
            Self::LogNotice => "NOTICE",
            Self::LogWarn => "WARN",
            Self::LogErr => "ERR",
            Self::NewDesc => "NEW_DESC",
            Self::AddrMap => "ADDRESS_MAP",
            Self::DescChanged => "DESCRIPTORS_CHANGED",
            Self::StatusGeneral => "STATUS_GENERAL",
            Self::StatusClient => "STATUS_CLIENT",
            Self::StatusServer => "STATUS_SERVER",
            Self::GuardStatus => "GUARD_STATUS",
            Self::NetworkStatus => "NETWORK_STATUS",
            Self::StreamBandwidth => "STREAM_BANDWIDTH_USED",
            Self::AuthDirNewDescs => "AUTHDIR_NEWDESC",
        }
    }

    /// Looks up an event kind by either its short or long wire name,
    /// case-sensitively (`SETEVENTS` names are uppercase by convention).
    #[must_use]
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.short_name() == name || kind.long_name() == name)
    }

    const fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A 32-bit set of subscribed [`EventKind`]s, one bit per kind.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EventMask(u32);

impl EventMask {
    /// The empty mask.
    pub const EMPTY: Self = Self(0);

    /// Returns whether `kind` is set in this mask.
    #[must_use]
    pub const fn contains(self, kind: EventKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Returns a copy of this mask with `kind` added.
    #[must_use]
    pub const fn with(self, kind: EventKind) -> Self {
        Self(self.0 | kind.bit())
    }

    /// Returns whether no event kinds are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Builds a mask from an iterator of kinds.
    #[must_use]
    pub fn from_kinds(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        kinds.into_iter().fold(Self::EMPTY, Self::with)
    }

    /// Unions two masks (used to recompute [`GlobalInterest`]).
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Whether an event line should use the short or long keyword form, and
/// whether to use the `@`-extended tail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EventFormat {
    /// Long-form keywords (`CIRCUIT_STATUS`) instead of short (`CIRC`).
    pub long_names: bool,
    /// Extended fields appended after an `@` marker.
    pub extended: bool,
}

impl EventFormat {
    /// Short keywords, no extended tail — the default before any
    /// `USEFEATURE` negotiation.
    pub const SHORT_PLAIN: Self = Self {
        long_names: false,
        extended: false,
    };
    /// Short keywords with the extended tail.
    pub const SHORT_EXTENDED: Self = Self {
        long_names: false,
        extended: true,
    };
    /// Long keywords, no extended tail.
    pub const LONG_PLAIN: Self = Self {
        long_names: true,
        extended: false,
    };
    /// Long keywords with the extended tail.
    pub const LONG_EXTENDED: Self = Self {
        long_names: true,
        extended: true,
    };

    /// Picks the keyword for `kind` under this format.
    #[must_use]
    pub const fn keyword(self, kind: EventKind) -> &'static str {
        if self.long_names {
            kind.long_name()
        } else {
            kind.short_name()
        }
    }
}

/// The union of every connection's subscribed mask, used to decide whether
/// an event needs to be computed/emitted at all before fanning it out.
///
/// Partitioned by wire-name family so a connection subscribed only under
/// the short name of an event doesn't force long-name bookkeeping, though
/// in practice both names address the same [`EventKind`] bit.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GlobalInterest(EventMask);

impl GlobalInterest {
    /// No connection is subscribed to anything.
    #[must_use]
    pub const fn none() -> Self {
        Self(EventMask::EMPTY)
    }

    /// Whether any connection wants `kind`.
    #[must_use]
    pub const fn wants(self, kind: EventKind) -> bool {
        self.0.contains(kind)
    }

    /// Recomputes global interest from every connection's current mask.
    #[must_use]
    pub fn recompute<'a>(connection_masks: impl IntoIterator<Item = &'a EventMask>) -> Self {
        Self(
            connection_masks
                .into_iter()
                .fold(EventMask::EMPTY, |acc, mask| acc.union(*mask)),
        )
    }
}

/// A subscriber entry in the fan-out registry: a connection identity plus
/// its subscribed mask and negotiated format.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Subscriber<Id> {
    /// Opaque connection identity, owned by the caller (e.g. `daemon::Hub`).
    pub id: Id,
    /// This connection's subscribed event mask.
    pub mask: EventMask,
    /// This connection's negotiated event line format.
    pub format: EventFormat,
}

/// Tracks every connection's subscription and exposes the recomputed
/// [`GlobalInterest`] after each change.
///
/// Mutation is expected to come from a single logical thread of control
/// (the connection hub); this type does no internal locking.
#[derive(Clone, Debug, Default)]
pub struct Registry<Id> {
    subscribers: Vec<Subscriber<Id>>,
    interest: GlobalInterest,
}

impl<Id: Copy + Eq> Registry<Id> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            interest: GlobalInterest::none(),
        }
    }

    /// Sets (replacing any prior subscription) `id`'s mask and format,
    /// recomputing global interest.
    pub fn set_events(&mut self, id: Id, mask: EventMask, format: EventFormat) {
        if let Some(existing) = self.subscribers.iter_mut().find(|s| s.id == id) {
            existing.mask = mask;
            existing.format = format;
        } else {
            self.subscribers.push(Subscriber { id, mask, format });
        }
        self.recompute();
    }

    /// Removes `id` entirely (connection closed), recomputing global
    /// interest.
    pub fn remove(&mut self, id: Id) {
        self.subscribers.retain(|s| s.id != id);
        self.recompute();
    }

    /// Returns the subscribers currently interested in `kind`, each paired
    /// with the format their line should be rendered in.
    pub fn interested_in(&self, kind: EventKind) -> impl Iterator<Item = (Id, EventFormat)> + '_ {
        self.subscribers
            .iter()
            .filter(move |s| s.mask.contains(kind))
            .map(|s| (s.id, s.format))
    }

    /// The current global interest, for deciding whether to bother
    /// computing an event's payload before fan-out.
    #[must_use]
    pub const fn global_interest(&self) -> GlobalInterest {
        self.interest
    }

    fn recompute(&mut self) {
        self.interest = GlobalInterest::recompute(self.subscribers.iter().map(|s| &s.mask));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_round_trips_membership() {
        let mask = EventMask::from_kinds([EventKind::Bandwidth, EventKind::CircuitStatus]);
        assert!(mask.contains(EventKind::Bandwidth));
        assert!(mask.contains(EventKind::CircuitStatus));
        assert!(!mask.contains(EventKind::LogErr));
    }

    #[test]
    fn wire_name_lookup_matches_both_forms() {
        assert_eq!(EventKind::from_wire_name("BW"), Some(EventKind::Bandwidth));
        assert_eq!(
            EventKind::from_wire_name("BANDWIDTH"),
            Some(EventKind::Bandwidth)
        );
        assert_eq!(EventKind::from_wire_name("NOT_REAL"), None);
    }

    #[test]
    fn every_kind_has_distinct_names() {
        let mut short_names: Vec<_> = EventKind::ALL.iter().map(|k| k.short_name()).collect();
        let before = short_names.len();
        short_names.sort_unstable();
        short_names.dedup();
        assert_eq!(short_names.len(), before, "duplicate short names");
    }

    #[test]
    fn registry_tracks_global_interest_across_subscribers() {
        let mut registry: Registry<u32> = Registry::new();
        assert!(!registry.global_interest().wants(EventKind::Bandwidth));

        registry.set_events(
            1,
            EventMask::from_kinds([EventKind::Bandwidth]),
            EventFormat::SHORT_PLAIN,
        );
        assert!(registry.global_interest().wants(EventKind::Bandwidth));
        assert!(!registry.global_interest().wants(EventKind::CircuitStatus));

        registry.set_events(
            2,
            EventMask::from_kinds([EventKind::CircuitStatus]),
            EventFormat::LONG_EXTENDED,
        );
        assert!(registry.global_interest().wants(EventKind::CircuitStatus));

        registry.remove(2);
        assert!(!registry.global_interest().wants(EventKind::CircuitStatus));
        assert!(registry.global_interest().wants(EventKind::Bandwidth));
    }

    #[test]
    fn interested_in_yields_only_matching_subscribers_with_their_format() {
        let mut registry: Registry<u32> = Registry::new();
        registry.set_events(
            1,
            EventMask::from_kinds([EventKind::Bandwidth]),
            EventFormat::SHORT_PLAIN,
        );
        registry.set_events(2, EventMask::EMPTY, EventFormat::LONG_PLAIN);

        let subs: Vec<_> = registry.interested_in(EventKind::Bandwidth).collect();
        assert_eq!(subs, vec![(1, EventFormat::SHORT_PLAIN)]);
    }

    #[test]
    fn resetting_a_known_subscriber_replaces_rather_than_duplicates() {
        let mut registry: Registry<u32> = Registry::new();
        registry.set_events(
            1,
            EventMask::from_kinds([EventKind::Bandwidth]),
            EventFormat::SHORT_PLAIN,
        );
        registry.set_events(1, EventMask::EMPTY, EventFormat::SHORT_PLAIN);
        assert!(!registry.global_interest().wants(EventKind::Bandwidth));
        assert_eq!(registry.interested_in(EventKind::Bandwidth).count(), 0);
    }
}
