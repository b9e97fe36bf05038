//! Narrow traits standing in for the external subsystems this interface
//! calls into but does not implement: circuit/stream engines, the router
//! descriptor store, address mapping, accounting, and configuration.
//!
//! `daemon` supplies in-memory implementations of these sufficient to drive
//! real connections end to end; a production node would back them with its
//! actual circuit-build engine, descriptor cache, and so on.

/// Outcome of a configuration trial-assignment (`SETCONF`/`RESETCONF`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigOutcome {
    /// Every assignment succeeded and was committed.
    Ok,
    /// One or more keys were not recognised.
    UnrecognisedKey(Vec<String>),
    /// A recognised key was given a value it cannot accept.
    UnacceptableValue(String),
    /// The option cannot be changed once the node is running.
    TransitionNotAllowed(String),
    /// Assignment failed for a reason not otherwise classified.
    Internal(String),
}

/// The configuration store behind GETCONF/SETCONF/RESETCONF/SAVECONF.
pub trait ConfigStore {
    /// Whether `key` is a recognised option name.
    fn is_recognised(&self, key: &str) -> bool;

    /// The currently assigned values for `key`, in assignment order; empty
    /// if the option has no value set.
    fn get(&self, key: &str) -> Vec<String>;

    /// Attempts to assign `lines` (each already split into `key`/`value`),
    /// clearing prior values for touched keys first when `reset` is set.
    /// Must be atomic: a failure partway through leaves no line applied.
    fn trial_assign(&mut self, lines: &[(String, Option<String>)], reset: bool) -> ConfigOutcome;

    /// Persists the current configuration to its backing store.
    fn save(&mut self) -> Result<(), String>;

    /// The configuration rendered as it would appear on disk.
    fn render_text(&self) -> String;

    /// Path to the configuration file in use, if this store is backed by one.
    fn config_file_path(&self) -> Option<String> {
        None
    }

    /// Every recognised option name, for `GETINFO config/names`.
    fn recognised_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Circuit identifier as used on the wire (decimal in command arguments).
pub type CircuitId = u32;

/// Outcome of `EXTENDCIRCUIT`/`ATTACHSTREAM`-style circuit operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CircuitOutcome {
    /// Operation succeeded, yielding the (possibly newly assigned) circuit id.
    Extended(CircuitId),
    /// No circuit exists with the given id.
    UnknownCircuit,
    /// A named router could not be resolved.
    UnknownRouter(String),
    /// No router was available to extend to.
    NoRoute,
    /// Failed for a reason internal to the circuit engine.
    Internal(String),
}

/// The circuit build/teardown engine behind EXTENDCIRCUIT, SETCIRCUITPURPOSE,
/// and CLOSECIRCUIT.
pub trait CircuitManager {
    /// Creates a new circuit with the given purpose and appends `hops`.
    fn extend_new(&mut self, purpose: &str, hops: &[String]) -> CircuitOutcome;

    /// Appends `hops` to an existing, open circuit.
    fn extend_existing(&mut self, id: CircuitId, hops: &[String]) -> CircuitOutcome;

    /// Changes an existing circuit's purpose in place.
    fn set_purpose(&mut self, id: CircuitId, purpose: &str) -> Result<(), String>;

    /// Closes a circuit. `if_unused` skips the close when streams remain
    /// attached, still reporting success.
    fn close(&mut self, id: CircuitId, if_unused: bool) -> Result<(), String>;

    /// One status line per known circuit (`GETINFO circuit-status`).
    fn status_lines(&self) -> Vec<String>;

    /// The current entry guard list (`GETINFO entry-guards/list`).
    fn entry_guards(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether any circuit has ever been successfully built
    /// (`GETINFO status/circuit-established`).
    fn any_circuit_ever_built(&self) -> bool {
        false
    }
}

/// Stream identifier as used on the wire.
pub type StreamId = u32;

/// The stream handshake/attachment engine behind ATTACHSTREAM,
/// REDIRECTSTREAM, CLOSESTREAM, and RESOLVE.
pub trait StreamManager {
    /// Detaches `stream` from any circuit, ending the old attachment with a
    /// timeout reason, then attaches it to `circuit` (optionally at a
    /// specific hop).
    fn attach(&mut self, stream: StreamId, circuit: CircuitId, hop: Option<u8>) -> Result<(), String>;

    /// Rewrites a stream's destination address and, optionally, port.
    fn redirect(&mut self, stream: StreamId, address: &str, port: Option<u16>) -> Result<(), String>;

    /// Marks a stream unattached with the given close reason.
    fn close(&mut self, stream: StreamId, reason: u8) -> Result<(), String>;

    /// One status line per known stream (`GETINFO stream-status`).
    fn status_lines(&self) -> Vec<String>;

    /// Zeroes any per-stream byte counters (used when StreamBandwidth is
    /// first subscribed, so the first report only reflects new traffic).
    fn reset_byte_counters(&mut self);
}

/// The router descriptor and network-status store behind most `desc/*` and
/// `ns/*` GETINFO keys.
pub trait RouterStore {
    /// The most recent descriptor for every known router, concatenated.
    fn all_recent_descriptors(&self) -> String;

    /// A descriptor by identity fingerprint, if known.
    fn descriptor_by_id(&self, hex_fingerprint: &str) -> Option<String>;

    /// A descriptor by nickname, if known.
    fn descriptor_by_name(&self, nickname: &str) -> Option<String>;

    /// The current consensus network status document.
    fn network_status(&self) -> String;

    /// This node's identity fingerprint (`GETINFO fingerprint`).
    fn fingerprint(&self) -> Option<String> {
        None
    }

    /// This node's best-guess external address (`GETINFO address`).
    fn external_address(&self) -> Option<String> {
        None
    }

    /// One status line per known OR connection (`GETINFO orconn-status`).
    fn or_connections(&self) -> Vec<String> {
        Vec::new()
    }

    /// Addresses this node listens for OR connections on.
    fn or_listeners(&self) -> Vec<String> {
        Vec::new()
    }

    /// Addresses this node listens for directory connections on.
    fn dir_listeners(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the running version is considered current.
    fn version_is_current(&self) -> bool {
        true
    }

    /// The list of recommended versions.
    fn recommended_versions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether this node's OR port has been confirmed reachable.
    fn or_reachable(&self) -> bool {
        false
    }

    /// Whether this node's directory port has been confirmed reachable.
    fn dir_reachable(&self) -> bool {
        false
    }
}

/// Outcome of submitting a router descriptor (`+POSTDESCRIPTOR`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DescriptorOutcome {
    /// Descriptor accepted.
    Added,
    /// Descriptor parsed but was not added (e.g. duplicate, not useful).
    NotAdded(String),
    /// Descriptor failed to parse.
    ParseFailure(String),
}

/// The router descriptor ingestion path behind `+POSTDESCRIPTOR`.
pub trait DescriptorStore {
    /// Attempts to load a single descriptor document.
    fn load_descriptor(&mut self, body: &[u8], purpose: Option<&str>, cache: bool) -> DescriptorOutcome;
}

/// Outcome of a `MAPADDRESS` request for one `from=to` pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MapAddressOutcome {
    /// Mapping registered as given.
    Mapped,
    /// A virtual address was allocated; the caller reports `virtual=<addr>`.
    Virtual(String),
    /// `to` was not a syntactically valid destination.
    InvalidDestination,
}

/// Address-mapping state behind `MAPADDRESS` and `addr-mappings/*`.
pub trait AddressMap {
    /// Registers or allocates a mapping for one pair.
    fn map(&mut self, from: &str, to: &str) -> MapAddressOutcome;

    /// Every mapping, partitioned by source: control (MAPADDRESS),
    /// configuration, and automatic cache entries.
    fn mappings(&self, source: MapSource) -> Vec<(String, String)>;
}

/// Which subset of address mappings to report.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MapSource {
    /// Every mapping regardless of source.
    All,
    /// Mappings created by `MAPADDRESS`.
    Control,
    /// Mappings loaded from configuration.
    Config,
    /// Mappings learned automatically (e.g. DNS cache).
    Cache,
}

/// Bandwidth accounting state behind `accounting/*`.
pub trait Accounting {
    /// Whether accounting is enabled at all.
    fn enabled(&self) -> bool;

    /// Bytes (read, written) so far in the current interval.
    fn bytes_used(&self) -> (u64, u64);

    /// Bytes remaining before hibernation in the current interval.
    fn bytes_left(&self) -> u64;

    /// Whether this node is currently dormant (`GETINFO dormant`).
    fn dormant(&self) -> bool {
        false
    }
}

/// The DNS resolution path behind `RESOLVE`.
pub trait DnsResolver {
    /// Launches an asynchronous resolve for `name`; `reverse` requests a
    /// PTR-style lookup. Results are reported later via the ADDRMAP event,
    /// not returned synchronously.
    fn launch_resolve(&mut self, name: &str, reverse: bool);
}

/// The process-control actions behind `SIGNAL`.
pub trait SignalSink {
    /// Reloads configuration (RELOAD/HUP).
    fn reload(&mut self);
    /// Initiates a clean shutdown (SHUTDOWN/INT).
    fn shutdown(&mut self);
    /// Dumps internal statistics to the log (DUMP/USR1).
    fn dump_stats(&mut self);
    /// Toggles debug-level logging (DEBUG/USR2).
    fn toggle_debug_logging(&mut self);
    /// Halts immediately without a clean shutdown (HALT/TERM).
    fn halt(&mut self);
    /// Clears all circuits and establishes a new identity (NEWNYM).
    fn new_identity(&mut self);
    /// Clears the DNS cache (CLEARDNSCACHE).
    fn clear_dns_cache(&mut self);
}
