//! In-memory reference implementations of every `core::collaborators`
//! trait, sufficient to drive real connections end to end without a real
//! circuit-build engine, descriptor cache, or accounting subsystem behind
//! them.

use std::collections::HashMap;

use core::collaborators::{
    Accounting, AddressMap, CircuitManager, CircuitOutcome, ConfigOutcome, ConfigStore,
    DescriptorOutcome, DescriptorStore, DnsResolver, MapAddressOutcome, MapSource, RouterStore,
    SignalSink, StreamManager,
};

/// A configuration store backed by a plain key → values map, with a fixed
/// set of recognised option names.
pub struct InMemoryConfigStore {
    recognised: Vec<String>,
    values: HashMap<String, Vec<String>>,
    config_file_path: Option<String>,
}

impl InMemoryConfigStore {
    /// Creates a store recognising exactly `option_names`, with no backing
    /// file on disk.
    #[must_use]
    pub fn new(option_names: impl IntoIterator<Item = String>) -> Self {
        Self {
            recognised: option_names.into_iter().collect(),
            values: HashMap::new(),
            config_file_path: None,
        }
    }

    /// Records the path this store was loaded from, reported back through
    /// `GETINFO config-file`.
    pub fn set_config_file_path(&mut self, path: Option<String>) {
        self.config_file_path = path;
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn is_recognised(&self, key: &str) -> bool {
        self.recognised.iter().any(|k| k.eq_ignore_ascii_case(key))
    }

    fn get(&self, key: &str) -> Vec<String> {
        self.values.get(key).cloned().unwrap_or_default()
    }

    fn trial_assign(&mut self, lines: &[(String, Option<String>)], reset: bool) -> ConfigOutcome {
        let mut unrecognised = Vec::new();
        for (key, _) in lines {
            if !self.is_recognised(key) {
                unrecognised.push(key.clone());
            }
        }
        if !unrecognised.is_empty() {
            return ConfigOutcome::UnrecognisedKey(unrecognised);
        }
        let mut staged = self.values.clone();
        for (key, value) in lines {
            let entry = staged.entry(key.clone()).or_default();
            if reset {
                entry.clear();
            }
            if let Some(value) = value {
                entry.push(value.clone());
            }
        }
        self.values = staged;
        ConfigOutcome::Ok
    }

    fn save(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn render_text(&self) -> String {
        let mut lines: Vec<String> = self
            .values
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| format!("{key} {v}")))
            .collect();
        lines.sort();
        lines.join("\n")
    }

    fn config_file_path(&self) -> Option<String> {
        self.config_file_path.clone()
    }

    fn recognised_names(&self) -> Vec<String> {
        self.recognised.clone()
    }
}

/// A trivially incrementing circuit manager.
#[derive(Default)]
pub struct InMemoryCircuitManager {
    next_id: u32,
    purposes: HashMap<u32, String>,
    open: HashMap<u32, Vec<String>>,
    built_ever: bool,
}

impl CircuitManager for InMemoryCircuitManager {
    fn extend_new(&mut self, purpose: &str, hops: &[String]) -> CircuitOutcome {
        self.next_id += 1;
        let id = self.next_id;
        self.purposes.insert(id, purpose.to_string());
        self.open.insert(id, hops.to_vec());
        self.built_ever = true;
        CircuitOutcome::Extended(id)
    }

    fn extend_existing(&mut self, id: u32, hops: &[String]) -> CircuitOutcome {
        let Some(existing) = self.open.get_mut(&id) else {
            return CircuitOutcome::UnknownCircuit;
        };
        existing.extend(hops.iter().cloned());
        CircuitOutcome::Extended(id)
    }

    fn set_purpose(&mut self, id: u32, purpose: &str) -> Result<(), String> {
        if !self.open.contains_key(&id) {
            return Err(format!("unknown circuit {id}"));
        }
        self.purposes.insert(id, purpose.to_string());
        Ok(())
    }

    fn close(&mut self, id: u32, if_unused: bool) -> Result<(), String> {
        if !self.open.contains_key(&id) {
            return Err(format!("unknown circuit {id}"));
        }
        if !if_unused {
            self.open.remove(&id);
            self.purposes.remove(&id);
        }
        Ok(())
    }

    fn status_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .open
            .iter()
            .map(|(id, hops)| {
                format!(
                    "{id} BUILT {} PURPOSE={}",
                    hops.join(","),
                    self.purposes.get(id).map_or("GENERAL", String::as_str)
                )
            })
            .collect();
        lines.sort();
        lines
    }

    fn any_circuit_ever_built(&self) -> bool {
        self.built_ever
    }
}

/// A trivial stream manager tracking attachment state in memory.
#[derive(Default)]
pub struct InMemoryStreamManager {
    attachments: HashMap<u32, u32>,
    byte_counters: HashMap<u32, (u64, u64)>,
}

impl StreamManager for InMemoryStreamManager {
    fn attach(&mut self, stream: u32, circuit: u32, _hop: Option<u8>) -> Result<(), String> {
        self.attachments.insert(stream, circuit);
        Ok(())
    }

    fn redirect(&mut self, stream: u32, _address: &str, _port: Option<u16>) -> Result<(), String> {
        if !self.attachments.contains_key(&stream) {
            return Err(format!("unknown stream {stream}"));
        }
        Ok(())
    }

    fn close(&mut self, stream: u32, _reason: u8) -> Result<(), String> {
        self.attachments.remove(&stream);
        Ok(())
    }

    fn status_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .attachments
            .iter()
            .map(|(stream, circuit)| format!("{stream} SUCCEEDED {circuit}"))
            .collect();
        lines.sort();
        lines
    }

    fn reset_byte_counters(&mut self) {
        self.byte_counters.clear();
    }
}

/// A router store with no real descriptors, sufficient to answer `GETINFO`
/// lookups without panicking.
///
/// A freshly started node has no confirmed identity or reachability;
/// `version_is_current` defaults to `true` since there is no upstream
/// version-recommendation feed behind this reference implementation to
/// disagree with it.
pub struct InMemoryRouterStore {
    fingerprint: Option<String>,
    external_address: Option<String>,
    or_listeners: Vec<String>,
    dir_listeners: Vec<String>,
    or_connections: Vec<String>,
    version_is_current: bool,
    recommended_versions: Vec<String>,
    or_reachable: bool,
    dir_reachable: bool,
}

impl Default for InMemoryRouterStore {
    fn default() -> Self {
        Self {
            fingerprint: None,
            external_address: None,
            or_listeners: Vec::new(),
            dir_listeners: Vec::new(),
            or_connections: Vec::new(),
            version_is_current: true,
            recommended_versions: Vec::new(),
            or_reachable: false,
            dir_reachable: false,
        }
    }
}

impl RouterStore for InMemoryRouterStore {
    fn all_recent_descriptors(&self) -> String {
        String::new()
    }

    fn descriptor_by_id(&self, _hex_fingerprint: &str) -> Option<String> {
        None
    }

    fn descriptor_by_name(&self, _nickname: &str) -> Option<String> {
        None
    }

    fn network_status(&self) -> String {
        String::new()
    }

    fn fingerprint(&self) -> Option<String> {
        self.fingerprint.clone()
    }

    fn external_address(&self) -> Option<String> {
        self.external_address.clone()
    }

    fn or_connections(&self) -> Vec<String> {
        self.or_connections.clone()
    }

    fn or_listeners(&self) -> Vec<String> {
        self.or_listeners.clone()
    }

    fn dir_listeners(&self) -> Vec<String> {
        self.dir_listeners.clone()
    }

    fn version_is_current(&self) -> bool {
        self.version_is_current
    }

    fn recommended_versions(&self) -> Vec<String> {
        self.recommended_versions.clone()
    }

    fn or_reachable(&self) -> bool {
        self.or_reachable
    }

    fn dir_reachable(&self) -> bool {
        self.dir_reachable
    }
}

/// Accepts any syntactically plausible descriptor body.
#[derive(Default)]
pub struct InMemoryDescriptorStore {
    accepted: u32,
}

impl DescriptorStore for InMemoryDescriptorStore {
    fn load_descriptor(&mut self, body: &[u8], _purpose: Option<&str>, _cache: bool) -> DescriptorOutcome {
        if body.is_empty() {
            return DescriptorOutcome::ParseFailure("empty descriptor body".to_string());
        }
        self.accepted += 1;
        DescriptorOutcome::Added
    }
}

/// An address map with a simple virtual-address counter.
#[derive(Default)]
pub struct InMemoryAddressMap {
    mappings: Vec<(String, String)>,
    next_virtual: u32,
}

impl AddressMap for InMemoryAddressMap {
    fn map(&mut self, from: &str, to: &str) -> MapAddressOutcome {
        if to.contains("..") {
            return MapAddressOutcome::InvalidDestination;
        }
        if from == "." || from == "0.0.0.0" {
            self.next_virtual += 1;
            let virtual_addr = format!("10.192.0.{}", self.next_virtual);
            self.mappings.push((virtual_addr.clone(), to.to_string()));
            return MapAddressOutcome::Virtual(virtual_addr);
        }
        self.mappings.push((from.to_string(), to.to_string()));
        MapAddressOutcome::Mapped
    }

    fn mappings(&self, _source: MapSource) -> Vec<(String, String)> {
        self.mappings.clone()
    }
}

/// Accounting disabled by default; every query reports zero usage.
#[derive(Default)]
pub struct InMemoryAccounting {
    /// Whether accounting is turned on.
    pub enabled: bool,
    /// Whether this node is currently dormant.
    pub dormant: bool,
}

impl Accounting for InMemoryAccounting {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn bytes_used(&self) -> (u64, u64) {
        (0, 0)
    }

    fn bytes_left(&self) -> u64 {
        0
    }

    fn dormant(&self) -> bool {
        self.dormant
    }
}

/// Records resolve requests without actually performing DNS lookups.
#[derive(Default)]
pub struct InMemoryDnsResolver {
    requested: Vec<(String, bool)>,
}

impl DnsResolver for InMemoryDnsResolver {
    fn launch_resolve(&mut self, name: &str, reverse: bool) {
        self.requested.push((name.to_string(), reverse));
    }
}

/// Logs every signal action via `tracing` instead of acting on the process.
#[derive(Default)]
pub struct TracingSignalSink;

impl SignalSink for TracingSignalSink {
    fn reload(&mut self) {
        tracing::info!("SIGNAL: reload requested");
    }
    fn shutdown(&mut self) {
        tracing::info!("SIGNAL: shutdown requested");
    }
    fn dump_stats(&mut self) {
        tracing::info!("SIGNAL: stats dump requested");
    }
    fn toggle_debug_logging(&mut self) {
        tracing::info!("SIGNAL: debug logging toggled");
    }
    fn halt(&mut self) {
        tracing::info!("SIGNAL: halt requested");
    }
    fn new_identity(&mut self) {
        tracing::info!("SIGNAL: new identity requested");
    }
    fn clear_dns_cache(&mut self) {
        tracing::info!("SIGNAL: DNS cache cleared");
    }
}

/// Every reference collaborator, owned together so the hub can hand out
/// `core::dispatch::Collaborators` borrows from one place.
#[derive(Default)]
pub struct ReferenceCollaborators {
    /// Configuration store.
    pub config: InMemoryConfigStore,
    /// Circuit manager.
    pub circuits: InMemoryCircuitManager,
    /// Stream manager.
    pub streams: InMemoryStreamManager,
    /// Router store.
    pub routers: InMemoryRouterStore,
    /// Descriptor store.
    pub descriptors: InMemoryDescriptorStore,
    /// Address map.
    pub addresses: InMemoryAddressMap,
    /// Accounting.
    pub accounting: InMemoryAccounting,
    /// DNS resolver.
    pub dns: InMemoryDnsResolver,
    /// Signal sink.
    pub signals: TracingSignalSink,
}

impl Default for InMemoryConfigStore {
    fn default() -> Self {
        Self::new([
            "Nickname".to_string(),
            "ORPort".to_string(),
            "ControlPort".to_string(),
            "Log".to_string(),
        ])
    }
}

impl ReferenceCollaborators {
    /// Creates the reference collaborator set, recording `config_file_path`
    /// for `GETINFO config-file`.
    #[must_use]
    pub fn new(config_file_path: Option<String>) -> Self {
        let mut collaborators = Self::default();
        collaborators.config.set_config_file_path(config_file_path);
        collaborators
    }

    /// Borrows every collaborator as the trait-object bundle
    /// [`core::dispatch::Collaborators`] expects.
    pub fn as_dispatch_collaborators(&mut self) -> core::dispatch::Collaborators<'_> {
        core::dispatch::Collaborators {
            config: &mut self.config,
            circuits: &mut self.circuits,
            streams: &mut self.streams,
            routers: &self.routers,
            descriptors: &mut self.descriptors,
            addresses: &mut self.addresses,
            accounting: &self.accounting,
            dns: &mut self.dns,
            signals: &mut self.signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_store_rejects_unrecognised_key() {
        let mut store = InMemoryConfigStore::new(["Nickname".to_string()]);
        let outcome = store.trial_assign(&[("Bogus".to_string(), Some("1".to_string()))], false);
        assert!(matches!(outcome, ConfigOutcome::UnrecognisedKey(_)));
    }

    #[test]
    fn config_store_commits_recognised_assignment() {
        let mut store = InMemoryConfigStore::new(["Nickname".to_string()]);
        let outcome = store.trial_assign(&[("Nickname".to_string(), Some("relay1".to_string()))], false);
        assert_eq!(outcome, ConfigOutcome::Ok);
        assert_eq!(store.get("Nickname"), vec!["relay1".to_string()]);
    }

    #[test]
    fn circuit_manager_assigns_increasing_ids() {
        let mut circuits = InMemoryCircuitManager::default();
        let CircuitOutcome::Extended(first) = circuits.extend_new("general", &["a".into()]) else {
            panic!("expected Extended");
        };
        let CircuitOutcome::Extended(second) = circuits.extend_new("general", &["b".into()]) else {
            panic!("expected Extended");
        };
        assert!(second > first);
    }

    #[test]
    fn address_map_allocates_virtual_addresses_for_dot() {
        let mut map = InMemoryAddressMap::default();
        let MapAddressOutcome::Virtual(addr) = map.map(".", "example.onion") else {
            panic!("expected a virtual address");
        };
        assert!(addr.starts_with("10.192."));
    }

    #[test]
    fn address_map_rejects_destinations_with_double_dots() {
        let mut map = InMemoryAddressMap::default();
        assert_eq!(
            map.map("foo.onion", "bad..dest"),
            MapAddressOutcome::InvalidDestination
        );
    }
}
