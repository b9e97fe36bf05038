//! GETINFO key registry: a small `{name, is_prefix, description}` table with
//! linear lookup. This is not a hot path, so a `Vec` scan is the right
//! tradeoff over a prefix tree or hash map.

/// One registered GETINFO key.
#[derive(Clone, Copy, Debug)]
pub struct KeyEntry {
    /// The literal key, or the fixed prefix for `is_prefix` entries.
    pub name: &'static str,
    /// Whether `name` is a prefix (e.g. `desc/id/` matches `desc/id/<hex>`).
    pub is_prefix: bool,
    /// One-line description shown by `GETINFO info/<key>`; `None` marks an
    /// undocumented entry, excluded from `info/names`.
    pub description: Option<&'static str>,
}

macro_rules! key {
    ($name:expr, $description:expr) => {
        KeyEntry {
            name: $name,
            is_prefix: false,
            description: Some($description),
        }
    };
}

macro_rules! prefix_key {
    ($name:expr, $description:expr) => {
        KeyEntry {
            name: $name,
            is_prefix: true,
            description: Some($description),
        }
    };
}

/// The full set of registered keys, in lookup order.
pub const REGISTRY: &[KeyEntry] = &[
    key!("version", "The running software version."),
    key!("config-file", "Path to the configuration file in use."),
    key!("fingerprint", "This node's identity fingerprint."),
    key!("address", "This node's best-guess external IP address."),
    key!("events/names", "A space-separated list of every recognised event name."),
    key!("features/names", "A space-separated list of every recognised USEFEATURE token."),
    key!("info/names", "A list of all documented GETINFO keys and their descriptions."),
    key!("config/names", "A list of configuration option names and their types."),
    key!("config-text", "The current configuration, as it would appear on disk."),
    key!("circuit-status", "One line per known circuit."),
    key!("stream-status", "One line per known stream."),
    key!("orconn-status", "One line per OR connection."),
    key!("addr-mappings/all", "Every known address mapping."),
    key!("addr-mappings/control", "Address mappings created by MAPADDRESS."),
    key!("addr-mappings/config", "Address mappings from configuration."),
    key!("addr-mappings/cache", "Address mappings learned automatically."),
    key!("entry-guards/list", "The current entry guard list."),
    key!("accounting/enabled", "Whether bandwidth accounting is enabled."),
    key!("accounting/bytes", "Bytes read and written in the current accounting interval."),
    key!("accounting/bytes-left", "Bytes left before hibernation in the current interval."),
    key!("status/version/current", "Whether the running version is considered current."),
    key!("status/version/recommended", "The list of recommended versions."),
    key!("status/reachability/or", "Whether this node's OR port has been confirmed reachable."),
    key!("status/reachability/dir", "Whether this node's directory port has been confirmed reachable."),
    key!("status/circuit-established", "Whether a circuit has ever been successfully built."),
    key!("ns/all", "The current consensus network status for every router."),
    key!("desc/all-recent", "The most recent descriptor for every known router."),
    prefix_key!("desc/id/", "A router descriptor by identity fingerprint."),
    prefix_key!("desc/name/", "A router descriptor by nickname."),
    key!("net/listeners/or", "Addresses this node listens for OR connections on."),
    key!("net/listeners/dir", "Addresses this node listens for directory connections on."),
    key!("process/pid", "This process's process ID."),
    key!("dormant", "Whether this node is currently dormant."),
];

/// Looks up `key` against the registry, matching exact names first and
/// falling back to prefix entries.
#[must_use]
pub fn lookup(key: &str) -> Option<&'static KeyEntry> {
    REGISTRY
        .iter()
        .find(|entry| !entry.is_prefix && entry.name == key)
        .or_else(|| {
            REGISTRY
                .iter()
                .find(|entry| entry.is_prefix && key.starts_with(entry.name))
        })
}

/// The documented keys, for `GETINFO info/names`; undocumented entries
/// (`description: None`) are excluded.
pub fn documented_names() -> impl Iterator<Item = &'static KeyEntry> {
    REGISTRY.iter().filter(|entry| entry.description.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_key_is_found() {
        assert!(lookup("version").is_some());
    }

    #[test]
    fn prefix_key_matches_any_suffix() {
        let entry = lookup("desc/id/ABCDEF0123").unwrap();
        assert_eq!(entry.name, "desc/id/");
    }

    #[test]
    fn unknown_key_is_not_found() {
        assert!(lookup("totally/unknown").is_none());
    }

    #[test]
    fn exact_match_wins_over_a_would_be_prefix_collision() {
        // "version" is exact; ensure a hypothetical prefix of the same text
        // wouldn't shadow it (regression guard for lookup ordering).
        assert_eq!(lookup("version").unwrap().name, "version");
    }

    #[test]
    fn every_registry_entry_is_documented() {
        assert_eq!(documented_names().count(), REGISTRY.len());
    }

    #[test]
    fn registry_has_no_duplicate_names() {
        let mut names: Vec<_> = REGISTRY.iter().map(|e| e.name).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before);
    }
}
