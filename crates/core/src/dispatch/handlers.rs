//! Per-command handlers. Each takes whatever slice of state it needs and
//! returns an [`Outcome`]; none of them perform I/O.

use super::args::{parse_u32, split_key_value, tokenize};
use super::{Collaborators, EmittedEvent, Outcome};
use crate::auth::{self, AuthConfig};
use crate::collaborators::{CircuitOutcome, ConfigOutcome, DescriptorOutcome, MapAddressOutcome, MapSource};
use crate::connection::{ConnState, Connection};
use crate::error::{ControlError, ReplyCode};
use crate::events::{EventFormat, EventKind, EventMask};
use crate::getinfo;
use crate::writer;

pub(super) fn authenticate(conn: &mut Connection, auth_config: &AuthConfig, rest: &[u8]) -> Outcome {
    let mut password = match auth::parse_password_argument(rest) {
        Ok(p) => p,
        Err(err) => return Outcome::error(&err),
    };
    let result = auth::authenticate(auth_config, &password);
    auth::wipe(&mut password);
    match result {
        Ok(()) => {
            conn.mark_authenticated();
            Outcome::reply(writer::single(ReplyCode::Ok, "OK"))
        }
        Err(err) => Outcome::error(&err),
    }
}

pub(super) fn protocolinfo(conn: &mut Connection, auth_config: &AuthConfig, rest: &[u8]) -> Outcome {
    if conn.state() == ConnState::NeedAuth && conn.has_sent_protocolinfo() {
        return Outcome::reply_and_close(writer::single(
            ReplyCode::AuthRequired,
            "PROTOCOLINFO is permitted at most once before authentication",
        ));
    }

    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    for token in &tokens {
        if parse_u32(token).is_err() {
            return Outcome::error(&ControlError::Syntax(
                "PROTOCOLINFO version must be a non-negative integer".into(),
            ));
        }
    }

    let mut auth_methods = Vec::new();
    if auth_config.cookie.is_some() {
        auth_methods.push("COOKIE".to_string());
    }
    if !auth_config.hashed_passwords.is_empty() {
        auth_methods.push("HASHEDPASSWORD".to_string());
    }
    if auth_methods.is_empty() {
        auth_methods.push("NULL".to_string());
    }

    let auth_line = format!("AUTH METHODS={}", auth_methods.join(","));
    let lines = [
        "PROTOCOLINFO 1",
        auth_line.as_str(),
        "VERSION Tor=\"0.0.0\"",
        "OK",
    ];
    conn.mark_protocolinfo_sent();
    Outcome::reply(writer::multi(ReplyCode::Ok, &lines))
}

pub(super) fn setconf(collaborators: &mut Collaborators<'_>, rest: &[u8], reset: bool) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    let lines: Vec<(String, Option<String>)> = tokens
        .iter()
        .map(|t| {
            let (key, value) = split_key_value(t);
            (key, value.map(|v| String::from_utf8_lossy(&v).into_owned()))
        })
        .collect();
    match collaborators.config.trial_assign(&lines, reset) {
        ConfigOutcome::Ok => Outcome::reply(writer::single(ReplyCode::Ok, "OK")),
        ConfigOutcome::UnrecognisedKey(keys) => Outcome::error(&ControlError::UnrecognisedKey(
            format!("Unrecognized configuration key \"{}\"", keys.join(", ")),
        )),
        ConfigOutcome::UnacceptableValue(msg) => Outcome::error(&ControlError::UnacceptableValue(msg)),
        ConfigOutcome::TransitionNotAllowed(msg) => {
            Outcome::error(&ControlError::TransitionNotAllowed(msg))
        }
        ConfigOutcome::Internal(msg) => Outcome::error(&ControlError::Internal(msg)),
    }
}

pub(super) fn getconf(collaborators: &mut Collaborators<'_>, rest: &[u8]) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    let mut unrecognised = Vec::new();
    let mut lines = Vec::new();
    for token in &tokens {
        let key = String::from_utf8_lossy(token).into_owned();
        if !collaborators.config.is_recognised(&key) {
            unrecognised.push(key);
            continue;
        }
        let values = collaborators.config.get(&key);
        if values.is_empty() {
            lines.push(key);
        } else {
            for value in values {
                lines.push(format!("{key}={value}"));
            }
        }
    }
    if !unrecognised.is_empty() {
        return Outcome::error(&ControlError::UnrecognisedKey(format!(
            "Unrecognized configuration key \"{}\"",
            unrecognised.join(", ")
        )));
    }
    lines.push("OK".to_string());
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    Outcome::reply(writer::multi(ReplyCode::Ok, &refs))
}

pub(super) fn setevents(
    conn: &mut Connection,
    collaborators: &mut Collaborators<'_>,
    rest: &[u8],
) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    let mut mask = EventMask::EMPTY;
    let mut extended = false;
    for token in &tokens {
        let name = String::from_utf8_lossy(token).to_ascii_uppercase();
        if name == "EXTENDED" {
            extended = true;
            continue;
        }
        match EventKind::from_wire_name(&name) {
            Some(kind) => mask = mask.with(kind),
            None => {
                return Outcome::error(&ControlError::UnrecognisedKey(format!(
                    "Unrecognized event \"{name}\""
                )))
            }
        }
    }
    let subscribing_stream_bw_now =
        mask.contains(EventKind::StreamBandwidth) && !conn.event_mask().contains(EventKind::StreamBandwidth);
    conn.set_event_mask(mask);
    if extended {
        conn.enable_extended_events();
    }
    if subscribing_stream_bw_now {
        collaborators.streams.reset_byte_counters();
    }
    Outcome::reply(writer::single(ReplyCode::Ok, "OK"))
}

pub(super) fn saveconf(collaborators: &mut Collaborators<'_>) -> Outcome {
    match collaborators.config.save() {
        Ok(()) => Outcome::reply(writer::single(ReplyCode::Ok, "OK")),
        Err(msg) => Outcome::error(&ControlError::Internal(msg)),
    }
}

pub(super) fn signal(collaborators: &mut Collaborators<'_>, rest: &[u8]) -> Outcome {
    let name = String::from_utf8_lossy(rest).trim().to_ascii_uppercase();
    let ok = writer::single(ReplyCode::Ok, "OK");
    match name.as_str() {
        "RELOAD" | "HUP" => {
            collaborators.signals.reload();
            Outcome::reply(ok)
        }
        "SHUTDOWN" | "INT" => {
            collaborators.signals.shutdown();
            Outcome::reply(ok)
        }
        "DUMP" | "USR1" => {
            collaborators.signals.dump_stats();
            Outcome::reply(ok)
        }
        "DEBUG" | "USR2" => {
            collaborators.signals.toggle_debug_logging();
            Outcome::reply(ok)
        }
        "HALT" | "TERM" => {
            collaborators.signals.halt();
            Outcome::reply(ok)
        }
        "NEWNYM" => {
            collaborators.signals.new_identity();
            Outcome::reply(ok)
        }
        "CLEARDNSCACHE" => {
            collaborators.signals.clear_dns_cache();
            Outcome::reply(ok)
        }
        _ => Outcome::error(&ControlError::Syntax(format!("Unrecognized signal \"{name}\""))),
    }
}

pub(super) fn mapaddress(collaborators: &mut Collaborators<'_>, rest: &[u8]) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    let mut lines = Vec::new();
    for token in &tokens {
        let (from, to) = split_key_value(token);
        let Some(to) = to else {
            continue;
        };
        let to = String::from_utf8_lossy(&to).into_owned();
        let from_lower = from.to_ascii_lowercase();
        let to_lower = to.to_ascii_lowercase();
        let result = if from_lower == "." || from_lower == "0.0.0.0" {
            match collaborators.addresses.map(&from_lower, &to_lower) {
                MapAddressOutcome::Virtual(addr) => format!("{from_lower}={addr}"),
                other => render_map_outcome(&from_lower, &to_lower, &other),
            }
        } else {
            render_map_outcome(
                &from_lower,
                &to_lower,
                &collaborators.addresses.map(&from_lower, &to_lower),
            )
        };
        lines.push(result);
    }
    if lines.is_empty() {
        return Outcome::error(&ControlError::Syntax("MAPADDRESS requires at least one from=to pair".into()));
    }
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    Outcome::reply(writer::multi(ReplyCode::Ok, &refs))
}

fn render_map_outcome(from: &str, to: &str, outcome: &MapAddressOutcome) -> String {
    match outcome {
        MapAddressOutcome::Mapped => format!("{from}={to}"),
        MapAddressOutcome::Virtual(addr) => format!("{from}={addr}"),
        MapAddressOutcome::InvalidDestination => format!("{from}=<error: invalid destination \"{to}\">"),
    }
}

enum RenderedValue {
    Line(String),
    DataBlock(Vec<u8>),
}

pub(super) fn getinfo(collaborators: &mut Collaborators<'_>, rest: &[u8]) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    let mut unrecognised = Vec::new();
    let mut rendered: Vec<(String, RenderedValue)> = Vec::new();
    for token in &tokens {
        let key = String::from_utf8_lossy(token).into_owned();
        if getinfo::lookup(&key).is_none() {
            unrecognised.push(key);
            continue;
        }
        let value = resolve_getinfo_value(collaborators, &key);
        if value.contains(&b'\n') || value.contains(&b'\r') {
            rendered.push((key, RenderedValue::DataBlock(value)));
        } else {
            rendered.push((key, RenderedValue::Line(String::from_utf8_lossy(&value).into_owned())));
        }
    }
    if !unrecognised.is_empty() {
        return Outcome::error(&ControlError::UnrecognisedKey(format!(
            "Unrecognized key \"{}\"",
            unrecognised.join(", ")
        )));
    }

    let mut out = Vec::new();
    for (key, value) in &rendered {
        match value {
            RenderedValue::Line(text) => {
                writer::push_continuation(&mut out, ReplyCode::Ok, &format!("{key}={text}"));
            }
            RenderedValue::DataBlock(body) => {
                writer::push_data_block(&mut out, ReplyCode::Ok, &format!("{key}="), body);
            }
        }
    }
    writer::push_terminal(&mut out, ReplyCode::Ok, "OK");
    Outcome::reply(out)
}

/// USEFEATURE tokens recognised by [`usefeature`], shared with
/// `GETINFO features/names`.
const RECOGNISED_FEATURES: [&str; 3] = ["VERBOSE_NAMES", "EXTENDED_EVENTS", "EXTENDED_FORMAT"];

fn bool_flag(value: bool) -> Vec<u8> {
    (if value { "1" } else { "0" }).into()
}

fn resolve_getinfo_value(collaborators: &Collaborators<'_>, key: &str) -> Vec<u8> {
    match key {
        "version" => b"0.0.0".to_vec(),
        "config-file" => collaborators.config.config_file_path().unwrap_or_default().into_bytes(),
        "fingerprint" => collaborators.routers.fingerprint().unwrap_or_default().into_bytes(),
        "address" => collaborators.routers.external_address().unwrap_or_default().into_bytes(),
        "config-text" => collaborators.config.render_text().into_bytes(),
        "config/names" => collaborators
            .config
            .recognised_names()
            .iter()
            .map(|name| format!("{name} String"))
            .collect::<Vec<_>>()
            .join(" ")
            .into_bytes(),
        "circuit-status" => collaborators.circuits.status_lines().join("\n").into_bytes(),
        "stream-status" => collaborators.streams.status_lines().join("\n").into_bytes(),
        "orconn-status" => collaborators.routers.or_connections().join("\n").into_bytes(),
        "entry-guards/list" => collaborators.circuits.entry_guards().join("\n").into_bytes(),
        "ns/all" => collaborators.routers.network_status().into_bytes(),
        "desc/all-recent" => collaborators.routers.all_recent_descriptors().into_bytes(),
        "accounting/enabled" => bool_flag(collaborators.accounting.enabled()),
        "accounting/bytes" => {
            let (read, written) = collaborators.accounting.bytes_used();
            format!("{read} {written}").into_bytes()
        }
        "accounting/bytes-left" => collaborators.accounting.bytes_left().to_string().into_bytes(),
        "addr-mappings/all" => render_mappings(collaborators, MapSource::All),
        "addr-mappings/control" => render_mappings(collaborators, MapSource::Control),
        "addr-mappings/config" => render_mappings(collaborators, MapSource::Config),
        "addr-mappings/cache" => render_mappings(collaborators, MapSource::Cache),
        "status/version/current" => bool_flag(collaborators.routers.version_is_current()),
        "status/version/recommended" => collaborators.routers.recommended_versions().join(",").into_bytes(),
        "status/reachability/or" => bool_flag(collaborators.routers.or_reachable()),
        "status/reachability/dir" => bool_flag(collaborators.routers.dir_reachable()),
        "status/circuit-established" => bool_flag(collaborators.circuits.any_circuit_ever_built()),
        "net/listeners/or" => collaborators.routers.or_listeners().join(" ").into_bytes(),
        "net/listeners/dir" => collaborators.routers.dir_listeners().join(" ").into_bytes(),
        "process/pid" => std::process::id().to_string().into_bytes(),
        "dormant" => bool_flag(collaborators.accounting.dormant()),
        "events/names" => EventKind::ALL
            .iter()
            .map(|k| k.short_name())
            .collect::<Vec<_>>()
            .join(" ")
            .into_bytes(),
        "features/names" => RECOGNISED_FEATURES.join(" ").into_bytes(),
        "info/names" => getinfo::documented_names()
            .map(|e| e.name)
            .collect::<Vec<_>>()
            .join(" ")
            .into_bytes(),
        _ if key.starts_with("desc/id/") => collaborators
            .routers
            .descriptor_by_id(&key["desc/id/".len()..])
            .unwrap_or_default()
            .into_bytes(),
        _ if key.starts_with("desc/name/") => collaborators
            .routers
            .descriptor_by_name(&key["desc/name/".len()..])
            .unwrap_or_default()
            .into_bytes(),
        _ => Vec::new(),
    }
}

fn render_mappings(collaborators: &Collaborators<'_>, source: MapSource) -> Vec<u8> {
    collaborators
        .addresses
        .mappings(source)
        .iter()
        .map(|(from, to)| format!("{from}={to}"))
        .collect::<Vec<_>>()
        .join("\n")
        .into_bytes()
}

pub(super) fn extendcircuit(collaborators: &mut Collaborators<'_>, rest: &[u8]) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    let Some(id_token) = tokens.first() else {
        return Outcome::error(&ControlError::Syntax("EXTENDCIRCUIT requires a circuit id".into()));
    };
    let Ok(id) = parse_u32(id_token) else {
        return Outcome::error(&ControlError::Syntax("circuit id must be a non-negative integer".into()));
    };
    let hops: Vec<String> = tokens
        .get(1)
        .map(|t| {
            String::from_utf8_lossy(t)
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let purpose = tokens
        .iter()
        .skip(2)
        .find_map(|t| {
            let (key, value) = split_key_value(t);
            (key.eq_ignore_ascii_case("purpose"))
                .then(|| value.map(|v| String::from_utf8_lossy(&v).into_owned()))
                .flatten()
        })
        .unwrap_or_else(|| "general".to_string());

    let (outcome, is_new) = if id == 0 {
        (collaborators.circuits.extend_new(&purpose, &hops), true)
    } else {
        (collaborators.circuits.extend_existing(id, &hops), false)
    };

    match outcome {
        CircuitOutcome::Extended(new_id) => {
            let bytes = writer::single(ReplyCode::Ok, &format!("EXTENDED {new_id}"));
            let events = if is_new {
                vec![EmittedEvent {
                    kind: EventKind::CircuitStatus,
                    body: format!("{new_id} LAUNCHED"),
                    extra: Some(format!("PURPOSE={}", purpose.to_uppercase())),
                }]
            } else {
                Vec::new()
            };
            Outcome::Reply {
                bytes,
                close: false,
                events,
            }
        }
        CircuitOutcome::UnknownCircuit => {
            Outcome::error(&ControlError::UnrecognisedKey("Unknown circuit".into()))
        }
        CircuitOutcome::UnknownRouter(name) => {
            Outcome::error(&ControlError::UnrecognisedKey(format!("Unknown router \"{name}\"")))
        }
        CircuitOutcome::NoRoute => Outcome::error(&ControlError::Internal("No router available".into())),
        CircuitOutcome::Internal(msg) => Outcome::error(&ControlError::Internal(msg)),
    }
}

pub(super) fn setcircuitpurpose(collaborators: &mut Collaborators<'_>, rest: &[u8]) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    let Some(id_token) = tokens.first() else {
        return Outcome::error(&ControlError::Syntax("SETCIRCUITPURPOSE requires a circuit id".into()));
    };
    let Ok(id) = parse_u32(id_token) else {
        return Outcome::error(&ControlError::Syntax("circuit id must be a non-negative integer".into()));
    };
    let purpose = tokens.get(1).map(|t| split_key_value(t)).and_then(|(k, v)| {
        k.eq_ignore_ascii_case("purpose")
            .then(|| v.map(|v| String::from_utf8_lossy(&v).into_owned()))
            .flatten()
    });
    let Some(purpose) = purpose else {
        return Outcome::error(&ControlError::Syntax("SETCIRCUITPURPOSE requires purpose=".into()));
    };
    match collaborators.circuits.set_purpose(id, &purpose) {
        Ok(()) => Outcome::reply(writer::single(ReplyCode::Ok, "OK")),
        Err(msg) => Outcome::error(&ControlError::UnrecognisedKey(msg)),
    }
}

pub(super) fn attachstream(collaborators: &mut Collaborators<'_>, rest: &[u8]) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    if tokens.len() < 2 {
        return Outcome::error(&ControlError::Syntax(
            "ATTACHSTREAM requires a stream id and a circuit id".into(),
        ));
    }
    let (Ok(stream_id), Ok(circuit_id)) = (parse_u32(&tokens[0]), parse_u32(&tokens[1])) else {
        return Outcome::error(&ControlError::Syntax("stream and circuit ids must be non-negative integers".into()));
    };
    let hop: Option<u8> = tokens.get(2).and_then(|t| {
        let (key, value) = split_key_value(t);
        (key.eq_ignore_ascii_case("HOP"))
            .then(|| value.and_then(|v| std::str::from_utf8(&v).ok()?.parse().ok()))
            .flatten()
    });
    match collaborators.streams.attach(stream_id, circuit_id, hop) {
        Ok(()) => Outcome::reply(writer::single(ReplyCode::Ok, "OK")),
        Err(msg) => Outcome::error(&ControlError::TransitionNotAllowed(msg)),
    }
}

pub(super) fn redirectstream(collaborators: &mut Collaborators<'_>, rest: &[u8]) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    if tokens.len() < 2 {
        return Outcome::error(&ControlError::Syntax(
            "REDIRECTSTREAM requires a stream id and a new address".into(),
        ));
    }
    let Ok(stream_id) = parse_u32(&tokens[0]) else {
        return Outcome::error(&ControlError::Syntax("stream id must be a non-negative integer".into()));
    };
    let address = String::from_utf8_lossy(&tokens[1]).into_owned();
    let port = tokens.get(2).and_then(|t| std::str::from_utf8(t).ok()?.parse().ok());
    match collaborators.streams.redirect(stream_id, &address, port) {
        Ok(()) => Outcome::reply(writer::single(ReplyCode::Ok, "OK")),
        Err(msg) => Outcome::error(&ControlError::UnrecognisedKey(msg)),
    }
}

pub(super) fn closestream(collaborators: &mut Collaborators<'_>, rest: &[u8]) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    if tokens.len() < 2 {
        return Outcome::error(&ControlError::Syntax("CLOSESTREAM requires a stream id and a reason".into()));
    }
    let (Ok(stream_id), Ok(reason)) = (parse_u32(&tokens[0]), parse_u32(&tokens[1])) else {
        return Outcome::error(&ControlError::Syntax("stream id and reason must be non-negative integers".into()));
    };
    let Ok(reason) = u8::try_from(reason) else {
        return Outcome::error(&ControlError::UnacceptableValue("reason must be 0-255".into()));
    };
    match collaborators.streams.close(stream_id, reason) {
        Ok(()) => Outcome::reply(writer::single(ReplyCode::Ok, "OK")),
        Err(msg) => Outcome::error(&ControlError::UnrecognisedKey(msg)),
    }
}

pub(super) fn closecircuit(collaborators: &mut Collaborators<'_>, rest: &[u8]) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    let Some(id_token) = tokens.first() else {
        return Outcome::error(&ControlError::Syntax("CLOSECIRCUIT requires a circuit id".into()));
    };
    let Ok(id) = parse_u32(id_token) else {
        return Outcome::error(&ControlError::Syntax("circuit id must be a non-negative integer".into()));
    };
    let if_unused = tokens
        .iter()
        .skip(1)
        .any(|t| String::from_utf8_lossy(t).eq_ignore_ascii_case("IfUnused"));
    match collaborators.circuits.close(id, if_unused) {
        Ok(()) => Outcome::reply(writer::single(ReplyCode::Ok, "OK")),
        Err(msg) => Outcome::error(&ControlError::UnrecognisedKey(msg)),
    }
}

pub(super) fn resolve(conn: &Connection, collaborators: &mut Collaborators<'_>, rest: &[u8]) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    let mut reverse = false;
    let mut names = Vec::new();
    for token in &tokens {
        let text = String::from_utf8_lossy(token).into_owned();
        if text.eq_ignore_ascii_case("mode=reverse") {
            reverse = true;
        } else {
            names.push(text);
        }
    }
    if names.is_empty() {
        return Outcome::error(&ControlError::Syntax("RESOLVE requires at least one name".into()));
    }
    for name in &names {
        collaborators.dns.launch_resolve(name, reverse);
    }
    let _ = conn.event_mask().contains(EventKind::AddrMap);
    Outcome::reply(writer::single(ReplyCode::Ok, "OK"))
}

pub(super) fn usefeature(conn: &mut Connection, rest: &[u8]) -> Outcome {
    let tokens = match tokenize(rest) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    for token in &tokens {
        let name = String::from_utf8_lossy(token).to_ascii_uppercase();
        match name.as_str() {
            "VERBOSE_NAMES" => conn.enable_verbose_event_names(),
            "EXTENDED_EVENTS" | "EXTENDED_FORMAT" => conn.enable_extended_events(),
            other => {
                return Outcome::error(&ControlError::Syntax(format!(
                    "Unrecognized feature \"{other}\""
                )))
            }
        }
    }
    Outcome::reply(writer::single(ReplyCode::Ok, "OK"))
}

pub(super) fn postdescriptor(collaborators: &mut Collaborators<'_>, header: &[u8], body: &[u8]) -> Outcome {
    let tokens = match tokenize(header) {
        Ok(t) => t,
        Err(err) => return Outcome::error(&err),
    };
    let mut purpose = None;
    let mut cache = true;
    for token in &tokens {
        let (key, value) = split_key_value(token);
        let Some(value) = value else { continue };
        let value = String::from_utf8_lossy(&value).into_owned();
        match key.to_ascii_lowercase().as_str() {
            "purpose" => purpose = Some(value),
            "cache" => cache = value.eq_ignore_ascii_case("yes"),
            _ => {}
        }
    }
    match collaborators
        .descriptors
        .load_descriptor(body, purpose.as_deref(), cache)
    {
        DescriptorOutcome::Added => Outcome::reply(writer::single(ReplyCode::Ok, "OK")),
        DescriptorOutcome::NotAdded(msg) => {
            Outcome::reply(writer::single(ReplyCode::ActionNotCarriedOut, &msg))
        }
        DescriptorOutcome::ParseFailure(msg) => {
            Outcome::error(&ControlError::DescriptorParseFailure(msg))
        }
    }
}
