#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Listener, connection hub, and cookie-file bootstrap for the controller
//! interface. `core` implements the protocol itself; this crate supplies
//! the sockets, the single-task actor that owns connection state, and the
//! process entrypoint.

/// Bootstrap configuration (listen address, cookie policy, credentials).
pub mod config;
/// Per-connection socket I/O.
pub mod connection_task;
/// Authentication cookie file bootstrap.
pub mod cookie;
/// The connection hub actor.
pub mod hub;
/// In-memory reference implementations of the `core` collaborator traits.
pub mod reference;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::prelude::*;

use core::auth::AuthConfig;

use crate::config::Config;
use crate::hub::{Hub, HubLogSink, ToHub};

/// Outcome of a completed [`run`] call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// The process ran and stopped cleanly (e.g. on Ctrl-C).
    Ok,
    /// Argument parsing or configuration loading failed.
    BootstrapFailed,
    /// The control listener could not be bound.
    ListenFailed,
}

/// Maps a completed [`Status`] to the process exit code.
#[must_use]
pub fn exit_code_from(status: Status) -> ExitCode {
    match status {
        Status::Ok => ExitCode::SUCCESS,
        Status::BootstrapFailed | Status::ListenFailed => ExitCode::FAILURE,
    }
}

#[derive(Parser, Debug)]
#[command(name = "ctld", about = "Controller interface daemon")]
struct Args {
    /// Path to the TOML bootstrap configuration file.
    #[arg(long, default_value = "ctld.toml")]
    config: std::path::PathBuf,
}

fn env_filter_directive(floor: &str) -> &'static str {
    match floor.to_ascii_lowercase().as_str() {
        "debug" => "debug",
        "warn" => "warn",
        "err" | "error" => "error",
        _ => "info",
    }
}

/// Parses arguments, loads bootstrap configuration, installs the tracing
/// bridge, binds the control listener, and runs the connection hub until
/// interrupted.
///
/// Mirrors the convention of taking argument iterator and output streams
/// directly so the binary crate stays a thin shim over this entrypoint.
pub async fn run(
    args_os: impl IntoIterator<Item = OsString>,
    _stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> Status {
    let args = match Args::try_parse_from(args_os) {
        Ok(args) => args,
        Err(err) => {
            let _ = writeln!(stderr, "{err}");
            return Status::BootstrapFailed;
        }
    };

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            let _ = writeln!(stderr, "{err}");
            return Status::BootstrapFailed;
        }
    };

    let hashed_passwords = match config.decode_hashed_passwords() {
        Ok(passwords) => passwords,
        Err(err) => {
            let _ = writeln!(stderr, "{err}");
            return Status::BootstrapFailed;
        }
    };

    let cookie = if config.cookie_authentication {
        match cookie::write_cookie_file(&config.cookie_file, config.cookie_file_group_readable) {
            Ok(cookie) => Some(cookie),
            Err(err) => {
                let _ = writeln!(stderr, "{err}");
                return Status::BootstrapFailed;
            }
        }
    } else {
        None
    };

    let auth = AuthConfig {
        cookie,
        hashed_passwords,
    };

    let listener = match TcpListener::bind(config.listen_address).await {
        Ok(listener) => listener,
        Err(err) => {
            let _ = writeln!(stderr, "binding {}: {err}", config.listen_address);
            return Status::ListenFailed;
        }
    };

    let (hub_tx, hub_rx) = mpsc::unbounded_channel();

    let filter = tracing_subscriber::EnvFilter::new(env_filter_directive(&config.log_severity_floor));
    let bridge = logging::BridgeLayer::new(HubLogSink::new(hub_tx.clone()));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(bridge);
    let _ = tracing::subscriber::set_global_default(subscriber);

    let hub = Hub::new(auth, Some(args.config.display().to_string()));
    let hub_task = tokio::spawn(hub.run(hub_rx));

    let next_id = AtomicU64::new(1);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, _addr)) => {
                        let id = next_id.fetch_add(1, Ordering::Relaxed);
                        let hub_tx = hub_tx.clone();
                        tokio::spawn(connection_task::run(id, socket, hub_tx));
                    }
                    Err(err) => {
                        tracing::warn!("accept failed: {err}");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    drop(hub_tx);
    let _ = hub_task.await;
    Status::Ok
}
