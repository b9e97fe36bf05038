//! Bootstrap configuration: the daemon's own listen address, cookie-file
//! policy, and configured hashed passwords. Distinct from the in-protocol
//! `ConfigStore` collaborator, which models the node's runtime
//! configuration surface exposed through GETCONF/SETCONF.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

/// One configured salted-hash credential, as it appears in the TOML file
/// (hex-encoded salt and digest).
#[derive(Clone, Debug, Deserialize)]
pub struct HashedPasswordEntry {
    /// Hex-encoded 16-byte salt.
    pub salt: String,
    /// Iteration count for the key-stretching loop.
    pub iterations: u32,
    /// Hex-encoded 32-byte expected digest.
    pub digest: String,
}

/// Top-level bootstrap configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the controller listener binds to.
    pub listen_address: SocketAddr,
    /// Whether cookie authentication is enabled.
    pub cookie_authentication: bool,
    /// Where the cookie file is written, if cookie authentication is on.
    pub cookie_file: PathBuf,
    /// Whether the cookie file is created group-readable.
    pub cookie_file_group_readable: bool,
    /// Configured salted-hash credentials.
    pub hashed_passwords: Vec<HashedPasswordEntry>,
    /// Initial minimum log severity forwarded to controllers
    /// (`debug`/`info`/`notice`/`warn`/`err`).
    pub log_severity_floor: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:9051".parse().expect("valid default address"),
            cookie_authentication: true,
            cookie_file: PathBuf::from("control_auth_cookie"),
            cookie_file_group_readable: false,
            hashed_passwords: Vec::new(),
            log_severity_floor: "notice".to_string(),
        }
    }
}

/// Failures while loading or validating bootstrap configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("reading configuration file {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file was not valid TOML for this schema.
    #[error("parsing configuration file {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },
    /// A hex-encoded field in `hashed_passwords` was malformed.
    #[error("hashed password entry {index}: {message}")]
    InvalidHashedPassword {
        /// Index into the configured list.
        index: usize,
        /// What was wrong with it.
        message: String,
    },
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its contents don't match this schema.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Decodes `hashed_passwords` into [`core::auth::HashedPassword`]
    /// values, validating hex encoding and lengths.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHashedPassword`] for any entry whose
    /// salt or digest is not valid hex of the expected length.
    pub fn decode_hashed_passwords(&self) -> Result<Vec<core::auth::HashedPassword>, ConfigError> {
        self.hashed_passwords
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let salt_bytes = hex::decode(&entry.salt).map_err(|e| ConfigError::InvalidHashedPassword {
                    index,
                    message: format!("invalid salt hex: {e}"),
                })?;
                let digest_bytes = hex::decode(&entry.digest).map_err(|e| ConfigError::InvalidHashedPassword {
                    index,
                    message: format!("invalid digest hex: {e}"),
                })?;
                let salt: [u8; 16] = salt_bytes
                    .try_into()
                    .map_err(|_| ConfigError::InvalidHashedPassword {
                        index,
                        message: "salt must be exactly 16 bytes".to_string(),
                    })?;
                let digest: [u8; 32] =
                    digest_bytes
                        .try_into()
                        .map_err(|_| ConfigError::InvalidHashedPassword {
                            index,
                            message: "digest must be exactly 32 bytes".to_string(),
                        })?;
                Ok(core::auth::HashedPassword {
                    salt,
                    iterations: entry.iterations,
                    digest,
                })
            })
            .collect()
    }
}
