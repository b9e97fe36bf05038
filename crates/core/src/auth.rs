//! AUTHENTICATE credential parsing and acceptance.

use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::ControlError;
use crate::framing;

/// One configured salted-hash credential.
///
/// Verification is an iterated SHA-256 keyed derivation: `digest_0 =
/// SHA256(salt || password)`, `digest_{i+1} = SHA256(salt || digest_i)`,
/// repeated `iterations` times, compared against `digest`. The exact
/// iteration encoding is this implementation's own and is not required to
/// match any external key-derivation format bit-for-bit.
#[derive(Clone, Eq, PartialEq)]
pub struct HashedPassword {
    /// Per-credential salt.
    pub salt: [u8; 16],
    /// Iteration count for the key stretching loop.
    pub iterations: u32,
    /// Expected final digest.
    pub digest: [u8; 32],
}

impl HashedPassword {
    /// Derives a credential from a plaintext password, salt, and iteration
    /// count (used by configuration loading and tests, not by the
    /// verification hot path).
    #[must_use]
    pub fn derive(password: &[u8], salt: [u8; 16], iterations: u32) -> Self {
        Self {
            salt,
            iterations,
            digest: derive_digest(password, &salt, iterations),
        }
    }

    fn verify(&self, password: &[u8]) -> bool {
        let candidate = derive_digest(password, &self.salt, self.iterations);
        constant_time_eq(&candidate, &self.digest)
    }
}

impl std::fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashedPassword")
            .field("iterations", &self.iterations)
            .field("salt", &"<redacted>")
            .field("digest", &"<redacted>")
            .finish()
    }
}

fn derive_digest(password: &[u8], salt: &[u8; 16], iterations: u32) -> [u8; 32] {
    let mut digest: [u8; 32] = {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password);
        hasher.finalize().into()
    };
    for _ in 1..iterations.max(1) {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(digest);
        digest = hasher.finalize().into();
    }
    digest
}

/// Constant-time byte-slice comparison; returns `false` immediately (in
/// variable time) only on a length mismatch, since the protocol already
/// reports that case distinctly and a length mismatch is not itself secret.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Credentials this connection's authenticator accepts.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// The cookie, if cookie authentication is enabled.
    pub cookie: Option<[u8; 32]>,
    /// Configured salted-hash credentials, checked in order.
    pub hashed_passwords: Vec<HashedPassword>,
}

impl AuthConfig {
    /// No credentials configured at all: every AUTHENTICATE input accepts.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.cookie.is_none() && self.hashed_passwords.is_empty()
    }

    /// Checks `password` against every configured credential.
    #[must_use]
    pub fn verify(&self, password: &[u8]) -> bool {
        if self.is_open() {
            return true;
        }
        if let Some(cookie) = &self.cookie {
            if constant_time_eq(password, cookie) {
                return true;
            }
        }
        self.hashed_passwords.iter().any(|h| h.verify(password))
    }
}

/// Decodes the argument to `AUTHENTICATE`.
///
/// Accepts an even-length hex string, a whitespace-only (empty password)
/// argument, or a quoted string with backslash escapes. A bare unquoted
/// non-hex, non-empty argument is rejected with a diagnostic steering the
/// caller towards quoting.
///
/// # Errors
///
/// Returns [`ControlError::Syntax`] if none of the accepted forms match, or
/// [`ControlError::Syntax`] (via the framing layer) if a quoted string is
/// unterminated.
pub fn parse_password_argument(arg: &[u8]) -> Result<Vec<u8>, ControlError> {
    let trimmed = trim_ascii(arg);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed[0] == b'"' {
        let (decoded, rest) = framing::parse_quoted(trimmed)
            .map_err(|e| ControlError::Syntax(e.to_string()))?;
        if !trim_ascii(rest).is_empty() {
            return Err(ControlError::Syntax(
                "unexpected data after quoted password".into(),
            ));
        }
        return Ok(decoded);
    }
    if is_even_length_hex(trimmed) {
        return Ok(hex::decode(trimmed).expect("validated as hex above"));
    }
    Err(ControlError::Syntax(
        "a plaintext password must be quoted".into(),
    ))
}

/// Verifies an already-decoded AUTHENTICATE password against `config`.
///
/// # Errors
///
/// Returns [`ControlError::AuthFailed`] with a message distinguishing a
/// cookie-length mismatch from a generic failure where possible.
pub fn authenticate(config: &AuthConfig, password: &[u8]) -> Result<(), ControlError> {
    if config.verify(password) {
        return Ok(());
    }
    if let Some(cookie) = &config.cookie {
        if password.len() != cookie.len() && config.hashed_passwords.is_empty() {
            return Err(ControlError::AuthFailed(format!(
                "wrong cookie length ({} bytes, expected {})",
                password.len(),
                cookie.len()
            )));
        }
    }
    Err(ControlError::AuthFailed(
        "password did not match any configured credential".into(),
    ))
}

/// Securely wipes a decoded password buffer once authentication has run.
pub fn wipe(password: &mut Vec<u8>) {
    password.zeroize();
}

fn trim_ascii(input: &[u8]) -> &[u8] {
    let start = input.iter().position(|b| !b.is_ascii_whitespace());
    let Some(start) = start else { return &[] };
    let end = input.iter().rposition(|b| !b.is_ascii_whitespace()).unwrap();
    &input[start..=end]
}

fn is_even_length_hex(input: &[u8]) -> bool {
    !input.is_empty() && input.len() % 2 == 0 && input.iter().all(u8::is_ascii_hexdigit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_argument_decodes_to_empty_password() {
        assert_eq!(parse_password_argument(b"   ").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn hex_argument_decodes_to_bytes() {
        assert_eq!(parse_password_argument(b"68656c6c6f").unwrap(), b"hello");
    }

    #[test]
    fn odd_length_hex_is_rejected_as_bare_plaintext() {
        assert!(parse_password_argument(b"abc").is_err());
    }

    #[test]
    fn quoted_argument_decodes_with_escapes() {
        assert_eq!(
            parse_password_argument(br#""hunter\"2""#).unwrap(),
            br#"hunter"2"#
        );
    }

    #[test]
    fn bare_plaintext_is_rejected() {
        let err = parse_password_argument(b"hunter2").unwrap_err();
        assert!(matches!(err, ControlError::Syntax(_)));
    }

    #[test]
    fn open_config_accepts_anything() {
        let config = AuthConfig::default();
        assert!(authenticate(&config, b"whatever").is_ok());
        assert!(authenticate(&config, b"").is_ok());
    }

    #[test]
    fn cookie_auth_accepts_exact_match_only() {
        let cookie = [7u8; 32];
        let config = AuthConfig {
            cookie: Some(cookie),
            hashed_passwords: Vec::new(),
        };
        assert!(authenticate(&config, &cookie).is_ok());
        assert!(authenticate(&config, &[0u8; 32]).is_err());
    }

    #[test]
    fn cookie_length_mismatch_is_reported_distinctly() {
        let config = AuthConfig {
            cookie: Some([1u8; 32]),
            hashed_passwords: Vec::new(),
        };
        let err = authenticate(&config, b"short").unwrap_err();
        match err {
            ControlError::AuthFailed(msg) => assert!(msg.contains("wrong cookie length")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn hashed_password_round_trips_through_derive_and_verify() {
        let hashed = HashedPassword::derive(b"hunter2", [9u8; 16], 100);
        let config = AuthConfig {
            cookie: None,
            hashed_passwords: vec![hashed],
        };
        assert!(authenticate(&config, b"hunter2").is_ok());
        assert!(authenticate(&config, b"wrong").is_err());
    }

    #[test]
    fn either_credential_suffices_when_both_configured() {
        let cookie = [3u8; 32];
        let hashed = HashedPassword::derive(b"hunter2", [9u8; 16], 50);
        let config = AuthConfig {
            cookie: Some(cookie),
            hashed_passwords: vec![hashed],
        };
        assert!(authenticate(&config, &cookie).is_ok());
        assert!(authenticate(&config, b"hunter2").is_ok());
        assert!(authenticate(&config, b"neither").is_err());
    }

    #[test]
    fn constant_time_eq_rejects_mismatched_lengths_and_contents() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
