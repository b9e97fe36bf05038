//! Authentication cookie file: 32 random bytes written once per process
//! start, optionally group-readable.

use std::io::Write;
use std::path::Path;

use rand::RngCore;

/// Failures writing the cookie file.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// Writing the temporary file failed.
    #[error("writing cookie file {path}: {source}")]
    Write {
        /// Path that failed to write.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Setting file permissions failed.
    #[error("setting permissions on cookie file {path}: {source}")]
    Permissions {
        /// Path whose permissions failed to set.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Generates a fresh 32-byte cookie and writes it to `path`, truncating and
/// recreating the whole file so a write failure never leaves a
/// partially-overwritten cookie in place.
///
/// # Errors
///
/// Returns [`CookieError`] if the file cannot be created or (on Unix) its
/// permissions cannot be set.
pub fn write_cookie_file(path: &Path, group_readable: bool) -> Result<[u8; 32], CookieError> {
    let mut cookie = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut cookie);

    let tmp_path = path.with_extension("tmp");
    {
        let mut file = std::fs::File::create(&tmp_path).map_err(|source| CookieError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        file.write_all(&cookie).map_err(|source| CookieError::Write {
            path: tmp_path.clone(),
            source,
        })?;
    }
    set_permissions(&tmp_path, group_readable)?;
    std::fs::rename(&tmp_path, path).map_err(|source| CookieError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cookie)
}

#[cfg(unix)]
fn set_permissions(path: &Path, group_readable: bool) -> Result<(), CookieError> {
    use std::os::unix::fs::PermissionsExt;
    let mode = if group_readable { 0o640 } else { 0o600 };
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|source| {
        CookieError::Permissions {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _group_readable: bool) -> Result<(), CookieError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_exactly_32_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control_auth_cookie");
        let cookie = write_cookie_file(&path, false).unwrap();
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(on_disk.len(), 32);
        assert_eq!(on_disk, cookie);
    }

    #[test]
    fn successive_writes_produce_different_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control_auth_cookie");
        let first = write_cookie_file(&path, false).unwrap();
        let second = write_cookie_file(&path, false).unwrap();
        assert_ne!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn group_readable_flag_controls_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control_auth_cookie");
        write_cookie_file(&path, true).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
