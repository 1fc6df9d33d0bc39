//! File-backed persistence for the bearer token.
//!
//! The store holds at most one value: the token of the most recent
//! successful login or registration. `save` and `clear` are best-effort on
//! purpose; a full disk or read-only home directory must never abort a login
//! or logout, it only costs the user their persisted session. Failures are
//! logged and swallowed here so callers stay straight-line.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The persisted token, or `None` when nothing usable is stored.
    pub fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read token file");
                None
            }
        }
    }

    /// Persist `token`, replacing any previous value. Creates parent
    /// directories as needed.
    pub fn save(&self, token: &str) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "failed to create token directory");
                return;
            }
        }
        if let Err(e) = fs::write(&self.path, token) {
            warn!(path = %self.path.display(), error = %e, "failed to persist token");
        }
    }

    /// Remove the persisted token. Clearing an empty store is not an error.
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove token file");
            }
        }
    }
}
