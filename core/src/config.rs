//! Runtime configuration sourced from the environment.
//!
//! Hosts that want full control construct [`ThreadspaceClient`] and
//! [`TokenStore`] directly; `Config::from_env` covers the common case of a
//! local backend and a token file under the home directory.
//!
//! [`ThreadspaceClient`]: crate::client::ThreadspaceClient
//! [`TokenStore`]: crate::store::TokenStore

use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ThreadSpace backend.
    pub api_url: String,
    /// Where the bearer token is persisted between runs.
    pub token_path: PathBuf,
}

impl Config {
    /// Reads `THREADSPACE_API_URL` and `THREADSPACE_TOKEN_PATH`, falling back
    /// to [`DEFAULT_API_URL`] and `~/.threadspace/token`.
    pub fn from_env() -> Self {
        let api_url =
            env::var("THREADSPACE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let token_path = env::var("THREADSPACE_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_token_path());
        Self {
            api_url,
            token_path,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_path: default_token_path(),
        }
    }
}

/// `~/.threadspace/token`, or the same path under the working directory when
/// no home directory can be determined.
fn default_token_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".threadspace")
        .join("token")
}
