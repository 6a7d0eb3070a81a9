//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use pinboard_shared::constants::{DEFAULT_HTTP_PORT, LIST_PAGE_SIZE, MAX_INDEX_LEN};

/// Which key-value adapter backs the note repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Fs,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "fs" | "file" | "files" => Ok(Self::Fs),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Key-value adapter.
    /// Env: `STORE_BACKEND` (`memory` or `fs`)
    /// Default: `fs`
    pub store_backend: StoreBackend,

    /// Directory used by the `fs` backend.
    /// Env: `STORAGE_PATH`
    /// Default: `./data`
    pub storage_path: PathBuf,

    /// Number of notes returned by a list request.
    /// Env: `LIST_LIMIT`
    pub list_limit: usize,

    /// Maximum length of the recency index.
    /// Env: `INDEX_CAP`
    pub index_cap: usize,

    /// Maximum accepted request body in bytes.
    /// Env: `MAX_BODY_BYTES`
    /// Default: 512 KiB (fits a maximal image plus content)
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            store_backend: StoreBackend::Fs,
            storage_path: PathBuf::from("./data"),
            list_limit: LIST_PAGE_SIZE,
            index_cap: MAX_INDEX_LEN,
            max_body_size: 512 * 1024,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Some(backend) = lookup("STORE_BACKEND") {
            match backend.parse::<StoreBackend>() {
                Ok(parsed) => config.store_backend = parsed,
                Err(e) => tracing::warn!(error = %e, "Invalid STORE_BACKEND, using default"),
            }
        }

        if let Some(path) = lookup("STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }

        if let Some(n) = parse_positive(&lookup, "LIST_LIMIT") {
            config.list_limit = n;
        }

        if let Some(n) = parse_positive(&lookup, "INDEX_CAP") {
            config.index_cap = n;
        }

        if let Some(n) = parse_positive(&lookup, "MAX_BODY_BYTES") {
            config.max_body_size = n;
        }

        // A page larger than the index could never be filled.
        if config.list_limit > config.index_cap {
            tracing::warn!(
                list_limit = config.list_limit,
                index_cap = config.index_cap,
                "LIST_LIMIT exceeds INDEX_CAP, clamping"
            );
            config.list_limit = config.index_cap;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn parse_positive(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<usize> {
    let value = lookup(name)?;
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(var = name, value = %value, "Invalid value, using default");
            None
        }
    }
}
