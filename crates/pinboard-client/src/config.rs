//! Client configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use pinboard_shared::constants::{CLIENT_TIMEOUT_SECS, DEFAULT_HTTP_PORT, REFRESH_INTERVAL_SECS};

/// What a write does when the server cannot be reached.
///
/// Chosen once per deployment and applied to create, update and delete
/// alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Writes fail when the server is unreachable.
    SharedOnly,
    /// Creates made while offline become `local-` notes kept on this client.
    LocalFallback,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared-only" | "shared" => Ok(Self::SharedOnly),
            "local-fallback" | "local" => Ok(Self::LocalFallback),
            other => Err(format!("unknown write mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Pinboard server.
    /// Env: `PINBOARD_SERVER_URL`
    pub server_url: String,

    /// Bound on every request; exceeding it counts as a failure.
    /// Env: `PINBOARD_TIMEOUT_SECS`
    pub timeout: Duration,

    /// Env: `PINBOARD_REFRESH_SECS`
    pub refresh_interval: Duration,

    /// Env: `PINBOARD_WRITE_MODE` (`shared-only` or `local-fallback`)
    pub write_mode: WriteMode,

    /// Local database file. `None` uses the platform data directory.
    /// Env: `PINBOARD_DB_PATH`
    pub db_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: format!("http://127.0.0.1:{DEFAULT_HTTP_PORT}"),
            timeout: Duration::from_secs(CLIENT_TIMEOUT_SECS),
            refresh_interval: Duration::from_secs(REFRESH_INTERVAL_SECS),
            write_mode: WriteMode::SharedOnly,
            db_path: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("PINBOARD_SERVER_URL") {
            if url.starts_with("http://") || url.starts_with("https://") {
                config.server_url = url;
            } else {
                tracing::warn!(value = %url, "Invalid PINBOARD_SERVER_URL, using default");
            }
        }

        if let Some(secs) = parse_secs(&lookup, "PINBOARD_TIMEOUT_SECS") {
            config.timeout = secs;
        }

        if let Some(secs) = parse_secs(&lookup, "PINBOARD_REFRESH_SECS") {
            config.refresh_interval = secs;
        }

        if let Some(mode) = lookup("PINBOARD_WRITE_MODE") {
            match mode.parse() {
                Ok(mode) => config.write_mode = mode,
                Err(e) => tracing::warn!(error = %e, "Invalid PINBOARD_WRITE_MODE, using default"),
            }
        }

        if let Some(path) = lookup("PINBOARD_DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }

        config
    }
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<Duration> {
    let value = lookup(name)?;
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Some(Duration::from_secs(n)),
        _ => {
            tracing::warn!(var = name, value = %value, "Invalid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> ClientConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.refresh_interval, Duration::from_secs(15));
        assert_eq!(config.write_mode, WriteMode::SharedOnly);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = from_map(&[
            ("PINBOARD_SERVER_URL", "https://notes.example.org"),
            ("PINBOARD_TIMEOUT_SECS", "3"),
            ("PINBOARD_WRITE_MODE", "local-fallback"),
            ("PINBOARD_DB_PATH", "/tmp/pinboard.db"),
        ]);
        assert_eq!(config.server_url, "https://notes.example.org");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.write_mode, WriteMode::LocalFallback);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/pinboard.db")));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = from_map(&[
            ("PINBOARD_SERVER_URL", "ftp://nope"),
            ("PINBOARD_REFRESH_SECS", "soon"),
            ("PINBOARD_WRITE_MODE", "whatever"),
        ]);
        assert_eq!(config.server_url, ClientConfig::default().server_url);
        assert_eq!(config.refresh_interval, Duration::from_secs(15));
        assert_eq!(config.write_mode, WriteMode::SharedOnly);
    }
}
