//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// HTTP server and session housekeeping configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub bind: String,
    pub port: u16,
    /// Sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
    /// How often the idle sweep runs.
    pub sweep_interval: Duration,
    /// Run the interactive stdin REPL alongside the server.
    pub cli_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            session_idle_timeout: Duration::from_secs(60 * 60), // 1 hour
            sweep_interval: Duration::from_secs(60),
            cli_enabled: false,
        }
    }
}

impl ServerConfig {
    /// Build config from `ENROLL_ASSIST_*` environment variables.
    ///
    /// A port that is set but unparseable is an error; every other value
    /// falls back to its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("ENROLL_ASSIST_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "ENROLL_ASSIST_PORT".to_string(),
                message: format!("{raw:?} is not a valid port: {e}"),
            })?,
            None => defaults.port,
        };

        let bind = lookup("ENROLL_ASSIST_BIND")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.bind);

        let idle_min: u64 = lookup("ENROLL_ASSIST_SESSION_IDLE_MIN")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(60);

        let sweep_secs: u64 = lookup("ENROLL_ASSIST_SWEEP_SECS")
            .and_then(|s| s.trim().parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(60);

        let cli_enabled = lookup("ENROLL_ASSIST_CLI")
            .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            bind,
            port,
            session_idle_timeout: Duration::from_secs(idle_min * 60),
            sweep_interval: Duration::from_secs(sweep_secs),
            cli_enabled,
        })
    }

    /// `bind:port`, ready for `TcpListener::bind`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
