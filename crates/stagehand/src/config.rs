//! Server configuration.
//!
//! Every field has a default, so an empty JSON object is a complete config:
//!
//! ```json
//! {
//!   "host": "0.0.0.0",
//!   "port": 3490,
//!   "max_clients": 3,
//!   "tick_period_ms": 100,
//!   "countdown_ms": 5000,
//!   "min_players": 2,
//!   "tick_policy": "skip"
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stagehand_game::{Staging, StagingConfig};
use stagehand_tick::{TickConfig, TickPolicy};

/// Errors raised while loading or checking a [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Read(#[source] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything the server needs to bind, accept, and tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub host: String,
    pub port: u16,
    /// How many connections to accept before closing the listener.
    pub max_clients: usize,
    /// Fixed tick length.
    pub tick_period_ms: u64,
    /// How long the start countdown runs.
    pub countdown_ms: u64,
    /// Fewest clients a start vote can succeed with.
    pub min_players: usize,
    pub tick_policy: TickPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3490,
            max_clients: 3,
            tick_period_ms: 100,
            countdown_ms: 5000,
            min_players: 2,
            tick_policy: TickPolicy::Skip,
        }
    }
}

impl ServerConfig {
    /// Longest tick period accepted by [`validate`](Self::validate).
    pub const MAX_TICK_PERIOD_MS: u64 = 1000;

    /// Parses a JSON document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Checks every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if !(1..=Staging::MAX_CLIENTS).contains(&self.max_clients) {
            return Err(ConfigError::Invalid(format!(
                "max_clients must be between 1 and {}, got {}",
                Staging::MAX_CLIENTS,
                self.max_clients
            )));
        }
        if !(1..=Self::MAX_TICK_PERIOD_MS).contains(&self.tick_period_ms) {
            return Err(ConfigError::Invalid(format!(
                "tick_period_ms must be between 1 and {}, got {}",
                Self::MAX_TICK_PERIOD_MS,
                self.tick_period_ms
            )));
        }
        if self.min_players == 0 {
            return Err(ConfigError::Invalid("min_players must be at least 1".into()));
        }
        Ok(())
    }

    /// `"host:port"`, as passed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn countdown(&self) -> Duration {
        Duration::from_millis(self.countdown_ms)
    }

    /// The staging-phase slice of this config.
    pub fn staging(&self) -> StagingConfig {
        StagingConfig {
            min_players: self.min_players,
            countdown: self.countdown(),
        }
    }

    /// The scheduler slice of this config.
    pub fn tick(&self) -> TickConfig {
        TickConfig {
            policy: self.tick_policy,
            ..TickConfig::with_period(self.tick_period())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_all_defaults() {
        let config = ServerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:3490");
        assert_eq!(config.tick_period(), Duration::from_millis(100));
        assert_eq!(config.countdown(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_override() {
        let config = ServerConfig::from_json_str(
            r#"{"port": 4000, "max_clients": 8, "tick_policy": {"catch_up": {"max_catchup": 2}}}"#,
        )
        .unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.max_clients, 8);
        assert_eq!(config.tick_policy, TickPolicy::CatchUp { max_catchup: 2 });
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ServerConfig::from_json_str(r#"{"prot": 4000}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for json in [
            r#"{"max_clients": 0}"#,
            r#"{"max_clients": 128}"#,
            r#"{"tick_period_ms": 0}"#,
            r#"{"tick_period_ms": 1001}"#,
            r#"{"min_players": 0}"#,
            r#"{"host": ""}"#,
        ] {
            let err = ServerConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{json} should be invalid");
        }
    }

    #[test]
    fn test_max_clients_upper_bound_is_allowed() {
        let config = ServerConfig::from_json_str(r#"{"max_clients": 127}"#).unwrap();
        assert_eq!(config.max_clients, Staging::MAX_CLIENTS);
    }

    #[test]
    fn test_slices_carry_values() {
        let config = ServerConfig {
            tick_period_ms: 50,
            countdown_ms: 1500,
            min_players: 3,
            tick_policy: TickPolicy::CatchUp { max_catchup: 4 },
            ..ServerConfig::default()
        };

        let staging = config.staging();
        assert_eq!(staging.min_players, 3);
        assert_eq!(staging.countdown, Duration::from_millis(1500));

        let tick = config.tick();
        assert_eq!(tick.period, Duration::from_millis(50));
        assert_eq!(tick.policy, TickPolicy::CatchUp { max_catchup: 4 });
    }

    #[test]
    fn test_load_missing_file() {
        let err = ServerConfig::load("/nonexistent/stagehand.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("stagehand-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"port": 5000}"#).unwrap();
        let config = ServerConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.port, 5000);
    }
}
