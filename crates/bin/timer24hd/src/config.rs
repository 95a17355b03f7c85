//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `timer24h.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use chrono_tz::Tz;
use serde::Deserialize;

use timer24h_adapter_virtual::VirtualEntity;
use timer24h_domain::time::parse_timezone;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Virtual host settings.
    #[serde(rename = "virtual")]
    pub virtual_host: VirtualConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Scheduler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// IANA zone used by schedules without a timezone of their own.
    pub default_timezone: String,
}

/// Virtual host configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VirtualConfig {
    /// Seed the host with `entities`. When disabled the host starts empty.
    pub enabled: bool,
    /// Entities known to the host at startup.
    pub entities: Vec<VirtualEntity>,
}

impl Config {
    /// Load configuration from `timer24h.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("timer24h.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("TIMER24H_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("TIMER24H_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("TIMER24H_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("TIMER24H_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("TIMER24H_TIMEZONE") {
            self.scheduler.default_timezone = val;
        }
        if let Some(val) = var("TIMER24H_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        self.default_zone()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Parse the scheduler's default timezone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the name is not an IANA zone.
    pub fn default_zone(&self) -> Result<Tz, ConfigError> {
        parse_timezone(&self.scheduler.default_timezone)
            .map_err(|err| ConfigError::Validation(err.to_string()))
    }

    /// Entities the virtual host starts with.
    #[must_use]
    pub fn virtual_entities(&self) -> Vec<VirtualEntity> {
        if self.virtual_host.enabled {
            self.virtual_host.entities.clone()
        } else {
            Vec::new()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:timer24h.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "timer24hd=info,timer24h=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_timezone: "UTC".to_string(),
        }
    }
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            entities: Vec::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:timer24h.db?mode=rwc");
        assert_eq!(config.scheduler.default_timezone, "UTC");
        assert!(config.virtual_host.enabled);
        assert!(config.virtual_host.entities.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [scheduler]
            default_timezone = 'Europe/Paris'

            [virtual]
            enabled = true

            [[virtual.entities]]
            entity_id = 'switch.boiler'
            state = 'on'

            [[virtual.entities]]
            entity_id = 'binary_sensor.window'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.default_zone().unwrap(), Tz::Europe__Paris);
        assert_eq!(
            config.virtual_entities(),
            vec![
                VirtualEntity::new("switch.boiler", "on"),
                VirtualEntity::new("binary_sensor.window", "off"),
            ]
        );
    }

    #[test]
    fn should_start_virtual_host_empty_when_disabled() {
        let toml = "
            [virtual]
            enabled = false

            [[virtual.entities]]
            entity_id = 'switch.boiler'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.virtual_entities().is_empty());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_unknown_default_timezone() {
        let mut config = Config::default();
        config.scheduler.default_timezone = "Mars/Olympus_Mons".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_format_bind_addr() {
        let mut config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_apply_environment_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("TIMER24H_PORT", "8081"),
            ("TIMER24H_DATABASE_URL", "sqlite::memory:"),
            ("TIMER24H_TIMEZONE", "Asia/Kathmandu"),
            ("TIMER24H_LOG", "debug"),
        ]));
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.default_zone().unwrap(), Tz::Asia__Kathmandu);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_let_bind_override_host_and_port() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("TIMER24H_PORT", "8081"), ("TIMER24H_BIND", "127.0.0.1:4000")]));
        assert_eq!(config.bind_addr(), "127.0.0.1:4000");
    }

    #[test]
    fn should_prefer_rust_log_over_own_log_variable() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("TIMER24H_LOG", "debug"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparsable_port_override() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("TIMER24H_PORT", "eighty")]));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
