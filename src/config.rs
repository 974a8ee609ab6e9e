use crate::error::ConfigError;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MimirConfig {
    /// Address to bind the UDP responder to
    pub bind_addr: SocketAddr,

    /// Path of the JSON zone file
    pub zone_file_path: String,

    /// Interval between zone snapshot reloads
    pub reload_interval: Duration,

    /// Path of the persisted query-counter file
    pub stats_file_path: String,

    /// Interval between counter flushes to disk
    pub stats_flush_interval: Duration,
}

impl Default for MimirConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:1053"
                .parse()
                .expect("Default bind address is valid"),
            zone_file_path: "zones.json".to_string(),
            reload_interval: Duration::from_secs(5),
            stats_file_path: "stats.json".to_string(),
            stats_flush_interval: Duration::from_secs(30),
        }
    }
}

impl MimirConfig {
    /// Create a MimirConfig from environment variables
    /// Returns Err if critical configuration is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(bind_addr) = std::env::var("MIMIR_BIND_ADDR") {
            config.bind_addr = bind_addr
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddress(bind_addr))?;
        }

        if let Ok(zone_file) = std::env::var("MIMIR_ZONE_FILE") {
            config.zone_file_path = zone_file;
        }

        if let Ok(interval_str) = std::env::var("MIMIR_RELOAD_INTERVAL") {
            let interval_secs = interval_str
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidReloadInterval(interval_str.clone()))?;
            config.reload_interval = Duration::from_secs(interval_secs);
        }

        if let Ok(stats_file) = std::env::var("MIMIR_STATS_FILE") {
            config.stats_file_path = stats_file;
        }

        if let Ok(interval_str) = std::env::var("MIMIR_STATS_FLUSH_INTERVAL") {
            let interval_secs = interval_str
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidFlushInterval(interval_str.clone()))?;
            config.stats_flush_interval = Duration::from_secs(interval_secs);
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zone_file_path.is_empty() {
            return Err(ConfigError::InvalidZoneFile(
                "Zone file path must not be empty".to_string(),
            ));
        }

        if self.stats_file_path.is_empty() {
            return Err(ConfigError::InvalidStatsFile(
                "Stats file path must not be empty".to_string(),
            ));
        }

        if self.reload_interval.is_zero() {
            return Err(ConfigError::InvalidReloadInterval(
                "Reload interval must be greater than 0".to_string(),
            ));
        }

        if self.stats_flush_interval.is_zero() {
            return Err(ConfigError::InvalidFlushInterval(
                "Stats flush interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MimirConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reload_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_zone_file_path_is_invalid() {
        let config = MimirConfig {
            zone_file_path: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_reload_interval_is_invalid() {
        let config = MimirConfig {
            reload_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_flush_interval_is_invalid() {
        let config = MimirConfig {
            stats_flush_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
