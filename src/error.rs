use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid reload interval: {0}")]
    InvalidReloadInterval(String),

    #[error("Invalid stats flush interval: {0}")]
    InvalidFlushInterval(String),

    #[error("Invalid zone file path: {0}")]
    InvalidZoneFile(String),

    #[error("Invalid stats file path: {0}")]
    InvalidStatsFile(String),
}
