//! Startup configuration, validated once before any work begins.

use std::time::Duration;

use alloy::primitives::Address;
use clap::Args;
use token_ledger_ingestion::{IndexerConfig, DEFAULT_WINDOW_SIZE};

/// Invalid or missing configuration value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),
    #[error("Invalid RPC_ENDPOINT format. It should start with http:// or https://")]
    InvalidRpcEndpoint,
    #[error("Invalid TOKEN_ADDRESS: {0}")]
    InvalidTokenAddress(String),
    #[error("CHAIN_ID must be a positive integer")]
    InvalidChainId,
    #[error("Window size must be at least one block")]
    InvalidWindowSize,
    #[error("POLL_INTERVAL_SECONDS must be a positive integer")]
    InvalidPollInterval,
}

/// Options shared by every command that talks to the chain and the ledger.
#[derive(Args, Debug, Clone)]
pub struct IndexerArgs {
    /// Ethereum JSON-RPC endpoint (http:// or https://)
    #[arg(long, env = "RPC_ENDPOINT")]
    pub rpc_endpoint: String,

    /// ERC-20 token contract to index
    #[arg(long, env = "TOKEN_ADDRESS")]
    pub token_address: String,

    /// Expected chain id of the RPC endpoint
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: u64,

    /// SQLite database URL or path
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Blocks per log query
    #[arg(long, env = "WINDOW_SIZE", default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: u64,

    /// Per-request RPC timeout in seconds
    #[arg(long, default_value = "30")]
    pub rpc_timeout_seconds: u64,

    /// Attempts at reading the chain head before a run is abandoned
    #[arg(long, default_value = "3")]
    pub head_retry_attempts: u32,

    /// Seconds between chain head attempts
    #[arg(long, default_value = "2")]
    pub head_retry_delay_seconds: u64,

    /// Database connection attempts at startup
    #[arg(long, default_value = "5")]
    pub db_connect_attempts: u32,

    /// Seconds between database connection attempts
    #[arg(long, default_value = "5")]
    pub db_connect_delay_seconds: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Validated settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_endpoint: String,
    pub token_address: Address,
    pub chain_id: u64,
    pub database_url: String,
    pub rpc_timeout: Duration,
    pub db_connect_attempts: u32,
    pub db_connect_delay: Duration,
    pub indexer: IndexerConfig,
}

impl IndexerArgs {
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let rpc_endpoint = required("RPC_ENDPOINT", &self.rpc_endpoint)?;
        let token_address = required("TOKEN_ADDRESS", &self.token_address)?;
        let database_url = required("DATABASE_URL", &self.database_url)?;

        if !rpc_endpoint.starts_with("http://") && !rpc_endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidRpcEndpoint);
        }

        let token_address = token_address
            .parse::<Address>()
            .map_err(|e| ConfigError::InvalidTokenAddress(e.to_string()))?;

        if self.chain_id == 0 {
            return Err(ConfigError::InvalidChainId);
        }
        if self.window_size == 0 {
            return Err(ConfigError::InvalidWindowSize);
        }

        Ok(Settings {
            rpc_endpoint: rpc_endpoint.to_string(),
            token_address,
            chain_id: self.chain_id,
            database_url: database_url.to_string(),
            rpc_timeout: Duration::from_secs(self.rpc_timeout_seconds),
            db_connect_attempts: self.db_connect_attempts,
            db_connect_delay: Duration::from_secs(self.db_connect_delay_seconds),
            indexer: IndexerConfig {
                window_size: self.window_size,
                head_retry_attempts: self.head_retry_attempts,
                head_retry_delay: Duration::from_secs(self.head_retry_delay_seconds),
            },
        })
    }
}

/// Interval between indexing runs in service mode; `None` means a single run.
pub fn poll_interval(seconds: Option<u64>) -> Result<Option<Duration>, ConfigError> {
    match seconds {
        Some(0) => Err(ConfigError::InvalidPollInterval),
        Some(seconds) => Ok(Some(Duration::from_secs(seconds))),
        None => Ok(None),
    }
}

fn required<'a>(name: &'static str, value: &'a str) -> Result<&'a str, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Missing(name));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> IndexerArgs {
        IndexerArgs {
            rpc_endpoint: "https://rpc.blast.io".to_string(),
            token_address: "0x4300000000000000000000000000000000000003".to_string(),
            chain_id: 81457,
            database_url: "sqlite://transfers.db".to_string(),
            window_size: DEFAULT_WINDOW_SIZE,
            rpc_timeout_seconds: 30,
            head_retry_attempts: 3,
            head_retry_delay_seconds: 2,
            db_connect_attempts: 5,
            db_connect_delay_seconds: 5,
            log_level: None,
        }
    }

    #[test]
    fn test_valid_settings() {
        let settings = args().validate().unwrap();
        assert_eq!(settings.chain_id, 81457);
        assert_eq!(
            settings.token_address,
            "0x4300000000000000000000000000000000000003".parse::<Address>().unwrap()
        );
        assert_eq!(settings.indexer.window_size, 1000);
        assert_eq!(settings.rpc_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_values() {
        let mut missing_rpc = args();
        missing_rpc.rpc_endpoint = "  ".to_string();
        assert_eq!(missing_rpc.validate().unwrap_err(), ConfigError::Missing("RPC_ENDPOINT"));

        let mut missing_db = args();
        missing_db.database_url = String::new();
        assert_eq!(missing_db.validate().unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_rpc_endpoint_scheme() {
        let mut ws = args();
        ws.rpc_endpoint = "wss://rpc.blast.io".to_string();
        assert_eq!(ws.validate().unwrap_err(), ConfigError::InvalidRpcEndpoint);

        let mut http = args();
        http.rpc_endpoint = "http://localhost:8545".to_string();
        assert!(http.validate().is_ok());
    }

    #[test]
    fn test_invalid_token_address() {
        let mut bad = args();
        bad.token_address = "0x1234".to_string();
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidTokenAddress(_))));
    }

    #[test]
    fn test_zero_chain_id_and_window() {
        let mut zero_chain = args();
        zero_chain.chain_id = 0;
        assert_eq!(zero_chain.validate().unwrap_err(), ConfigError::InvalidChainId);

        let mut zero_window = args();
        zero_window.window_size = 0;
        assert_eq!(zero_window.validate().unwrap_err(), ConfigError::InvalidWindowSize);
    }

    #[test]
    fn test_poll_interval() {
        assert_eq!(poll_interval(None), Ok(None));
        assert_eq!(poll_interval(Some(15)), Ok(Some(Duration::from_secs(15))));
        assert_eq!(poll_interval(Some(0)), Err(ConfigError::InvalidPollInterval));
    }
}
