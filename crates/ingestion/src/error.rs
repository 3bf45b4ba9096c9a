//! Error types for chain access and ingestion runs.

use serde_json::Value;
use token_ledger_db::StoreError;

/// Failure talking to the chain node.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("RPC request failed with status: {0}")]
    Status(reqwest::StatusCode),
    #[error("RPC error: {0}")]
    Rpc(Value),
    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),
    #[error("RPC endpoint serves chain {actual}, expected {expected}")]
    ChainIdMismatch { expected: u64, actual: u64 },
}

/// Result type for chain client operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Error that aborts an ingestion run or a single window.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("chain unavailable: {0}")]
    ChainUnavailable(#[from] ChainError),
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}
