//! Storage error type.

/// Failure of the persistence layer.
///
/// The ingestion engine treats it as retryable, the query layer reports it as
/// a server error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
    /// SQLite integers are signed 64-bit.
    #[error("block number {0} exceeds the storable range")]
    BlockOutOfRange(u64),
    #[error("stored block number {0} is negative")]
    InvalidStoredBlock(i64),
}

/// Result type for ledger operations.
pub type StoreResult<T> = Result<T, StoreError>;
