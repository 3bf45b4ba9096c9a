//! Database models and types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{StoreError, StoreResult};

/// One ERC-20 `Transfer` event as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub transaction_hash: String,
    #[sqlx(rename = "from_address")]
    pub from: String,
    #[sqlx(rename = "to_address")]
    pub to: String,
    pub amount: String, // Stored as string to preserve uint256 precision
    pub block_number: i64,
    pub timestamp: DateTime<Utc>, // Ingestion time, not block time
}

impl TransferRecord {
    /// Build a record, normalizing both participant addresses to lowercase.
    ///
    /// Fails with [`StoreError::BlockOutOfRange`] for blocks above `i64::MAX`.
    pub fn new(
        transaction_hash: impl Into<String>,
        from: &str,
        to: &str,
        amount: impl Into<String>,
        block_number: u64,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<Self> {
        let block_number =
            i64::try_from(block_number).map_err(|_| StoreError::BlockOutOfRange(block_number))?;

        Ok(Self {
            transaction_hash: transaction_hash.into(),
            from: from.to_lowercase(),
            to: to.to_lowercase(),
            amount: amount.into(),
            block_number,
            timestamp,
        })
    }
}

/// One page of transfers plus the number of matches across all pages.
#[derive(Debug, Clone, Default)]
pub struct TransferPage {
    pub records: Vec<TransferRecord>,
    pub total_count: u64,
}
