//! Deduplicated transfer ledger.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::models::{TransferPage, TransferRecord};
use crate::pool::DbPool;

/// Durable, deduplicated storage of transfer records.
///
/// Implementations must make `put` idempotent on the transaction hash and
/// safe to interleave with `query` from other tasks.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a record keyed by its transaction hash.
    ///
    /// # Returns
    /// `true` if the record was inserted, `false` if a record with the same
    /// transaction hash already existed (the stored record is left untouched).
    async fn put(&self, record: &TransferRecord) -> StoreResult<bool>;

    /// Highest block number across all stored records, `None` when empty.
    async fn highest_block(&self) -> StoreResult<Option<u64>>;

    /// Transfers where `address` is the sender or the recipient, newest block
    /// first.
    ///
    /// # Arguments
    /// * `address` - Participant address, any case
    /// * `page` - 1-based page number
    /// * `page_size` - Records per page
    async fn query(&self, address: &str, page: u32, page_size: u32) -> StoreResult<TransferPage>;
}

/// SQLite-backed [`LedgerStore`].
#[derive(Clone)]
pub struct SqliteLedger {
    db: DbPool,
}

impl SqliteLedger {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn put(&self, record: &TransferRecord) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO transfers (
                transaction_hash, from_address, to_address, amount,
                block_number, timestamp
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (transaction_hash) DO NOTHING
            "#,
        )
        .bind(&record.transaction_hash)
        .bind(record.from.to_lowercase())
        .bind(record.to.to_lowercase())
        .bind(&record.amount)
        .bind(record.block_number)
        .bind(record.timestamp)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn highest_block(&self) -> StoreResult<Option<u64>> {
        let highest: Option<i64> = sqlx::query_scalar("SELECT MAX(block_number) FROM transfers")
            .fetch_one(self.db.pool())
            .await?;

        highest
            .map(|block| u64::try_from(block).map_err(|_| StoreError::InvalidStoredBlock(block)))
            .transpose()
    }

    async fn query(&self, address: &str, page: u32, page_size: u32) -> StoreResult<TransferPage> {
        let address = address.to_lowercase();
        let page = page.max(1);
        let offset = i64::from(page - 1) * i64::from(page_size);

        let records = sqlx::query_as::<_, TransferRecord>(
            r#"
            SELECT transaction_hash, from_address, to_address, amount,
                   block_number, timestamp
            FROM transfers
            WHERE from_address = ?1 OR to_address = ?1
            ORDER BY block_number DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&address)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(self.db.pool());

        let total_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM transfers WHERE from_address = ?1 OR to_address = ?1",
        )
        .bind(&address)
        .fetch_one(self.db.pool());

        let (records, total_count) = tokio::try_join!(records, total_count)?;
        debug!("Found {} of {} transfers for {}", records.len(), total_count, address);

        Ok(TransferPage {
            records,
            total_count: total_count as u64,
        })
    }
}
