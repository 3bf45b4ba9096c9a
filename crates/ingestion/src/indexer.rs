//! Transfer ingestion engine.
//!
//! Each run reads the chain head, derives the resume cursor from the ledger
//! and walks fixed-size block windows up to that head, committing every
//! `Transfer` log through the ledger's idempotent `put`. Re-scanning a window
//! that was partially committed before a crash is therefore harmless.

use std::time::Duration;

use alloy::primitives::Address;
use chrono::Utc;
use token_ledger_db::{LedgerStore, TransferRecord};
use token_ledger_telemetry::Metrics;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::chain::{ChainClient, DecodedLog};
use crate::decode::TRANSFER_EVENT_SIGNATURE;
use crate::error::IngestionError;
use crate::window::{BlockWindow, BlockWindows, DEFAULT_WINDOW_SIZE};

/// Tuning for a [`TransferIndexer`].
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Maximum blocks per log query.
    pub window_size: u64,
    /// Attempts at reading the chain head before a run is abandoned.
    pub head_retry_attempts: u32,
    /// Pause between head attempts.
    pub head_retry_delay: Duration,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            head_retry_attempts: 3,
            head_retry_delay: Duration::from_secs(2),
        }
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Chain head observed when the run started.
    pub head: u64,
    /// Resume cursor the run started from.
    pub start_block: u64,
    /// Windows attempted, failed ones included.
    pub windows: u64,
    /// Windows whose logs could not be fetched and were passed over.
    pub failed_windows: Vec<BlockWindow>,
    pub inserted: u64,
    pub duplicates: u64,
    /// Decoded logs without a transaction hash. Logs the chain client could
    /// not decode never reach the indexer; they are counted only in the
    /// `token_ledger_skipped_logs_total` metric.
    pub skipped: u64,
    pub failed_writes: u64,
}

impl IndexReport {
    /// True when every window was fetched and every transfer was written.
    pub fn is_complete(&self) -> bool {
        self.failed_windows.is_empty() && self.failed_writes == 0
    }
}

/// Sequential ingestion engine for a single token contract.
pub struct TransferIndexer<C, S> {
    chain: C,
    store: S,
    metrics: Metrics,
    token_address: Address,
    config: IndexerConfig,
}

impl<C: ChainClient, S: LedgerStore> TransferIndexer<C, S> {
    /// Create a new indexer.
    ///
    /// # Arguments
    /// * `chain` - Chain node client
    /// * `store` - Ledger the transfers are committed to
    /// * `metrics` - Metrics collector
    /// * `token_address` - ERC-20 contract whose `Transfer` events are indexed
    /// * `config` - Window size and head retry policy
    pub fn new(
        chain: C,
        store: S,
        metrics: Metrics,
        token_address: Address,
        config: IndexerConfig,
    ) -> Self {
        Self {
            chain,
            store,
            metrics,
            token_address,
            config,
        }
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Index all transfers from the resume cursor up to the current head.
    ///
    /// Fails only when the head or the cursor cannot be resolved. Window
    /// failures are logged, counted and listed in the report, and the run
    /// moves on to the next window.
    pub async fn index_transfers(&self) -> Result<IndexReport, IngestionError> {
        let head = self.resolve_head().await?;
        let start_block = self.resolve_cursor().await?;

        let mut report = IndexReport {
            head,
            start_block,
            ..Default::default()
        };

        if start_block > head {
            info!("Ledger is caught up at block {}", head);
            return Ok(report);
        }

        info!("Indexing blocks {} to {}", start_block, head);

        for window in BlockWindows::new(start_block, head, self.config.window_size) {
            report.windows += 1;
            match self.process_window(window, &mut report).await {
                Ok(found) => {
                    self.metrics.inc_windows_processed();
                    self.metrics.set_last_indexed_block(window.to);
                    info!("Indexed blocks {} to {} ({} transfers)", window.from, window.to, found);
                }
                Err(e) => {
                    self.metrics.inc_windows_failed();
                    error!(
                        window_from = window.from,
                        window_to = window.to,
                        "Error indexing blocks {} to {}: {}",
                        window.from,
                        window.to,
                        e
                    );
                    report.failed_windows.push(window);
                }
            }
        }

        info!(
            "Indexing run complete at block {}: {} inserted, {} duplicates, {} skipped, {} failed writes, {} failed windows",
            head,
            report.inserted,
            report.duplicates,
            report.skipped,
            report.failed_writes,
            report.failed_windows.len()
        );

        Ok(report)
    }

    /// Next block to scan: one past the highest stored block, or zero.
    pub async fn resolve_cursor(&self) -> Result<u64, IngestionError> {
        let highest = self.store.highest_block().await?;
        Ok(highest.map_or(0, |block| block.saturating_add(1)))
    }

    async fn resolve_head(&self) -> Result<u64, IngestionError> {
        let attempts = self.config.head_retry_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.chain.current_height().await {
                Ok(head) => return Ok(head),
                Err(e) if attempt < attempts => {
                    warn!(
                        "Failed to get latest block number (attempt {}/{}): {}",
                        attempt, attempts, e
                    );
                    attempt += 1;
                    sleep(self.config.head_retry_delay).await;
                }
                Err(e) => {
                    error!("Failed to get latest block number after {} attempts: {}", attempts, e);
                    return Err(e.into());
                }
            }
        }
    }

    async fn process_window(
        &self,
        window: BlockWindow,
        report: &mut IndexReport,
    ) -> Result<usize, IngestionError> {
        let logs = self
            .chain
            .get_logs(self.token_address, TRANSFER_EVENT_SIGNATURE, window)
            .await?;
        info!("Found {} transfers in blocks {}", logs.len(), window);

        for log in &logs {
            self.process_log(log, report).await;
        }

        Ok(logs.len())
    }

    async fn process_log(&self, log: &DecodedLog, report: &mut IndexReport) {
        let Some(transaction_hash) = log.transaction_hash else {
            warn!("Skipping transfer in block {} without a transaction hash", log.block_number);
            self.metrics.inc_skipped_logs(1);
            report.skipped += 1;
            return;
        };

        let hash = transaction_hash.to_string();
        let written = match TransferRecord::new(
            hash.clone(),
            &log.from.to_string(),
            &log.to.to_string(),
            log.value.to_string(),
            log.block_number,
            Utc::now(),
        ) {
            Ok(record) => self.store.put(&record).await,
            Err(e) => Err(e),
        };

        match written {
            Ok(true) => {
                self.metrics.inc_transfers_inserted();
                report.inserted += 1;
            }
            Ok(false) => {
                info!("Duplicate transaction hash: {}. Skipping.", hash);
                self.metrics.inc_duplicate_transfers();
                report.duplicates += 1;
            }
            Err(e) => {
                error!(
                    "Failed to store transfer {} in block {}: {}",
                    hash, log.block_number, e
                );
                self.metrics.inc_failed_writes();
                report.failed_writes += 1;
            }
        }
    }
}
