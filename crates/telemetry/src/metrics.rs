//! Prometheus metrics for transfer ingestion.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntGauge, Registry, TextEncoder,
};

/// Metrics collector for the token ledger service.
///
/// Every instance owns its own registry, so independent collectors can
/// coexist in one process.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    windows_processed: IntCounter,
    windows_failed: IntCounter,
    transfers_inserted: IntCounter,
    duplicate_transfers: IntCounter,
    skipped_logs: IntCounter,
    failed_writes: IntCounter,
    rpc_errors: IntCounter,
    rpc_latency: HistogramVec,
    last_indexed_block: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> anyhow::Result<IntCounter> {
    let counter = IntCounter::new(name, help)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl Metrics {
    /// Create a new metrics instance.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let windows_processed = counter(
            &registry,
            "token_ledger_windows_processed_total",
            "Total number of block windows fetched and processed",
        )?;

        let windows_failed = counter(
            &registry,
            "token_ledger_windows_failed_total",
            "Total number of block windows skipped after a fetch failure",
        )?;

        let transfers_inserted = counter(
            &registry,
            "token_ledger_transfers_inserted_total",
            "Total number of transfers newly written to the ledger",
        )?;

        let duplicate_transfers = counter(
            &registry,
            "token_ledger_duplicate_transfers_total",
            "Total number of transfers already present in the ledger",
        )?;

        let skipped_logs = counter(
            &registry,
            "token_ledger_skipped_logs_total",
            "Total number of logs skipped as undecodable or missing a transaction hash",
        )?;

        let failed_writes = counter(
            &registry,
            "token_ledger_failed_writes_total",
            "Total number of transfers dropped after a ledger write failure",
        )?;

        let rpc_errors = counter(
            &registry,
            "token_ledger_rpc_errors_total",
            "Total number of RPC errors",
        )?;

        let rpc_latency = HistogramVec::new(
            HistogramOpts::new("token_ledger_rpc_latency_seconds", "RPC call latency in seconds"),
            &["operation"],
        )?;
        registry.register(Box::new(rpc_latency.clone()))?;

        let last_indexed_block = IntGauge::new(
            "token_ledger_last_indexed_block",
            "Last block of the most recently completed window",
        )?;
        registry.register(Box::new(last_indexed_block.clone()))?;

        Ok(Self {
            registry,
            windows_processed,
            windows_failed,
            transfers_inserted,
            duplicate_transfers,
            skipped_logs,
            failed_writes,
            rpc_errors,
            rpc_latency,
            last_indexed_block,
        })
    }

    /// Increment the processed windows counter.
    pub fn inc_windows_processed(&self) {
        self.windows_processed.inc();
    }

    /// Increment the failed windows counter.
    pub fn inc_windows_failed(&self) {
        self.windows_failed.inc();
    }

    /// Increment the inserted transfers counter.
    pub fn inc_transfers_inserted(&self) {
        self.transfers_inserted.inc();
    }

    /// Increment the duplicate transfers counter.
    pub fn inc_duplicate_transfers(&self) {
        self.duplicate_transfers.inc();
    }

    pub fn inc_skipped_logs(&self, count: u64) {
        self.skipped_logs.inc_by(count);
    }

    pub fn inc_failed_writes(&self) {
        self.failed_writes.inc();
    }

    /// Increment the RPC errors counter.
    pub fn inc_rpc_errors(&self) {
        self.rpc_errors.inc();
    }

    /// Record RPC latency.
    pub fn observe_rpc_latency(&self, operation: &str, duration_secs: f64) {
        self.rpc_latency.with_label_values(&[operation]).observe(duration_secs);
    }

    pub fn set_last_indexed_block(&self, block: u64) {
        self.last_indexed_block.set(block as i64);
    }

    /// Get Prometheus metrics as a string.
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instances_are_independent() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();

        first.inc_windows_failed();
        first.inc_windows_failed();
        second.inc_windows_failed();

        assert!(first.gather().unwrap().contains("token_ledger_windows_failed_total 2"));
        assert!(second.gather().unwrap().contains("token_ledger_windows_failed_total 1"));
    }

    #[test]
    fn test_gather_exposes_latency_and_gauge() {
        let metrics = Metrics::new().unwrap();
        metrics.observe_rpc_latency("get_logs", 0.25);
        metrics.set_last_indexed_block(2_500);

        let body = metrics.gather().unwrap();
        assert!(body.contains("token_ledger_rpc_latency_seconds_count{operation=\"get_logs\"} 1"));
        assert!(body.contains("token_ledger_last_indexed_block 2500"));
    }
}
