//! Ethereum JSON-RPC client for log ingestion.

use std::time::Duration;

use alloy::primitives::{Address, B256};
use alloy_rpc_types::{Filter, Log};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::time::Instant;
use token_ledger_telemetry::Metrics;
use tracing::{debug, info, warn};

use crate::chain::{ChainClient, DecodedLog};
use crate::decode::decode_transfer_log;
use crate::error::{ChainError, ChainResult};
use crate::window::BlockWindow;

/// Ethereum RPC client wrapper.
pub struct RpcClient {
    client: Client,
    rpc_url: String,
    metrics: Metrics,
}

impl RpcClient {
    /// Create a new RPC client.
    ///
    /// # Arguments
    /// * `rpc_url` - HTTP/HTTPS JSON-RPC endpoint URL
    /// * `timeout` - Per-request timeout; expiry surfaces as a transport error
    /// * `metrics` - Metrics collector
    pub fn new(rpc_url: &str, timeout: Duration, metrics: Metrics) -> ChainResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        info!("Initialized RPC client for {}", rpc_url);

        Ok(Self {
            client,
            rpc_url: rpc_url.to_string(),
            metrics,
        })
    }

    async fn call_rpc(&self, method: &str, params: Value) -> ChainResult<Value> {
        let start = Instant::now();
        let result = self.send(method, params).await;
        self.metrics.observe_rpc_latency(method, start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            self.metrics.inc_rpc_errors();
            debug!("{} failed: {}", method, e);
        }
        result
    }

    async fn send(&self, method: &str, params: Value) -> ChainResult<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let response = self.client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChainError::Status(response.status()));
        }

        let mut result: Value = response.json().await?;

        if let Some(error) = result.get("error") {
            return Err(ChainError::Rpc(error.clone()));
        }

        match result.get_mut("result") {
            Some(value) => Ok(value.take()),
            None => Err(ChainError::InvalidResponse(format!("{} returned no result", method))),
        }
    }
}

/// Parse a hex quantity such as `"0x3e8"`.
fn parse_quantity(value: &Value) -> ChainResult<u64> {
    let hex_str = value
        .as_str()
        .ok_or_else(|| ChainError::InvalidResponse(format!("expected hex quantity, got {}", value)))?;
    u64::from_str_radix(hex_str.strip_prefix("0x").unwrap_or(hex_str), 16)
        .map_err(|e| ChainError::InvalidResponse(format!("invalid quantity {}: {}", hex_str, e)))
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn current_height(&self) -> ChainResult<u64> {
        let result = self.call_rpc("eth_blockNumber", json!([])).await?;
        let block_num = parse_quantity(&result)?;
        debug!("Latest block number: {}", block_num);
        Ok(block_num)
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        let result = self.call_rpc("eth_chainId", json!([])).await?;
        parse_quantity(&result)
    }

    async fn get_logs(
        &self,
        contract: Address,
        event_signature: B256,
        window: BlockWindow,
    ) -> ChainResult<Vec<DecodedLog>> {
        let filter = Filter::new()
            .address(contract)
            .event_signature(event_signature)
            .from_block(window.from)
            .to_block(window.to);
        let params = serde_json::to_value(&filter)
            .map_err(|e| ChainError::InvalidResponse(format!("unserializable filter: {}", e)))?;

        let result = self.call_rpc("eth_getLogs", json!([params])).await?;
        let logs: Vec<Log> = serde_json::from_value(result)
            .map_err(|e| ChainError::InvalidResponse(format!("malformed logs: {}", e)))?;

        let mut decoded = Vec::with_capacity(logs.len());
        for log in &logs {
            match decode_transfer_log(log) {
                Ok(transfer) => decoded.push(transfer),
                Err(e) => {
                    warn!(
                        "Skipping undecodable log in tx {:?} for blocks {}: {}",
                        log.transaction_hash, window, e
                    );
                    self.metrics.inc_skipped_logs(1);
                }
            }
        }

        debug!("Fetched {} logs for blocks {}", decoded.len(), window);
        Ok(decoded)
    }
}
