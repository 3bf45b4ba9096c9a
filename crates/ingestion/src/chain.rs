//! Chain client interface consumed by the indexer.

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

use crate::error::{ChainError, ChainResult};
use crate::window::BlockWindow;

/// A `Transfer` log with its indexed and data fields decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLog {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub block_number: u64,
    /// Absent for logs the node reports without a mined transaction.
    pub transaction_hash: Option<B256>,
}

/// Trait for chain node access.
///
/// This lets the indexer run against a JSON-RPC node in production and an
/// in-process double in tests.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current head block height.
    async fn current_height(&self) -> ChainResult<u64>;

    /// Chain identifier reported by the node.
    async fn chain_id(&self) -> ChainResult<u64>;

    /// Logs emitted by `contract` with topic0 `event_signature` in the
    /// inclusive block range `window`, in node order.
    async fn get_logs(
        &self,
        contract: Address,
        event_signature: B256,
        window: BlockWindow,
    ) -> ChainResult<Vec<DecodedLog>>;
}

/// Check that `client` serves the chain identified by `expected`.
pub async fn verify_chain_id<C: ChainClient + ?Sized>(client: &C, expected: u64) -> ChainResult<u64> {
    let actual = client.chain_id().await?;
    if actual != expected {
        return Err(ChainError::ChainIdMismatch { expected, actual });
    }
    Ok(actual)
}
