//! Ingestion engine for ERC-20 `Transfer` events.

pub mod chain;
pub mod decode;
pub mod error;
pub mod indexer;
pub mod rpc_client;
pub mod window;

pub use chain::{verify_chain_id, ChainClient, DecodedLog};
pub use decode::TRANSFER_EVENT_SIGNATURE;
pub use error::{ChainError, ChainResult, IngestionError};
pub use indexer::{IndexReport, IndexerConfig, TransferIndexer};
pub use rpc_client::RpcClient;
pub use window::{BlockWindow, BlockWindows, DEFAULT_WINDOW_SIZE};
