//! Ledger storage for ERC-20 transfer indexing.
//!
//! Provides SQLite storage with schema migrations and an idempotent,
//! append-only transfer ledger.

pub mod error;
pub mod models;
pub mod pool;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use models::{TransferPage, TransferRecord};
pub use pool::DbPool;
pub use store::{LedgerStore, SqliteLedger};
