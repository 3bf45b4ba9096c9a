//! Read-only HTTP query layer over the transfer ledger.

pub mod address;
pub mod error;
pub mod pagination;
pub mod routes;

pub use address::validate_address;
pub use error::ApiError;
pub use pagination::{PageParams, PageRequest, Pagination};
pub use routes::{router, serve, AppState, TransfersResponse};
