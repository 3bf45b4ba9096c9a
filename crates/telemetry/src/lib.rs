//! Observability for the token ledger: structured logging and metrics.

pub mod metrics;
pub mod logging;

pub use metrics::Metrics;
pub use logging::init_logging;
