//! Transmit side: a fixed pool of pre-allocated buffer/request pairs
//!
//! A transmit caller takes a pair with `get`, fills the payload, submits the
//! request, and hands the pair back with `put` (or by dropping the lease) once the
//! transport completes it.

pub mod config;
pub mod pool;
pub mod request;
pub mod resources;

pub use config::TxPoolConfig;
pub use pool::{TxBufferRequestPool, TxLease};
pub use request::{TransferStats, TxBufferRequest};
pub use resources::{DefaultTxResources, TxResourceFactory};
