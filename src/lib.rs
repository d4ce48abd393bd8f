//! # ncm-buffers - Buffer Management for an NCM Network Adapter
//!
//! Pre-allocated transmit and receive buffer management for a USB NCM style
//! network adapter data path.
//!
//! ## Features
//!
//! - **TX buffer/request pool**: fixed set of payload buffers, each paired with a
//!   reusable I/O request, built once and handed out without allocating
//! - **RX buffer queue**: bounded FIFO of received buffers that are either shared
//!   regions (external mode) or buffers lent by a polling reader (polled mode)
//! - **Lock-free slot queues**: free and ready index lists over a fixed descriptor
//!   arena, with an optional lookaside cache
//! - **Resident memory**: descriptor arenas and payload slabs locked in RAM when
//!   the non-paged memory class is requested
//! - **RAII leases**: dropping a lease returns the buffer the right way
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐    ┌──────────────────────────┐
//! │   TxBufferRequestPool    │    │      RxBufferQueue       │
//! │  get / put  (TxLease)    │    │ enqueue / dequeue /      │
//! │                          │    │ return_buffer (RxLease)  │
//! ├──────────────────────────┤    ├──────────────────────────┤
//! │ TxBufferRequest          │    │ RxBuffer                 │
//! │  MemoryRegion + IoRequest│    │  External(MemoryRegion)  │
//! │  (PayloadSlab chunk)     │    │  Polled(buffer, sink)    │
//! └────────────┬─────────────┘    └────────────┬─────────────┘
//!              │                               │
//!              ▼                               ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │            SlotQueue<T>: free ─ held ─ ready            │
//! └─────────────────────────────────────────────────────────┘
//! ```

// Core modules
pub mod error;
pub mod memory;
pub mod request;
pub mod slot_queue;

// Data path pools
pub mod rx;
pub mod tx;

// Main API re-exports
pub use error::{BufferError, Result};
pub use memory::{MemoryClass, MemoryRegion, PayloadSlab};
pub use request::{IoRequest, RequestState, RequestStatus, ReuseFlags, ReuseParams};
pub use rx::{
    BufferSink, ContinuousBufferSource, RxBuffer, RxBufferQueue, RxLease, RxMode, RxOwnership,
    RxQueueConfig, RxSource,
};
pub use slot_queue::{Slot, SlotQueue, SlotQueueConfig, SlotQueueConfigBuilder, SlotQueueStats};
pub use tx::{
    DefaultTxResources, TransferStats, TxBufferRequest, TxBufferRequestPool, TxLease,
    TxPoolConfig, TxResourceFactory,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration constants
pub mod config {
    /// Descriptors per TX pool and RX queue
    pub const DEFAULT_SLOT_COUNT: usize = 128;

    /// TX payload buffer size, one Ethernet frame plus NCM framing headroom
    pub const DEFAULT_TX_PAYLOAD_SIZE: usize = 1536;

    /// Recently returned slots kept in the lookaside cache
    pub const DEFAULT_LOOKASIDE_DEPTH: usize = 8;
}
