//! Generic bounded slot queue shared by the TX and RX pools
//!
//! A slot queue owns a fixed arena of descriptors and hands out exclusive
//! [`Slot`] claims through lock-free free and ready lists.

pub mod config;
pub mod queue;
pub mod stats;

pub use config::{SlotQueueConfig, SlotQueueConfigBuilder};
pub use queue::{Slot, SlotQueue};
pub use stats::{AtomicSlotQueueStats, SlotQueueStats};
