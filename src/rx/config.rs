//! RX buffer queue configuration

use crate::{
    config::{DEFAULT_LOOKASIDE_DEPTH, DEFAULT_SLOT_COUNT},
    error::Result,
    memory::MemoryClass,
    slot_queue::SlotQueueConfig,
};

/// Configuration for an [`RxBufferQueue`](super::RxBufferQueue)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxQueueConfig {
    /// Name of the queue (usually the owning device)
    pub name: String,
    /// Number of RX descriptors
    pub slot_count: usize,
    /// Residency class of the descriptor arena
    pub memory_class: MemoryClass,
    /// Capacity of the lookaside cache in front of the free list
    pub lookaside_depth: usize,
}

impl Default for RxQueueConfig {
    fn default() -> Self {
        Self {
            name: "rx".to_string(),
            slot_count: DEFAULT_SLOT_COUNT,
            memory_class: MemoryClass::NonPaged,
            lookaside_depth: DEFAULT_LOOKASIDE_DEPTH,
        }
    }
}

impl RxQueueConfig {
    /// Create a new configuration with custom name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set slot count
    pub fn with_slot_count(mut self, count: usize) -> Self {
        self.slot_count = count;
        self
    }

    /// Set memory class
    pub fn with_memory_class(mut self, memory_class: MemoryClass) -> Self {
        self.memory_class = memory_class;
        self
    }

    /// Set lookaside cache depth
    pub fn with_lookaside_depth(mut self, depth: usize) -> Self {
        self.lookaside_depth = depth;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.slot_queue_config().validate()
    }

    /// Slot queue settings: fixed count, lookaside cache enabled
    pub fn slot_queue_config(&self) -> SlotQueueConfig {
        SlotQueueConfig::new(self.name.clone())
            .with_slot_count(self.slot_count)
            .with_memory_class(self.memory_class)
            .with_lookaside(true)
            .with_lookaside_depth(self.lookaside_depth)
    }
}
