//! TX request pool configuration

use crate::{
    config::{DEFAULT_SLOT_COUNT, DEFAULT_TX_PAYLOAD_SIZE},
    error::{BufferError, Result},
    memory::MemoryClass,
    slot_queue::SlotQueueConfig,
};

use super::request::TxBufferRequest;

/// Configuration for a [`TxBufferRequestPool`](super::TxBufferRequestPool)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPoolConfig {
    /// Name of the pool (usually the owning device)
    pub name: String,
    /// Payload bytes available in every request buffer
    pub payload_size: usize,
    /// Number of buffer/request pairs
    pub slot_count: usize,
    /// Residency class of descriptors and payload slab
    pub memory_class: MemoryClass,
}

impl Default for TxPoolConfig {
    fn default() -> Self {
        Self {
            name: "tx".to_string(),
            payload_size: DEFAULT_TX_PAYLOAD_SIZE,
            slot_count: DEFAULT_SLOT_COUNT,
            memory_class: MemoryClass::NonPaged,
        }
    }
}

impl TxPoolConfig {
    /// Create a configuration for `payload_size` byte buffers
    pub fn new(name: impl Into<String>, payload_size: usize) -> Self {
        Self {
            name: name.into(),
            payload_size,
            ..Default::default()
        }
    }

    /// Set payload size
    pub fn with_payload_size(mut self, size: usize) -> Self {
        self.payload_size = size;
        self
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

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.payload_size == 0 {
            return Err(BufferError::invalid_parameter(
                "payload_size",
                "Payload size cannot be zero",
            ));
        }

        let total = std::mem::size_of::<TxBufferRequest>()
            .checked_add(self.payload_size)
            .and_then(|slot| slot.checked_mul(self.slot_count));
        if total.is_none() {
            return Err(BufferError::invalid_parameter(
                "payload_size",
                "Pool memory size overflows usize",
            ));
        }

        self.slot_queue_config().validate()
    }

    /// Bytes accounted to one slot: descriptor header plus payload.
    ///
    /// Saturates at `usize::MAX`; `validate` rejects such configurations.
    pub fn slot_size(&self) -> usize {
        std::mem::size_of::<TxBufferRequest>().saturating_add(self.payload_size)
    }

    /// Total memory reserved by the pool, saturating like `slot_size`
    pub fn total_memory_required(&self) -> usize {
        self.slot_size().saturating_mul(self.slot_count)
    }

    /// Slot queue settings: fixed count, no lookaside cache
    pub fn slot_queue_config(&self) -> SlotQueueConfig {
        SlotQueueConfig::new(self.name.clone())
            .with_slot_count(self.slot_count)
            .with_memory_class(self.memory_class)
            .with_lookaside(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_size_includes_header() {
        let config = TxPoolConfig::new("tx", 1500);
        assert_eq!(config.slot_count, 128);
        assert!(config.slot_size() > 1500);
        assert_eq!(config.total_memory_required(), config.slot_size() * 128);
        assert!(!config.slot_queue_config().enable_lookaside);
    }

    #[test]
    fn test_validation() {
        assert!(TxPoolConfig::new("tx", 0).validate().is_err());
        assert!(TxPoolConfig::new("tx", 64).with_slot_count(0).validate().is_err());
        assert!(TxPoolConfig::new("tx", usize::MAX).with_slot_count(2).validate().is_err());
        assert!(TxPoolConfig::new("tx", 64).validate().is_ok());
    }

    #[test]
    fn test_oversized_pool_rejected_without_overflow() {
        let config = TxPoolConfig::new("tx", usize::MAX / 2).with_slot_count(2);
        assert!(matches!(
            config.validate(),
            Err(BufferError::InvalidParameter { .. })
        ));
        assert_eq!(config.total_memory_required(), usize::MAX);

        let config = TxPoolConfig::new("tx", usize::MAX).with_slot_count(1);
        assert!(config.validate().is_err());
        assert_eq!(config.slot_size(), usize::MAX);
    }
}
