//! Slot queue configuration

use crate::{
    config::{DEFAULT_LOOKASIDE_DEPTH, DEFAULT_SLOT_COUNT},
    error::{BufferError, Result},
    memory::MemoryClass,
};

/// Configuration for a [`SlotQueue`](super::SlotQueue)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotQueueConfig {
    /// Name used in logs and errors
    pub name: String,
    /// Number of slots, fixed for the queue's lifetime
    pub slot_count: usize,
    /// Residency class of the descriptor arena
    pub memory_class: MemoryClass,
    /// Serve fetches from a small cache of recently reused slots first
    pub enable_lookaside: bool,
    /// Capacity of the lookaside cache
    pub lookaside_depth: usize,
}

impl Default for SlotQueueConfig {
    fn default() -> Self {
        Self {
            name: "slot_queue".to_string(),
            slot_count: DEFAULT_SLOT_COUNT,
            memory_class: MemoryClass::NonPaged,
            enable_lookaside: false,
            lookaside_depth: DEFAULT_LOOKASIDE_DEPTH,
        }
    }
}

impl SlotQueueConfig {
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

    /// Enable or disable the lookaside cache
    pub fn with_lookaside(mut self, enable: bool) -> Self {
        self.enable_lookaside = enable;
        self
    }

    /// Set lookaside cache depth
    pub fn with_lookaside_depth(mut self, depth: usize) -> Self {
        self.lookaside_depth = depth;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.slot_count == 0 {
            return Err(BufferError::invalid_parameter(
                "slot_count",
                "Slot count cannot be zero",
            ));
        }

        if self.enable_lookaside && self.lookaside_depth == 0 {
            return Err(BufferError::invalid_parameter(
                "lookaside_depth",
                "Lookaside depth cannot be zero when the cache is enabled",
            ));
        }

        Ok(())
    }

    /// Effective lookaside capacity, never more than the slot count
    pub fn effective_lookaside_depth(&self) -> usize {
        if self.enable_lookaside {
            self.lookaside_depth.min(self.slot_count)
        } else {
            0
        }
    }
}

/// Builder pattern for slot queue configuration
pub struct SlotQueueConfigBuilder {
    config: SlotQueueConfig,
}

impl SlotQueueConfigBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: SlotQueueConfig::new(name),
        }
    }

    /// Set slot count
    pub fn slot_count(mut self, count: usize) -> Self {
        self.config.slot_count = count;
        self
    }

    /// Set memory class
    pub fn memory_class(mut self, memory_class: MemoryClass) -> Self {
        self.config.memory_class = memory_class;
        self
    }

    /// Enable the lookaside cache with the given depth
    pub fn lookaside(mut self, depth: usize) -> Self {
        self.config.enable_lookaside = true;
        self.config.lookaside_depth = depth;
        self
    }

    /// Disable the lookaside cache
    pub fn no_lookaside(mut self) -> Self {
        self.config.enable_lookaside = false;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<SlotQueueConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SlotQueueConfig::default();
        assert_eq!(config.slot_count, 128);
        assert_eq!(config.memory_class, MemoryClass::NonPaged);
        assert!(!config.enable_lookaside);
        assert_eq!(config.effective_lookaside_depth(), 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validation() {
        assert!(SlotQueueConfigBuilder::new("q").slot_count(0).build().is_err());
        assert!(SlotQueueConfigBuilder::new("q").lookaside(0).build().is_err());

        let config = SlotQueueConfigBuilder::new("q")
            .slot_count(4)
            .lookaside(16)
            .memory_class(MemoryClass::Paged)
            .build()
            .unwrap();
        assert_eq!(config.effective_lookaside_depth(), 4);
    }
}
