//! Memory class selection for pool backing storage

/// Residency class of a pool's backing memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryClass {
    /// Pinned resident so the hot path never faults pages in
    NonPaged,
    /// Ordinary pageable memory
    Paged,
}

impl Default for MemoryClass {
    fn default() -> Self {
        Self::NonPaged
    }
}

impl MemoryClass {
    /// Whether backing memory of this class should be locked resident
    pub fn is_resident(&self) -> bool {
        matches!(self, MemoryClass::NonPaged)
    }

    /// Get a human-readable name for the memory class
    pub fn name(&self) -> &'static str {
        match self {
            MemoryClass::NonPaged => "non-paged",
            MemoryClass::Paged => "paged",
        }
    }
}
