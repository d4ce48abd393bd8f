//! Error types and handling for ncm-buffers

/// Result type alias for buffer pool operations
pub type Result<T> = std::result::Result<T, BufferError>;

/// Error types for the TX request pool, the RX buffer queue and the slot queue beneath them
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// A per-slot resource could not be created while building a pool
    #[error("Allocation failed for {resource}: {message}")]
    Allocation { resource: String, message: String },

    /// No free slot was available
    #[error("Pool exhausted: {pool}")]
    PoolExhausted { pool: String },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// An index list of the slot queue refused a slot
    #[error("Slot queue {queue} refused slot {index}")]
    QueueFull { queue: String, index: usize },

    /// A region cannot be written while other references exist
    #[error("Region is shared by {references} references")]
    RegionShared { references: usize },

    /// Backing memory could not be mapped
    #[error("Memory error: {message}")]
    Memory {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl BufferError {
    /// Create an allocation error
    pub fn allocation(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Allocation {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a pool exhausted error
    pub fn pool_exhausted(pool: impl Into<String>) -> Self {
        Self::PoolExhausted { pool: pool.into() }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a queue full error
    pub fn queue_full(queue: impl Into<String>, index: usize) -> Self {
        Self::QueueFull {
            queue: queue.into(),
            index,
        }
    }

    /// Create a memory error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Memory {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Exhaustion is an expected outcome, not a fault
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. })
    }

    /// Whether this error aborted a pool construction
    pub fn is_construction_failure(&self) -> bool {
        matches!(self, Self::Allocation { .. } | Self::Memory { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BufferError::allocation("tx_request[3]", "out of requests");
        assert!(matches!(err, BufferError::Allocation { .. }));
        assert!(err.is_construction_failure());

        let err = BufferError::pool_exhausted("rx");
        assert!(err.is_exhausted());
        assert!(!err.is_construction_failure());

        let err = BufferError::queue_full("tx", 7);
        assert!(matches!(err, BufferError::QueueFull { index: 7, .. }));
    }

    #[test]
    fn test_error_display() {
        let err = BufferError::invalid_parameter("slot_count", "must be non-zero");
        let display = format!("{}", err);
        assert!(display.contains("Invalid parameter"));
        assert!(display.contains("slot_count"));

        let err = BufferError::from_io(std::io::Error::from_raw_os_error(12), "map slab");
        assert!(format!("{}", err).contains("map slab"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
