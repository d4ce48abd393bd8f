//! Per-slot resource creation for the TX pool

use std::sync::Arc;

use crate::{
    error::Result,
    memory::{MemoryRegion, PayloadSlab},
    request::IoRequest,
};

/// Creates the region and request attached to each TX slot.
///
/// The pool calls both methods once per slot while it is being built; an error
/// from either aborts the build.
pub trait TxResourceFactory {
    /// Wrap chunk `slot` of the payload slab
    fn wrap_region(&self, slab: &Arc<PayloadSlab>, slot: usize) -> Result<MemoryRegion> {
        MemoryRegion::preallocated(slab, slot)
    }

    /// Create the reusable request for `slot`
    fn create_request(&self, slot: usize) -> Result<IoRequest> {
        Ok(IoRequest::new(slot as u64))
    }
}

/// Factory that wraps slab chunks and creates plain requests
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTxResources;

impl TxResourceFactory for DefaultTxResources {}
