//! RX buffer queue

use std::{mem::ManuallyDrop, ops::Deref, sync::Arc};

use log::{debug, error, trace};

use crate::{
    error::{BufferError, Result},
    memory::MemoryRegion,
    slot_queue::{Slot, SlotQueue, SlotQueueStats},
};

use super::{
    buffer::{RxBuffer, RxOwnership, RxSource},
    config::RxQueueConfig,
    sink::BufferSink,
};

/// Received buffers waiting for a consumer, in arrival order.
///
/// Descriptors are pre-allocated; a full queue refuses new buffers instead of
/// growing. Returned descriptors go through a small lookaside cache so the
/// next enqueue usually reuses a recently touched one.
#[derive(Debug, Clone)]
pub struct RxBufferQueue {
    queue: SlotQueue<RxBuffer>,
}

impl RxBufferQueue {
    pub fn create(config: RxQueueConfig) -> Result<Self> {
        config.validate()?;
        let queue = SlotQueue::new(config.slot_queue_config(), |_| RxBuffer::default())?;
        debug!(
            "{}: RX queue ready ({} descriptors, lookaside depth {})",
            config.name, config.slot_count, config.lookaside_depth
        );
        Ok(Self { queue })
    }

    /// Queue a received buffer in either mode
    pub fn enqueue(&self, source: RxSource<'_>) -> Result<()> {
        match source {
            RxSource::External(region) => self.enqueue_external(region),
            RxSource::Polled { buffer, len, sink } => self.enqueue_polled(buffer, len, sink),
        }
    }

    /// Queue a shared region, taking one reference on it until the buffer is returned
    pub fn enqueue_external(&self, region: &MemoryRegion) -> Result<()> {
        let Some(mut slot) = self.queue.fetch() else {
            return Err(self.exhausted());
        };
        slot.attach(RxOwnership::External(region.clone()), region.len());
        self.publish(slot)
    }

    /// Queue a polled buffer holding `len` valid bytes.
    ///
    /// If no descriptor is free the buffer goes straight back to `sink` before
    /// the error is returned.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the buffer.
    pub fn enqueue_polled(
        &self,
        buffer: Box<[u8]>,
        len: usize,
        sink: Arc<dyn BufferSink>,
    ) -> Result<()> {
        assert!(
            len <= buffer.len(),
            "polled length {} exceeds {} byte buffer",
            len,
            buffer.len()
        );

        let Some(mut slot) = self.queue.fetch() else {
            sink.put_back(buffer);
            return Err(self.exhausted());
        };
        slot.attach(RxOwnership::Polled { buffer, sink }, len);
        self.publish(slot)
    }

    /// Take the oldest queued buffer
    pub fn dequeue(&self) -> Option<RxLease> {
        self.queue.dequeue().map(RxLease::new)
    }

    /// Release a consumed buffer and free its descriptor; same as dropping the lease
    pub fn return_buffer(&self, lease: RxLease) {
        assert!(
            self.queue.owns(&lease.slot),
            "RX buffer from queue '{}' returned to queue '{}'",
            lease.slot.queue().name(),
            self.queue.name()
        );
        drop(lease);
    }

    /// Return every queued buffer without consuming it
    pub fn drain(&self) -> usize {
        let mut drained = 0;
        while let Some(lease) = self.dequeue() {
            drop(lease);
            drained += 1;
        }
        if drained > 0 {
            debug!("{}: drained {} queued RX buffers", self.name(), drained);
        }
        drained
    }

    /// Name of the queue
    pub fn name(&self) -> &str {
        self.queue.name()
    }

    /// Total number of descriptors
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Buffers waiting to be dequeued
    pub fn available(&self) -> usize {
        self.queue.ready_count()
    }

    /// Descriptors free for new buffers
    pub fn free_slots(&self) -> usize {
        self.queue.free_count()
    }

    /// Buffers dequeued and not yet returned
    pub fn in_flight(&self) -> usize {
        self.queue.outstanding()
    }

    pub fn is_resident(&self) -> bool {
        self.queue.is_resident()
    }

    /// Get current statistics
    pub fn stats(&self) -> SlotQueueStats {
        self.queue.stats()
    }

    fn publish(&self, slot: Slot<RxBuffer>) -> Result<()> {
        slot.publish().map_err(|mut slot| {
            let index = slot.index();
            error!(
                "{}: ready list refused RX descriptor {}, releasing its buffer",
                self.name(),
                index
            );
            slot.release();
            BufferError::queue_full(self.name(), index)
        })
    }

    fn exhausted(&self) -> BufferError {
        trace!("{}: no free RX descriptor", self.name());
        BufferError::pool_exhausted(self.name())
    }
}

/// A dequeued RX buffer.
///
/// Dropping the lease releases the buffer the way its mode requires (dropping
/// the region reference or putting the polled buffer back to its sink) and frees
/// the descriptor.
#[derive(Debug)]
pub struct RxLease {
    slot: ManuallyDrop<Slot<RxBuffer>>,
}

impl RxLease {
    fn new(slot: Slot<RxBuffer>) -> Self {
        Self {
            slot: ManuallyDrop::new(slot),
        }
    }

    /// Index of the descriptor within its queue
    pub fn slot_index(&self) -> usize {
        self.slot.index()
    }
}

impl Deref for RxLease {
    type Target = RxBuffer;

    fn deref(&self) -> &RxBuffer {
        &self.slot
    }
}

impl Drop for RxLease {
    fn drop(&mut self) {
        // SAFETY: the slot is taken exactly once, here, and not touched afterwards.
        let mut slot = unsafe { ManuallyDrop::take(&mut self.slot) };
        slot.release();
        slot.recycle();
    }
}
