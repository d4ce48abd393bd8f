//! TX buffer request pool

use std::{
    mem::ManuallyDrop,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use log::{debug, error, trace};

use crate::{
    error::{BufferError, Result},
    memory::PayloadSlab,
    slot_queue::{Slot, SlotQueue, SlotQueueStats},
};

use super::{
    config::TxPoolConfig,
    request::TxBufferRequest,
    resources::{DefaultTxResources, TxResourceFactory},
};

/// A fixed pool of pre-built transmit buffer/request pairs.
///
/// Everything is allocated in [`create`](Self::create); `get` and `put` only move
/// slot indices between lists and never allocate or block.
#[derive(Debug, Clone)]
pub struct TxBufferRequestPool {
    queue: SlotQueue<TxBufferRequest>,
    slab: Arc<PayloadSlab>,
    payload_size: usize,
}

impl TxBufferRequestPool {
    /// Build the pool with the default region and request factory
    pub fn create(config: TxPoolConfig) -> Result<Self> {
        Self::create_with(config, &DefaultTxResources)
    }

    /// Build the pool, creating every slot's region and request through `factory`.
    ///
    /// The first per-slot failure aborts construction; everything acquired up to
    /// that point is released before the error is returned.
    pub fn create_with<F>(config: TxPoolConfig, factory: &F) -> Result<Self>
    where
        F: TxResourceFactory + ?Sized,
    {
        config.validate()?;

        let slab = Arc::new(PayloadSlab::new(
            config.payload_size,
            config.slot_count,
            config.memory_class,
            &config.name,
        )?);

        let queue = SlotQueue::try_new(config.slot_queue_config(), |slot| {
            let buffer = factory
                .wrap_region(&slab, slot)
                .map_err(|e| construction_failure(&config.name, "region", slot, e))?;
            if buffer.len() != config.payload_size {
                let err = BufferError::allocation(
                    format!("{}_region[{}]", config.name, slot),
                    format!(
                        "region holds {} bytes, pool payload size is {}",
                        buffer.len(),
                        config.payload_size
                    ),
                );
                return Err(construction_failure(&config.name, "region", slot, err));
            }
            let request = factory
                .create_request(slot)
                .map_err(|e| construction_failure(&config.name, "request", slot, e))?;
            Ok(TxBufferRequest::new(buffer, request))
        })?;

        // Drain the free list once and publish every slot for `get`.
        let mut published = 0usize;
        while let Some(slot) = queue.fetch() {
            queue.enqueue(slot)?;
            published += 1;
        }
        queue.reset_stats();

        debug!(
            "{}: {} TX buffer/request pairs ready ({} byte payloads, {} byte slots)",
            config.name,
            published,
            config.payload_size,
            config.slot_size()
        );

        Ok(Self {
            queue,
            slab,
            payload_size: config.payload_size,
        })
    }

    /// Take a ready buffer/request pair, or `None` if all are in flight
    pub fn get(&self) -> Option<TxLease> {
        match self.queue.dequeue() {
            Some(slot) => Some(TxLease::new(slot)),
            None => {
                trace!("{}: TX pool exhausted", self.queue.name());
                None
            }
        }
    }

    /// Reset a pair and make it available again; same as dropping the lease
    pub fn put(&self, lease: TxLease) {
        assert!(
            self.queue.owns(&lease.slot),
            "TX lease from pool '{}' returned to pool '{}'",
            lease.slot.queue().name(),
            self.queue.name()
        );
        drop(lease);
    }

    /// Name of the pool
    pub fn name(&self) -> &str {
        self.queue.name()
    }

    /// Total number of pairs
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Pairs ready to be handed out
    pub fn available(&self) -> usize {
        self.queue.ready_count()
    }

    /// Pairs currently held by callers
    pub fn in_flight(&self) -> usize {
        self.queue.outstanding()
    }

    /// Payload bytes per buffer
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    /// The slab backing every payload buffer
    pub fn slab(&self) -> &Arc<PayloadSlab> {
        &self.slab
    }

    /// Whether descriptors and payloads are both locked resident
    pub fn is_resident(&self) -> bool {
        self.queue.is_resident() && self.slab.is_resident()
    }

    /// Get current statistics
    pub fn stats(&self) -> SlotQueueStats {
        self.queue.stats()
    }
}

fn construction_failure(pool: &str, resource: &str, slot: usize, err: BufferError) -> BufferError {
    error!(
        "{}: creating TX {} for slot {} failed: {}",
        pool, resource, slot, err
    );
    match err {
        BufferError::Allocation { .. } => err,
        other => BufferError::allocation(
            format!("{}_{}[{}]", pool, resource, slot),
            other.to_string(),
        ),
    }
}

/// Exclusive use of one TX buffer/request pair.
///
/// Dropping the lease resets the request, zeroes the transfer length and stats,
/// and returns the pair to its pool.
#[derive(Debug)]
pub struct TxLease {
    slot: ManuallyDrop<Slot<TxBufferRequest>>,
}

impl TxLease {
    fn new(slot: Slot<TxBufferRequest>) -> Self {
        Self {
            slot: ManuallyDrop::new(slot),
        }
    }

    /// Index of the pair within its pool
    pub fn slot_index(&self) -> usize {
        self.slot.index()
    }
}

impl Deref for TxLease {
    type Target = TxBufferRequest;

    fn deref(&self) -> &TxBufferRequest {
        &self.slot
    }
}

impl DerefMut for TxLease {
    fn deref_mut(&mut self) -> &mut TxBufferRequest {
        &mut self.slot
    }
}

impl Drop for TxLease {
    fn drop(&mut self) {
        // SAFETY: the slot is taken exactly once, here, and not touched afterwards.
        let mut slot = unsafe { ManuallyDrop::take(&mut self.slot) };
        slot.reset();
        if let Err(slot) = slot.publish() {
            error!(
                "{}: ready list refused TX slot {}, it will not be handed out again",
                slot.queue().name(),
                slot.index()
            );
        }
    }
}
