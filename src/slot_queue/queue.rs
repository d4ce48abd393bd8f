//! Bounded slot queue: a fixed arena of descriptors behind lock-free index lists

use std::{
    cell::UnsafeCell,
    fmt, mem,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use crossbeam_queue::ArrayQueue;
use crossbeam_utils::CachePadded;
use log::{debug, error, trace};

use crate::{
    error::{BufferError, Result},
    memory::ResidentRange,
};

use super::{
    config::SlotQueueConfig,
    stats::{AtomicSlotQueueStats, SlotQueueStats},
};

/// A fixed-capacity pool of `T` slots with a free list and a ready list.
///
/// ```text
///            fetch                 enqueue
///   free ───────────► held ───────────────► ready
///    ▲                 ▲ │                    │
///    │      reuse      │ └────────────────────┘
///    └─────────────────┘       dequeue
/// ```
///
/// Slots are allocated once at construction and never grow. Every operation is
/// non-blocking: an empty list is reported as `None`, never waited on.
pub struct SlotQueue<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    config: SlotQueueConfig,
    /// Residency lock over `slots`, released before the arena is freed
    resident: Option<ResidentRange>,
    slots: Box<[UnsafeCell<T>]>,
    free: ArrayQueue<usize>,
    ready: ArrayQueue<usize>,
    lookaside: Option<CachePadded<ArrayQueue<usize>>>,
    stats: AtomicSlotQueueStats,
}

impl<T> SlotQueue<T> {
    /// Create a queue whose slots are produced by `init`; all slots start free
    pub fn new(config: SlotQueueConfig, mut init: impl FnMut(usize) -> T) -> Result<Self> {
        Self::try_new(config, |index| Ok(init(index)))
    }

    /// Create a queue with a fallible slot initializer.
    ///
    /// Construction is all-or-nothing: the first failing slot aborts it and every
    /// slot built so far is dropped before the error is returned.
    pub fn try_new(
        config: SlotQueueConfig,
        mut init: impl FnMut(usize) -> Result<T>,
    ) -> Result<Self> {
        config.validate()?;
        let count = config.slot_count;

        let mut slots = Vec::with_capacity(count);
        for index in 0..count {
            slots.push(UnsafeCell::new(init(index)?));
        }
        let slots = slots.into_boxed_slice();

        let free = ArrayQueue::new(count);
        for index in 0..count {
            free.push(index)
                .map_err(|index| BufferError::queue_full(&config.name, index))?;
        }

        let lookaside = match config.effective_lookaside_depth() {
            0 => None,
            depth => Some(CachePadded::new(ArrayQueue::new(depth))),
        };

        let resident = if config.memory_class.is_resident() {
            ResidentRange::lock(
                slots.as_ptr() as *const u8,
                mem::size_of_val(&*slots),
                &config.name,
            )
        } else {
            None
        };

        debug!(
            "{}: slot queue created ({} slots, {} arena, lookaside depth {})",
            config.name,
            count,
            config.memory_class.name(),
            config.effective_lookaside_depth()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                resident,
                slots,
                free,
                ready: ArrayQueue::new(count),
                lookaside,
                stats: AtomicSlotQueueStats::new(),
            }),
        })
    }

    /// Take a free slot, preferring the lookaside cache
    pub fn fetch(&self) -> Option<Slot<T>> {
        let inner = &self.inner;
        let cached = inner.lookaside.as_ref().and_then(|cache| cache.pop());
        let (index, from_lookaside) = match cached {
            Some(index) => (index, true),
            None => match inner.free.pop() {
                Some(index) => (index, false),
                None => {
                    inner.stats.record_fetch_miss();
                    trace!("{}: fetch found no free slot", inner.config.name);
                    return None;
                }
            },
        };

        inner.stats.record_fetch(from_lookaside);
        Some(Slot::new(self.clone(), index))
    }

    /// Publish a held slot to the ready list
    pub fn enqueue(&self, slot: Slot<T>) -> Result<()> {
        self.assert_owns(&slot);
        slot.publish()
            .map_err(|slot| BufferError::queue_full(self.name(), slot.index()))
    }

    /// Claim the oldest ready slot
    pub fn dequeue(&self) -> Option<Slot<T>> {
        match self.inner.ready.pop() {
            Some(index) => {
                self.inner.stats.record_dequeue();
                Some(Slot::new(self.clone(), index))
            }
            None => {
                self.inner.stats.record_dequeue_miss();
                None
            }
        }
    }

    /// Put a held slot back on the free side without touching its content
    pub fn reuse(&self, slot: Slot<T>) {
        self.assert_owns(&slot);
        slot.recycle();
    }

    /// Name of the queue
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Get queue configuration
    pub fn config(&self) -> &SlotQueueConfig {
        &self.inner.config
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.inner.slots.len()
    }

    /// Slots on the free side (free list plus lookaside)
    pub fn free_count(&self) -> usize {
        let cached = self.inner.lookaside.as_ref().map_or(0, |cache| cache.len());
        self.inner.free.len() + cached
    }

    /// Slots waiting on the ready list
    pub fn ready_count(&self) -> usize {
        self.inner.ready.len()
    }

    /// Slots currently held by callers
    pub fn outstanding(&self) -> usize {
        self.inner.stats.snapshot().outstanding
    }

    /// Whether the descriptor arena is locked resident
    pub fn is_resident(&self) -> bool {
        self.inner.resident.is_some()
    }

    /// Get current statistics
    pub fn stats(&self) -> SlotQueueStats {
        self.inner.stats.snapshot()
    }

    /// Reset traffic counters
    pub fn reset_stats(&self) {
        self.inner.stats.reset();
    }

    /// Whether both handles refer to the same queue
    pub fn same_queue(&self, other: &SlotQueue<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether `slot` belongs to this queue
    pub fn owns(&self, slot: &Slot<T>) -> bool {
        self.same_queue(&slot.queue)
    }

    fn assert_owns(&self, slot: &Slot<T>) {
        assert!(
            self.owns(slot),
            "slot {} of queue '{}' handed to queue '{}'",
            slot.index,
            slot.queue.name(),
            self.name()
        );
    }
}

impl<T> Inner<T> {
    fn push_free(&self, index: usize) {
        let index = match &self.lookaside {
            Some(cache) => match cache.push(index) {
                Ok(()) => {
                    self.stats.record_reuse();
                    return;
                }
                Err(index) => index,
            },
            None => index,
        };

        match self.free.push(index) {
            Ok(()) => self.stats.record_reuse(),
            Err(index) => error!(
                "{}: free list refused slot {}, slot is lost",
                self.config.name, index
            ),
        }
    }
}

impl<T> Clone for SlotQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for SlotQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotQueue")
            .field("name", &self.name())
            .field("capacity", &self.capacity())
            .field("free", &self.free_count())
            .field("ready", &self.ready_count())
            .finish()
    }
}

// Slot contents are only reached through a `Slot`, which is an exclusive claim.
unsafe impl<T: Send> Send for Inner<T> {}
unsafe impl<T: Send> Sync for Inner<T> {}

/// An exclusive claim on one slot of a [`SlotQueue`].
///
/// Dropping a claim without publishing it puts the slot back on the free side.
pub struct Slot<T> {
    queue: SlotQueue<T>,
    index: usize,
    armed: bool,
}

impl<T> Slot<T> {
    fn new(queue: SlotQueue<T>, index: usize) -> Self {
        Self {
            queue,
            index,
            armed: true,
        }
    }

    /// Position of the slot in the arena
    pub fn index(&self) -> usize {
        self.index
    }

    /// The queue this slot belongs to
    pub fn queue(&self) -> &SlotQueue<T> {
        &self.queue
    }

    /// Publish to the ready list; a refused slot is handed back
    pub fn publish(mut self) -> std::result::Result<(), Slot<T>> {
        let index = self.disarm();
        match self.queue.inner.ready.push(index) {
            Ok(()) => {
                self.queue.inner.stats.record_enqueue();
                Ok(())
            }
            Err(index) => {
                self.index = index;
                self.armed = true;
                Err(self)
            }
        }
    }

    /// Put the slot back on the free side without touching its content
    pub fn recycle(mut self) {
        let index = self.disarm();
        self.queue.inner.push_free(index);
    }

    fn disarm(&mut self) -> usize {
        self.armed = false;
        self.index
    }
}

impl<T> Deref for Slot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the index was popped from one of the queue's lists, so this claim
        // is the only path to the slot until it is published or recycled.
        unsafe { &*self.queue.inner.slots[self.index].get() }
    }
}

impl<T> DerefMut for Slot<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as in `deref`; `&mut self` makes the borrow unique.
        unsafe { &mut *self.queue.inner.slots[self.index].get() }
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        if self.armed {
            let index = self.disarm();
            trace!("{}: slot {} released on drop", self.queue.name(), index);
            self.queue.inner.push_free(index);
        }
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("queue", &self.queue.name())
            .field("index", &self.index)
            .finish()
    }
}

unsafe impl<T: Send> Send for Slot<T> {}
unsafe impl<T: Send + Sync> Sync for Slot<T> {}
