//! Slot queue statistics tracking

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Snapshot of slot queue activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotQueueStats {
    /// Successful fetches from the free list or lookaside
    pub fetches: u64,
    /// Fetches that found no free slot
    pub fetch_misses: u64,
    /// Fetches served by the lookaside cache
    pub lookaside_hits: u64,
    /// Slots published to the ready list
    pub enqueues: u64,
    /// Slots claimed from the ready list
    pub dequeues: u64,
    /// Dequeues that found no ready slot
    pub dequeue_misses: u64,
    /// Slots put back on the free side without publishing
    pub reuses: u64,
    /// Slots currently held by callers
    pub outstanding: usize,
    /// Highest number of slots held at once
    pub peak_outstanding: usize,
}

impl SlotQueueStats {
    /// Create new statistics instance
    pub fn new() -> Self {
        Default::default()
    }

    /// Fraction of claims (fetch or dequeue) that found nothing (0.0 to 1.0)
    pub fn exhaustion_rate(&self) -> f64 {
        let attempts = self.fetches + self.fetch_misses + self.dequeues + self.dequeue_misses;
        if attempts == 0 {
            return 0.0;
        }
        (self.fetch_misses + self.dequeue_misses) as f64 / attempts as f64
    }

    /// Fraction of fetches served by the lookaside cache (0.0 to 1.0)
    pub fn lookaside_hit_rate(&self) -> f64 {
        if self.fetches == 0 {
            return 0.0;
        }
        self.lookaside_hits as f64 / self.fetches as f64
    }

    /// Get a summary string of the statistics
    pub fn summary(&self) -> String {
        format!(
            "SlotQueueStats {{ fetches: {} (misses: {}, lookaside: {:.1}%), \
             enqueues: {}, dequeues: {} (misses: {}), reuses: {}, \
             outstanding: {}, peak: {} }}",
            self.fetches,
            self.fetch_misses,
            self.lookaside_hit_rate() * 100.0,
            self.enqueues,
            self.dequeues,
            self.dequeue_misses,
            self.reuses,
            self.outstanding,
            self.peak_outstanding
        )
    }
}

/// Thread-safe counters behind [`SlotQueueStats`]
#[derive(Debug, Default)]
pub struct AtomicSlotQueueStats {
    fetches: AtomicU64,
    fetch_misses: AtomicU64,
    lookaside_hits: AtomicU64,
    enqueues: AtomicU64,
    dequeues: AtomicU64,
    dequeue_misses: AtomicU64,
    reuses: AtomicU64,
    outstanding: AtomicUsize,
    peak_outstanding: AtomicUsize,
}

impl AtomicSlotQueueStats {
    /// Create new atomic statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful fetch
    pub fn record_fetch(&self, from_lookaside: bool) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if from_lookaside {
            self.lookaside_hits.fetch_add(1, Ordering::Relaxed);
        }
        self.claim();
    }

    /// Record a fetch that found the free side empty
    pub fn record_fetch_miss(&self) {
        self.fetch_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a slot published to the ready list
    pub fn record_enqueue(&self) {
        self.enqueues.fetch_add(1, Ordering::Relaxed);
        self.unclaim();
    }

    /// Record a successful dequeue
    pub fn record_dequeue(&self) {
        self.dequeues.fetch_add(1, Ordering::Relaxed);
        self.claim();
    }

    /// Record a dequeue that found the ready list empty
    pub fn record_dequeue_miss(&self) {
        self.dequeue_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a slot put back on the free side
    pub fn record_reuse(&self) {
        self.reuses.fetch_add(1, Ordering::Relaxed);
        self.unclaim();
    }

    /// Get current statistics snapshot
    pub fn snapshot(&self) -> SlotQueueStats {
        SlotQueueStats {
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_misses: self.fetch_misses.load(Ordering::Relaxed),
            lookaside_hits: self.lookaside_hits.load(Ordering::Relaxed),
            enqueues: self.enqueues.load(Ordering::Relaxed),
            dequeues: self.dequeues.load(Ordering::Relaxed),
            dequeue_misses: self.dequeue_misses.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
            outstanding: self.outstanding.load(Ordering::Relaxed),
            peak_outstanding: self.peak_outstanding.load(Ordering::Relaxed),
        }
    }

    /// Reset traffic counters; `outstanding` tracks live state and is kept
    pub fn reset(&self) {
        self.fetches.store(0, Ordering::Relaxed);
        self.fetch_misses.store(0, Ordering::Relaxed);
        self.lookaside_hits.store(0, Ordering::Relaxed);
        self.enqueues.store(0, Ordering::Relaxed);
        self.dequeues.store(0, Ordering::Relaxed);
        self.dequeue_misses.store(0, Ordering::Relaxed);
        self.reuses.store(0, Ordering::Relaxed);
        self.peak_outstanding
            .store(self.outstanding.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    fn claim(&self) {
        let held = self.outstanding.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_outstanding.fetch_max(held, Ordering::Relaxed);
    }

    fn unclaim(&self) {
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
    }
}
