//! Concurrent stress tests for the TX pool and RX queue
//! Tests focused on slot exclusivity and return paths under contention

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier, Mutex,
    },
    thread,
};

use ncm_buffers::{
    memory::{MemoryClass, MemoryRegion},
    rx::{BufferSink, ContinuousBufferSource, RxBufferQueue, RxQueueConfig},
    tx::{TxBufferRequestPool, TxPoolConfig},
};

#[cfg(test)]
mod concurrent_stress_tests {
    use super::*;

    /// Test: `count + 1` simultaneous gets against a fresh pool of `count`
    #[test]
    fn stress_concurrent_get_distinct_slots() {
        let count = 32;
        let pool = TxBufferRequestPool::create(
            TxPoolConfig::new("tx-race", 512)
                .with_slot_count(count)
                .with_memory_class(MemoryClass::Paged),
        )
        .unwrap();

        let barrier = Arc::new(Barrier::new(count + 1));
        let leases = Arc::new(Mutex::new(Vec::new()));
        let empties = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..=count)
            .map(|_| {
                let pool = pool.clone();
                let barrier = barrier.clone();
                let leases = leases.clone();
                let empties = empties.clone();
                thread::spawn(move || {
                    barrier.wait(); // Synchronized start for maximum contention
                    match pool.get() {
                        Some(lease) => leases.lock().unwrap().push(lease),
                        None => {
                            empties.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let leases = leases.lock().unwrap();
        assert_eq!(leases.len(), count);
        assert_eq!(empties.load(Ordering::Relaxed), 1);

        let slots: HashSet<usize> = leases.iter().map(|l| l.slot_index()).collect();
        assert_eq!(slots.len(), count);
        let buffers: HashSet<usize> = leases.iter().map(|l| l.payload().as_ptr() as usize).collect();
        assert_eq!(buffers.len(), count);
    }

    /// Test: writers on every thread never see each other's payload
    #[test]
    fn stress_tx_get_fill_put() {
        let thread_count = 8;
        let cycles = 2_000;
        let pool = TxBufferRequestPool::create(
            TxPoolConfig::new("tx-stress", 256)
                .with_slot_count(4)
                .with_memory_class(MemoryClass::Paged),
        )
        .unwrap();
        let barrier = Arc::new(Barrier::new(thread_count));
        let completed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..thread_count)
            .map(|thread_id| {
                let pool = pool.clone();
                let barrier = barrier.clone();
                let completed = completed.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let pattern = vec![thread_id as u8; 200];
                    for _ in 0..cycles {
                        let Some(mut lease) = pool.get() else {
                            thread::yield_now();
                            continue;
                        };
                        assert_eq!(lease.transfer_length(), 0);
                        lease.fill(&pattern).unwrap();
                        thread::yield_now();
                        assert_eq!(lease.transfer_bytes(), pattern.as_slice());
                        pool.put(lease);
                        completed.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(completed.load(Ordering::Relaxed) > 0);
        assert_eq!(pool.available(), 4);
        assert_eq!(pool.in_flight(), 0);
        assert!(pool.stats().peak_outstanding <= 4);
    }

    /// Test: producers enqueue both modes while consumers return them
    #[test]
    fn stress_rx_producers_and_consumers() {
        let producer_count = 2;
        let consumer_count = 2;
        let per_producer = 5_000;

        let queue = RxBufferQueue::create(
            RxQueueConfig::new("rx-stress")
                .with_slot_count(16)
                .with_memory_class(MemoryClass::Paged),
        )
        .unwrap();
        let region = MemoryRegion::allocate(128);
        let reader = Arc::new(ContinuousBufferSource::new("reader", 16, 128));
        let barrier = Arc::new(Barrier::new(producer_count + consumer_count));
        let produced = Arc::new(AtomicUsize::new(0));
        let consumed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();

        for producer_id in 0..producer_count {
            let queue = queue.clone();
            let region = region.clone();
            let reader = reader.clone();
            let barrier = barrier.clone();
            let produced = produced.clone();
            handles.push(thread::spawn(move || {
                barrier.wait();
                for _ in 0..per_producer {
                    let result = if producer_id == 0 {
                        queue.enqueue_external(&region)
                    } else {
                        match reader.take() {
                            Some(buffer) => {
                                let sink: Arc<dyn BufferSink> = reader.clone();
                                queue.enqueue_polled(buffer, 64, sink)
                            }
                            None => {
                                thread::yield_now();
                                continue;
                            }
                        }
                    };
                    match result {
                        Ok(()) => {
                            produced.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) => {
                            assert!(err.is_exhausted());
                            thread::yield_now();
                        }
                    }
                }
            }));
        }

        for _ in 0..consumer_count {
            let queue = queue.clone();
            let barrier = barrier.clone();
            let consumed = consumed.clone();
            handles.push(thread::spawn(move || {
                barrier.wait();
                for _ in 0..per_producer {
                    match queue.dequeue() {
                        Some(lease) => {
                            assert!(lease.region().is_some() != lease.sink().is_some());
                            queue.return_buffer(lease);
                            consumed.fetch_add(1, Ordering::Relaxed);
                        }
                        None => thread::yield_now(),
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let drained = queue.drain();
        assert_eq!(
            produced.load(Ordering::Relaxed),
            consumed.load(Ordering::Relaxed) + drained
        );
        assert_eq!(region.ref_count(), 1);
        assert_eq!(reader.available(), 16);
    }
}
