//! Integration tests for the TX buffer/request pool

use std::sync::Arc;

use ncm_buffers::{
    error::{BufferError, Result},
    memory::{MemoryClass, MemoryRegion, PayloadSlab},
    request::{IoRequest, RequestState, RequestStatus},
    tx::{TxBufferRequestPool, TxPoolConfig, TxResourceFactory},
};

fn paged_pool(payload_size: usize, count: usize) -> TxBufferRequestPool {
    TxBufferRequestPool::create(
        TxPoolConfig::new("tx-it", payload_size)
            .with_slot_count(count)
            .with_memory_class(MemoryClass::Paged),
    )
    .unwrap()
}

/// Factory that fails once it reaches a given slot and remembers what it built
struct FailingFactory {
    fail_at: usize,
    fail_on_request: bool,
    slab: std::sync::Mutex<Option<Arc<PayloadSlab>>>,
    token: Arc<()>,
}

impl FailingFactory {
    fn new(fail_at: usize, fail_on_request: bool) -> Self {
        Self {
            fail_at,
            fail_on_request,
            slab: std::sync::Mutex::new(None),
            token: Arc::new(()),
        }
    }
}

impl TxResourceFactory for FailingFactory {
    fn wrap_region(&self, slab: &Arc<PayloadSlab>, slot: usize) -> Result<MemoryRegion> {
        self.slab.lock().unwrap().get_or_insert_with(|| slab.clone());
        if !self.fail_on_request && slot == self.fail_at {
            return Err(BufferError::allocation("region", "injected failure"));
        }
        MemoryRegion::preallocated(slab, slot)
    }

    fn create_request(&self, slot: usize) -> Result<IoRequest> {
        if self.fail_on_request && slot == self.fail_at {
            return Err(BufferError::invalid_parameter("request", "injected failure"));
        }
        Ok(IoRequest::new(slot as u64).with_context(self.token.clone()))
    }
}

/// Factory that hands out heap regions smaller than the pool payload
#[derive(Default)]
struct ShortRegions {
    slab: std::sync::Mutex<Option<Arc<PayloadSlab>>>,
}

impl TxResourceFactory for ShortRegions {
    fn wrap_region(&self, slab: &Arc<PayloadSlab>, _slot: usize) -> Result<MemoryRegion> {
        self.slab.lock().unwrap().get_or_insert_with(|| slab.clone());
        Ok(MemoryRegion::allocate(8))
    }
}

#[cfg(test)]
mod tx_pool_tests {
    use super::*;

    #[test]
    fn test_default_pool_scenario() {
        let pool = TxBufferRequestPool::create(TxPoolConfig::new("tx", 1500)).unwrap();
        assert_eq!(pool.capacity(), 128);
        assert_eq!(pool.payload_size(), 1500);

        let mut leases: Vec<_> = (0..128).map(|_| pool.get().unwrap()).collect();
        assert!(pool.get().is_none());
        assert_eq!(pool.in_flight(), 128);

        let mut lease = leases.pop().unwrap();
        lease.fill(&[0xab; 600]).unwrap();
        pool.put(lease);

        let lease = pool.get().unwrap();
        assert_eq!(lease.transfer_length(), 0);
        assert_eq!(lease.buffer_length(), 1500);
    }

    #[test]
    fn test_put_resets_request_length_and_stats() {
        let pool = paged_pool(256, 1);
        let mut lease = pool.get().unwrap();

        lease.fill(b"ncm datagram").unwrap();
        lease.stats_mut().record_datagram(12, 4);
        lease.stats_mut().submissions += 1;
        lease.request_mut().submit(16).unwrap();
        lease
            .request_mut()
            .complete(RequestStatus::Failed(-5), 0);
        pool.put(lease);

        let lease = pool.get().unwrap();
        assert_eq!(lease.transfer_length(), 0);
        assert!(lease.stats().is_zeroed());
        assert_eq!(lease.request().state(), RequestState::Idle);
        assert_eq!(lease.request().status(), RequestStatus::Success);
        assert_eq!(lease.request().submitted_length(), 0);
        assert_eq!(lease.request().reuse_count(), 1);
    }

    #[test]
    fn test_transfer_length_bounded_by_buffer() {
        let pool = paged_pool(64, 1);
        let mut lease = pool.get().unwrap();
        assert!(lease.set_transfer_length(64).is_ok());
        assert!(lease.set_transfer_length(65).is_err());
        assert!(lease.fill(&[0u8; 65]).is_err());
        assert_eq!(lease.transfer_length(), 64);
    }

    #[test]
    fn test_shared_payload_is_not_writable() {
        let pool = paged_pool(32, 1);
        let mut lease = pool.get().unwrap();
        let held = lease.buffer().clone();

        let err = lease.payload_mut().unwrap_err();
        assert!(matches!(err, BufferError::RegionShared { references: 2 }));

        drop(held);
        assert!(lease.payload_mut().is_ok());
    }

    #[test]
    fn test_buffers_survive_reuse_without_stale_length() {
        let pool = paged_pool(128, 1);
        for round in 1..=4usize {
            let mut lease = pool.get().unwrap();
            assert_eq!(lease.transfer_length(), 0);
            assert!(lease.transfer_bytes().is_empty());

            let frame = vec![round as u8; round * 10];
            lease.fill(&frame).unwrap();
            assert_eq!(lease.transfer_bytes(), frame.as_slice());
        }
    }

    #[test]
    fn test_every_slot_has_its_own_buffer_and_request() {
        let pool = paged_pool(16, 8);
        let leases: Vec<_> = (0..8).map(|_| pool.get().unwrap()).collect();

        let mut ids: Vec<u64> = leases.iter().map(|l| l.request().id()).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..8).collect::<Vec<u64>>());

        for (i, a) in leases.iter().enumerate() {
            assert!(a.buffer().is_preallocated());
            for b in &leases[i + 1..] {
                assert!(!a.buffer().ptr_eq(b.buffer()));
            }
        }
    }

    #[test]
    fn test_create_failing_at_region_releases_everything() {
        let factory = FailingFactory::new(5, false);
        let config = TxPoolConfig::new("tx-fail", 64)
            .with_slot_count(8)
            .with_memory_class(MemoryClass::Paged);

        let err = TxBufferRequestPool::create_with(config, &factory).unwrap_err();
        assert!(err.is_construction_failure());

        let slab = factory.slab.lock().unwrap().take().unwrap();
        assert_eq!(slab.claimed_chunks(), 0);
        assert_eq!(Arc::strong_count(&slab), 1);
        assert_eq!(Arc::strong_count(&factory.token), 1);
    }

    #[test]
    fn test_create_failing_at_request_releases_everything() {
        let factory = FailingFactory::new(3, true);
        let config = TxPoolConfig::new("tx-fail", 64)
            .with_slot_count(8)
            .with_memory_class(MemoryClass::Paged);

        let err = TxBufferRequestPool::create_with(config, &factory).unwrap_err();
        assert!(matches!(err, BufferError::Allocation { .. }));

        let slab = factory.slab.lock().unwrap().take().unwrap();
        assert_eq!(slab.claimed_chunks(), 0);
        assert_eq!(Arc::strong_count(&factory.token), 1);
    }

    #[test]
    fn test_create_rejects_region_of_wrong_size() {
        let factory = ShortRegions::default();
        let config = TxPoolConfig::new("tx-short", 1500)
            .with_slot_count(4)
            .with_memory_class(MemoryClass::Paged);

        let err = TxBufferRequestPool::create_with(config, &factory).unwrap_err();
        assert!(matches!(err, BufferError::Allocation { .. }));

        let slab = factory.slab.lock().unwrap().take().unwrap();
        assert_eq!(slab.claimed_chunks(), 0);
        assert_eq!(Arc::strong_count(&slab), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(TxBufferRequestPool::create(TxPoolConfig::new("tx", 0)).is_err());
        assert!(
            TxBufferRequestPool::create(TxPoolConfig::new("tx", 64).with_slot_count(0)).is_err()
        );
        assert!(matches!(
            TxBufferRequestPool::create(TxPoolConfig::new("tx", usize::MAX / 2).with_slot_count(2)),
            Err(BufferError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_stats_track_get_and_put() {
        let pool = paged_pool(32, 2);
        let lease = pool.get().unwrap();
        let _other = pool.get().unwrap();
        assert!(pool.get().is_none());
        pool.put(lease);

        let stats = pool.stats();
        assert_eq!(stats.dequeues, 2);
        assert_eq!(stats.dequeue_misses, 1);
        assert_eq!(stats.enqueues, 1);
        assert_eq!(stats.outstanding, 1);
        assert!(stats.summary().contains("dequeues: 2"));
    }
}
