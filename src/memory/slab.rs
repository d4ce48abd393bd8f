//! Contiguous payload slab carved into fixed-size chunks

use std::{
    ptr::NonNull,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use log::debug;
use memmap2::MmapMut;

use crate::error::{BufferError, Result};

use super::{config::MemoryClass, residency::ResidentRange};

/// One anonymous mapping holding `chunk_count` payload chunks of `chunk_size` bytes.
///
/// Every chunk can be wrapped by at most one [`MemoryRegion`](super::MemoryRegion)
/// at a time; the claim is dropped together with the region. This is what lets a
/// region hand out `&mut [u8]` without aliasing a neighbour.
#[derive(Debug)]
pub struct PayloadSlab {
    /// Residency lock, released before the mapping
    resident: Option<ResidentRange>,
    /// Start of the mapping
    base: NonNull<u8>,
    /// Size of each chunk in bytes
    chunk_size: usize,
    /// Number of chunks
    chunk_count: usize,
    /// Per-chunk claim flags
    claims: Box<[AtomicBool]>,
    /// Number of chunks currently claimed
    claimed: AtomicUsize,
    /// Requested memory class
    memory_class: MemoryClass,
    /// Anonymous mapping that owns the bytes
    _map: MmapMut,
}

impl PayloadSlab {
    /// Map a zero-filled slab of `chunk_count * chunk_size` bytes
    pub fn new(
        chunk_size: usize,
        chunk_count: usize,
        memory_class: MemoryClass,
        owner: &str,
    ) -> Result<Self> {
        if chunk_size == 0 || chunk_count == 0 {
            return Err(BufferError::invalid_parameter(
                "chunk_size",
                "Slab chunks must be non-empty",
            ));
        }

        let len = chunk_size.checked_mul(chunk_count).ok_or_else(|| {
            BufferError::invalid_parameter("chunk_count", "Slab size overflows usize")
        })?;

        let mut map = MmapMut::map_anon(len)
            .map_err(|e| BufferError::from_io(e, "Failed to map payload slab"))?;
        let base = NonNull::new(map.as_mut_ptr()).ok_or_else(|| BufferError::Memory {
            message: "Payload slab mapped at null".to_string(),
            source: None,
        })?;

        let resident = if memory_class.is_resident() {
            ResidentRange::lock(base.as_ptr(), len, owner)
        } else {
            None
        };

        debug!(
            "{}: mapped {} byte {} slab ({} x {} bytes)",
            owner,
            len,
            memory_class.name(),
            chunk_count,
            chunk_size
        );

        Ok(Self {
            resident,
            base,
            chunk_size,
            chunk_count,
            claims: (0..chunk_count).map(|_| AtomicBool::new(false)).collect(),
            claimed: AtomicUsize::new(0),
            memory_class,
            _map: map,
        })
    }

    /// Size of each chunk in bytes
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Total size of the slab in bytes
    pub fn len(&self) -> usize {
        self.chunk_size * self.chunk_count
    }

    /// A slab is never empty; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Requested memory class
    pub fn memory_class(&self) -> MemoryClass {
        self.memory_class
    }

    /// Whether the slab is actually locked resident
    pub fn is_resident(&self) -> bool {
        self.resident.as_ref().map_or(false, |r| r.len() == self.len())
    }

    /// Number of chunks currently wrapped by a region
    pub fn claimed_chunks(&self) -> usize {
        self.claimed.load(Ordering::Acquire)
    }

    /// Claim chunk `index` for exclusive wrapping and return its start address
    pub(crate) fn claim_chunk(&self, index: usize) -> Result<NonNull<u8>> {
        let flag = self.claims.get(index).ok_or_else(|| {
            BufferError::invalid_parameter(
                "chunk",
                format!("Chunk {} out of range (slab has {})", index, self.chunk_count),
            )
        })?;

        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BufferError::allocation(
                format!("slab_chunk[{}]", index),
                "Chunk is already wrapped by another region",
            ));
        }
        self.claimed.fetch_add(1, Ordering::AcqRel);

        // SAFETY: index < chunk_count, so the offset stays inside the mapping.
        let ptr = unsafe { self.base.as_ptr().add(index * self.chunk_size) };
        NonNull::new(ptr).ok_or_else(|| BufferError::Memory {
            message: "Chunk address is null".to_string(),
            source: None,
        })
    }

    /// Give back a chunk claimed with `claim_chunk`
    pub(crate) fn release_chunk(&self, index: usize) {
        if let Some(flag) = self.claims.get(index) {
            if flag.swap(false, Ordering::AcqRel) {
                self.claimed.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }
}

// The mapping is only reached through claimed, disjoint chunks.
unsafe impl Send for PayloadSlab {}
unsafe impl Sync for PayloadSlab {}
