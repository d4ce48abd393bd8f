//! Reference-counted memory region handles

use std::{fmt, ptr::NonNull, slice, sync::Arc};

use crate::error::Result;

use super::slab::PayloadSlab;

/// A reference-counted handle to a byte region.
///
/// Cloning takes a reference and dropping releases it; the bytes are freed (or the
/// slab chunk given back) when the last reference goes away. Writing requires the
/// handle to be the only reference, so a region shared between a driver and a
/// queue is read-only for all of them.
#[derive(Clone)]
pub struct MemoryRegion {
    inner: Arc<RegionInner>,
}

struct RegionInner {
    ptr: NonNull<u8>,
    len: usize,
    backing: Backing,
}

enum Backing {
    /// Bytes leaked from a `Box<[u8]>`, reclaimed on drop
    Heap,
    /// A claimed chunk of a pre-allocated slab
    Slab { slab: Arc<PayloadSlab>, chunk: usize },
}

impl MemoryRegion {
    /// Allocate a zero-filled region of `len` bytes
    pub fn allocate(len: usize) -> Self {
        Self::from_vec(vec![0u8; len])
    }

    /// Take ownership of `bytes` as a region
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let boxed = bytes.into_boxed_slice();
        let len = boxed.len();
        let raw = Box::into_raw(boxed) as *mut u8;
        // Box::into_raw never returns null, even for empty slices.
        let ptr = NonNull::new(raw).unwrap_or(NonNull::dangling());

        Self {
            inner: Arc::new(RegionInner {
                ptr,
                len,
                backing: Backing::Heap,
            }),
        }
    }

    /// Wrap chunk `chunk` of `slab` without copying or allocating payload memory
    pub fn preallocated(slab: &Arc<PayloadSlab>, chunk: usize) -> Result<Self> {
        let ptr = slab.claim_chunk(chunk)?;

        Ok(Self {
            inner: Arc::new(RegionInner {
                ptr,
                len: slab.chunk_size(),
                backing: Backing::Slab {
                    slab: Arc::clone(slab),
                    chunk,
                },
            }),
        })
    }

    /// Size of the region in bytes
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Check if the region is empty
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Raw pointer to the first byte
    pub fn as_ptr(&self) -> *const u8 {
        self.inner.ptr.as_ptr()
    }

    /// Get the region as a byte slice
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr/len describe memory kept alive by `inner`; writers need the
        // only reference (see `as_mut_slice`), so no one writes while this borrow lives.
        unsafe { slice::from_raw_parts(self.inner.ptr.as_ptr(), self.inner.len) }
    }

    /// Get the region as a mutable byte slice.
    ///
    /// Returns `None` while any other reference to the region exists.
    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        let inner = Arc::get_mut(&mut self.inner)?;
        // SAFETY: `get_mut` proved this is the only handle, and slab chunks are
        // claimed exclusively, so nothing else can reach these bytes.
        Some(unsafe { slice::from_raw_parts_mut(inner.ptr.as_ptr(), inner.len) })
    }

    /// Number of live references to this region
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether both handles refer to the same region
    pub fn ptr_eq(&self, other: &MemoryRegion) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether the region wraps a slab chunk rather than its own allocation
    pub fn is_preallocated(&self) -> bool {
        matches!(self.inner.backing, Backing::Slab { .. })
    }
}

impl fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("ptr", &self.inner.ptr)
            .field("len", &self.inner.len)
            .field("preallocated", &self.is_preallocated())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

impl AsRef<[u8]> for MemoryRegion {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Drop for RegionInner {
    fn drop(&mut self) {
        match &self.backing {
            Backing::Heap => {
                let raw = std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len);
                // SAFETY: ptr/len came from Box::into_raw in `from_vec` and this is
                // the last reference.
                drop(unsafe { Box::from_raw(raw) });
            }
            Backing::Slab { slab, chunk } => slab.release_chunk(*chunk),
        }
    }
}

// The raw pointer is owned by the region (heap) or by a claimed slab chunk.
unsafe impl Send for RegionInner {}
unsafe impl Sync for RegionInner {}
