//! Page residency locking for non-paged pools

use std::io;

use log::{trace, warn};

/// A byte range locked resident with `mlock`; unlocked on drop
#[derive(Debug)]
pub(crate) struct ResidentRange {
    addr: usize,
    len: usize,
}

impl ResidentRange {
    /// Try to lock `len` bytes at `ptr` resident.
    ///
    /// Locking is best effort: a refusal (typically `RLIMIT_MEMLOCK`) is logged
    /// and `None` is returned, leaving the memory usable but pageable.
    pub(crate) fn lock(ptr: *const u8, len: usize, owner: &str) -> Option<Self> {
        if len == 0 {
            return None;
        }

        match lock_pages(ptr, len) {
            Ok(()) => {
                trace!("{}: locked {} bytes resident", owner, len);
                Some(Self {
                    addr: ptr as usize,
                    len,
                })
            }
            Err(e) => {
                warn!(
                    "{}: could not lock {} bytes resident, continuing pageable: {}",
                    owner, len, e
                );
                None
            }
        }
    }

    /// Number of bytes held resident
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl Drop for ResidentRange {
    fn drop(&mut self) {
        unlock_pages(self.addr as *const u8, self.len);
    }
}

#[cfg(unix)]
fn lock_pages(ptr: *const u8, len: usize) -> io::Result<()> {
    // SAFETY: mlock only changes residency of the pages covering the range; it
    // never reads or writes through the pointer.
    let rc = unsafe { libc::mlock(ptr as *const libc::c_void, len) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn unlock_pages(ptr: *const u8, len: usize) {
    // SAFETY: the range was locked by `lock_pages` and is still mapped; owners
    // drop the guard before releasing the memory.
    unsafe {
        libc::munlock(ptr as *const libc::c_void, len);
    }
}

#[cfg(not(unix))]
fn lock_pages(_ptr: *const u8, _len: usize) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "resident locking unsupported on this platform",
    ))
}

#[cfg(not(unix))]
fn unlock_pages(_ptr: *const u8, _len: usize) {}
