//! Return path for polled receive buffers

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_queue::ArrayQueue;
use log::warn;

/// The acquisition module a polled receive buffer belongs to.
///
/// The RX queue never owns polled memory: it holds the buffer only between
/// enqueue and return, then hands it back here so the module can resubmit it.
pub trait BufferSink: Send + Sync {
    /// Take back a buffer previously handed to an RX queue
    fn put_back(&self, buffer: Box<[u8]>);
}

impl<F> BufferSink for F
where
    F: Fn(Box<[u8]>) + Send + Sync,
{
    fn put_back(&self, buffer: Box<[u8]>) {
        self(buffer)
    }
}

/// A continuously repolled set of receive buffers.
///
/// Buffers are allocated once; `take` lends one out for a read and `put_back`
/// makes it available for the next read.
#[derive(Debug)]
pub struct ContinuousBufferSource {
    name: String,
    buffer_size: usize,
    buffers: ArrayQueue<Box<[u8]>>,
    put_backs: AtomicU64,
}

impl ContinuousBufferSource {
    /// Pre-allocate `buffer_count` buffers of `buffer_size` bytes
    pub fn new(name: impl Into<String>, buffer_count: usize, buffer_size: usize) -> Self {
        let buffers = ArrayQueue::new(buffer_count.max(1));
        for _ in 0..buffer_count {
            // Capacity matches the loop count.
            let _ = buffers.push(vec![0u8; buffer_size].into_boxed_slice());
        }

        Self {
            name: name.into(),
            buffer_size,
            buffers,
            put_backs: AtomicU64::new(0),
        }
    }

    /// Lend out the next idle buffer
    pub fn take(&self) -> Option<Box<[u8]>> {
        self.buffers.pop()
    }

    /// Idle buffers
    pub fn available(&self) -> usize {
        self.buffers.len()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of buffers handed back so far
    pub fn put_backs(&self) -> u64 {
        self.put_backs.load(Ordering::Relaxed)
    }
}

impl BufferSink for ContinuousBufferSource {
    fn put_back(&self, buffer: Box<[u8]>) {
        self.put_backs.fetch_add(1, Ordering::Relaxed);
        if let Err(buffer) = self.buffers.push(buffer) {
            warn!(
                "{}: put back a {} byte buffer it never lent out, dropping it",
                self.name,
                buffer.len()
            );
        }
    }
}
