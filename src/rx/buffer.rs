//! RX descriptors and the two ways a received buffer can be owned

use std::{fmt, sync::Arc};

use crate::memory::MemoryRegion;

use super::sink::BufferSink;

/// How the memory behind an RX descriptor is owned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RxMode {
    /// Shared region; the descriptor holds one reference for as long as it is queued
    External,
    /// Buffer lent by an acquisition module; goes back to its sink on return
    Polled,
}

impl RxMode {
    pub fn name(&self) -> &'static str {
        match self {
            RxMode::External => "external",
            RxMode::Polled => "polled",
        }
    }
}

/// The memory held by a filled RX descriptor.
///
/// Exactly one of the two is present, which is what ties the return action to
/// the mode the buffer was enqueued in.
pub enum RxOwnership {
    External(MemoryRegion),
    Polled {
        buffer: Box<[u8]>,
        sink: Arc<dyn BufferSink>,
    },
}

impl RxOwnership {
    pub fn mode(&self) -> RxMode {
        match self {
            RxOwnership::External(_) => RxMode::External,
            RxOwnership::Polled { .. } => RxMode::Polled,
        }
    }

    fn bytes(&self) -> &[u8] {
        match self {
            RxOwnership::External(region) => region.as_slice(),
            RxOwnership::Polled { buffer, .. } => buffer,
        }
    }
}

impl fmt::Debug for RxOwnership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RxOwnership::External(region) => f.debug_tuple("External").field(region).finish(),
            RxOwnership::Polled { buffer, .. } => f
                .debug_struct("Polled")
                .field("ptr", &buffer.as_ptr())
                .field("capacity", &buffer.len())
                .finish_non_exhaustive(),
        }
    }
}

/// A received buffer as offered to [`RxBufferQueue::enqueue`](super::RxBufferQueue::enqueue)
pub enum RxSource<'a> {
    /// A region the queue takes an additional reference on
    External(&'a MemoryRegion),
    /// A polled buffer holding `len` valid bytes, owed back to `sink`
    Polled {
        buffer: Box<[u8]>,
        len: usize,
        sink: Arc<dyn BufferSink>,
    },
}

impl RxSource<'_> {
    pub fn mode(&self) -> RxMode {
        match self {
            RxSource::External(_) => RxMode::External,
            RxSource::Polled { .. } => RxMode::Polled,
        }
    }
}

/// One RX descriptor.
///
/// Free descriptors hold nothing; a filled descriptor holds either a region
/// reference or a polled buffer, never both.
#[derive(Debug, Default)]
pub struct RxBuffer {
    source: Option<RxOwnership>,
    len: usize,
}

impl RxBuffer {
    /// Mode of the held buffer, `None` for an empty descriptor
    pub fn mode(&self) -> Option<RxMode> {
        self.source.as_ref().map(RxOwnership::mode)
    }

    /// Valid bytes in the held buffer
    pub fn len(&self) -> usize {
        if self.source.is_some() {
            self.len
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The received bytes
    pub fn data(&self) -> &[u8] {
        match &self.source {
            Some(source) => &source.bytes()[..self.len],
            None => &[],
        }
    }

    /// Start of the held buffer
    pub fn as_ptr(&self) -> Option<*const u8> {
        self.source.as_ref().map(|source| source.bytes().as_ptr())
    }

    pub fn ownership(&self) -> Option<&RxOwnership> {
        self.source.as_ref()
    }

    /// The shared region, for external buffers
    pub fn region(&self) -> Option<&MemoryRegion> {
        match &self.source {
            Some(RxOwnership::External(region)) => Some(region),
            _ => None,
        }
    }

    /// The owning sink, for polled buffers
    pub fn sink(&self) -> Option<&Arc<dyn BufferSink>> {
        match &self.source {
            Some(RxOwnership::Polled { sink, .. }) => Some(sink),
            _ => None,
        }
    }

    pub(crate) fn attach(&mut self, source: RxOwnership, len: usize) {
        debug_assert!(self.source.is_none(), "RX descriptor filled twice");
        debug_assert!(len <= source.bytes().len());
        self.source = Some(source);
        self.len = len;
    }

    /// Give up the held buffer the way its mode requires
    pub(crate) fn release(&mut self) -> Option<RxMode> {
        self.len = 0;
        let source = self.source.take()?;
        let mode = source.mode();
        match source {
            RxOwnership::External(region) => drop(region),
            RxOwnership::Polled { buffer, sink } => sink.put_back(buffer),
        }
        Some(mode)
    }
}
