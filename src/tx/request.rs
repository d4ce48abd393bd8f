//! TX buffer/request descriptors

use crate::{
    error::{BufferError, Result},
    memory::MemoryRegion,
    request::{IoRequest, ReuseParams},
};

/// Per-transfer counters kept alongside a TX request; zeroed on every return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Datagrams packed into the transfer
    pub datagrams: u32,
    /// Datagram payload bytes
    pub payload_bytes: u64,
    /// Alignment padding bytes
    pub padding_bytes: u32,
    /// Submissions of this transfer, including retries
    pub submissions: u32,
}

impl TransferStats {
    /// Account one datagram of `len` bytes plus `padding`; counters saturate
    pub fn record_datagram(&mut self, len: usize, padding: usize) {
        self.datagrams = self.datagrams.saturating_add(1);
        self.payload_bytes = self
            .payload_bytes
            .saturating_add(u64::try_from(len).unwrap_or(u64::MAX));
        self.padding_bytes = self
            .padding_bytes
            .saturating_add(u32::try_from(padding).unwrap_or(u32::MAX));
    }

    /// Whether every counter is zero
    pub fn is_zeroed(&self) -> bool {
        *self == Self::default()
    }
}

/// A pre-allocated transmit buffer paired with its reusable request
#[derive(Debug)]
pub struct TxBufferRequest {
    buffer: MemoryRegion,
    buffer_length: usize,
    request: IoRequest,
    transfer_length: usize,
    stats: TransferStats,
}

impl TxBufferRequest {
    pub(crate) fn new(buffer: MemoryRegion, request: IoRequest) -> Self {
        Self {
            buffer_length: buffer.len(),
            buffer,
            request,
            transfer_length: 0,
            stats: TransferStats::default(),
        }
    }

    /// Region wrapping the payload buffer
    pub fn buffer(&self) -> &MemoryRegion {
        &self.buffer
    }

    /// Capacity of the payload buffer
    pub fn buffer_length(&self) -> usize {
        self.buffer_length
    }

    pub fn request(&self) -> &IoRequest {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut IoRequest {
        &mut self.request
    }

    /// Bytes of the payload that make up the pending transfer
    pub fn transfer_length(&self) -> usize {
        self.transfer_length
    }

    /// Set the transfer length; it cannot exceed the buffer
    pub fn set_transfer_length(&mut self, length: usize) -> Result<()> {
        if length > self.buffer_length {
            return Err(BufferError::invalid_parameter(
                "transfer_length",
                format!(
                    "Transfer of {} bytes exceeds {} byte buffer",
                    length, self.buffer_length
                ),
            ));
        }
        self.transfer_length = length;
        Ok(())
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut TransferStats {
        &mut self.stats
    }

    /// The whole payload buffer
    pub fn payload(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// The whole payload buffer, writable.
    ///
    /// Fails while someone else holds a reference to the buffer region.
    pub fn payload_mut(&mut self) -> Result<&mut [u8]> {
        let references = self.buffer.ref_count();
        self.buffer
            .as_mut_slice()
            .ok_or_else(|| BufferError::RegionShared { references })
    }

    /// The bytes covered by the transfer length
    pub fn transfer_bytes(&self) -> &[u8] {
        &self.buffer.as_slice()[..self.transfer_length]
    }

    /// Copy `data` into the buffer and set the transfer length to its size
    pub fn fill(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.buffer_length {
            return Err(BufferError::invalid_parameter(
                "data",
                format!(
                    "{} bytes do not fit a {} byte buffer",
                    data.len(),
                    self.buffer_length
                ),
            ));
        }
        self.payload_mut()?[..data.len()].copy_from_slice(data);
        self.transfer_length = data.len();
        Ok(())
    }

    /// Reset transient state before the slot goes back to the pool
    pub(crate) fn reset(&mut self) {
        self.request.reuse(ReuseParams::default());
        self.transfer_length = 0;
        self.stats = TransferStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{RequestState, RequestStatus};

    fn request(len: usize) -> TxBufferRequest {
        TxBufferRequest::new(MemoryRegion::allocate(len), IoRequest::new(0))
    }

    #[test]
    fn test_fill_and_reset() {
        let mut tx = request(16);
        tx.fill(b"hello").unwrap();
        tx.stats_mut().record_datagram(5, 3);
        tx.request_mut().submit(5).unwrap();
        tx.request_mut().complete(RequestStatus::Success, 5);
        assert_eq!(tx.transfer_bytes(), b"hello");

        tx.reset();
        assert_eq!(tx.transfer_length(), 0);
        assert!(tx.stats().is_zeroed());
        assert_eq!(tx.request().state(), RequestState::Idle);
        assert_eq!(tx.request().reuse_count(), 1);
        assert_eq!(tx.buffer_length(), 16);
    }

    #[test]
    fn test_datagram_counters_saturate() {
        let mut stats = TransferStats::default();
        stats.record_datagram(100, usize::MAX);
        assert_eq!(stats.padding_bytes, u32::MAX);

        stats.record_datagram(100, 7);
        assert_eq!(stats.padding_bytes, u32::MAX);
        assert_eq!(stats.payload_bytes, 200);

        stats.datagrams = u32::MAX;
        stats.record_datagram(1, 0);
        assert_eq!(stats.datagrams, u32::MAX);
    }

    #[test]
    fn test_transfer_length_bounded_by_buffer() {
        let mut tx = request(8);
        assert!(tx.set_transfer_length(9).is_err());
        assert!(tx.fill(&[0u8; 9]).is_err());
        assert!(tx.set_transfer_length(8).is_ok());
    }

    #[test]
    fn test_shared_buffer_is_read_only() {
        let mut tx = request(8);
        let held_by_transport = tx.buffer().clone();
        assert!(matches!(
            tx.payload_mut(),
            Err(BufferError::RegionShared { references: 2 })
        ));
        drop(held_by_transport);
        assert!(tx.payload_mut().is_ok());
    }
}
