//! Reusable I/O request handles
//!
//! A request is created once per TX slot and recycled with [`IoRequest::reuse`]
//! after every completion instead of being reallocated.

use std::{any::Any, fmt, sync::Arc};

use crate::error::{BufferError, Result};

/// Completion status carried by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Completed successfully (also the status of a freshly reused request)
    Success,
    /// Submitted and waiting for the transport
    Pending,
    /// Cancelled before completion
    Cancelled,
    /// Failed with a transport specific code
    Failed(i32),
}

impl RequestStatus {
    /// Whether the status represents success
    pub fn is_success(&self) -> bool {
        matches!(self, RequestStatus::Success)
    }
}

/// Lifecycle stage of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Ready to be formatted and submitted
    Idle,
    /// Owned by the transport
    Submitted,
    /// Completed; must be reused before the next submission
    Completed,
}

/// Flags controlling how a request is reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReuseFlags {
    /// Reset status and counters only
    #[default]
    NoFlags,
    /// Also drop any attached context
    ClearContext,
}

/// Parameters for [`IoRequest::reuse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReuseParams {
    pub flags: ReuseFlags,
    pub status: RequestStatus,
}

impl Default for ReuseParams {
    fn default() -> Self {
        Self {
            flags: ReuseFlags::NoFlags,
            status: RequestStatus::Success,
        }
    }
}

/// A reusable transport request
pub struct IoRequest {
    id: u64,
    state: RequestState,
    status: RequestStatus,
    /// Bytes the transport reported as transferred
    information: usize,
    /// Bytes handed to the transport on the last submission
    submitted_length: usize,
    reuse_count: u64,
    context: Option<Arc<dyn Any + Send + Sync>>,
}

impl IoRequest {
    /// Create an idle request
    pub fn new(id: u64) -> Self {
        Self {
            id,
            state: RequestState::Idle,
            status: RequestStatus::Success,
            information: 0,
            submitted_length: 0,
            reuse_count: 0,
            context: None,
        }
    }

    /// Attach a context object to the request
    pub fn with_context(mut self, context: Arc<dyn Any + Send + Sync>) -> Self {
        self.context = Some(context);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn information(&self) -> usize {
        self.information
    }

    pub fn submitted_length(&self) -> usize {
        self.submitted_length
    }

    /// How many times the request has been recycled
    pub fn reuse_count(&self) -> u64 {
        self.reuse_count
    }

    pub fn context(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.context.as_ref()
    }

    /// Mark the request as handed to the transport with `length` bytes
    pub fn submit(&mut self, length: usize) -> Result<()> {
        if self.state != RequestState::Idle {
            return Err(BufferError::invalid_parameter(
                "request",
                format!("Request {} is {:?}, not idle", self.id, self.state),
            ));
        }
        self.state = RequestState::Submitted;
        self.status = RequestStatus::Pending;
        self.submitted_length = length;
        Ok(())
    }

    /// Record the transport's completion of the request
    pub fn complete(&mut self, status: RequestStatus, information: usize) {
        self.state = RequestState::Completed;
        self.status = status;
        self.information = information;
    }

    /// Return the request to a clean, resubmittable state
    pub fn reuse(&mut self, params: ReuseParams) {
        self.state = RequestState::Idle;
        self.status = params.status;
        self.information = 0;
        self.submitted_length = 0;
        self.reuse_count += 1;
        if params.flags == ReuseFlags::ClearContext {
            self.context = None;
        }
    }
}

impl fmt::Debug for IoRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoRequest")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("status", &self.status)
            .field("information", &self.information)
            .field("reuse_count", &self.reuse_count)
            .field("has_context", &self.context.is_some())
            .finish()
    }
}
