//! Receive side: a bounded queue of received buffers in one of two ownership modes
//!
//! External buffers are shared regions the queue holds a reference on; polled
//! buffers are lent by an acquisition module and go back to its [`BufferSink`]
//! when the consumer returns them.

pub mod buffer;
pub mod config;
pub mod queue;
pub mod sink;

pub use buffer::{RxBuffer, RxMode, RxOwnership, RxSource};
pub use config::RxQueueConfig;
pub use queue::{RxBufferQueue, RxLease};
pub use sink::{BufferSink, ContinuousBufferSource};
