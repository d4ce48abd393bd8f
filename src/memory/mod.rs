//! Payload memory: reference-counted regions and pre-allocated slabs

pub mod config;
pub mod region;
pub(crate) mod residency;
pub mod slab;

pub use config::MemoryClass;
pub use region::MemoryRegion;
pub use slab::PayloadSlab;

pub(crate) use residency::ResidentRange;
