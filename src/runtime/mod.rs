//! Runtime backends for buffer storage
//!
//! This module defines the `Runtime` trait and the CPU implementation that
//! dense buffers (and therefore sparse containers) are generic over.
//!
//! # Architecture
//!
//! ```text
//! Runtime (backend identity)
//! ├── Device (placement identity of a buffer)
//! ├── Client (owns the allocator for a device)
//! └── Allocator (memory management, byte accounting)
//! ```

mod allocator;
mod traits;

#[cfg(feature = "cpu")]
pub mod cpu;

pub use allocator::{Allocator, DefaultAllocator};
pub use traits::{Device, Runtime, RuntimeClient};
