//! Memory allocator traits and default implementation
//!
//! The Allocator trait is the single entry point through which a buffer
//! requests memory explicitly (see `DenseTensor::allocate_from`).

use crate::error::Result;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Memory allocator trait for runtime backends
///
/// An allocator is bound to one device; memory it hands out resides on that
/// device and must be returned through [`Allocator::deallocate`].
pub trait Allocator: Clone + Send + Sync {
    /// Device the allocator hands out memory on
    type Device;

    /// Get the device this allocator is associated with
    fn device(&self) -> &Self::Device;

    /// Allocate memory of given size
    ///
    /// Returns a device pointer (u64); zero-byte requests return `0`.
    fn allocate(&self, size_bytes: usize) -> Result<u64>;

    /// Deallocate memory
    fn deallocate(&self, ptr: u64, size_bytes: usize);

    /// Get the total live allocated bytes
    fn allocated_bytes(&self) -> usize {
        0 // Default: tracking not supported
    }
}

/// Default allocator that delegates to plain allocation functions
///
/// Clones share one byte counter, so `allocated_bytes` reports the live total
/// across every handle derived from the same allocator.
#[derive(Clone)]
pub struct DefaultAllocator<D> {
    device: D,
    allocate_fn: fn(usize, &D) -> Result<u64>,
    deallocate_fn: fn(u64, usize, &D),
    live_bytes: Arc<AtomicUsize>,
}

impl<D: Clone + Send + Sync> DefaultAllocator<D> {
    /// Create a new default allocator
    pub fn new(
        device: D,
        allocate_fn: fn(usize, &D) -> Result<u64>,
        deallocate_fn: fn(u64, usize, &D),
    ) -> Self {
        Self {
            device,
            allocate_fn,
            deallocate_fn,
            live_bytes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<D: Clone + Send + Sync> Allocator for DefaultAllocator<D> {
    type Device = D;

    fn device(&self) -> &D {
        &self.device
    }

    fn allocate(&self, size_bytes: usize) -> Result<u64> {
        let ptr = (self.allocate_fn)(size_bytes, &self.device)?;
        self.live_bytes.fetch_add(size_bytes, Ordering::Relaxed);
        Ok(ptr)
    }

    fn deallocate(&self, ptr: u64, size_bytes: usize) {
        (self.deallocate_fn)(ptr, size_bytes, &self.device);
        self.live_bytes.fetch_sub(size_bytes, Ordering::Relaxed);
    }

    fn allocated_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Relaxed)
    }
}

impl<D: fmt::Debug> fmt::Debug for DefaultAllocator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultAllocator")
            .field("device", &self.device)
            .field("live_bytes", &self.live_bytes.load(Ordering::Relaxed))
            .finish()
    }
}
