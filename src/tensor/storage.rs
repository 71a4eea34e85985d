//! Storage: device memory management with Arc-based sharing

use crate::error::{Error, Result};
use crate::runtime::{Allocator, Runtime};
use parking_lot::RwLock;
use std::sync::Arc;

/// Storage for buffer data on a device
///
/// Storage wraps device memory with reference counting. Cloning a storage
/// handle never copies the payload: every clone addresses the same bytes,
/// and memory is released when the last handle is dropped.
///
/// Storage is untyped; the element type and logical shape belong to the
/// [`DenseTensor`](super::DenseTensor) that owns the handle.
///
/// Host transfers through [`Storage::read_bytes`] and [`Storage::write_bytes`]
/// are serialized by a per-allocation reader/writer lock, so handles on
/// different threads never observe a torn copy.
pub struct Storage<R: Runtime> {
    inner: Arc<StorageInner<R>>,
}

struct StorageInner<R: Runtime> {
    /// Raw device pointer (GPU address or CPU ptr cast to u64)
    ptr: u64,
    /// Capacity in bytes
    size_bytes: usize,
    /// Device where memory is allocated
    device: R::Device,
    /// How the memory is given back on drop
    release: Release<R>,
    /// Guards host reads and writes of the payload
    io: RwLock<()>,
}

enum Release<R: Runtime> {
    /// Allocated through `R::allocate`
    Runtime,
    /// Allocated through an explicit allocator
    Allocator(R::Allocator),
}

impl<R: Runtime> Storage<R> {
    /// Create new storage with `size_bytes` of allocated memory
    pub fn new(size_bytes: usize, device: &R::Device) -> Result<Self> {
        let ptr = R::allocate(size_bytes, device)?;
        tracing::trace!(runtime = R::name(), size_bytes, "storage allocated");

        Ok(Self::wrap(ptr, size_bytes, device.clone(), Release::Runtime))
    }

    /// Create storage from raw bytes, copying them to the device
    pub fn from_bytes(data: &[u8], device: &R::Device) -> Result<Self> {
        let storage = Self::new(data.len(), device)?;
        R::copy_to_device(data, storage.ptr(), device)?;
        Ok(storage)
    }

    /// Create storage through an explicit allocator
    ///
    /// The storage resides on the allocator's device and is returned to the
    /// same allocator when the last handle is dropped.
    pub fn from_allocator(allocator: &R::Allocator, size_bytes: usize) -> Result<Self> {
        let ptr = allocator.allocate(size_bytes)?;
        tracing::trace!(runtime = R::name(), size_bytes, "storage allocated from allocator");

        Ok(Self::wrap(
            ptr,
            size_bytes,
            allocator.device().clone(),
            Release::Allocator(allocator.clone()),
        ))
    }

    fn wrap(ptr: u64, size_bytes: usize, device: R::Device, release: Release<R>) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                ptr,
                size_bytes,
                device,
                release,
                io: RwLock::new(()),
            }),
        }
    }

    /// Get the raw device pointer
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.inner.ptr
    }

    /// Get the capacity in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.inner.size_bytes
    }

    /// Check if storage holds zero bytes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.size_bytes == 0
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &R::Device {
        &self.inner.device
    }

    /// Get the reference count
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Check if this is the only reference
    #[inline]
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }

    /// Check if two handles address the same allocation
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copy the first `dst.len()` bytes from device to host
    pub fn read_bytes(&self, dst: &mut [u8]) -> Result<()> {
        self.check_capacity(dst.len())?;
        let _guard = self.inner.io.read();
        R::copy_from_device(self.inner.ptr, dst, &self.inner.device)
    }

    /// Overwrite the first `src.len()` bytes on the device
    ///
    /// The write is visible through every handle sharing this storage.
    pub fn write_bytes(&self, src: &[u8]) -> Result<()> {
        self.check_capacity(src.len())?;
        let _guard = self.inner.io.write();
        R::copy_to_device(src, self.inner.ptr, &self.inner.device)
    }

    fn check_capacity(&self, required: usize) -> Result<()> {
        if required > self.inner.size_bytes {
            return Err(Error::NotAllocated {
                required,
                available: self.inner.size_bytes,
            });
        }
        Ok(())
    }
}

impl<R: Runtime> Clone for Storage<R> {
    /// Clone increments the reference count (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Runtime> Drop for StorageInner<R> {
    fn drop(&mut self) {
        if self.ptr == 0 {
            return;
        }
        match &self.release {
            Release::Runtime => R::deallocate(self.ptr, self.size_bytes, &self.device),
            Release::Allocator(allocator) => allocator.deallocate(self.ptr, self.size_bytes),
        }
    }
}

impl<R: Runtime> std::fmt::Debug for Storage<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("ptr", &format!("0x{:x}", self.inner.ptr))
            .field("size_bytes", &self.inner.size_bytes)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}

#[cfg(all(test, feature = "cpu"))]
mod tests {
    use super::*;
    use crate::runtime::RuntimeClient;
    use crate::runtime::cpu::{CpuDevice, CpuRuntime};

    #[test]
    fn test_clone_shares_allocation() {
        let device = CpuDevice::new();
        let a = Storage::<CpuRuntime>::from_bytes(&[1, 2, 3, 4], &device).unwrap();
        let b = a.clone();

        assert!(a.ptr_eq(&b));
        assert_eq!(a.ref_count(), 2);

        b.write_bytes(&[9, 9]).unwrap();
        let mut out = [0u8; 4];
        a.read_bytes(&mut out).unwrap();
        assert_eq!(out, [9, 9, 3, 4]);

        drop(b);
        assert!(a.is_unique());
    }

    #[test]
    fn test_concurrent_writes_and_reads_are_whole() {
        let device = CpuDevice::new();
        let storage = Storage::<CpuRuntime>::new(4096, &device).unwrap();

        let writers: Vec<_> = [0x11u8, 0x22]
            .into_iter()
            .map(|fill| {
                let handle = storage.clone();
                std::thread::spawn(move || {
                    let payload = vec![fill; 4096];
                    for _ in 0..200 {
                        handle.write_bytes(&payload).unwrap();
                    }
                })
            })
            .collect();

        let reader = storage.clone();
        let observer = std::thread::spawn(move || {
            let mut out = vec![0u8; 4096];
            for _ in 0..200 {
                reader.read_bytes(&mut out).unwrap();
                assert!(out.iter().all(|&b| b == out[0]), "torn read");
            }
        });

        for w in writers {
            w.join().unwrap();
        }
        observer.join().unwrap();
    }

    #[test]
    fn test_read_past_capacity_fails() {
        let device = CpuDevice::new();
        let s = Storage::<CpuRuntime>::new(2, &device).unwrap();
        let mut out = [0u8; 3];
        assert!(matches!(
            s.read_bytes(&mut out),
            Err(Error::NotAllocated {
                required: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn test_allocator_storage_released_on_drop() {
        let device = CpuDevice::new();
        let client = CpuRuntime::default_client(&device);
        let allocator = client.allocator();

        let s = Storage::<CpuRuntime>::from_allocator(allocator, 64).unwrap();
        assert_eq!(allocator.allocated_bytes(), 64);
        let alias = s.clone();
        drop(s);
        assert_eq!(allocator.allocated_bytes(), 64);
        drop(alias);
        assert_eq!(allocator.allocated_bytes(), 0);
    }
}
