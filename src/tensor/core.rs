//! Core DenseTensor type

use super::shape::{Shape, elem_count};
use super::storage::Storage;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::fmt;

/// N-dimensional dense buffer stored on a compute device
///
/// `DenseTensor` consists of:
/// - **Storage**: optional reference-counted device memory
/// - **Shape**: the logical extent along each dimension
/// - **DType**: element type, `None` while undefined
///
/// A buffer is *initialized* once it holds storage (even zero-byte
/// storage). Shape and dtype can be set before any memory exists, which is
/// how placeholder buffers are described.
///
/// # Shared Ownership
///
/// Cloning a `DenseTensor` clones the storage handle, not the payload.
/// Writes through [`DenseTensor::copy_from_slice`] are visible through every
/// clone that still shares the storage.
///
/// # Lazy Resize
///
/// [`DenseTensor::resize`] only changes the shape. Storage is (re)acquired
/// by the next [`DenseTensor::allocate_from`] or
/// [`DenseTensor::ensure_allocated`] call when the existing capacity is too
/// small; the contents of any grown region are unspecified.
pub struct DenseTensor<R: Runtime> {
    storage: Option<Storage<R>>,
    shape: Shape,
    dtype: Option<DType>,
}

impl<R: Runtime> DenseTensor<R> {
    /// Create an uninitialized buffer: no storage, empty shape, undefined dtype
    pub fn new() -> Self {
        Self {
            storage: None,
            shape: Shape::new(),
            dtype: None,
        }
    }

    /// Describe a buffer without allocating memory for it
    pub fn placeholder(shape: &[usize], dtype: DType) -> Self {
        Self {
            storage: None,
            shape: shape.iter().copied().collect(),
            dtype: Some(dtype),
        }
    }

    /// Create a buffer from a slice of host data
    ///
    /// Returns an error if `data.len()` does not equal the product of the
    /// `shape` dimensions, or if memory allocation fails.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let t = DenseTensor::<CpuRuntime>::from_slice(&[0i64, 2, 3], &[3], &device)?;
    /// ```
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize], device: &R::Device) -> Result<Self> {
        let expected_len = elem_count(shape);
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }

        let storage = Storage::from_bytes(bytemuck::cast_slice(data), device)?;

        Ok(Self {
            storage: Some(storage),
            shape: shape.iter().copied().collect(),
            dtype: Some(T::DTYPE),
        })
    }

    /// Create a buffer with allocated, unspecified contents
    pub fn empty(shape: &[usize], dtype: DType, device: &R::Device) -> Result<Self> {
        let size_bytes = byte_size(shape, dtype)?;
        let storage = Storage::new(size_bytes, device)?;

        Ok(Self {
            storage: Some(storage),
            shape: shape.iter().copied().collect(),
            dtype: Some(dtype),
        })
    }

    // ===== Accessors =====

    /// Check whether the buffer holds storage
    #[inline]
    pub fn initialized(&self) -> bool {
        self.storage.is_some()
    }

    /// Check whether the dtype is defined
    #[inline]
    pub fn valid(&self) -> bool {
        self.dtype.is_some()
    }

    /// Get the placement of the buffer, `None` while uninitialized
    #[inline]
    pub fn place(&self) -> Option<&R::Device> {
        self.storage.as_ref().map(Storage::device)
    }

    /// Get the storage handle
    #[inline]
    pub fn storage(&self) -> Option<&Storage<R>> {
        self.storage.as_ref()
    }

    /// Get the shape
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.shape
    }

    /// Get the number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        elem_count(&self.shape)
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> Option<DType> {
        self.dtype
    }

    /// Bytes currently held by the storage (0 while uninitialized)
    #[inline]
    pub fn capacity_bytes(&self) -> usize {
        self.storage.as_ref().map_or(0, Storage::size_in_bytes)
    }

    /// Bytes the current shape and dtype require
    pub fn required_bytes(&self) -> Result<usize> {
        let dtype = self
            .dtype
            .ok_or(Error::UndefinedDType { op: "required_bytes" })?;
        byte_size(&self.shape, dtype)
    }

    /// Check if two buffers share one allocation
    pub fn shares_storage(&self, other: &Self) -> bool {
        match (&self.storage, &other.storage) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    // ===== Mutation =====

    /// Change the shape without touching storage
    pub fn resize(&mut self, dims: &[usize]) {
        self.shape = dims.iter().copied().collect();
    }

    /// Set the element type without touching storage
    pub fn set_dtype(&mut self, dtype: DType) {
        self.dtype = Some(dtype);
    }

    /// Allocate backing memory through an explicit allocator
    ///
    /// Sets the dtype to `dtype`, then computes the byte size the current
    /// shape needs. With `fake_alloc` the size is forced to zero, which binds
    /// zero-byte storage on the allocator's device without committing memory.
    /// Otherwise a non-zero `requested_size` must be at least the computed
    /// size and replaces it.
    ///
    /// Storage is only replaced when none exists or the existing capacity is
    /// smaller than the size; otherwise the current handle is reused.
    ///
    /// Returns the raw device handle (`0` for zero-byte storage).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the byte size of the shape overflows or
    /// `requested_size` is too small. Nothing is changed on error.
    pub fn allocate_from(
        &mut self,
        allocator: &R::Allocator,
        dtype: DType,
        requested_size: usize,
        fake_alloc: bool,
    ) -> Result<u64> {
        let bytes = if fake_alloc {
            0
        } else {
            let required = byte_size(&self.shape, dtype)?;
            if requested_size == 0 {
                required
            } else if requested_size < required {
                return Err(Error::invalid_argument(
                    "requested_size",
                    format!(
                        "requested {requested_size} bytes but shape {:?} of {dtype} needs {required}",
                        self.dims()
                    ),
                ));
            } else {
                requested_size
            }
        };

        if self.dtype != Some(dtype) {
            tracing::trace!(from = ?self.dtype, to = %dtype, "buffer dtype rebound");
            self.dtype = Some(dtype);
        }

        if self.capacity_bytes() < bytes || self.storage.is_none() {
            tracing::debug!(bytes, fake_alloc, "buffer storage acquired from allocator");
            self.storage = Some(Storage::from_allocator(allocator, bytes)?);
        }

        Ok(self.storage.as_ref().map_or(0, Storage::ptr))
    }

    /// Make sure storage on `device` covers the current shape and dtype
    ///
    /// Existing storage that is large enough is kept; otherwise fresh storage
    /// is allocated on the buffer's current placement (or `device` when the
    /// buffer is uninitialized). No data is migrated.
    pub fn ensure_allocated(&mut self, device: &R::Device) -> Result<u64> {
        let bytes = self.required_bytes()?;
        if self.storage.is_none() || self.capacity_bytes() < bytes {
            let place = self.place().cloned().unwrap_or_else(|| device.clone());
            tracing::debug!(bytes, "buffer storage reallocated");
            self.storage = Some(Storage::new(bytes, &place)?);
        }
        Ok(self.storage.as_ref().map_or(0, Storage::ptr))
    }

    // ===== Host transfer =====

    /// Copy the buffer contents to a host vector
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        let storage = self.typed_storage::<T>()?;
        let mut result = vec![T::zeroed(); self.numel()];
        storage.read_bytes(bytemuck::cast_slice_mut(&mut result))?;
        Ok(result)
    }

    /// Overwrite the buffer contents from a host slice
    ///
    /// Takes `&self`: the write lands in shared storage and is visible through
    /// every clone of this buffer. Concurrent transfers on the same storage
    /// are serialized by the storage lock; ordering between writers is up to
    /// the caller.
    pub fn copy_from_slice<T: Element>(&self, data: &[T]) -> Result<()> {
        if data.len() != self.numel() {
            return Err(Error::shape_mismatch(self.dims(), &[data.len()]));
        }
        let storage = self.typed_storage::<T>()?;
        storage.write_bytes(bytemuck::cast_slice(data))
    }

    fn typed_storage<T: Element>(&self) -> Result<&Storage<R>> {
        let dtype = self.dtype.ok_or(Error::UndefinedDType { op: "host transfer" })?;
        if dtype != T::DTYPE {
            return Err(Error::DTypeMismatch {
                lhs: dtype,
                rhs: T::DTYPE,
            });
        }
        let required = byte_size(&self.shape, dtype)?;
        match &self.storage {
            Some(storage) if storage.size_in_bytes() >= required => Ok(storage),
            _ => Err(Error::NotAllocated {
                required,
                available: self.capacity_bytes(),
            }),
        }
    }
}

/// Bytes occupied by `shape` elements of `dtype`
fn byte_size(shape: &[usize], dtype: DType) -> Result<usize> {
    shape
        .iter()
        .try_fold(dtype.size_in_bytes(), |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            Error::invalid_argument("shape", format!("{shape:?} of {dtype} overflows usize bytes"))
        })
}

impl<R: Runtime> Default for DenseTensor<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Runtime> Clone for DenseTensor<R> {
    /// Clone shares the storage handle (zero-copy)
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            shape: self.shape.clone(),
            dtype: self.dtype,
        }
    }
}

impl<R: Runtime> fmt::Debug for DenseTensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenseTensor")
            .field("shape", &self.dims())
            .field("dtype", &self.dtype)
            .field("storage", &self.storage)
            .finish()
    }
}
