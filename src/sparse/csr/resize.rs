//! Physical buffer sizing: resize and explicit allocation

use super::check::{reject, row_offsets_len};
use super::core::SparseCsrTensor;
use crate::dtype::DType;
use crate::error::Result;
use crate::runtime::Runtime;

impl<R: Runtime> SparseCsrTensor<R> {
    /// Reshape the three component buffers for a new shape and stored count
    ///
    /// `row_offsets` is resized to the length `dense_dims` implies (`rows + 1`,
    /// or `batch * (rows + 1)` when `dense_dims` has rank 3); `column_indices`
    /// and `values` are resized to `[nnz]`.
    ///
    /// `meta.dims` is deliberately left unchanged: physical sizing and the
    /// logical shape are committed separately (see [`Self::set_dims`]).
    /// No data is migrated; grown regions have unspecified contents once
    /// storage is acquired for them.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the tensor was never initialized, if
    /// `dense_dims` has a rank other than 2 or 3, or if an extent is negative.
    /// The tensor is unchanged on error.
    pub fn resize(&mut self, dense_dims: &[i64], nnz: usize) -> Result<()> {
        if !self.initialized() {
            return Err(reject(
                "self",
                "the SparseCsrTensor must be initialized when calling resize".to_string(),
            ));
        }
        let offsets_len = row_offsets_len(dense_dims)?;

        tracing::debug!(
            ?dense_dims,
            row_offsets_len = offsets_len,
            nnz,
            "csr buffers resized"
        );
        self.row_offsets.resize(&[offsets_len]);
        self.column_indices.resize(&[nnz]);
        self.values.resize(&[nnz]);
        Ok(())
    }

    /// Allocate the values buffer through an explicit allocator
    ///
    /// Delegates to [`DenseTensor::allocate_from`](crate::tensor::DenseTensor::allocate_from)
    /// on `values`; `row_offsets` and `column_indices` are never touched.
    /// With `fake_alloc` no memory is committed and the null handle is
    /// returned, which is enough to probe sizes.
    pub fn allocate_from(
        &mut self,
        allocator: &R::Allocator,
        dtype: DType,
        requested_size: usize,
        fake_alloc: bool,
    ) -> Result<u64> {
        self.values
            .allocate_from(allocator, dtype, requested_size, fake_alloc)
    }

    /// Acquire storage for every component buffer that outgrew its capacity
    ///
    /// Intended after [`Self::resize`]: buffers keep their placement, and
    /// uninitialized ones are placed on `device`. Index buffers without a
    /// dtype default to [`DType::I64`].
    pub fn ensure_allocated(&mut self, device: &R::Device) -> Result<()> {
        for buffer in [&mut self.row_offsets, &mut self.column_indices] {
            if buffer.dtype().is_none() {
                buffer.set_dtype(DType::default_index());
            }
        }
        if let (None, Some(dtype)) = (self.values.dtype(), self.meta.dtype) {
            self.values.set_dtype(dtype);
        }

        self.row_offsets.ensure_allocated(device)?;
        self.column_indices.ensure_allocated(device)?;
        self.values.ensure_allocated(device)?;
        Ok(())
    }
}
