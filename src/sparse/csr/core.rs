//! Core CSR implementation: struct, creation, member and metadata binding

use super::check::{check_members, check_shape, reject};
use crate::dtype::{DType, Element};
use crate::error::Result;
use crate::runtime::Runtime;
use crate::sparse::meta::{Dims, SparseTensorMeta};
use crate::tensor::{DataLayout, DenseTensor};

/// Number of block dimensions per stored element
///
/// Block-sparse layouts (BSR/BSC) are not implemented, so every stored
/// element is a scalar or a dense tail, never a block.
const BLOCK_DIM: i32 = 0;

/// CSR (Compressed Sparse Row) tensor of rank 2 or 3
///
/// Holds three dense component buffers and a metadata record:
///
/// - `row_offsets`: offsets into `column_indices`/`values`; `rows + 1`
///   entries for `[rows, cols]`, `batch * (rows + 1)` for `[batch, rows, cols]`
/// - `column_indices`: column of each stored element
/// - `values`: value of each stored element; its dtype is the tensor's dtype
///
/// Cloning shares the three buffers (reference counted) and copies the
/// metadata by value, so buffer writes through one clone are visible through
/// the other while metadata changes stay local.
///
/// # Metadata binding
///
/// [`SparseCsrTensor::set_meta`] binds metadata once: it only succeeds while
/// the current record is invalid. [`SparseCsrTensor::sync_meta`] copies a
/// valid record field by field at any time.
///
/// # Resize
///
/// [`SparseCsrTensor::resize`] reshapes the physical buffers only and leaves
/// `meta.dims` untouched. Callers commit the logical shape separately with
/// [`SparseCsrTensor::set_dims`] or [`SparseCsrTensor::sync_meta`].
pub struct SparseCsrTensor<R: Runtime> {
    pub(crate) row_offsets: DenseTensor<R>,
    pub(crate) column_indices: DenseTensor<R>,
    pub(crate) values: DenseTensor<R>,
    pub(crate) meta: SparseTensorMeta,
}

impl<R: Runtime> SparseCsrTensor<R> {
    /// Create an empty tensor: three uninitialized buffers, invalid metadata
    pub fn empty() -> Self {
        Self {
            row_offsets: DenseTensor::new(),
            column_indices: DenseTensor::new(),
            values: DenseTensor::new(),
            meta: SparseTensorMeta::default(),
        }
    }

    /// Create a CSR tensor from components
    ///
    /// # Arguments
    ///
    /// * `row_offsets` - Row offsets (see type docs for the expected length)
    /// * `column_indices` - Column index of each stored element
    /// * `values` - Value of each stored element
    /// * `dims` - Logical shape, `[rows, cols]` or `[batch, rows, cols]`
    ///
    /// When `row_offsets` is uninitialized the tensor is a placeholder and
    /// only the rank of `dims` is checked; otherwise the three buffers must
    /// also share one placement.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if:
    /// - `dims` has a rank other than 2 or 3
    /// - `row_offsets` is initialized and the buffers' placements differ
    pub fn new(
        row_offsets: DenseTensor<R>,
        column_indices: DenseTensor<R>,
        values: DenseTensor<R>,
        dims: &[i64],
    ) -> Result<Self> {
        if row_offsets.initialized() {
            check_members(&row_offsets, &column_indices, &values, dims)?;
        } else {
            check_shape(dims)?;
        }

        let meta = SparseTensorMeta {
            dims: Dims::from_slice(dims),
            dtype: values.dtype(),
            layout: Some(DataLayout::RowMajor),
        };

        Ok(Self {
            row_offsets,
            column_indices,
            values,
            meta,
        })
    }

    /// Create a CSR tensor from host slices
    ///
    /// # Arguments
    ///
    /// * `row_offsets` - Row offsets
    /// * `column_indices` - Column indices
    /// * `values` - Stored values
    /// * `dims` - Logical shape, `[rows, cols]` or `[batch, rows, cols]`
    /// * `device` - Target device
    ///
    /// Only the structural checks of [`SparseCsrTensor::new`] apply; offsets
    /// and indices are not inspected.
    pub fn from_slices<T: Element>(
        row_offsets: &[i64],
        column_indices: &[i64],
        values: &[T],
        dims: &[i64],
        device: &R::Device,
    ) -> Result<Self> {
        let row_offsets = DenseTensor::from_slice(row_offsets, &[row_offsets.len()], device)?;
        let column_indices =
            DenseTensor::from_slice(column_indices, &[column_indices.len()], device)?;
        let values = DenseTensor::from_slice(values, &[values.len()], device)?;

        Self::new(row_offsets, column_indices, values, dims)
    }

    /// Copy-assign from another tensor
    ///
    /// Shares `other`'s three buffers and copies its metadata through
    /// [`SparseCsrTensor::sync_meta`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `other`'s metadata is invalid; `self` is
    /// left unchanged.
    pub fn assign(&mut self, other: &Self) -> Result<()> {
        if !other.meta.valid() {
            return Err(reject(
                "other",
                "input meta is invalid, please check the meta attribute".to_string(),
            ));
        }
        self.row_offsets = other.row_offsets.clone();
        self.column_indices = other.column_indices.clone();
        self.values = other.values.clone();
        self.sync_meta(&other.meta)
    }

    /// Replace the three buffers and the logical shape
    ///
    /// Runs the rank and placement checks on the new buffers; dtype and
    /// layout are left as they are.
    pub fn set_member(
        &mut self,
        row_offsets: DenseTensor<R>,
        column_indices: DenseTensor<R>,
        values: DenseTensor<R>,
        dims: &[i64],
    ) -> Result<()> {
        check_members(&row_offsets, &column_indices, &values, dims)?;
        tracing::debug!(
            ?dims,
            nnz = values.dims().first().copied().unwrap_or(0),
            "csr members replaced"
        );

        self.row_offsets = row_offsets;
        self.column_indices = column_indices;
        self.values = values;
        self.meta.dims = Dims::from_slice(dims);
        Ok(())
    }

    /// Replace the three buffers and rebind the full metadata record
    ///
    /// Runs the rank and placement checks against `meta.dims`, and requires
    /// `meta` to be valid. Nothing is replaced when either check fails.
    pub fn set_member_with_meta(
        &mut self,
        row_offsets: DenseTensor<R>,
        column_indices: DenseTensor<R>,
        values: DenseTensor<R>,
        meta: &SparseTensorMeta,
    ) -> Result<()> {
        check_members(&row_offsets, &column_indices, &values, &meta.dims)?;
        if !meta.valid() {
            return Err(reject(
                "meta",
                "input meta is invalid, please check the meta attribute".to_string(),
            ));
        }
        tracing::debug!(dims = ?meta.dims, "csr members replaced with meta");

        self.row_offsets = row_offsets;
        self.column_indices = column_indices;
        self.values = values;
        self.sync_meta(meta)
    }

    /// Bind metadata by move
    ///
    /// Only succeeds while the current metadata is invalid, so a record can
    /// be moved in exactly once.
    pub fn set_meta(&mut self, meta: SparseTensorMeta) -> Result<()> {
        if self.meta.valid() {
            return Err(reject(
                "meta",
                "only when the original attribute of Tensor is incomplete, can it be reset"
                    .to_string(),
            ));
        }
        tracing::debug!(dims = ?meta.dims, dtype = ?meta.dtype, "csr meta bound");
        self.meta = meta;
        Ok(())
    }

    /// Copy metadata field by field from a valid record
    ///
    /// Unlike [`SparseCsrTensor::set_meta`] this works regardless of the
    /// current metadata.
    pub fn sync_meta(&mut self, meta: &SparseTensorMeta) -> Result<()> {
        if !meta.valid() {
            return Err(reject(
                "meta",
                "input meta is invalid, please check the meta attribute".to_string(),
            ));
        }
        self.meta.dims = meta.dims.clone();
        self.meta.dtype = meta.dtype;
        self.meta.layout = meta.layout;
        Ok(())
    }

    /// Overwrite the metadata dtype without validation
    pub fn set_dtype(&mut self, dtype: DType) {
        self.meta.dtype = Some(dtype);
    }

    /// Overwrite the metadata layout without validation
    pub fn set_layout(&mut self, layout: DataLayout) {
        self.meta.layout = Some(layout);
    }

    /// Overwrite the logical shape without validation
    pub fn set_dims(&mut self, dims: &[i64]) {
        self.meta.dims = Dims::from_slice(dims);
    }

    // ===== Accessors =====

    /// Returns the row offsets buffer
    pub fn row_offsets(&self) -> &DenseTensor<R> {
        &self.row_offsets
    }

    /// Returns the column indices buffer
    pub fn column_indices(&self) -> &DenseTensor<R> {
        &self.column_indices
    }

    /// Returns the values buffer
    pub fn values(&self) -> &DenseTensor<R> {
        &self.values
    }

    /// Mutable access to the row offsets buffer
    ///
    /// Changes made here bypass the placement check.
    pub fn row_offsets_mut(&mut self) -> &mut DenseTensor<R> {
        &mut self.row_offsets
    }

    /// Mutable access to the column indices buffer
    pub fn column_indices_mut(&mut self) -> &mut DenseTensor<R> {
        &mut self.column_indices
    }

    /// Mutable access to the values buffer
    pub fn values_mut(&mut self) -> &mut DenseTensor<R> {
        &mut self.values
    }

    /// Returns the metadata record
    pub fn meta(&self) -> &SparseTensorMeta {
        &self.meta
    }

    /// Returns the logical shape
    pub fn dims(&self) -> &[i64] {
        &self.meta.dims
    }

    /// Returns the metadata dtype
    pub fn dtype(&self) -> Option<DType> {
        self.meta.dtype
    }

    /// Returns the metadata layout tag
    pub fn layout(&self) -> Option<DataLayout> {
        self.meta.layout
    }

    /// Returns the placement of the values buffer
    pub fn place(&self) -> Option<&R::Device> {
        self.values.place()
    }

    /// Number of logical elements described by `dims`
    pub fn numel(&self) -> i64 {
        self.meta.numel()
    }

    /// Number of stored elements: the leading extent of `values`
    pub fn nnz(&self) -> usize {
        self.values.dims().first().copied().unwrap_or(0)
    }

    /// True when the metadata record is valid
    pub fn valid(&self) -> bool {
        self.meta.valid()
    }

    /// True when the values buffer holds storage
    pub fn initialized(&self) -> bool {
        self.values.initialized()
    }

    /// True for rank-3 (batched) tensors
    pub fn is_batched(&self) -> bool {
        self.meta.dims.len() == 3
    }

    /// Number of matrices: `dims[0]` when batched, 1 otherwise
    pub fn batch_size(&self) -> i64 {
        if self.is_batched() {
            self.meta.dims[0]
        } else {
            1
        }
    }

    /// Number of sparse dimensions: rows and columns
    pub fn sparse_dim(&self) -> i32 {
        2
    }

    /// Number of trailing dense dimensions per stored element
    ///
    /// `rank(values) - batch_dim - block_dim - 1`, where `batch_dim` is
    /// `rank(row_offsets) - 1` and `block_dim` is always 0.
    pub fn dense_dim(&self) -> i32 {
        let nze_dim = self.values.ndim() as i32;
        let batch_dim = self.row_offsets.ndim() as i32 - 1;
        nze_dim - batch_dim - BLOCK_DIM - 1
    }

    /// Bytes held by the three component buffers
    pub fn memory_usage(&self) -> usize {
        self.row_offsets.capacity_bytes()
            + self.column_indices.capacity_bytes()
            + self.values.capacity_bytes()
    }
}

impl<R: Runtime> Default for SparseCsrTensor<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R: Runtime> Clone for SparseCsrTensor<R> {
    /// Shares the three buffers and copies the metadata record
    ///
    /// The record is copied as is, invalid or not; use
    /// [`SparseCsrTensor::assign`] to copy only from valid metadata.
    fn clone(&self) -> Self {
        Self {
            row_offsets: self.row_offsets.clone(),
            column_indices: self.column_indices.clone(),
            values: self.values.clone(),
            meta: self.meta.clone(),
        }
    }
}

impl<R: Runtime> std::fmt::Debug for SparseCsrTensor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseCsrTensor")
            .field("meta", &self.meta)
            .field("row_offsets", &self.row_offsets)
            .field("column_indices", &self.column_indices)
            .field("values", &self.values)
            .finish()
    }
}

#[cfg(all(test, feature = "cpu"))]
mod tests {
    use super::*;
    use crate::runtime::cpu::{CpuDevice, CpuRuntime};

    // Matrix:
    // [1, 0, 2]
    // [0, 0, 3]
    // [4, 5, 0]
    fn sample(device: &CpuDevice) -> SparseCsrTensor<CpuRuntime> {
        SparseCsrTensor::from_slices(
            &[0i64, 2, 3, 5],
            &[0i64, 2, 2, 0, 1],
            &[1.0f32, 2.0, 3.0, 4.0, 5.0],
            &[3, 3],
            device,
        )
        .unwrap()
    }

    #[test]
    fn test_csr_creation() {
        let device = CpuDevice::new();
        let csr = sample(&device);

        assert_eq!(csr.dims(), &[3, 3]);
        assert_eq!(csr.dtype(), Some(DType::F32));
        assert_eq!(csr.layout(), Some(DataLayout::RowMajor));
        assert_eq!(csr.nnz(), 5);
        assert_eq!(csr.numel(), 9);
        assert!(csr.valid());
        assert!(csr.initialized());
        assert!(!csr.is_batched());
        assert_eq!(csr.batch_size(), 1);
    }

    #[test]
    fn test_csr_empty() {
        let csr = SparseCsrTensor::<CpuRuntime>::default();

        assert!(!csr.valid());
        assert!(!csr.initialized());
        assert!(csr.dims().is_empty());
        assert_eq!(csr.nnz(), 0);
        assert!(csr.place().is_none());
        assert_eq!(csr.memory_usage(), 0);
    }

    #[test]
    fn test_csr_invalid_rank() {
        let device = CpuDevice::new();
        let result = SparseCsrTensor::<CpuRuntime>::from_slices(
            &[0i64, 1],
            &[0i64],
            &[1.0f64],
            &[1, 1, 1, 1],
            &device,
        );
        assert!(result.unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_csr_placeholder_skips_placement() {
        let values = DenseTensor::<CpuRuntime>::placeholder(&[0], DType::F64);
        let csr = SparseCsrTensor::new(DenseTensor::new(), DenseTensor::new(), values, &[8, 8])
            .unwrap();

        assert_eq!(csr.dims(), &[8, 8]);
        assert_eq!(csr.dtype(), Some(DType::F64));
        assert!(!csr.initialized());
    }

    #[test]
    fn test_csr_missing_members() {
        let device = CpuDevice::new();
        let offsets = DenseTensor::<CpuRuntime>::from_slice(&[0i64, 0], &[2], &device).unwrap();
        let result = SparseCsrTensor::new(offsets, DenseTensor::new(), DenseTensor::new(), &[1, 1]);
        assert!(result.unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_csr_memory_usage() {
        let device = CpuDevice::new();
        let csr = sample(&device);

        // 4 row_offsets * 8 bytes + 5 column_indices * 8 bytes + 5 values * 4 bytes
        assert_eq!(csr.memory_usage(), 92);
    }

    #[test]
    fn test_clone_meta_is_independent() {
        let device = CpuDevice::new();
        let csr = sample(&device);
        let mut copy = csr.clone();

        copy.set_dtype(DType::F64);
        copy.set_layout(DataLayout::SparseCsr);
        copy.set_dims(&[9, 1]);

        assert_eq!(csr.dtype(), Some(DType::F32));
        assert_eq!(csr.layout(), Some(DataLayout::RowMajor));
        assert_eq!(csr.dims(), &[3, 3]);
        assert!(copy.values().shares_storage(csr.values()));
    }

    #[test]
    fn test_clone_copies_invalid_meta_but_assign_rejects_it() {
        let device = CpuDevice::new();
        let empty = SparseCsrTensor::<CpuRuntime>::empty();

        let copy = empty.clone();
        assert!(!copy.valid());
        assert_eq!(copy.meta(), empty.meta());

        let mut target = sample(&device);
        assert!(target.assign(&empty).unwrap_err().is_invalid_argument());
        assert!(target.valid());
    }

    #[test]
    fn test_assign_from_valid() {
        let device = CpuDevice::new();
        let src = sample(&device);
        let mut dst = SparseCsrTensor::<CpuRuntime>::empty();

        dst.assign(&src).unwrap();
        assert_eq!(dst.dims(), src.dims());
        assert_eq!(dst.dtype(), src.dtype());
        assert!(dst.row_offsets().shares_storage(src.row_offsets()));
    }

    #[test]
    fn test_assign_from_invalid_leaves_target() {
        let device = CpuDevice::new();
        let mut dst = sample(&device);
        let src = SparseCsrTensor::<CpuRuntime>::empty();

        assert!(dst.assign(&src).unwrap_err().is_invalid_argument());
        assert_eq!(dst.dims(), &[3, 3]);
        assert!(dst.initialized());
    }

    #[test]
    fn test_set_meta_move_once() {
        let mut csr = SparseCsrTensor::<CpuRuntime>::empty();
        let meta = SparseTensorMeta::new(&[2, 2], DType::F32, DataLayout::RowMajor);

        csr.set_meta(meta.clone()).unwrap();
        assert!(csr.valid());

        let other = SparseTensorMeta::new(&[4, 4], DType::F64, DataLayout::RowMajor);
        assert!(csr.set_meta(other).unwrap_err().is_invalid_argument());
        assert_eq!(csr.meta(), &meta);
    }

    #[test]
    fn test_sync_meta_requires_valid_input() {
        let device = CpuDevice::new();
        let mut csr = sample(&device);

        let invalid = SparseTensorMeta::default();
        assert!(csr.sync_meta(&invalid).unwrap_err().is_invalid_argument());

        let meta = SparseTensorMeta::new(&[2, 3, 3], DType::F64, DataLayout::SparseCsr);
        csr.sync_meta(&meta).unwrap();
        assert_eq!(csr.meta(), &meta);
    }

    #[test]
    fn test_set_member_keeps_dtype_and_layout() {
        let device = CpuDevice::new();
        let mut csr = sample(&device);
        csr.set_layout(DataLayout::SparseCsr);

        let offsets = DenseTensor::from_slice(&[0i64, 1, 2], &[3], &device).unwrap();
        let cols = DenseTensor::from_slice(&[1i64, 0], &[2], &device).unwrap();
        let vals = DenseTensor::from_slice(&[7.0f64, 8.0], &[2], &device).unwrap();
        csr.set_member(offsets, cols, vals, &[2, 2]).unwrap();

        assert_eq!(csr.dims(), &[2, 2]);
        assert_eq!(csr.nnz(), 2);
        // set_member only rebinds dims
        assert_eq!(csr.dtype(), Some(DType::F32));
        assert_eq!(csr.layout(), Some(DataLayout::SparseCsr));
    }

    #[test]
    fn test_set_member_with_invalid_meta_is_atomic() {
        let device = CpuDevice::new();
        let mut csr = sample(&device);

        let offsets = DenseTensor::from_slice(&[0i64, 0, 0], &[3], &device).unwrap();
        let cols = DenseTensor::from_slice::<i64>(&[], &[0], &device).unwrap();
        let vals = DenseTensor::from_slice::<f32>(&[], &[0], &device).unwrap();
        let mut meta = SparseTensorMeta::new(&[2, 2], DType::F32, DataLayout::RowMajor);
        meta.dtype = None;

        let err = csr.set_member_with_meta(offsets, cols, vals, &meta).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(csr.nnz(), 5);
        assert_eq!(csr.dims(), &[3, 3]);
    }

    #[test]
    fn test_dense_dim() {
        let device = CpuDevice::new();
        let csr = sample(&device);
        assert_eq!(csr.sparse_dim(), 2);
        assert_eq!(csr.dense_dim(), 0);

        // Each stored element is a dense vector of 2
        let offsets = DenseTensor::<CpuRuntime>::from_slice(&[0i64, 1, 1], &[3], &device).unwrap();
        let cols = DenseTensor::from_slice(&[1i64], &[1], &device).unwrap();
        let vals = DenseTensor::from_slice(&[1.0f32, 2.0], &[1, 2], &device).unwrap();
        let block = SparseCsrTensor::new(offsets, cols, vals, &[2, 2]).unwrap();
        assert_eq!(block.dense_dim(), 1);
        assert_eq!(block.nnz(), 1);
    }
}
