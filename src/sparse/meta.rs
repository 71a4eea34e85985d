//! Metadata record shared by sparse tensor formats

use crate::dtype::DType;
use crate::tensor::DataLayout;
use smallvec::SmallVec;

/// Logical shape of a sparse tensor
///
/// Extents are signed to match the metadata convention where a negative
/// extent marks an unknown dimension; such metadata is never valid.
pub type Dims = SmallVec<[i64; 4]>;

/// Logical shape, element type, and layout tag of a sparse tensor
///
/// A default record is *invalid*: dtype and layout are undefined. Validity
/// gates metadata rebinding on the containers that own a record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SparseTensorMeta {
    /// Logical shape
    pub dims: Dims,
    /// Element type, `None` while undefined
    pub dtype: Option<DType>,
    /// Layout tag, `None` while undefined
    pub layout: Option<DataLayout>,
}

impl SparseTensorMeta {
    /// Create a fully-defined record
    pub fn new(dims: &[i64], dtype: DType, layout: DataLayout) -> Self {
        Self {
            dims: Dims::from_slice(dims),
            dtype: Some(dtype),
            layout: Some(layout),
        }
    }

    /// A record is valid when dtype and layout are defined and no extent is negative
    pub fn valid(&self) -> bool {
        self.dtype.is_some() && self.layout.is_some() && self.dims.iter().all(|&d| d >= 0)
    }

    /// Number of logical elements (0 when any extent is negative)
    pub fn numel(&self) -> i64 {
        if self.dims.iter().any(|&d| d < 0) {
            return 0;
        }
        self.dims.iter().product()
    }
}
