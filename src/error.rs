//! Error types for sparsecsr

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using sparsecsr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sparsecsr operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid argument provided to an operation
    ///
    /// Every structural violation of a sparse container (rank, placement,
    /// lifecycle, metadata rebinding) is reported through this variant.
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Shape mismatch between a buffer and the data supplied for it
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// DType mismatch between a buffer and the data supplied for it
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Buffer dtype
        lhs: DType,
        /// Requested dtype
        rhs: DType,
    },

    /// Buffer has no element type yet
    #[error("Buffer dtype is undefined for operation '{op}'")]
    UndefinedDType {
        /// The operation name
        op: &'static str,
    },

    /// Buffer has no storage, or its storage is smaller than its shape requires
    #[error("Buffer not allocated: need {required} bytes, have {available}")]
    NotAllocated {
        /// Bytes required by the current shape and dtype
        required: usize,
        /// Bytes currently held
        available: usize,
    },

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// Backend-specific error
    #[error("Backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Returns true for [`Error::InvalidArgument`]
    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
