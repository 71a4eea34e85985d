//! # sparsecsr
//!
//! **Compressed Sparse Row tensors over runtime-generic dense buffers.**
//!
//! sparsecsr provides `SparseCsrTensor`, a rank-2 (matrix) or rank-3
//! (batch of matrices) CSR container assembled from three reference-counted
//! dense buffers, together with the buffer, device, and allocator layers it
//! is built on.
//!
//! ## Features
//!
//! - **Structural checks**: rank and placement agreement at construction
//! - **Shared buffers**: clones alias component storage, metadata is per-clone
//! - **Lazy sizing**: `resize` reshapes physical buffers without touching the
//!   logical shape
//! - **Explicit allocation**: `allocate_from` routes the values buffer
//!   through a caller-supplied allocator
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sparsecsr::prelude::*;
//!
//! let device = CpuDevice::new();
//! let mut csr = SparseCsrTensor::<CpuRuntime>::from_slices(
//!     &[0i64, 1, 2], &[0i64, 1], &[1.0f64, 1.0], &[2, 2], &device,
//! )?;
//! csr.resize(&[4, 4], 6)?;
//! csr.set_dims(&[4, 4]);
//! ```
//!
//! ## Feature Flags
//!
//! - `cpu` (default): CPU backend
//! - `f16`: Half-precision element types (F16, BF16)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod runtime;
pub mod sparse;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::runtime::{Allocator, Device, Runtime, RuntimeClient};
    pub use crate::sparse::{SparseCsrTensor, SparseTensorMeta};
    pub use crate::tensor::{DataLayout, DenseTensor};

    #[cfg(feature = "cpu")]
    pub use crate::runtime::cpu::{CpuDevice, CpuRuntime};
}

/// Default runtime based on enabled features
#[cfg(feature = "cpu")]
pub type DefaultRuntime = runtime::cpu::CpuRuntime;
