//! Sparse tensor support
//!
//! This module provides the Compressed Sparse Row container, assembled from
//! three dense buffers plus a metadata record.
//!
//! # Layout
//!
//! For a `[rows, cols]` matrix with `nnz` stored elements:
//!
//! - `row_offsets`: `rows + 1` offsets; row `i` occupies
//!   `row_offsets[i]..row_offsets[i + 1]` of the two arrays below
//! - `column_indices`: `nnz` column indices
//! - `values`: `nnz` stored values
//!
//! A `[batch, rows, cols]` tensor concatenates the per-matrix offsets, so
//! `row_offsets` holds `batch * (rows + 1)` entries.
//!
//! # Usage
//!
//! ```
//! # #[cfg(feature = "cpu")]
//! # {
//! use sparsecsr::prelude::*;
//!
//! let device = CpuDevice::new();
//! // [1, 0, 2]
//! // [0, 0, 3]
//! let csr = SparseCsrTensor::<CpuRuntime>::from_slices(
//!     &[0i64, 2, 3],
//!     &[0i64, 2, 2],
//!     &[1.0f32, 2.0, 3.0],
//!     &[2, 3],
//!     &device,
//! )?;
//! assert_eq!(csr.nnz(), 3);
//! assert_eq!(csr.sparse_dim(), 2);
//! # }
//! # Ok::<(), sparsecsr::error::Error>(())
//! ```

mod csr;
mod meta;

pub use csr::SparseCsrTensor;
pub use meta::{Dims, SparseTensorMeta};
