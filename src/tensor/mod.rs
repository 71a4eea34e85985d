//! Dense buffer types
//!
//! This module provides `DenseTensor`, the reference-counted n-dimensional
//! buffer that sparse containers are assembled from, together with its
//! untyped `Storage` and the `DataLayout` metadata tag.

mod core;
mod layout;
mod shape;
mod storage;

pub use core::DenseTensor;
pub use layout::DataLayout;
pub use shape::{Shape, elem_count};
pub use storage::Storage;
